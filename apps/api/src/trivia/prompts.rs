//! Prompt templates for trivia generation. Both prompts pin a line-oriented reply format
//! that `trivia::parse` reads back.

use super::Difficulty;

pub const TRIVIA_SYSTEM: &str = "You write multiple-choice trivia for candidates preparing \
for data engineering interviews. Questions test practical knowledge, not memorized \
definitions. Reply only in the exact line format requested, with no extra commentary.";

const QUESTION_TOPICS: &str = "\
- SQL queries, joins, indexing, performance optimization
- Python data manipulation (pandas, numpy, data structures)
- Cloud data services (orchestration, warehousing, data lakes)
- ETL/ELT pipeline design and best practices
- Data modeling and warehousing concepts
- System design for data platforms";

/// Asks for `count` questions with exactly three options each, in the
/// `QUESTION n:` / `Q:` / `A:`..`C:` / `CORRECT:` / `EXPLANATION:` format.
pub fn build_questions_prompt(difficulty: Difficulty, count: usize) -> String {
    let level = difficulty.prompt_label();
    format!(
        "Generate {count} data engineer interview trivia questions.

DIFFICULTY: {level}
COUNT: {count} questions
FORMAT: Multiple choice with exactly 3 answers each

TOPICS TO COVER (mix these appropriately):
{topics}

For each question, provide:
1. A clear, specific question testing practical knowledge
2. Exactly 3 multiple choice answers (A, B, C)
3. Which answer is correct
4. A brief explanation of why the correct answer is right

FORMAT YOUR RESPONSE EXACTLY LIKE THIS:

QUESTION 1:
Q: [Question text here]
A: [Answer option A]
B: [Answer option B]
C: [Answer option C]
CORRECT: [A, B, or C]
EXPLANATION: [Brief explanation]

QUESTION 2:
[Continue same format...]

Make sure every question fits the {level} difficulty level.",
        topics = QUESTION_TOPICS,
    )
}

/// Asks for two plausible distractors for a known question/answer pair.
pub fn build_distractor_prompt(question: &str, correct_answer: &str) -> String {
    format!(
        "Generate 2 plausible but incorrect answers for this technical interview question. \
Make them believable but clearly wrong to someone who knows the topic.

Question: {question}
Correct Answer: {correct_answer}

The wrong answers should:
1. Be related to the topic but contain subtle errors
2. Be roughly the same length as the correct answer
3. Sound professional and technical
4. Avoid being obviously wrong

Format your response as:
WRONG ANSWER 1: [answer]
WRONG ANSWER 2: [answer]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_prompt_states_count_and_level() {
        let prompt = build_questions_prompt(Difficulty::Hard, 5);
        assert!(prompt.contains("Generate 5 data engineer"));
        assert!(prompt.contains("DIFFICULTY: Hard"));
        assert!(prompt.contains("CORRECT: [A, B, or C]"));
    }

    #[test]
    fn test_mixed_difficulty_label() {
        let prompt = build_questions_prompt(Difficulty::All, 3);
        assert!(prompt.contains("DIFFICULTY: Mixed (Easy, Medium, Hard)"));
    }

    #[test]
    fn test_distractor_prompt_embeds_pair() {
        let prompt = build_distractor_prompt("What is a CTE?", "A named temporary result set");
        assert!(prompt.contains("Question: What is a CTE?"));
        assert!(prompt.contains("Correct Answer: A named temporary result set"));
        assert!(prompt.ends_with("WRONG ANSWER 2: [answer]"));
    }
}
