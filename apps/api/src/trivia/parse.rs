//! Line parsers for trivia replies. Lines are trimmed and blank lines ignored; anything
//! that does not carry a known tag is skipped.

use std::mem;

const WRONG_ANSWER_MARKERS: [&str; 2] = ["WRONG ANSWER 1:", "WRONG ANSWER 2:"];

/// One question read from a reply, before ids, difficulty and answer order are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuestion {
    pub question: String,
    pub options: [String; 3],
    /// Index into `options`.
    pub correct: usize,
    pub explanation: Option<String>,
}

impl ParsedQuestion {
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct]
    }
}

#[derive(Debug, Default)]
struct Draft {
    question: Option<String>,
    options: [Option<String>; 3],
    correct: Option<usize>,
    explanation: Option<String>,
}

impl Draft {
    /// A draft only becomes a question once it has text, all three options and a valid
    /// correct letter.
    fn finish(self) -> Option<ParsedQuestion> {
        let [a, b, c] = self.options;
        Some(ParsedQuestion {
            question: self.question?,
            options: [a?, b?, c?],
            correct: self.correct?,
            explanation: self.explanation,
        })
    }
}

/// Reads `QUESTION n:` blocks. The `CORRECT:` letter may appear before or after the options.
pub fn parse_questions(reply: &str) -> Vec<ParsedQuestion> {
    let mut questions = Vec::new();
    let mut draft = Draft::default();

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("QUESTION ") && line.contains(':') {
            questions.extend(mem::take(&mut draft).finish());
        } else if let Some(text) = tagged(line, "Q:") {
            draft.question = Some(text);
        } else if let Some(text) = tagged(line, "A:") {
            draft.options[0] = Some(text);
        } else if let Some(text) = tagged(line, "B:") {
            draft.options[1] = Some(text);
        } else if let Some(text) = tagged(line, "C:") {
            draft.options[2] = Some(text);
        } else if let Some(letter) = tagged(line, "CORRECT:") {
            draft.correct = option_index(&letter);
        } else if let Some(text) = tagged(line, "EXPLANATION:") {
            draft.explanation = Some(text);
        }
    }
    questions.extend(draft.finish());

    questions
}

/// Reads `WRONG ANSWER 1:` / `WRONG ANSWER 2:` lines in reply order. The marker may be
/// preceded by list numbering or emphasis.
pub fn parse_wrong_answers(reply: &str) -> Vec<String> {
    reply
        .lines()
        .filter_map(|line| {
            WRONG_ANSWER_MARKERS
                .iter()
                .find_map(|marker| line.split_once(marker))
                .map(|(_, rest)| rest.trim_start_matches('*').trim())
        })
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

fn tagged(line: &str, tag: &str) -> Option<String> {
    line.strip_prefix(tag)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn option_index(value: &str) -> Option<usize> {
    match value.chars().next()?.to_ascii_uppercase() {
        'A' => Some(0),
        'B' => Some(1),
        'C' => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "Here are your questions.

QUESTION 1:
Q: Which join keeps every row from the left table?
A: INNER JOIN
B: LEFT JOIN
C: CROSS JOIN
CORRECT: B
EXPLANATION: A left join keeps unmatched left rows with NULLs on the right.

QUESTION 2:
Q: What does a clustered index define?
A: The physical order of rows
B: A secondary lookup structure
C: A uniqueness constraint only
CORRECT: A
EXPLANATION: Rows are stored in clustered key order.
";

    #[test]
    fn test_parses_complete_blocks() {
        let questions = parse_questions(TWO_QUESTIONS);
        assert_eq!(questions.len(), 2);

        let first = &questions[0];
        assert_eq!(first.question, "Which join keeps every row from the left table?");
        assert_eq!(first.correct, 1);
        assert_eq!(first.correct_answer(), "LEFT JOIN");
        assert_eq!(
            first.explanation.as_deref(),
            Some("A left join keeps unmatched left rows with NULLs on the right.")
        );
        assert_eq!(questions[1].correct_answer(), "The physical order of rows");
    }

    #[test]
    fn test_incomplete_block_is_dropped() {
        let reply = "QUESTION 1:
Q: Missing an option
A: one
B: two
CORRECT: A

QUESTION 2:
Q: Complete
A: one
B: two
C: three
CORRECT: C";
        let questions = parse_questions(reply);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Complete");
        assert_eq!(questions[0].correct_answer(), "three");
    }

    #[test]
    fn test_unknown_correct_letter_drops_question() {
        let reply = "QUESTION 1:\nQ: q\nA: a\nB: b\nC: c\nCORRECT: D";
        assert!(parse_questions(reply).is_empty());
    }

    #[test]
    fn test_correct_letter_before_options_and_with_suffix() {
        let reply = "QUESTION 1:\nQ: q\nCORRECT: c) the last one\nA: a\nB: b\nC: c";
        let questions = parse_questions(reply);
        assert_eq!(questions[0].correct, 2);
    }

    #[test]
    fn test_block_without_header_still_parses() {
        let reply = "  Q: Only one\n  A: x\n  B: y\n  C: z\n  CORRECT: A  ";
        let questions = parse_questions(reply);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].explanation, None);
    }

    #[test]
    fn test_prose_yields_nothing() {
        assert!(parse_questions("Sorry, I cannot help with that.").is_empty());
        assert!(parse_questions("").is_empty());
    }

    #[test]
    fn test_wrong_answers_in_reply_order() {
        let reply = "Sure!\nWRONG ANSWER 1: Indexes always slow reads\n\n**WRONG ANSWER 2:**  Indexes store rows twice ";
        let answers = parse_wrong_answers(reply);
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0], "Indexes always slow reads");
        assert_eq!(answers[1], "Indexes store rows twice");
    }

    #[test]
    fn test_wrong_answers_skip_empty_and_untagged_lines() {
        let reply = "WRONG ANSWER 1:\n1. WRONG ANSWER 2: Only this one\nWRONG ANSWER 3: ignored";
        assert_eq!(parse_wrong_answers(reply), vec!["Only this one"]);
    }
}
