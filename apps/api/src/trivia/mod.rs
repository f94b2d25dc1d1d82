//! Trivia: multiple-choice questions and distractor answers produced through the feedback
//! client. Unlike graded feedback, every failure here is replaced with local content, so a
//! caller always gets a playable set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::feedback::{FeedbackClient, FeedbackSource};
use crate::proxy::gemini::DEFAULT_MAX_OUTPUT_TOKENS;

pub mod fallback;
pub mod handlers;
pub mod parse;
pub mod prompts;

use parse::ParsedQuestion;

pub const DEFAULT_QUESTION_COUNT: usize = 20;
pub const MAX_QUESTION_COUNT: usize = 50;
/// A full batch of questions needs far more room than a single grading reply.
const QUESTIONS_MAX_TOKENS: u32 = 4096;
const GENERATED_ID_BASE: u32 = 10_000;
/// Reported when the model answered but nothing usable could be read from the reply.
const UNPARSEABLE: &str = "unparseable_response";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    #[serde(alias = "all")]
    All,
    #[serde(alias = "easy")]
    Easy,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "hard")]
    Hard,
}

impl Difficulty {
    const LEVELS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn prompt_label(self) -> &'static str {
        match self {
            Difficulty::All => "Mixed (Easy, Medium, Hard)",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Concrete level for one question. A mixed request picks one at random.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Difficulty {
        match self {
            Difficulty::All => *Self::LEVELS.choose(rng).unwrap_or(&Difficulty::Medium),
            level => level,
        }
    }

    /// Minutes a candidate should need.
    pub fn time_estimate(self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard | Difficulty::All => 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaAnswer {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

impl TriviaAnswer {
    pub fn correct(text: impl Into<String>) -> Self {
        TriviaAnswer {
            id: "correct".to_string(),
            text: text.into(),
            is_correct: true,
        }
    }

    pub fn wrong(id: impl Into<String>, text: impl Into<String>) -> Self {
        TriviaAnswer {
            id: id.into(),
            text: text.into(),
            is_correct: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriviaQuestion {
    pub id: u32,
    pub question: String,
    pub difficulty: Difficulty,
    pub time_estimate: u32,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub answers: Vec<TriviaAnswer>,
}

/// A question the caller already has, which needs distractors.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownQuestion {
    pub id: u32,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriviaBatch {
    pub questions: Vec<TriviaQuestion>,
    pub source: FeedbackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerSet {
    pub answers: Vec<TriviaAnswer>,
    pub source: FeedbackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

/// Exactly three answers, exactly one marked correct, and no wrong answer that is blank or
/// repeats the correct text.
pub fn validate_answers(answers: &[TriviaAnswer]) -> bool {
    if answers.len() != 3 {
        return false;
    }
    let mut correct = answers.iter().filter(|a| a.is_correct);
    let (Some(right), None) = (correct.next(), correct.next()) else {
        return false;
    };
    let right = right.text.trim().to_lowercase();
    answers
        .iter()
        .filter(|a| !a.is_correct)
        .all(|wrong| {
            let text = wrong.text.trim();
            !text.is_empty() && text.to_lowercase() != right
        })
}

/// Assigns ids, a concrete difficulty and a shuffled answer order to parsed questions,
/// dropping any whose options do not validate.
pub fn build_questions<R: Rng + ?Sized>(
    parsed: Vec<ParsedQuestion>,
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Vec<TriviaQuestion> {
    parsed
        .into_iter()
        .map(|question| {
            let answers: Vec<TriviaAnswer> = question
                .options
                .iter()
                .enumerate()
                .map(|(i, text)| TriviaAnswer {
                    id: format!("answer_{}", i + 1),
                    text: text.clone(),
                    is_correct: i == question.correct,
                })
                .collect();
            (question, answers)
        })
        .filter(|(_, answers)| validate_answers(answers))
        .take(count)
        .enumerate()
        .map(|(i, (question, mut answers))| {
            answers.shuffle(&mut *rng);
            let level = difficulty.resolve(&mut *rng);
            TriviaQuestion {
                id: GENERATED_ID_BASE + i as u32,
                answer: question.correct_answer().to_string(),
                question: question.question,
                difficulty: level,
                time_estimate: level.time_estimate(),
                explanation: question.explanation,
                answers,
            }
        })
        .collect()
}

fn questions_from_reply(reply: &str, difficulty: Difficulty, count: usize) -> Vec<TriviaQuestion> {
    build_questions(
        parse::parse_questions(reply),
        difficulty,
        count,
        &mut rand::thread_rng(),
    )
}

/// Correct answer first, then the model's first two distractors. `None` when the reply
/// holds fewer than two or they do not validate.
pub fn answers_from_reply(correct_answer: &str, reply: &str) -> Option<Vec<TriviaAnswer>> {
    let mut wrong = parse::parse_wrong_answers(reply).into_iter();
    let answers = vec![
        TriviaAnswer::correct(correct_answer),
        TriviaAnswer::wrong("wrong_ai_1", wrong.next()?),
        TriviaAnswer::wrong("wrong_ai_2", wrong.next()?),
    ];
    validate_answers(&answers).then_some(answers)
}

/// Up to `count` generated questions, or the local set when the call fails or the reply
/// cannot be read.
pub async fn generate_questions(
    client: &FeedbackClient,
    difficulty: Difficulty,
    count: usize,
) -> TriviaBatch {
    let prompt = prompts::build_questions_prompt(difficulty, count);
    let reason = match client
        .complete(prompts::TRIVIA_SYSTEM, &prompt, QUESTIONS_MAX_TOKENS)
        .await
    {
        Ok(reply) => {
            let questions = questions_from_reply(&reply, difficulty, count);
            if !questions.is_empty() {
                info!("Generated {} trivia questions", questions.len());
                return TriviaBatch {
                    questions,
                    source: FeedbackSource::Live,
                    error_kind: None,
                };
            }
            UNPARSEABLE
        }
        Err(err) => err.kind(),
    };

    info!("Using local trivia questions ({reason})");
    TriviaBatch {
        questions: fallback::mock_questions(difficulty, count),
        source: FeedbackSource::Fallback,
        error_kind: Some(reason),
    }
}

/// Three answers for a known question: model distractors when available, otherwise
/// distractors drawn from `pool` and canned topic answers.
pub async fn generate_answers(
    client: &FeedbackClient,
    question: &KnownQuestion,
    pool: &[KnownQuestion],
) -> AnswerSet {
    let prompt = prompts::build_distractor_prompt(&question.question, &question.answer);
    let reason = match client
        .complete(prompts::TRIVIA_SYSTEM, &prompt, DEFAULT_MAX_OUTPUT_TOKENS)
        .await
    {
        Ok(reply) => match answers_from_reply(&question.answer, &reply) {
            Some(answers) => {
                return AnswerSet {
                    answers,
                    source: FeedbackSource::Live,
                    error_kind: None,
                }
            }
            None => UNPARSEABLE,
        },
        Err(err) => err.kind(),
    };

    info!("Using local trivia answers for question {} ({reason})", question.id);
    AnswerSet {
        answers: fallback::fallback_answers(question, pool),
        source: FeedbackSource::Fallback,
        error_kind: Some(reason),
    }
}
