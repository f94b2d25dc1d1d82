//! Local trivia content for when the model cannot be used: a small fixed question set,
//! and distractors borrowed from other questions' answers.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Difficulty, KnownQuestion, TriviaAnswer, TriviaQuestion};

const MOCK_ID_BASE: u32 = 9001;
/// Borrowed answers longer than this are cut to their first sentence.
const MAX_DISTRACTOR_CHARS: usize = 200;
/// Below this many same-topic candidates the whole pool is used instead.
const MIN_RELATED_POOL: usize = 10;

struct MockQuestion {
    question: &'static str,
    answer: &'static str,
    explanation: &'static str,
    wrong: [&'static str; 2],
    time_estimate: u32,
}

const MOCK_QUESTIONS: [MockQuestion; 3] = [
    MockQuestion {
        question: "In a managed pipeline service, what is the main difference between a \
            pipeline and a data flow?",
        answer: "A pipeline orchestrates activities and controls execution order, while a data \
            flow performs the actual row-level transformations.",
        explanation: "Pipelines are the orchestration layer; data flows are the transformation \
            layer they invoke.",
        wrong: [
            "A pipeline stores data permanently while a data flow only keeps data in memory \
                for the duration of a run.",
            "A pipeline is used for batch processing while a data flow is reserved for \
                real-time streaming.",
        ],
        time_estimate: 5,
    },
    MockQuestion {
        question: "Which partitioning strategy suits a time-series fact table where most \
            queries read recent data?",
        answer: "Date-based partitioning, by day or month, so queries on recent data prune \
            every older partition.",
        explanation: "Partition elimination means recent-data queries scan only the partitions \
            they need.",
        wrong: [
            "Hash partitioning on a user id, since an even distribution always gives the \
                fastest queries.",
            "Round-robin partitioning, since equal partition sizes make every query fully \
                parallel.",
        ],
        time_estimate: 7,
    },
    MockQuestion {
        question: "What is the most memory-efficient way to process a 10GB CSV file with \
            pandas?",
        answer: "Read it with pd.read_csv(chunksize=...) and process one chunk at a time, so \
            the file never has to fit in memory.",
        explanation: "Chunked reads bound memory use regardless of file size.",
        wrong: [
            "Load the whole file with pd.read_csv() and rely on dtype optimization to shrink \
                it.",
            "Convert the CSV to Parquet first, then load the entire Parquet file into \
                memory.",
        ],
        time_estimate: 6,
    },
];

/// `count` questions cycling through the fixed set, with ids counting up from 9001. A
/// mixed request is served at medium difficulty.
pub fn mock_questions(difficulty: Difficulty, count: usize) -> Vec<TriviaQuestion> {
    let level = match difficulty {
        Difficulty::All => Difficulty::Medium,
        level => level,
    };
    MOCK_QUESTIONS
        .iter()
        .cycle()
        .take(count)
        .zip(MOCK_ID_BASE..)
        .map(|(mock, id)| TriviaQuestion {
            id,
            question: mock.question.to_string(),
            difficulty: level,
            time_estimate: mock.time_estimate,
            answer: mock.answer.to_string(),
            explanation: Some(mock.explanation.to_string()),
            answers: vec![
                TriviaAnswer::correct(mock.answer),
                TriviaAnswer::wrong("wrong_1", mock.wrong[0]),
                TriviaAnswer::wrong("wrong_2", mock.wrong[1]),
            ],
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Sql,
    Python,
    General,
}

impl Topic {
    fn of(question_lower: &str) -> Self {
        if contains_any(question_lower, &["sql", "query", "database"]) {
            Topic::Sql
        } else if contains_any(question_lower, &["python", "pandas", "dataframe"]) {
            Topic::Python
        } else {
            Topic::General
        }
    }

    /// Whether another question is close enough to lend its answer as a distractor.
    fn is_related(self, question_lower: &str) -> bool {
        match self {
            Topic::Sql => contains_any(question_lower, &["sql", "query", "database", "table"]),
            Topic::Python => contains_any(
                question_lower,
                &["python", "pandas", "dataframe", "list", "dict"],
            ),
            Topic::General => true,
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// Correct answer first, then two distractors. Uses the thread-local RNG.
pub fn fallback_answers(question: &KnownQuestion, pool: &[KnownQuestion]) -> Vec<TriviaAnswer> {
    fallback_answers_with(question, pool, &mut rand::thread_rng())
}

/// Distractors come from, in order: shuffled answers of same-topic questions in `pool`
/// (the whole pool when too few match), canned topic answers, then a generic negation.
pub fn fallback_answers_with<R: Rng + ?Sized>(
    question: &KnownQuestion,
    pool: &[KnownQuestion],
    rng: &mut R,
) -> Vec<TriviaAnswer> {
    let question_lower = question.question.to_lowercase();
    let topic = Topic::of(&question_lower);
    let correct = question.answer.trim().to_lowercase();

    let others: Vec<&KnownQuestion> = pool
        .iter()
        .filter(|other| other.id != question.id)
        .filter(|other| {
            let answer = other.answer.trim();
            !answer.is_empty() && answer.to_lowercase() != correct
        })
        .collect();
    let mut candidates: Vec<&KnownQuestion> = others
        .iter()
        .copied()
        .filter(|other| topic.is_related(&other.question.to_lowercase()))
        .collect();
    if candidates.len() < MIN_RELATED_POOL {
        candidates = others;
    }
    candidates.shuffle(rng);

    let mut wrong: Vec<TriviaAnswer> = candidates
        .iter()
        .take(2)
        .zip(1..)
        .map(|(other, n)| {
            TriviaAnswer::wrong(
                format!("wrong_{n}"),
                borrowed_distractor(&other.answer, &question_lower),
            )
        })
        .collect();

    if wrong.len() < 2 {
        let missing = 2 - wrong.len();
        wrong.extend(topic_distractors(&question_lower).into_iter().take(missing));
    }
    while wrong.len() < 2 {
        wrong.push(TriviaAnswer::wrong(
            format!("fallback_{}", wrong.len() + 1),
            format!(
                "This is not the correct answer. {} is not accurate.",
                first_sentence(&question.answer)
            ),
        ));
    }

    let mut answers = vec![TriviaAnswer::correct(question.answer.as_str())];
    answers.extend(wrong);
    answers
}

fn first_sentence(text: &str) -> &str {
    text.split('.').next().unwrap_or(text)
}

/// Shortens an overly long answer and, for "difference" questions, turns a borrowed
/// "difference" into "similarity" so the distractor does not read as an obvious mismatch.
fn borrowed_distractor(answer: &str, question_lower: &str) -> String {
    let text = if answer.chars().count() > MAX_DISTRACTOR_CHARS {
        format!("{}.", first_sentence(answer))
    } else {
        answer.to_string()
    };
    if question_lower.contains("difference") {
        replace_ignoring_ascii_case(&text, "difference", "similarity")
    } else {
        text
    }
}

/// `from` must be lowercase ASCII.
fn replace_ignoring_ascii_case(text: &str, from: &str, to: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(from) {
        out.push_str(&text[last..start]);
        out.push_str(to);
        last = start + from.len();
    }
    out.push_str(&text[last..]);
    out
}

/// Canned misconceptions for common SQL and Python questions; two generic ones otherwise.
fn topic_distractors(question_lower: &str) -> Vec<TriviaAnswer> {
    let mut wrong = Vec::new();

    if contains_any(question_lower, &["sql", "query", "database"]) {
        if question_lower.contains("join") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_sql_1",
                "INNER JOIN combines all rows from both tables regardless of matching \
                 conditions, while OUTER JOIN only returns matching rows.",
            ));
        } else if question_lower.contains("index") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_sql_2",
                "Indexes slow down query performance by creating additional overhead for \
                 data retrieval operations.",
            ));
        } else if question_lower.contains("normalization") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_sql_3",
                "Normalization increases data redundancy to improve query performance and \
                 reduce storage requirements.",
            ));
        }
    }

    if contains_any(question_lower, &["python", "pandas", "list"]) {
        if question_lower.contains("list") && question_lower.contains("tuple") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_python_1",
                "Lists are immutable while tuples are mutable, making lists better for data \
                 that needs to change frequently.",
            ));
        } else if question_lower.contains("pandas") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_python_2",
                "Pandas DataFrames can only store one data type per DataFrame, unlike NumPy \
                 arrays which support mixed types.",
            ));
        } else if question_lower.contains("exception") {
            wrong.push(TriviaAnswer::wrong(
                "wrong_python_3",
                "Python exceptions should always be caught using a generic except clause to \
                 handle all possible errors.",
            ));
        }
    }

    if wrong.is_empty() {
        wrong.push(TriviaAnswer::wrong(
            "wrong_generic_1",
            "This approach is deprecated and should not be used in modern development \
             practices.",
        ));
        wrong.push(TriviaAnswer::wrong(
            "wrong_generic_2",
            "The opposite of the correct answer - this is commonly confused but incorrect.",
        ));
    }

    wrong
}
