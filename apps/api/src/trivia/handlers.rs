//! Axum route handlers for the Trivia API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::trivia::{
    generate_answers, generate_questions, AnswerSet, Difficulty, KnownQuestion, TriviaBatch,
    DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT,
};

#[derive(Debug, Deserialize)]
pub struct TriviaRequest {
    #[serde(default)]
    pub difficulty: Difficulty,
    pub count: Option<usize>,
}

/// POST /api/trivia
pub async fn handle_trivia(
    State(state): State<AppState>,
    Json(request): Json<TriviaRequest>,
) -> Result<Json<TriviaBatch>, AppError> {
    let count = request.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    if count == 0 || count > MAX_QUESTION_COUNT {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_QUESTION_COUNT}"
        )));
    }
    Ok(Json(
        generate_questions(&state.feedback, request.difficulty, count).await,
    ))
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub question: KnownQuestion,
    /// Other questions whose answers may be borrowed as distractors.
    #[serde(default)]
    pub pool: Vec<KnownQuestion>,
}

/// POST /api/trivia/answers
pub async fn handle_trivia_answers(
    State(state): State<AppState>,
    Json(request): Json<AnswersRequest>,
) -> Result<Json<AnswerSet>, AppError> {
    let question = &request.question;
    if question.question.trim().is_empty() || question.answer.trim().is_empty() {
        return Err(AppError::Validation(
            "question and answer must not be empty".to_string(),
        ));
    }
    Ok(Json(
        generate_answers(&state.feedback, question, &request.pool).await,
    ))
}
