//! Axum route handlers for the Feedback API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::feedback::estimate::{estimate_api_credits, CreditEstimate};
use crate::feedback::{FeedbackOutcome, FeedbackRequest};
use crate::state::AppState;

const MAX_ESTIMATE_QUESTIONS: u64 = 100_000;

/// POST /api/feedback
///
/// Always answers 200 with non-empty feedback; `source` says whether it is live,
/// a local fallback, or a user-facing error message.
pub async fn handle_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Json<FeedbackOutcome> {
    Json(state.feedback.feedback_or_fallback(&request).await)
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub questions: u64,
}

/// GET /api/feedback/estimate?questions=N
pub async fn handle_estimate(
    Query(params): Query<EstimateQuery>,
) -> Result<Json<CreditEstimate>, AppError> {
    if params.questions > MAX_ESTIMATE_QUESTIONS {
        return Err(AppError::Validation(format!(
            "questions must be at most {MAX_ESTIMATE_QUESTIONS}"
        )));
    }
    Ok(Json(estimate_api_credits(params.questions)))
}
