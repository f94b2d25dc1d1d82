/// Feedback Client. Turns a grading task into one proxy call and decides what the
/// caller sees when that call cannot produce feedback.
///
/// Single attempt, no retries. `generate_feedback` returns the raw classified result;
/// `feedback_or_fallback` applies the fallback policy and always yields non-empty text.
use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, FeedbackConfig};
use crate::proxy::gemini::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use crate::proxy::Provider;

pub mod estimate;
pub mod fallback;
pub mod handlers;
pub mod prompts;

/// One grading task. Built per call, never stored.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub candidate_answer: String,
    pub reference_answer: String,
    pub pseudo_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Invalid API key. Please verify the credential configured for the feedback proxy.")]
    InvalidCredential,

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("API Error: {0}")]
    BadRequest(String),

    #[error("Model not found. Please check the model name.")]
    ModelNotFound,

    #[error("Request timeout. Please try again.")]
    Timeout,

    #[error("Network error. Please check your internet connection.")]
    Network,

    #[error("Unexpected response format from the feedback service.")]
    MalformedResponse,

    #[error("Feedback service answered with status {status}")]
    Unclassified { status: u16 },

    #[error("No API credential is configured for feedback")]
    NotConfigured,
}

impl FeedbackError {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedbackError::InvalidCredential => "invalid_credential",
            FeedbackError::RateLimited => "rate_limited",
            FeedbackError::BadRequest(_) => "bad_request",
            FeedbackError::ModelNotFound => "model_not_found",
            FeedbackError::Timeout => "timeout",
            FeedbackError::Network => "network",
            FeedbackError::MalformedResponse => "malformed_response",
            FeedbackError::Unclassified { .. } => "unclassified",
            FeedbackError::NotConfigured => "not_configured",
        }
    }

    /// Only an unconfigured credential or an unclassified failure is papered over with
    /// local feedback; every classified error is shown to the user.
    pub fn falls_back(&self) -> bool {
        matches!(
            self,
            FeedbackError::NotConfigured | FeedbackError::Unclassified { .. }
        )
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => FeedbackError::InvalidCredential,
            429 => FeedbackError::RateLimited,
            400 => FeedbackError::BadRequest(
                error_message(body).unwrap_or_else(|| "Invalid request".to_string()),
            ),
            404 => FeedbackError::ModelNotFound,
            status => FeedbackError::Unclassified { status },
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedbackError::Timeout
        } else {
            FeedbackError::Network
        }
    }
}

/// Digs the human-readable message out of a proxy error body, which wraps the provider's
/// own error document under `data`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["/data/error/message", "/error/message", "/data/error", "/error"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSource {
    Live,
    Fallback,
    Error,
}

/// What the UI renders: always non-empty text plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOutcome {
    pub feedback: String,
    pub source: FeedbackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct MessagesPayload<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    max_output_tokens: u32,
    temperature: f64,
}

/// `{content: [{type?, text}]}`, what both proxy routes hand back on success.
#[derive(Debug, Deserialize)]
struct NormalizedResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: Option<String>,
    text: Option<String>,
}

impl NormalizedResponse {
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.block_type.as_deref().map_or(true, |t| t == "text"))
            .find_map(|b| b.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct FeedbackClient {
    client: Client,
    provider: Provider,
    model: String,
    proxy_url: String,
    credential_configured: bool,
}

impl FeedbackClient {
    pub fn new(settings: &FeedbackConfig, credential_configured: bool) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(settings.timeout).build()?,
            provider: settings.provider,
            model: settings.model.clone(),
            proxy_url: settings.proxy_url.clone(),
            credential_configured,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.feedback, config.feedback_credential_configured())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_live(&self) -> bool {
        self.credential_configured
    }

    /// Grades one answer. Errors are classified, never retried.
    pub async fn generate_feedback(&self, request: &FeedbackRequest) -> Result<String, FeedbackError> {
        let prompt = prompts::build_feedback_prompt(
            &request.question,
            &request.candidate_answer,
            &request.reference_answer,
            request.pseudo_code.as_deref(),
        );
        self.complete(prompts::FEEDBACK_SYSTEM, &prompt, DEFAULT_MAX_OUTPUT_TOKENS)
            .await
    }

    /// One proxy round trip in the configured provider's request shape, returning the first
    /// non-blank text block.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, FeedbackError> {
        if !self.credential_configured {
            return Err(FeedbackError::NotConfigured);
        }

        let builder = self.client.post(&self.proxy_url);
        let builder = match self.provider {
            Provider::Claude => builder.json(&MessagesPayload {
                model: &self.model,
                max_tokens,
                temperature: DEFAULT_TEMPERATURE,
                system,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            }),
            Provider::Gemini => builder.json(&GeneratePayload {
                model: &self.model,
                prompt,
                system,
                max_output_tokens: max_tokens,
                temperature: DEFAULT_TEMPERATURE,
            }),
        };

        debug!("Requesting completion from {} (model: {})", self.provider, self.model);

        let response = builder.send().await.map_err(FeedbackError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(FeedbackError::from_transport)?;

        if !status.is_success() {
            return Err(FeedbackError::from_status(status, &body));
        }

        let parsed: NormalizedResponse =
            serde_json::from_str(&body).map_err(|_| FeedbackError::MalformedResponse)?;
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(FeedbackError::MalformedResponse)
    }

    /// Applies the fallback policy on top of `generate_feedback`.
    pub async fn feedback_or_fallback(&self, request: &FeedbackRequest) -> FeedbackOutcome {
        match self.generate_feedback(request).await {
            Ok(feedback) => {
                info!("Feedback generated ({} chars)", feedback.len());
                FeedbackOutcome {
                    feedback,
                    source: FeedbackSource::Live,
                    error_kind: None,
                }
            }
            Err(err) if err.falls_back() => {
                info!("Using local fallback feedback: {}", err);
                FeedbackOutcome {
                    feedback: fallback::fallback_feedback(
                        &request.candidate_answer,
                        &request.reference_answer,
                    ),
                    source: FeedbackSource::Fallback,
                    error_kind: Some(err.kind()),
                }
            }
            Err(err) => {
                warn!("Feedback call failed ({}): {}", err.kind(), err);
                FeedbackOutcome {
                    feedback: err.to_string(),
                    source: FeedbackSource::Error,
                    error_kind: Some(err.kind()),
                }
            }
        }
    }
}
