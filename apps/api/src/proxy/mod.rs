/// Feedback Proxy. Keeps provider credentials server-side and absorbs the shape
/// differences between providers.
///
/// `handle_proxy_request` is the only place proxy behaviour lives. The axum route and the
/// function-event route in `handlers` are thin adapters over it.
use std::fmt;
use std::str::FromStr;

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{normalize_api_key, Config};

pub mod claude;
pub mod gemini;
pub mod handlers;
pub mod upstream;

use upstream::{Upstream, UpstreamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Flat chat-messages API; request and response pass through.
    Claude,
    /// Structured generate-content API; request and response are reshaped.
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
        }
    }

    pub fn route_path(&self) -> &'static str {
        match self {
            Provider::Claude => "/api/claudeProxy",
            Provider::Gemini => "/api/geminiProxy",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Provider::Claude),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Deployment-neutral view of an incoming proxy call.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub body: Bytes,
    /// `x-api-key` sent by the caller; honoured only when the config allows it.
    pub client_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid upstream endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        data: Option<Value>,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::MissingCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidEndpoint(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<ProxyError> for ProxyResponse {
    fn from(err: ProxyError) -> Self {
        let status = err.status();
        let body = match &err {
            ProxyError::Upstream {
                data: Some(data), ..
            } => json!({ "error": err.to_string(), "data": data }),
            _ => json!({ "error": err.to_string() }),
        };
        ProxyResponse { status, body }
    }
}

impl From<UpstreamError> for ProxyError {
    fn from(err: UpstreamError) -> Self {
        ProxyError::Upstream {
            status: None,
            message: err.to_string(),
            data: None,
        }
    }
}

/// Runs one proxy call end to end. Never panics and never fails: every outcome,
/// including errors, is expressed as a `ProxyResponse`.
pub async fn handle_proxy_request(
    provider: Provider,
    config: &Config,
    upstream: &dyn Upstream,
    request: ProxyRequest,
) -> ProxyResponse {
    match forward(provider, config, upstream, request).await {
        Ok(response) => response,
        Err(err) => {
            warn!("{} proxy call failed: {}", provider, err);
            err.into()
        }
    }
}

async fn forward(
    provider: Provider,
    config: &Config,
    upstream: &dyn Upstream,
    request: ProxyRequest,
) -> Result<ProxyResponse, ProxyError> {
    if request.method != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }

    let settings = config.provider(provider);
    let client_key = request
        .client_api_key
        .filter(|_| provider == Provider::Claude && config.allow_client_api_key)
        .and_then(|k| normalize_api_key(&k));
    let api_key = client_key
        .or_else(|| settings.api_key.clone())
        .ok_or(ProxyError::MissingCredential(settings.key_var))?;

    let body = parse_object(&request.body)?;
    let request_id = Uuid::new_v4();

    match provider {
        Provider::Claude => {
            let body = claude::merge_default_model(body, &settings.default_model);
            let model = body
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let call = claude::build_call(&settings.endpoint, &api_key, body)?;

            info!("[{request_id}] forwarding to {provider} (model: {model})");
            let reply = upstream.post_json(call).await?;
            info!("[{request_id}] {provider} answered {}", reply.status);

            if !reply.is_success() {
                return Err(upstream_failure(reply.status, reply.body));
            }
            Ok(ProxyResponse {
                status: StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK),
                body: reply.body,
            })
        }
        Provider::Gemini => {
            let input: gemini::GenerateRequest = serde_json::from_value(Value::Object(body))
                .map_err(|e| ProxyError::InvalidBody(e.to_string()))?;
            let model = input
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| settings.default_model.clone());
            let url = gemini::generate_content_url(&settings.endpoint, &model, &api_key)?;
            let payload = serde_json::to_value(gemini::build_gemini_body(&input))
                .map_err(|e| ProxyError::InvalidBody(e.to_string()))?;
            let call = upstream::UpstreamCall {
                url,
                headers: vec![("content-type", "application/json".to_string())],
                body: payload,
            };

            info!("[{request_id}] forwarding to {provider} (model: {model})");
            let reply = upstream.post_json(call).await?;
            info!("[{request_id}] {provider} answered {}", reply.status);

            if !reply.is_success() {
                return Err(upstream_failure(reply.status, reply.body));
            }
            Ok(ProxyResponse {
                status: StatusCode::OK,
                body: gemini::normalize_response(&reply.body),
            })
        }
    }
}

fn upstream_failure(status: u16, body: Value) -> ProxyError {
    ProxyError::Upstream {
        status: Some(status),
        message: format!("Request failed with status code {status}"),
        data: Some(body),
    }
}

/// An empty body is treated as `{}`; anything else must be a JSON object.
fn parse_object(raw: &[u8]) -> Result<Map<String, Value>, ProxyError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProxyError::InvalidBody(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(ProxyError::InvalidBody(e.to_string())),
    }
}
