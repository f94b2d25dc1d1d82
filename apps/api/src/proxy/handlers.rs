//! Deployment adapters for the proxy: a direct HTTP route per provider, and a
//! function-invocation route taking the `{httpMethod, body}` event envelope.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::proxy::{handle_proxy_request, Provider, ProxyRequest, ProxyResponse};
use crate::state::AppState;

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// ANY /api/claudeProxy
pub async fn handle_claude_proxy(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ProxyResponse {
    direct(Provider::Claude, &state, method, &headers, body).await
}

/// ANY /api/geminiProxy
pub async fn handle_gemini_proxy(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ProxyResponse {
    direct(Provider::Gemini, &state, method, &headers, body).await
}

async fn direct(
    provider: Provider,
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    body: Bytes,
) -> ProxyResponse {
    let request = ProxyRequest {
        method,
        body,
        client_api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    handle_proxy_request(provider, &state.config, state.upstream.as_ref(), request).await
}

/// Function-as-a-service invocation envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// JSON-encoded response body.
    pub body: String,
}

impl From<ProxyResponse> for FunctionResult {
    fn from(response: ProxyResponse) -> Self {
        FunctionResult {
            status_code: response.status.as_u16(),
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: response.body.to_string(),
        }
    }
}

/// Translates an event into a `ProxyRequest`. A missing `httpMethod` is treated as POST;
/// an unparseable one can never be POST and is rejected downstream.
pub fn event_to_request(event: FunctionEvent) -> ProxyRequest {
    let method = match event.http_method.as_deref() {
        None => Method::POST,
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes()).unwrap_or(Method::TRACE),
    };
    let client_api_key = event
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("x-api-key"))
        .map(|(_, value)| value.clone());

    ProxyRequest {
        method,
        body: Bytes::from(event.body.unwrap_or_default()),
        client_api_key,
    }
}

/// Decodes the invocation envelope. An empty body is an event with no fields.
pub fn parse_event(body: &[u8]) -> Result<FunctionEvent, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FunctionEvent::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid function event: {e}")))
}

/// POST /functions/:provider
pub async fn handle_function_event(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<FunctionResult>, AppError> {
    let provider: Provider = provider
        .parse()
        .map_err(|_| AppError::NotFound(format!("No proxy function named '{provider}'")))?;
    let event = parse_event(&body)?;

    let response = handle_proxy_request(
        provider,
        &state.config,
        state.upstream.as_ref(),
        event_to_request(event),
    )
    .await;

    Ok(Json(response.into()))
}
