//! Messages provider: the caller's body is forwarded as-is apart from the default model,
//! and the provider's reply is passed straight back.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::proxy::upstream::UpstreamCall;
use crate::proxy::ProxyError;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fills in `model` when the caller left it out, null, or empty.
pub fn merge_default_model(mut body: Map<String, Value>, default_model: &str) -> Map<String, Value> {
    let missing = match body.get("model") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        body.insert("model".to_string(), Value::String(default_model.to_string()));
    }
    body
}

pub fn build_call(
    endpoint: &str,
    api_key: &str,
    body: Map<String, Value>,
) -> Result<UpstreamCall, ProxyError> {
    let url = Url::parse(endpoint).map_err(|e| ProxyError::InvalidEndpoint(e.to_string()))?;
    Ok(UpstreamCall {
        url,
        headers: vec![
            ("content-type", "application/json".to_string()),
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ],
        body: Value::Object(body),
    })
}
