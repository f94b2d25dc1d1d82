//! Generate-content provider: callers send a flat `{prompt, system, ...}` request which is
//! reshaped into `contents[].parts[]`, and the reply is normalized to `{content: [{text}]}`.

use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::proxy::ProxyError;

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Simplified request accepted by `/api/geminiProxy`. A field of the wrong JSON type is
/// treated as absent, so it picks up its default instead of failing the call.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub prompt: String,
    #[serde(default, deserialize_with = "lenient")]
    pub system: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub temperature: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f64,
}

/// Wraps the optional system instruction as a leading part, then the prompt.
pub fn build_gemini_body(request: &GenerateRequest) -> GeminiRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(system) = request.system.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(GeminiPart {
            text: format!("SYSTEM:\n{system}\n\n"),
        });
    }
    parts.push(GeminiPart {
        text: request.prompt.clone(),
    });

    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            max_output_tokens: request
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        },
    }
}

/// `{base}/{model}:generateContent?key={api_key}` with the model segment percent-encoded.
pub fn generate_content_url(base: &str, model: &str, api_key: &str) -> Result<Url, ProxyError> {
    let mut url = Url::parse(base).map_err(|e| ProxyError::InvalidEndpoint(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProxyError::InvalidEndpoint(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .push(&format!("{model}:generateContent"));
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Joins every text part of the first candidate with newlines. Later candidates are ignored;
/// a missing or empty candidate list yields an empty string.
pub fn extract_candidate_text(response: &Value) -> String {
    response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| p.get("text").and_then(Value::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// The messages-style envelope every proxy caller can rely on.
pub fn normalize_response(response: &Value) -> Value {
    json!({ "content": [{ "text": extract_candidate_text(response) }] })
}
