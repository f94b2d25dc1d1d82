//! Outbound HTTP seam for the proxy.
//!
//! The proxy logic only ever sees `Upstream`; production wires in `HttpUpstream`,
//! tests wire in an in-memory double.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// A fully prepared POST to a provider: URL (including any key query parameter),
/// headers and JSON body.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Whatever the provider answered, success or not.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call never produced an HTTP response.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("timeout of {0}s exceeded")]
    Timeout(u64),

    #[error("{0}")]
    Transport(String),
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn post_json(&self, call: UpstreamCall) -> Result<UpstreamReply, UpstreamError>;
}

/// reqwest-backed upstream used by the running service.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
                .build()?,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_json(&self, call: UpstreamCall) -> Result<UpstreamReply, UpstreamError> {
        let mut request = self.client.post(call.url).json(&call.body);
        for (name, value) in &call.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(UPSTREAM_TIMEOUT_SECS)
            } else {
                // without_url keeps query-string keys out of the message
                UpstreamError::Transport(e.without_url().to_string())
            }
        })?;

        let status = response.status().as_u16();
        let raw = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        debug!("Upstream answered {} with {} bytes", status, raw.len());

        Ok(UpstreamReply {
            status,
            body: decode_body(&raw),
        })
    }
}

/// JSON when the provider sent JSON, the raw text otherwise, null when empty.
fn decode_body(raw: &[u8]) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_body_json() {
        assert_eq!(decode_body(br#"{"ok":true}"#), json!({"ok": true}));
    }

    #[test]
    fn test_decode_body_plain_text() {
        assert_eq!(
            decode_body(b"Bad Gateway"),
            Value::String("Bad Gateway".to_string())
        );
    }

    #[test]
    fn test_decode_body_empty_is_null() {
        assert_eq!(decode_body(b""), Value::Null);
    }

    #[test]
    fn test_reply_success_range() {
        let ok = UpstreamReply {
            status: 204,
            body: Value::Null,
        };
        let bad = UpstreamReply {
            status: 302,
            body: Value::Null,
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
