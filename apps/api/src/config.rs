use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::proxy::Provider;

const DEFAULT_CLAUDE_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Model the feedback client asks the claude proxy for when `FEEDBACK_MODEL` is unset.
const DEFAULT_FEEDBACK_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_FEEDBACK_TIMEOUT_SECS: u64 = 30;

/// Credential and upstream settings for one proxied provider.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Name of the environment variable the key comes from, used in error messages.
    pub key_var: &'static str,
    pub api_key: Option<String>,
    pub default_model: String,
    pub endpoint: String,
}

// Hand-written so the key never ends up in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("key_var", &self.key_var)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Settings for the feedback client, which talks to one of our own proxy routes.
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub provider: Provider,
    pub model: String,
    pub proxy_url: String,
    pub timeout: Duration,
}

/// Application configuration loaded once from environment variables.
/// Provider keys are optional: a missing key is reported per request, not at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub claude: ProviderConfig,
    pub gemini: ProviderConfig,
    pub feedback: FeedbackConfig,
    /// Lets callers of the claude proxy supply their own `x-api-key` header (local dev only).
    pub allow_client_api_key: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let claude = ProviderConfig {
            key_var: "CLAUDE_API_KEY",
            api_key: lookup("CLAUDE_API_KEY").and_then(|k| normalize_api_key(&k)),
            default_model: var("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
            endpoint: var("CLAUDE_API_URL").unwrap_or_else(|| DEFAULT_CLAUDE_API_URL.to_string()),
        };

        let gemini = ProviderConfig {
            key_var: "GEMINI_API_KEY",
            api_key: lookup("GEMINI_API_KEY").and_then(|k| normalize_api_key(&k)),
            default_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            endpoint: var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
        };

        let provider = match var("FEEDBACK_PROVIDER") {
            Some(raw) => raw
                .parse::<Provider>()
                .map_err(|e| anyhow!("FEEDBACK_PROVIDER: {e}"))?,
            None => Provider::Claude,
        };

        let model = var("FEEDBACK_MODEL").unwrap_or_else(|| match provider {
            Provider::Claude => DEFAULT_FEEDBACK_MODEL.to_string(),
            Provider::Gemini => gemini.default_model.clone(),
        });

        let proxy_url = var("FEEDBACK_PROXY_URL").unwrap_or_else(|| {
            format!("http://127.0.0.1:{port}{}", provider.route_path())
        });

        let timeout_secs = match var("FEEDBACK_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("FEEDBACK_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_FEEDBACK_TIMEOUT_SECS,
        };

        Ok(Config {
            claude,
            gemini,
            feedback: FeedbackConfig {
                provider,
                model,
                proxy_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            allow_client_api_key: var("ALLOW_CLIENT_API_KEY")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            port,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Claude => &self.claude,
            Provider::Gemini => &self.gemini,
        }
    }

    /// True when the provider the feedback client targets has a key configured.
    pub fn feedback_credential_configured(&self) -> bool {
        self.provider(self.feedback.provider).api_key.is_some()
    }
}

/// Strips quotes and whitespace that commonly sneak into `.env` values.
/// Empty values and the literal `undefined` count as absent.
pub fn normalize_api_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() || unquoted == "undefined" {
        None
    } else {
        Some(unquoted.to_string())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
