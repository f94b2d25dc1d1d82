//! Troubleshooting report for the feedback path. Exposes presence and shape of
//! credentials, never their values.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::feedback::{FeedbackClient, FeedbackRequest, FeedbackSource};
use crate::proxy::Provider;
use crate::state::AppState;

const CLAUDE_KEY_PREFIX: &str = "sk-ant-";
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct DiagnosticsQuery {
    #[serde(default)]
    pub probe: bool,
}

#[derive(Debug, Serialize)]
pub struct ProviderDiagnostics {
    pub provider: Provider,
    pub route: &'static str,
    pub credential_present: bool,
    /// Only known for providers with a recognizable key prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_format_valid: Option<bool>,
    pub default_model: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackDiagnostics {
    pub provider: Provider,
    pub model: String,
    pub proxy_url: String,
    /// "live" when a credential is configured, otherwise "fallback".
    pub mode: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub source: FeedbackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub checked_at: DateTime<Utc>,
    pub providers: Vec<ProviderDiagnostics>,
    pub feedback: FeedbackDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeResult>,
}

pub fn build_report(config: &Config, feedback: &FeedbackClient) -> DiagnosticsReport {
    let providers = [Provider::Claude, Provider::Gemini]
        .into_iter()
        .map(|provider| {
            let settings = config.provider(provider);
            let key = settings.api_key.as_deref();
            ProviderDiagnostics {
                provider,
                route: provider.route_path(),
                credential_present: key.is_some(),
                credential_format_valid: match provider {
                    Provider::Claude => key.map(|k| k.starts_with(CLAUDE_KEY_PREFIX)),
                    Provider::Gemini => None,
                },
                default_model: settings.default_model.clone(),
            }
        })
        .collect();

    DiagnosticsReport {
        checked_at: Utc::now(),
        providers,
        feedback: FeedbackDiagnostics {
            provider: config.feedback.provider,
            model: feedback.model().to_string(),
            proxy_url: config.feedback.proxy_url.clone(),
            mode: if feedback.is_live() { "live" } else { "fallback" },
        },
        probe: None,
    }
}

/// Runs the feedback path once on a trivial question.
pub async fn run_probe(feedback: &FeedbackClient) -> ProbeResult {
    let request = FeedbackRequest {
        question: "What is 2+2?".to_string(),
        candidate_answer: "Four".to_string(),
        reference_answer: "The answer is 4, which is the sum of 2 and 2.".to_string(),
        pseudo_code: None,
    };
    let outcome = feedback.feedback_or_fallback(&request).await;
    ProbeResult {
        source: outcome.source,
        error_kind: outcome.error_kind,
        preview: outcome.feedback.chars().take(PREVIEW_CHARS).collect(),
    }
}

/// GET /api/diagnostics[?probe=true]
pub async fn diagnostics_handler(
    State(state): State<AppState>,
    Query(params): Query<DiagnosticsQuery>,
) -> Json<DiagnosticsReport> {
    let mut report = build_report(&state.config, &state.feedback);
    if params.probe {
        report.probe = Some(run_probe(&state.feedback).await);
    }
    Json(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::testing::config_with;

    #[test]
    fn test_report_never_contains_key_values() {
        let config = config_with(&[
            ("CLAUDE_API_KEY", "sk-ant-very-secret"),
            ("GEMINI_API_KEY", "gemini-very-secret"),
        ]);
        let feedback = FeedbackClient::from_config(&config).unwrap();
        let report = build_report(&config, &feedback);
        let rendered = serde_json::to_string(&report).unwrap();
        assert!(!rendered.contains("very-secret"));
        assert_eq!(report.feedback.mode, "live");
    }

    #[test]
    fn test_claude_key_format_check() {
        let config = config_with(&[("CLAUDE_API_KEY", "not-an-anthropic-key")]);
        let feedback = FeedbackClient::from_config(&config).unwrap();
        let report = build_report(&config, &feedback);
        let claude = &report.providers[0];
        assert!(claude.credential_present);
        assert_eq!(claude.credential_format_valid, Some(false));
        let gemini = &report.providers[1];
        assert!(!gemini.credential_present);
        assert_eq!(gemini.credential_format_valid, None);
    }

    #[tokio::test]
    async fn test_probe_without_credential_reports_fallback() {
        let config = config_with(&[]);
        let feedback = FeedbackClient::from_config(&config).unwrap();
        let report = build_report(&config, &feedback);
        assert_eq!(report.feedback.mode, "fallback");

        let probe = run_probe(&feedback).await;
        assert_eq!(probe.source, FeedbackSource::Fallback);
        assert_eq!(probe.error_kind, Some("not_configured"));
        assert!(!probe.preview.is_empty());
        assert!(probe.preview.chars().count() <= PREVIEW_CHARS);
    }
}
