pub mod diagnostics;
pub mod health;

use axum::{
    routing::{any, get, post},
    Router,
};

use crate::feedback::handlers as feedback;
use crate::proxy::handlers as proxy;
use crate::state::AppState;
use crate::trivia::handlers as trivia;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Proxy: every method is routed so non-POST gets the proxy's own 405 body
        .route("/api/claudeProxy", any(proxy::handle_claude_proxy))
        .route("/api/geminiProxy", any(proxy::handle_gemini_proxy))
        .route("/functions/:provider", post(proxy::handle_function_event))
        // Feedback
        .route("/api/feedback", post(feedback::handle_feedback))
        .route("/api/feedback/estimate", get(feedback::handle_estimate))
        // Trivia
        .route("/api/trivia", post(trivia::handle_trivia))
        .route("/api/trivia/answers", post(trivia::handle_trivia_answers))
        .route("/api/diagnostics", get(diagnostics::diagnostics_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::feedback::FeedbackClient;
    use crate::proxy::testing::{config_with, FakeUpstream};

    fn app(config: Config, upstream: Arc<FakeUpstream>) -> Router {
        let feedback = FeedbackClient::from_config(&config).unwrap();
        build_router(AppState {
            config,
            upstream,
            feedback,
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_on_proxy_is_405_regardless_of_body() {
        let upstream = Arc::new(FakeUpstream::replying(200, json!({})));
        let config = config_with(&[("CLAUDE_API_KEY", "sk-ant-x"), ("GEMINI_API_KEY", "g")]);
        for (uri, body) in [
            ("/api/claudeProxy", ""),
            ("/api/geminiProxy", "{\"prompt\":\"hi\"}"),
            ("/api/geminiProxy", "garbage"),
        ] {
            let request = Request::get(uri).body(Body::from(body)).unwrap();
            let (status, body) = send(app(config.clone(), upstream.clone()), request).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, json!({"error": "Method not allowed"}));
        }
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_post_without_credential_is_500_not_set() {
        let upstream = Arc::new(FakeUpstream::replying(200, json!({})));
        let (status, body) = send(
            app(config_with(&[]), upstream.clone()),
            post_json("/api/geminiProxy", json!({"prompt": "anything"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("not set"));
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_gemini_route_normalizes_first_candidate() {
        let upstream = Arc::new(FakeUpstream::replying(
            200,
            json!({"candidates": [
                {"content": {"parts": [{"text": "A"}]}},
                {"content": {"parts": [{"text": "B"}]}}
            ]}),
        ));
        let config = config_with(&[("GEMINI_API_KEY", "g")]);
        let (status, body) = send(
            app(config, upstream),
            post_json("/api/geminiProxy", json!({"prompt": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"content": [{"text": "A"}]}));
    }

    #[tokio::test]
    async fn test_claude_route_forwards_client_key_header_when_allowed() {
        let upstream = Arc::new(FakeUpstream::replying(200, json!({"content": []})));
        let config = config_with(&[("ALLOW_CLIENT_API_KEY", "true")]);
        let request = Request::post("/api/claudeProxy")
            .header("x-api-key", "sk-ant-from-client")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(app(config, upstream.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(upstream
            .last_call()
            .headers
            .contains(&("x-api-key", "sk-ant-from-client".to_string())));
    }

    #[tokio::test]
    async fn test_function_event_adapter_matches_direct_route() {
        let upstream = Arc::new(FakeUpstream::replying(200, json!({"id": "msg_1"})));
        let config = config_with(&[("CLAUDE_API_KEY", "sk-ant-x")]);

        let (status, body) = send(
            app(config.clone(), upstream.clone()),
            post_json(
                "/functions/claude",
                json!({"httpMethod": "POST", "body": "{\"messages\":[]}"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        let inner: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
        assert_eq!(inner, json!({"id": "msg_1"}));

        let (_, body) = send(
            app(config, upstream),
            post_json("/functions/claude", json!({"httpMethod": "GET"})),
        )
        .await;
        assert_eq!(body["statusCode"], 405);
    }

    #[tokio::test]
    async fn test_function_event_unknown_provider_is_404() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(app, post_json("/functions/openai", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_function_event_gets_json_error() {
        let upstream = Arc::new(FakeUpstream::replying(200, json!({})));
        let config = config_with(&[("CLAUDE_API_KEY", "sk-ant-x")]);
        // No content-type and a body that is not JSON
        let request = Request::post("/functions/claude")
            .body(Body::from("httpMethod=POST"))
            .unwrap();
        let (status, body) = send(app(config, upstream.clone()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_estimate_route() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(
            app.clone(),
            Request::get("/api/feedback/estimate?questions=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimated_cost"], "$0.0450 (10 questions)");

        let (status, _) = send(
            app,
            Request::get("/api/feedback/estimate?questions=100001")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feedback_route_without_credential_returns_fallback() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(
            app,
            post_json(
                "/api/feedback",
                json!({
                    "question": "What is a primary key?",
                    "candidate_answer": "I am not sure",
                    "reference_answer": "primary keys enforce entity integrity uniquely identifying every record"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["error_kind"], "not_configured");
        assert!(body["feedback"].as_str().unwrap().contains("Needs More Preparation"));
    }

    #[tokio::test]
    async fn test_trivia_route_without_credential_serves_local_questions() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(
            app.clone(),
            post_json("/api/trivia", json!({"difficulty": "Hard", "count": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["error_kind"], "not_configured");
        let questions = body["questions"].as_array().unwrap();
        assert_eq!(questions.len(), 4);
        assert_eq!(questions[0]["difficulty"], "Hard");
        assert_eq!(questions[0]["answers"].as_array().unwrap().len(), 3);

        let (status, body) = send(app, post_json("/api/trivia", json!({"count": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_trivia_answers_route() {
        let app = app(config_with(&[]), Arc::new(FakeUpstream::replying(200, json!({}))));
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/trivia/answers",
                json!({
                    "question": {"id": 1, "question": "What is a CTE?", "answer": "A named result set"},
                    "pool": [
                        {"id": 2, "question": "What is a view?", "answer": "A stored query"},
                        {"id": 3, "question": "What is a heap?", "answer": "A table without a clustered index"}
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fallback");
        let answers = body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0]["is_correct"], true);
        assert_eq!(answers[0]["text"], "A named result set");

        let (status, _) = send(
            app,
            post_json(
                "/api/trivia/answers",
                json!({"question": {"id": 1, "question": " ", "answer": "x"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Full loop over a real socket: feedback client -> our claude proxy -> fake provider.
    #[tokio::test]
    async fn test_feedback_through_live_proxy() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let proxy_url = format!("http://{addr}/api/claudeProxy");
        let config = config_with(&[
            ("CLAUDE_API_KEY", "sk-ant-server"),
            ("FEEDBACK_PROXY_URL", proxy_url.as_str()),
        ]);
        let upstream = Arc::new(FakeUpstream::replying(
            200,
            json!({"content": [{"type": "text", "text": "Mention NOT NULL."}]}),
        ));
        let router = app(config, upstream.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/feedback"))
            .json(&json!({
                "question": "What is a primary key?",
                "candidate_answer": "A unique column",
                "reference_answer": "A unique, non-null column set",
                "pseudo_code": "CREATE TABLE t (id INT PRIMARY KEY)"
            }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["source"], "live");
        assert_eq!(body["feedback"], "Mention NOT NULL.");
        assert!(body.get("error_kind").is_none());

        let call = upstream.last_call();
        assert_eq!(call.body["model"], "claude-3-5-sonnet-20241022");
        assert!(call.body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("CREATE TABLE t"));
    }
}
