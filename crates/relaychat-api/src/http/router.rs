//! Axum router configuration with middleware.
//!
//! Chat routes run behind the identity middleware; `/api/providers` and
//! `/health` are identity-free. Middleware: CORS, tracing.
//!
//! When `server.web_dir` names an existing directory, unknown paths fall
//! through to static files served from it.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::extractors::identity::resolve_identity;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let chat_routes = Router::new()
        .route("/", get(handlers::chat::index))
        .route("/api/chat", post(handlers::chat::send_message))
        .route("/api/chat/clear", post(handlers::chat::clear_chat))
        .route("/api/usage", get(handlers::usage::get_usage))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ));

    let web_dir = state.server.web_dir.clone();

    let mut router = Router::new()
        .merge(chat_routes)
        .route("/api/providers", get(handlers::providers::list_providers))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| std::path::Path::new(dir).is_dir()) {
        router = router.fallback_service(ServeDir::new(&web_dir));
        tracing::info!(path = %web_dir, "Static file serving enabled");
    }

    router
}

/// GET /health - Liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use relaychat_core::llm::box_provider::BoxLlmProvider;
    use relaychat_core::llm::provider::LlmProvider;
    use relaychat_core::llm::selector::{CompletionParams, ModeState, ProviderSelector};
    use relaychat_infra::sqlite::pool::DatabasePool;
    use relaychat_types::config::GlobalConfig;
    use relaychat_types::llm::{CompletionRequest, LlmError, ProviderMode};

    struct StubProvider {
        name: &'static str,
        fail: Option<LlmError>,
    }

    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> impl Future<Output = Result<String, LlmError>> + Send {
            let outcome = match &self.fail {
                Some(err) => Err(err.clone()),
                None => Ok(format!("reply from {}", self.name)),
            };
            async move { outcome }
        }
    }

    fn stub(name: &'static str, fail: Option<LlmError>) -> BoxLlmProvider {
        BoxLlmProvider::new(StubProvider { name, fail })
    }

    /// App that trusts `x-authenticated-user`, as behind an auth proxy.
    async fn app_with(secondary_fail: Option<LlmError>) -> Router {
        let mut config = GlobalConfig::default();
        config.server.user_header = Some("x-authenticated-user".to_string());
        app_from(&config, secondary_fail).await
    }

    async fn app_from(config: &GlobalConfig, secondary_fail: Option<LlmError>) -> Router {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_path_buf();
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);

        let url = format!("sqlite://{}?mode=rwc", data_dir.join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        let selector = ProviderSelector::new(
            stub("Secondary", secondary_fail),
            stub("Primary", None),
            stub("Local", None),
            Arc::new(ModeState::new(ProviderMode::Secondary)),
            CompletionParams::default(),
        );
        let state = AppState::from_parts(config, pool, selector, data_dir);
        build_router(state)
    }

    async fn app() -> Router {
        app_with(None).await
    }

    fn chat_request(body: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header("x-authenticated-user", user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, user: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-authenticated-user", user)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_for_authenticated_user() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("42")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let body = json_body(response).await;
        assert_eq!(body["response"], "reply from Secondary");
        assert_eq!(body["remaining_messages"], 4);
        assert_eq!(body["ai_info"]["mode"], "secondary");
        assert_eq!(body["ai_info"]["is_local"], false);

        let snapshot = json_body(app.oneshot(get_request("/", "42")).await.unwrap()).await;
        let history = snapshot["chat_history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "hi");
        assert_eq!(history[1]["role"], "assistant");
        assert_eq!(snapshot["remaining_messages"], 4);
    }

    #[tokio::test]
    async fn test_anonymous_caller_gets_session_cookie() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"hello"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("relaychat_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        // Replaying the cookie keeps the same session.
        let pair = cookie.split(';').next().unwrap().to_string();
        let request = Request::builder()
            .uri("/")
            .header(COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        let snapshot = json_body(response).await;
        assert_eq!(snapshot["chat_history"].as_array().unwrap().len(), 2);
        assert_eq!(snapshot["remaining_messages"], 4);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_cost() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"   "}"#, Some("7")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid_request");
        assert_eq!(body["message"], "Message cannot be empty.");

        let response = app
            .clone()
            .oneshot(chat_request("{}", Some("7")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Invalid request. Message is required.");

        let usage = json_body(app.oneshot(get_request("/api/usage", "7")).await.unwrap()).await;
        assert_eq!(usage["remaining_messages"], 5);
        assert_eq!(usage["is_limited"], false);
        assert!(usage["limit_info"].is_null());
    }

    #[tokio::test]
    async fn test_rate_limited_after_quota() {
        let app = app().await;
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(chat_request(r#"{"message":"hi"}"#, Some("8")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"one more"}"#, Some("8")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = json_body(response).await;
        assert_eq!(body["error"], "rate_limit_exceeded");
        assert_eq!(body["limit_info"]["limit"], 5);
        assert!(body["limit_info"]["remaining_time"].as_i64().unwrap() > 0);

        let usage = json_body(app.oneshot(get_request("/api/usage", "8")).await.unwrap()).await;
        assert_eq!(usage["is_limited"], true);
        assert_eq!(usage["remaining_messages"], 0);
        assert_eq!(usage["limit_info"]["limit"], 5);
    }

    #[tokio::test]
    async fn test_fallback_is_reported_in_ai_info() {
        let app = app_with(Some(LlmError::QuotaExceeded {
            provider: "Secondary".into(),
        }))
        .await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("9")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], "reply from Primary");
        assert_eq!(body["ai_info"]["mode"], "primary");

        let request = Request::builder()
            .uri("/api/providers")
            .body(Body::empty())
            .unwrap();
        let providers = json_body(app.clone().oneshot(request).await.unwrap()).await;
        assert_eq!(providers["ai_info"]["mode"], "primary");
        assert_eq!(providers["initial_mode"], "secondary");
        assert_eq!(providers["chain"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_mode_cannot_be_reset_over_http() {
        let app = app_with(Some(LlmError::QuotaExceeded {
            provider: "Secondary".into(),
        }))
        .await;
        app.clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("12")))
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/providers/reset")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("POST")
            .uri("/api/providers")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::builder()
            .uri("/api/providers")
            .body(Body::empty())
            .unwrap();
        let providers = json_body(app.oneshot(request).await.unwrap()).await;
        assert_eq!(providers["ai_info"]["mode"], "primary");
    }

    #[tokio::test]
    async fn test_user_header_is_untrusted_by_default() {
        let app = app_from(&GlobalConfig::default(), None).await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("42")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_some());

        // Claiming the same user id again reaches nobody's history or quota.
        let response = app.oneshot(get_request("/", "42")).await.unwrap();
        assert!(response.headers().get(SET_COOKIE).is_some());
        let snapshot = json_body(response).await;
        assert!(snapshot["chat_history"].as_array().unwrap().is_empty());
        assert_eq!(snapshot["remaining_messages"], 5);
    }

    #[tokio::test]
    async fn test_unrecognized_failure_hides_details() {
        let app = app_with(Some(LlmError::Network("connection reset by peer".into()))).await;

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("10")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "server_error");
        assert!(!body["message"].as_str().unwrap().contains("connection reset"));

        // The failed request did not cost quota.
        let usage = json_body(app.oneshot(get_request("/api/usage", "10")).await.unwrap()).await;
        assert_eq!(usage["remaining_messages"], 5);
    }

    #[tokio::test]
    async fn test_clear_keeps_quota() {
        let app = app().await;
        app.clone()
            .oneshot(chat_request(r#"{"message":"hi"}"#, Some("11")))
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat/clear")
            .header("x-authenticated-user", "11")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let snapshot = json_body(app.oneshot(get_request("/", "11")).await.unwrap()).await;
        assert!(snapshot["chat_history"].as_array().unwrap().is_empty());
        assert_eq!(snapshot["remaining_messages"], 4);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
