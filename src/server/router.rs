use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health, sessions};
use crate::state::AppState;

/// Creates the application router: chat, health and session routes behind
/// CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route(
            "/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let mut origins = configured
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    if origins.is_empty() {
        origins = default_local_origins()
            .into_iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<&'static str> {
    vec![
        "http://localhost",
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::prompts::CAPABILITY_MENU;
    use crate::assistant::OutcomeStatus;
    use crate::core::config::{AppPaths, ConfigService, Settings};
    use crate::server::handlers::chat::ChatResponseBody;
    use crate::testing::{StubLlm, StubScraper, StubSearch};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let paths = Arc::new(AppPaths::from_dirs(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        ));
        Arc::new(AppState::with_collaborators(
            paths.clone(),
            ConfigService::new(paths),
            Settings::default(),
            Arc::new(StubLlm::new()),
            Arc::new(StubSearch::new()),
            Arc::new(StubScraper::new()),
        ))
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));

        let response = app.oneshot(post_chat(r#"{"message": "   "}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["response"], "No query provided");
    }

    #[tokio::test]
    async fn greeting_returns_menu_and_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let app = router(state.clone());

        let response = app.oneshot(post_chat(r#"{"message": "hello"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.response, CAPABILITY_MENU);
        assert_eq!(body.status, OutcomeStatus::Error);
        assert!(uuid::Uuid::parse_str(&body.session_id).is_ok());
        assert_eq!(state.history.get_history(&body.session_id).await.len(), 2);
    }

    #[tokio::test]
    async fn supplied_session_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let first = router(state.clone())
            .oneshot(post_chat(r#"{"message": "hi", "session_id": "s-1"}"#))
            .await
            .unwrap();
        assert_eq!(json_body(first).await["session_id"], "s-1");

        let info = router(state.clone())
            .oneshot(Request::get("/sessions/s-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(info.status(), StatusCode::OK);
        assert_eq!(json_body(info).await["session"]["message_count"], 2);

        let deleted = router(state.clone())
            .oneshot(
                Request::delete("/sessions/s-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let missing = router(state)
            .oneshot(Request::get("/sessions/s-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_index_size() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["fragments"], 0);
    }
}
