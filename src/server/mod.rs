//! HTTP surface for the assistant

mod handlers;
mod page;

use crate::assistant::Assistant;
use crate::error::{Error, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

/// Error returned by handlers, rendered as `{ "error", "status" }`
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::UnsupportedUpload(_) | Error::InvalidRequest(_) | Error::InvalidPath(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.0.to_string(),
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}

pub fn router(assistant: Arc<Assistant>) -> Router {
    let body_limit = assistant.config().server.max_upload_bytes;
    let state = AppState { assistant };

    Router::new()
        .route("/", get(handlers::index_page))
        .route("/health", get(handlers::health))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", get(handlers::get_session))
        .route("/api/sessions/:id/key", post(handlers::set_key))
        .route("/api/sessions/:id/uploads", post(handlers::upload))
        .route("/api/sessions/:id/process", post(handlers::process))
        .route("/api/sessions/:id/messages", post(handlers::send_message))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(assistant: Arc<Assistant>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(assistant)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::FakeProvider;
    use crate::chat::testing::ScriptedModel;
    use crate::config::{Config, WorkspaceConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(tmp: &TempDir) -> Router {
        let mut config = Config::default();
        config.workspace = WorkspaceConfig {
            data_dir: tmp.path().join("data"),
            ..WorkspaceConfig::default()
        };
        config.paths.secrets_file = tmp.path().join("secrets.toml");
        config.llm.api_key_env = "SETU_TEST_SERVER_KEY_UNSET".to_string();
        std::fs::create_dir_all(&config.workspace.data_dir).unwrap();
        std::fs::write(
            config.workspace.data_dir.join("schemes.txt"),
            "The seed grant funds prototypes.",
        )
        .unwrap();

        let provider = Arc::new(FakeProvider::new(ScriptedModel::new()));
        router(Arc::new(Assistant::new(config, provider).unwrap()))
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart(uri: &str, file_name: &str, content: &str) -> Request<Body> {
        let boundary = "setu-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n--{boundary}--\r\n"
        );
        Request::post(uri)
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_and_health() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("PolyVest"));

        let (status, body) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_session_flow() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);

        let (status, view) = call(&app, Request::post("/api/sessions").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["readiness"]["state"], "missing_credential");
        assert_eq!(view["notice"], "Enter Groq API Key to start.");
        let id = view["id"].as_str().unwrap().to_string();

        let (_, turn) = call(
            &app,
            post_json(&format!("/api/sessions/{id}/messages"), serde_json::json!({"message": "hi"})),
        )
        .await;
        assert_eq!(turn["outcome"], "not_ready");

        let (_, view) = call(
            &app,
            post_json(&format!("/api/sessions/{id}/key"), serde_json::json!({"api_key": "gsk_x"})),
        )
        .await;
        assert_eq!(view["readiness"]["state"], "ready");

        let (status, turn) = call(
            &app,
            post_json(
                &format!("/api/sessions/{id}/messages"),
                serde_json::json!({"message": "Which grant?"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["outcome"], "replied");
        assert_eq!(turn["response"], "reply to: Which grant?");
        let source = &turn["sources"][0];
        assert!(source["path"].is_string());
        assert_eq!(source["chunk_index"], 0);

        let (_, view) = call(&app, Request::get(format!("/api/sessions/{id}")).body(Body::empty()).unwrap()).await;
        assert_eq!(view["transcript"].as_array().unwrap().len(), 2);
        assert_eq!(view["transcript"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_upload_and_process() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);
        let (_, view) = call(&app, Request::post("/api/sessions").body(Body::empty()).unwrap()).await;
        let id = view["id"].as_str().unwrap().to_string();
        call(
            &app,
            post_json(&format!("/api/sessions/{id}/key"), serde_json::json!({"api_key": "gsk_x"})),
        )
        .await;

        let (status, saved) = call(
            &app,
            multipart(&format!("/api/sessions/{id}/uploads"), "deck.txt", "Our deck asks for 2 crore."),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["message"], "Saved: deck.txt");
        assert!(tmp.path().join("data/uploads/deck.txt").exists());

        let (status, view) = call(
            &app,
            Request::post(format!("/api/sessions/{id}/process")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["readiness"]["documents"], 2);

        let (status, err) = call(
            &app,
            multipart(&format!("/api/sessions/{id}/uploads"), "malware.exe", "MZ"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["status"], 400);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);
        let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());

        let (status, body) = call(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Session not found"));
    }
}
