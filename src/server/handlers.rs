use super::{ApiError, AppState};
use crate::assistant::{SessionView, TurnOutcome};
use crate::error::Error;
use axum::extract::{Multipart, Path, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub bytes: usize,
    pub message: String,
}

pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let config = state.assistant.config();
    Html(super::page::render_page(
        &config.server.title,
        &config.server.tagline,
        state.assistant.workspace().allowed_extensions(),
    ))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn create_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    Ok(Json(state.assistant.open_session().await?))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionView> {
    Ok(Json(state.assistant.render(id).await?))
}

pub async fn set_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<KeyRequest>,
) -> ApiResult<SessionView> {
    Ok(Json(state.assistant.set_api_key(id, &request.api_key).await?))
}

pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidRequest("Upload has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        let saved = state.assistant.upload(id, &file_name, &bytes).await?;
        return Ok(Json(UploadResponse {
            message: format!("Saved: {}", saved.file_name),
            file_name: saved.file_name,
            bytes: saved.bytes,
        }));
    }

    Err(Error::InvalidRequest("Missing multipart field 'file'".to_string()).into())
}

pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionView> {
    Ok(Json(state.assistant.reprocess(id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<TurnOutcome> {
    Ok(Json(state.assistant.chat(id, &request.message).await?))
}
