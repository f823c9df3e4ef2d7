//! HTTP request handlers

use super::sse::{projection_events, sse_stream, EventStream};
use super::types::{
    ErrorRequest, ErrorResponse, ImportResponse, LoadingRequest, SendRequest, SendResponse,
    StatusRequest, StreamView, SuccessResponse,
};
use super::{AppState, ProductionStore};
use crate::codec::{export_file_name, export_json};
use crate::session::{ImportPolicy, Message, SessionState, Settings, SettingsPatch};
use crate::store::PendingReply;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Snapshot and live projections
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        .route("/api/session/loading", put(set_loading))
        .route("/api/session/error", put(set_error))
        // Messages
        .route(
            "/api/messages",
            post(send_message).delete(clear_messages),
        )
        .route("/api/messages/raw", post(add_message))
        .route("/api/messages/:id/retry", post(retry_message))
        .route("/api/messages/:id/status", post(update_status))
        // Settings
        .route("/api/settings", get(get_settings).patch(update_settings))
        // Export / import
        .route("/api/export", get(export_session))
        .route("/api/import", post(import_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.store.snapshot().as_ref().clone())
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    #[serde(default)]
    view: StreamView,
}

async fn stream_session(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    let store = &state.store;
    let events: EventStream = match query.view {
        StreamView::All => projection_events("state", store.watch_state()),
        StreamView::Messages => projection_events("messages", store.watch_messages()),
        StreamView::Loading => projection_events("loading", store.watch_loading()),
        StreamView::Error => projection_events("error", store.watch_error()),
        StreamView::Settings => projection_events("settings", store.watch_settings()),
    };
    tracing::debug!(view = ?query.view, "Observer connected");
    sse_stream(events)
}

async fn set_loading(
    State(state): State<AppState>,
    Json(req): Json<LoadingRequest>,
) -> Json<SuccessResponse> {
    state.store.set_loading(req.loading);
    Json(SuccessResponse { success: true })
}

async fn set_error(
    State(state): State<AppState>,
    Json(req): Json<ErrorRequest>,
) -> Json<SuccessResponse> {
    state.store.set_error(req.error);
    Json(SuccessResponse { success: true })
}

// ============================================================
// Messages
// ============================================================

/// Resolve the round trip in the background; observers see the outcome
fn spawn_resolve(store: &ProductionStore, pending: PendingReply) -> SendResponse {
    let message_id = pending.message_id.clone();
    let store = store.clone();
    tokio::spawn(async move {
        let outcome = store.resolve(pending).await;
        tracing::debug!(?outcome, "Round trip resolved");
    });
    SendResponse {
        message_id,
        queued: true,
    }
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let pending = state
        .store
        .begin_send(&req.content)
        .ok_or_else(|| AppError::BadRequest("Message content is empty".to_string()))?;

    Ok(Json(spawn_resolve(&state.store, pending)))
}

async fn retry_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SendResponse>, AppError> {
    let Some(pending) = state.store.begin_retry(&id) else {
        return Err(match state.store.snapshot().message(&id) {
            None => AppError::NotFound(format!("Message not found: {id}")),
            Some(message) => AppError::Conflict(format!(
                "Message {id} cannot be retried (status: {})",
                message.status.map_or("settled", |s| s.as_str())
            )),
        });
    };

    Ok(Json(spawn_resolve(&state.store, pending)))
}

async fn add_message(
    State(state): State<AppState>,
    Json(message): Json<Message>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = message.id.clone();
    if !state.store.add_message(message) {
        return Err(AppError::Conflict(format!("Message id already exists: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.update_message_status(&id, req.status) {
        return Err(AppError::NotFound(format!("Message not found: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn clear_messages(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.store.clear_messages();
    Json(SuccessResponse { success: true })
}

// ============================================================
// Settings
// ============================================================

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.snapshot().settings.clone())
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Json<Settings> {
    state.store.update_settings(patch);
    Json(state.store.snapshot().settings.clone())
}

// ============================================================
// Export / Import
// ============================================================

async fn export_session(State(state): State<AppState>) -> Result<Response, AppError> {
    let document = state.store.export(state.title.as_ref());
    let body = export_json(&document).map_err(|e| AppError::Internal(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct ImportQuery {
    #[serde(default)]
    policy: ImportPolicy,
}

async fn import_session(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let imported = state
        .store
        .import_json(&body, query.policy)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::info!(imported, policy = ?query.policy, "Imported chat file");
    Ok(Json(ImportResponse { imported }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("chat-session ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
