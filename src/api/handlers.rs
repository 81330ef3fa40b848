//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ConversationCreatedResponse, ConversationResponse, ErrorResponse,
    LoginRequest, LogoutResponse, SuccessResponse,
};
use super::AppState;
use crate::backend::{BackendError, BackendErrorKind, Credentials, Pond, SensorReading, UserProfile};
use crate::chat::{ChatError, ChatHandle};
use crate::session::SessionStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/session", get(get_session))
        .route("/api/session/login", post(login))
        .route("/api/session/logout", post(logout))
        .route("/api/profile", get(get_profile))
        // Monitoring data
        .route("/api/ponds", get(list_ponds))
        .route("/api/ponds/:id", get(get_pond))
        .route("/api/ponds/:id/readings", get(get_readings))
        // Assistant
        .route("/api/conversations", post(create_conversation))
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/:id/messages", post(send_message))
        .route("/api/conversations/:id/stream", get(stream_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.auth.status())
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionStatus>, AppError> {
    state
        .auth
        .login(&Credentials::new(req.email, req.password))
        .await?;
    Ok(Json(state.auth.status()))
}

async fn logout(State(state): State<AppState>) -> Json<LogoutResponse> {
    let outcome = state.auth.logout().await;
    Json(LogoutResponse {
        outcome,
        logged_in: state.auth.status().logged_in,
    })
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.auth.profile().await?))
}

// ============================================================
// Monitoring data
// ============================================================

async fn list_ponds(State(state): State<AppState>) -> Result<Json<Vec<Pond>>, AppError> {
    Ok(Json(state.ponds.list_ponds().await?))
}

async fn get_pond(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Pond>, AppError> {
    Ok(Json(state.ponds.pond(&id).await?))
}

async fn get_readings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SensorReading>>, AppError> {
    Ok(Json(state.ponds.sensor_readings(&id).await?))
}

// ============================================================
// Assistant
// ============================================================

async fn conversation(state: &AppState, id: &str) -> Result<ChatHandle, AppError> {
    state
        .chats
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))
}

async fn create_conversation(
    State(state): State<AppState>,
) -> (StatusCode, Json<ConversationCreatedResponse>) {
    let (id, _) = state.chats.create().await;
    (StatusCode::CREATED, Json(ConversationCreatedResponse { id }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let snapshot = conversation(&state, &id).await?.snapshot().await?;
    Ok(Json(ConversationResponse { id, snapshot }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.chats.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Conversation not found: {id}")))
    }
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let sequence = conversation(&state, &id).await?.submit(req.text).await?;
    Ok((StatusCode::ACCEPTED, Json(ChatResponse { sequence })))
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let chat = conversation(&state, &id).await?;
    // Subscribe before the snapshot so no turn falls between them
    let events = chat.subscribe();
    let init = chat.snapshot().await?;
    Ok(sse_stream(init, events))
}

async fn get_version() -> &'static str {
    concat!("green-guardian ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    /// The backend failed or could not be reached
    Upstream(String),
    Gone(String),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e.kind {
            BackendErrorKind::MissingToken | BackendErrorKind::Unauthorized => {
                AppError::Unauthorized(e.message)
            }
            BackendErrorKind::InvalidRequest => AppError::BadRequest(e.message),
            BackendErrorKind::NotFound => AppError::NotFound(e.message),
            BackendErrorKind::Network | BackendErrorKind::Server | BackendErrorKind::Decode => {
                AppError::Upstream(e.message)
            }
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Closed => AppError::Gone(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
