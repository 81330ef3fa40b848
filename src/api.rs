//! HTTP API for the Green Guardian client core

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::auth::AuthService;
use crate::chat::ChatManager;
use crate::ponds::PondService;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub ponds: Arc<PondService>,
    pub chats: Arc<ChatManager>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, ponds: Arc<PondService>, chats: Arc<ChatManager>) -> Self {
        Self { auth, ponds, chats }
    }
}

/// Allow cross-origin calls from the UI's origin only.
///
/// The process holds the user's session, so without a configured origin no
/// CORS headers are sent and browsers refuse cross-origin reads.
pub fn with_cors(router: Router, allowed_origin: Option<HeaderValue>) -> Router {
    match allowed_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        ),
        None => router,
    }
}
