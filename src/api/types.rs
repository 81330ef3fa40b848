//! API request and response types

use crate::auth::LogoutOutcome;
use crate::chat::ChatSnapshot;
use serde::{Deserialize, Serialize};

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response after a message is accepted
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Sequence of the user turn that was appended
    pub sequence: u64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    #[serde(flatten)]
    pub outcome: LogoutOutcome,
    pub logged_in: bool,
}

/// Response with a newly created conversation
#[derive(Debug, Serialize)]
pub struct ConversationCreatedResponse {
    pub id: String,
}

/// Response with conversation state
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    #[serde(flatten)]
    pub snapshot: ChatSnapshot,
}

/// Success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
