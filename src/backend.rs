//! REST backend collaborators
//!
//! The backend is an opaque JSON-over-HTTP service using bearer tokens.
//! These traits are what the rest of the crate depends on; [`RestBackend`]
//! is the production implementation.

mod error;
mod models;
mod rest;

pub use error::{BackendError, BackendErrorKind};
pub use models::{Credentials, LoginResponse, Pond, SensorReading, UserProfile};
pub use rest::RestBackend;

use async_trait::async_trait;

/// Authentication endpoints
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError>;

    /// Validate a token and return the profile it belongs to
    async fn validate(&self, token: &str) -> Result<UserProfile, BackendError>;

    /// Invalidate a token server-side
    async fn revoke(&self, token: &str) -> Result<(), BackendError>;
}

/// Pond and sensor data endpoints
#[async_trait]
pub trait PondBackend: Send + Sync {
    async fn list_ponds(&self, token: &str) -> Result<Vec<Pond>, BackendError>;

    async fn pond(&self, token: &str, pond_id: &str) -> Result<Pond, BackendError>;

    async fn sensor_readings(
        &self,
        token: &str,
        pond_id: &str,
    ) -> Result<Vec<SensorReading>, BackendError>;
}
