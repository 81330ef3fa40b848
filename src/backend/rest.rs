//! reqwest implementation of the backend traits

use super::{
    AuthBackend, BackendError, Credentials, LoginResponse, Pond, PondBackend, SensorReading,
    UserProfile,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// JSON-over-HTTP client for the Green Guardian backend
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return the raw body of a successful response
    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                BackendError::network(format!("Connection failed: {e}"))
            } else {
                BackendError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(BackendError::from_status(status, &body));
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, BackendError> {
        let body = self
            .send(self.client.get(self.url(path)).bearer_auth(token))
            .await?;
        decode(path, &body)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body)
        .map_err(|e| BackendError::decode(format!("Failed to parse {path} response: {e}")))
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        let path = "/api/auth/login";
        let body = self
            .send(self.client.post(self.url(path)).json(credentials))
            .await?;
        decode(path, &body)
    }

    async fn validate(&self, token: &str) -> Result<UserProfile, BackendError> {
        self.get_json("/api/auth/me", token).await
    }

    async fn revoke(&self, token: &str) -> Result<(), BackendError> {
        self.send(self.client.post(self.url("/api/auth/logout")).bearer_auth(token))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PondBackend for RestBackend {
    async fn list_ponds(&self, token: &str) -> Result<Vec<Pond>, BackendError> {
        self.get_json("/api/ponds", token).await
    }

    async fn pond(&self, token: &str, pond_id: &str) -> Result<Pond, BackendError> {
        self.get_json(&format!("/api/ponds/{pond_id}"), token).await
    }

    async fn sensor_readings(
        &self,
        token: &str,
        pond_id: &str,
    ) -> Result<Vec<SensorReading>, BackendError> {
        self.get_json(&format!("/api/ponds/{pond_id}/readings"), token)
            .await
    }
}
