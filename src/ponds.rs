//! Pond and sensor data for the monitoring screens

use crate::auth::AuthService;
use crate::backend::{BackendError, Pond, PondBackend, SensorReading};
use std::sync::Arc;

pub struct PondService {
    auth: Arc<AuthService>,
    backend: Arc<dyn PondBackend>,
}

impl PondService {
    pub fn new(auth: Arc<AuthService>, backend: Arc<dyn PondBackend>) -> Self {
        Self { auth, backend }
    }

    pub async fn list_ponds(&self) -> Result<Vec<Pond>, BackendError> {
        let backend = Arc::clone(&self.backend);
        let ponds = self
            .auth
            .authorized(|token| async move { backend.list_ponds(&token).await })
            .await?;
        tracing::debug!(count = ponds.len(), "Loaded ponds");
        Ok(ponds)
    }

    pub async fn pond(&self, pond_id: &str) -> Result<Pond, BackendError> {
        let backend = Arc::clone(&self.backend);
        self.auth
            .authorized(|token| async move { backend.pond(&token, pond_id).await })
            .await
    }

    /// Readings for one pond, oldest first
    pub async fn sensor_readings(&self, pond_id: &str) -> Result<Vec<SensorReading>, BackendError> {
        let backend = Arc::clone(&self.backend);
        let mut readings = self
            .auth
            .authorized(|token| async move { backend.sensor_readings(&token, pond_id).await })
            .await?;
        readings.sort_by_key(|r| r.recorded_at);
        tracing::debug!(pond_id, count = readings.len(), "Loaded sensor readings");
        Ok(readings)
    }
}
