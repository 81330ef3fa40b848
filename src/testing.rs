//! Mock collaborators for tests
//!
//! These stand in for the completion provider, the REST backend and the
//! platform notifier so services can be exercised without real I/O.

use crate::backend::{
    AuthBackend, BackendError, Credentials, LoginResponse, Pond, PondBackend, SensorReading,
    UserProfile,
};
use crate::llm::{CompletionRequest, CompletionResponse, CompletionService, LlmError};
use crate::notify::Notifier;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_http(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ============================================================================
// Scripted completion service
// ============================================================================

type CompletionResult = Result<CompletionResponse, LlmError>;

enum Script {
    /// Answer immediately, every time the prompt is seen
    Fixed(CompletionResult),
    /// Answer once the test sends on the paired sender
    Gated(oneshot::Receiver<CompletionResult>),
}

/// Completion service keyed by prompt.
///
/// Unscripted prompts fail with a network error.
pub struct ScriptedCompletionService {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCompletionService {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, prompt: impl Into<String>, result: CompletionResult) {
        self.scripts
            .lock()
            .unwrap()
            .insert(prompt.into(), Script::Fixed(result));
    }

    /// Hold the answer to `prompt` until the returned sender fires
    pub fn gate(&self, prompt: impl Into<String>) -> oneshot::Sender<CompletionResult> {
        let (tx, rx) = oneshot::channel();
        self.scripts
            .lock()
            .unwrap()
            .insert(prompt.into(), Script::Gated(rx));
        tx
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.recorded_requests()
            .into_iter()
            .map(|r| r.prompt)
            .collect()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        self.requests.lock().unwrap().push(request.clone());

        // Take the gate out so the lock is not held while waiting
        let gate = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.remove(&request.prompt) {
                Some(Script::Fixed(result)) => {
                    scripts.insert(request.prompt.clone(), Script::Fixed(result.clone()));
                    return result;
                }
                Some(Script::Gated(rx)) => rx,
                None => {
                    return Err(LlmError::network(format!(
                        "No scripted response for {:?}",
                        request.prompt
                    )))
                }
            }
        };

        gate.await
            .unwrap_or_else(|_| Err(LlmError::network("Gate dropped")))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Mock auth backend
// ============================================================================

#[derive(Default)]
struct AuthCalls {
    login_failure: Option<BackendError>,
    revoke_failure: Option<BackendError>,
    expired: bool,
    logins: usize,
    validated: Vec<String>,
    revoked: Vec<String>,
}

/// Issues one fixed token and accepts it until told otherwise
pub struct MockAuthBackend {
    token: String,
    state: Mutex<AuthCalls>,
}

impl MockAuthBackend {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: Mutex::new(AuthCalls::default()),
        }
    }

    pub fn fail_login(&self, error: BackendError) {
        self.state.lock().unwrap().login_failure = Some(error);
    }

    pub fn fail_revoke(&self, error: BackendError) {
        self.state.lock().unwrap().revoke_failure = Some(error);
    }

    /// Reject the issued token from now on
    pub fn expire_tokens(&self) {
        self.state.lock().unwrap().expired = true;
    }

    pub fn login_calls(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn validated_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().validated.clone()
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().revoked.clone()
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.logins += 1;
        if let Some(e) = &state.login_failure {
            return Err(e.clone());
        }
        Ok(LoginResponse {
            token: self.token.clone(),
        })
    }

    async fn validate(&self, token: &str) -> Result<UserProfile, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.validated.push(token.to_string());
        if state.expired || token != self.token {
            return Err(BackendError::unauthorized("Token expired"));
        }
        Ok(UserProfile {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Some("farmer".to_string()),
        })
    }

    async fn revoke(&self, token: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.revoke_failure {
            return Err(e.clone());
        }
        state.revoked.push(token.to_string());
        Ok(())
    }
}

// ============================================================================
// Mock pond backend
// ============================================================================

pub struct MockPondBackend {
    accepted_token: Mutex<String>,
    ponds: Vec<Pond>,
    readings: Vec<SensorReading>,
    calls: AtomicUsize,
}

impl MockPondBackend {
    /// Two ponds; `p1` has three readings stored out of order
    pub fn with_sample_data(token: impl Into<String>) -> Self {
        let pond = |id: &str, name: &str, crop: &str| Pond {
            id: id.to_string(),
            name: name.to_string(),
            location: Some("Invernadero norte".to_string()),
            crop: Some(crop.to_string()),
        };
        let reading = |hour: u32, ph: f64| SensorReading {
            pond_id: "p1".to_string(),
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            temperature_c: Some(22.5),
            ph: Some(ph),
            dissolved_oxygen_mg_l: Some(6.8),
            water_level_cm: Some(41.0),
        };

        Self {
            accepted_token: Mutex::new(token.into()),
            ponds: vec![pond("p1", "Estanque 1", "lechuga"), pond("p2", "Estanque 2", "tilapia")],
            readings: vec![reading(12, 6.4), reading(8, 6.1), reading(16, 6.6)],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_accepted_token(&self, token: impl Into<String>) {
        *self.accepted_token.lock().unwrap() = token.into();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, token: &str) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.accepted_token.lock().unwrap() == token {
            Ok(())
        } else {
            Err(BackendError::unauthorized("Invalid token"))
        }
    }

    fn find(&self, pond_id: &str) -> Result<&Pond, BackendError> {
        self.ponds
            .iter()
            .find(|p| p.id == pond_id)
            .ok_or_else(|| BackendError::not_found(format!("Pond {pond_id}")))
    }
}

#[async_trait]
impl PondBackend for MockPondBackend {
    async fn list_ponds(&self, token: &str) -> Result<Vec<Pond>, BackendError> {
        self.check(token)?;
        Ok(self.ponds.clone())
    }

    async fn pond(&self, token: &str, pond_id: &str) -> Result<Pond, BackendError> {
        self.check(token)?;
        self.find(pond_id).cloned()
    }

    async fn sensor_readings(
        &self,
        token: &str,
        pond_id: &str,
    ) -> Result<Vec<SensorReading>, BackendError> {
        self.check(token)?;
        self.find(pond_id)?;
        Ok(self
            .readings
            .iter()
            .filter(|r| r.pond_id == pond_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Recording notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, u32)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, u32)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str, id: u32) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), id));
    }
}
