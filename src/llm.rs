//! Completion provider abstraction
//!
//! The chat assistant only needs "turn this prompt into a reply"; providers
//! sit behind [`CompletionService`] so the router can be driven by mocks.

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Common interface for completion providers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Configuration for the completion provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Alternate base URL (proxy or compatible provider), e.g. `http://localhost:4000`
    pub gateway: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Read provider settings through `lookup`; blank values count as unset.
    ///
    /// The timeout is left at its default; `AppConfig` validates and sets it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: get("OPENAI_API_KEY"),
            gateway: get("LLM_GATEWAY"),
            model: get("GREEN_GUARDIAN_MODEL").unwrap_or(defaults.model),
            timeout: defaults.timeout,
        }
    }

    /// Build the configured provider, wrapped with logging.
    ///
    /// A gateway without a key is allowed (the gateway handles auth); a direct
    /// connection requires a key.
    pub fn build_service(&self) -> Result<Arc<dyn CompletionService>, LlmError> {
        let api_key = match (&self.api_key, &self.gateway) {
            (Some(key), _) => key.clone(),
            (None, Some(_)) => "implicit".to_string(),
            (None, None) => {
                return Err(LlmError::auth(
                    "No completion provider configured. Set OPENAI_API_KEY or LLM_GATEWAY.",
                ))
            }
        };

        let service = OpenAIService::new(
            api_key,
            self.model.clone(),
            self.gateway.as_deref(),
            self.timeout,
        )?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Completion request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    "Completion request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Stand-in used when no provider is configured; every request fails with
/// the configuration error
pub struct UnavailableService {
    error: LlmError,
}

impl UnavailableService {
    pub fn new(error: LlmError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl CompletionService for UnavailableService {
    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(self.error.clone())
    }

    fn model_id(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletionService;

    #[test]
    fn test_no_key_no_gateway_is_rejected() {
        let config = LlmConfig::default();
        let err = config.build_service().err().unwrap();
        assert_eq!(err.kind, LlmErrorKind::Auth);
    }

    #[test]
    fn test_gateway_without_key_builds() {
        let config = LlmConfig {
            gateway: Some("http://localhost:4000".to_string()),
            ..Default::default()
        };
        let service = config.build_service().unwrap();
        assert_eq!(service.model_id(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_unavailable_service_reports_config_error() {
        let err = LlmConfig::default().build_service().err().unwrap();
        let service = UnavailableService::new(err);
        let result = service
            .complete(&CompletionRequest::single_turn("hidroponía"))
            .await;
        assert_eq!(result.unwrap_err().kind, LlmErrorKind::Auth);
    }

    #[test]
    fn test_from_lookup_ignores_blank_values() {
        let config = LlmConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("   ".to_string()),
            "GREEN_GUARDIAN_MODEL" => Some(String::new()),
            _ => None,
        });
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_logging_service_passes_results_through() {
        let inner = Arc::new(ScriptedCompletionService::new());
        inner.respond("hola", Ok(CompletionResponse::text("respuesta")));
        inner.respond("falla", Err(LlmError::server_error("boom")));
        let service = LoggingService::new(inner.clone());

        let ok = service
            .complete(&CompletionRequest::single_turn("hola"))
            .await
            .unwrap();
        assert_eq!(ok.text, "respuesta");

        let err = service
            .complete(&CompletionRequest::single_turn("falla"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert_eq!(inner.recorded_prompts(), vec!["hola", "falla"]);
    }
}
