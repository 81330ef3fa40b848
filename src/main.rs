//! Green Guardian - hydroponics monitoring client core
//!
//! Serves the session, pond data and chat assistant API to the UI.

use green_guardian::api::{create_router, with_cors, AppState};
use green_guardian::auth::AuthService;
use green_guardian::backend::RestBackend;
use green_guardian::chat::{ChatManager, KeywordClassifier, Replies};
use green_guardian::config::AppConfig;
use green_guardian::llm::UnavailableService;
use green_guardian::notify::TracingNotifier;
use green_guardian::ponds::PondService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "green_guardian=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        model = %config.llm.model,
        gateway = ?config.llm.gateway,
        keywords = ?config.keywords_path,
        revoke_on_logout = config.revoke_on_logout,
        allowed_origin = ?config.allowed_origin,
        "Configuration loaded"
    );

    // Backend and services
    let backend = Arc::new(RestBackend::new(&config.backend_url, config.http_timeout)?);
    let auth = Arc::new(
        AuthService::new(backend.clone(), Arc::new(TracingNotifier))
            .with_revoke_on_logout(config.revoke_on_logout),
    );
    let ponds = Arc::new(PondService::new(auth.clone(), backend));

    let completions = match config.llm.build_service() {
        Ok(service) => service,
        Err(e) => {
            tracing::warn!(error = %e, "Chat completions unavailable; assistant will reply with the failure message");
            Arc::new(UnavailableService::new(e))
        }
    };
    let chats = Arc::new(ChatManager::new(
        completions,
        Arc::new(KeywordClassifier::new(&config.keywords)),
        Replies::default(),
    ));

    // Create router
    let app = with_cors(
        create_router(AppState::new(auth, ponds, chats)).layer(TraceLayer::new_for_http()),
        config.allowed_origin.clone(),
    );

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Green Guardian listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
