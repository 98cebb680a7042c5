use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collab_relay::{
    app,
    config::{AssistantConfig, ServerConfig},
    llm,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collab_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting collab-relay...");

    let server_config = ServerConfig::from_env();
    let assistant_config = AssistantConfig::from_env();
    let llm_config = llm::LlmConfig::from_env();

    let assistant = if assistant_config.enabled {
        match llm_config.build_provider() {
            Ok(provider) => {
                tracing::info!("AI assistant using provider {}", provider.name());
                Some(provider)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize LLM provider: {}. Assistant replies will fall back.",
                    e
                );
                None
            }
        }
    } else {
        tracing::info!("AI assistant disabled");
        None
    };

    let state = Arc::new(AppState::new_with_assistant(
        assistant,
        llm_config,
        assistant_config,
    ));

    let listener =
        tokio::net::TcpListener::bind((server_config.host.as_str(), server_config.port)).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
