//! Moonchat server
//!
//! Serves request/response, server-push and socket turns over HTTP.

use moonchat::api::{create_router, AppState};
use moonchat::config::AppConfig;
use moonchat::llm::{EventProducer, LoggingProducer, MoonshotProducer, API_KEY_ENV};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    moonchat::init_server_logging();

    let config = AppConfig::from_env();

    if config.llm.has_credential() {
        tracing::info!(
            model = %config.llm.model,
            base_url = %config.llm.base_url,
            "LLM provider configured"
        );
    } else {
        tracing::warn!("{API_KEY_ENV} is not set; every turn will report a configuration error");
    }

    let producer: Arc<dyn EventProducer> =
        Arc::new(LoggingProducer::new(Arc::new(MoonshotProducer::new(config.llm.clone())?)));

    let state = AppState::new(producer, &config.system_prompt, config.show_thinking);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(compression),
    );

    let addr = config.addr();
    tracing::info!("Moonchat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
