//! Moonchat - streaming chat with reasoning-capable models
//!
//! A conversation is turned into a lazy stream of [`event::Event`]s by an
//! [`llm::EventProducer`]. The [`framing`] state machine separates reasoning
//! from answer text and drives [`sink`]s, [`aggregate`] reduces the stream to
//! final strings, and [`turn`] persists the result back into the
//! [`conversation`].

pub mod aggregate;
pub mod api;
pub mod config;
pub mod conversation;
pub mod event;
pub mod framing;
pub mod llm;
pub mod sink;
pub mod store;
pub mod turn;

/// Install a JSON subscriber for the server process
pub fn init_server_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moonchat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
}

/// Install a compact stderr subscriber so logs never mix with streamed output
pub fn init_cli_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moonchat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
