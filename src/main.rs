//! Chat session service
//!
//! Owns one conversational session: its messages, loading and error state,
//! and display settings. The session is persisted to SQLite and served over
//! HTTP with live projections as Server-Sent Events.

mod api;
mod codec;
mod config;
mod db;
mod reply;
mod session;
mod store;

use api::{create_router, AppState};
use config::Config;
use db::{Database, DEFAULT_SNAPSHOT_NAME};
use reply::{LoggingProvider, SimulatedReplyProvider};
use session::{SessionState, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use store::{DatabaseSink, SessionStore};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_session=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    // Restore the persisted session. In-flight sends cannot survive a restart.
    let initial = match db.load_snapshot(DEFAULT_SNAPSHOT_NAME) {
        Ok(Some(persisted)) => {
            let saved_at = db.snapshot_updated_at(DEFAULT_SNAPSHOT_NAME).ok().flatten();
            tracing::info!(
                messages = persisted.messages.len(),
                saved_at = ?saved_at,
                "Restored session snapshot"
            );
            SessionState::restore(persisted)
        }
        Ok(None) => SessionState::new(Settings::default()),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable session snapshot");
            SessionState::new(Settings::default())
        }
    };

    let provider = LoggingProvider::new(Arc::new(SimulatedReplyProvider::new(
        config.reply_delay,
    )));
    let sink = DatabaseSink::new(db, DEFAULT_SNAPSHOT_NAME);
    let store = SessionStore::with_sink(initial, provider, Arc::new(sink));

    let state = AppState::new(store, &config.title);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chat session server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
