//! HTTP API for the chat session
//!
//! Exposes the store operations and its observable projections.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::reply::LoggingProvider;
use crate::store::SessionStore;
use std::sync::Arc;

/// Store type served by the binary
pub type ProductionStore = SessionStore<LoggingProvider>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ProductionStore,
    /// Title written into exports
    pub title: Arc<str>,
}

impl AppState {
    pub fn new(store: ProductionStore, title: &str) -> Self {
        Self {
            store,
            title: Arc::from(title),
        }
    }
}
