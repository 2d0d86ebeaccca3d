//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::UploadStore;
use crate::config::Config;
use civica_core::ports::StoreService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<Config>,
}
