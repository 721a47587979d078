//! User Directory API
//!
//! A small HTTP service that manages user records over a transactional
//! record store. The delete operation is the core contract: existence is
//! verified inside a transaction and the removal is committed or rolled
//! back atomically, with failures classified into typed error kinds.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::{AppState, UserServiceTrait};
use infrastructure::user::{InMemoryUserStore, PgUserStore, UserService};

/// Create the application state with all services initialized
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::load().unwrap_or_default()).await
}

/// Create the application state with custom configuration.
///
/// The store is chosen explicitly here: PostgreSQL when a database URL is
/// configured, the in-memory store otherwise.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let user_service: Arc<dyn UserServiceTrait> = if config.database.url.is_some() {
        let store = PgUserStore::connect(&config.database).await?;
        info!("Using PostgreSQL user store");
        Arc::new(UserService::new(Arc::new(store)))
    } else {
        info!("No database configured, using in-memory user store");
        Arc::new(UserService::new(Arc::new(InMemoryUserStore::new())))
    };

    Ok(AppState::new(user_service))
}
