// src/lib.rs
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod poll;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

/// Build the application state from configuration, connecting to Postgres
/// when a database URL is configured.
pub async fn build_state(config: &Config) -> Result<AppState, sqlx::Error> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.max_connections).await?;
            tracing::info!("using PostgreSQL store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let sessions = SessionIssuer::new(
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    );
    Ok(AppState::new(store, sessions))
}
