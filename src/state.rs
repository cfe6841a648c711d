// src/state.rs
use std::sync::Arc;
use std::time::Instant;

use crate::session::SessionIssuer;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionIssuer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, sessions: SessionIssuer) -> Self {
        Self {
            store,
            sessions: Arc::new(sessions),
            started_at: Instant::now(),
        }
    }
}
