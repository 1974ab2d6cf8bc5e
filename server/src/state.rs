//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the immutable process settings, and the
//! scheduler handle. All trading state of record lives in Postgres; the only
//! in-memory trading state is inside the scheduler loop.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Settings;
use crate::services::engine::Scheduler;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub scheduler: Scheduler,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        Self { pool, settings: Arc::new(settings), scheduler: Scheduler::new() }
    }

    /// Paper mode as seen by order placement: the env override wins.
    #[must_use]
    pub fn effective_paper(&self, db_paper_flag: bool) -> bool {
        self.settings.paper_only || db_paper_flag
    }
}

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
