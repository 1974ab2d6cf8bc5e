//! Terminal-wide status snapshot shared by the sidebar and the dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard polls `/api/dashboard/status` and writes the result here;
//! the sidebar reads it to show the trading mode and scheduler badge on every
//! route without issuing its own requests.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod terminal_test;

use crate::net::types::SystemStatus;

/// Last known system status plus fetch bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct TerminalState {
    pub status: Option<SystemStatus>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl TerminalState {
    /// Record a successful status fetch.
    pub fn apply_status(&mut self, status: SystemStatus) {
        self.status = Some(status);
        self.loading = false;
        self.last_error = None;
    }

    /// Record a failed status fetch. The previous snapshot is kept.
    pub fn apply_error(&mut self, error: String) {
        self.loading = false;
        self.last_error = Some(error);
    }

    /// Human label for the current trading mode.
    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        match &self.status {
            Some(s) if s.paper_trade => "Paper Trading",
            Some(_) => "Live Trading",
            None => "Mode unknown",
        }
    }

    /// Human label for the scheduler state.
    #[must_use]
    pub fn scheduler_label(&self) -> &'static str {
        match &self.status {
            Some(s) if s.scheduler_running => "Scheduler running",
            Some(_) => "Scheduler stopped",
            None => "Scheduler unknown",
        }
    }

    /// True when orders would reach the broker.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.as_ref().is_some_and(|s| !s.paper_trade)
    }
}
