//! Domain services used by the HTTP routes and the scheduler.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation. `engine` is the only
//! module that runs on its own; everything else is called per request or
//! per cycle.

pub mod config;
pub mod dhan;
pub mod engine;
pub mod event_log;
pub mod orders;
pub mod risk;
pub mod strategies;
