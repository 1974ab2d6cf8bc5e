//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its data loading and actions and delegates shared chrome
//! (headers, tables, notices) to `components`.

pub mod config;
pub mod control;
pub mod dashboard;
pub mod not_found;
pub mod strategies;
