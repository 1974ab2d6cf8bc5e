//! Networking modules for the terminal's JSON API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` wraps the REST calls made after hydration and `types` defines the
//! shared wire schema.

pub mod api;
pub mod types;
