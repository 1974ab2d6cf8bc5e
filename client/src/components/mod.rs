//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render terminal chrome (sidebar, headers, tables, notices)
//! while pages own data loading and actions.

pub mod notice;
pub mod orders_table;
pub mod page_header;
pub mod sidebar;
