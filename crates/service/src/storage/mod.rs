//! Storage abstractions for service layer
//!
//! Contains reusable file-backed stores used by the repositories.

pub mod json_map_store;
