//! File-backed repositories.

pub mod favorites_store;
