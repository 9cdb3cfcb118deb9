//! Shared runtime helpers for the favorites workspace: logging setup and
//! startup environment checks.

pub mod env;
pub mod utils;
