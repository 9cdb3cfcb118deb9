//! Domain records for the favorites store: identifiers, the per-owner
//! favorites set and the campsite views produced on read.

pub mod errors;
pub mod ids;
pub mod favorite;
pub mod campsite;
