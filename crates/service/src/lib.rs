//! Service layer for the favorites store.
//! - `favorites`: the per-owner update protocol and its repository seam.
//! - `campsites`: read-side resolution of stored ids into campsite views.
//! - `file` / `storage`: JSON-file persistence backing the repository.

pub mod errors;
pub mod campsites;
pub mod favorites;
pub mod file;
pub mod storage;
