//! Favorites module: per-owner favorites sets (domain outcomes, repository
//! seam, owner lock table and the service applying the update protocol).

pub mod domain;
pub mod locks;
pub mod repository;
pub mod service;

pub use domain::{AddOutcome, ClearOutcome, RemoveOutcome};
pub use service::FavoritesService;
