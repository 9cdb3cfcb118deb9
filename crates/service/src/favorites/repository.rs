use async_trait::async_trait;
use models::{favorite::FavoritesSet, ids::OwnerId};

use crate::errors::ServiceError;

/// What to do with an owner's record after looking at its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Keep,
    Put(FavoritesSet),
    Delete,
}

/// Decision applied to the current record inside [`FavoritesRepository::update`].
pub type Decide<'a> = Box<dyn FnOnce(Option<FavoritesSet>) -> Change + Send + 'a>;

/// Repository abstraction for favorites persistence: one record per owner.
///
/// `update` is the only mutation primitive. It hands the owner's current
/// record to `decide` and stores the resulting [`Change`]; a backend shared
/// between processes must make that read and write atomic across all of
/// them. The service adds its own per-owner serialization on top, so a
/// backend private to one process may do the two steps separately.
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    async fn get(&self, owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError>;
    async fn update(&self, owner: &OwnerId, decide: Decide<'_>) -> Result<(), ServiceError>;
    async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError>;

    /// Replace the owner's record.
    async fn put(&self, set: FavoritesSet) -> Result<(), ServiceError> {
        let owner = set.owner().clone();
        self.update(&owner, Box::new(move |_| Change::Put(set))).await
    }

    /// Delete the owner's record, returning it if it existed.
    async fn delete(&self, owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError> {
        let mut removed = None;
        self.update(
            owner,
            Box::new(|current: Option<FavoritesSet>| {
                let change = if current.is_some() { Change::Delete } else { Change::Keep };
                removed = current;
                change
            }),
        )
        .await?;
        Ok(removed)
    }
}

/// In-memory repository for tests, doc examples and the `memory` backend.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryFavoritesRepository {
        sets: RwLock<HashMap<OwnerId, FavoritesSet>>, // key: owner
    }

    #[async_trait]
    impl FavoritesRepository for InMemoryFavoritesRepository {
        async fn get(&self, owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError> {
            let sets = self.sets.read().await;
            Ok(sets.get(owner).cloned())
        }

        async fn update(&self, owner: &OwnerId, decide: Decide<'_>) -> Result<(), ServiceError> {
            let mut sets = self.sets.write().await;
            match decide(sets.get(owner).cloned()) {
                Change::Keep => {}
                Change::Put(set) => {
                    sets.insert(owner.clone(), set);
                }
                Change::Delete => {
                    sets.remove(owner);
                }
            }
            Ok(())
        }

        async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError> {
            let sets = self.sets.read().await;
            Ok(sets.keys().cloned().collect())
        }
    }

}
