use std::sync::Arc;

use async_trait::async_trait;
use models::{favorite::FavoritesSet, ids::OwnerId};

use crate::errors::ServiceError;
use crate::favorites::repository::{Change, Decide, FavoritesRepository};
use crate::storage::json_map_store::JsonMapStore;

/// File-backed favorites repository.
/// Keeps a map of `owner -> favorites set` persisted as JSON. Several
/// repositories, in one process or many, may share the same file.
#[derive(Clone)]
pub struct FileFavoritesRepository {
    store: Arc<JsonMapStore<OwnerId, FavoritesSet>>,
}

impl FileFavoritesRepository {
    /// Initialize the repository from the given file path. The file is created on first write.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<OwnerId, FavoritesSet>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }
}

#[async_trait]
impl FavoritesRepository for FileFavoritesRepository {
    async fn get(&self, owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError> {
        self.store.get(owner).await
    }

    async fn update(&self, owner: &OwnerId, decide: Decide<'_>) -> Result<(), ServiceError> {
        self.store
            .update_map(|sets| {
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
            })
            .await
    }

    async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError> {
        Ok(self.store.list().await?.into_iter().map(|(owner, _)| owner).collect())
    }
}
