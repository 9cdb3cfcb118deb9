//! Read-side entity resolution: turns stored campsite ids into display views.

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use models::{campsite::CampsiteView, ids::EntityId};
use tracing::info;

use crate::errors::ServiceError;

/// Looks up campsite views for a batch of ids. Unknown ids are skipped;
/// results follow the order of `ids`.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, ids: &[EntityId]) -> Result<Vec<CampsiteView>, ServiceError>;
}

/// In-memory campsite catalog, optionally loaded from a JSON array file.
#[derive(Debug, Default, Clone)]
pub struct CampsiteCatalog {
    campsites: HashMap<EntityId, CampsiteView>,
}

impl CampsiteCatalog {
    pub fn new(campsites: impl IntoIterator<Item = CampsiteView>) -> Self {
        Self { campsites: campsites.into_iter().map(|c| (c.id.clone(), c)).collect() }
    }

    /// Load a catalog from a JSON file holding an array of campsite views.
    pub async fn from_json_file(path: &Path) -> Result<Self, ServiceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ServiceError::Resolver(format!("cannot read {}: {e}", path.display())))?;
        let campsites: Vec<CampsiteView> = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Resolver(format!("invalid catalog {}: {e}", path.display())))?;
        let catalog = Self::new(campsites);
        info!(path = %path.display(), campsites = catalog.len(), "campsite catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize { self.campsites.len() }

    pub fn is_empty(&self) -> bool { self.campsites.is_empty() }
}

#[async_trait]
impl EntityResolver for CampsiteCatalog {
    async fn resolve(&self, ids: &[EntityId]) -> Result<Vec<CampsiteView>, ServiceError> {
        Ok(ids.iter().filter_map(|id| self.campsites.get(id).cloned()).collect())
    }
}
