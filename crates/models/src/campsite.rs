use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, OwnerId};

/// Display view of a campsite, as returned by the entity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampsiteView {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Read-side result of listing favorites: the stored ids plus the campsites
/// they resolved to. Ids unknown to the resolver have no entry in `campsites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesView {
    pub owner: OwnerId,
    pub items: Vec<EntityId>,
    pub campsites: Vec<CampsiteView>,
}
