use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, OwnerId};

/// Per-owner favorites record.
///
/// `items` never holds the same id twice: every way of building or growing a
/// set (including deserializing a persisted one) goes through the
/// deduplicating paths below. Insertion order is kept but carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FavoritesRecord")]
pub struct FavoritesSet {
    owner: OwnerId,
    items: Vec<EntityId>,
}

#[derive(Deserialize)]
struct FavoritesRecord {
    owner: OwnerId,
    #[serde(default)]
    items: Vec<EntityId>,
}

impl From<FavoritesRecord> for FavoritesSet {
    fn from(raw: FavoritesRecord) -> Self { Self::new(raw.owner, raw.items) }
}

impl FavoritesSet {
    /// Build a set, dropping repeated ids (first occurrence wins).
    pub fn new(owner: OwnerId, items: impl IntoIterator<Item = EntityId>) -> Self {
        let mut set = Self::empty(owner);
        set.extend(items);
        set
    }

    pub fn empty(owner: OwnerId) -> Self { Self { owner, items: Vec::new() } }

    pub fn owner(&self) -> &OwnerId { &self.owner }

    pub fn items(&self) -> &[EntityId] { &self.items }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn contains(&self, id: &EntityId) -> bool { self.items.contains(id) }

    /// Append `id` unless already present; returns whether it was added.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Union `ids` into the set, returning the ids that were newly added.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
        let mut seen: HashSet<EntityId> = self.items.iter().cloned().collect();
        let mut added = Vec::new();
        for id in ids {
            if seen.insert(id.clone()) {
                self.items.push(id.clone());
                added.push(id);
            }
        }
        added
    }

    /// Remove `id`; returns whether it was a member.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        match self.items.iter().position(|x| x == id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn into_items(self) -> Vec<EntityId> { self.items }
}
