use models::favorite::FavoritesSet;

/// Result of adding a single id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// No set existed; one was created holding the id.
    Created(FavoritesSet),
    /// The id was appended to an existing set.
    Added(FavoritesSet),
    /// The id was already a member; nothing was written.
    AlreadyPresent(FavoritesSet),
}

impl AddOutcome {
    pub fn set(&self) -> &FavoritesSet {
        match self {
            AddOutcome::Created(set) | AddOutcome::Added(set) | AddOutcome::AlreadyPresent(set) => set,
        }
    }

    pub fn into_set(self) -> FavoritesSet {
        match self {
            AddOutcome::Created(set) | AddOutcome::Added(set) | AddOutcome::AlreadyPresent(set) => set,
        }
    }

    pub fn changed(&self) -> bool { !matches!(self, AddOutcome::AlreadyPresent(_)) }
}

/// Result of removing a single id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The id was removed; the (possibly empty) set stays persisted.
    Removed(FavoritesSet),
    /// The set exists but never held the id.
    NotPresent(FavoritesSet),
    NoSetExists,
}

impl RemoveOutcome {
    pub fn set(&self) -> Option<&FavoritesSet> {
        match self {
            RemoveOutcome::Removed(set) | RemoveOutcome::NotPresent(set) => Some(set),
            RemoveOutcome::NoSetExists => None,
        }
    }

    pub fn changed(&self) -> bool { matches!(self, RemoveOutcome::Removed(_)) }
}

/// Result of deleting an owner's whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The record was deleted; carries what it held.
    Deleted(FavoritesSet),
    NoSetExists,
}
