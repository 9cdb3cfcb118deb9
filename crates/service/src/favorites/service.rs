use std::sync::Arc;

use models::{
    campsite::FavoritesView,
    favorite::FavoritesSet,
    ids::{EntityId, OwnerId},
};
use tracing::{debug, info, instrument, warn};

use super::domain::{AddOutcome, ClearOutcome, RemoveOutcome};
use super::locks::OwnerLocks;
use super::repository::{Change, Decide, FavoritesRepository};
use crate::campsites::EntityResolver;
use crate::errors::ServiceError;

/// Favorites business service independent of transport and storage.
///
/// Every mutating operation holds the owner's critical section and hands its
/// read-modify-write to the repository as a single `update`, so concurrent
/// calls for one owner are applied one after another and none of them can
/// overwrite another's change. Operations for different owners never contend.
/// Reads take no lock.
pub struct FavoritesService<R: ?Sized, E: ?Sized> {
    repo: Arc<R>,
    resolver: Arc<E>,
    locks: OwnerLocks,
}

impl<R, E> FavoritesService<R, E>
where
    R: FavoritesRepository + ?Sized,
    E: EntityResolver + ?Sized,
{
    pub fn new(repo: Arc<R>, resolver: Arc<E>) -> Self {
        Self { repo, resolver, locks: OwnerLocks::default() }
    }

    /// List the owner's favorites with campsites resolved. `None` when the
    /// owner has no set.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn get_favorites(&self, owner: &OwnerId) -> Result<Option<FavoritesView>, ServiceError> {
        let Some(set) = self.repo.get(owner).await? else {
            debug!("no favorites set");
            return Ok(None);
        };
        let campsites = self.resolver.resolve(set.items()).await?;
        if campsites.len() < set.len() {
            debug!(stored = set.len(), resolved = campsites.len(), "some favorites did not resolve");
        }
        Ok(Some(FavoritesView { owner: set.owner().clone(), items: set.into_items(), campsites }))
    }

    /// Union `candidates` into the owner's set, creating it if needed.
    ///
    /// The whole batch is validated first; one bad id rejects it with no effect.
    #[instrument(skip(self, owner, candidates), fields(owner = %owner))]
    pub async fn add_many<I>(&self, owner: &OwnerId, candidates: I) -> Result<FavoritesSet, ServiceError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let ids = parse_candidates(candidates)?;

        let _guard = self.locks.lock(owner).await;
        let mut outcome = None;
        self.apply(
            owner,
            Box::new(|current: Option<FavoritesSet>| match current {
                Some(mut set) => {
                    let added = set.extend(ids).len();
                    let change = if added == 0 { Change::Keep } else { Change::Put(set.clone()) };
                    outcome = Some((set, Some(added)));
                    change
                }
                None => {
                    let set = FavoritesSet::new(owner.clone(), ids);
                    outcome = Some((set.clone(), None));
                    Change::Put(set)
                }
            }),
        )
        .await?;

        let (set, added) = applied(outcome)?;
        match added {
            Some(0) => debug!("all candidates already present"),
            Some(added) => info!(added, total = set.len(), "favorites_added"),
            None => info!(total = set.len(), "favorites_created"),
        }
        Ok(set)
    }

    /// Add a single id, reporting whether the set was created, grown, or
    /// already held it.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::ids::OwnerId;
    /// use service::campsites::CampsiteCatalog;
    /// use service::favorites::{repository::memory::InMemoryFavoritesRepository, AddOutcome, FavoritesService};
    /// let svc = FavoritesService::new(Arc::new(InMemoryFavoritesRepository::default()), Arc::new(CampsiteCatalog::default()));
    /// let owner = OwnerId::parse("user-1").unwrap();
    /// let first = tokio_test::block_on(svc.add_one(&owner, "camp-1")).unwrap();
    /// assert!(matches!(first, AddOutcome::Created(_)));
    /// let again = tokio_test::block_on(svc.add_one(&owner, "camp-1")).unwrap();
    /// assert!(matches!(again, AddOutcome::AlreadyPresent(_)));
    /// ```
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn add_one(&self, owner: &OwnerId, id: &str) -> Result<AddOutcome, ServiceError> {
        let id = EntityId::parse(id)?;

        let _guard = self.locks.lock(owner).await;
        let mut outcome = None;
        self.apply(
            owner,
            Box::new(|current: Option<FavoritesSet>| {
                let (result, change) = match current {
                    Some(mut set) => {
                        if set.insert(id.clone()) {
                            (AddOutcome::Added(set.clone()), Change::Put(set))
                        } else {
                            (AddOutcome::AlreadyPresent(set), Change::Keep)
                        }
                    }
                    None => {
                        let set = FavoritesSet::new(owner.clone(), [id.clone()]);
                        (AddOutcome::Created(set.clone()), Change::Put(set))
                    }
                };
                outcome = Some(result);
                change
            }),
        )
        .await?;

        let outcome = applied(outcome)?;
        match &outcome {
            AddOutcome::Created(_) => info!(%id, "favorites_created"),
            AddOutcome::Added(set) => info!(%id, total = set.len(), "favorite_added"),
            AddOutcome::AlreadyPresent(_) => debug!(%id, "favorite already present"),
        }
        Ok(outcome)
    }

    /// Remove a single id. The set stays persisted even when this empties it.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn remove_one(&self, owner: &OwnerId, id: &str) -> Result<RemoveOutcome, ServiceError> {
        let id = EntityId::parse(id)?;

        let _guard = self.locks.lock(owner).await;
        let mut outcome = None;
        self.apply(
            owner,
            Box::new(|current: Option<FavoritesSet>| {
                let (result, change) = match current {
                    None => (RemoveOutcome::NoSetExists, Change::Keep),
                    Some(mut set) => {
                        if set.remove(&id) {
                            (RemoveOutcome::Removed(set.clone()), Change::Put(set))
                        } else {
                            (RemoveOutcome::NotPresent(set), Change::Keep)
                        }
                    }
                };
                outcome = Some(result);
                change
            }),
        )
        .await?;

        let outcome = applied(outcome)?;
        match &outcome {
            RemoveOutcome::Removed(set) => info!(%id, remaining = set.len(), "favorite_removed"),
            RemoveOutcome::NotPresent(_) => debug!(%id, "favorite not present"),
            RemoveOutcome::NoSetExists => debug!(%id, "no favorites set to remove from"),
        }
        Ok(outcome)
    }

    /// Delete the owner's whole record.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn remove_all(&self, owner: &OwnerId) -> Result<ClearOutcome, ServiceError> {
        let _guard = self.locks.lock(owner).await;
        let mut outcome = None;
        self.apply(
            owner,
            Box::new(|current: Option<FavoritesSet>| {
                let (result, change) = match current {
                    Some(set) => (ClearOutcome::Deleted(set), Change::Delete),
                    None => (ClearOutcome::NoSetExists, Change::Keep),
                };
                outcome = Some(result);
                change
            }),
        )
        .await?;

        let outcome = applied(outcome)?;
        match &outcome {
            ClearOutcome::Deleted(set) => info!(removed = set.len(), "favorites_cleared"),
            ClearOutcome::NoSetExists => debug!("no favorites set to delete"),
        }
        Ok(outcome)
    }

    /// Owners that currently have a stored set, in no particular order.
    #[instrument(skip(self))]
    pub async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError> {
        self.repo.owners().await
    }

    async fn apply(&self, owner: &OwnerId, decide: Decide<'_>) -> Result<(), ServiceError> {
        self.repo
            .update(owner, decide)
            .await
            .inspect_err(|e| warn!(error = %e, "favorites write failed"))
    }
}

/// Outcome recorded by a decision closure; missing if the repository never ran it.
fn applied<T>(outcome: Option<T>) -> Result<T, ServiceError> {
    outcome.ok_or_else(|| ServiceError::Storage("repository returned without applying the update".into()))
}

fn parse_candidates<I>(candidates: I) -> Result<Vec<EntityId>, ServiceError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            EntityId::parse(raw.as_ref())
                .map_err(|e| ServiceError::Validation(format!("candidate #{i}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campsites::CampsiteCatalog;
    use crate::favorites::repository::memory::InMemoryFavoritesRepository;
    use async_trait::async_trait;
    use models::campsite::CampsiteView;
    use std::collections::HashSet;

    type MemService = FavoritesService<InMemoryFavoritesRepository, CampsiteCatalog>;

    fn owner(raw: &str) -> OwnerId { OwnerId::parse(raw).unwrap() }
    fn id(raw: &str) -> EntityId { EntityId::parse(raw).unwrap() }

    fn svc() -> (Arc<InMemoryFavoritesRepository>, MemService) {
        let repo = Arc::new(InMemoryFavoritesRepository::default());
        let catalog = CampsiteCatalog::new([
            CampsiteView { id: id("a"), name: "Alder Creek".into(), description: None },
            CampsiteView { id: id("b"), name: "Bear Flat".into(), description: Some("walk-in".into()) },
            CampsiteView { id: id("c"), name: "Cedar Point".into(), description: None },
        ]);
        (repo.clone(), FavoritesService::new(repo, Arc::new(catalog)))
    }

    #[tokio::test]
    async fn add_one_twice_is_idempotent() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        let o = owner("u1");

        let first = svc.add_one(&o, "a").await?;
        assert!(matches!(first, AddOutcome::Created(_)));
        let second = svc.add_one(&o, "a").await?;
        assert!(matches!(second, AddOutcome::AlreadyPresent(_)));
        assert!(!second.changed());
        assert_eq!(first.set(), second.set());

        let third = svc.add_one(&o, "b").await?;
        assert!(matches!(third, AddOutcome::Added(_)));
        assert_eq!(third.into_set().items(), &[id("a"), id("b")]);
        Ok(())
    }

    #[tokio::test]
    async fn add_many_never_duplicates() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        let o = owner("u1");

        let created = svc.add_many(&o, ["a", "b", "a"]).await?;
        assert_eq!(created.items(), &[id("a"), id("b")]);

        let grown = svc.add_many(&o, ["b", "c", " c "]).await?;
        assert_eq!(grown.items(), &[id("a"), id("b"), id("c")]);

        svc.add_one(&o, "c").await?;
        let unchanged = svc.add_many(&o, ["a"]).await?;
        assert_eq!(unchanged.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_batch_has_no_effect() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let o = owner("u1");

        let err = svc.add_many(&o, ["a", "", "b"]).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(repo.get(&o).await?.is_none());

        svc.add_one(&o, "a").await?;
        assert!(svc.add_many(&o, ["b", "has space"]).await.is_err());
        assert_eq!(repo.get(&o).await?.unwrap().items(), &[id("a")]);

        assert!(svc.add_one(&o, "  ").await.unwrap_err().is_invalid_input());
        assert!(svc.remove_one(&o, "").await.unwrap_err().is_invalid_input());
        Ok(())
    }

    #[tokio::test]
    async fn empty_batch_creates_empty_set() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let o = owner("u1");
        let set = svc.add_many(&o, Vec::<String>::new()).await?;
        assert!(set.is_empty());
        assert!(repo.get(&o).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn remove_one_then_not_present() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let o = owner("u1");
        svc.add_many(&o, ["a", "b"]).await?;

        let removed = svc.remove_one(&o, "a").await?;
        assert!(matches!(&removed, RemoveOutcome::Removed(s) if s.items() == [id("b")]));
        let again = svc.remove_one(&o, "a").await?;
        assert!(matches!(&again, RemoveOutcome::NotPresent(s) if s.items() == [id("b")]));
        assert!(!again.changed());

        // last removal keeps an empty record around
        assert!(svc.remove_one(&o, "b").await?.changed());
        let stored = repo.get(&o).await?.unwrap();
        assert!(stored.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_owner_is_a_no_op() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let o = owner("ghost");

        assert_eq!(svc.remove_one(&o, "a").await?, RemoveOutcome::NoSetExists);
        assert_eq!(svc.remove_all(&o).await?, ClearOutcome::NoSetExists);
        assert!(svc.get_favorites(&o).await?.is_none());
        assert!(repo.owners().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn remove_all_deletes_record() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let o = owner("u1");
        svc.add_many(&o, ["a", "b"]).await?;

        let cleared = svc.remove_all(&o).await?;
        assert!(matches!(&cleared, ClearOutcome::Deleted(s) if s.len() == 2));
        assert!(repo.get(&o).await?.is_none());
        assert_eq!(svc.remove_all(&o).await?, ClearOutcome::NoSetExists);
        Ok(())
    }

    #[tokio::test]
    async fn get_favorites_round_trip_resolves_campsites() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        let o = owner("u1");
        svc.add_many(&o, ["c", "a", "b", "unknown"]).await?;

        let view = svc.get_favorites(&o).await?.unwrap();
        assert_eq!(view.owner, o);
        let ids: HashSet<_> = view.items.iter().map(EntityId::as_str).collect();
        assert_eq!(ids, HashSet::from(["a", "b", "c", "unknown"]));
        let names: Vec<_> = view.campsites.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Cedar Point", "Alder Creek", "Bear Flat"]);
        Ok(())
    }

    #[tokio::test]
    async fn owners_are_isolated() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        svc.add_one(&owner("u1"), "a").await?;
        svc.add_one(&owner("u2"), "b").await?;
        svc.remove_all(&owner("u1")).await?;

        let view = svc.get_favorites(&owner("u2")).await?.unwrap();
        assert_eq!(view.items, vec![id("b")]);
        assert!(svc.locks.is_empty());
        Ok(())
    }

    /// Reads succeed, writes always fail.
    #[derive(Default)]
    struct ReadOnlyRepository {
        inner: InMemoryFavoritesRepository,
    }

    #[async_trait]
    impl FavoritesRepository for ReadOnlyRepository {
        async fn get(&self, owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError> {
            self.inner.get(owner).await
        }
        async fn update(&self, owner: &OwnerId, decide: Decide<'_>) -> Result<(), ServiceError> {
            match decide(self.inner.get(owner).await?) {
                Change::Keep => Ok(()),
                _ => Err(ServiceError::Storage("disk full".into())),
            }
        }
        async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError> {
            self.inner.owners().await
        }
    }

    #[tokio::test]
    async fn storage_failures_propagate() -> Result<(), anyhow::Error> {
        let repo = Arc::new(ReadOnlyRepository::default());
        let seeded = owner("u1");
        repo.inner.put(FavoritesSet::new(seeded.clone(), [id("a")])).await?;
        let svc = FavoritesService::new(repo.clone(), Arc::new(CampsiteCatalog::default()));

        let err = svc.add_one(&seeded, "b").await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(err.code(), 1200);
        assert!(matches!(svc.add_many(&owner("u2"), ["a"]).await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.remove_one(&seeded, "a").await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.remove_all(&seeded).await, Err(ServiceError::Storage(_))));

        // nothing to write, so nothing fails
        assert!(matches!(svc.add_one(&seeded, "a").await?, AddOutcome::AlreadyPresent(_)));
        assert_eq!(svc.remove_one(&owner("ghost"), "a").await?, RemoveOutcome::NoSetExists);
        assert_eq!(svc.remove_all(&owner("ghost")).await?, ClearOutcome::NoSetExists);
        assert_eq!(repo.inner.get(&seeded).await?.unwrap().items(), &[id("a")]);
        Ok(())
    }

    /// Every read and write fails.
    struct BrokenStorage;

    #[async_trait]
    impl FavoritesRepository for BrokenStorage {
        async fn get(&self, _owner: &OwnerId) -> Result<Option<FavoritesSet>, ServiceError> {
            Err(ServiceError::Storage("store unreadable".into()))
        }
        async fn update(&self, _owner: &OwnerId, _decide: Decide<'_>) -> Result<(), ServiceError> {
            Err(ServiceError::Storage("store unreadable".into()))
        }
        async fn owners(&self) -> Result<Vec<OwnerId>, ServiceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_reads_surface_as_storage_errors() {
        let svc = FavoritesService::new(Arc::new(BrokenStorage), Arc::new(CampsiteCatalog::default()));
        let o = owner("u1");

        assert!(matches!(svc.get_favorites(&o).await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.add_one(&o, "a").await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.add_many(&o, ["a", "b"]).await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.remove_one(&o, "a").await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.remove_all(&o).await, Err(ServiceError::Storage(_))));
        // failures release the owner lock
        assert!(svc.locks.is_empty());
    }

    struct BrokenResolver;

    #[async_trait]
    impl EntityResolver for BrokenResolver {
        async fn resolve(&self, _ids: &[EntityId]) -> Result<Vec<CampsiteView>, ServiceError> {
            Err(ServiceError::Resolver("catalog offline".into()))
        }
    }

    #[tokio::test]
    async fn resolver_failure_fails_the_read() -> Result<(), anyhow::Error> {
        let repo = Arc::new(InMemoryFavoritesRepository::default());
        let svc = FavoritesService::new(repo.clone(), Arc::new(BrokenResolver));
        let o = owner("u1");
        svc.add_many(&o, ["a", "b"]).await?;

        let err = svc.get_favorites(&o).await.unwrap_err();
        assert!(matches!(err, ServiceError::Resolver(_)));
        assert_eq!(err.code(), 1300);
        // the stored set is untouched
        assert_eq!(repo.get(&o).await?.unwrap().len(), 2);
        // an owner without a set never reaches the resolver
        assert!(svc.get_favorites(&owner("u2")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn owners_lists_stored_sets() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        svc.add_one(&owner("u1"), "a").await?;
        svc.add_many(&owner("u2"), Vec::<String>::new()).await?;
        svc.remove_all(&owner("u1")).await?;
        assert_eq!(svc.owners().await?, vec![owner("u2")]);
        Ok(())
    }

    #[tokio::test]
    async fn works_behind_trait_objects() -> Result<(), anyhow::Error> {
        let repo: Arc<dyn FavoritesRepository> = Arc::new(InMemoryFavoritesRepository::default());
        let resolver: Arc<dyn EntityResolver> = Arc::new(CampsiteCatalog::default());
        let svc = FavoritesService::new(repo, resolver);
        let o = owner("u1");
        svc.add_one(&o, "a").await?;
        let view = svc.get_favorites(&o).await?.unwrap();
        assert_eq!(view.items, vec![id("a")]);
        assert!(view.campsites.is_empty());
        Ok(())
    }
}
