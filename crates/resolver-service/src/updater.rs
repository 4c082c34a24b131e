//! Serialized index updates.
//!
//! Updates never touch a published index. Each one forks the current
//! snapshot, applies the change to the fork (embedding calls included) and
//! publishes the fork with [`IndexCache::put`]. Readers holding the old
//! `Arc` finish against the old snapshot.
//!
//! A single async mutex serializes updaters so two concurrent updates cannot
//! both fork the same snapshot and drop each other's change. The index cache
//! lock is only taken for the `get` and the `put`.

use std::sync::Arc;

use resolver_types::{AreaRecord, EntityRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::household::{HouseholdIndex, HouseholdIndexBuilder};
use crate::index_cache::IndexCache;

/// The one write path into an [`IndexCache`] of household indexes.
pub struct IndexUpdater {
    cache: Arc<IndexCache<HouseholdIndex>>,
    builder: Arc<HouseholdIndexBuilder>,
    write_lock: Mutex<()>,
}

impl IndexUpdater {
    pub fn new(cache: Arc<IndexCache<HouseholdIndex>>, builder: Arc<HouseholdIndexBuilder>) -> Self {
        Self {
            cache,
            builder,
            write_lock: Mutex::new(()),
        }
    }

    /// Build a fresh index from records and publish it.
    pub async fn rebuild(
        &self,
        user_key: &str,
        areas: Vec<AreaRecord>,
        entities: Vec<EntityRecord>,
    ) -> Arc<HouseholdIndex> {
        let _guard = self.write_lock.lock().await;
        let household = Arc::new(self.builder.build(areas, entities).await);
        self.cache.put(Arc::clone(&household), user_key);
        info!(user_key, "Household index rebuilt");
        household
    }

    /// Add or replace one entity.
    ///
    /// Returns `None` when no index is cached for `user_key`; the caller
    /// then needs a full [`rebuild`](Self::rebuild).
    pub async fn upsert_entity(
        &self,
        user_key: &str,
        record: EntityRecord,
    ) -> Option<Arc<HouseholdIndex>> {
        let _guard = self.write_lock.lock().await;
        let current = self.cache.get(user_key, false)?;

        let entity_id = record.entity_id.clone();
        let mut next = current.fork();
        next.entities.add_entity(record).await;

        debug!(user_key, entity_id = %entity_id, "Entity upserted");
        Some(self.publish(next, user_key))
    }

    /// Remove one entity. `None` when no index is cached for `user_key`.
    pub async fn remove_entity(
        &self,
        user_key: &str,
        entity_id: &str,
    ) -> Option<Arc<HouseholdIndex>> {
        let _guard = self.write_lock.lock().await;
        let current = self.cache.get(user_key, false)?;

        if current.entities.get_entity(entity_id).is_none() {
            return Some(current);
        }

        let mut next = current.fork();
        next.entities.remove_entity(entity_id);
        debug!(user_key, entity_id, "Entity removed");
        Some(self.publish(next, user_key))
    }

    /// Add or replace one area. `None` when no index is cached.
    pub async fn upsert_area(
        &self,
        user_key: &str,
        record: AreaRecord,
    ) -> Option<Arc<HouseholdIndex>> {
        let _guard = self.write_lock.lock().await;
        let current = self.cache.get(user_key, false)?;

        let area_id = record.area_id.clone();
        let mut next = current.fork();
        next.areas.add_area(record).await;

        debug!(user_key, area_id = %area_id, "Area upserted");
        Some(self.publish(next, user_key))
    }

    fn publish(&self, household: HouseholdIndex, user_key: &str) -> Arc<HouseholdIndex> {
        let household = Arc::new(household);
        self.cache.put(Arc::clone(&household), user_key);
        household
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_types::{Settings, VariantType};
    use std::time::Duration;

    fn updater() -> (Arc<IndexCache<HouseholdIndex>>, IndexUpdater) {
        let cache = Arc::new(IndexCache::new(Duration::from_secs(300)));
        let builder = Arc::new(HouseholdIndexBuilder::new(None, Settings::default()));
        let updater = IndexUpdater::new(Arc::clone(&cache), builder);
        (cache, updater)
    }

    fn lamp(id: &str, name: &str) -> EntityRecord {
        EntityRecord::from_entity_id(id).with_variant(VariantType::PrimaryName, name)
    }

    #[tokio::test]
    async fn test_upsert_requires_cached_index() {
        let (_, updater) = updater();
        assert!(updater
            .upsert_entity("alice", lamp("light.desk", "Desk Lamp"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_upsert_swaps_snapshot() {
        let (cache, updater) = updater();
        let before = updater
            .rebuild("alice", Vec::new(), vec![lamp("light.desk", "Desk Lamp")])
            .await;

        let after = updater
            .upsert_entity("alice", lamp("light.desk", "Reading Lamp"))
            .await
            .unwrap();

        // old snapshot untouched, new one published
        assert_eq!(
            before.entities.search_by_exact_match("desk lamp", None, None, 5).len(),
            1
        );
        assert!(after
            .entities
            .search_by_exact_match("desk lamp", None, None, 5)
            .is_empty());
        let current = cache.get("alice", false).unwrap();
        assert!(Arc::ptr_eq(&current, &after));
        assert_eq!(cache.get_stats().updates, 1);
    }

    #[tokio::test]
    async fn test_remove_entity() {
        let (_, updater) = updater();
        updater
            .rebuild("alice", Vec::new(), vec![lamp("light.desk", "Desk Lamp")])
            .await;

        let after = updater.remove_entity("alice", "light.desk").await.unwrap();
        assert!(after.entities.is_empty());

        // removing an unknown entity publishes nothing new
        let same = updater.remove_entity("alice", "light.desk").await.unwrap();
        assert!(Arc::ptr_eq(&same, &after));
    }

    #[tokio::test]
    async fn test_upsert_area() {
        let (_, updater) = updater();
        updater.rebuild("alice", Vec::new(), Vec::new()).await;

        let after = updater
            .upsert_area("alice", AreaRecord::new("attic", "Attic"))
            .await
            .unwrap();
        assert_eq!(
            after.areas.resolve_area_name("attic", false).await.as_deref(),
            Some("attic")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_all_land() {
        let (cache, updater) = updater();
        let updater = Arc::new(updater);
        updater.rebuild("alice", Vec::new(), Vec::new()).await;

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let updater = Arc::clone(&updater);
                tokio::spawn(async move {
                    updater
                        .upsert_entity("alice", lamp(&format!("light.lamp_{i}"), &format!("Lamp {i}")))
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        let current = cache.get("alice", false).unwrap();
        assert_eq!(current.entities.len(), 16);
    }
}
