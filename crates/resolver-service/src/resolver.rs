//! Query resolution against the cached household index.

use std::collections::HashSet;
use std::sync::Arc;

use resolver_index::EntityMatch;
use serde::Serialize;
use tracing::debug;

use crate::household::HouseholdIndex;
use crate::index_cache::IndexCache;

/// Answer to a device reference.
///
/// An empty `matches` list means the reference could not be resolved and
/// the user should be asked to clarify.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Area mentioned in the query, if one was recognised
    pub area_id: Option<String>,
    pub matches: Vec<EntityMatch>,
}

impl Resolution {
    pub fn best(&self) -> Option<&EntityMatch> {
        self.matches.first()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Resolves free-text device references for request handlers.
pub struct DeviceResolver {
    cache: Arc<IndexCache<HouseholdIndex>>,
    default_limit: usize,
}

impl DeviceResolver {
    pub fn new(cache: Arc<IndexCache<HouseholdIndex>>, default_limit: usize) -> Self {
        Self {
            cache,
            default_limit: default_limit.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<IndexCache<HouseholdIndex>> {
        &self.cache
    }

    /// Resolve `query` for the household under `user_key`.
    ///
    /// When the query names an area, matches are narrowed to entities in
    /// that area or any area nested under it.
    pub async fn resolve(
        &self,
        user_key: &str,
        query: &str,
        domain: Option<&str>,
        limit: Option<usize>,
    ) -> Resolution {
        let Some(household) = self.cache.get(user_key, false) else {
            debug!(user_key, "No household index cached");
            return Resolution::default();
        };
        let limit = limit.unwrap_or(self.default_limit);

        let area_id = match household.areas.extract_area_from_query(query) {
            Some(area_name) => household.areas.resolve_area_name(&area_name, true).await,
            None => None,
        };

        let Some(area_id) = area_id else {
            let matches = household
                .entities
                .search_by_name(query, domain, None, limit)
                .await;
            return Resolution {
                area_id: None,
                matches,
            };
        };

        // rank everything, then keep what lies inside the area
        let candidates = household
            .entities
            .search_by_name(query, domain, None, household.entities.len())
            .await;
        let ids: Vec<String> = candidates.iter().map(|m| m.entity_id.clone()).collect();
        let area_map = household.entities.entity_area_map();
        let in_area = household
            .areas
            .filter_entities_by_area(&ids, &area_id, true, Some(&area_map));
        let kept: HashSet<&str> = in_area.iter().map(String::as_str).collect();

        let mut matches: Vec<EntityMatch> = candidates
            .into_iter()
            .filter(|m| kept.contains(m.entity_id.as_str()))
            .collect();
        matches.truncate(limit);

        debug!(
            user_key,
            area_id = %area_id,
            matches = matches.len(),
            "Resolved within area"
        );
        Resolution {
            area_id: Some(area_id),
            matches,
        }
    }
}
