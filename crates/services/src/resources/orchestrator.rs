use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use sprint_core::ResourceQualityFilter;
use sprint_core::model::Resource;

use super::cache::ResourceCache;
use crate::api::LearningApi;
use crate::error::ApiError;

/// How the uncached part of a fetch was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Every key was fresh in the cache; no request was made.
    CacheOnly,
    /// One batched request covered every uncached key.
    Batch,
    /// The batch failed and each uncached key was requested on its own.
    Fallback,
}

/// Resources for every requested subskill, plus how they were obtained.
#[derive(Debug, Clone)]
pub struct ResourceFetch {
    pub resources: HashMap<String, Vec<Resource>>,
    pub strategy: FetchStrategy,
    /// Keys resolved over the network in this call.
    pub fetched: Vec<String>,
    /// Keys whose fallback request failed and were degraded to empty.
    pub failed: Vec<String>,
}

impl ResourceFetch {
    /// Filtered resources for `subskill`; empty if it was not requested.
    #[must_use]
    pub fn for_subskill(&self, subskill: &str) -> &[Resource] {
        self.resources.get(subskill).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Fills a skill's subskill resources from the cache first, then one batched
/// request, then per-subskill requests if the batch fails.
#[derive(Clone)]
pub struct ResourceFetchOrchestrator {
    api: Arc<dyn LearningApi>,
    filter: ResourceQualityFilter,
}

impl ResourceFetchOrchestrator {
    #[must_use]
    pub fn new(api: Arc<dyn LearningApi>) -> Self {
        Self {
            api,
            filter: ResourceQualityFilter::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ResourceQualityFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Resolve resources for every name in `subskills`, each exactly once.
    ///
    /// Fresh cache entries are served without a request. Newly fetched lists are
    /// filtered and written back to `cache`. Fallback failures degrade their key
    /// to an empty list and are not cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the batched request is rejected with 401;
    /// an expired credential is never worked around with more requests.
    pub async fn fetch(
        &self,
        cache: &ResourceCache,
        subskills: &[String],
    ) -> Result<ResourceFetch, ApiError> {
        let mut seen = HashSet::new();
        let keys: Vec<&String> = subskills
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .collect();

        let mut resources = HashMap::with_capacity(keys.len());
        let mut uncached = Vec::new();
        for key in keys {
            match cache.get_fresh(key) {
                Some(entry) => {
                    resources.insert(key.clone(), entry.resources);
                }
                None => uncached.push(key.clone()),
            }
        }

        tracing::debug!(
            cached = resources.len(),
            uncached = uncached.len(),
            "resource cache partitioned"
        );
        if uncached.is_empty() {
            return Ok(ResourceFetch {
                resources,
                strategy: FetchStrategy::CacheOnly,
                fetched: Vec::new(),
                failed: Vec::new(),
            });
        }

        match self.api.search_resources_batch(&uncached).await {
            Ok(mut batch) => {
                let fresh: Vec<(String, Vec<Resource>)> = uncached
                    .iter()
                    .map(|key| {
                        let raw = batch.remove(key).unwrap_or_default();
                        (key.clone(), self.filter.apply(raw))
                    })
                    .collect();
                resources.extend(fresh.iter().cloned());
                cache.put_many(fresh).await;
                Ok(ResourceFetch {
                    resources,
                    strategy: FetchStrategy::Batch,
                    fetched: uncached,
                    failed: Vec::new(),
                })
            }
            Err(err) if err.is_auth_failure() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, keys = uncached.len(), "batch resource search failed; falling back");
                let (fresh, failed) = self.fetch_each(&uncached).await;
                let fetched = fresh.iter().map(|(key, _)| key.clone()).collect();
                resources.extend(fresh.iter().cloned());
                for key in &failed {
                    resources.insert(key.clone(), Vec::new());
                }
                cache.put_many(fresh).await;
                Ok(ResourceFetch {
                    resources,
                    strategy: FetchStrategy::Fallback,
                    fetched,
                    failed,
                })
            }
        }
    }

    /// One request per key, all in flight together; settles when every request has.
    async fn fetch_each(&self, keys: &[String]) -> (Vec<(String, Vec<Resource>)>, Vec<String>) {
        let requests = keys.iter().map(|key| async move {
            let outcome = self.api.search_resources(key).await;
            (key, outcome)
        });

        let mut fresh = Vec::new();
        let mut failed = Vec::new();
        for (key, outcome) in join_all(requests).await {
            match outcome {
                Ok(raw) => fresh.push((key.clone(), self.filter.apply(raw))),
                Err(err) => {
                    tracing::warn!(subskill = %key, error = %err, "resource search failed; using empty list");
                    failed.push(key.clone());
                }
            }
        }
        (fresh, failed)
    }
}
