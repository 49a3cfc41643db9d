use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cerebral_core::{
    BranchDescriptor, BranchRegistry, BranchStats, CerebralError, Fetched, Memory, MemoryInput,
    MemoryStats, Provenance, ProvenanceFilter, Result,
};

use crate::backend::{AddRequest, DeleteRequest, MemoryBackend, SearchRequest, StatsResponse};
use crate::fallback::FallbackProvider;
use crate::normalizer::{self, provenance_for_kind};

/// Result of [`MemoryClient::add_memory`].
#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// The backend accepted the memory; `refreshed` is the reloaded branch.
    Created { refreshed: Fetched<Vec<Memory>> },
    /// The backend was unreachable; the memory was kept in the local store.
    StoredLocally(Memory),
}

/// The branch currently on screen and what was last fetched for it.
#[derive(Debug, Default)]
struct MemoryCache {
    branch: Option<String>,
    memories: Vec<Memory>,
    degraded: bool,
    stats: Option<MemoryStats>,
}

/// Orchestrates calls to the memory service and keeps the client-side cache.
///
/// Reads never fail because the backend is down: they return
/// [`Fetched::Degraded`] with locally synthesized data instead. Only
/// [`remove_memory`](Self::remove_memory) propagates backend failures.
#[derive(Clone)]
pub struct MemoryClient {
    backend: Arc<dyn MemoryBackend>,
    fallback: Arc<FallbackProvider>,
    user_id: String,
    search_limit: u32,
    cache: Arc<Mutex<MemoryCache>>,
}

impl MemoryClient {
    pub fn new(
        backend: Arc<dyn MemoryBackend>,
        fallback: FallbackProvider,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            fallback: Arc::new(fallback),
            user_id: user_id.into(),
            search_limit: 50,
            cache: Arc::new(Mutex::new(MemoryCache::default())),
        }
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }

    // ── Cache accessors ────────────────────────────────────────

    /// Name of the branch whose memories are cached, if any.
    pub fn current_branch(&self) -> Option<String> {
        self.cache.lock().branch.clone()
    }

    pub fn cached_memories(&self) -> Vec<Memory> {
        self.cache.lock().memories.clone()
    }

    pub fn cached_stats(&self) -> Option<MemoryStats> {
        self.cache.lock().stats.clone()
    }

    /// Whether the cached memory list came from the fallback provider.
    pub fn is_degraded(&self) -> bool {
        self.cache.lock().degraded
    }

    // ── Operations ─────────────────────────────────────────────

    /// Load every memory of a branch and make it the cached branch.
    pub async fn load_memories(&self, branch: &str) -> Result<Fetched<Vec<Memory>>> {
        let descriptor = BranchRegistry::resolve(branch)?;
        let request = SearchRequest {
            query: String::new(),
            user_id: self.user_id.clone(),
            brain_region: Some(descriptor.domain.to_string()),
            limit: self.search_limit,
        };

        let fetched = match self.backend.search(&request).await {
            Ok(raw) => {
                let memories = dedupe_by_id(normalize_records(&raw, Some(descriptor)));
                info!(branch = %descriptor.name, count = memories.len(), "loaded memories");
                Fetched::Live(memories)
            }
            Err(e) if e.is_transport() => {
                warn!(branch = %descriptor.name, error = %e, "memory service unreachable, showing demo memories");
                Fetched::Degraded {
                    data: self.fallback.fallback_memories(descriptor),
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        let mut cache = self.cache.lock();
        cache.branch = Some(descriptor.name.to_string());
        cache.memories = fetched.data().clone();
        cache.degraded = fetched.is_degraded();
        Ok(fetched)
    }

    /// Aggregate stats for every branch; synthesized stats on failure.
    pub async fn get_stats(&self) -> Fetched<MemoryStats> {
        self.fetch_stats(|| self.fallback.fallback_stats()).await
    }

    /// Like [`get_stats`](Self::get_stats) but falls back to
    /// [`empty_stats`](Self::empty_stats) instead of invented numbers.
    pub async fn get_stats_or_empty(&self) -> Fetched<MemoryStats> {
        self.fetch_stats(Self::empty_stats).await
    }

    /// Guaranteed-safe all-zero stats shape.
    pub fn empty_stats() -> MemoryStats {
        MemoryStats::empty()
    }

    async fn fetch_stats(&self, on_failure: impl FnOnce() -> MemoryStats) -> Fetched<MemoryStats> {
        let fetched = match self.backend.stats(&self.user_id).await {
            Ok(response) => Fetched::Live(reshape_stats(&response)),
            Err(e) => {
                warn!(error = %e, "memory stats unavailable, using fallback stats");
                Fetched::Degraded {
                    data: on_failure(),
                    reason: e.to_string(),
                }
            }
        };
        self.cache.lock().stats = Some(fetched.data().clone());
        fetched
    }

    /// Create a memory in a branch, then reload that branch.
    pub async fn add_memory(&self, branch: &str, input: &MemoryInput) -> Result<AddOutcome> {
        let descriptor = BranchRegistry::resolve(branch)?;
        if input.is_empty() {
            return Err(CerebralError::EmptyMemoryInput);
        }

        let mut metadata = input.metadata();
        metadata.insert("memory_type".into(), descriptor.kind.into());
        metadata.insert("source".into(), "cerebral-client".into());
        metadata.insert("timestamp".into(), Utc::now().to_rfc3339().into());

        let request = AddRequest {
            content: input.compose_content(),
            user_id: self.user_id.clone(),
            brain_region: descriptor.domain.to_string(),
            metadata,
        };

        match self.backend.add(&request).await {
            Ok(_) => {
                info!(branch = %descriptor.name, "memory created");
                let refreshed = self.load_memories(descriptor.name).await?;
                Ok(AddOutcome::Created { refreshed })
            }
            Err(e) if e.is_transport() => {
                warn!(branch = %descriptor.name, error = %e, "create failed, keeping memory locally");
                let memory = self.fallback.persist_local_memory(descriptor, input)?;
                Ok(AddOutcome::StoredLocally(memory))
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a memory. Failure is reported to the caller, never masked.
    ///
    /// On success the cached branch, if any, is reloaded and returned.
    pub async fn remove_memory(&self, id: &str) -> Result<Option<Fetched<Vec<Memory>>>> {
        let request = DeleteRequest {
            memory_id: id.to_string(),
            user_id: self.user_id.clone(),
        };
        self.backend.delete(&request).await.map_err(|e| {
            warn!(id, error = %e, "delete failed");
            CerebralError::DeleteFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })?;
        info!(id, "memory deleted");

        match self.current_branch() {
            Some(branch) => Ok(Some(self.load_memories(&branch).await?)),
            None => Ok(None),
        }
    }

    /// Search one branch, or every branch when `branch` is `None`.
    ///
    /// The query is sent as given. On failure, a local match over the demo
    /// samples is returned instead.
    pub async fn search_memories(
        &self,
        query: &str,
        branch: Option<&str>,
    ) -> Result<Fetched<Vec<Memory>>> {
        let descriptor = branch.map(BranchRegistry::resolve).transpose()?;
        let request = SearchRequest {
            query: query.to_string(),
            user_id: self.user_id.clone(),
            brain_region: descriptor.map(|d| d.domain.to_string()),
            limit: self.search_limit,
        };

        match self.backend.search(&request).await {
            Ok(raw) => {
                let memories = normalize_records(&raw, descriptor);
                debug!(query, count = memories.len(), "search complete");
                Ok(Fetched::Live(memories))
            }
            Err(e) if e.is_transport() => {
                warn!(query, error = %e, "search failed, matching locally");
                Ok(Fetched::Degraded {
                    data: self.fallback.local_search(query, descriptor),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Memories kept locally for a branch after failed creates.
    pub fn local_memories(&self, branch: &str) -> Result<Vec<Memory>> {
        let descriptor = BranchRegistry::resolve(branch)?;
        self.fallback.local_memories(descriptor)
    }
}

/// Keep the memories whose provenance matches. `All` returns the input as is.
pub fn filter_by_provenance(memories: Vec<Memory>, filter: ProvenanceFilter) -> Vec<Memory> {
    if filter == ProvenanceFilter::All {
        return memories;
    }
    memories
        .into_iter()
        .filter(|m| filter.matches(m.provenance))
        .collect()
}

/// Normalize raw records, dropping those without content. Unscoped results
/// are attributed to the branch each record names.
fn normalize_records(
    raw: &[serde_json::Value],
    branch: Option<&BranchDescriptor>,
) -> Vec<Memory> {
    raw.iter()
        .filter_map(|record| {
            let target = branch.unwrap_or_else(|| normalizer::infer_branch(record));
            match normalizer::normalize(record, target) {
                Ok(memory) => Some(memory),
                Err(e) => {
                    debug!(error = %e, "dropping memory record");
                    None
                }
            }
        })
        .collect()
}

fn dedupe_by_id(memories: Vec<Memory>) -> Vec<Memory> {
    let mut seen = HashSet::new();
    memories
        .into_iter()
        .filter(|m| {
            let fresh = seen.insert(m.id.clone());
            if !fresh {
                warn!(id = %m.id, "duplicate memory id in branch, keeping the first");
            }
            fresh
        })
        .collect()
}

/// Turn the per-domain stats response into per-branch stats for every branch.
fn reshape_stats(response: &StatsResponse) -> MemoryStats {
    let timestamp: DateTime<Utc> = response
        .timestamp
        .as_deref()
        .and_then(|t| {
            DateTime::parse_from_rfc3339(t)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    chrono::NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|n| n.and_utc())
                })
        })
        .unwrap_or_else(Utc::now);

    let mut branches: BTreeMap<String, BranchStats> = BranchRegistry::names()
        .map(|name| (name.to_string(), BranchStats::zero(timestamp)))
        .collect();

    for (domain, region) in &response.regions {
        let Some(branch) = BranchRegistry::by_domain(domain) else {
            debug!(domain = %domain, "stats for unmapped domain ignored");
            continue;
        };
        let system_generated: u64 = region
            .memory_types
            .iter()
            .filter(|(kind, _)| provenance_for_kind(Some(kind)) == Provenance::System)
            .map(|(_, n)| *n)
            .sum();
        let typed: u64 = region.memory_types.values().sum();
        let total = region.count.max(typed);
        branches.insert(
            branch.name.to_string(),
            BranchStats {
                total_memories: total,
                recent_activity: region.recent_activity,
                avg_importance: Memory::clamp_importance(region.avg_importance),
                system_generated,
                user_generated: total.saturating_sub(system_generated),
                last_updated: timestamp,
            },
        );
    }

    let branch_total: u64 = branches.values().map(|b| b.total_memories).sum();
    MemoryStats {
        branches,
        total_memories: response.total_memories.max(branch_total),
        fallback_mode: false,
        timestamp,
    }
}
