//! Degraded-mode data: demo memories and stats shown when the memory service
//! is unreachable, plus the local store that keeps memories authored offline.

use chrono::{Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use cerebral_core::{
    BranchDescriptor, BranchRegistry, BranchStats, CerebralError, Memory, MemoryInput,
    MemoryStats, Provenance, Result,
};

use crate::local_store::LocalMemoryStore;
use crate::normalizer::provenance_for_kind;

/// Tag carried by every synthesized demo memory.
pub const DEMO_TAG: &str = "demo";
/// Tag carried by memories persisted locally after a failed create.
pub const LOCAL_TAG: &str = "local";

fn demo_templates(branch: &BranchDescriptor) -> [&'static str; 3] {
    match branch.kind {
        "session" => [
            "Drafting the weekly status update",
            "Reminder: reply to the design review thread",
            "Currently comparing two hosting quotes",
        ],
        "episodic" => [
            "First conversation about the cerebral memory layout",
            "Demo day walkthrough with the team",
            "Weekend hike where the routing idea came up",
        ],
        "working" => [
            "Open question: how should stats be grouped",
            "Scratch notes for the current refactor",
            "Checklist for the next release",
        ],
        "user" => [
            "Prefers concise answers with examples",
            "Working timezone is UTC+1",
            "Favourite editor theme is dark",
        ],
        _ => [
            "Agent indexed new documents overnight",
            "Routing table refreshed after deploy",
            "Summarised yesterday's sessions",
        ],
    }
}

fn random_between(low: u64, high: u64) -> u64 {
    if high <= low {
        return low;
    }
    low + rand::random::<u64>() % (high - low + 1)
}

fn random_unit(low: f64, high: f64) -> f64 {
    low + rand::random::<f64>() * (high - low)
}

/// Synthesizes non-authoritative data and keeps offline-authored memories.
pub struct FallbackProvider {
    sample_size: usize,
    store: LocalMemoryStore,
}

impl FallbackProvider {
    pub fn new(store: LocalMemoryStore, sample_size: usize) -> Self {
        Self { sample_size, store }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Demo memories for a branch: fixed content, randomized timestamp,
    /// importance, and access count. Every entry is tagged [`DEMO_TAG`].
    pub fn fallback_memories(&self, branch: &BranchDescriptor) -> Vec<Memory> {
        let templates = demo_templates(branch);
        let now = Utc::now();
        (0..self.sample_size)
            .map(|i| {
                let base = templates[i % templates.len()];
                let content = if i < templates.len() {
                    base.to_string()
                } else {
                    format!("{base} (#{})", i + 1)
                };

                let mut metadata = serde_json::Map::new();
                metadata.insert("memory_type".into(), branch.kind.into());
                metadata.insert("demo".into(), true.into());

                let tags: BTreeSet<String> =
                    [DEMO_TAG.to_string(), branch.kind.to_string()].into_iter().collect();

                Memory {
                    id: format!("demo-{}-{}", branch.domain.to_ascii_lowercase(), i + 1),
                    content,
                    provenance: provenance_for_kind(Some(branch.kind)),
                    timestamp: now - Duration::minutes(random_between(5, 7 * 24 * 60) as i64),
                    importance: Memory::clamp_importance(random_unit(0.4, 0.95)),
                    metadata,
                    branch: branch.name.to_string(),
                    access_count: random_between(0, 20),
                    tags,
                }
            })
            .collect()
    }

    /// Per-branch stats invented without touching any real data.
    pub fn fallback_stats(&self) -> MemoryStats {
        let now = Utc::now();
        let mut branches = BTreeMap::new();
        let mut total = 0;
        for branch in BranchRegistry::all() {
            let count = random_between(5, 50);
            let system_generated = match provenance_for_kind(Some(branch.kind)) {
                Provenance::System => count,
                Provenance::User => random_between(0, count / 4),
            };
            total += count;
            branches.insert(
                branch.name.to_string(),
                BranchStats {
                    total_memories: count,
                    recent_activity: random_between(0, count / 3),
                    avg_importance: random_unit(0.4, 0.9),
                    system_generated,
                    user_generated: count - system_generated,
                    last_updated: now,
                },
            );
        }
        MemoryStats {
            branches,
            total_memories: total,
            fallback_mode: true,
            timestamp: now,
        }
    }

    /// Keep a memory whose create call failed. Provenance is always user.
    pub fn persist_local_memory(
        &self,
        branch: &BranchDescriptor,
        input: &MemoryInput,
    ) -> Result<Memory> {
        if input.is_empty() {
            return Err(CerebralError::EmptyMemoryInput);
        }

        let mut metadata = input.metadata();
        metadata.insert("memory_type".into(), branch.kind.into());
        metadata.insert("local_only".into(), true.into());

        let memory = Memory {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            content: input.compose_content(),
            provenance: Provenance::User,
            timestamp: Utc::now(),
            importance: cerebral_core::DEFAULT_IMPORTANCE,
            metadata,
            branch: branch.name.to_string(),
            access_count: 0,
            tags: [LOCAL_TAG.to_string(), branch.kind.to_string()]
                .into_iter()
                .collect(),
        };
        self.store.append(&memory)?;
        info!(branch = %branch.name, id = %memory.id, "memory kept locally until the backend is reachable");
        Ok(memory)
    }

    /// Memories persisted locally for a branch, oldest first.
    pub fn local_memories(&self, branch: &BranchDescriptor) -> Result<Vec<Memory>> {
        self.store.list(branch.name)
    }

    /// Case-insensitive substring/tag match over the demo samples of one
    /// branch, or of every branch when none is given.
    pub fn local_search(&self, query: &str, branch: Option<&BranchDescriptor>) -> Vec<Memory> {
        let needle = query.trim().to_lowercase();
        let pool: Vec<Memory> = match branch {
            Some(b) => self.fallback_memories(b),
            None => BranchRegistry::all()
                .iter()
                .flat_map(|b| self.fallback_memories(b))
                .collect(),
        };
        pool.into_iter()
            .filter(|m| {
                needle.is_empty()
                    || m.content.to_lowercase().contains(&needle)
                    || m.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
