//! In-process memory service for deterministic testing.
//!
//! Behaves like a small backend: records added through it come back from
//! `search` and `stats`. It can be switched offline to exercise degraded mode.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use cerebral_core::{BranchRegistry, CerebralError, Result};

use crate::backend::*;

/// A call the mock received, for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Search(SearchRequest),
    Add(AddRequest),
    Delete(DeleteRequest),
    Stats(String),
}

/// A mock memory backend that stores raw records in memory.
///
/// # Example
/// ```
/// use cerebral_memory::mock::MockMemoryBackend;
/// let backend = MockMemoryBackend::new()
///     .with_record(serde_json::json!({"id": "m1", "memory": "hello", "brain_region": "TEMPORAL_LOBE"}));
/// assert_eq!(backend.record_count(), 1);
/// ```
#[derive(Default)]
pub struct MockMemoryBackend {
    records: Mutex<Vec<Value>>,
    /// Every call received, in order.
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    offline: AtomicBool,
    fail_next: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl MockMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record.
    pub fn with_record(self, record: Value) -> Self {
        self.records.lock().push(record);
        self
    }

    /// A backend that fails every call with a transport error.
    pub fn unreachable() -> Self {
        let backend = Self::new();
        backend.set_offline(true);
        backend
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail only the next call with the given reason.
    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.lock() = Some(reason.to_string());
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn recorded_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn enter(&self, call: MockCall) -> Result<()> {
        self.calls.lock().push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CerebralError::Transport("connection refused".into()));
        }
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(CerebralError::Transport(reason));
        }
        Ok(())
    }

    fn region_of(record: &Value) -> Option<String> {
        record["brain_region"].as_str().map(String::from).or_else(|| {
            let kind = record["metadata"]["memory_type"].as_str()?;
            BranchRegistry::all()
                .iter()
                .find(|b| b.kind == kind)
                .map(|b| b.domain.to_string())
        })
    }
}

#[async_trait]
impl MemoryBackend for MockMemoryBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        self.enter(MockCall::Search(request.clone()))?;
        let needle = request.query.to_lowercase();
        let records = self.records.lock();
        Ok(records
            .iter()
            .filter(|r| match &request.brain_region {
                Some(region) => Self::region_of(r).as_deref() == Some(region.as_str()),
                None => true,
            })
            .filter(|r| {
                let text = r["content"].as_str().or_else(|| r["memory"].as_str());
                needle.is_empty() || text.is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .take(request.limit as usize)
            .cloned()
            .collect())
    }

    async fn add(&self, request: &AddRequest) -> Result<Value> {
        self.enter(MockCall::Add(request.clone()))?;
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = json!({
            "id": id,
            "memory": request.content,
            "brain_region": request.brain_region,
            "metadata": request.metadata,
            "created_at": chrono::Utc::now().to_rfc3339(),
        });
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<()> {
        self.enter(MockCall::Delete(request.clone()))?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r["id"].as_str() != Some(request.memory_id.as_str()));
        if records.len() == before {
            return Err(CerebralError::Transport(format!(
                "HTTP 404: memory {} not found",
                request.memory_id
            )));
        }
        Ok(())
    }

    async fn stats(&self, user_id: &str) -> Result<StatsResponse> {
        self.enter(MockCall::Stats(user_id.to_string()))?;
        let records = self.records.lock();
        let mut regions: HashMap<String, RegionStats> = HashMap::new();
        for record in records.iter() {
            let region = Self::region_of(record).unwrap_or_else(|| "CEREBELLUM".into());
            let kind = record["metadata"]["memory_type"]
                .as_str()
                .unwrap_or("agent")
                .to_string();
            let entry = regions.entry(region).or_default();
            entry.count += 1;
            entry.recent_activity += 1;
            *entry.memory_types.entry(kind).or_insert(0) += 1;
        }
        for entry in regions.values_mut() {
            entry.avg_importance = 0.5;
        }
        Ok(StatsResponse {
            regions,
            total_memories: records.len() as u64,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        })
    }
}
