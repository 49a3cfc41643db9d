use async_trait::async_trait;
use cerebral_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub user_id: String,
    /// Backend domain to scope the search to; omitted for a global search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brain_region: Option<String>,
    pub limit: u32,
}

/// Body of `POST add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub content: String,
    pub user_id: String,
    pub brain_region: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub memory_id: String,
    pub user_id: String,
}

/// Per-domain block of the `GET stats` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionStats {
    pub count: u64,
    pub recent_activity: u64,
    pub avg_importance: f64,
    /// Record count per backend kind label.
    pub memory_types: HashMap<String, u64>,
}

/// Decoded `GET stats` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsResponse {
    /// Keyed by backend domain.
    pub regions: HashMap<String, RegionStats>,
    pub total_memories: u64,
    pub timestamp: Option<String>,
}

/// The remote memory service as seen by the client.
///
/// Implementations report every transport-level problem (unreachable host,
/// non-success status, malformed body, `success: false`) as
/// `CerebralError::Transport`. Record shapes are returned raw; normalizing
/// them is the caller's job.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Human-readable name, e.g. "http" or "mock".
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<serde_json::Value>>;

    /// Create a memory. Returns whatever record or acknowledgment the backend sent.
    async fn add(&self, request: &AddRequest) -> Result<serde_json::Value>;

    async fn delete(&self, request: &DeleteRequest) -> Result<()>;

    async fn stats(&self, user_id: &str) -> Result<StatsResponse>;
}
