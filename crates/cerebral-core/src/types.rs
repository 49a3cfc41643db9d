use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::branch::BranchRegistry;

/// Importance assigned when the backend reports none.
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Who authored a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    System,
    User,
}

/// Selector accepted by provenance filtering. `All` keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceFilter {
    #[default]
    All,
    System,
    User,
}

impl ProvenanceFilter {
    pub fn matches(self, provenance: Provenance) -> bool {
        match self {
            ProvenanceFilter::All => true,
            ProvenanceFilter::System => provenance == Provenance::System,
            ProvenanceFilter::User => provenance == Provenance::User,
        }
    }
}

impl FromStr for ProvenanceFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ProvenanceFilter::All),
            "system" => Ok(ProvenanceFilter::System),
            "user" => Ok(ProvenanceFilter::User),
            other => Err(format!("unknown provenance filter '{other}' (expected all, system, user)")),
        }
    }
}

/// The canonical memory record every backend shape is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub provenance: Provenance,
    pub timestamp: DateTime<Utc>,
    /// Always within `[0, 1]`.
    pub importance: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Logical branch name from the registry.
    pub branch: String,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Memory {
    /// Clamp an importance score into `[0, 1]`; non-finite values become the default.
    pub fn clamp_importance(value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            DEFAULT_IMPORTANCE
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.metadata.get("url").and_then(|v| v.as_str())
    }

    pub fn is_demo(&self) -> bool {
        self.tags.contains("demo")
    }
}

/// An attachment named in a memory input. Only its description travels to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// What a user submits when authoring a memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub files: Vec<Attachment>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MemoryInput {
    pub fn is_empty(&self) -> bool {
        non_blank(&self.title).is_none()
            && non_blank(&self.content).is_none()
            && non_blank(&self.url).is_none()
            && self.files.is_empty()
    }

    /// Text body sent to the backend: title and content, else the url, else the file list.
    pub fn compose_content(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = non_blank(&self.title) {
            parts.push(title.to_string());
        }
        if let Some(content) = non_blank(&self.content) {
            parts.push(content.to_string());
        }
        if parts.is_empty() {
            if let Some(url) = non_blank(&self.url) {
                parts.push(url.to_string());
            }
        }
        if parts.is_empty() && !self.files.is_empty() {
            let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
            parts.push(format!("Attached files: {}", names.join(", ")));
        }
        parts.join("\n\n")
    }

    /// Metadata describing the input's non-content fields.
    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut meta = serde_json::Map::new();
        if let Some(title) = non_blank(&self.title) {
            meta.insert("title".into(), title.into());
        }
        if let Some(url) = non_blank(&self.url) {
            meta.insert("url".into(), url.into());
        }
        if !self.files.is_empty() {
            meta.insert(
                "files".into(),
                serde_json::to_value(&self.files).unwrap_or_default(),
            );
        }
        meta
    }
}

/// Aggregate statistics for one branch. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchStats {
    pub total_memories: u64,
    pub recent_activity: u64,
    pub avg_importance: f64,
    pub system_generated: u64,
    pub user_generated: u64,
    pub last_updated: DateTime<Utc>,
}

impl BranchStats {
    pub fn zero(at: DateTime<Utc>) -> Self {
        Self {
            total_memories: 0,
            recent_activity: 0,
            avg_importance: 0.0,
            system_generated: 0,
            user_generated: 0,
            last_updated: at,
        }
    }
}

/// Statistics across every branch in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Keyed by logical branch name; every registered branch is present.
    pub branches: BTreeMap<String, BranchStats>,
    pub total_memories: u64,
    /// Set when the numbers were synthesized instead of fetched.
    pub fallback_mode: bool,
    pub timestamp: DateTime<Utc>,
}

impl MemoryStats {
    /// All-zero stats for every branch. Not a degraded result.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            branches: BranchRegistry::names()
                .map(|name| (name.to_string(), BranchStats::zero(now)))
                .collect(),
            total_memories: 0,
            fallback_mode: false,
            timestamp: now,
        }
    }
}

/// Outcome of a read that is allowed to degrade instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Data came from the backend.
    Live(T),
    /// The backend failed; `data` was synthesized locally.
    Degraded { data: T, reason: String },
}

impl<T> Fetched<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }

    pub fn data(&self) -> &T {
        match self {
            Fetched::Live(data) | Fetched::Degraded { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Fetched::Live(data) | Fetched::Degraded { data, .. } => data,
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Fetched::Live(_) => None,
            Fetched::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Live(data) => Fetched::Live(f(data)),
            Fetched::Degraded { data, reason } => Fetched::Degraded {
                data: f(data),
                reason,
            },
        }
    }
}
