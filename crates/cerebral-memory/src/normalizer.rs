//! Converts raw backend memory records into the canonical [`Memory`].
//!
//! The backend's record shape is not under our control: text may arrive as
//! `content` or `memory`, the kind label may sit at the top level or inside
//! `metadata`, timestamps may or may not carry an offset. Everything that
//! interprets those shapes lives here, including the provenance rule.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;

use cerebral_core::{
    BranchDescriptor, BranchRegistry, CerebralError, DEFAULT_IMPORTANCE, Memory, Provenance,
    Result,
};

/// Backend kinds whose records are written by the system rather than a person.
pub const SYSTEM_KINDS: &[&str] = &["agent", "session"];

/// Branch used when a record names neither a known domain nor a known kind.
const DEFAULT_BRANCH: &str = "System";

/// Classify a backend kind label. Absent or unrecognized kinds are user-authored.
pub fn provenance_for_kind(kind: Option<&str>) -> Provenance {
    match kind {
        Some(k) if SYSTEM_KINDS.iter().any(|s| s.eq_ignore_ascii_case(k.trim())) => {
            Provenance::System
        }
        _ => Provenance::User,
    }
}

fn metadata_of(raw: &Value) -> Option<&serde_json::Map<String, Value>> {
    raw.get("metadata").and_then(Value::as_object)
}

/// Look a field up at the top level first, then inside `metadata`.
fn field<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| metadata_of(raw).and_then(|m| m.get(key)).filter(|v| !v.is_null()))
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The backend's kind label for a record, if any.
pub fn raw_kind(raw: &Value) -> Option<&str> {
    non_blank_str(metadata_of(raw).and_then(|m| m.get("memory_type")))
        .or_else(|| non_blank_str(raw.get("memory_type")))
        .or_else(|| non_blank_str(raw.get("kind")))
}

/// Work out which branch a record belongs to when the request was not branch-scoped.
pub fn infer_branch(raw: &Value) -> &'static BranchDescriptor {
    if let Some(domain) = non_blank_str(raw.get("brain_region")) {
        if let Some(branch) = BranchRegistry::by_domain(domain) {
            return branch;
        }
    }
    if let Some(kind) = raw_kind(raw) {
        if let Some(branch) = BranchRegistry::all()
            .iter()
            .find(|b| b.kind.eq_ignore_ascii_case(kind))
        {
            return branch;
        }
    }
    // The table always carries the default branch.
    BranchRegistry::resolve(DEFAULT_BRANCH).unwrap_or(&BranchRegistry::all()[0])
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive ISO timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp_of(raw: &Value) -> DateTime<Utc> {
    ["timestamp", "created_at", "updated_at"]
        .iter()
        .filter_map(|k| non_blank_str(field(raw, k)))
        .find_map(parse_timestamp)
        .unwrap_or_else(Utc::now)
}

fn number_of(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id_of(raw: &Value) -> String {
    match raw.get("id").or_else(|| raw.get("memory_id")) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

fn tags_of(raw: &Value, kind: Option<&str>) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    match field(raw, "tags") {
        Some(Value::Array(items)) => {
            tags.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }
        Some(Value::String(s)) => {
            tags.extend(
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }
        _ => {}
    }
    if let Some(category) = non_blank_str(field(raw, "category")) {
        tags.insert(category.to_string());
    }
    if let Some(kind) = kind {
        tags.insert(kind.to_string());
    }
    tags
}

/// Normalize one raw record into a memory of `branch`.
///
/// Fails with [`CerebralError::EmptyMemoryContent`] when neither `content`
/// nor `memory` carries text; the caller decides whether to drop the record.
pub fn normalize(raw: &Value, branch: &BranchDescriptor) -> Result<Memory> {
    let content = non_blank_str(raw.get("content"))
        .or_else(|| non_blank_str(raw.get("memory")))
        .ok_or(CerebralError::EmptyMemoryContent)?
        .to_string();

    let kind = raw_kind(raw);

    let mut metadata = metadata_of(raw).cloned().unwrap_or_default();
    if let Some(url) = non_blank_str(raw.get("url")) {
        metadata
            .entry("url")
            .or_insert_with(|| Value::String(url.to_string()));
    }

    let importance = number_of(field(raw, "importance"))
        .map(Memory::clamp_importance)
        .unwrap_or(DEFAULT_IMPORTANCE);

    let access_count = number_of(field(raw, "access_count"))
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0) as u64)
        .unwrap_or(0);

    Ok(Memory {
        id: id_of(raw),
        content,
        provenance: provenance_for_kind(kind),
        timestamp: timestamp_of(raw),
        importance,
        tags: tags_of(raw, kind),
        metadata,
        branch: branch.name.to_string(),
        access_count,
    })
}

/// Element-wise [`normalize`], preserving input order.
pub fn normalize_batch(raw: &[Value], branch: &BranchDescriptor) -> Vec<Result<Memory>> {
    raw.iter().map(|record| normalize(record, branch)).collect()
}
