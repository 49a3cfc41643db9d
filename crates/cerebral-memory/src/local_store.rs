use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use cerebral_core::{CerebralError, Memory, Result};

fn storage_err(e: rusqlite::Error) -> CerebralError {
    CerebralError::Storage(e.to_string())
}

/// Durable per-branch list of memories authored while the backend was unreachable.
///
/// Each row holds the canonical [`Memory`] serialized as JSON text. Rows are
/// append-only and read back in insertion order.
#[derive(Clone)]
pub struct LocalMemoryStore {
    db: Arc<Mutex<Connection>>,
}

impl LocalMemoryStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        info!(?path, "opening local memory store");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(storage_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(storage_err)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS local_memories (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                branch TEXT NOT NULL,
                memory_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_local_memories_branch ON local_memories(branch);
            ",
        )
        .map_err(storage_err)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for tests, or when the on-disk store is unavailable).
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    /// Append a memory under its branch.
    pub fn append(&self, memory: &Memory) -> Result<()> {
        let json = serde_json::to_string(memory)?;
        let db = self.db.lock();
        db.execute(
            "INSERT INTO local_memories (id, branch, memory_json, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                &memory.id,
                &memory.branch,
                json,
                memory.timestamp.to_rfc3339()
            ],
        )
        .map_err(storage_err)?;
        debug!(id = %memory.id, branch = %memory.branch, "stored memory locally");
        Ok(())
    }

    /// All memories stored for a branch, oldest first.
    pub fn list(&self, branch: &str) -> Result<Vec<Memory>> {
        let rows: Vec<String> = {
            let db = self.db.lock();
            let mut stmt = db
                .prepare("SELECT memory_json FROM local_memories WHERE branch = ?1 ORDER BY seq ASC")
                .map_err(storage_err)?;
            stmt.query_map([branch], |row| row.get::<_, String>(0))
                .map_err(storage_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(storage_err)?
        };

        rows.iter()
            .map(|json| serde_json::from_str::<Memory>(json).map_err(CerebralError::from))
            .collect()
    }

    /// Total number of stored memories across branches.
    pub fn count(&self) -> Result<usize> {
        let db = self.db.lock();
        let n: i64 = db
            .query_row("SELECT COUNT(*) FROM local_memories", [], |row| row.get(0))
            .map_err(storage_err)?;
        Ok(n.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerebral_core::Provenance;
    use chrono::Utc;

    fn memory(id: &str, branch: &str) -> Memory {
        Memory {
            id: id.into(),
            content: format!("content of {id}"),
            provenance: Provenance::User,
            timestamp: Utc::now(),
            importance: 0.5,
            metadata: Default::default(),
            branch: branch.into(),
            access_count: 0,
            tags: Default::default(),
        }
    }

    #[test]
    fn lists_only_the_requested_branch_in_order() {
        let store = LocalMemoryStore::open_in_memory().unwrap();
        store.append(&memory("a", "Episodic")).unwrap();
        store.append(&memory("b", "Working")).unwrap();
        store.append(&memory("c", "Episodic")).unwrap();

        let episodic = store.list("Episodic").unwrap();
        let ids: Vec<_> = episodic.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(store.count().unwrap(), 3);
        assert!(store.list("System").unwrap().is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let store = LocalMemoryStore::open_in_memory().unwrap();
        store.append(&memory("a", "Episodic")).unwrap();
        let err = store.append(&memory("a", "Episodic")).unwrap_err();
        assert!(matches!(err, CerebralError::Storage(_)));
    }
}
