use thiserror::Error;

/// Unified error type for the Cerebral client.
#[derive(Error, Debug)]
pub enum CerebralError {
    // ── Branch errors ──────────────────────────────────────────
    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    // ── Input validation ───────────────────────────────────────
    #[error("memory record has no content")]
    EmptyMemoryContent,

    #[error("memory input is empty: provide a title, content, url, or file")]
    EmptyMemoryInput,

    // ── Remote errors ──────────────────────────────────────────
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("delete failed for memory {id}: {reason}")]
    DeleteFailed { id: String, reason: String },

    // ── Conversation errors ────────────────────────────────────
    #[error("conversation turn failed: {0}")]
    ConversationTurnFailed(String),

    #[error("conversation session was reset while the request was in flight")]
    SessionSuperseded,

    // ── Local store errors ─────────────────────────────────────
    #[error("local store error: {0}")]
    Storage(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CerebralError {
    /// Whether this failure means the backend could not be reached or answered
    /// with something unusable. Only these put the memory client in degraded mode.
    pub fn is_transport(&self) -> bool {
        matches!(self, CerebralError::Transport(_) | CerebralError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, CerebralError>;
