use async_trait::async_trait;
use cerebral_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State label reported by the conversation service.
///
/// Unknown labels are kept verbatim so a newer server never breaks decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConversationState {
    #[default]
    Idle,
    Active,
    Listening,
    Processing,
    WaitingForInput,
    AgentHandoff,
    FlowExecution,
    MemoryRetrieval,
    Completed,
    Error,
    Other(String),
}

impl ConversationState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::WaitingForInput => "waiting_for_input",
            Self::AgentHandoff => "agent_handoff",
            Self::FlowExecution => "flow_execution",
            Self::MemoryRetrieval => "memory_retrieval",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ConversationState {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Self::Idle,
            "active" => Self::Active,
            "listening" => Self::Listening,
            "processing" => Self::Processing,
            "waiting_for_input" => Self::WaitingForInput,
            "agent_handoff" => Self::AgentHandoff,
            "flow_execution" => Self::FlowExecution,
            "memory_retrieval" => Self::MemoryRetrieval,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ConversationState {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ConversationState> for String {
    fn from(state: ConversationState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Requests ───────────────────────────────────────────────────

/// Body of `POST conversation/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub user_id: String,
    pub message: String,
}

/// Body of `POST conversation/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub session_id: String,
    pub message: String,
    pub message_type: String,
}

// ── Responses ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
    #[serde(default)]
    pub current_state: ConversationState,
}

/// Memory lookup the service performed while handling a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryResult {
    pub query: Option<String>,
    pub brain_region: Option<String>,
    pub results: Vec<serde_json::Value>,
    pub timestamp: Option<String>,
}

/// Reply from an agent the service delegated a turn to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentResult {
    pub agent_id: Option<String>,
    pub agent_name: String,
    pub request: Option<String>,
    pub response: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

/// The `result` object of a message-processing response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnResult {
    pub success: bool,
    pub response: Option<String>,
    pub next_state: Option<ConversationState>,
    pub flow_used: Option<String>,
    pub memory_result: Option<MemoryResult>,
    pub agent_result: Option<AgentResult>,
    pub flow_completed: bool,
    pub flow_name: Option<String>,
    /// Elapsed seconds of a completed flow.
    pub duration: Option<f64>,
    pub error: Option<String>,
}

impl TurnResult {
    /// A successful plain reply.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(text.into()),
            ..Default::default()
        }
    }

    /// A backend-reported failure.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// The `session` object of `GET conversation/session/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub current_state: ConversationState,
    pub current_flow: Option<String>,
    pub flow_type: Option<String>,
    pub brain_region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDescriptor {
    pub agent_id: String,
    pub agent_name: String,
    pub description: String,
    /// Skill entries, either plain names or objects with a `name`.
    pub skills: Vec<serde_json::Value>,
    pub status: Option<String>,
}

impl AgentDescriptor {
    pub fn skill_names(&self) -> Vec<String> {
        self.skills
            .iter()
            .filter_map(|s| match s {
                serde_json::Value::String(name) => Some(name.clone()),
                other => other.get("name").and_then(|n| n.as_str()).map(String::from),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowDescriptor {
    pub flow_id: String,
    pub flow_name: String,
    pub flow_type: Option<String>,
    pub description: String,
    pub step_count: u64,
}

/// The `conversation_stats` object of `GET conversation/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationStats {
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub registered_flows: u64,
    pub registered_agents: u64,
    pub flow_types: Vec<String>,
    pub conversation_states: Vec<String>,
}

/// The remote conversation service as seen by the client.
///
/// Transport problems map to `CerebralError::Transport`. A message whose
/// result reports `success: false` is NOT a transport failure: it is returned
/// as a [`TurnResult`] for the session machine to judge.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn health(&self) -> Result<ConversationStats>;

    async fn start(&self, request: &StartRequest) -> Result<StartResponse>;

    async fn message(&self, request: &MessageRequest) -> Result<TurnResult>;

    async fn agents(&self) -> Result<Vec<AgentDescriptor>>;

    async fn flows(&self) -> Result<Vec<FlowDescriptor>>;

    async fn session(&self, session_id: &str) -> Result<SessionSnapshot>;
}
