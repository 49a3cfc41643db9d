//! # cerebral-conversation
//!
//! Client side of the conversation service: the [`ConversationBackend`] port
//! with HTTP and mock implementations, the [`SessionMachine`] that tracks one
//! dialogue session across turns, and the [`AgentFlowDirectory`] used for
//! introspection.

pub mod backend;
pub mod directory;
pub mod http;
pub mod mock;
pub mod session;

pub use backend::{
    AgentDescriptor, AgentResult, ConversationBackend, ConversationState, ConversationStats,
    FlowDescriptor, MemoryResult, MessageRequest, SessionSnapshot, StartRequest, StartResponse,
    TurnResult,
};
pub use directory::AgentFlowDirectory;
pub use http::HttpConversationBackend;
pub use mock::{GatedCall, MockCall, MockConversationBackend};
pub use session::{ConversationSession, SessionMachine, SessionPhase, TurnEvent, TurnOutcome};
