//! Mock conversation service for deterministic testing.
//!
//! Returns queued responses without making any HTTP calls. A gate can hold a
//! `start`, `message` or `session` call in flight so tests can interleave a reset.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

use cerebral_core::{CerebralError, Result};

use crate::backend::*;

/// A call the mock received, for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Health,
    Start(StartRequest),
    Message(MessageRequest),
    Agents,
    Flows,
    Session(String),
}

/// Calls that can be held on a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedCall {
    Start,
    Message,
    Session,
}

/// A mock conversation backend.
///
/// Without queued responses, `start` opens `session-N` in the `active` state
/// and `message` echoes the text back.
///
/// # Example
/// ```
/// use cerebral_conversation::mock::MockConversationBackend;
/// use cerebral_conversation::TurnResult;
/// let backend = MockConversationBackend::new()
///     .with_turn(TurnResult::reply("Hello!"));
/// assert!(backend.recorded_calls().is_empty());
/// ```
#[derive(Default)]
pub struct MockConversationBackend {
    starts: Mutex<VecDeque<Result<StartResponse>>>,
    turns: Mutex<VecDeque<Result<TurnResult>>>,
    snapshot: Mutex<Option<SessionSnapshot>>,
    agents: Mutex<Vec<AgentDescriptor>>,
    flows: Mutex<Vec<FlowDescriptor>>,
    /// Every call received, in order.
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    offline: AtomicBool,
    gates: Vec<(GatedCall, Arc<Notify>)>,
    next_session: AtomicU64,
}

impl MockConversationBackend {
    pub fn new() -> Self {
        Self::default()
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

    pub fn with_start(self, response: StartResponse) -> Self {
        self.starts.lock().push_back(Ok(response));
        self
    }

    /// Queue a message-processing result.
    pub fn with_turn(self, result: TurnResult) -> Self {
        self.turns.lock().push_back(Ok(result));
        self
    }

    /// Queue a transport failure for the next message call.
    pub fn with_turn_error(self, reason: &str) -> Self {
        self.turns
            .lock()
            .push_back(Err(CerebralError::Transport(reason.to_string())));
        self
    }

    pub fn with_agents(self, agents: Vec<AgentDescriptor>) -> Self {
        *self.agents.lock() = agents;
        self
    }

    pub fn with_flows(self, flows: Vec<FlowDescriptor>) -> Self {
        *self.flows.lock() = flows;
        self
    }

    /// Hold every call of `kind` until the gate is notified.
    pub fn with_gate(mut self, kind: GatedCall, gate: Arc<Notify>) -> Self {
        self.gates.push((kind, gate));
        self
    }

    pub fn with_message_gate(self, gate: Arc<Notify>) -> Self {
        self.with_gate(GatedCall::Message, gate)
    }

    /// Set the snapshot returned by `session`.
    pub fn set_snapshot(&self, snapshot: SessionSnapshot) {
        *self.snapshot.lock() = Some(snapshot);
    }

    pub fn recorded_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn enter(&self, call: MockCall) -> Result<()> {
        self.calls.lock().push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CerebralError::Transport("connection refused".into()));
        }
        Ok(())
    }

    async fn wait_gate(&self, kind: GatedCall) {
        for (gated, gate) in &self.gates {
            if *gated == kind {
                gate.notified().await;
            }
        }
    }
}

#[async_trait]
impl ConversationBackend for MockConversationBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health(&self) -> Result<ConversationStats> {
        self.enter(MockCall::Health)?;
        Ok(ConversationStats {
            total_sessions: self.next_session.load(Ordering::SeqCst),
            registered_agents: self.agents.lock().len() as u64,
            registered_flows: self.flows.lock().len() as u64,
            ..Default::default()
        })
    }

    async fn start(&self, request: &StartRequest) -> Result<StartResponse> {
        self.enter(MockCall::Start(request.clone()))?;
        self.wait_gate(GatedCall::Start).await;
        if let Some(queued) = self.starts.lock().pop_front() {
            return queued;
        }
        let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StartResponse {
            session_id: format!("session-{n}"),
            current_state: ConversationState::Active,
        })
    }

    async fn message(&self, request: &MessageRequest) -> Result<TurnResult> {
        self.enter(MockCall::Message(request.clone()))?;
        self.wait_gate(GatedCall::Message).await;
        let queued = self.turns.lock().pop_front();
        queued.unwrap_or_else(|| Ok(TurnResult::reply(format!("echo: {}", request.message))))
    }

    async fn agents(&self) -> Result<Vec<AgentDescriptor>> {
        self.enter(MockCall::Agents)?;
        Ok(self.agents.lock().clone())
    }

    async fn flows(&self) -> Result<Vec<FlowDescriptor>> {
        self.enter(MockCall::Flows)?;
        Ok(self.flows.lock().clone())
    }

    async fn session(&self, session_id: &str) -> Result<SessionSnapshot> {
        self.enter(MockCall::Session(session_id.to_string()))?;
        self.wait_gate(GatedCall::Session).await;
        let snapshot = self.snapshot.lock().clone();
        snapshot.ok_or_else(|| {
            CerebralError::Transport(format!("HTTP 404: session {session_id} not found"))
        })
    }
}
