//! The conversation session machine.
//!
//! One live session per machine. The first turn from `Idle` opens a session
//! on the service and then processes the same text; later turns only process.
//! Every request captures the generation it was issued under. `reset()` and
//! adopting a new session bump the generation, so a response that comes back
//! for an older generation is dropped with [`CerebralError::SessionSuperseded`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cerebral_core::{CerebralError, Result};

use crate::backend::*;

/// Whether a session has been established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
}

/// The client's view of its conversation session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSession {
    /// Assigned by the service; absent until the first turn.
    pub session_id: Option<String>,
    pub phase: SessionPhase,
    /// Last state the service reported.
    pub state: ConversationState,
    pub active_flow: Option<String>,
    pub last_server_sync_at: Option<DateTime<Utc>>,
}

/// Something a turn produced for the front-end to show.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The service's own reply.
    Reply(String),
    /// The service looked memories up while handling the turn.
    MemoryLookup { count: usize, domain: Option<String> },
    /// A delegated agent answered.
    AgentReply { agent_name: String, text: String },
    FlowCompleted {
        flow_name: Option<String>,
        duration_secs: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub session_id: String,
    pub state: ConversationState,
    pub active_flow: Option<String>,
    pub events: Vec<TurnEvent>,
}

#[derive(Debug, Default)]
struct Inner {
    session: ConversationSession,
    generation: u64,
}

/// Drives the session lifecycle against a [`ConversationBackend`].
#[derive(Clone)]
pub struct SessionMachine {
    backend: Arc<dyn ConversationBackend>,
    user_id: String,
    message_type: String,
    inner: Arc<Mutex<Inner>>,
}

impl SessionMachine {
    pub fn new(backend: Arc<dyn ConversationBackend>, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
            message_type: "user".into(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn with_message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = message_type.into();
        self
    }

    /// Current session record.
    pub fn session(&self) -> ConversationSession {
        self.inner.lock().session.clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().session.phase == SessionPhase::Active
    }

    /// Submit one user turn.
    ///
    /// A backend-reported failure yields [`CerebralError::ConversationTurnFailed`]
    /// and leaves the session untouched.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnOutcome> {
        let (mut generation, current) = {
            let inner = self.inner.lock();
            (inner.generation, inner.session.session_id.clone())
        };

        let session_id = match current {
            Some(id) => id,
            None => {
                let started = self
                    .backend
                    .start(&StartRequest {
                        user_id: self.user_id.clone(),
                        message: text.to_string(),
                    })
                    .await?;

                let mut inner = self.inner.lock();
                if inner.generation != generation {
                    debug!(session_id = %started.session_id, "session start superseded");
                    return Err(CerebralError::SessionSuperseded);
                }
                inner.generation += 1;
                generation = inner.generation;
                inner.session = ConversationSession {
                    session_id: Some(started.session_id.clone()),
                    phase: SessionPhase::Active,
                    state: started.current_state,
                    active_flow: None,
                    last_server_sync_at: Some(Utc::now()),
                };
                info!(session_id = %started.session_id, "conversation started");
                started.session_id
            }
        };

        let result = self
            .backend
            .message(&MessageRequest {
                session_id: session_id.clone(),
                message: text.to_string(),
                message_type: self.message_type.clone(),
            })
            .await?;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(session_id = %session_id, "discarding response for superseded session");
            return Err(CerebralError::SessionSuperseded);
        }
        if !result.success {
            let reason = result
                .error
                .unwrap_or_else(|| "conversation service rejected the turn".into());
            warn!(session_id = %session_id, reason = %reason, "turn failed");
            return Err(CerebralError::ConversationTurnFailed(reason));
        }

        let session = &mut inner.session;
        if let Some(next) = result.next_state {
            session.state = next;
        }
        if let Some(flow) = result.flow_used {
            session.active_flow = Some(flow);
        }

        let mut events = Vec::new();
        if let Some(reply) = result.response.filter(|r| !r.is_empty()) {
            events.push(TurnEvent::Reply(reply));
        }
        if let Some(lookup) = result.memory_result {
            events.push(TurnEvent::MemoryLookup {
                count: lookup.results.len(),
                domain: lookup.brain_region,
            });
        }
        if let Some(agent) = result.agent_result {
            events.push(TurnEvent::AgentReply {
                agent_name: agent.agent_name,
                text: agent.response.unwrap_or_default(),
            });
        }
        if result.flow_completed {
            session.active_flow = None;
            info!(flow = ?result.flow_name, "flow completed");
            events.push(TurnEvent::FlowCompleted {
                flow_name: result.flow_name,
                duration_secs: result.duration.unwrap_or(0.0),
            });
        }

        Ok(TurnOutcome {
            session_id,
            state: session.state.clone(),
            active_flow: session.active_flow.clone(),
            events,
        })
    }

    /// Overwrite local state and flow from the service's session snapshot.
    ///
    /// Returns `Ok(None)` when there is no session to reconcile.
    pub async fn refresh(&self) -> Result<Option<ConversationSession>> {
        let (generation, current) = {
            let inner = self.inner.lock();
            (inner.generation, inner.session.session_id.clone())
        };
        let Some(session_id) = current else {
            return Ok(None);
        };

        let snapshot = self.backend.session(&session_id).await?;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return Err(CerebralError::SessionSuperseded);
        }
        inner.session.state = snapshot.current_state;
        inner.session.active_flow = snapshot.current_flow;
        inner.session.last_server_sync_at = Some(Utc::now());
        debug!(session_id = %session_id, state = %inner.session.state, "session reconciled");
        Ok(Some(inner.session.clone()))
    }

    /// Drop the session. Responses to requests already in flight are discarded.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some(id) = inner.session.session_id.take() {
            info!(session_id = %id, "conversation reset");
        }
        inner.session = ConversationSession::default();
    }

    /// Run [`refresh`](Self::refresh) every `interval` until the handle is aborted.
    pub fn spawn_refresh(&self, interval: Duration) -> JoinHandle<()> {
        let machine = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match machine.refresh().await {
                    Ok(_) | Err(CerebralError::SessionSuperseded) => {}
                    Err(e) => warn!(error = %e, "session refresh failed"),
                }
            }
        })
    }
}
