use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use cerebral_core::Result;

use crate::backend::{AgentDescriptor, ConversationBackend, ConversationStats, FlowDescriptor};

#[derive(Debug, Default)]
struct Listings {
    agents: Vec<AgentDescriptor>,
    flows: Vec<FlowDescriptor>,
}

/// Read-only listings of registered agents and available flows.
///
/// Each `list_*` call fetches afresh and replaces the cached copy. Failures
/// produce an empty list; these only feed introspection views.
#[derive(Clone)]
pub struct AgentFlowDirectory {
    backend: Arc<dyn ConversationBackend>,
    cache: Arc<Mutex<Listings>>,
}

impl AgentFlowDirectory {
    pub fn new(backend: Arc<dyn ConversationBackend>) -> Self {
        Self {
            backend,
            cache: Arc::new(Mutex::new(Listings::default())),
        }
    }

    pub async fn list_agents(&self) -> Vec<AgentDescriptor> {
        let agents = self.backend.agents().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not list agents");
            Vec::new()
        });
        debug!(count = agents.len(), "agents listed");
        self.cache.lock().agents = agents.clone();
        agents
    }

    pub async fn list_flows(&self) -> Vec<FlowDescriptor> {
        let flows = self.backend.flows().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not list flows");
            Vec::new()
        });
        debug!(count = flows.len(), "flows listed");
        self.cache.lock().flows = flows.clone();
        flows
    }

    /// Agents from the last [`list_agents`](Self::list_agents) call.
    pub fn cached_agents(&self) -> Vec<AgentDescriptor> {
        self.cache.lock().agents.clone()
    }

    pub fn cached_flows(&self) -> Vec<FlowDescriptor> {
        self.cache.lock().flows.clone()
    }

    /// Service statistics from the health endpoint. Errors are returned as is.
    pub async fn health(&self) -> Result<ConversationStats> {
        self.backend.health().await
    }
}
