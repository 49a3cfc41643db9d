use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use cerebral_config::CerebralConfig;
use cerebral_conversation::{
    AgentFlowDirectory, ConversationBackend, HttpConversationBackend, SessionMachine,
};
use cerebral_core::Result;
use cerebral_memory::{
    FallbackProvider, HttpMemoryBackend, LocalMemoryStore, MemoryBackend, MemoryClient,
};

/// The one logical client instance, built once at startup and handed to
/// whatever drives it.
#[derive(Clone)]
pub struct AppContext {
    pub config: CerebralConfig,
    pub memory: MemoryClient,
    pub session: SessionMachine,
    pub directory: AgentFlowDirectory,
}

impl AppContext {
    /// Wire HTTP backends and the on-disk local store from config.
    pub fn from_config(config: CerebralConfig) -> Result<Self> {
        let store_path = config.memory.resolved_local_store_path();
        debug!(path = %store_path.display(), "opening local memory store");
        let store = LocalMemoryStore::open(&store_path)?;
        let memory_backend = Arc::new(HttpMemoryBackend::new(config.memory.base_url.clone()));
        let conversation_backend =
            Arc::new(HttpConversationBackend::new(config.conversation.base_url.clone()));
        Ok(Self::with_backends(
            config,
            memory_backend,
            conversation_backend,
            store,
        ))
    }

    /// Wire arbitrary backends, e.g. mocks.
    pub fn with_backends(
        config: CerebralConfig,
        memory_backend: Arc<dyn MemoryBackend>,
        conversation_backend: Arc<dyn ConversationBackend>,
        store: LocalMemoryStore,
    ) -> Self {
        debug!(
            memory = memory_backend.name(),
            conversation = conversation_backend.name(),
            "backends wired"
        );
        let fallback = FallbackProvider::new(store, config.memory.fallback_sample_size);
        let memory = MemoryClient::new(memory_backend, fallback, config.user.user_id.clone())
            .with_search_limit(config.memory.search_limit);
        let session = SessionMachine::new(conversation_backend.clone(), config.user.user_id.clone())
            .with_message_type(config.conversation.message_type.clone());
        let directory = AgentFlowDirectory::new(conversation_backend);
        Self {
            config,
            memory,
            session,
            directory,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config.conversation.refresh_interval_secs)
    }
}
