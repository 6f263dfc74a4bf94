//! In-memory context store
//!
//! One `ConversationContext` per user id, created lazily on first
//! lease. A lease holds that user's `tokio::sync::Mutex`, so concurrent
//! turns from the same user serialize while different users proceed in
//! parallel. The engine never evicts; stale-session cleanup belongs to
//! the caller.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use async_trait::async_trait;
use shop_agent_config::EngineConfig;
use shop_agent_core::{ContextLease, ContextStore, ConversationContext, Result};

/// In-memory, per-user context storage
pub struct InMemoryContextStore {
    contexts: DashMap<String, Arc<Mutex<ConversationContext>>>,
    history_capacity: usize,
}

impl InMemoryContextStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            contexts: DashMap::new(),
            history_capacity,
        }
    }

    /// Number of known sessions
    pub fn session_count(&self) -> usize {
        self.contexts.len()
    }

    /// Whether a session exists for this user id
    pub fn has_session(&self, user_id: &str) -> bool {
        self.contexts.contains_key(user_id)
    }

    /// History capacity from the engine settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.history_capacity)
    }

    fn entry(&self, user_id: &str) -> Arc<Mutex<ConversationContext>> {
        if let Some(existing) = self.contexts.get(user_id) {
            return existing.clone();
        }
        let created = self
            .contexts
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, "creating session context");
                Arc::new(Mutex::new(ConversationContext::with_capacity(
                    self.history_capacity,
                )))
            });
        created.clone()
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new(shop_agent_core::DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn lease(&self, user_id: &str) -> Result<ContextLease> {
        let entry = self.entry(user_id);
        let guard = entry.lock_owned().await;
        Ok(ContextLease::new(guard))
    }
}
