//! Per-user context store trait

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::context::ConversationContext;
use crate::error::Result;

/// Exclusive lease over one user's conversation context.
///
/// Holding the lease serializes concurrent turns from the same user;
/// turns from different users proceed in parallel. The turn engine
/// mutates a working copy and commits it through the lease only when
/// the turn completes, so an aborted turn leaves the stored context
/// untouched.
pub struct ContextLease {
    guard: OwnedMutexGuard<ConversationContext>,
}

impl ContextLease {
    pub fn new(guard: OwnedMutexGuard<ConversationContext>) -> Self {
        Self { guard }
    }

    /// Snapshot of the stored context to work on
    pub fn snapshot(&self) -> ConversationContext {
        self.guard.clone()
    }

    /// Commit a completed turn's context
    pub fn commit(mut self, context: ConversationContext) {
        *self.guard = context;
    }
}

/// Keyed conversation-context storage
///
/// The engine depends only on this get-exclusive capability, not on any
/// particular storage implementation. Sessions are created on first
/// lease for a user id; eviction of stale sessions is the caller's
/// concern, never the engine's.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn lease(&self, user_id: &str) -> Result<ContextLease>;
}
