//! Per-user conversational memory
//!
//! One `ConversationContext` exists per user session. The current focus
//! of the conversation is either a grounded entity or a shown candidate
//! list, never both: the mutating methods enforce that setting one
//! clears the other. Stale-session eviction is the caller's concern.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{CatalogEntity, EntityKind};
use crate::intent::QueryIntent;

/// Default history ring-buffer capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 12;

/// One recorded turn, newest-last in the history buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// What the user sent
    pub user_message: String,
    /// What the engine replied
    pub reply: String,
    /// Intent decided for the turn
    pub intent: QueryIntent,
    /// When the turn completed
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn new(
        user_message: impl Into<String>,
        reply: impl Into<String>,
        intent: QueryIntent,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            reply: reply.into(),
            intent,
            timestamp: Utc::now(),
        }
    }
}

/// Conversational memory for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    grounded_entity: Option<CatalogEntity>,
    /// Variant set of the grounded parent, cached to avoid re-fetch.
    /// Non-None only while `grounded_entity` is a variable parent.
    grounded_variants: Option<Vec<CatalogEntity>>,
    last_shown_candidates: Option<Vec<CatalogEntity>>,
    last_search_key: Option<String>,
    history: VecDeque<TurnRecord>,
    history_capacity: usize,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(history_capacity: usize) -> Self {
        Self {
            grounded_entity: None,
            grounded_variants: None,
            last_shown_candidates: None,
            last_search_key: None,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity: history_capacity.max(1),
        }
    }

    pub fn grounded_entity(&self) -> Option<&CatalogEntity> {
        self.grounded_entity.as_ref()
    }

    pub fn grounded_variants(&self) -> Option<&[CatalogEntity]> {
        self.grounded_variants.as_deref()
    }

    pub fn last_shown_candidates(&self) -> Option<&[CatalogEntity]> {
        self.last_shown_candidates.as_deref()
    }

    pub fn last_search_key(&self) -> Option<&str> {
        self.last_search_key.as_deref()
    }

    /// Ground the conversation on an entity. Clears any shown candidate
    /// list and cached variants of a previous parent.
    pub fn ground(&mut self, entity: CatalogEntity) {
        tracing::debug!(entity_id = %entity.id, name = %entity.display_name, "grounding entity");
        self.grounded_entity = Some(entity);
        self.grounded_variants = None;
        self.last_shown_candidates = None;
        self.last_search_key = None;
    }

    /// Cache the variant set of the currently grounded parent. A no-op
    /// unless the grounded entity is a variable parent.
    pub fn cache_variants(&mut self, variants: Vec<CatalogEntity>) {
        if self
            .grounded_entity
            .as_ref()
            .is_some_and(|e| e.kind == EntityKind::VariableParent)
        {
            self.grounded_variants = Some(variants);
        }
    }

    /// Record a shown candidate list. Clears any grounded entity: the
    /// two are mutually exclusive focus representations.
    pub fn show_candidates(&mut self, candidates: Vec<CatalogEntity>, search_key: impl Into<String>) {
        self.grounded_entity = None;
        self.grounded_variants = None;
        self.last_shown_candidates = Some(candidates);
        self.last_search_key = Some(search_key.into());
    }

    /// Drop the grounded entity and its cached variants
    pub fn discard_grounding(&mut self) {
        if let Some(ref entity) = self.grounded_entity {
            tracing::debug!(entity_id = %entity.id, "discarding grounded entity");
        }
        self.grounded_entity = None;
        self.grounded_variants = None;
    }

    /// Drop both focus representations
    pub fn clear_focus(&mut self) {
        self.grounded_entity = None;
        self.grounded_variants = None;
        self.last_shown_candidates = None;
        self.last_search_key = None;
    }

    /// Append a completed turn, trimming the oldest past capacity
    pub fn record_turn(&mut self, record: TurnRecord) {
        if self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Recent turns, oldest-first
    pub fn history(&self) -> impl Iterator<Item = &TurnRecord> {
        self.history.iter()
    }

    /// Last `n` turns as (user, reply) pairs for the classifier
    pub fn recent_exchanges(&self, n: usize) -> Vec<(String, String)> {
        self.history
            .iter()
            .rev()
            .take(n)
            .map(|t| (t.user_message.clone(), t.reply.clone()))
            .rev()
            .collect()
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn parent() -> CatalogEntity {
        CatalogEntity::simple("p1", "Remera Basica").with_kind(EntityKind::VariableParent)
    }

    #[test]
    fn test_grounding_clears_candidates() {
        let mut ctx = ConversationContext::new();
        ctx.show_candidates(vec![parent()], "remera");
        assert!(ctx.last_shown_candidates().is_some());

        ctx.ground(parent());
        assert!(ctx.grounded_entity().is_some());
        assert!(ctx.last_shown_candidates().is_none());
        assert!(ctx.last_search_key().is_none());
    }

    #[test]
    fn test_candidates_clear_grounding() {
        let mut ctx = ConversationContext::new();
        ctx.ground(parent());
        ctx.cache_variants(vec![CatalogEntity::simple("v1", "Remera Roja")]);

        ctx.show_candidates(vec![parent()], "remera");
        assert!(ctx.grounded_entity().is_none());
        assert!(ctx.grounded_variants().is_none());
    }

    #[test]
    fn test_variant_cache_requires_grounding() {
        let mut ctx = ConversationContext::new();
        ctx.cache_variants(vec![parent()]);
        assert!(ctx.grounded_variants().is_none());
    }

    #[test]
    fn test_variant_cache_requires_variable_parent() {
        let mut ctx = ConversationContext::new();
        ctx.ground(CatalogEntity::simple("s1", "Taza Azul"));
        ctx.cache_variants(vec![parent()]);
        assert!(ctx.grounded_variants().is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ctx = ConversationContext::with_capacity(3);
        for i in 0..5 {
            ctx.record_turn(TurnRecord::new(
                format!("msg {i}"),
                "ok",
                QueryIntent::GeneralInfo,
            ));
        }
        assert_eq!(ctx.turn_count(), 3);
        let first = ctx.history().next().unwrap();
        assert_eq!(first.user_message, "msg 2");
    }
}
