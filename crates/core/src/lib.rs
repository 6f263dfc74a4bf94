//! Core types and traits for the catalog query resolution engine
//!
//! This crate provides foundational types used across all other crates:
//! - Catalog entity model (products, variable parents, variants)
//! - Query intents and classifier output decoding
//! - Per-user conversation context
//! - Per-turn instructions and outcomes
//! - Error taxonomy
//! - Collaborator traits (catalog, classifier, enrichment, sessions)

pub mod context;
pub mod entity;
pub mod error;
pub mod intent;
pub mod traits;
pub mod turn;

pub use context::{ConversationContext, TurnRecord, DEFAULT_HISTORY_CAPACITY};
pub use entity::{
    AttributeSpec, AttributeValue, CatalogEntity, Enrichment, EntityKind, MatchResult, StockState,
};
pub use error::{Error, Result};
pub use intent::{Classification, QueryIntent};
pub use turn::{HandoffKind, ResponseInstruction, TurnOutcome};

pub use traits::{CatalogClient, ClassifierClient, ContextLease, ContextStore, EnrichmentStore};
