//! Context-aware catalog query resolution
//!
//! Resolves free-text customer messages into grounded catalog answers
//! across a multi-turn conversation:
//! - intent gate with local pre-classification rules
//! - deterministic exact matcher over catalog snapshots
//! - candidate search cascade with relevance scoring
//! - context disambiguation (same product vs. a different one)
//! - variant/attribute validation against real variant data
//!
//! `QueryEngine` wires these over the collaborator traits from
//! `shop-agent-core`; one `handle_turn` call resolves one message.

pub mod cascade;
pub mod disambiguator;
pub mod gate;
pub mod matcher;
pub mod resolver;
pub mod variants;

#[cfg(test)]
pub(crate) mod testutil;

pub use cascade::{CascadeOutcome, SearchCascade};
pub use disambiguator::{CandidateAction, Disambiguator, GroundingDecision};
pub use gate::{GateDecision, IntentGate};
pub use matcher::match_entities;
pub use resolver::QueryEngine;
pub use variants::{VariantResolution, VariantResolver};
