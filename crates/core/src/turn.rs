//! Per-turn outputs
//!
//! `ResponseInstruction` is the structured instruction handed to the
//! renderer collaborator: the renderer turns it into prose but must
//! never receive (or invent) facts the engine did not put in it. Every
//! instruction also carries a deterministic fallback text so a renderer
//! outage still answers the user.

use serde::{Deserialize, Serialize};

use crate::entity::CatalogEntity;

/// Why a conversation cannot be served by the catalog flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffKind {
    Complaint,
    HumanRequested,
    ReturnOrExchange,
}

/// Structured instruction for the response renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum ResponseInstruction {
    /// Present one grounded entity with its (possibly enriched) facts
    ShowEntity { entity: CatalogEntity },
    /// Present a ranked candidate list and ask the user to pick
    ListCandidates {
        term: String,
        candidates: Vec<CatalogEntity>,
    },
    /// Ask the user to disambiguate between exact-name matches
    AskDisambiguation { candidates: Vec<CatalogEntity> },
    /// Enumerate real values of one attribute on the grounded entity
    ListAttributeValues {
        entity: CatalogEntity,
        attribute: String,
        values: Vec<String>,
    },
    /// The grounded entity does not declare the requested attribute
    AttributeUnknown {
        entity: CatalogEntity,
        attribute: String,
    },
    /// The attribute exists but the requested value does not
    AttributeValueRejected {
        entity: CatalogEntity,
        attribute: String,
        requested_value: String,
        available_values: Vec<String>,
    },
    /// Nothing in the catalog matched the term
    NotFound { term: String },
    /// Fixed help reply (generic phrases, "what do you sell")
    Help,
    /// Message could not be understood at all
    DidNotUnderstand,
    /// Conservative fallback when a collaborator failed
    AskForSpecifics,
    /// Fixed reply routing away from the catalog flow
    Handoff { kind: HandoffKind },
}

/// Result handed back to the caller for one inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Customer-facing reply text
    pub reply_text: String,
    /// Entity the conversation is grounded on after this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounded_entity: Option<CatalogEntity>,
    /// Candidates shown this turn, pending disambiguation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_list: Option<Vec<CatalogEntity>>,
    /// Short option labels the caller may render as quick replies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl TurnOutcome {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply_text: text.into(),
            grounded_entity: None,
            candidate_list: None,
            options: Vec::new(),
        }
    }

    pub fn with_grounded(mut self, entity: CatalogEntity) -> Self {
        self.grounded_entity = Some(entity);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CatalogEntity>) -> Self {
        self.options = candidates
            .iter()
            .map(|c| match &c.code {
                Some(code) => format!("{} ({})", c.display_name, code),
                None => c.display_name.clone(),
            })
            .collect();
        self.candidate_list = Some(candidates);
        self
    }
}
