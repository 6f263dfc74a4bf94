//! Intent gate
//!
//! An ordered table of fixed-cost local rules runs before any external
//! call: each rule either settles the turn with a fixed instruction,
//! forces a classification, or passes. Only messages no rule claims
//! reach the classifier collaborator, and a classifier failure degrades
//! to `Ambiguous` instead of aborting the turn. The table is a
//! cost-saving pre-gate, not the primary classification mechanism.

use unicode_segmentation::UnicodeSegmentation;

use shop_agent_config::Lexicon;
use shop_agent_core::{
    CatalogEntity, Classification, ClassifierClient, HandoffKind, QueryIntent,
    ResponseInstruction,
};
use shop_agent_text::{extract_primary_code, normalize_name};

/// What the gate decided for one message
#[derive(Debug)]
pub enum GateDecision {
    /// Settled locally with a fixed instruction; no collaborator calls
    Fixed(ResponseInstruction),
    /// Classification to drive the rest of the pipeline
    Classified(Classification),
}

/// What a local rule can decide
enum LocalOutcome {
    Fixed(ResponseInstruction),
    Classified(Classification),
}

struct LocalRule {
    name: &'static str,
    check: fn(&Lexicon, &str, &str) -> Option<LocalOutcome>,
}

/// Evaluated in order; first claim wins.
const LOCAL_RULES: &[LocalRule] = &[
    LocalRule {
        name: "gibberish",
        check: |_, raw, normalized| {
            is_gibberish(raw, normalized)
                .then_some(LocalOutcome::Fixed(ResponseInstruction::DidNotUnderstand))
        },
    },
    LocalRule {
        name: "generic_phrase",
        check: |lexicon, _, normalized| {
            lexicon
                .is_generic_phrase(normalized)
                .then_some(LocalOutcome::Fixed(ResponseInstruction::Help))
        },
    },
    LocalRule {
        name: "explicit_code",
        check: |_, raw, _| {
            extract_primary_code(raw).map(|code| {
                LocalOutcome::Classified(Classification::new(QueryIntent::Product).with_code(code))
            })
        },
    },
];

/// The pre-classifier gate
pub struct IntentGate<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> IntentGate<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Run only the local rule table; `None` means no rule claimed the
    /// message.
    pub fn local_decision(&self, message: &str) -> Option<GateDecision> {
        let normalized = normalize_name(message);
        for rule in LOCAL_RULES {
            if let Some(outcome) = (rule.check)(self.lexicon, message, &normalized) {
                tracing::debug!(rule = rule.name, "gate rule claimed message");
                return Some(match outcome {
                    LocalOutcome::Fixed(instruction) => GateDecision::Fixed(instruction),
                    LocalOutcome::Classified(c) => GateDecision::Classified(c),
                });
            }
        }
        None
    }

    /// Full gate: local rules first, then the classifier collaborator.
    pub async fn decide(
        &self,
        message: &str,
        recent_history: &[(String, String)],
        grounded_entity: Option<&CatalogEntity>,
        classifier: &dyn ClassifierClient,
    ) -> GateDecision {
        if let Some(decision) = self.local_decision(message) {
            return decision;
        }

        let classification = match classifier
            .classify(message, recent_history, grounded_entity)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "classifier failed, degrading to ambiguous");
                Classification::new(QueryIntent::Ambiguous)
            }
        };

        GateDecision::Classified(merge_rules(classification, grounded_entity.is_some()))
    }
}

/// Post-classification merge rules.
///
/// A variant-shaped intent only stands when an entity is grounded and
/// the question names an attribute; otherwise it collapses into a
/// product query. An explicit code always means a product query.
pub fn merge_rules(mut classification: Classification, has_grounded: bool) -> Classification {
    if classification.code.is_some() {
        classification.intent = QueryIntent::Product;
        return classification;
    }
    if classification.intent == QueryIntent::Variant
        && !(has_grounded && classification.is_attribute_question())
    {
        classification.intent = QueryIntent::Product;
    }
    classification
}

/// Route an unserviceable message to its handoff kind by keyword.
pub fn handoff_kind(normalized_message: &str) -> HandoffKind {
    let has = |words: &[&str]| {
        normalized_message
            .split_whitespace()
            .any(|t| words.contains(&t))
    };
    if has(&["devolucion", "devolver", "cambio", "cambiar", "return", "refund"]) {
        HandoffKind::ReturnOrExchange
    } else if has(&["humano", "persona", "agente", "human", "agent", "operador"]) {
        HandoffKind::HumanRequested
    } else {
        HandoffKind::Complaint
    }
}

/// Empty content or keyboard mash. Grapheme-aware so an emoji-only
/// message counts as content-free rather than slicing a code point.
fn is_gibberish(raw: &str, normalized: &str) -> bool {
    if normalized.is_empty() {
        return raw.graphemes(true).count() == 0 || !raw.chars().any(|c| c.is_alphanumeric());
    }
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if let [only] = tokens.as_slice() {
        return only.len() >= 6
            && !only.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
            && !only.chars().any(|c| c.is_ascii_digit());
    }
    false
}
