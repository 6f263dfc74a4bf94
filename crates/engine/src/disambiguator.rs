//! Context disambiguator
//!
//! Decides per turn whether the grounded entity is still what the user
//! is talking about, and whether a previously shown candidate list can
//! be resolved by this message. Ambiguity is resolved by asking, never
//! by guessing.

use shop_agent_config::Lexicon;
use shop_agent_core::{CatalogEntity, Classification};
use shop_agent_text::{
    contains_whole_word, extract_codes, looks_like_code, normalize_code, normalize_name,
    singularize,
};

/// Whether the grounded entity survives this message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingDecision {
    Retain,
    Discard,
}

/// What to do with a pending candidate list
#[derive(Debug)]
pub enum CandidateAction {
    /// The message resolves the list to one entity
    Promote(CatalogEntity),
    /// The follow-up depends on the list but does not resolve it
    AskAgain,
    /// The message is a fresh query; leave the list to be replaced
    FreshQuery,
}

pub struct Disambiguator<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> Disambiguator<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Ordered retention rules for a grounded entity.
    ///
    /// 1. an explicit code or id differing from the grounded entity's
    ///    discards;
    /// 2. a non-generic extracted term absent from the grounded
    ///    name+code (synonyms included) discards;
    /// 3. a bare attribute question retains;
    /// 4. default retain.
    pub fn grounding_decision(
        &self,
        grounded: &CatalogEntity,
        message: &str,
        classification: &Classification,
    ) -> GroundingDecision {
        let grounded_code = grounded.code.as_deref().map(normalize_code);

        let mut mentioned = extract_codes(message);
        if let Some(code) = &classification.code {
            let code = normalize_code(code);
            if !mentioned.contains(&code) {
                mentioned.push(code);
            }
        }
        for code in &mentioned {
            let same_code = grounded_code.as_deref() == Some(code.as_str());
            let same_id = normalize_code(&grounded.id) == *code;
            if !same_code && !same_id {
                tracing::debug!(code, "explicit different code discards grounding");
                return GroundingDecision::Discard;
            }
        }
        if let Some(id) = &classification.id {
            if normalize_code(id) != normalize_code(&grounded.id) {
                return GroundingDecision::Discard;
            }
        }

        if let Some(term) = &classification.extracted_term {
            if self.is_foreign_term(grounded, term) {
                tracing::debug!(term, "term does not refer to grounded entity, discarding");
                return GroundingDecision::Discard;
            }
        }

        // bare attribute questions and everything else retain
        GroundingDecision::Retain
    }

    /// Whether a term clearly refers to something other than the
    /// grounded entity: at least one non-generic token, and none of
    /// them (singularized, synonyms consulted) appears in the grounded
    /// name or code.
    fn is_foreign_term(&self, grounded: &CatalogEntity, term: &str) -> bool {
        let haystack = match &grounded.code {
            Some(code) => format!("{} {}", grounded.display_name, code),
            None => grounded.display_name.clone(),
        };

        let mut saw_non_generic = false;
        for token in normalize_name(term).split_whitespace() {
            let token = singularize(token);
            if self.lexicon.is_stop_word(&token)
                || self.lexicon.is_generic_term(&token)
                || self.lexicon.is_attribute_word(&token)
            {
                continue;
            }
            saw_non_generic = true;

            if contains_whole_word(&haystack, &token) {
                return false;
            }
            if let Some(synonym) = self.lexicon.synonym_of(&token) {
                if contains_whole_word(&haystack, synonym) {
                    return false;
                }
            }
        }

        saw_non_generic
    }

    /// Resolve a message against a pending candidate list.
    pub fn candidate_action(
        &self,
        candidates: &[CatalogEntity],
        message: &str,
        classification: &Classification,
    ) -> CandidateAction {
        let normalized = normalize_name(message);

        if let Some(index) = parse_ordinal(&normalized) {
            if let Some(entity) = candidates.get(index) {
                return CandidateAction::Promote(entity.clone());
            }
            return CandidateAction::AskAgain;
        }

        // exact pick by code or full name
        let by_code: Vec<&CatalogEntity> = candidates
            .iter()
            .filter(|c| {
                c.code
                    .as_deref()
                    .is_some_and(|code| normalize_code(code) == normalize_code(message))
            })
            .collect();
        if let [only] = by_code.as_slice() {
            return CandidateAction::Promote((*only).clone());
        }
        let by_name: Vec<&CatalogEntity> = candidates
            .iter()
            .filter(|c| normalize_name(&c.display_name) == normalized)
            .collect();
        if let [only] = by_name.as_slice() {
            return CandidateAction::Promote((*only).clone());
        }

        if self.is_short_follow_up(&normalized, classification) {
            if let [only] = candidates {
                return CandidateAction::Promote(only.clone());
            }
            return CandidateAction::AskAgain;
        }

        CandidateAction::FreshQuery
    }

    /// A follow-up that depends on the pending list rather than naming
    /// a new product: an attribute question, or a short message with no
    /// code and no non-generic term.
    fn is_short_follow_up(&self, normalized: &str, classification: &Classification) -> bool {
        if classification.is_attribute_question() {
            return true;
        }
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.len() > 3 {
            return false;
        }
        tokens.iter().all(|t| {
            !looks_like_code(t)
                && (self.lexicon.is_stop_word(t)
                    || self.lexicon.is_generic_term(t)
                    || self.lexicon.is_attribute_word(t)
                    || t.len() < 3)
        })
    }
}

/// Index selection: "1", "el primero", "la segunda", ...
fn parse_ordinal(normalized: &str) -> Option<usize> {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.len() > 2 {
        return None;
    }
    let word = *tokens.last()?;
    if tokens.len() == 2 && !matches!(tokens[0], "el" | "la" | "the") {
        return None;
    }
    match word {
        "1" | "primero" | "primera" | "first" => Some(0),
        "2" | "segundo" | "segunda" | "second" => Some(1),
        "3" | "tercero" | "tercera" | "third" => Some(2),
        "4" | "cuarto" | "cuarta" | "fourth" => Some(3),
        "5" | "quinto" | "quinta" | "fifth" => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_agent_core::QueryIntent;

    fn grounded() -> CatalogEntity {
        CatalogEntity::simple("10", "Taza Azul Grande").with_code("B85")
    }

    #[test]
    fn test_different_code_always_discards() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let c = Classification::new(QueryIntent::Product);

        // regardless of any other content in the message
        for message in ["K78", "y la K78 cuanto sale?", "k-78 tiene azul?"] {
            assert_eq!(
                d.grounding_decision(&grounded(), message, &c),
                GroundingDecision::Discard,
                "message: {message:?}"
            );
        }
    }

    #[test]
    fn test_same_code_retains() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let c = Classification::new(QueryIntent::Product);
        assert_eq!(
            d.grounding_decision(&grounded(), "la b-85, tiene stock?", &c),
            GroundingDecision::Retain
        );
    }

    #[test]
    fn test_foreign_term_discards_but_own_term_retains() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);

        let about_lamp = Classification::new(QueryIntent::Product).with_term("lampara de mesa");
        assert_eq!(
            d.grounding_decision(&grounded(), "tienen lamparas de mesa?", &about_lamp),
            GroundingDecision::Discard
        );

        let about_mug = Classification::new(QueryIntent::Product).with_term("la taza grande");
        assert_eq!(
            d.grounding_decision(&grounded(), "la taza grande", &about_mug),
            GroundingDecision::Retain
        );
    }

    #[test]
    fn test_synonym_counts_as_reference() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        // "mug" is a synonym of "taza"
        let c = Classification::new(QueryIntent::Product).with_term("mug");
        assert_eq!(
            d.grounding_decision(&grounded(), "el mug", &c),
            GroundingDecision::Retain
        );
    }

    #[test]
    fn test_attribute_question_retains() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let c = Classification::new(QueryIntent::Variant).with_attribute("color");
        assert_eq!(
            d.grounding_decision(&grounded(), "que colores tiene?", &c),
            GroundingDecision::Retain
        );
    }

    #[test]
    fn test_ordinal_promotes_from_list() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let candidates = vec![
            CatalogEntity::simple("1", "Taza Azul"),
            CatalogEntity::simple("2", "Taza Roja"),
        ];
        let c = Classification::new(QueryIntent::Ambiguous);

        match d.candidate_action(&candidates, "la segunda", &c) {
            CandidateAction::Promote(e) => assert_eq!(e.id, "2"),
            other => panic!("expected promote, got {other:?}"),
        }
        match d.candidate_action(&candidates, "el quinto", &c) {
            CandidateAction::AskAgain => {}
            other => panic!("expected ask-again, got {other:?}"),
        }
    }

    #[test]
    fn test_single_candidate_short_follow_up_promotes() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let one = vec![CatalogEntity::simple("1", "Taza Azul")];
        let c = Classification::new(QueryIntent::Variant).with_attribute("color");

        match d.candidate_action(&one, "que colores tiene?", &c) {
            CandidateAction::Promote(e) => assert_eq!(e.id, "1"),
            other => panic!("expected promote, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_follow_up_asks_never_guesses() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let two = vec![
            CatalogEntity::simple("1", "Taza Azul"),
            CatalogEntity::simple("2", "Taza Roja"),
        ];
        let c = Classification::new(QueryIntent::Variant).with_attribute("color");

        match d.candidate_action(&two, "que colores tiene?", &c) {
            CandidateAction::AskAgain => {}
            other => panic!("expected ask-again, got {other:?}"),
        }
    }

    #[test]
    fn test_fresh_query_leaves_list_behind() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let two = vec![
            CatalogEntity::simple("1", "Taza Azul"),
            CatalogEntity::simple("2", "Taza Roja"),
        ];
        let c = Classification::new(QueryIntent::Product).with_term("lampara");

        match d.candidate_action(&two, "mejor busco una lampara", &c) {
            CandidateAction::FreshQuery => {}
            other => panic!("expected fresh query, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_name_pick() {
        let lexicon = Lexicon::default();
        let d = Disambiguator::new(&lexicon);
        let two = vec![
            CatalogEntity::simple("1", "Taza Azul").with_code("K78"),
            CatalogEntity::simple("2", "Taza Roja").with_code("B85"),
        ];
        let c = Classification::new(QueryIntent::Product);

        match d.candidate_action(&two, "taza roja", &c) {
            CandidateAction::Promote(e) => assert_eq!(e.id, "2"),
            other => panic!("expected promote, got {other:?}"),
        }
        match d.candidate_action(&two, "k78", &c) {
            CandidateAction::Promote(e) => assert_eq!(e.id, "1"),
            other => panic!("expected promote, got {other:?}"),
        }
    }
}
