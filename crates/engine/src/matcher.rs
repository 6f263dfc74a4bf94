//! Deterministic exact matcher
//!
//! A pure equality engine over a catalog snapshot. No substring or
//! ranking logic lives here; ties go back to the caller as `Ambiguous`
//! in input order and the search cascade breaks them.

use shop_agent_core::{CatalogEntity, MatchResult};
use shop_agent_text::{normalize_code, normalize_name};

/// Match a free-text query against a catalog snapshot.
///
/// An entity matches iff the query equals its code under
/// `normalize_code` (so `k-78` and `K78` are the same code) or its
/// display name under `normalize_name`.
pub fn match_entities(query: &str, catalog: &[CatalogEntity]) -> MatchResult {
    let wanted_name = normalize_name(query);
    let wanted_code = normalize_code(query);
    if wanted_name.is_empty() {
        return MatchResult::NotFound;
    }

    let mut matches: Vec<CatalogEntity> = catalog
        .iter()
        .filter(|entity| {
            entity
                .code
                .as_deref()
                .is_some_and(|code| normalize_code(code) == wanted_code)
                || normalize_name(&entity.display_name) == wanted_name
        })
        .cloned()
        .collect();

    match matches.len() {
        0 => MatchResult::NotFound,
        1 => MatchResult::Found(matches.remove(0)),
        _ => MatchResult::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogEntity> {
        vec![
            CatalogEntity::simple("1", "Blue Mug").with_code("K78"),
            CatalogEntity::simple("2", "Blue Mug").with_code("B85"),
            CatalogEntity::simple("3", "Lámpara LED"),
        ]
    }

    #[test]
    fn test_unique_code_match() {
        // every separator spelling of the code is the same code
        for query in ["K78", "k-78", "k 78", "K.78"] {
            match match_entities(query, &catalog()) {
                MatchResult::Found(entity) => assert_eq!(entity.id, "1", "query: {query:?}"),
                other => panic!("query {query:?}: expected Found, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_duplicate_names_are_ambiguous_in_order() {
        match match_entities("blue mug", &catalog()) {
            MatchResult::Ambiguous(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].id, "1");
                assert_eq!(candidates[1].id, "2");
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_name_match_ignores_accents() {
        assert!(match_entities("lampara led", &catalog()).is_found());
    }

    #[test]
    fn test_no_substring_matching() {
        assert!(match_entities("mug", &catalog()).is_not_found());
        assert!(match_entities("", &catalog()).is_not_found());
    }

    #[test]
    fn test_match_is_pure() {
        let snapshot = catalog();
        for _ in 0..3 {
            match match_entities("Blue Mug", &snapshot) {
                MatchResult::Ambiguous(c) => assert_eq!(c.len(), 2),
                other => panic!("expected Ambiguous, got {other:?}"),
            }
        }
    }
}
