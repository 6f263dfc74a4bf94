//! Candidate search cascade
//!
//! Turns a loose term into a grounded entity or a ranked candidate
//! list. Stages short-circuit on the first usable result:
//!
//! 1. explicit code token, exact code lookup
//! 2. term extraction (stop words, greeting prefixes, generic rejection)
//! 3. exact match over the catalog snapshot
//! 4. bounded external search
//! 5. full-snapshot relevance scan
//! 6. final free-text fallback search
//!
//! Generic terms never trigger a catalog fetch.

use shop_agent_config::{EngineConfig, Lexicon};
use shop_agent_core::{CatalogClient, CatalogEntity, MatchResult, Result};
use shop_agent_text::{
    contains_whole_word, extract_primary_code, normalize_code, normalize_name, singularize,
    word_variants,
};

use crate::matcher::match_entities;

/// Result of one cascade pass
#[derive(Debug)]
pub enum CascadeOutcome {
    /// A single confident hit
    Grounded(CatalogEntity),
    /// Two or more exact-name matches; the user must pick
    ExactAmbiguous(Vec<CatalogEntity>),
    /// Ranked candidates for the term
    Candidates {
        term: String,
        candidates: Vec<CatalogEntity>,
    },
    /// Nothing non-generic to search for; no fetch was performed
    Rejected,
    /// Every stage came up empty
    NotFound { term: String },
}

/// The cascade over one catalog collaborator
pub struct SearchCascade<'a> {
    catalog: &'a dyn CatalogClient,
    lexicon: &'a Lexicon,
    config: &'a EngineConfig,
}

impl<'a> SearchCascade<'a> {
    pub fn new(
        catalog: &'a dyn CatalogClient,
        lexicon: &'a Lexicon,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            catalog,
            lexicon,
            config,
        }
    }

    /// Run the full cascade for one message.
    ///
    /// `extracted_term` is the classifier's term when one exists; the
    /// raw message is always consulted for code-shaped tokens first.
    pub async fn resolve(
        &self,
        message: &str,
        extracted_term: Option<&str>,
    ) -> Result<CascadeOutcome> {
        if let Some(code) = extract_primary_code(message) {
            if let Some(entity) = self.catalog.get_by_code(&code).await? {
                tracing::debug!(code, entity_id = %entity.id, "grounded by explicit code");
                return Ok(CascadeOutcome::Grounded(entity));
            }
            tracing::debug!(code, "code-shaped token has no catalog entry, falling through");
        }

        let source = extracted_term.unwrap_or(message);
        let Some(term) = self.extract_term(source) else {
            return Ok(CascadeOutcome::Rejected);
        };

        let snapshot = self.catalog.list_all(false).await?;
        match match_entities(&term, &snapshot) {
            MatchResult::Found(entity) => {
                let entity = self.hydrate(entity).await?;
                return Ok(CascadeOutcome::Grounded(entity));
            }
            MatchResult::Ambiguous(candidates) => {
                return Ok(CascadeOutcome::ExactAmbiguous(candidates));
            }
            MatchResult::NotFound => {}
        }

        let page = self.config.search_page_size;
        let hits = self.catalog.search_by_term(&term, page).await?;
        // a full page means the term was too broad to trust the order
        if !hits.is_empty() && hits.len() < page {
            return Ok(self.outcome_from_hits(term, hits).await?);
        }

        let words: Vec<String> = term.split_whitespace().map(str::to_string).collect();
        let ranked = rank_snapshot(&words, &snapshot, self.config.candidate_cap);
        if !ranked.is_empty() {
            return Ok(self.outcome_from_hits(term, ranked).await?);
        }

        let original = normalize_name(source);
        if original != term {
            let fallback = self.catalog.search_by_term(&original, page).await?;
            if !fallback.is_empty() {
                return Ok(self.outcome_from_hits(term, fallback).await?);
            }
        }

        Ok(CascadeOutcome::NotFound { term })
    }

    /// Extract a searchable term from a message.
    ///
    /// Strips greeting prefixes and stop words, singularizes the rest,
    /// and drops generic nouns. Returns `None` unless at least one
    /// non-generic token of minimum length survives.
    pub fn extract_term(&self, message: &str) -> Option<String> {
        let mut normalized = normalize_name(message);
        loop {
            let mut stripped = false;
            for prefix in &self.lexicon.greeting_prefixes {
                if let Some(rest) = normalized.strip_prefix(prefix.as_str()) {
                    if rest.is_empty() || rest.starts_with(' ') {
                        normalized = rest.trim_start().to_string();
                        stripped = true;
                    }
                }
            }
            if !stripped {
                break;
            }
        }

        let tokens: Vec<String> = normalized
            .split_whitespace()
            .filter(|t| !self.lexicon.is_stop_word(t))
            .map(singularize)
            .filter(|t| !self.lexicon.is_generic_term(t))
            .collect();

        let qualifies = tokens
            .iter()
            .any(|t| t.len() >= self.config.min_token_len);
        if !qualifies {
            return None;
        }
        Some(tokens.join(" "))
    }

    async fn outcome_from_hits(
        &self,
        term: String,
        mut hits: Vec<CatalogEntity>,
    ) -> Result<CascadeOutcome> {
        hits.truncate(self.config.candidate_cap);
        if hits.len() == 1 {
            let entity = self.hydrate(hits.remove(0)).await?;
            tracing::debug!(term, entity_id = %entity.id, "single hit auto-grounds");
            return Ok(CascadeOutcome::Grounded(entity));
        }
        tracing::debug!(term, count = hits.len(), "cascade produced candidates");
        Ok(CascadeOutcome::Candidates {
            term,
            candidates: hits,
        })
    }

    /// Re-fetch an entity by id for full stock/price facts. Snapshot
    /// entries are fetched without them.
    async fn hydrate(&self, entity: CatalogEntity) -> Result<CatalogEntity> {
        match self.catalog.get_by_id(&entity.id).await? {
            Some(full) => Ok(full),
            None => Ok(entity),
        }
    }
}

/// Relevance scan over a catalog snapshot.
///
/// Counts how many query words (original, singular, or plural form)
/// hit each entity: whole-word in the name or substring of the code.
/// An entity qualifies with at least `min(2, word_count)` matched
/// words; qualifiers rank by (words matched desc, strength desc).
pub fn rank_snapshot(
    query_words: &[String],
    snapshot: &[CatalogEntity],
    cap: usize,
) -> Vec<CatalogEntity> {
    let required = query_words.len().min(2);
    if required == 0 {
        return Vec::new();
    }

    let variants: Vec<Vec<String>> = query_words.iter().map(|w| word_variants(w)).collect();

    let mut scored: Vec<(usize, u32, usize, &CatalogEntity)> = Vec::new();
    for (position, entity) in snapshot.iter().enumerate() {
        let name = normalize_name(&entity.display_name);
        let code = entity.code.as_deref().map(normalize_code);

        let mut matched = 0usize;
        let mut strength = 0u32;
        for word_forms in &variants {
            if let Some(s) = term_strength(word_forms, &name, code.as_deref()) {
                matched += 1;
                strength += s;
            }
        }

        if matched >= required {
            scored.push((matched, strength, position, entity));
        }
    }

    // stable on snapshot position for equal scores
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
    scored
        .into_iter()
        .take(cap)
        .map(|(_, _, _, e)| e.clone())
        .collect()
}

/// Best match strength of one query word against an entity:
/// code-substring 3, whole word in name 2, name prefix 1.
fn term_strength(word_forms: &[String], name: &str, code: Option<&str>) -> Option<u32> {
    let mut best = None;
    for form in word_forms {
        let mut s = 0;
        if let Some(code) = code {
            if code.contains(normalize_code(form).as_str()) && !form.is_empty() {
                s = 3;
            }
        }
        if s < 2 && contains_whole_word(name, form) {
            s = 2;
        }
        if s == 0 && name.starts_with(form.as_str()) {
            s = 1;
        }
        if s > 0 && best.map_or(true, |b| s > b) {
            best = Some(s);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cascade_config() -> (Lexicon, EngineConfig) {
        (Lexicon::default(), EngineConfig::default())
    }

    #[test]
    fn test_minimum_terms_rule_red_mug() {
        let snapshot = vec![
            CatalogEntity::simple("1", "Redwood Table"),
            CatalogEntity::simple("2", "Red Mug"),
        ];
        let ranked = rank_snapshot(&words(&["red", "mug"]), &snapshot, 10);
        // "red" is not a whole word of "Redwood Table" and "mug" is
        // absent, so only the real Red Mug qualifies
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "2");
    }

    #[test]
    fn test_plural_query_matches_singular_name() {
        let snapshot = vec![
            CatalogEntity::simple("1", "Taza Azul"),
            CatalogEntity::simple("2", "Plato Hondo"),
        ];
        let ranked = rank_snapshot(&words(&["tazas"]), &snapshot, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "1");
    }

    #[test]
    fn test_code_substring_outranks_name_word() {
        let snapshot = vec![
            CatalogEntity::simple("1", "Silla N35 Clasica"),
            CatalogEntity::simple("2", "Mesa Bar").with_code("N351"),
        ];
        let ranked = rank_snapshot(&words(&["n35"]), &snapshot, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "2");
    }

    #[test]
    fn test_rank_cap() {
        let snapshot: Vec<CatalogEntity> = (0..15)
            .map(|i| CatalogEntity::simple(i.to_string(), "Taza Clasica"))
            .collect();
        let ranked = rank_snapshot(&words(&["taza"]), &snapshot, 10);
        assert_eq!(ranked.len(), 10);
        // stable order on equal scores
        assert_eq!(ranked[0].id, "0");
    }

    #[test]
    fn test_extract_term_strips_noise() {
        let (lexicon, config) = cascade_config();
        let catalog = NullCatalog;
        let cascade = SearchCascade::new(&catalog, &lexicon, &config);

        assert_eq!(
            cascade.extract_term("Hola! quiero una taza azul por favor"),
            Some("taza azul".to_string())
        );
        assert_eq!(
            cascade.extract_term("buenas tardes, tienen remeras?"),
            Some("remera".to_string())
        );
    }

    #[test]
    fn test_generic_only_messages_are_rejected() {
        let (lexicon, config) = cascade_config();
        let catalog = NullCatalog;
        let cascade = SearchCascade::new(&catalog, &lexicon, &config);

        assert_eq!(cascade.extract_term("quiero un producto"), None);
        assert_eq!(cascade.extract_term("hola buenas"), None);
        assert_eq!(cascade.extract_term(""), None);
    }

    /// Catalog stub for the pure extraction tests; never called.
    struct NullCatalog;

    #[async_trait::async_trait]
    impl CatalogClient for NullCatalog {
        async fn search_by_term(&self, _: &str, _: usize) -> Result<Vec<CatalogEntity>> {
            unreachable!("extraction tests never reach the catalog")
        }
        async fn get_by_id(&self, _: &str) -> Result<Option<CatalogEntity>> {
            unreachable!()
        }
        async fn get_by_code(&self, _: &str) -> Result<Option<CatalogEntity>> {
            unreachable!()
        }
        async fn get_variants(&self, _: &str) -> Result<Vec<CatalogEntity>> {
            unreachable!()
        }
        async fn list_all(&self, _: bool) -> Result<Vec<CatalogEntity>> {
            unreachable!()
        }
        async fn get_by_tag(&self, _: &[String], _: usize) -> Result<Vec<CatalogEntity>> {
            unreachable!()
        }
    }
}
