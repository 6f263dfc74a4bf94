//! Turn engine
//!
//! One resolution pass per inbound message, expressed as an explicit
//! ordered list of stages. Each stage either settles the turn with a
//! `ResponseInstruction` or passes control on. All work happens on a
//! working copy of the user's context under an exclusive lease; the
//! copy is committed only when the turn completes, so an aborted turn
//! leaves the stored context untouched. Every error is converted into
//! customer-facing language at this boundary.

use std::sync::Arc;

use shop_agent_config::{EngineConfig, FixedReplies, Lexicon};
use shop_agent_core::{
    CatalogClient, CatalogEntity, Classification, ClassifierClient, ContextStore,
    ConversationContext, EnrichmentStore, QueryIntent, ResponseInstruction, Result, StockState,
    TurnOutcome, TurnRecord,
};
use shop_agent_text::normalize_name;

use crate::cascade::{CascadeOutcome, SearchCascade};
use crate::disambiguator::{CandidateAction, Disambiguator, GroundingDecision};
use crate::gate::{handoff_kind, GateDecision, IntentGate};
use crate::variants::{VariantResolution, VariantResolver};

/// Resolution stages, run strictly in this order.
const STAGES: &[Stage] = &[
    Stage::Gate,
    Stage::Handoff,
    Stage::Context,
    Stage::Variant,
    Stage::GeneralInfo,
    Stage::Recommendation,
    Stage::Ambiguous,
    Stage::Product,
];

#[derive(Debug, Clone, Copy)]
enum Stage {
    Gate,
    Handoff,
    Context,
    Variant,
    GeneralInfo,
    Recommendation,
    Ambiguous,
    Product,
}

/// Per-turn scratch state threaded through the stages. The gate stage
/// fills `classification` before any stage that reads it can run.
struct TurnState {
    classification: Option<Classification>,
}

/// The context-aware query resolution engine
pub struct QueryEngine {
    catalog: Arc<dyn CatalogClient>,
    classifier: Arc<dyn ClassifierClient>,
    enrichment: Option<Arc<dyn EnrichmentStore>>,
    contexts: Arc<dyn ContextStore>,
    config: EngineConfig,
    lexicon: Lexicon,
}

impl QueryEngine {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        classifier: Arc<dyn ClassifierClient>,
        contexts: Arc<dyn ContextStore>,
        config: EngineConfig,
        lexicon: Lexicon,
    ) -> Self {
        Self {
            catalog,
            classifier,
            enrichment: None,
            contexts,
            config,
            lexicon,
        }
    }

    pub fn with_enrichment(mut self, store: Arc<dyn EnrichmentStore>) -> Self {
        self.enrichment = Some(store);
        self
    }

    /// Resolve one inbound message into a reply.
    ///
    /// Never fails: collaborator trouble degrades to the conservative
    /// fixed replies.
    pub async fn handle_turn(&self, user_id: &str, message: &str) -> TurnOutcome {
        let lease = match self.contexts.lease(user_id).await {
            Ok(lease) => lease,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "context lease failed");
                return TurnOutcome::reply(self.lexicon.replies.ask_for_specifics.clone());
            }
        };

        let mut working = lease.snapshot();
        let mut state = TurnState {
            classification: None,
        };

        let instruction = match self.resolve_message(&mut working, message, &mut state).await {
            Ok(instruction) => instruction,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "turn aborted, degrading");
                // aborted turns commit none of their context mutations
                working = lease.snapshot();
                ResponseInstruction::AskForSpecifics
            }
        };

        let reply_text = self.render_reply(&instruction, &working).await;
        let outcome = build_outcome(&instruction, reply_text.clone());

        let intent = recorded_intent(&instruction, state.classification.as_ref());
        working.record_turn(TurnRecord::new(message, reply_text, intent));
        lease.commit(working);

        outcome
    }

    async fn resolve_message(
        &self,
        working: &mut ConversationContext,
        message: &str,
        state: &mut TurnState,
    ) -> Result<ResponseInstruction> {
        for stage in STAGES {
            if let Some(instruction) = self.run_stage(*stage, working, message, state).await? {
                tracing::debug!(stage = ?stage, "stage settled the turn");
                return Ok(instruction);
            }
        }
        // the product stage always terminates
        Ok(ResponseInstruction::AskForSpecifics)
    }

    async fn run_stage(
        &self,
        stage: Stage,
        working: &mut ConversationContext,
        message: &str,
        state: &mut TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        match stage {
            Stage::Gate => self.gate_stage(working, message, state).await,
            Stage::Handoff => Ok(self.handoff_stage(message, state)),
            Stage::Context => self.context_stage(working, message, state).await,
            Stage::Variant => self.variant_stage(working, state).await,
            Stage::GeneralInfo => Ok(self.general_info_stage(state)),
            Stage::Recommendation => self.recommendation_stage(working, state).await,
            Stage::Ambiguous => Ok(self.ambiguous_stage(state)),
            Stage::Product => self.product_stage(working, message, state).await,
        }
    }

    async fn gate_stage(
        &self,
        working: &ConversationContext,
        message: &str,
        state: &mut TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        let gate = IntentGate::new(&self.lexicon);
        let history = working.recent_exchanges(self.config.classifier_history);
        let decision = gate
            .decide(
                message,
                &history,
                working.grounded_entity(),
                self.classifier.as_ref(),
            )
            .await;

        match decision {
            GateDecision::Fixed(instruction) => Ok(Some(instruction)),
            GateDecision::Classified(classification) => {
                state.classification = Some(classification);
                Ok(None)
            }
        }
    }

    fn handoff_stage(&self, message: &str, state: &TurnState) -> Option<ResponseInstruction> {
        let classification = state.classification.as_ref()?;
        if classification.intent != QueryIntent::Unserviceable {
            return None;
        }
        let kind = handoff_kind(&normalize_name(message));
        Some(ResponseInstruction::Handoff { kind })
    }

    /// Apply the disambiguator: keep or discard the grounded entity,
    /// and resolve a pending candidate list when this message can.
    async fn context_stage(
        &self,
        working: &mut ConversationContext,
        message: &str,
        state: &TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        let disambiguator = Disambiguator::new(&self.lexicon);
        let Some(classification) = state.classification.as_ref() else {
            return Ok(None);
        };

        if let Some(grounded) = working.grounded_entity() {
            if disambiguator.grounding_decision(grounded, message, classification)
                == GroundingDecision::Discard
            {
                working.discard_grounding();
            }
            return Ok(None);
        }

        let Some(candidates) = working.last_shown_candidates() else {
            return Ok(None);
        };

        match disambiguator.candidate_action(candidates, message, classification) {
            CandidateAction::Promote(entity) => {
                let Some(entity) = self.grounded_facts(entity).await? else {
                    return Ok(Some(ResponseInstruction::NotFound {
                        term: normalize_name(message),
                    }));
                };
                working.ground(entity.clone());
                if classification.is_attribute_question() {
                    // the variant stage answers on the promoted entity
                    return Ok(None);
                }
                Ok(Some(ResponseInstruction::ShowEntity { entity }))
            }
            CandidateAction::AskAgain => Ok(Some(ResponseInstruction::AskDisambiguation {
                candidates: candidates.to_vec(),
            })),
            CandidateAction::FreshQuery => Ok(None),
        }
    }

    async fn variant_stage(
        &self,
        working: &mut ConversationContext,
        state: &TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        let Some(classification) = state.classification.as_ref() else {
            return Ok(None);
        };
        let Some(attribute) = classification.attribute.clone() else {
            return Ok(None);
        };
        if working.grounded_entity().is_none() {
            return Ok(None);
        }

        let resolver = VariantResolver::new(self.catalog.as_ref());
        let resolution = resolver
            .resolve(
                working,
                &attribute,
                classification.attribute_value.as_deref(),
            )
            .await?;

        let Some(entity) = working.grounded_entity().cloned() else {
            return Ok(None);
        };

        let instruction = match resolution {
            VariantResolution::NoEntity => return Ok(None),
            VariantResolution::AttributeUnknown { attribute } => {
                ResponseInstruction::AttributeUnknown { entity, attribute }
            }
            VariantResolution::AttributeListed { attribute, values } => {
                ResponseInstruction::ListAttributeValues {
                    entity,
                    attribute,
                    values,
                }
            }
            VariantResolution::ValueValidated { variant } => {
                let Some(variant) = self.grounded_facts(variant).await? else {
                    return Ok(Some(ResponseInstruction::NotFound {
                        term: attribute,
                    }));
                };
                working.ground(variant.clone());
                ResponseInstruction::ShowEntity { entity: variant }
            }
            VariantResolution::ValueRejected {
                attribute,
                requested_value,
                available_values,
            } => ResponseInstruction::AttributeValueRejected {
                entity,
                attribute,
                requested_value,
                available_values,
            },
        };
        Ok(Some(instruction))
    }

    fn general_info_stage(&self, state: &TurnState) -> Option<ResponseInstruction> {
        let classification = state.classification.as_ref()?;
        (classification.intent == QueryIntent::GeneralInfo).then_some(ResponseInstruction::Help)
    }

    async fn recommendation_stage(
        &self,
        working: &mut ConversationContext,
        state: &TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        let is_recommendation = state
            .classification
            .as_ref()
            .is_some_and(|c| c.intent == QueryIntent::Recommendation);
        if !is_recommendation {
            return Ok(None);
        }

        let tagged = self
            .catalog
            .get_by_tag(&self.lexicon.recommendation_tags, self.config.candidate_cap)
            .await?;
        let candidates = self.visible_candidates(tagged).await?;
        if candidates.is_empty() {
            return Ok(Some(ResponseInstruction::AskForSpecifics));
        }

        working.show_candidates(candidates.clone(), "recomendados");
        Ok(Some(ResponseInstruction::ListCandidates {
            term: "recomendados".to_string(),
            candidates,
        }))
    }

    fn ambiguous_stage(&self, state: &TurnState) -> Option<ResponseInstruction> {
        let classification = state.classification.as_ref()?;
        (classification.intent == QueryIntent::Ambiguous)
            .then_some(ResponseInstruction::AskForSpecifics)
    }

    async fn product_stage(
        &self,
        working: &mut ConversationContext,
        message: &str,
        state: &TurnState,
    ) -> Result<Option<ResponseInstruction>> {
        let Some(classification) = state.classification.as_ref() else {
            return Ok(Some(ResponseInstruction::AskForSpecifics));
        };

        // a classifier-extracted code may not be literally in the message
        if let Some(code) = &classification.code {
            if let Some(entity) = self.catalog.get_by_code(code).await? {
                return Ok(Some(self.ground_and_show(working, entity).await?));
            }
        }

        let cascade = SearchCascade::new(self.catalog.as_ref(), &self.lexicon, &self.config);
        let outcome = cascade
            .resolve(message, classification.extracted_term.as_deref())
            .await?;

        let instruction = match outcome {
            CascadeOutcome::Grounded(entity) => self.ground_and_show(working, entity).await?,
            CascadeOutcome::ExactAmbiguous(candidates) => {
                self.present_candidates(working, normalize_name(message), candidates, true)
                    .await?
            }
            CascadeOutcome::Candidates { term, candidates } => {
                self.present_candidates(working, term, candidates, false)
                    .await?
            }
            // no new term and no code: a retained grounded entity is
            // what the message is about
            CascadeOutcome::Rejected => match working.grounded_entity().cloned() {
                Some(grounded) => {
                    let entity = match self.catalog.get_by_id(&grounded.id).await? {
                        Some(full) => full,
                        None => grounded,
                    };
                    self.ground_and_show(working, entity).await?
                }
                None => ResponseInstruction::AskForSpecifics,
            },
            CascadeOutcome::NotFound { term } => ResponseInstruction::NotFound { term },
        };
        Ok(Some(instruction))
    }

    async fn ground_and_show(
        &self,
        working: &mut ConversationContext,
        entity: CatalogEntity,
    ) -> Result<ResponseInstruction> {
        let term = normalize_name(&entity.display_name);
        let Some(entity) = self.grounded_facts(entity).await? else {
            return Ok(ResponseInstruction::NotFound { term });
        };
        working.ground(entity.clone());
        Ok(ResponseInstruction::ShowEntity { entity })
    }

    async fn present_candidates(
        &self,
        working: &mut ConversationContext,
        term: String,
        candidates: Vec<CatalogEntity>,
        exact: bool,
    ) -> Result<ResponseInstruction> {
        let candidates = self.visible_candidates(candidates).await?;
        match candidates.len() {
            0 => Ok(ResponseInstruction::NotFound { term }),
            1 => match candidates.into_iter().next() {
                Some(entity) => self.ground_and_show(working, entity).await,
                None => Ok(ResponseInstruction::NotFound { term }),
            },
            _ => {
                working.show_candidates(candidates.clone(), term.clone());
                if exact {
                    Ok(ResponseInstruction::AskDisambiguation { candidates })
                } else {
                    Ok(ResponseInstruction::ListCandidates { term, candidates })
                }
            }
        }
    }

    /// Enriched facts for an entity about to be grounded or shown;
    /// `None` when the enrichment store hides it.
    async fn grounded_facts(&self, mut entity: CatalogEntity) -> Result<Option<CatalogEntity>> {
        let Some(store) = &self.enrichment else {
            return Ok(Some(entity));
        };
        if let Some(overlay) = store.enrich(&entity).await? {
            if overlay.hidden {
                tracing::debug!(entity_id = %entity.id, "entity hidden by enrichment");
                return Ok(None);
            }
            overlay.apply(&mut entity);
        }
        Ok(Some(entity))
    }

    /// Drop hidden entities from a candidate list, applying overlays.
    async fn visible_candidates(
        &self,
        candidates: Vec<CatalogEntity>,
    ) -> Result<Vec<CatalogEntity>> {
        let mut visible = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(candidate) = self.grounded_facts(candidate).await? {
                visible.push(candidate);
            }
        }
        Ok(visible)
    }

    /// Render the instruction into prose, falling back to deterministic
    /// templates. Fixed replies never reach the renderer.
    async fn render_reply(
        &self,
        instruction: &ResponseInstruction,
        working: &ConversationContext,
    ) -> String {
        if matches!(
            instruction,
            ResponseInstruction::Help
                | ResponseInstruction::DidNotUnderstand
                | ResponseInstruction::AskForSpecifics
                | ResponseInstruction::Handoff { .. }
        ) {
            return fallback_text(instruction, &self.lexicon.replies);
        }

        let history = working.recent_exchanges(self.config.classifier_history);
        match self.classifier.render(instruction, &history).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_text(instruction, &self.lexicon.replies),
            Err(e) => {
                tracing::warn!(error = %e, "renderer failed, using fallback text");
                fallback_text(instruction, &self.lexicon.replies)
            }
        }
    }
}

/// Deterministic reply text for every instruction, used when the
/// renderer is down or returns nothing.
fn fallback_text(instruction: &ResponseInstruction, replies: &FixedReplies) -> String {
    match instruction {
        ResponseInstruction::ShowEntity { entity } => {
            let code = entity
                .code
                .as_deref()
                .map(|c| format!(" (codigo {c})"))
                .unwrap_or_default();
            format!(
                "{}{code}: precio {}, {}.",
                entity.display_name,
                entity.price_display(),
                stock_text(entity)
            )
        }
        ResponseInstruction::ListCandidates { term, candidates } => format!(
            "Encontre estas opciones para \"{term}\": {}. Cual te interesa?",
            option_labels(candidates)
        ),
        ResponseInstruction::AskDisambiguation { candidates } => format!(
            "Hay varios productos que coinciden: {}. Me decis cual, por nombre o codigo?",
            option_labels(candidates)
        ),
        ResponseInstruction::ListAttributeValues {
            entity,
            attribute,
            values,
        } => {
            if values.is_empty() {
                format!(
                    "Por ahora no hay opciones de {attribute} cargadas para {}.",
                    entity.display_name
                )
            } else {
                format!(
                    "{} viene en estos {attribute}: {}.",
                    entity.display_name,
                    values.join(", ")
                )
            }
        }
        ResponseInstruction::AttributeUnknown { entity, attribute } => format!(
            "{} no tiene opciones de {attribute}.",
            entity.display_name
        ),
        ResponseInstruction::AttributeValueRejected {
            entity,
            attribute,
            requested_value,
            available_values,
        } => format!(
            "{} no viene en {attribute} {requested_value}. Opciones: {}.",
            entity.display_name,
            available_values.join(", ")
        ),
        ResponseInstruction::NotFound { .. } => replies.not_found.clone(),
        ResponseInstruction::Help => replies.help.clone(),
        ResponseInstruction::DidNotUnderstand => replies.did_not_understand.clone(),
        ResponseInstruction::AskForSpecifics => replies.ask_for_specifics.clone(),
        ResponseInstruction::Handoff { .. } => replies.handoff.clone(),
    }
}

fn option_labels(candidates: &[CatalogEntity]) -> String {
    candidates
        .iter()
        .map(|c| match &c.code {
            Some(code) => format!("{} ({code})", c.display_name),
            None => c.display_name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn stock_text(entity: &CatalogEntity) -> String {
    match (entity.stock_quantity, entity.stock_state) {
        (Some(0), _) => "sin stock".to_string(),
        (Some(q), _) => format!("quedan {q} unidades"),
        (None, StockState::InStock) => "hay stock".to_string(),
        (None, StockState::OutOfStock) => "sin stock".to_string(),
        (None, StockState::Unknown) => "stock a confirmar".to_string(),
    }
}

fn build_outcome(instruction: &ResponseInstruction, reply_text: String) -> TurnOutcome {
    match instruction {
        ResponseInstruction::ShowEntity { entity } => {
            TurnOutcome::reply(reply_text).with_grounded(entity.clone())
        }
        ResponseInstruction::ListCandidates { candidates, .. }
        | ResponseInstruction::AskDisambiguation { candidates } => {
            TurnOutcome::reply(reply_text).with_candidates(candidates.clone())
        }
        _ => TurnOutcome::reply(reply_text),
    }
}

/// Intent recorded in the turn history
fn recorded_intent(
    instruction: &ResponseInstruction,
    classification: Option<&Classification>,
) -> QueryIntent {
    match instruction {
        ResponseInstruction::NotFound { .. } => QueryIntent::NoMatchFallback,
        ResponseInstruction::Help => QueryIntent::GeneralInfo,
        ResponseInstruction::DidNotUnderstand | ResponseInstruction::AskForSpecifics => {
            QueryIntent::Ambiguous
        }
        ResponseInstruction::Handoff { .. } => QueryIntent::Unserviceable,
        _ => classification.map(|c| c.intent).unwrap_or_default(),
    }
}
