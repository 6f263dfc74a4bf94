//! In-memory collaborator fixtures for engine tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use shop_agent_core::{
    CatalogClient, CatalogEntity, Classification, ClassifierClient, Error, QueryIntent,
    ResponseInstruction, Result,
};
use shop_agent_text::{contains_whole_word, normalize_code};

/// Vec-backed catalog with call counters
pub struct FixtureCatalog {
    entities: Vec<CatalogEntity>,
    variants: HashMap<String, Vec<CatalogEntity>>,
    tagged: Vec<CatalogEntity>,
    search_calls: AtomicUsize,
    list_calls: AtomicUsize,
    variant_calls: AtomicUsize,
    fail_all: bool,
}

impl FixtureCatalog {
    pub fn new(entities: Vec<CatalogEntity>) -> Self {
        Self {
            entities,
            variants: HashMap::new(),
            tagged: Vec::new(),
            search_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            variant_calls: AtomicUsize::new(0),
            fail_all: false,
        }
    }

    pub fn with_variants(mut self, parent_id: &str, variants: Vec<CatalogEntity>) -> Self {
        self.variants.insert(parent_id.to_string(), variants);
        self
    }

    pub fn with_tagged(mut self, tagged: Vec<CatalogEntity>) -> Self {
        self.tagged = tagged;
        self
    }

    /// Every call fails as an unavailable collaborator
    pub fn failing() -> Self {
        let mut fixture = Self::new(Vec::new());
        fixture.fail_all = true;
        fixture
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn variant_calls(&self) -> usize {
        self.variant_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.list_calls() + self.variant_calls()
    }

    fn check_up(&self) -> Result<()> {
        if self.fail_all {
            Err(Error::unavailable("catalog", "fixture down"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogClient for FixtureCatalog {
    async fn search_by_term(&self, term: &str, limit: usize) -> Result<Vec<CatalogEntity>> {
        self.check_up()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entities
            .iter()
            .filter(|e| {
                term.split_whitespace()
                    .all(|word| contains_whole_word(&e.display_name, word))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CatalogEntity>> {
        self.check_up()?;
        Ok(self.entities.iter().find(|e| e.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<CatalogEntity>> {
        self.check_up()?;
        let wanted = normalize_code(code);
        Ok(self
            .entities
            .iter()
            .find(|e| e.code.as_deref().is_some_and(|c| normalize_code(c) == wanted))
            .cloned())
    }

    async fn get_variants(&self, parent_id: &str) -> Result<Vec<CatalogEntity>> {
        self.check_up()?;
        self.variant_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.variants.get(parent_id).cloned().unwrap_or_default())
    }

    async fn list_all(&self, _include_stock_price: bool) -> Result<Vec<CatalogEntity>> {
        self.check_up()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entities.clone())
    }

    async fn get_by_tag(&self, _tag_ids: &[String], limit: usize) -> Result<Vec<CatalogEntity>> {
        self.check_up()?;
        Ok(self.tagged.iter().take(limit).cloned().collect())
    }
}

/// Scripted classifier: pops one classification per call; renders
/// instructions as a tagged echo unless told to fail.
pub struct ScriptedClassifier {
    script: Mutex<Vec<Classification>>,
    classify_calls: AtomicUsize,
    render_calls: AtomicUsize,
    fail_classify: bool,
    fail_render: bool,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Classification>) -> Self {
        Self {
            script: Mutex::new(script),
            classify_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
            fail_classify: false,
            fail_render: false,
        }
    }

    pub fn failing_classify() -> Self {
        let mut c = Self::new(Vec::new());
        c.fail_classify = true;
        c
    }

    pub fn with_failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierClient for ScriptedClassifier {
    async fn classify(
        &self,
        _message: &str,
        _recent_history: &[(String, String)],
        _grounded_entity: Option<&CatalogEntity>,
    ) -> Result<Classification> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_classify {
            return Err(Error::unavailable("classifier", "fixture down"));
        }
        let mut script = self.script.lock();
        if script.is_empty() {
            return Ok(Classification::new(QueryIntent::Ambiguous));
        }
        Ok(script.remove(0))
    }

    async fn render(
        &self,
        instruction: &ResponseInstruction,
        _recent_history: &[(String, String)],
    ) -> Result<String> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_render {
            return Err(Error::unavailable("classifier", "renderer down"));
        }
        let tag = match instruction {
            ResponseInstruction::ShowEntity { entity } => {
                format!("show:{}", entity.display_name)
            }
            ResponseInstruction::ListCandidates { candidates, .. } => {
                format!("list:{}", candidates.len())
            }
            ResponseInstruction::AskDisambiguation { candidates } => {
                format!("which:{}", candidates.len())
            }
            ResponseInstruction::ListAttributeValues { values, .. } => {
                format!("values:{}", values.join(","))
            }
            ResponseInstruction::AttributeUnknown { attribute, .. } => {
                format!("unknown:{attribute}")
            }
            ResponseInstruction::AttributeValueRejected { requested_value, .. } => {
                format!("rejected:{requested_value}")
            }
            ResponseInstruction::NotFound { term } => format!("notfound:{term}"),
            ResponseInstruction::Help => "help".to_string(),
            ResponseInstruction::DidNotUnderstand => "didnotunderstand".to_string(),
            ResponseInstruction::AskForSpecifics => "specifics".to_string(),
            ResponseInstruction::Handoff { .. } => "handoff".to_string(),
        };
        Ok(tag)
    }
}
