//! Catalog entity types
//!
//! A `CatalogEntity` is the unit the engine can ground a conversation on:
//! either a simple product, a variable parent, or one concrete variant of
//! a parent. Entities are sourced fresh from the catalog collaborator per
//! query and treated as immutable within one resolution pass.

use serde::{Deserialize, Serialize};

/// Kind of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum EntityKind {
    /// A plain product with no variations
    #[default]
    Simple,
    /// A product whose concrete forms are its variants
    VariableParent,
    /// One attribute-value combination of a variable parent
    Variant,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Simple => write!(f, "simple"),
            EntityKind::VariableParent => write!(f, "variable"),
            EntityKind::Variant => write!(f, "variant"),
        }
    }
}

/// Stock availability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum StockState {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

impl std::fmt::Display for StockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockState::InStock => write!(f, "in stock"),
            StockState::OutOfStock => write!(f, "out of stock"),
            StockState::Unknown => write!(f, "availability unknown"),
        }
    }
}

/// Declared attribute on a variable parent: name plus the values the
/// catalog allows for it (e.g. `color: [rojo, azul]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

/// Concrete attribute value on a variant (e.g. `color = rojo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub value: String,
}

/// A product or product-variant from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntity {
    /// Opaque catalog key
    pub id: String,
    /// Unique short code (SKU), when the catalog has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Customer-facing name
    pub display_name: String,
    /// Simple, variable parent, or variant
    #[serde(default)]
    pub kind: EntityKind,
    /// Parent id, set iff `kind == Variant`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Declared attributes (parents)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSpec>,
    /// Concrete attribute values (variants)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_values: Vec<AttributeValue>,
    /// Price in minor currency units
    #[serde(default)]
    pub price_minor: i64,
    /// Units on hand, when the catalog tracks quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    /// Availability state
    #[serde(default)]
    pub stock_state: StockState,
}

impl CatalogEntity {
    /// Create a simple product
    pub fn simple(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: None,
            display_name: name.into(),
            kind: EntityKind::Simple,
            parent_id: None,
            attributes: Vec::new(),
            attribute_values: Vec::new(),
            price_minor: 0,
            stock_quantity: None,
            stock_state: StockState::Unknown,
        }
    }

    /// Set the SKU code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the entity kind
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set price in minor units
    pub fn with_price(mut self, price_minor: i64) -> Self {
        self.price_minor = price_minor;
        self
    }

    /// Set stock quantity and derive the stock state from it
    pub fn with_stock(mut self, quantity: u32) -> Self {
        self.stock_quantity = Some(quantity);
        self.stock_state = if quantity > 0 {
            StockState::InStock
        } else {
            StockState::OutOfStock
        };
        self
    }

    /// Price as a currency string (`2550` -> `"$25.50"`); the single
    /// formatting used by prompts and fallback replies alike
    pub fn price_display(&self) -> String {
        format!("${}.{:02}", self.price_minor / 100, (self.price_minor % 100).abs())
    }

    /// Whether this entity declares the attribute (parents only)
    pub fn has_attribute(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.attributes
            .iter()
            .any(|a| a.name.trim().to_lowercase() == wanted)
    }

    /// Value of a concrete attribute on a variant, if set
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.attribute_values
            .iter()
            .find(|a| a.name.trim().to_lowercase() == wanted)
            .map(|a| a.value.as_str())
    }
}

/// Result of a deterministic match pass over a catalog snapshot.
///
/// A pure function of (query, snapshot): zero equal entities is
/// `NotFound`, one is `Found`, two or more is `Ambiguous` with input
/// order preserved. Tie-breaking is the search cascade's job, never
/// the matcher's.
#[derive(Debug, Clone)]
pub enum MatchResult {
    Found(CatalogEntity),
    Ambiguous(Vec<CatalogEntity>),
    NotFound,
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchResult::NotFound)
    }
}

/// Read-only overlay from the enrichment store. `hidden` entities must
/// never be shown or grounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_state: Option<StockState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Enrichment {
    /// Apply this overlay to an entity, field by field.
    pub fn apply(&self, entity: &mut CatalogEntity) {
        if let Some(price) = self.price_minor {
            entity.price_minor = price;
        }
        if let Some(qty) = self.stock_quantity {
            entity.stock_quantity = Some(qty);
        }
        if let Some(state) = self.stock_state {
            entity.stock_state = state;
        }
        if let Some(ref name) = self.display_name {
            entity.display_name = name.clone();
        }
    }
}
