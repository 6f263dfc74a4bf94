//! Query intents and classifier output decoding
//!
//! `QueryIntent` is a closed enum: external classifier strings are decoded
//! at the boundary and anything unrecognized downgrades to `Ambiguous`.
//! An out-of-enum value must never flow into internal branching.

use serde::{Deserialize, Serialize};

/// What the user is asking for this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// A specific product (by name, code, or description)
    Product,
    /// A variant/attribute question about a product (color, size, ...)
    Variant,
    /// Company information, hours, shipping, etc.
    GeneralInfo,
    /// Unclear request, ask the user for more specificity
    Ambiguous,
    /// "What do you recommend?" style queries
    Recommendation,
    /// Complaints, returns, human handoff: fixed replies only
    Unserviceable,
    /// Nothing matched the catalog after the full cascade
    NoMatchFallback,
}

impl QueryIntent {
    /// Decode a classifier-supplied intent string.
    ///
    /// Returns `Ambiguous` for any value outside the closed set; the
    /// collaborator is never trusted to extend the enum.
    pub fn decode(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "product" | "producto" => QueryIntent::Product,
            "variant" | "variante" | "attribute" => QueryIntent::Variant,
            "general_info" | "info" | "informacion" => QueryIntent::GeneralInfo,
            "ambiguous" => QueryIntent::Ambiguous,
            "recommendation" | "recomendacion" => QueryIntent::Recommendation,
            "unserviceable" | "complaint" | "handoff" | "return" => QueryIntent::Unserviceable,
            "no_match_fallback" => QueryIntent::NoMatchFallback,
            other => {
                tracing::debug!(raw = other, "unrecognized classifier intent, downgrading");
                QueryIntent::Ambiguous
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Product => "product",
            QueryIntent::Variant => "variant",
            QueryIntent::GeneralInfo => "general_info",
            QueryIntent::Ambiguous => "ambiguous",
            QueryIntent::Recommendation => "recommendation",
            QueryIntent::Unserviceable => "unserviceable",
            QueryIntent::NoMatchFallback => "no_match_fallback",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured output of the external classifier for one message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Decoded intent (already validated against the closed enum)
    pub intent: QueryIntent,
    /// Free-form search term extracted from the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_term: Option<String>,
    /// Explicit product code mentioned in the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Explicit catalog id mentioned in the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute name the user asked about (color, talle, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Specific attribute value requested, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_value: Option<String>,
}

impl Default for QueryIntent {
    fn default() -> Self {
        QueryIntent::Ambiguous
    }
}

impl Classification {
    pub fn new(intent: QueryIntent) -> Self {
        Self {
            intent,
            ..Default::default()
        }
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.extracted_term = Some(term.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_attribute_value(mut self, value: impl Into<String>) -> Self {
        self.attribute_value = Some(value.into());
        self
    }

    /// Whether the classifier found an attribute-shaped question
    pub fn is_attribute_question(&self) -> bool {
        self.attribute.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_intents() {
        assert_eq!(QueryIntent::decode("product"), QueryIntent::Product);
        assert_eq!(QueryIntent::decode(" Variant "), QueryIntent::Variant);
        assert_eq!(QueryIntent::decode("RECOMMENDATION"), QueryIntent::Recommendation);
    }

    #[test]
    fn test_decode_unknown_downgrades_to_ambiguous() {
        assert_eq!(QueryIntent::decode("purchase_now"), QueryIntent::Ambiguous);
        assert_eq!(QueryIntent::decode(""), QueryIntent::Ambiguous);
        assert_eq!(QueryIntent::decode("42"), QueryIntent::Ambiguous);
    }

    #[test]
    fn test_classification_builder() {
        let c = Classification::new(QueryIntent::Variant)
            .with_attribute("color")
            .with_attribute_value("rojo");
        assert!(c.is_attribute_question());
        assert_eq!(c.attribute_value.as_deref(), Some("rojo"));
    }
}
