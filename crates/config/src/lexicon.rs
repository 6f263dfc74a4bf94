//! Lexicon: the word lists and fixed replies the engine branches on
//!
//! All sets are stored normalized (lowercase, accent-free) and compared
//! against normalized input. Defaults carry the Spanish retail
//! vocabulary of the catalog plus the English spillover customers
//! actually type.

use serde::{Deserialize, Serialize};

/// Word lists and canned replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Stop words stripped before term extraction
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,
    /// Leading greeting/courtesy prefixes stripped from messages
    #[serde(default = "default_greeting_prefixes")]
    pub greeting_prefixes: Vec<String>,
    /// Generic nouns that never trigger a catalog fetch on their own
    #[serde(default = "default_generic_terms")]
    pub generic_terms: Vec<String>,
    /// Exact-match generic phrases answered with the fixed help reply
    #[serde(default = "default_generic_phrases")]
    pub generic_phrases: Vec<String>,
    /// Attribute-question lead-ins ("que colores", "what sizes")
    #[serde(default = "default_attribute_words")]
    pub attribute_words: Vec<String>,
    /// Small synonym table consulted when checking whether a term
    /// refers to the grounded entity
    #[serde(default = "default_synonyms")]
    pub synonyms: Vec<(String, String)>,
    /// Catalog tags consulted for "what do you recommend" queries
    #[serde(default = "default_recommendation_tags")]
    pub recommendation_tags: Vec<String>,
    /// Fixed replies
    #[serde(default)]
    pub replies: FixedReplies,
}

/// Canned reply texts, used directly by the gate and as renderer
/// fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedReplies {
    #[serde(default = "default_help_reply")]
    pub help: String,
    #[serde(default = "default_did_not_understand")]
    pub did_not_understand: String,
    #[serde(default = "default_ask_for_specifics")]
    pub ask_for_specifics: String,
    #[serde(default = "default_handoff")]
    pub handoff: String,
    #[serde(default = "default_not_found")]
    pub not_found: String,
}

fn default_stop_words() -> Vec<String> {
    [
        "hola", "buenas", "buenos", "dias", "tardes", "noches", "quiero", "quisiera", "busco",
        "necesito", "tenes", "tienen", "tiene", "hay", "me", "te", "le", "un", "una", "unos",
        "unas", "el", "la", "los", "las", "de", "del", "en", "por", "para", "con", "que", "cual",
        "cuanto", "cuesta", "sale", "precio", "favor", "porfa", "gracias", "y", "o", "a", "al",
        "es", "esta", "ese", "esa", "este", "the", "a", "an", "i", "want", "need", "please",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_greeting_prefixes() -> Vec<String> {
    ["hola", "buenas", "buenos dias", "buenas tardes", "buenas noches", "hello", "hi", "hey"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_generic_terms() -> Vec<String> {
    [
        "producto", "productos", "articulo", "articulos", "cosa", "cosas", "algo", "item",
        "items", "product", "products", "thing", "things", "stock", "catalogo", "modelo",
        "modelos",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_generic_phrases() -> Vec<String> {
    [
        "ayuda",
        "help",
        "que venden",
        "que tienen",
        "que productos tienen",
        "what do you sell",
        "menu",
        "catalogo",
        "info",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_attribute_words() -> Vec<String> {
    [
        "color", "colores", "talle", "talles", "tamano", "tamanos", "medida", "medidas",
        "size", "sizes", "colors",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_synonyms() -> Vec<(String, String)> {
    [
        ("celular", "telefono"),
        ("remera", "camiseta"),
        ("campera", "chaqueta"),
        ("taza", "mug"),
        ("cartera", "bolso"),
    ]
    .into_iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

fn default_recommendation_tags() -> Vec<String> {
    ["destacado", "featured"].into_iter().map(str::to_string).collect()
}

fn default_help_reply() -> String {
    "Puedo ayudarte a encontrar productos del catalogo: decime el nombre o el codigo \
     del producto que buscas y te paso precio, stock y variantes."
        .to_string()
}

fn default_did_not_understand() -> String {
    "Perdon, no llegue a entender el mensaje. Me decis el nombre o el codigo del \
     producto que estas buscando?"
        .to_string()
}

fn default_ask_for_specifics() -> String {
    "No pude resolver tu consulta en este momento. Me pasas el nombre exacto o el \
     codigo del producto asi te ayudo mejor?"
        .to_string()
}

fn default_handoff() -> String {
    "Entiendo, ese tema lo gestiona una persona del equipo. Ya derivo tu mensaje y \
     te contactan a la brevedad."
        .to_string()
}

fn default_not_found() -> String {
    "No encontre ese producto en el catalogo. Queres intentar con otro nombre o con \
     el codigo?"
        .to_string()
}

impl Default for FixedReplies {
    fn default() -> Self {
        Self {
            help: default_help_reply(),
            did_not_understand: default_did_not_understand(),
            ask_for_specifics: default_ask_for_specifics(),
            handoff: default_handoff(),
            not_found: default_not_found(),
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            stop_words: default_stop_words(),
            greeting_prefixes: default_greeting_prefixes(),
            generic_terms: default_generic_terms(),
            generic_phrases: default_generic_phrases(),
            attribute_words: default_attribute_words(),
            synonyms: default_synonyms(),
            recommendation_tags: default_recommendation_tags(),
            replies: FixedReplies::default(),
        }
    }
}

impl Lexicon {
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w == word)
    }

    pub fn is_generic_term(&self, word: &str) -> bool {
        self.generic_terms.iter().any(|w| w == word)
    }

    pub fn is_generic_phrase(&self, normalized_message: &str) -> bool {
        self.generic_phrases.iter().any(|p| p == normalized_message)
    }

    pub fn is_attribute_word(&self, word: &str) -> bool {
        self.attribute_words.iter().any(|w| w == word)
    }

    /// Synonym of a word, looked up in both directions
    pub fn synonym_of(&self, word: &str) -> Option<&str> {
        self.synonyms.iter().find_map(|(a, b)| {
            if a == word {
                Some(b.as_str())
            } else if b == word {
                Some(a.as_str())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_terms_cover_both_locales() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_generic_term("producto"));
        assert!(lexicon.is_generic_term("thing"));
        assert!(!lexicon.is_generic_term("taza"));
    }

    #[test]
    fn test_synonyms_are_bidirectional() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.synonym_of("celular"), Some("telefono"));
        assert_eq!(lexicon.synonym_of("telefono"), Some("celular"));
        assert_eq!(lexicon.synonym_of("taza"), Some("mug"));
        assert_eq!(lexicon.synonym_of("silla"), None);
    }

    #[test]
    fn test_generic_phrase_exact_match_only() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_generic_phrase("que venden"));
        assert!(!lexicon.is_generic_phrase("que venden de ceramica"));
    }
}
