//! Text processing for catalog matching
//!
//! Features:
//! - Canonical name/code normalization for comparison
//! - Code-shaped token extraction with fixed pattern priority
//! - Regular Spanish noun morphology for broadening candidate matches

pub mod codes;
pub mod morphology;
pub mod normalize;

pub use codes::{extract_codes, extract_primary_code, looks_like_code};
pub use morphology::{pluralize, singularize, word_variants};
pub use normalize::{contains_whole_word, name_tokens, normalize_code, normalize_name};
