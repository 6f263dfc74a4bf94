//! Canonical forms for names and codes
//!
//! Two pure, total normalization functions. Entities are compared only
//! through these canonical forms; no fuzzy logic lives here.

use unicode_normalization::UnicodeNormalization;

/// Normalize a display name or free-text query for comparison.
///
/// Lowercase, Unicode-decompose and drop combining marks, replace
/// punctuation and brackets with single spaces, collapse whitespace,
/// trim.
///
/// # Examples
///
/// ```
/// use shop_agent_text::normalize_name;
///
/// assert_eq!(normalize_name("  Lámpara (LED) "), "lampara led");
/// assert_eq!(normalize_name("Taza-Azul"), "taza azul");
/// ```
pub fn normalize_name(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a product code for comparison.
///
/// Uppercase with every separator stripped, so `"N-35"`, `"n 35"` and
/// `"N.35"` all collapse to `"N35"`.
///
/// # Examples
///
/// ```
/// use shop_agent_text::normalize_code;
///
/// assert_eq!(normalize_code("N-35"), "N35");
/// assert_eq!(normalize_code("n 35"), "N35");
/// assert_eq!(normalize_code("N.35"), "N35");
/// ```
pub fn normalize_code(text: &str) -> String {
    text.nfd()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().next().unwrap_or(c))
        .collect()
}

/// Normalized whole-word tokens of a name
pub fn name_tokens(text: &str) -> Vec<String> {
    normalize_name(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Whether `word` appears as a whole word inside normalized `text`
pub fn contains_whole_word(text: &str, word: &str) -> bool {
    let haystack = normalize_name(text);
    let needle = normalize_name(word);
    if needle.is_empty() {
        return false;
    }
    haystack.split_whitespace().any(|t| t == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_strips_diacritics_and_punctuation() {
        assert_eq!(normalize_name("Camión Rojo!"), "camion rojo");
        assert_eq!(normalize_name("Lámpara [LED] – mesa"), "lampara led mesa");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_code_variants_collapse() {
        let forms = ["N-35", "n 35", "N.35", " n--3 5 "];
        for form in forms {
            assert_eq!(normalize_code(form), "N35", "form: {form:?}");
        }
    }

    #[test]
    fn test_whole_word_boundaries() {
        assert!(contains_whole_word("Silla de mano", "mano"));
        // "mano" inside "manojo" is not a whole word
        assert!(!contains_whole_word("Manojo de flores", "mano"));
        assert!(!contains_whole_word("Silla", ""));
    }
}
