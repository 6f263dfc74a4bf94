//! Regular Spanish noun morphology
//!
//! Suffix rules keyed on terminal letters, operating on already
//! normalized (lowercase, accent-free) words. Used only to broaden
//! candidate matching; FOUND/AMBIGUOUS uniqueness decisions never rely
//! on these.

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

fn ends_with_vowel(word: &str) -> bool {
    word.chars().last().is_some_and(|c| VOWELS.contains(&c))
}

/// Singular form of a regular plural noun.
///
/// `luces → luz`, `camiones → camion`, `colores → color`,
/// `tazas → taza`. Words that do not look plural come back unchanged.
pub fn singularize(word: &str) -> String {
    let w = word.trim();
    if w.len() <= 3 {
        return w.to_string();
    }
    if let Some(stem) = w.strip_suffix("ces") {
        return format!("{stem}z");
    }
    if let Some(stem) = w.strip_suffix("ones") {
        return format!("{stem}on");
    }
    if let Some(stem) = w.strip_suffix("es") {
        // consonant + "es": colores -> color; but vowel + "es" is a
        // plain vowel plural with a trailing s (clientes -> cliente)
        if !ends_with_vowel(stem) {
            return stem.to_string();
        }
    }
    if let Some(stem) = w.strip_suffix('s') {
        if ends_with_vowel(stem) {
            return stem.to_string();
        }
    }
    w.to_string()
}

/// Regular plural of a singular noun.
///
/// `luz → luces`, `camion → camiones`, `taza → tazas`,
/// `color → colores`.
pub fn pluralize(word: &str) -> String {
    let w = word.trim();
    if w.is_empty() {
        return String::new();
    }
    if let Some(stem) = w.strip_suffix('z') {
        return format!("{stem}ces");
    }
    if w.ends_with("on") {
        return format!("{w}es");
    }
    if ends_with_vowel(w) {
        return format!("{w}s");
    }
    format!("{w}es")
}

/// The matching variants of one query word: the word itself, its
/// singular, and its plural, deduplicated and order-preserving.
pub fn word_variants(word: &str) -> Vec<String> {
    let mut variants = vec![word.trim().to_string()];
    for candidate in [singularize(word), pluralize(word)] {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize_suffix_families() {
        assert_eq!(singularize("luces"), "luz");
        assert_eq!(singularize("camiones"), "camion");
        assert_eq!(singularize("colores"), "color");
        assert_eq!(singularize("tazas"), "taza");
        assert_eq!(singularize("remeras"), "remera");
        assert_eq!(singularize("vasos"), "vaso");
    }

    #[test]
    fn test_singularize_leaves_singulars_alone() {
        assert_eq!(singularize("taza"), "taza");
        assert_eq!(singularize("sol"), "sol");
        assert_eq!(singularize("luz"), "luz");
    }

    #[test]
    fn test_pluralize_round_trips() {
        for word in ["taza", "color", "camion", "luz", "vaso"] {
            assert_eq!(singularize(&pluralize(word)), word, "word: {word}");
        }
    }

    #[test]
    fn test_word_variants_dedup() {
        let variants = word_variants("tazas");
        assert_eq!(variants, vec!["tazas", "taza", "tazases"]);

        // a word equal to its own singular yields two entries
        let variants = word_variants("taza");
        assert_eq!(variants, vec!["taza", "tazas"]);
    }
}
