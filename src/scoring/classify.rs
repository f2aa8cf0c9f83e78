//! Keyword classifiers for generated text
//!
//! Matching is a case-insensitive substring test.

/// Keywords a structured (non-imitative) response is expected to contain
pub const DEFAULT_STRUCTURE_KEYWORDS: &[&str] = &["semantic", "gravity", "resonance"];

fn contains_ci(haystack_lower: &str, needle: &str) -> bool {
    haystack_lower.contains(&needle.to_lowercase())
}

/// `PoR_null` test: true when none of `keywords` occurs in `text`
///
/// An empty keyword set makes every text null.
///
/// ```rust
/// use por_engine::scoring::is_por_null;
///
/// assert!(is_por_null("Output lacks structure", &["PoR", "grv"]));
/// assert!(!is_por_null("a por event", &["PoR"]));
/// ```
#[must_use]
pub fn is_por_null<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let lower = text.to_lowercase();
    !keywords.iter().any(|k| contains_ci(&lower, k.as_ref()))
}

/// Structure test: true when every keyword in `required` occurs in `text`
///
/// An empty requirement set is trivially satisfied.
#[must_use]
pub fn is_por_structure<S: AsRef<str>>(text: &str, required: &[S]) -> bool {
    let lower = text.to_lowercase();
    required.iter().all(|k| contains_ci(&lower, k.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_detection_is_case_insensitive() {
        assert!(is_por_null("Output lacks resonance", &["PoR"]));
        assert!(!is_por_null("Output lacks RESONANCE", &["PoR", "resonance"]));
    }

    #[test]
    fn test_null_with_no_keywords() {
        let none: [&str; 0] = [];
        assert!(is_por_null("anything", &none));
        assert!(is_por_structure("anything", &none));
    }

    #[test]
    fn test_structure_requires_all_keywords() {
        assert!(is_por_structure(
            "Semantic gravity resonance was detected",
            DEFAULT_STRUCTURE_KEYWORDS
        ));
        assert!(!is_por_structure("this is generic output", DEFAULT_STRUCTURE_KEYWORDS));
        assert!(!is_por_structure("semantic resonance only", DEFAULT_STRUCTURE_KEYWORDS));
    }

    #[test]
    fn test_owned_keywords() {
        let keywords = vec!["Grv".to_string()];
        assert!(!is_por_null("high grv field", &keywords));
    }
}
