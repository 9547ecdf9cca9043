//! Lexical scoring of a span against a block's reference text.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Score how well a span's text agrees with a block's reference text.
///
/// - no reference text: 1.0 (geometry alone decides)
/// - span text contained in the reference (case-insensitive): 1.0
/// - otherwise the share of the span's words (2+ chars) found in the reference
pub fn text_score(span_text: &str, reference: Option<&str>) -> f32 {
    let Some(reference) = reference.filter(|r| !r.trim().is_empty()) else {
        return 1.0;
    };

    let span = normalize(span_text);
    let reference = normalize(reference);
    let span_trimmed = span.trim();
    if !span_trimmed.is_empty() && reference.contains(span_trimmed) {
        return 1.0;
    }

    let span_words = words(&span);
    let reference_words = words(&reference);
    if span_words.is_empty() || reference_words.is_empty() {
        return 0.0;
    }
    let common = span_words.intersection(&reference_words).count();
    common as f32 / span_words.len() as f32
}

/// Compatibility-normalize and lowercase.
fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

fn words(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reference_scores_one() {
        assert_eq!(text_score("anything", None), 1.0);
        assert_eq!(text_score("anything", Some("   ")), 1.0);
    }

    #[test]
    fn test_substring_containment() {
        assert_eq!(text_score("WORLD", Some("Hello world, again")), 1.0);
    }

    #[test]
    fn test_word_overlap() {
        let score = text_score("quick brown cat", Some("The quick brown fox"));
        assert!((score - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_words_ignored() {
        assert_eq!(text_score("a b", Some("x y z")), 0.0);
        assert_eq!(text_score("zebra", Some("no match here")), 0.0);
    }

    #[test]
    fn test_compatibility_forms_match() {
        // Full-width letters normalize to ASCII.
        assert_eq!(text_score("ＡＢＣ", Some("abc def")), 1.0);
        // The "fi" ligature normalizes to "fi".
        assert_eq!(text_score("ﬁle", Some("open the file")), 1.0);
    }
}
