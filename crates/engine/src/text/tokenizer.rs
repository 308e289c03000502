//! Deterministic tokenizer
//!
//! Lowercase, keep only ASCII lowercase/digits/whitespace/hyphen, split
//! on whitespace, trim hyphens, then drop one-character tokens,
//! stopwords, and pure decimal numbers. No stemming; any two builds
//! must produce byte-identical token streams.

use super::stopwords::is_stopword;

pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .map(|token| token.trim_matches('-'))
        .filter(|token| token.len() > 1)
        .filter(|token| !is_stopword(token))
        .filter(|token| !token.bytes().all(|b| b.is_ascii_digit()))
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_punctuation_only() {
        assert!(tokenize("!!! ??? ... ,,, ###").is_empty());
    }

    #[test]
    fn test_basic_tokenization() {
        assert_eq!(
            tokenize("Deep Learning for Speech Recognition"),
            vec!["deep", "learning", "speech", "recognition"]
        );
    }

    #[test]
    fn test_hyphen_handling() {
        // interior hyphens survive, edge hyphens are trimmed
        assert_eq!(
            tokenize("state-of-the-art -pre- self-supervised"),
            vec!["state-of-the-art", "pre", "self-supervised"]
        );
    }

    #[test]
    fn test_numbers_and_short_tokens_dropped() {
        assert_eq!(tokenize("2023 a x gpt-4 99"), vec!["gpt-4"]);
    }

    #[test]
    fn test_stopwords_dropped() {
        assert_eq!(
            tokenize("We propose a novel method for speech"),
            vec!["speech"]
        );
    }

    #[test]
    fn test_unicode_is_flattened_to_ascii_classes() {
        // non-ASCII letters become separators
        assert_eq!(tokenize("naïve approach"), vec!["na", "ve"]);
    }
}
