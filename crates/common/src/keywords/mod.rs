//! Keyword extraction
//!
//! `KeywordExtractor` is the seam where an NLP provider plugs in. The default
//! `StopwordExtractor` is a deterministic tokenizer: lower-case, split on
//! anything that is not alphanumeric or an inner hyphen, drop stop words and
//! very short tokens.

use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Normalized keyword extraction
pub trait KeywordExtractor: Send + Sync {
    /// Extract the normalized keyword set of `text`
    fn extract(&self, text: &str) -> BTreeSet<String>;
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Hyphenated compounds ("solid-state") stay one token
    PATTERN.get_or_init(|| Regex::new(r"[a-z0-9]+(?:-[a-z0-9]+)*").expect("static token pattern"))
}

/// Lower-cased tokens of `text`, without filtering
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Stop-word filtering extractor
#[derive(Debug, Clone)]
pub struct StopwordExtractor {
    stop_words: BTreeSet<String>,
    min_length: usize,
}

impl StopwordExtractor {
    pub fn new(min_length: usize) -> Self {
        Self {
            stop_words: Self::load_stop_words(),
            min_length,
        }
    }

    /// Add domain stop words (e.g. "study", "results")
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words.extend(words.into_iter().map(|w| w.into().to_lowercase()));
        self
    }

    fn is_keyword(&self, token: &str) -> bool {
        token.chars().count() >= self.min_length
            && !self.stop_words.contains(token)
            && !token.chars().all(|c| c.is_ascii_digit())
    }

    fn load_stop_words() -> BTreeSet<String> {
        [
            "a", "an", "the", "is", "are", "was", "were", "be", "been",
            "in", "on", "at", "to", "for", "of", "with", "by", "from",
            "and", "or", "but", "not", "this", "that", "these", "those",
            "it", "its", "as", "do", "does", "did", "has", "have", "had",
            "can", "could", "will", "would", "should", "may", "might",
            "we", "our", "us", "than", "via", "into", "using", "based",
        ]
        .into_iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Default for StopwordExtractor {
    fn default() -> Self {
        Self::new(3)
    }
}

impl KeywordExtractor for StopwordExtractor {
    fn extract(&self, text: &str) -> BTreeSet<String> {
        tokenize(text).into_iter().filter(|t| self.is_keyword(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_hyphenated_compounds() {
        let tokens = tokenize("Solid-State electrolytes, and Li-ion: 2024!");
        let expected: BTreeSet<String> = ["solid-state", "electrolytes", "and", "li-ion", "2024"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_extractor_filters_stop_words() {
        let extractor = StopwordExtractor::default();
        let keywords = extractor.extract("The degradation of the lithium anode in 2023");
        let expected: BTreeSet<String> = ["degradation", "lithium", "anode"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keywords, expected);
    }

    #[test]
    fn test_extra_stop_words() {
        let extractor = StopwordExtractor::default().with_extra_stop_words(["Study"]);
        assert!(!extractor.extract("A cycling study").contains("study"));
        assert!(extractor.extract("A cycling study").contains("cycling"));
    }
}
