//! Search pattern handling
//!
//! [`rewrite_pattern`] turns a user pattern into the MATCH expression both stores
//! run. [`Query`] is the evaluator `MemoryStore` uses for that expression: implicit
//! AND of bare words, `"quoted phrases"` and a trailing `*` for prefix matching.

use crate::error::{Error, Result};

/// Rewrite a user pattern into a full-text MATCH expression.
///
/// Returns `None` for an empty or whitespace-only pattern. When the last character
/// is alphabetic, `*` is appended so the final token matches as a prefix; anything
/// else (closing quote, digit, `*`, punctuation) is passed through unchanged.
///
/// "Alphabetic" is the Unicode `Alphabetic` property, which is wider than the
/// Letter category: letter numbers such as `Ⅻ` and combining vowel signs such as
/// Devanagari `े` count too, so a word ending in a vowel sign still gets its prefix.
pub fn rewrite_pattern(pattern: &str) -> Option<String> {
    if pattern.trim().is_empty() {
        return None;
    }

    match pattern.chars().last() {
        Some(c) if c.is_alphabetic() => Some(format!("{pattern}*")),
        _ => Some(pattern.to_owned()),
    }
}

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A sequence of tokens that must appear consecutively
#[derive(Debug, Clone, PartialEq, Eq)]
struct Phrase {
    tokens: Vec<String>,
    /// Last token matches any token it is a prefix of
    prefix: bool,
}

impl Phrase {
    fn matches(&self, tokens: &[String]) -> bool {
        if self.tokens.is_empty() || tokens.len() < self.tokens.len() {
            return false;
        }

        let last = self.tokens.len() - 1;
        tokens.windows(self.tokens.len()).any(|window| {
            window.iter().zip(&self.tokens).enumerate().all(|(i, (have, want))| {
                if self.prefix && i == last { have.starts_with(want.as_str()) } else { have == want }
            })
        })
    }
}

/// A parsed MATCH expression: every phrase must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    phrases: Vec<Phrase>,
}

impl Query {
    /// Parse a MATCH expression.
    ///
    /// Fails on an unterminated quote or on the `OR`/`NOT` operators, which this
    /// evaluator does not support. `AND` is accepted and is the same as juxtaposition.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut phrases = Vec::new();
        let mut rest = expr;

        while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
            rest = &rest[start..];

            if let Some(quoted) = rest.strip_prefix('"') {
                let end = quoted
                    .find('"')
                    .ok_or_else(|| Error::invalid_query(format!("unterminated string in {expr:?}")))?;
                let after = &quoted[end + 1..];
                let prefix = after.starts_with('*');
                phrases.push(Phrase { tokens: tokenize(&quoted[..end]), prefix });
                rest = if prefix { &after[1..] } else { after };
                continue;
            }

            let end = rest.find(|c: char| c.is_whitespace() || c == '"').unwrap_or(rest.len());
            let word = &rest[..end];
            rest = &rest[end..];

            match word {
                "AND" => continue,
                "OR" | "NOT" => return Err(Error::invalid_query(format!("unsupported operator {word}"))),
                _ => {}
            }

            let (body, prefix) = match word.strip_suffix('*') {
                Some(body) => (body, true),
                None => (word, false),
            };
            let tokens = tokenize(body);
            if !tokens.is_empty() {
                phrases.push(Phrase { tokens, prefix });
            }
        }

        Ok(Self { phrases })
    }

    /// Whether every phrase occurs in the tokenized text. An empty query matches nothing.
    pub fn matches(&self, tokens: &[String]) -> bool {
        !self.phrases.is_empty() && self.phrases.iter().all(|phrase| phrase.matches(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(expr: &str, title: &str) -> bool {
        Query::parse(expr).unwrap().matches(&tokenize(title))
    }

    #[test]
    fn test_rewrite_appends_star_after_letter() {
        assert_eq!(rewrite_pattern("one thr").as_deref(), Some("one thr*"));
        assert_eq!(rewrite_pattern("café").as_deref(), Some("café*"));
    }

    #[test]
    fn test_rewrite_uses_alphabetic_property() {
        assert_eq!(rewrite_pattern("chapter Ⅻ").as_deref(), Some("chapter Ⅻ*"));
        assert_eq!(rewrite_pattern("नमस्ते").as_deref(), Some("नमस्ते*"));
        assert_eq!(rewrite_pattern("chapter ½").as_deref(), Some("chapter ½"));
    }

    #[test]
    fn test_rewrite_leaves_other_endings() {
        assert_eq!(rewrite_pattern("\"one three\"").as_deref(), Some("\"one three\""));
        assert_eq!(rewrite_pattern("rust 2024").as_deref(), Some("rust 2024"));
        assert_eq!(rewrite_pattern("one*").as_deref(), Some("one*"));
        assert_eq!(rewrite_pattern("one ").as_deref(), Some("one "));
    }

    #[test]
    fn test_rewrite_empty_pattern() {
        assert_eq!(rewrite_pattern(""), None);
        assert_eq!(rewrite_pattern("   "), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Example Domain"), vec!["example", "domain"]);
        assert_eq!(tokenize("rust-lang/rust: issues"), vec!["rust", "lang", "rust", "issues"]);
        assert!(tokenize("--").is_empty());
    }

    #[test]
    fn test_words_are_and_ed() {
        assert!(hits("one", "one two"));
        assert!(hits("one two", "two one"));
        assert!(!hits("one two three", "one two"));
        assert!(hits("one AND two", "one two"));
    }

    #[test]
    fn test_prefix_word() {
        assert!(hits("one thr*", "one three"));
        assert!(!hits("one thr", "one three"));
        assert!(hits("ONE*", "oneself"));
    }

    #[test]
    fn test_phrase_requires_adjacency() {
        assert!(hits("\"one three\"", "one three"));
        assert!(!hits("\"one three\"", "one two three"));
        assert!(!hits("\"one thr\"", "one three"));
        assert!(hits("\"one thr\"*", "one three"));
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        assert!(!hits("", "one"));
        assert!(!hits("*", "one"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Query::parse("\"one two"), Err(Error::InvalidQuery(_))));
        assert!(matches!(Query::parse("one OR two"), Err(Error::InvalidQuery(_))));
        assert!(matches!(Query::parse("NOT one"), Err(Error::InvalidQuery(_))));
    }
}
