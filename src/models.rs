//! Core data models shared across stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque word or phrase unit. Equality is exact string equality.
pub type Token = String;

/// Separator joining a true bigram (gap of one position)
pub const BIGRAM_SEP: &str = " ";

/// Separator joining the endpoints of a skip-gram (gap of two positions)
pub const SKIP_SEP: &str = " - ";

/// A token with its zero-based position in the source document,
/// counted before any filtering took place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionedToken {
    pub token: Token,
    pub position: usize,
}

impl PositionedToken {
    pub fn new(token: impl Into<Token>, position: usize) -> Self {
        Self {
            token: token.into(),
            position,
        }
    }
}

impl<S: Into<Token>> From<(S, usize)> for PositionedToken {
    fn from((token, position): (S, usize)) -> Self {
        Self::new(token, position)
    }
}

/// One document of a corpus pass: optional id plus its surviving tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub id: Option<String>,
    pub tokens: Vec<PositionedToken>,
}

/// Document frequencies of one token in both corpora
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
    pub df_a: usize,
    pub df_b: usize,
}

impl MergedEntry {
    pub fn new(df_a: usize, df_b: usize) -> Self {
        Self { df_a, df_b }
    }

    pub fn total(&self) -> usize {
        self.df_a + self.df_b
    }
}

/// Outcome of a significance test for one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub token: Token,
    pub p_value: f64,
    pub df_a: usize,
    pub df_b: usize,
}

/// Output phrase of the n-gram synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phrase {
    /// A bare surviving token
    Unigram(Token),
    /// Two tokens that were adjacent in the source text
    Bigram(Token, Token),
    /// Endpoints of a source trigram whose middle token was removed
    SkipGram(Token, Token),
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phrase::Unigram(t) => write!(f, "{}", t),
            Phrase::Bigram(a, b) => write!(f, "{}{}{}", a, BIGRAM_SEP, b),
            Phrase::SkipGram(a, b) => write!(f, "{}{}{}", a, SKIP_SEP, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_display_separators() {
        assert_eq!(Phrase::Unigram("cats".into()).to_string(), "cats");
        assert_eq!(
            Phrase::Bigram("most".into(), "cats".into()).to_string(),
            "most cats"
        );
        assert_eq!(
            Phrase::SkipGram("most".into(), "sleep".into()).to_string(),
            "most - sleep"
        );
    }

    #[test]
    fn test_merged_entry_total() {
        assert_eq!(MergedEntry::new(3, 4).total(), 7);
        assert_eq!(MergedEntry::default().total(), 0);
    }
}
