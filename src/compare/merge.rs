//! Frequency merge of two vocabulary indexes

use crate::error::CorpdiffError;
use crate::models::{MergedEntry, Token};
use crate::vocab::VocabularyIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Token -> document frequency in each corpus.
///
/// Ordered by token so the significance table comes out deterministic.
pub type MergedCore = BTreeMap<Token, MergedEntry>;

/// Which tokens survive a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Tokens of either index
    #[default]
    Outer,
    /// Tokens present in both indexes
    Inner,
    /// Tokens of the first index
    Left,
    /// Tokens of the second index
    Right,
}

impl FromStr for JoinMode {
    type Err = CorpdiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outer" => Ok(JoinMode::Outer),
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            _ => Err(CorpdiffError::UnknownJoin(s.to_string())),
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Outer => write!(f, "outer"),
            JoinMode::Inner => write!(f, "inner"),
            JoinMode::Left => write!(f, "left"),
            JoinMode::Right => write!(f, "right"),
        }
    }
}

/// Combine two indexes into `token -> (df_a, df_b)`.
///
/// A token missing from one side gets a frequency of 0 on that side.
pub fn merge<A, B>(a: &A, b: &B, join: JoinMode) -> MergedCore
where
    A: VocabularyIndex + ?Sized,
    B: VocabularyIndex + ?Sized,
{
    info!(
        "Merging two cores of lengths {} and {} with {} join",
        a.len(),
        b.len(),
        join
    );

    let mut merged = MergedCore::new();

    let take_left = matches!(join, JoinMode::Outer | JoinMode::Left | JoinMode::Inner);
    if take_left {
        for (token, df_a) in a.tokens() {
            let df_b = b.document_frequency(token);
            if join == JoinMode::Inner && df_b == 0 {
                continue;
            }
            merged.insert(token.to_string(), MergedEntry::new(df_a, df_b));
        }
    }

    if matches!(join, JoinMode::Outer | JoinMode::Right) {
        for (token, df_b) in b.tokens() {
            merged
                .entry(token.to_string())
                .or_insert_with(|| MergedEntry::new(a.document_frequency(token), df_b));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::DocFreqIndex;

    fn indexes() -> (DocFreqIndex, DocFreqIndex) {
        let a = DocFreqIndex::from_documents(vec![
            vec!["a", "black", "cat"],
            vec!["three", "black", "cats"],
            vec!["a", "cat"],
        ]);
        let b = DocFreqIndex::from_documents(vec![
            vec!["a", "black", "cat"],
            vec!["two", "black", "cats"],
            vec!["a", "dog"],
        ]);
        (a, b)
    }

    fn entries(core: &MergedCore) -> Vec<(&str, usize, usize)> {
        core.iter()
            .map(|(t, e)| (t.as_str(), e.df_a, e.df_b))
            .collect()
    }

    #[test]
    fn test_inner_join() {
        let (a, b) = indexes();
        let core = merge(&a, &b, JoinMode::Inner);
        assert_eq!(
            entries(&core),
            vec![("a", 2, 2), ("black", 2, 2), ("cat", 2, 1), ("cats", 1, 1)]
        );
    }

    #[test]
    fn test_outer_join() {
        let (a, b) = indexes();
        let core = merge(&a, &b, JoinMode::Outer);
        assert_eq!(core.len(), 7);
        assert_eq!(core["three"], MergedEntry::new(1, 0));
        assert_eq!(core["two"], MergedEntry::new(0, 1));
        assert_eq!(core["dog"], MergedEntry::new(0, 1));
        assert_eq!(core["cat"], MergedEntry::new(2, 1));
    }

    #[test]
    fn test_left_join_keys_match_left_index() {
        let (a, b) = indexes();
        let core = merge(&a, &b, JoinMode::Left);
        assert_eq!(core.len(), a.len());
        for (token, _) in a.tokens() {
            assert!(core.contains_key(token));
        }
        assert_eq!(core["three"], MergedEntry::new(1, 0));
    }

    #[test]
    fn test_right_join() {
        let (a, b) = indexes();
        let core = merge(&a, &b, JoinMode::Right);
        assert_eq!(core.len(), b.len());
        assert_eq!(core["dog"], MergedEntry::new(0, 1));
        assert!(!core.contains_key("three"));
    }

    #[test]
    fn test_join_sizes_are_ordered() {
        let (a, b) = indexes();
        let outer = merge(&a, &b, JoinMode::Outer).len();
        let left = merge(&a, &b, JoinMode::Left).len();
        let inner = merge(&a, &b, JoinMode::Inner).len();
        assert!(outer >= left);
        assert!(left >= inner);
    }

    #[test]
    fn test_empty_indexes() {
        let empty = DocFreqIndex::new();
        let (a, _) = indexes();
        assert!(merge(&empty, &empty, JoinMode::Outer).is_empty());
        assert!(merge(&a, &empty, JoinMode::Inner).is_empty());
        assert_eq!(merge(&a, &empty, JoinMode::Left).len(), 5);
        assert!(merge(&a, &empty, JoinMode::Right).is_empty());
    }

    #[test]
    fn test_join_mode_parsing() {
        assert_eq!("outer".parse::<JoinMode>().unwrap(), JoinMode::Outer);
        assert_eq!("INNER".parse::<JoinMode>().unwrap(), JoinMode::Inner);
        assert!(matches!(
            "full".parse::<JoinMode>(),
            Err(CorpdiffError::UnknownJoin(s)) if s == "full"
        ));
        assert_eq!(JoinMode::Right.to_string(), "right");
    }
}
