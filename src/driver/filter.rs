//! Keep/remove token filtering

use crate::error::{CorpdiffError, Result};
use crate::models::PositionedToken;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How a word list is applied to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Drop every token that is not in the list
    #[default]
    Keep,
    /// Drop every token that is in the list
    Remove,
}

impl FilterMode {
    fn drops(&self, in_list: bool) -> bool {
        match self {
            FilterMode::Keep => !in_list,
            FilterMode::Remove => in_list,
        }
    }
}

impl FromStr for FilterMode {
    type Err = CorpdiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(FilterMode::Keep),
            "remove" => Ok(FilterMode::Remove),
            _ => Err(CorpdiffError::UnknownFilterMode(s.to_string())),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Keep => write!(f, "keep"),
            FilterMode::Remove => write!(f, "remove"),
        }
    }
}

/// Filter a document's tokens against `words`. Survivors keep their
/// original positions, so gaps mark where tokens were removed.
pub fn filter_tokens<I>(
    tokens: I,
    words: &FxHashSet<String>,
    mode: FilterMode,
) -> Vec<PositionedToken>
where
    I: IntoIterator<Item = PositionedToken>,
{
    tokens
        .into_iter()
        .filter(|t| !mode.drops(words.contains(&t.token)))
        .collect()
}

/// Load a word list: whitespace-separated words, any number per line
pub fn load_word_list(path: impl AsRef<Path>) -> Result<FxHashSet<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| CorpdiffError::io(path, e))?;
    Ok(content.split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::positioned_tokens;

    fn sentence() -> Vec<PositionedToken> {
        positioned_tokens(&[
            "most", "cats", "sleep", "during", "the", "day", "in", "China", "and", "Egypt",
        ])
    }

    fn set(words: &[&str]) -> FxHashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_remove_nothing_when_list_empty() {
        let kept = filter_tokens(sentence(), &set(&[]), FilterMode::Remove);
        assert_eq!(kept, sentence());
    }

    #[test]
    fn test_remove_bad_words_keeps_positions() {
        let kept = filter_tokens(sentence(), &set(&["the", "in", "and"]), FilterMode::Remove);
        let pairs: Vec<(&str, usize)> =
            kept.iter().map(|t| (t.token.as_str(), t.position)).collect();
        assert_eq!(
            pairs,
            vec![
                ("most", 0),
                ("cats", 1),
                ("sleep", 2),
                ("during", 3),
                ("day", 5),
                ("China", 7),
                ("Egypt", 9)
            ]
        );
    }

    #[test]
    fn test_remove_all_when_all_bad() {
        let tokens = positioned_tokens(&["the", "the", "and", "in"]);
        assert!(filter_tokens(tokens, &set(&["the", "in", "and"]), FilterMode::Remove).is_empty());
    }

    #[test]
    fn test_keep_mode() {
        let kept = filter_tokens(sentence(), &set(&["cats", "day", "Egypt"]), FilterMode::Keep);
        let positions: Vec<usize> = kept.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 5, 9]);
    }

    #[test]
    fn test_filter_mode_parsing() {
        assert_eq!("keep".parse::<FilterMode>().unwrap(), FilterMode::Keep);
        assert_eq!("Remove".parse::<FilterMode>().unwrap(), FilterMode::Remove);
        assert!("drop".parse::<FilterMode>().is_err());
    }

    #[test]
    fn test_load_word_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "apple\ncat dog\n\n  bread\n").unwrap();
        let words = load_word_list(&path).unwrap();
        assert_eq!(words, set(&["apple", "cat", "dog", "bread"]));
    }
}
