//! Document-frequency vocabulary index
//!
//! Maps each token of a corpus to the number of documents containing it.
//! The comparison stage only depends on the [`VocabularyIndex`] trait;
//! [`DocFreqIndex`] is the in-memory implementation the CLI builds from
//! a raw corpus file.

use crate::corpus::RawCorpus;
use crate::error::{CorpdiffError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::io::Write;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Lower or upper document-frequency bound, absolute or relative
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Absolute number of documents
    Count(usize),
    /// Fraction of all documents (0.0 - 1.0)
    Fraction(f64),
}

impl Bound {
    /// Resolve to an absolute document count for a corpus of `total` documents
    pub fn resolve(&self, total: usize) -> f64 {
        match *self {
            Bound::Count(n) => n as f64,
            Bound::Fraction(f) => f * total as f64,
        }
    }
}

impl FromStr for Bound {
    type Err = CorpdiffError;

    /// `"5"` is a document count, `"0.5"` a fraction of the corpus
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains('.') {
            s.parse::<f64>()
                .map(Bound::Fraction)
                .map_err(|_| CorpdiffError::Config(format!("'{}' is not a valid fraction", s)))
        } else {
            s.parse::<usize>()
                .map(Bound::Count)
                .map_err(|_| {
                    CorpdiffError::Config(format!("'{}' is not a valid document count", s))
                })
        }
    }
}

/// Read access to per-token document frequencies of one corpus
pub trait VocabularyIndex {
    /// Number of documents containing `token` (0 when unknown)
    fn document_frequency(&self, token: &str) -> usize;

    /// Number of documents the index was built from
    fn total_documents(&self) -> usize;

    /// Number of distinct tokens
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, token: &str) -> bool {
        self.document_frequency(token) > 0
    }

    /// Iterate `(token, df)` pairs in no particular order
    fn tokens(&self) -> Box<dyn Iterator<Item = (&str, usize)> + '_>;

    /// Return a reduced index keeping tokens with `min <= df <= max`,
    /// then at most `limit` of the most frequent ones.
    fn filter_by_bounds(&self, min: Bound, max: Bound, limit: Option<usize>) -> Self
    where
        Self: Sized;
}

/// In-memory document-frequency index
#[derive(Debug, Clone, Default)]
pub struct DocFreqIndex {
    dfs: FxHashMap<String, usize>,
    num_docs: usize,
}

impl DocFreqIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one document. Repeated tokens inside a document count once,
    /// empty tokens are ignored.
    pub fn add_document<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = tokens.into_iter().collect();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for token in &tokens {
            let token = token.as_ref();
            if token.is_empty() || !seen.insert(token) {
                continue;
            }
            *self.dfs.entry(token.to_string()).or_insert(0) += 1;
        }
        self.num_docs += 1;
    }

    /// Build an index from per-document token lists
    pub fn from_documents<D, I, S>(documents: D) -> Self
    where
        D: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        for doc in documents {
            index.add_document(doc);
        }
        index
    }

    /// Build an index by scanning a raw corpus.
    ///
    /// Malformed lines are logged and skipped; a fatal error (unreadable
    /// file, ambiguous column split) aborts the scan.
    pub fn from_corpus(corpus: &RawCorpus) -> Result<Self> {
        let mut index = Self::new();
        let mut skipped = 0usize;

        for doc in corpus.documents()? {
            match doc {
                Ok(doc) => index.add_document(&doc.words),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping document: {}", e);
                    skipped += 1;
                }
            }
        }

        info!(
            "Indexed {} documents ({} tokens) from {}, {} skipped",
            index.num_docs,
            index.dfs.len(),
            corpus.path().display(),
            skipped
        );
        Ok(index)
    }

    /// Entries sorted by descending df, then token
    pub fn sorted_entries(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.dfs.iter().map(|(t, df)| (t.as_str(), *df)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Write a `token doc_freq` table with a header line
    pub fn write_dfs<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "token doc_freq")?;
        for (token, df) in self.sorted_entries() {
            writeln!(out, "{} {}", token, df)?;
        }
        out.flush()
    }

    /// All tokens of the index as an owned set
    pub fn token_set(&self) -> FxHashSet<String> {
        self.dfs.keys().cloned().collect()
    }
}

impl VocabularyIndex for DocFreqIndex {
    fn document_frequency(&self, token: &str) -> usize {
        self.dfs.get(token).copied().unwrap_or(0)
    }

    fn total_documents(&self) -> usize {
        self.num_docs
    }

    fn len(&self) -> usize {
        self.dfs.len()
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = (&str, usize)> + '_> {
        Box::new(self.dfs.iter().map(|(t, df)| (t.as_str(), *df)))
    }

    fn filter_by_bounds(&self, min: Bound, max: Bound, limit: Option<usize>) -> Self {
        let min_docs = min.resolve(self.num_docs);
        let max_docs = max.resolve(self.num_docs);
        debug!(
            "Filtering {} tokens: min={} max={} limit={:?}",
            self.dfs.len(),
            min_docs,
            max_docs,
            limit
        );

        let mut kept: Vec<(&str, usize)> = self
            .sorted_entries()
            .into_iter()
            .filter(|(_, df)| {
                let df = *df as f64;
                df >= min_docs && df <= max_docs
            })
            .collect();

        if let Some(limit) = limit {
            kept.truncate(limit);
        }

        Self {
            dfs: kept
                .into_iter()
                .map(|(t, df)| (t.to_string(), df))
                .collect(),
            num_docs: self.num_docs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats() -> DocFreqIndex {
        DocFreqIndex::from_documents(vec![
            vec!["a", "black", "cat"],
            vec!["three", "black", "cats"],
            vec!["a", "cat"],
        ])
    }

    #[test]
    fn test_document_frequencies() {
        let index = cats();
        assert_eq!(index.total_documents(), 3);
        assert_eq!(index.len(), 5);
        assert_eq!(index.document_frequency("a"), 2);
        assert_eq!(index.document_frequency("black"), 2);
        assert_eq!(index.document_frequency("cats"), 1);
        assert_eq!(index.document_frequency("dog"), 0);
        assert!(!index.contains("dog"));
    }

    #[test]
    fn test_repeated_token_counts_once_per_document() {
        let index = DocFreqIndex::from_documents(vec![vec!["the", "the", "the"], vec!["the"]]);
        assert_eq!(index.document_frequency("the"), 2);
    }

    #[test]
    fn test_empty_tokens_ignored() {
        let index = DocFreqIndex::from_documents(vec![vec![""], vec!["a", ""]]);
        assert_eq!(index.total_documents(), 2);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_filter_by_bounds() {
        let index = cats();
        let common = index.filter_by_bounds(Bound::Count(2), Bound::Fraction(1.0), None);
        assert_eq!(common.len(), 3);
        assert!(common.contains("cat"));
        assert!(!common.contains("three"));
        // Total document count survives filtering
        assert_eq!(common.total_documents(), 3);

        let rare = index.filter_by_bounds(Bound::Count(0), Bound::Count(1), None);
        assert_eq!(rare.len(), 2);
        assert!(rare.contains("three"));
        // Original index untouched
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_filter_limit_keeps_most_frequent() {
        let index = cats();
        let top = index.filter_by_bounds(Bound::Count(0), Bound::Fraction(1.0), Some(2));
        assert_eq!(top.len(), 2);
        // Ties on df=2 are broken alphabetically: a, black
        assert!(top.contains("a"));
        assert!(top.contains("black"));
    }

    #[test]
    fn test_bound_parsing() {
        assert_eq!("5".parse::<Bound>().unwrap(), Bound::Count(5));
        assert_eq!("0.5".parse::<Bound>().unwrap(), Bound::Fraction(0.5));
        assert!("abc".parse::<Bound>().is_err());
        assert_eq!(Bound::Fraction(0.5).resolve(40), 20.0);
    }

    #[test]
    fn test_write_dfs() {
        let mut out = Vec::new();
        cats().write_dfs(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "token doc_freq");
        assert_eq!(lines[1], "a 2");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5], "three 1");
    }
}
