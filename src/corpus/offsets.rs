//! Offset-based subsetting
//!
//! An offsets corpus carries, next to each document's words, one numeric
//! offset per word (a timestamp, a character offset, a page number):
//!
//! ```text
//! [id<TAB>]the|apple|was|large<TAB>0|1|2|6
//! ```
//!
//! [`subset_corpus`] rewrites such a file into a plain `id<TAB>w|w|...`
//! corpus keeping only the words whose offsets fall in a range.

use crate::error::{CorpdiffError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Keep the elements whose offset lies in `[min_offset, max_offset)`.
///
/// `offsets` defaults to the element indices. `max_offset` defaults to one
/// past the last offset. A negative `min_offset` counts back from
/// `max_offset`, so `-4` keeps the last four offset units.
pub fn subset_by_offset<'a, T>(
    items: &'a [T],
    offsets: Option<&'a [f64]>,
    min_offset: f64,
    max_offset: Option<f64>,
) -> impl Iterator<Item = &'a T> + 'a {
    let offset_at = move |i: usize| -> f64 {
        match offsets {
            Some(o) => o.get(i).copied().unwrap_or(f64::INFINITY),
            None => i as f64,
        }
    };

    let last = items.len().checked_sub(1).map(offset_at).unwrap_or(0.0);
    let max = max_offset.unwrap_or(last + 1.0);
    let min = if min_offset < 0.0 {
        (max + min_offset).max(0.0)
    } else {
        min_offset
    };

    items
        .iter()
        .enumerate()
        .filter(move |(i, _)| {
            let offset = offset_at(*i);
            min <= offset && offset < max
        })
        .map(|(_, item)| item)
}

/// Column layout of an offsets corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetLayout {
    /// Separator between the id, text and offsets columns
    pub column_sep: char,
    /// Separator between words, and between offsets
    pub word_sep: char,
    /// First column holds a document id
    pub has_ids: bool,
    /// Skip the first line of the file
    pub has_header: bool,
}

impl Default for OffsetLayout {
    fn default() -> Self {
        Self {
            column_sep: '\t',
            word_sep: '|',
            has_ids: true,
            has_header: true,
        }
    }
}

/// Half-open offset window, see [`subset_by_offset`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetRange {
    pub min: f64,
    pub max: Option<f64>,
}

/// Counters for one subset pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubsetStats {
    /// Records written (one per input document)
    pub documents: usize,
    /// Words kept across all records
    pub words: usize,
    /// Lines written as empty records because they did not parse
    pub malformed: usize,
}

/// One parsed line of an offsets corpus
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetDocument {
    pub id: Option<String>,
    pub words: Vec<String>,
    pub offsets: Vec<f64>,
}

/// Split a line into id, words and offsets
pub fn parse_offset_line(
    line: &str,
    layout: &OffsetLayout,
) -> std::result::Result<OffsetDocument, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let columns: Vec<&str> = line.split(layout.column_sep).collect();
    let expected = if layout.has_ids { 3 } else { 2 };
    if columns.len() != expected {
        return Err(format!(
            "expected {} columns separated by {:?}, found {}",
            expected,
            layout.column_sep,
            columns.len()
        ));
    }

    let (id, text, raw_offsets) = if layout.has_ids {
        (Some(columns[0].to_string()), columns[1], columns[2])
    } else {
        (None, columns[0], columns[1])
    };

    let offsets = raw_offsets
        .split(layout.word_sep)
        .map(|o| {
            o.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a numeric offset", o.trim()))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;

    Ok(OffsetDocument {
        id,
        words: text.split(layout.word_sep).map(str::to_string).collect(),
        offsets,
    })
}

/// Rewrite the offsets corpus at `input` into `out`, keeping only words
/// whose offsets lie in `range`.
///
/// Documents without ids are numbered from 1. A line that does not parse
/// becomes an empty record so output lines stay aligned with documents.
pub fn subset_corpus<W: Write>(
    input: &Path,
    layout: OffsetLayout,
    range: OffsetRange,
    mut out: W,
) -> Result<SubsetStats> {
    let file = File::open(input).map_err(|e| CorpdiffError::io(input, e))?;
    let write_err = |e: std::io::Error| CorpdiffError::io("<output>", e);
    let sep = layout.word_sep.to_string();
    let mut stats = SubsetStats::default();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| CorpdiffError::io(input, e))?;
        if idx == 0 && layout.has_header {
            continue;
        }
        stats.documents += 1;

        match parse_offset_line(&line, &layout) {
            Ok(doc) => {
                let kept: Vec<&str> = subset_by_offset(
                    &doc.words,
                    Some(doc.offsets.as_slice()),
                    range.min,
                    range.max,
                )
                .map(String::as_str)
                .collect();
                stats.words += kept.len();
                let id = doc.id.unwrap_or_else(|| stats.documents.to_string());
                writeln!(out, "{}\t{}", id, kept.join(sep.as_str())).map_err(write_err)?;
            }
            Err(reason) => {
                let err = CorpdiffError::MalformedDocument {
                    line: idx + 1,
                    reason,
                };
                warn!("Emitting empty record: {}", err);
                stats.malformed += 1;
                let id = if layout.has_ids {
                    String::new()
                } else {
                    stats.documents.to_string()
                };
                writeln!(out, "{}\t", id).map_err(write_err)?;
            }
        }
    }

    out.flush().map_err(write_err)?;
    info!(
        "Subset {} documents of {} to offsets [{}, {:?}): {} words kept, {} malformed",
        stats.documents,
        input.display(),
        range.min,
        range.max,
        stats.words,
        stats.malformed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<&'static str> {
        vec!["the", "apple", "was", "large", "and", "juicy"]
    }

    #[test]
    fn test_default_indices_keep_everything() {
        let words = words();
        let kept: Vec<&str> = subset_by_offset(&words, None, 0.0, None).copied().collect();
        assert_eq!(kept, words);
    }

    #[test]
    fn test_max_offset() {
        let words = words();
        let kept: Vec<&str> = subset_by_offset(&words, None, 0.0, Some(4.0)).copied().collect();
        assert_eq!(kept, words[..4].to_vec());
    }

    #[test]
    fn test_min_offset() {
        let words = words();
        let kept: Vec<&str> = subset_by_offset(&words, None, 2.0, None).copied().collect();
        assert_eq!(kept, words[2..].to_vec());
    }

    #[test]
    fn test_negative_min_offset() {
        let words = words();
        let kept: Vec<&str> = subset_by_offset(&words, None, -4.0, None).copied().collect();
        assert_eq!(kept, words[2..].to_vec());
    }

    #[test]
    fn test_negative_min_with_explicit_offsets() {
        let words = words();
        let offsets = vec![0.0, 1.0, 2.0, 6.0, 7.0, 8.0];
        let kept: Vec<&str> = subset_by_offset(&words, Some(offsets.as_slice()), -4.0, None)
            .copied()
            .collect();
        assert_eq!(kept, words[3..].to_vec());
    }

    fn subset(contents: &str, layout: OffsetLayout, range: OffsetRange) -> (String, SubsetStats) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.tsv");
        std::fs::write(&path, contents).unwrap();
        let mut out = Vec::new();
        let stats = subset_corpus(&path, layout, range, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_parse_offset_line() {
        let doc = parse_offset_line("7\tthe|apple\t0|1.5\r\n", &OffsetLayout::default()).unwrap();
        assert_eq!(doc.id.as_deref(), Some("7"));
        assert_eq!(doc.words, vec!["the", "apple"]);
        assert_eq!(doc.offsets, vec![0.0, 1.5]);

        let err = parse_offset_line("the|apple\t0|x", &OffsetLayout::default()).unwrap_err();
        assert!(err.contains("found 2"));
        let no_ids = OffsetLayout {
            has_ids: false,
            ..Default::default()
        };
        assert!(parse_offset_line("the|apple\t0|x", &no_ids)
            .unwrap_err()
            .contains("'x'"));
    }

    #[test]
    fn test_subset_corpus_keeps_last_offset_units() {
        let (text, stats) = subset(
            "id\ttext\toffsets\nd1\tthe|apple|was|large|and|juicy\t0|1|2|6|7|8\nd2\ta|b\t0|1\n",
            OffsetLayout::default(),
            OffsetRange {
                min: -4.0,
                max: None,
            },
        );
        assert_eq!(text, "d1\tlarge|and|juicy\nd2\ta|b\n");
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.words, 5);
    }

    #[test]
    fn test_subset_corpus_numbers_documents_without_ids() {
        let layout = OffsetLayout {
            has_ids: false,
            has_header: false,
            ..Default::default()
        };
        let (text, stats) = subset(
            "the|apple|was\t0|1|2\nbroken\nlarge|and\t5|6\n",
            layout,
            OffsetRange {
                min: 0.0,
                max: Some(2.0),
            },
        );
        assert_eq!(text, "1\tthe|apple\n2\t\n3\t\n");
        assert_eq!(stats.malformed, 1);
    }
}
