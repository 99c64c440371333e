//! Raw corpus reader
//!
//! A corpus file holds one document per line: an optional id column, then
//! the document's tokens joined by a single-character word separator.
//!
//! ```text
//! 17\tmost|cats|sleep|during|the|day
//! 18\tdoctors|stay|away
//! ```

mod offsets;

pub use offsets::{
    parse_offset_line, subset_by_offset, subset_corpus, OffsetDocument, OffsetLayout, OffsetRange,
    SubsetStats,
};

use crate::error::{CorpdiffError, Result};
use crate::models::PositionedToken;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column layout of a corpus file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFormat {
    /// Separator between the id column and the text (`None` = no id column)
    pub delimiter: Option<char>,
    /// Separator between tokens of the text
    pub word_sep: char,
    /// Skip the first line of the file
    pub has_header: bool,
}

impl Default for CorpusFormat {
    fn default() -> Self {
        Self {
            delimiter: Some('\t'),
            word_sep: '|',
            has_header: true,
        }
    }
}

impl CorpusFormat {
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// One parsed line of a corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// 1-based line number in the source file
    pub line: usize,
    pub id: Option<String>,
    pub words: Vec<String>,
}

impl RawDocument {
    /// Tokens annotated with their zero-based source positions
    pub fn positioned(&self) -> Vec<PositionedToken> {
        positioned_tokens(&self.words)
    }
}

/// Attach zero-based positions to a document's tokens
pub fn positioned_tokens<S: AsRef<str>>(words: &[S]) -> Vec<PositionedToken> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| PositionedToken::new(w.as_ref(), i))
        .collect()
}

/// Split a single line into id and tokens according to `format`
pub fn parse_line(
    line: &str,
    format: &CorpusFormat,
) -> std::result::Result<(Option<String>, Vec<String>), String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let split_words = |text: &str| -> Vec<String> {
        text.split(format.word_sep).map(str::to_string).collect()
    };

    match format.delimiter {
        None => Ok((None, split_words(line))),
        Some(delim) if delim == format.word_sep => {
            let mut fields = line.split(delim);
            let id = fields.next().unwrap_or_default().to_string();
            Ok((Some(id), fields.map(str::to_string).collect()))
        }
        Some(delim) => {
            let columns: Vec<&str> = line.split(delim).collect();
            if columns.len() != 2 {
                return Err(format!(
                    "expected 2 columns separated by {:?}, found {}",
                    delim,
                    columns.len()
                ));
            }
            Ok((Some(columns[0].to_string()), split_words(columns[1])))
        }
    }
}

/// Handle on a corpus file. Every call to [`RawCorpus::documents`] re-opens
/// the file, so a corpus can be scanned any number of times.
#[derive(Debug, Clone)]
pub struct RawCorpus {
    path: PathBuf,
    format: CorpusFormat,
    num_docs: usize,
}

impl RawCorpus {
    /// Open a corpus and count its documents. Fails with the offending
    /// path when the file cannot be read.
    pub fn open(path: impl AsRef<Path>, format: CorpusFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| CorpdiffError::io(&path, e))?;

        let mut lines = 0usize;
        for line in BufReader::new(file).lines() {
            line.map_err(|e| CorpdiffError::io(&path, e))?;
            lines += 1;
        }
        let num_docs = lines.saturating_sub(format.has_header as usize);

        info!("Found {} texts in {}", num_docs, path.display());
        Ok(Self {
            path,
            format,
            num_docs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &CorpusFormat {
        &self.format
    }

    /// Number of document lines (header excluded)
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Start a fresh pass over the corpus
    pub fn documents(&self) -> Result<Documents> {
        let file = File::open(&self.path).map_err(|e| CorpdiffError::io(&self.path, e))?;
        Ok(Documents {
            lines: BufReader::new(file).lines(),
            path: self.path.clone(),
            format: self.format,
            line_no: 0,
            seen_data: false,
            done: false,
        })
    }
}

/// Iterator over the documents of one corpus pass
pub struct Documents {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    format: CorpusFormat,
    line_no: usize,
    seen_data: bool,
    done: bool,
}

impl Iterator for Documents {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(CorpdiffError::io(&self.path, e)));
                }
            };
            self.line_no += 1;

            if self.line_no == 1 && self.format.has_header {
                debug!("Skipping header of {}", self.path.display());
                continue;
            }

            let first_data_line = !self.seen_data;
            self.seen_data = true;

            return Some(match parse_line(&line, &self.format) {
                Ok((id, words)) => Ok(RawDocument {
                    line: self.line_no,
                    id,
                    words,
                }),
                // A bad split on the very first record means the separators
                // are misconfigured, not that one record is broken.
                Err(reason) if first_data_line => {
                    self.done = true;
                    Err(CorpdiffError::AmbiguousColumns {
                        path: self.path.clone(),
                        reason,
                    })
                }
                Err(reason) => Err(CorpdiffError::MalformedDocument {
                    line: self.line_no,
                    reason,
                }),
            });
        }
    }
}
