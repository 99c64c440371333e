//! Corpus batch driver
//!
//! Re-scans a raw corpus, filters each document against a word list,
//! synthesizes its phrases and writes one output record per input line:
//!
//! ```text
//! <id>\t<phrase>|<phrase>|...
//! ```
//!
//! Documents are read sequentially in bounded batches, synthesized in
//! parallel with rayon, and written back in input order. A bad document
//! becomes an empty record; only corpus-level failures abort the pass.

mod filter;
mod observer;

pub use filter::{filter_tokens, load_word_list, FilterMode};
pub use observer::{BatchObserver, NoopObserver, TracingObserver};

use crate::corpus::{RawCorpus, RawDocument};
use crate::error::{CorpdiffError, Result};
use crate::models::{Document, Phrase, PositionedToken};
use crate::ngram::synthesize;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default number of documents synthesized per parallel batch
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Driver settings
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub mode: FilterMode,
    /// Joins phrases within an output record
    pub phrase_sep: String,
    pub batch_size: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            mode: FilterMode::Keep,
            phrase_sep: "|".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counters for one driver pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    /// Records written (one per input document)
    pub documents: usize,
    /// Documents filtered down to no tokens
    pub empty: usize,
    /// Lines that failed to split into columns
    pub malformed: usize,
    /// Documents rejected by the synthesizer
    pub invalid: usize,
    /// Phrases written across all records
    pub phrases: usize,
}

/// Result of processing a single document
#[derive(Debug)]
pub enum DocumentOutcome {
    Phrases(Vec<Phrase>),
    Empty,
    Invalid(CorpdiffError),
}

/// Applies a keep/remove word list to a corpus and writes its phrases
pub struct BatchDriver<'w> {
    words: &'w FxHashSet<String>,
    options: DriverOptions,
}

impl<'w> BatchDriver<'w> {
    pub fn new(words: &'w FxHashSet<String>, options: DriverOptions) -> Self {
        Self { words, options }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Apply the word list to a parsed line, keeping source positions
    pub fn filter_document(&self, doc: &RawDocument) -> Document {
        Document {
            id: doc.id.clone(),
            tokens: filter_tokens(doc.positioned(), self.words, self.options.mode),
        }
    }

    /// Filter and synthesize one document's positioned tokens
    pub fn synthesize_document(&self, tokens: Vec<PositionedToken>) -> DocumentOutcome {
        outcome_for(&filter_tokens(tokens, self.words, self.options.mode))
    }

    fn process(&self, doc: &RawDocument) -> DocumentOutcome {
        outcome_for(&self.filter_document(doc).tokens)
    }

    /// Run a pass and write records to `path`
    pub fn run_to_file(
        &self,
        corpus: &RawCorpus,
        path: &Path,
        observer: &mut impl BatchObserver,
    ) -> Result<DriverStats> {
        let file = File::create(path).map_err(|e| CorpdiffError::io(path, e))?;
        let stats = self.run_inner(corpus, BufWriter::new(file), path, observer)?;
        info!("Saved phrases to {}", path.display());
        Ok(stats)
    }

    /// Run a pass and write records to `out`
    pub fn run<W: Write>(
        &self,
        corpus: &RawCorpus,
        out: W,
        observer: &mut impl BatchObserver,
    ) -> Result<DriverStats> {
        self.run_inner(corpus, out, Path::new("<output>"), observer)
    }

    fn run_inner<W: Write>(
        &self,
        corpus: &RawCorpus,
        mut out: W,
        sink: &Path,
        observer: &mut impl BatchObserver,
    ) -> Result<DriverStats> {
        info!(
            "Cleaning texts of {} with method = {} ({} words in list)",
            corpus.path().display(),
            self.options.mode,
            self.words.len()
        );

        let batch_size = self.options.batch_size.max(1);
        let mut documents = corpus.documents()?;
        let mut stats = DriverStats::default();
        let write_err = |e: std::io::Error| CorpdiffError::io(sink, e);

        loop {
            let mut batch: Vec<Result<RawDocument>> = Vec::with_capacity(batch_size);
            for item in documents.by_ref() {
                match item {
                    Err(e) if e.is_fatal() => return Err(e),
                    item => batch.push(item),
                }
                if batch.len() == batch_size {
                    break;
                }
            }
            if batch.is_empty() {
                break;
            }

            // Indexed collect keeps input order
            let processed: Vec<Result<(RawDocument, DocumentOutcome)>> = batch
                .into_par_iter()
                .map(|item| {
                    item.map(|doc| {
                        let outcome = self.process(&doc);
                        (doc, outcome)
                    })
                })
                .collect();

            for item in processed {
                stats.documents += 1;
                match item {
                    Ok((doc, DocumentOutcome::Phrases(phrases))) => {
                        stats.phrases += phrases.len();
                        observer.on_document(doc.line, doc.id.as_deref(), phrases.len());
                        self.write_record(&mut out, doc.id.as_deref(), &phrases)
                            .map_err(write_err)?;
                    }
                    Ok((doc, DocumentOutcome::Empty)) => {
                        stats.empty += 1;
                        observer.on_empty(doc.line, doc.id.as_deref());
                        self.write_record(&mut out, doc.id.as_deref(), &[])
                            .map_err(write_err)?;
                    }
                    Ok((doc, DocumentOutcome::Invalid(e))) => {
                        stats.invalid += 1;
                        observer.on_invariant_violation(doc.line, doc.id.as_deref(), &e);
                        self.write_record(&mut out, doc.id.as_deref(), &[])
                            .map_err(write_err)?;
                    }
                    Err(e) => {
                        stats.malformed += 1;
                        observer.on_malformed(&e);
                        self.write_record(&mut out, None, &[]).map_err(write_err)?;
                    }
                }
            }
        }

        out.flush().map_err(write_err)?;
        observer.on_finish(&stats);
        Ok(stats)
    }

    fn write_record<W: Write>(
        &self,
        out: &mut W,
        id: Option<&str>,
        phrases: &[Phrase],
    ) -> std::io::Result<()> {
        write!(out, "{}\t", id.unwrap_or(""))?;
        for (k, phrase) in phrases.iter().enumerate() {
            if k > 0 {
                out.write_all(self.options.phrase_sep.as_bytes())?;
            }
            write!(out, "{}", phrase)?;
        }
        writeln!(out)
    }
}

fn outcome_for(kept: &[PositionedToken]) -> DocumentOutcome {
    if kept.is_empty() {
        return DocumentOutcome::Empty;
    }
    match synthesize(kept) {
        Ok(phrases) => DocumentOutcome::Phrases(phrases),
        Err(e) => DocumentOutcome::Invalid(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusFormat;

    #[derive(Default)]
    struct CountingObserver {
        documents: usize,
        empty: usize,
        malformed: usize,
        finished: bool,
    }

    impl BatchObserver for CountingObserver {
        fn on_document(&mut self, _line: usize, _id: Option<&str>, _phrases: usize) {
            self.documents += 1;
        }
        fn on_empty(&mut self, _line: usize, _id: Option<&str>) {
            self.empty += 1;
        }
        fn on_malformed(&mut self, _error: &CorpdiffError) {
            self.malformed += 1;
        }
        fn on_finish(&mut self, _stats: &DriverStats) {
            self.finished = true;
        }
    }

    fn corpus(dir: &tempfile::TempDir, contents: &str) -> RawCorpus {
        let path = dir.path().join("texts.tsv");
        std::fs::write(&path, contents).unwrap();
        RawCorpus::open(&path, CorpusFormat::default().with_header(false)).unwrap()
    }

    fn words(list: &[&str]) -> FxHashSet<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn run(
        corpus: &RawCorpus,
        words: &FxHashSet<String>,
        options: DriverOptions,
    ) -> (String, DriverStats, CountingObserver) {
        let driver = BatchDriver::new(words, options);
        let mut out = Vec::new();
        let mut observer = CountingObserver::default();
        let stats = driver.run(corpus, &mut out, &mut observer).unwrap();
        (String::from_utf8(out).unwrap(), stats, observer)
    }

    #[test]
    fn test_remove_mode_writes_phrases() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus(&dir, "1\tmost|cats|the|sleep\n");
        let options = DriverOptions {
            mode: FilterMode::Remove,
            ..Default::default()
        };
        let (text, stats, _) = run(&corpus, &words(&["the"]), options);
        assert_eq!(text, "1\tmost|cats|sleep|most cats|cats - sleep\n");
        assert_eq!(stats.phrases, 5);
    }

    #[test]
    fn test_all_bad_document_still_emits_record() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus(&dir, "1\tthe|and|in\n2\tcats|sleep\n");
        let options = DriverOptions {
            mode: FilterMode::Remove,
            ..Default::default()
        };
        let (text, stats, observer) = run(&corpus, &words(&["the", "and", "in"]), options);
        assert_eq!(text, "1\t\n2\tcats|sleep|cats sleep\n");
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.empty, 1);
        assert_eq!(observer.empty, 1);
        assert_eq!(observer.documents, 1);
        assert!(observer.finished);
    }

    #[test]
    fn test_keep_mode_and_output_order_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let lines: String = (0..25).map(|i| format!("{}\tapple|x|pear\n", i)).collect();
        let corpus = corpus(&dir, &lines);
        let options = DriverOptions {
            mode: FilterMode::Keep,
            phrase_sep: ";".to_string(),
            batch_size: 4,
        };
        let (text, stats, _) = run(&corpus, &words(&["apple", "pear"]), options);
        let records: Vec<&str> = text.lines().collect();
        assert_eq!(records.len(), 25);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(*record, format!("{}\tapple;pear;apple - pear", i));
        }
        assert_eq!(stats.documents, 25);
    }

    #[test]
    fn test_malformed_line_becomes_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus(&dir, "1\tcats|sleep\n2\tbad\tline\n3\tcats\n");
        let (text, stats, observer) =
            run(&corpus, &words(&["cats", "sleep"]), DriverOptions::default());
        assert_eq!(text, "1\tcats|sleep|cats sleep\n\t\n3\tcats\n");
        assert_eq!(stats.malformed, 1);
        assert_eq!(observer.malformed, 1);
    }

    #[test]
    fn test_ambiguous_first_line_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus(&dir, "cats|sleep\n2\tcats\n");
        let list = words(&["cats"]);
        let driver = BatchDriver::new(&list, DriverOptions::default());
        let mut out = Vec::new();
        let err = driver.run(&corpus, &mut out, &mut NoopObserver).unwrap_err();
        assert!(matches!(err, CorpdiffError::AmbiguousColumns { .. }));
    }

    #[test]
    fn test_invalid_positions_reported() {
        let list = words(&["a", "b"]);
        let driver = BatchDriver::new(&list, DriverOptions::default());
        let outcome = driver.synthesize_document(vec![
            PositionedToken::new("a", 3),
            PositionedToken::new("b", 3),
        ]);
        assert!(matches!(
            outcome,
            DocumentOutcome::Invalid(CorpdiffError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_documents_without_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, "most cats sleep\n").unwrap();
        let format = CorpusFormat {
            delimiter: None,
            word_sep: ' ',
            has_header: false,
        };
        let corpus = RawCorpus::open(&path, format).unwrap();
        let (text, _, _) =
            run(&corpus, &words(&["most", "cats", "sleep"]), DriverOptions::default());
        assert_eq!(text, "\tmost|cats|sleep|most cats|most - sleep|cats sleep\n");
    }

    #[test]
    fn test_filter_document_keeps_positions() {
        let list = words(&["most", "sleep"]);
        let driver = BatchDriver::new(&list, DriverOptions::default());
        let raw = RawDocument {
            line: 1,
            id: Some("7".to_string()),
            words: vec!["most".into(), "cats".into(), "sleep".into()],
        };
        let doc = driver.filter_document(&raw);
        assert_eq!(doc.id.as_deref(), Some("7"));
        assert_eq!(
            doc.tokens,
            vec![PositionedToken::new("most", 0), PositionedToken::new("sleep", 2)]
        );
    }

    #[test]
    fn test_header_line_is_not_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texts.tsv");
        std::fs::write(&path, "document_text\n1\tmost|cats\n").unwrap();
        let corpus = RawCorpus::open(&path, CorpusFormat::default()).unwrap();
        let (text, stats, _) = run(&corpus, &words(&["most", "cats"]), DriverOptions::default());
        assert_eq!(text, "1\tmost|cats|most cats\n");
        assert_eq!(stats.documents, corpus.num_docs());
    }
}
