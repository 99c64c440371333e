//! Ngrams command - run the batch driver over one corpus

use super::{sibling, stem};
use anyhow::{Context, Result};
use console::style;
use corpdiff::config::ProjectConfig;
use corpdiff::corpus::{CorpusFormat, RawCorpus};
use corpdiff::driver::{
    load_word_list, BatchDriver, BatchObserver, DriverOptions, DriverStats, FilterMode,
    TracingObserver,
};
use corpdiff::CorpdiffError;
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashSet;
use std::path::Path;
use std::time::Duration;

/// Create spinner progress style
fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg} [{pos} documents, {elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Ticks a spinner per document and forwards events to tracing
struct ProgressObserver {
    bar: ProgressBar,
    inner: TracingObserver,
}

impl ProgressObserver {
    fn new(message: String) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(create_spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            inner: TracingObserver,
        }
    }
}

impl BatchObserver for ProgressObserver {
    fn on_document(&mut self, line: usize, id: Option<&str>, phrases: usize) {
        self.bar.inc(1);
        self.inner.on_document(line, id, phrases);
    }

    fn on_empty(&mut self, line: usize, id: Option<&str>) {
        self.bar.inc(1);
        self.inner.on_empty(line, id);
    }

    fn on_malformed(&mut self, error: &CorpdiffError) {
        self.bar.inc(1);
        self.bar.suspend(|| self.inner.on_malformed(error));
    }

    fn on_invariant_violation(&mut self, line: usize, id: Option<&str>, error: &CorpdiffError) {
        self.bar.inc(1);
        self.bar
            .suspend(|| self.inner.on_invariant_violation(line, id, error));
    }

    fn on_finish(&mut self, stats: &DriverStats) {
        self.bar.finish_and_clear();
        self.inner.on_finish(stats);
    }
}

/// Synthesize the phrases of `corpus` into `output`, one record per document
pub(crate) fn synthesize_corpus(
    corpus: &Path,
    format: CorpusFormat,
    words: &FxHashSet<String>,
    mode: FilterMode,
    output: &Path,
    config: &ProjectConfig,
) -> Result<DriverStats> {
    let raw = RawCorpus::open(corpus, format)?;
    let options = DriverOptions {
        mode,
        phrase_sep: config.output.phrase_sep.clone(),
        batch_size: config.output.batch_size,
    };
    let driver = BatchDriver::new(words, options);
    let mut observer = ProgressObserver::new(format!("Synthesizing {}", corpus.display()));
    let stats = driver
        .run_to_file(&raw, output, &mut observer)
        .with_context(|| format!("Failed to synthesize phrases of {}", corpus.display()))?;
    Ok(stats)
}

/// Console summary of one driver pass
pub(crate) fn print_stats(stats: &DriverStats, output: &Path) {
    println!(
        "{} {} documents, {} phrases -> {}",
        style("✓").green(),
        style(stats.documents).bold(),
        stats.phrases,
        style(output.display()).cyan()
    );
    let skipped = stats.empty + stats.malformed + stats.invalid;
    if skipped > 0 {
        println!(
            "  {} {} empty records ({} filtered out, {} malformed, {} invalid)",
            style("!").yellow(),
            skipped,
            stats.empty,
            stats.malformed,
            stats.invalid
        );
    }
}

pub fn run(
    corpus: &Path,
    words: &Path,
    mode: FilterMode,
    output: Option<&Path>,
    format: CorpusFormat,
    config: &ProjectConfig,
) -> Result<()> {
    let word_list = load_word_list(words)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling(corpus, format!("{}_trigrams.txt", stem(corpus))));

    let stats = synthesize_corpus(corpus, format, &word_list, mode, &output, config)?;
    print_stats(&stats, &output);
    Ok(())
}
