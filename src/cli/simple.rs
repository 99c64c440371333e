//! Simple command - most frequent phrases of one corpus, no comparison

use super::ngrams::{print_stats, synthesize_corpus};
use super::{build_index, phrase_format, stem, Bounds};
use anyhow::{Context, Result};
use console::style;
use corpdiff::config::ProjectConfig;
use corpdiff::corpus::CorpusFormat;
use corpdiff::driver::FilterMode;
use corpdiff::vocab::{Bound, VocabularyIndex};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Phrases kept when no limit is configured
pub const DEFAULT_PHRASE_LIMIT: usize = 200;

pub fn run(
    corpus: &Path,
    out_dir: &Path,
    format: CorpusFormat,
    bounds: Bounds,
    config: &ProjectConfig,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    // The limit applies to phrases, not to the word vocabulary
    let limit = bounds.limit.unwrap_or(DEFAULT_PHRASE_LIMIT);
    let word_bounds = Bounds {
        limit: None,
        ..bounds
    };
    let words = build_index(corpus, format, word_bounds)?;

    let phrase_file = out_dir.join(format!("{}_trigrams.txt", stem(corpus)));
    let stats = synthesize_corpus(
        corpus,
        format,
        &words.token_set(),
        FilterMode::Keep,
        &phrase_file,
        config,
    )?;
    print_stats(&stats, &phrase_file);

    let phrases = build_index(
        &phrase_file,
        phrase_format(config)?,
        Bounds {
            min: Bound::Count(0),
            max: Bound::Fraction(1.0),
            limit: Some(limit),
        },
    )?;

    let top = out_dir.join(format!("top{}_trigrams.txt", limit));
    let file = File::create(&top).with_context(|| format!("Failed to create {}", top.display()))?;
    phrases
        .write_dfs(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", top.display()))?;

    println!(
        "{} top {} phrases -> {}",
        style("✓").green(),
        style(phrases.len()).bold(),
        style(top.display()).cyan()
    );
    Ok(())
}
