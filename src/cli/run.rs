//! Run command - the full filtered pipeline
//!
//! 1. Unigram significance table of target vs filter
//! 2. Words with p at or below the word threshold
//! 3. Phrases of both corpora, built from those words only
//! 4. Significance table of the phrases, ranked into `top_trigrams.txt`

use super::ngrams::{print_stats, synthesize_corpus};
use super::{build_index, phrase_format, stem, Bounds};
use anyhow::{Context, Result};
use console::style;
use corpdiff::compare::{
    merge, rank_results, words_below_threshold, write_table, JoinMode, SignificanceFilter,
    Thresholds,
};
use corpdiff::config::ProjectConfig;
use corpdiff::corpus::CorpusFormat;
use corpdiff::driver::FilterMode;
use corpdiff::models::SignificanceResult;
use corpdiff::vocab::{DocFreqIndex, VocabularyIndex};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Name of the ranked phrase table
pub const TOP_TRIGRAMS_FILE: &str = "top_trigrams.txt";

/// Pipeline thresholds
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Minimum documents per token across both corpora, for words and phrases
    pub min_docs: usize,
    pub word_pvalue: f64,
    pub min_ratio: f64,
    pub max_pvalue: f64,
}

impl Settings {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            min_docs: config.significance.min_total_df,
            word_pvalue: config.significance.word_pvalue,
            min_ratio: config.significance.phrase_min_ratio,
            max_pvalue: config.significance.phrase_max_pvalue,
        }
    }
}

fn write_dfs(index: &DocFreqIndex, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    index
        .write_dfs(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_results<I>(results: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = SignificanceResult>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(results, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn run(
    target: &Path,
    filter: &Path,
    out_dir: &Path,
    settings: Settings,
    format: CorpusFormat,
    config: &ProjectConfig,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let (target_stem, filter_stem) = (stem(target), stem(filter));

    // Words
    let words_a = build_index(target, format, Bounds::default())?;
    let words_b = build_index(filter, format, Bounds::default())?;
    write_dfs(&words_a, &out_dir.join(format!("{}_dfs-all.txt", target_stem)))?;
    write_dfs(&words_b, &out_dir.join(format!("{}_dfs-all.txt", filter_stem)))?;

    let merged = merge(&words_a, &words_b, JoinMode::Outer);
    let word_filter = SignificanceFilter::new(
        &merged,
        words_a.total_documents(),
        words_b.total_documents(),
    )
    .with_thresholds(Thresholds {
        min_total_df: settings.min_docs,
        ..Thresholds::default()
    });
    let ttest_file = out_dir.join(format!("{}_{}_df-ttest.txt", target_stem, filter_stem));
    write_results(&word_filter, &ttest_file)?;

    let sig_words = words_below_threshold(&ttest_file, settings.word_pvalue, Some(','))?
        .collect::<corpdiff::Result<FxHashSet<String>>>()
        .with_context(|| format!("Failed to read {}", ttest_file.display()))?;
    info!("List of {} sig words created", sig_words.len());

    // Phrases
    let target_phrases = out_dir.join(format!("{}_trigrams.txt", target_stem));
    let filter_phrases = out_dir.join(format!("{}_trigrams.txt", filter_stem));
    let stats =
        synthesize_corpus(target, format, &sig_words, FilterMode::Keep, &target_phrases, config)?;
    print_stats(&stats, &target_phrases);
    let stats =
        synthesize_corpus(filter, format, &sig_words, FilterMode::Keep, &filter_phrases, config)?;
    print_stats(&stats, &filter_phrases);

    let phrases = phrase_format(config)?;
    let phrases_a = build_index(&target_phrases, phrases, Bounds::default())?;
    let phrases_b = build_index(&filter_phrases, phrases, Bounds::default())?;
    let merged = merge(&phrases_a, &phrases_b, JoinMode::Outer);

    info!("Finding significant phrases using mult of {}", settings.min_ratio);
    let phrase_filter = SignificanceFilter::new(
        &merged,
        phrases_a.total_documents(),
        phrases_b.total_documents(),
    )
    .with_thresholds(Thresholds {
        min_total_df: settings.min_docs,
        min_ratio: settings.min_ratio,
        max_pvalue: settings.max_pvalue,
    });
    let mut ranked: Vec<SignificanceResult> = phrase_filter.iter().collect();
    rank_results(&mut ranked);

    let top = out_dir.join(TOP_TRIGRAMS_FILE);
    let written = write_results(ranked, &top)?;

    println!(
        "{} {} significant words, {} significant phrases -> {}",
        style("✓").green(),
        style(sig_words.len()).bold(),
        style(written).bold(),
        style(top.display()).cyan()
    );
    Ok(())
}
