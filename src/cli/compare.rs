//! Compare command - significance table of a target corpus against a filter corpus

use super::{build_index, sibling, stem, Bounds};
use anyhow::{Context, Result};
use console::style;
use corpdiff::compare::{merge, write_table, JoinMode, SignificanceFilter, Thresholds};
use corpdiff::corpus::CorpusFormat;
use corpdiff::vocab::VocabularyIndex;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Machine-readable summary printed with `--json`
#[derive(Debug, Serialize)]
struct CompareSummary {
    target: PathBuf,
    filter: PathBuf,
    output: PathBuf,
    join: JoinMode,
    thresholds: Thresholds,
    target_documents: usize,
    filter_documents: usize,
    merged_tokens: usize,
    significant_tokens: usize,
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    target: &Path,
    filter: &Path,
    output: Option<&Path>,
    join: JoinMode,
    thresholds: Thresholds,
    json: bool,
    format: CorpusFormat,
    bounds: Bounds,
) -> Result<()> {
    let index_a = build_index(target, format, bounds)?;
    let index_b = build_index(filter, format, bounds)?;

    let merged = merge(&index_a, &index_b, join);
    let significance = SignificanceFilter::new(
        &merged,
        index_a.total_documents(),
        index_b.total_documents(),
    )
    .with_thresholds(thresholds);

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        sibling(
            target,
            format!("{}_{}_df-ttest.txt", stem(target), stem(filter)),
        )
    });
    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let written = write_table(&significance, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if json {
        let summary = CompareSummary {
            target: target.to_path_buf(),
            filter: filter.to_path_buf(),
            output,
            join,
            thresholds,
            target_documents: index_a.total_documents(),
            filter_documents: index_b.total_documents(),
            merged_tokens: merged.len(),
            significant_tokens: written,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} {} of {} tokens significant ({} vs {} documents) -> {}",
            style("✓").green(),
            style(written).bold(),
            merged.len(),
            index_a.total_documents(),
            index_b.total_documents(),
            style(output.display()).cyan()
        );
    }
    Ok(())
}
