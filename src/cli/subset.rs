//! Subset command - keep the words of an offsets corpus within an offset range

use super::{sibling, stem};
use anyhow::{Context, Result};
use console::style;
use corpdiff::corpus::{subset_corpus, OffsetLayout, OffsetRange};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn run(
    corpus: &Path,
    range: OffsetRange,
    output: Option<&Path>,
    layout: OffsetLayout,
) -> Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling(corpus, format!("{}_subset.txt", stem(corpus))));
    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let stats = subset_corpus(corpus, layout, range, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} documents, {} words kept -> {}",
        style("✓").green(),
        style(stats.documents).bold(),
        stats.words,
        style(output.display()).cyan()
    );
    if stats.malformed > 0 {
        println!(
            "  {} {} malformed lines written as empty records",
            style("!").yellow(),
            stats.malformed
        );
    }
    Ok(())
}
