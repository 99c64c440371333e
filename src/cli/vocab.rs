//! Vocab command - document frequencies of one corpus

use super::{build_index, sibling, stem, Bounds};
use anyhow::{Context, Result};
use console::style;
use corpdiff::corpus::CorpusFormat;
use corpdiff::vocab::VocabularyIndex;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn run(
    corpus: &Path,
    output: Option<&Path>,
    format: CorpusFormat,
    bounds: Bounds,
) -> Result<()> {
    let index = build_index(corpus, format, bounds)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling(corpus, format!("{}_dfs-all.txt", stem(corpus))));
    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    index
        .write_dfs(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} tokens over {} documents -> {}",
        style("✓").green(),
        style(index.len()).bold(),
        index.total_documents(),
        style(output.display()).cyan()
    );
    Ok(())
}
