//! Words command - tokens of a significance table under a p-value threshold

use anyhow::{Context, Result};
use corpdiff::compare::words_below_threshold;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn run(table: &Path, threshold: f64, delimiter: Option<char>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for token in words_below_threshold(table, threshold, delimiter)? {
        let token = token.with_context(|| format!("Failed to read {}", table.display()))?;
        writeln!(out, "{}", token)?;
    }
    out.flush()?;
    Ok(())
}
