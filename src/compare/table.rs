//! Significance table I/O
//!
//! One record per line, no header:
//!
//! ```text
//! apple,0.000,10,1
//! cat,0.097,5,19
//! ```

use crate::error::{CorpdiffError, Result};
use crate::models::{SignificanceResult, Token};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::Path;
use tracing::info;

/// Format a result as `token,p_value,df_a,df_b` (p-value to 3 decimals)
pub fn format_record(result: &SignificanceResult) -> String {
    format!(
        "{},{:.3},{},{}",
        result.token, result.p_value, result.df_a, result.df_b
    )
}

/// Write results in production order; returns the number of records
pub fn write_table<I, W>(results: I, mut out: W) -> std::io::Result<usize>
where
    I: IntoIterator<Item = SignificanceResult>,
    W: Write,
{
    let mut written = 0;
    for result in results {
        writeln!(out, "{}", format_record(&result))?;
        written += 1;
    }
    out.flush()?;
    info!("Wrote {} significance records", written);
    Ok(written)
}

/// Order results for reporting: ascending p-value, then descending df in corpus A
pub fn rank_results(results: &mut [SignificanceResult]) {
    results.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.df_a.cmp(&a.df_a))
            .then_with(|| a.token.cmp(&b.token))
    });
}

/// The leading `token, p_value` columns of a table line
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub token: Token,
    pub p_value: f64,
}

/// Parse the first two columns of a table line.
///
/// `delimiter = None` splits on whitespace.
pub fn parse_record(line: &str, delimiter: Option<char>, line_no: usize) -> Result<TableRecord> {
    let mut fields: Box<dyn Iterator<Item = &str> + '_> = match delimiter {
        Some(d) => Box::new(line.split(d)),
        None => Box::new(line.split_whitespace()),
    };

    let invalid = |reason: String| CorpdiffError::InvalidTable {
        line: line_no,
        reason,
    };

    let token = fields
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("missing token column".to_string()))?;
    let raw_p = fields
        .next()
        .ok_or_else(|| invalid("missing p-value column".to_string()))?;
    let p_value = raw_p
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("'{}' is not a p-value", raw_p.trim())))?;

    Ok(TableRecord {
        token: token.to_string(),
        p_value,
    })
}

/// Open a significance table and lazily yield tokens with `p <= threshold`.
///
/// Each call opens the file anew, so the sequence can be restarted.
pub fn words_below_threshold(
    path: impl AsRef<Path>,
    threshold: f64,
    delimiter: Option<char>,
) -> Result<WordsBelowThreshold<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CorpdiffError::io(path, e))?;
    info!(
        "Reading tokens from {} with pval <= {}",
        path.display(),
        threshold
    );
    Ok(WordsBelowThreshold::new(BufReader::new(file), threshold, delimiter))
}

/// Lazy reader over a significance table, see [`words_below_threshold`]
pub struct WordsBelowThreshold<R: BufRead> {
    lines: Lines<R>,
    threshold: f64,
    delimiter: Option<char>,
    line_no: usize,
}

impl<R: BufRead> WordsBelowThreshold<R> {
    pub fn new(reader: R, threshold: f64, delimiter: Option<char>) -> Self {
        Self {
            lines: reader.lines(),
            threshold,
            delimiter,
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for WordsBelowThreshold<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(CorpdiffError::InvalidTable {
                        line: self.line_no + 1,
                        reason: e.to_string(),
                    }))
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_record(&line, self.delimiter, self.line_no) {
                Ok(record) if record.p_value <= self.threshold => return Some(Ok(record.token)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{merge, JoinMode, SignificanceFilter};
    use crate::vocab::DocFreqIndex;
    use std::io::Cursor;

    fn result(token: &str, p_value: f64, df_a: usize, df_b: usize) -> SignificanceResult {
        SignificanceResult {
            token: token.to_string(),
            p_value,
            df_a,
            df_b,
        }
    }

    #[test]
    fn test_format_record() {
        assert_eq!(format_record(&result("cat", 0.09660, 5, 19)), "cat,0.097,5,19");
        assert_eq!(format_record(&result("apple", 1.2e-6, 10, 1)), "apple,0.000,10,1");
        assert_eq!(format_record(&result("bread", 1.0, 5, 10)), "bread,1.000,5,10");
    }

    #[test]
    fn test_write_table_from_filter() {
        // 20 docs in A, 40 in B; "apple" in 10/20 vs 1/40
        let mut docs_a: Vec<Vec<&str>> = vec![vec!["apple"]; 10];
        docs_a.extend(vec![vec!["pear"]; 10]);
        let mut docs_b: Vec<Vec<&str>> = vec![vec!["apple"]];
        docs_b.extend(vec![vec!["pear"]; 39]);

        let a = DocFreqIndex::from_documents(docs_a);
        let b = DocFreqIndex::from_documents(docs_b);
        let merged = merge(&a, &b, JoinMode::Outer);
        let filter = SignificanceFilter::new(&merged, 20, 40);

        let mut out = Vec::new();
        let written = write_table(filter.iter(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(written, 2);
        assert_eq!(text, "apple,0.000,10,1\npear,0.000,10,39\n");
    }

    #[test]
    fn test_words_below_threshold_keeps_order() {
        let table = "bread,1.000,5,10\napple,0.000,10,1\ncat,0.097,5,19\n";
        let all: Vec<String> = WordsBelowThreshold::new(Cursor::new(table), 1.0, Some(','))
            .map(|w| w.unwrap())
            .collect();
        assert_eq!(all, vec!["bread", "apple", "cat"]);

        let significant: Vec<String> = WordsBelowThreshold::new(Cursor::new(table), 0.1, Some(','))
            .map(|w| w.unwrap())
            .collect();
        assert_eq!(significant, vec!["apple", "cat"]);
    }

    #[test]
    fn test_words_below_threshold_whitespace() {
        let table = "bread\t1.000\napple\t0.000\n\ncat\t0.097\n";
        let words: Vec<String> = WordsBelowThreshold::new(Cursor::new(table), 0.5, None)
            .map(|w| w.unwrap())
            .collect();
        assert_eq!(words, vec!["apple", "cat"]);
    }

    #[test]
    fn test_invalid_record() {
        let table = "apple,0.000,10,1\ncat,abc,5,19\n";
        let items: Vec<Result<Token>> =
            WordsBelowThreshold::new(Cursor::new(table), 1.0, Some(',')).collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[1],
            Err(CorpdiffError::InvalidTable { line: 2, .. })
        ));
    }

    #[test]
    fn test_rank_results() {
        let mut results = vec![
            result("b", 0.2, 3, 1),
            result("a", 0.01, 2, 1),
            result("c", 0.01, 9, 1),
        ];
        rank_results(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
