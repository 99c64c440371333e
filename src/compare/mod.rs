//! Corpus comparison
//!
//! Merges the document frequencies of two corpora and finds the tokens
//! whose presence differs significantly between them:
//!
//! ```text
//! VocabularyIndex (A) ─┐
//!                      ├─ merge ─> MergedCore ─> SignificanceFilter ─> table
//! VocabularyIndex (B) ─┘
//! ```

mod merge;
mod significance;
mod table;

pub use merge::{merge, JoinMode, MergedCore};
pub use significance::{
    smoothed_ratio, test_token, SignificanceFilter, SignificantTokens, Thresholds, SMOOTHING,
};
pub use table::{
    format_record, parse_record, rank_results, words_below_threshold, write_table, TableRecord,
    WordsBelowThreshold,
};
