//! Significance filter over a merged core

use super::merge::MergedCore;
use crate::models::{MergedEntry, SignificanceResult, Token};
use crate::stats::{indicator_vector, ttest_ind};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use tracing::{debug, info};

/// Added to both document frequencies before taking their ratio,
/// so a token absent from one corpus does not divide by zero.
pub const SMOOTHING: f64 = 0.1;

/// Cut-offs a token has to pass to be yielded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum `df_a + df_b` before a test is run
    pub min_total_df: usize,
    /// Minimum smoothed frequency ratio of corpus A over corpus B
    pub min_ratio: f64,
    /// Maximum p-value (inclusive)
    pub max_pvalue: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_total_df: 10,
            min_ratio: 0.0,
            max_pvalue: 1.0,
        }
    }
}

/// `((df_a + ε) / n_a) / ((df_b + ε) / n_b)`
pub fn smoothed_ratio(entry: &MergedEntry, n_a: usize, n_b: usize) -> f64 {
    let scope_a = (entry.df_a as f64 + SMOOTHING) / n_a as f64;
    let scope_b = (entry.df_b as f64 + SMOOTHING) / n_b as f64;
    scope_a / scope_b
}

/// p-value of the presence/absence test for one token, `None` if degenerate
pub fn test_token(entry: &MergedEntry, n_a: usize, n_b: usize) -> Option<f64> {
    let sample_a = indicator_vector(entry.df_a, n_a);
    let sample_b = indicator_vector(entry.df_b, n_b);
    ttest_ind(&sample_a, &sample_b)
}

/// Tests every token of a merged core against two corpus sizes.
///
/// The filter holds no iteration state: each call to [`SignificanceFilter::iter`]
/// starts a fresh lazy pass.
#[derive(Debug, Clone)]
pub struct SignificanceFilter<'a> {
    merged: &'a MergedCore,
    n_a: usize,
    n_b: usize,
    thresholds: Thresholds,
}

impl<'a> SignificanceFilter<'a> {
    pub fn new(merged: &'a MergedCore, n_a: usize, n_b: usize) -> Self {
        Self {
            merged,
            n_a,
            n_b,
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Lazily yield the tokens that pass every threshold
    pub fn iter(&self) -> SignificantTokens<'a> {
        info!(
            "Conducting ttest on {} tokens, ignoring tokens with df < {} and mult < {}",
            self.merged.len(),
            self.thresholds.min_total_df,
            self.thresholds.min_ratio
        );
        SignificantTokens {
            entries: self.merged.iter(),
            n_a: self.n_a,
            n_b: self.n_b,
            thresholds: self.thresholds,
        }
    }

    /// Run the checks for a single token
    pub fn evaluate(&self, token: &str, entry: &MergedEntry) -> Option<SignificanceResult> {
        evaluate(token, entry, self.n_a, self.n_b, &self.thresholds)
    }
}

impl<'a> IntoIterator for &SignificanceFilter<'a> {
    type Item = SignificanceResult;
    type IntoIter = SignificantTokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn evaluate(
    token: &str,
    entry: &MergedEntry,
    n_a: usize,
    n_b: usize,
    thresholds: &Thresholds,
) -> Option<SignificanceResult> {
    if entry.total() < thresholds.min_total_df {
        return None;
    }
    // Present everywhere on both sides: nothing to discriminate
    if entry.df_a == n_a && entry.df_b == n_b {
        debug!("'{}' occurs in every document, skipped", token);
        return None;
    }

    let ratio = smoothed_ratio(entry, n_a, n_b);
    if ratio < thresholds.min_ratio {
        return None;
    }

    let Some(p_value) = test_token(entry, n_a, n_b) else {
        debug!("'{}' has an undefined p-value, skipped", token);
        return None;
    };
    if p_value > thresholds.max_pvalue {
        return None;
    }

    debug!("'{}' df=({}, {}) ratio={:.3} p={:.4}", token, entry.df_a, entry.df_b, ratio, p_value);
    Some(SignificanceResult {
        token: Token::from(token),
        p_value,
        df_a: entry.df_a,
        df_b: entry.df_b,
    })
}

/// Lazy pass over a merged core, see [`SignificanceFilter::iter`]
pub struct SignificantTokens<'a> {
    entries: btree_map::Iter<'a, Token, MergedEntry>,
    n_a: usize,
    n_b: usize,
    thresholds: Thresholds,
}

impl Iterator for SignificantTokens<'_> {
    type Item = SignificanceResult;

    fn next(&mut self) -> Option<Self::Item> {
        for (token, entry) in self.entries.by_ref() {
            if let Some(result) = evaluate(token, entry, self.n_a, self.n_b, &self.thresholds) {
                return Some(result);
            }
        }
        None
    }
}
