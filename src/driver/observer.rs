//! Batch observer hooks
//!
//! The driver reports per-document events through a [`BatchObserver`]
//! instead of logging directly, so callers decide where events go.

use super::DriverStats;
use crate::error::CorpdiffError;
use tracing::{debug, info, warn};

/// Receives driver events. Every hook defaults to a no-op.
pub trait BatchObserver {
    /// A document was synthesized into `phrases` phrases
    fn on_document(&mut self, _line: usize, _id: Option<&str>, _phrases: usize) {}

    /// A document was filtered down to nothing
    fn on_empty(&mut self, _line: usize, _id: Option<&str>) {}

    /// A line could not be split into columns
    fn on_malformed(&mut self, _error: &CorpdiffError) {}

    /// A document's positions broke the synthesizer's contract
    fn on_invariant_violation(&mut self, _line: usize, _id: Option<&str>, _error: &CorpdiffError) {}

    /// The pass finished
    fn on_finish(&mut self, _stats: &DriverStats) {}
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_document(&mut self, line: usize, id: Option<&str>, phrases: usize) {
        debug!(line, id = id.unwrap_or(""), phrases, "document synthesized");
    }

    fn on_empty(&mut self, line: usize, id: Option<&str>) {
        debug!(line, id = id.unwrap_or(""), "document filtered to empty");
    }

    fn on_malformed(&mut self, error: &CorpdiffError) {
        warn!("Skipping malformed document: {}", error);
    }

    fn on_invariant_violation(&mut self, line: usize, id: Option<&str>, error: &CorpdiffError) {
        warn!(line, id = id.unwrap_or(""), "Emitting empty record: {}", error);
    }

    fn on_finish(&mut self, stats: &DriverStats) {
        info!(
            "Processed {} documents: {} phrases, {} empty, {} malformed, {} invalid",
            stats.documents, stats.phrases, stats.empty, stats.malformed, stats.invalid
        );
    }
}
