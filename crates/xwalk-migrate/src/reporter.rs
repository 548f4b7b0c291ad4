//! User-facing progress reporting

use crate::pipeline::Stage;

/// Receives pipeline progress for display
///
/// Every method defaults to a no-op so front ends implement only what
/// they render.
pub trait Reporter {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage) {}

    /// The stage was skipped instead of finished
    fn stage_skipped(&self, _stage: Stage, _reason: &str) {}

    fn stage_failed(&self, _stage: Stage, _error: &crate::MigrateError) {}

    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
