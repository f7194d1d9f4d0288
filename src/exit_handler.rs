//! Exit code logic for the downloader process.
//!
//! Single responsibility: map a batch report to the process exit outcome.

use textbook_core::BatchReport;

use crate::ProcessExit;

/// Determines the process exit outcome from stored and failed book counts.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome for a finished run; an interrupted run never reports success.
pub(crate) fn exit_outcome_for_report(report: &BatchReport) -> ProcessExit {
    match determine_exit_outcome(report.succeeded(), report.failures.len()) {
        ProcessExit::Success if report.interrupted => ProcessExit::Partial,
        outcome => outcome,
    }
}
