//! CLI output formatting and display helpers.

use std::collections::BTreeMap;

use textbook_core::{BatchReport, BookFailure, BookSuccess, ExportSummary};

use crate::failure::{self, FailureCategory, FailureDescriptor};

/// Formats a byte count as megabytes with one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// One line per stored book.
#[must_use]
pub fn success_line(success: &BookSuccess) -> String {
    format!(
        "✅ {}: {} ({}) -> {}",
        success.book,
        success.name,
        format_megabytes(success.bytes),
        success.path.display()
    )
}

/// One line per failed book, naming it by locator and name.
#[must_use]
pub fn failure_line(failure: &BookFailure) -> String {
    let first_line = failure.detail.lines().next().unwrap_or_default();
    format!(
        "❌ {}: {} - {} ({first_line})",
        failure.book,
        failure.name_or_unknown(),
        failure.reason
    )
}

/// Summary block printed after a run.
#[must_use]
pub fn summary_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.degraded {
        lines.push(
            "⚠️ Live catalog unreachable; used the configured fallback shard list (degraded mode)"
                .to_string(),
        );
    }

    lines.push(format!(
        "Downloaded {} of {} book(s)",
        report.succeeded(),
        report.attempted()
    ));

    if !report.skipped_shards.is_empty() {
        lines.push(format!(
            "Skipped {} unreachable shard(s): {:?}; sequence numbers after them may be shifted",
            report.skipped_shards.len(),
            report.skipped_shards
        ));
    }

    if !report.failures.is_empty() {
        lines.push(format!("Failed ({}):", report.failures.len()));
        for failure in &report.failures {
            lines.push(format!("  {}", failure_line(failure)));
        }
        lines.extend(failure_guidance_lines(&report.failures));
    }

    if report.interrupted {
        lines.push("Interrupted before the run finished.".to_string());
    }
    if let Some(resume) = &report.resume {
        lines.push(format!("Resume with: textbook-downloader {resume}"));
    }
    lines
}

/// What/why/fix guidance, one block per failure category.
fn failure_guidance_lines(failures: &[BookFailure]) -> Vec<String> {
    let mut grouped: BTreeMap<FailureCategory, (FailureDescriptor, usize)> = BTreeMap::new();
    for failure in failures {
        let descriptor = failure::describe_failure(failure);
        grouped
            .entry(descriptor.category)
            .or_insert((descriptor, 0))
            .1 += 1;
    }

    let mut lines = Vec::new();
    for (category, (descriptor, count)) in grouped {
        lines.push(format!(
            "{} {} ({count}): {}",
            category.icon(),
            category.label(),
            descriptor.what
        ));
        lines.push(format!("    why: {}", descriptor.why));
        lines.push(format!("    fix: {}", descriptor.fix));
    }
    lines
}

/// Prints per-book lines and the summary to stdout.
pub fn print_report(report: &BatchReport) {
    for success in &report.successes {
        println!("{}", success_line(success));
    }
    for line in summary_lines(report) {
        println!("{line}");
    }
}

/// Summary printed after a catalog export.
#[must_use]
pub fn export_summary_lines(summary: &ExportSummary, path: &std::path::Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Exported {} book(s) to {}",
        summary.rows,
        path.display()
    )];
    if !summary.skipped_shards.is_empty() {
        lines.push(format!(
            "Skipped {} unreachable shard(s): {:?}; numbering after them is shifted",
            summary.skipped_shards.len(),
            summary.skipped_shards
        ));
    }
    if !summary.malformed_numbers.is_empty() {
        lines.push(format!(
            "Omitted {} malformed catalog entry(ies) at number(s) {:?}",
            summary.malformed_numbers.len(),
            summary.malformed_numbers
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use textbook_core::{BookRef, FailureReason, Locator};

    fn success(bytes: u64) -> BookSuccess {
        BookSuccess {
            book: BookRef::Sequence(4),
            name: "义务教育教科书·数学一年级上册".to_string(),
            path: PathBuf::from("/books/math.pdf"),
            bytes,
            rank: 1,
        }
    }

    fn failure() -> BookFailure {
        BookFailure {
            book: BookRef::Sequence(7),
            name: Some("语文".to_string()),
            reason: FailureReason::AllEndpointsFailed,
            detail: "all 2 endpoint(s) failed for 语文: rank 1: timed out; rank 2: HTTP 404"
                .to_string(),
        }
    }

    #[test]
    fn test_format_megabytes_one_decimal() {
        assert_eq!(format_megabytes(0), "0.0 MB");
        assert_eq!(format_megabytes(1_572_864), "1.5 MB");
        assert_eq!(format_megabytes(25 * 1024 * 1024), "25.0 MB");
    }

    #[test]
    fn test_success_line_names_book_and_size() {
        let line = success_line(&success(3 * 1024 * 1024));
        assert!(line.contains("Sequence 4"));
        assert!(line.contains("数学一年级上册"));
        assert!(line.contains("3.0 MB"));
    }

    #[test]
    fn test_failure_line_names_locator_name_and_reason() {
        let line = failure_line(&failure());
        assert!(line.contains("Sequence 7"));
        assert!(line.contains("语文"));
        assert!(line.contains("all endpoints failed"));
    }

    #[test]
    fn test_failure_line_uses_unknown_without_name() {
        let mut failure = failure();
        failure.name = None;
        failure.detail = "first\n  Suggestion: second".to_string();
        let line = failure_line(&failure);
        assert!(line.contains("unknown"));
        assert!(!line.contains("Suggestion"));
    }

    #[test]
    fn test_summary_lists_failures_and_resume_hint() {
        let report = BatchReport {
            successes: vec![success(10)],
            failures: vec![failure()],
            interrupted: true,
            resume: Some(Locator::range(9, 12)),
            ..BatchReport::default()
        };
        let lines = summary_lines(&report);
        assert!(lines.contains(&"Downloaded 1 of 2 book(s)".to_string()));
        assert!(lines.iter().any(|line| line.contains("Network (1)")));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Resume with: textbook-downloader range 9-12")
        );
    }

    #[test]
    fn test_summary_marks_degraded_and_skipped_shards() {
        let report = BatchReport {
            degraded: true,
            skipped_shards: vec![2],
            ..BatchReport::default()
        };
        let lines = summary_lines(&report);
        assert!(lines[0].contains("degraded"));
        assert!(lines.iter().any(|line| line.contains("Skipped 1 unreachable shard(s): [2]")));
    }

    #[test]
    fn test_export_summary_lines() {
        let summary = ExportSummary {
            rows: 12,
            ..ExportSummary::default()
        };
        let lines = export_summary_lines(&summary, std::path::Path::new("/tmp/out.csv"));
        assert_eq!(lines, vec!["Exported 12 book(s) to /tmp/out.csv".to_string()]);
    }

    #[test]
    fn test_export_summary_lists_malformed_numbers() {
        let summary = ExportSummary {
            rows: 4,
            malformed_numbers: vec![2, 7],
            ..ExportSummary::default()
        };
        let lines = export_summary_lines(&summary, std::path::Path::new("out.csv"));
        assert_eq!(
            lines[1],
            "Omitted 2 malformed catalog entry(ies) at number(s) [2, 7]"
        );
    }
}
