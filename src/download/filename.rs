//! Artifact file naming.
//!
//! Display names are mostly CJK titles prefixed with the publisher edition.
//! They are kept readable: only characters that are unsafe in a path segment
//! on common file systems are replaced.

use std::path::{Path, PathBuf};

use super::constants::{ARTIFACT_EXTENSION, MAX_STEM_CHARS, PARTIAL_SUFFIX};

/// Makes `name` safe to use as a single path segment.
///
/// Reserved characters and control characters become `_`, runs of `_` are
/// collapsed, and leading/trailing dots and whitespace are trimmed. Returns an
/// empty string when nothing usable is left.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in name.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
            }
            prev_sep = true;
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace());
    trimmed.chars().take(MAX_STEM_CHARS).collect()
}

/// File name for a book: `<display name>.pdf`, or `Book_<id>.pdf` when the
/// display name sanitizes to nothing.
#[must_use]
pub fn artifact_file_name(display_name: &str, book_id: &str) -> String {
    let stem = sanitize_filename(display_name);
    let stem = if stem.is_empty() {
        sanitize_filename(&format!("Book_{book_id}"))
    } else {
        stem
    };
    format!("{stem}.{ARTIFACT_EXTENSION}")
}

/// In-flight path for `final_path`; renamed over the final path on success.
#[must_use]
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut os = final_path.as_os_str().to_os_string();
    os.push(PARTIAL_SUFFIX);
    PathBuf::from(os)
}
