//! Constants for artifact validation and persistence.

/// Smallest body accepted as a real textbook PDF (about 1 MB).
///
/// Error pages served with 200 OK are a few kilobytes at most.
pub const DEFAULT_MIN_ARTIFACT_BYTES: u64 = 1_000_000;

/// Substring the `Content-Type` header must contain (case-insensitive).
pub const DEFAULT_CONTENT_TYPE_MARKER: &str = "pdf";

/// Extension of persisted artifacts.
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// Suffix appended to the final path while a transfer is in flight.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Longest file stem kept from a display name, in characters.
pub const MAX_STEM_CHARS: usize = 120;
