//! Catalog export: one CSV row per book across every shard.
//!
//! The file starts with a UTF-8 byte-order mark so spreadsheet tools detect
//! the encoding of the CJK names. Numbering is 1-based and continuous across
//! shards, matching global sequence numbers when every shard is reachable.

use std::io::Write;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::catalog::{ShardEntry, ShardSet, ShardState};

/// Header row of the export.
pub const EXPORT_HEADER: [&str; 3] = ["Number", "Book ID", "Book Name"];

const UTF8_BOM: &str = "\u{feff}";

/// Errors raised while writing the export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The writer failed.
    #[error("failed to write catalog export: {0}")]
    Io(#[from] std::io::Error),
}

/// What an export covered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Rows written, header excluded.
    pub rows: u64,
    /// Shards that could not be fetched and were left out.
    pub skipped_shards: Vec<usize>,
    /// Numbers of malformed entries; their rows are omitted but the numbers
    /// stay reserved so later rows keep matching sequence numbers.
    pub malformed_numbers: Vec<u64>,
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    write!(writer, "{line}\r\n")
}

/// Walks every shard in order and writes `Number,Book ID,Book Name` rows.
///
/// Unreachable shards are skipped and reported, never counted as empty.
/// Malformed entries consume a number without producing a row.
///
/// # Errors
///
/// Returns [`ExportError::Io`] when the writer fails.
#[instrument(skip_all, fields(shards = shards.shard_count()))]
pub async fn write_catalog_csv<W: Write>(
    shards: &mut ShardSet<'_>,
    mut writer: W,
) -> Result<ExportSummary, ExportError> {
    writer.write_all(UTF8_BOM.as_bytes())?;
    write_row(&mut writer, &EXPORT_HEADER)?;

    let mut rows: u64 = 0;
    let mut number: u64 = 0;
    let mut malformed_numbers = Vec::new();
    for shard_index in 0..shards.shard_count() {
        let Some(ShardState::Loaded(entries)) = shards.load(shard_index).await else {
            continue;
        };
        for entry in entries {
            number += 1;
            let book = match entry {
                ShardEntry::Book(book) => book,
                ShardEntry::Malformed { reason } => {
                    warn!(number, shard_index, reason = %reason, "omitting malformed catalog entry");
                    malformed_numbers.push(number);
                    continue;
                }
            };
            rows += 1;
            let label = number.to_string();
            let name = book.display_name();
            write_row(&mut writer, &[label.as_str(), book.id.as_str(), name.as_str()])?;
        }
    }
    writer.flush()?;

    let skipped_shards = shards.unreachable_shards();
    info!(
        rows,
        skipped = skipped_shards.len(),
        malformed = malformed_numbers.len(),
        "catalog export written"
    );
    Ok(ExportSummary {
        rows,
        skipped_shards,
        malformed_numbers,
    })
}
