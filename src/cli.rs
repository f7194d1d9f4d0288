//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use textbook_core::{Cursor, Locator, LocatorError};

/// Resolve and download PDF textbooks from the sharded national catalog.
///
/// Books are addressed by identifier, by their global sequence number across
/// every catalog shard, by a range of sequence numbers, or by a legacy
/// shard/item cursor printed by an interrupted run.
#[derive(Parser, Debug)]
#[command(name = "textbook-downloader")]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory downloads are written to (default: ~/Downloads/textbook_download)
    #[arg(short = 'o', long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Pause between books in milliseconds (max 60000)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pause_ms: Option<u64>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Smallest response accepted as a real document, in bytes
    #[arg(long, global = true)]
    pub min_bytes: Option<u64>,

    /// Use the configured last-known shard list when the live catalog is unreachable
    #[arg(long, global = true)]
    pub allow_fallback_catalog: bool,

    /// Read defaults from this config file instead of the XDG location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download one book by its catalog identifier
    Id {
        /// Book identifier (UUID)
        book_id: String,
    },

    /// Download one book by its 1-based global sequence number
    Seq {
        /// Global sequence number
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },

    /// Download every book in an inclusive sequence range ("12-40" or "7")
    Range {
        /// START-END or a single number; reversed bounds are accepted
        #[arg(value_parser = parse_range_arg)]
        range: Locator,
    },

    /// Walk the catalog shard by shard from a legacy cursor
    Cursor {
        /// Zero-based shard to start at
        #[arg(long, default_value_t = 0)]
        table: usize,

        /// Zero-based item to start at inside the first shard
        #[arg(long, default_value_t = 0)]
        item: usize,

        /// Only download the book whose walk counter equals this value
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        single: Option<u64>,

        /// Stop after this many successful downloads
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },

    /// Write the whole catalog as a CSV of number, identifier and name
    Export {
        /// Output file (default: <output-dir>/textbook_info.csv)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn parse_range_arg(raw: &str) -> Result<Locator, LocatorError> {
    Locator::parse_range(raw)
}

impl Command {
    /// The locator this command retrieves, or `None` for `export`.
    #[must_use]
    pub fn locator(&self) -> Option<Locator> {
        match self {
            Self::Id { book_id } => Some(Locator::ById(book_id.clone())),
            Self::Seq { number } => Some(Locator::ByGlobalSequence(*number)),
            Self::Range { range } => Some(range.clone()),
            Self::Cursor {
                table,
                item,
                single,
                limit,
            } => Some(Locator::ByCursor(Cursor {
                shard_index: *table,
                intra_index: *item,
                single_index: *single,
                max_count: limit.map(|limit| usize::try_from(limit).unwrap_or(usize::MAX)),
            })),
            Self::Export { .. } => None,
        }
    }
}
