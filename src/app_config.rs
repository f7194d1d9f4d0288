//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// TOML-style file configuration for downloader defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// Pause between books in milliseconds.
    pub pause_ms: Option<u64>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Smallest response accepted as a real document.
    pub min_artifact_bytes: Option<u64>,
    /// Attempts for the shard-list fetch, including the first.
    pub catalog_retries: Option<u32>,
    /// Allow the last-known shard list when the live catalog is unreachable.
    pub allow_fallback_catalog: Option<bool>,
    /// Last-known shard endpoints for degraded mode.
    pub fallback_shards: Option<Vec<String>>,
    /// Catalog-version document URL override.
    pub catalog_version_url: Option<String>,
    /// Detail document base URL override.
    pub detail_base_url: Option<String>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(pause_ms) = self.pause_ms
            && pause_ms > 60_000
        {
            bail!("Invalid config value for `pause_ms`: {pause_ms}. Expected range: 0..=60000");
        }
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;

        if let Some(retries) = self.catalog_retries
            && !(1..=10).contains(&retries)
        {
            bail!("Invalid config value for `catalog_retries`: {retries}. Expected range: 1..=10");
        }

        for url in [&self.catalog_version_url, &self.detail_base_url]
            .into_iter()
            .flatten()
        {
            url::Url::parse(url).with_context(|| format!("Invalid URL in config: '{url}'"))?;
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Tracing level used when neither `RUST_LOG` nor CLI flags decide.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/textbook-downloader/config.toml`
/// 2. `$HOME/.config/textbook-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("textbook-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("textbook-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file named on the command line, or the default one if present.
///
/// An explicit path must exist; a missing default file yields an empty config.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_config_file(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "pause_ms" => cfg.pause_ms = Some(parse_integer_u64(value).with_context(invalid)?),
            "request_timeout_secs" => {
                cfg.request_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "min_artifact_bytes" => {
                cfg.min_artifact_bytes = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "catalog_retries" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("catalog_retries out of range for u32"))?;
                cfg.catalog_retries = Some(n);
            }
            "allow_fallback_catalog" => {
                cfg.allow_fallback_catalog = Some(parse_boolean(value).with_context(invalid)?);
            }
            "fallback_shards" => {
                cfg.fallback_shards = Some(parse_string_array(value).with_context(invalid)?);
            }
            "catalog_version_url" => {
                cfg.catalog_version_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "detail_base_url" => {
                cfg.detail_base_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

/// Parses `["a", "b"]` on a single line.
fn parse_string_array(raw_value: &str) -> Result<Vec<String>> {
    let Some(inner) = raw_value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        bail!("Expected array of double-quoted strings");
    };

    let mut items = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (index, ch) in inner.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ',' if !in_string => {
                items.push(&inner[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_string_literal)
        .collect()
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
