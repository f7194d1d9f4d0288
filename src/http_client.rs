//! Shared HTTP client construction policy.
//!
//! Catalog, metadata and artifact clients all go through [`build_http_client`]
//! so they agree on timeouts, identity headers, compression and proxy handling.

use std::panic::{AssertUnwindSafe, catch_unwind, set_hook, take_hook};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tracing::warn;

use crate::user_agent::{self, BROWSER_USER_AGENT};

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeouts applied to every request issued by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Time allowed to establish a connection.
    pub connect: Duration,
    /// Time allowed for the whole request, body included.
    pub request: Duration,
}

impl HttpTimeouts {
    /// Creates timeouts from whole seconds.
    #[must_use]
    pub fn from_secs(connect_secs: u64, request_secs: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect_secs),
            request: Duration::from_secs(request_secs),
        }
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

/// Errors raised while building an HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// reqwest rejected the builder configuration.
    #[error("HTTP client construction failed for {component}: {source}")]
    Build {
        /// Component the client was built for (catalog, metadata, artifact).
        component: &'static str,
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The builder panicked even with system proxy lookup disabled.
    #[error("HTTP client construction panicked for {component}")]
    Panicked {
        /// Component the client was built for.
        component: &'static str,
    },
}

/// Builds an HTTP client using the shared policy.
///
/// Some sandboxed environments panic while reading system proxy settings; the
/// builder then retries once with system lookup disabled and env proxies only.
///
/// # Errors
///
/// Returns [`ClientBuildError`] when both build attempts fail.
pub fn build_http_client(
    component: &'static str,
    timeouts: HttpTimeouts,
) -> Result<Client, ClientBuildError> {
    match try_build_client(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(
                component,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ClientBuildError::Panicked { component }),
                Err(BuildClientFailure::Build(source)) => {
                    Err(ClientBuildError::Build { component, source })
                }
            }
        }
        Err(BuildClientFailure::Build(source)) => Err(ClientBuildError::Build { component, source }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

// `catch_unwind` does not suppress panic-hook output, so the hook is swapped
// out while a guarded build runs.
static CLIENT_BUILD_PANIC_HOOK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn try_build_client(
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let _guard = CLIENT_BUILD_PANIC_HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous_hook = take_hook();
    set_hook(Box::new(|_| {}));
    let outcome = catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }));
    set_hook(previous_hook);
    outcome.map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(user_agent::portal_headers())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
