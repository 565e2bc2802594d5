#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging setup for the generator.
//!
//! Library crates only emit `tracing` events; binaries call [`init`] once to
//! install a stderr subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable overriding the configured filter
pub const LOG_ENV: &str = "CLIENTGEN_LOG";

/// Whether `value` is a bare level rather than a full filter directive
pub fn is_plain_level(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "trace" | "debug" | "info" | "warn" | "error" | "off")
}

/// Resolve the effective filter directive.
///
/// `CLIENTGEN_LOG` wins over `configured`. A bare level applies to every
/// generator crate; anything else is used as a full directive.
pub fn filter_directive(configured: &str, env: Option<String>) -> String {
    let raw = env.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| configured.to_string());
    if is_plain_level(&raw) {
        let level = raw.to_ascii_lowercase();
        ["clientgen", "clientgen_cli", "analysis", "mapper", "builder", "codegen", "pipeline", "runtime"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        raw
    }
}

/// Install the stderr fmt subscriber. A second call only warns.
pub fn init(configured_level: &str) {
    let filter = filter_directive(configured_level, std::env::var(LOG_ENV).ok());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// Prints a trace message to stderr with module prefix.
pub fn trace(module: &str, msg: &str) {
    tracing::trace!(target: "clientgen", module, "{}", msg);
}
