//! Opt-in `tracing` subscriber setup.
//!
//! The library itself only emits events; embedding applications call
//! [`init`] once (or install their own subscriber). `LSHFOREST_LOG`
//! overrides the configured level with any `EnvFilter` directive.

use crate::config::LoggingConfig;
use std::env;

/// Install a global fmt subscriber configured from `config`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    let level = env::var("LSHFOREST_LOG")
        .ok()
        .unwrap_or_else(|| config.level.clone());

    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let base = || {
        tracing_subscriber::fmt()
            .with_env_filter(filter.clone())
            .with_thread_names(true)
            .with_thread_ids(true)
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        Box::new(base().json().finish())
    } else {
        Box::new(base().compact().finish())
    };

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
