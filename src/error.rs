//! Error types for index construction, configuration, and ensemble routing.
//!
//! Precondition violations on the hot paths (`insert`, `query`, the
//! optimizer) are not represented here: those panic, because continuing
//! with a truncated signature would silently corrupt band alignment.

use thiserror::Error;

/// Errors surfaced by fallible index operations
#[derive(Error, Debug)]
pub enum LshError {
    /// A construction parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No ensemble partition covers the given domain size
    #[error("No partition covers domain size {size}")]
    NoPartition { size: usize },

    /// Configuration could not be loaded or extracted
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Dedicated worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<figment::Error> for LshError {
    fn from(e: figment::Error) -> Self {
        LshError::Config(Box::new(e))
    }
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, LshError>;
