//! Error taxonomy for the generation and analysis pipeline.
//!
//! Configuration and argument errors are fatal to the calling operation and
//! surfaced to the CLI verbatim. Partial-failure conditions (duplicate
//! exhaustion, empty aggregates) are represented in output data instead —
//! see [`GenerationOutcome`](crate::generate::GenerationOutcome).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing persona weights, empty brand configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Out-of-range counts, ratios, or thresholds.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
