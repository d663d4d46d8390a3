// Error types for calculator construction.
//
// Two failure kinds exist: the embedding file can't be loaded (missing,
// unreadable, malformed, or dimensionally inconsistent), or the seed/exclude
// configuration leaves nothing valid to score. Everything downstream of a
// successfully constructed calculator reports through anyhow at the binary
// boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while building a `BiasCalculator`.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("failed to read embedding file {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed embedding record in {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type CalculatorResult<T> = Result<T, CalculatorError>;
