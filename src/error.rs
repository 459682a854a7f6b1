/*
Errors raised while configuring or running a minimization.

Every variant is terminal for the run: nothing is retried, and a numeric
blow-up (two particles on top of each other) is not an error at all, it
simply shows up as an infinite or NaN energy.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinimizeError {
    #[error("unknown optimizer `{0}` (expected one of Adam, Adamax, RMSprop, SGD)")]
    UnknownOptimizer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}:{line}: `{token}` is not a valid mass")]
    InvalidMass {
        path: String,
        line: usize,
        token: String,
    },

    #[error("{path}:{line}: malformed position row")]
    InvalidPositions { path: String, line: usize },
}

pub type Result<T> = std::result::Result<T, MinimizeError>;

impl MinimizeError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        MinimizeError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
