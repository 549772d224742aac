//! Error types for the planner

use std::fmt;
use std::path::PathBuf;

/// Result type alias for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Which of the two compared trees a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Error type for planning operations
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A root passed to the planner is missing or not a directory
    #[error("invalid {side} dir '{path}': {message}")]
    InvalidRoot {
        side: Side,
        path: PathBuf,
        message: String,
    },

    /// A directory (or one of its entries) could not be read
    #[error("cannot list '{path}': {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A right entry is in the way and deleting it is not permitted
    #[error("cannot remove '{right}' in right to make room for '{left}'")]
    DeletionRequired { left: PathBuf, right: PathBuf },

    /// Writing the plan failed
    #[error("failed to write plan: {0}")]
    Output(#[from] std::io::Error),

    /// Encoding an action failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlanError {
    /// Create a new invalid root error
    pub fn invalid_root(side: Side, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            side,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new listing error
    pub fn listing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Listing {
            path: path.into(),
            source,
        }
    }

    /// Create a new deletion-required error
    pub fn deletion_required(left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> Self {
        Self::DeletionRequired {
            left: left.into(),
            right: right.into(),
        }
    }
}
