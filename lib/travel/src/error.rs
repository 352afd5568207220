//! Error types for travel data access.

use std::fmt;

/// Errors from reading travel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// The data could not be read at all.
    Unreachable { source: String, reason: String },
    /// The stored records could not be decoded.
    Malformed { source: String, reason: String },
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { source, reason } => {
                write!(f, "travel data source '{source}' unreachable: {reason}")
            }
            Self::Malformed { source, reason } => {
                write!(f, "malformed travel records in '{source}': {reason}")
            }
        }
    }
}

impl std::error::Error for DataSourceError {}
