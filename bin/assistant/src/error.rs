//! Errors that stop the assistant from starting.

use std::fmt;

/// Startup errors.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The database could not be reached.
    Database { details: String },
    /// Database migrations failed.
    Migration { details: String },
    /// The language model gateway could not be built.
    Gateway { details: String },
    /// The travel data file could not be used.
    TravelData { details: String },
    /// The terminal could not be read or written.
    Io { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database unavailable: {details}"),
            Self::Migration { details } => write!(f, "database migration failed: {details}"),
            Self::Gateway { details } => write!(f, "language model unavailable: {details}"),
            Self::TravelData { details } => write!(f, "travel data unavailable: {details}"),
            Self::Io { details } => write!(f, "terminal error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_stage() {
        let err = StartupError::Migration {
            details: "relation already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "database migration failed: relation already exists"
        );
    }
}
