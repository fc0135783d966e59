//! Error types for Dexfinder

use thiserror::Error;

/// Result type alias using Dexfinder's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Dexfinder error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors (E100-E199)
    #[error("Catalog request failed: {0}. Check your connection or `catalog.base_url`.")]
    Transport(String),

    #[error("Network error: {0}. Check your internet connection.")]
    Network(#[from] reqwest::Error),

    #[error("Pokémon '{0}' not found in the catalog.")]
    EntityNotFound(String),

    #[error("Malformed catalog record: {0}")]
    InvalidRecord(String),

    // Search errors (E200-E299)
    #[error("Lookup was superseded by a newer search")]
    Cancelled,

    // Filter errors (E300-E399)
    #[error("Invalid filter criteria: {0}")]
    Validation(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E100",
            Self::Network(_) => "E101",
            Self::EntityNotFound(_) => "E102",
            Self::InvalidRecord(_) => "E103",
            Self::Cancelled => "E200",
            Self::Validation(_) => "E300",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some("dexfinder config get catalog.base_url".to_string()),
            Self::Network(_) => Some("Check internet connection".to_string()),
            Self::EntityNotFound(name) => Some(format!("dexfinder search {}", name)),
            Self::Validation(_) => Some("Ranges are inclusive and need min <= max".to_string()),
            Self::ConfigError(_) => Some("dexfinder config list".to_string()),
            _ => None,
        }
    }

    /// Whether this error belongs to the catalog transport class
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Network(_) | Self::EntityNotFound(_)
        )
    }

    /// Whether this error only signals that a lookup was superseded
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
