//! Error types for every layer of the tracker

use thiserror::Error;

/// Rejected workout input, either from the entry form or from a stored record.
///
/// The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkoutError {
    #[error("{field} has to be a number")]
    NotANumber { field: &'static str },

    #[error("{field} has to be a positive number")]
    NotPositive { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("{field} has to be a whole number")]
    NotWhole { field: &'static str },

    #[error("coordinates out of range: {lat}, {lng}")]
    InvalidCoords { lat: f64, lng: f64 },
}

/// Blob store and serialization failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("value for '{key}' is {size} bytes, limit is {limit}")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },
}

/// One-shot position lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("position unavailable")]
    Unavailable,

    #[error("position request dropped before answering")]
    Dropped,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Why a form submission did not produce a saved workout.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no map location selected")]
    NoPendingLocation,

    #[error(transparent)]
    Invalid(#[from] WorkoutError),

    /// The workout was created but the collection could not be written.
    #[error("workout created but not saved: {0}")]
    Persist(#[source] StoreError),
}
