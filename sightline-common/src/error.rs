//! Common error types for Sightline

use thiserror::Error;
use uuid::Uuid;

/// Common result type for Sightline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of an [`Error`]
///
/// Transport layers map a kind to a response exactly once instead of
/// matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCoordinates,
    InvalidObservationTime,
    SightingTooClose,
    AnimalNotFound,
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Machine-readable code exposed to clients
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidCoordinates => "INVALID_COORDINATES",
            ErrorKind::InvalidObservationTime => "INVALID_OBSERVATION_TIME",
            ErrorKind::SightingTooClose => "SIGHTING_TOO_CLOSE",
            ErrorKind::AnimalNotFound => "ANIMAL_NOT_FOUND",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// True for rejections caused by the content of a sighting report
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidCoordinates
                | ErrorKind::InvalidObservationTime
                | ErrorKind::SightingTooClose
        )
    }
}

/// Common error types across Sightline crates
#[derive(Error, Debug)]
pub enum Error {
    /// Latitude or longitude out of range (or not finite)
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Observation time violates the temporal policy
    #[error("Invalid observation time: {0}")]
    InvalidObservationTime(String),

    /// Report lies closer than the minimum distance to the reference point
    #[error("New sighting is too close to the last known location ({distance_meters:.2} meters)")]
    SightingTooClose { distance_meters: f64 },

    /// Sighting submitted for an animal that does not exist
    #[error("Animal not found: {0}")]
    AnimalNotFound(Uuid),

    /// Requested resource not found (repository level)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unique constraint or similar conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure; the message is for logs only
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Build an [`Error::Internal`] from any displayable context
    pub fn internal(context: impl Into<String>) -> Self {
        Error::Internal(context.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidCoordinates(_) => ErrorKind::InvalidCoordinates,
            Error::InvalidObservationTime(_) => ErrorKind::InvalidObservationTime,
            Error::SightingTooClose { .. } => ErrorKind::SightingTooClose,
            Error::AnimalNotFound(_) => ErrorKind::AnimalNotFound,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Internal(_) | Error::Config(_) | Error::Io(_) => ErrorKind::Internal,
            #[cfg(feature = "sqlx")]
            Error::Database(_) => ErrorKind::Internal,
        }
    }
}
