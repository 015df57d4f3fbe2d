//! Errors raised by the prediction engine.

use thiserror::Error;

/// Errors that can occur while building or evaluating a prediction.
///
/// Every variant is an input-validation failure: the same input always fails
/// the same way, and no partial result is produced once one is raised.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PredictError {
    /// A rating component is NaN or infinite, or a probability is out of range.
    #[error("Invalid rating: {0}")]
    InvalidRating(String),
    /// A race tag outside P, T, Z and R (random).
    #[error("Unknown race: {0}")]
    UnknownRace(String),
    /// A partial score or series length that cannot exist.
    #[error("Invalid series state: {0}")]
    InvalidSeriesState(String),
    /// Bracket is not a full binary tree, or its shape does not match the entrants.
    #[error("Malformed bracket: {0}")]
    MalformedBracket(String),
    /// Round-robin group with fewer than two entrants.
    #[error("Invalid group size: need at least 2 entrants, got {0}")]
    InvalidGroupSize(usize),
    /// Query refers to a player missing from the roster.
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
    /// Configuration or roster data that cannot be parsed, or a tiebreak policy
    /// that does not return a ranking.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;
