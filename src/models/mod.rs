//! Data structures for predictions: players, ratings, scores, distributions and tables.

mod outcome;
mod player;
mod standings;

pub use outcome::{GameSlot, MatchResult, OutcomeDistribution, Score, Side, PROB_TOLERANCE};
pub use player::{Player, PlayerId, Race, Rating, RatingVector};
pub use standings::{MatchReport, MedianResult, StandingsRow, StandingsTable};
