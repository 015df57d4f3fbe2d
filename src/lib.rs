//! Outcome prediction for rated competitive play: library with models and engine logic.
//!
//! Ratings go in, single-game probabilities come out of [`RatingModel`], and those feed
//! series, bracket, dual, round-robin and team-match predictions. Everything is a pure
//! function of its inputs.

pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod roster;

pub use config::ModelConfig;
pub use error::{PredictError, Result};
pub use logic::{
    predict, predict_proleague, predict_series, predict_series_games, predict_team_match,
    series_win_probability, simulate_bracket, simulate_dual, simulate_round_robin,
    simulate_round_robin_with, AceGame, Bracket, BracketNode, BracketPrediction, Dual,
    DualPrediction, Enumeration, GameReport, Group, GroupOutcome, MatchPrediction, Meeting,
    MedianStanding, NodeId, Occupant, Prediction, PredictionRequest, Proleague,
    ProleaguePrediction, RatingModel, RoundRobinPrediction, SeriesFormat, SeriesPrediction,
    SeriesState, SingleMatch, Tiebreak, TiebreakPolicy, DUAL_ENTRANTS, DUAL_MATCHES,
    MAX_EXACT_MATCHES, PLACEMENTS,
};
pub use models::{
    GameSlot, MatchReport, MatchResult, MedianResult, OutcomeDistribution, Player, PlayerId,
    Race, Rating, RatingVector, Score, Side, StandingsRow, StandingsTable,
    PROB_TOLERANCE,
};
pub use roster::{PredictQuery, QueryKind, Roster, ScoreUpdate};
