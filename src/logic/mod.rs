//! Prediction engine: rating model, series, brackets, duals, groups and team matches.

mod bracket;
mod dual;
mod pairing;
mod proleague;
mod rating;
mod request;
mod round_robin;
mod series;

pub use bracket::{simulate_bracket, Bracket, BracketNode, BracketPrediction, Meeting, NodeId, Occupant};
pub use dual::{simulate_dual, Dual, DualPrediction, DUAL_ENTRANTS, DUAL_MATCHES, PLACEMENTS};
pub use proleague::{
    predict_proleague, predict_team_match, AceGame, GameReport, Proleague, ProleaguePrediction,
};
pub use rating::RatingModel;
pub use request::{predict, MatchPrediction, Prediction, PredictionRequest, SingleMatch};
pub use round_robin::{
    simulate_round_robin, simulate_round_robin_with, Enumeration, Group, GroupOutcome,
    MedianStanding, RoundRobinPrediction, Tiebreak, TiebreakPolicy, MAX_EXACT_MATCHES,
};
pub use series::{
    predict_series, predict_series_games, series_win_probability, SeriesFormat, SeriesPrediction,
    SeriesState,
};
