//! Request dispatch: one tagged request in, one structure-specific result out.

use crate::error::Result;
use crate::logic::bracket::{simulate_bracket, Bracket, BracketPrediction};
use crate::logic::dual::{simulate_dual, Dual, DualPrediction};
use crate::logic::proleague::{predict_proleague, Proleague, ProleaguePrediction};
use crate::logic::rating::RatingModel;
use crate::logic::round_robin::{simulate_round_robin, Group, RoundRobinPrediction};
use crate::logic::series::{predict_series, SeriesFormat};
use crate::models::{OutcomeDistribution, Player, Score};
use log::debug;
use serde::{Deserialize, Serialize};

/// A single series between two players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleMatch {
    pub a: Player,
    pub b: Player,
    pub format: SeriesFormat,
    #[serde(default)]
    pub partial: Score,
}

/// Single series prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub player_a: String,
    pub player_b: String,
    /// Effective rating of A against B.
    pub rta: f64,
    /// Effective rating of B against A.
    pub rtb: f64,
    pub sca: u32,
    pub scb: u32,
    pub proba: f64,
    pub probb: f64,
    pub outcomes: OutcomeDistribution<Score>,
    /// Median final score.
    pub meanres: Score,
}

/// What to predict.
#[derive(Clone, Debug)]
pub enum PredictionRequest {
    SingleMatch(SingleMatch),
    Bracket(Bracket),
    Dual(Dual),
    RoundRobin(Group),
    Proleague(Proleague),
}

/// Result for each kind of request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Prediction {
    SingleMatch(MatchPrediction),
    Bracket(BracketPrediction),
    Dual(DualPrediction),
    RoundRobin(RoundRobinPrediction),
    Proleague(ProleaguePrediction),
}

/// Evaluate a request. Pure: the same model and request always give the same result.
pub fn predict(model: &RatingModel, request: &PredictionRequest) -> Result<Prediction> {
    match request {
        PredictionRequest::SingleMatch(m) => {
            debug!("predicting {} vs {}", m.a.name, m.b.name);
            predict_single(model, m).map(Prediction::SingleMatch)
        }
        PredictionRequest::Bracket(b) => {
            debug!("predicting bracket of {} entrants", b.players().len());
            simulate_bracket(model, b).map(Prediction::Bracket)
        }
        PredictionRequest::Dual(d) => simulate_dual(model, d).map(Prediction::Dual),
        PredictionRequest::RoundRobin(g) => {
            debug!("predicting group of {} entrants", g.players.len());
            simulate_round_robin(model, g).map(Prediction::RoundRobin)
        }
        PredictionRequest::Proleague(p) => predict_proleague(model, p).map(Prediction::Proleague),
    }
}

fn predict_single(model: &RatingModel, m: &SingleMatch) -> Result<MatchPrediction> {
    let rta = model.effective_rating(&m.a.rating, m.a.race, &m.b.rating, m.b.race)?;
    let rtb = model.effective_rating(&m.b.rating, m.b.race, &m.a.rating, m.a.race)?;
    let p = model.game_probability(&m.a, &m.b)?;
    let series = predict_series(p, m.format, m.partial)?;
    Ok(MatchPrediction {
        player_a: m.a.name.clone(),
        player_b: m.b.name.clone(),
        rta,
        rtb,
        sca: m.partial.a,
        scb: m.partial.b,
        proba: series.proba,
        probb: series.probb,
        meanres: series.median_score(),
        outcomes: series.outcomes,
    })
}
