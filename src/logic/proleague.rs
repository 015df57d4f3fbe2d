//! Team matches of a fixed number of individual games, which can end drawn.
//!
//! An odd lineup of three or more games ends with an ace game. The ace is only played
//! from a tie, so while it is unplayed the prediction covers the regular games alone and
//! a level score there is reported as a draw. With `n` regular games a team wins on
//! reaching `n / 2 + 1`; an even `n` draws at `n/2 : n/2`.

use crate::error::{PredictError, Result};
use crate::logic::rating::RatingModel;
use crate::logic::series::{check_probability, median, play_out};
use crate::models::{GameSlot, MatchResult, OutcomeDistribution, Player, Score, Side};
use log::debug;
use serde::{Deserialize, Serialize};

/// One game slot of a team match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AceGame {
    Played { a: Option<Player>, b: Option<Player>, winner: Side },
    Matchup { a: Player, b: Player },
}

/// A team match, games in playing order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Proleague {
    pub games: Vec<AceGame>,
}

impl Proleague {
    pub fn new(games: Vec<AceGame>) -> Self {
        Self { games }
    }

    /// Lineup of `(team A player, team B player)` pairs, the first `score.a + score.b`
    /// of which are already played with team A taking `score.a` of them.
    pub fn with_score(lineup: Vec<(Player, Player)>, score: Score) -> Result<Self> {
        if score.games() as usize > lineup.len() {
            return Err(PredictError::InvalidSeriesState(format!(
                "score {}:{} exceeds {} games",
                score.a,
                score.b,
                lineup.len()
            )));
        }
        let games = lineup
            .into_iter()
            .enumerate()
            .map(|(k, (a, b))| {
                let k = k as u32;
                if k < score.a {
                    AceGame::Played { a: Some(a), b: Some(b), winner: Side::A }
                } else if k < score.games() {
                    AceGame::Played { a: Some(a), b: Some(b), winner: Side::B }
                } else {
                    AceGame::Matchup { a, b }
                }
            })
            .collect();
        Ok(Self { games })
    }
}

/// Prediction for one game of the team match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub game: usize,
    pub player_a: Option<String>,
    pub player_b: Option<String>,
    pub proba: f64,
    pub probb: f64,
    pub played: bool,
}

/// Team match prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProleaguePrediction {
    pub proba: f64,
    pub probb: f64,
    pub prob_draw: f64,
    /// Score from the games already played.
    pub partial: Score,
    /// Final scores ordered from A's best result to B's best.
    pub outcomes: OutcomeDistribution<Score>,
    pub games: Vec<GameReport>,
    /// Median final score.
    pub meanres: Score,
}

impl ProleaguePrediction {
    pub fn result_probability(&self, result: MatchResult) -> f64 {
        match result {
            MatchResult::AWins => self.proba,
            MatchResult::BWins => self.probb,
            MatchResult::Draw => self.prob_draw,
        }
    }
}

pub fn predict_proleague(model: &RatingModel, league: &Proleague) -> Result<ProleaguePrediction> {
    let mut slots = Vec::with_capacity(league.games.len());
    let mut games = Vec::with_capacity(league.games.len());
    for (k, game) in league.games.iter().enumerate() {
        let (slot, report) = match game {
            AceGame::Played { a, b, winner } => (
                GameSlot::Played(*winner),
                GameReport {
                    game: k,
                    player_a: a.as_ref().map(|p| p.name.clone()),
                    player_b: b.as_ref().map(|p| p.name.clone()),
                    proba: if *winner == Side::A { 1.0 } else { 0.0 },
                    probb: if *winner == Side::B { 1.0 } else { 0.0 },
                    played: true,
                },
            ),
            AceGame::Matchup { a, b } => {
                let p = model.game_probability(a, b)?;
                (
                    GameSlot::ToPredict(p),
                    GameReport {
                        game: k,
                        player_a: Some(a.name.clone()),
                        player_b: Some(b.name.clone()),
                        proba: p,
                        probb: 1.0 - p,
                        played: false,
                    },
                )
            }
        };
        slots.push(slot);
        games.push(report);
    }

    let mut prediction = predict_team_match(&slots)?;
    prediction.games = games;
    Ok(prediction)
}

/// Team match straight from game slots.
pub fn predict_team_match(slots: &[GameSlot]) -> Result<ProleaguePrediction> {
    let regular = match slots {
        [rest @ .., GameSlot::ToPredict(p)] if slots.len() >= 3 && slots.len() % 2 == 1 => {
            check_probability(*p)?;
            rest
        }
        _ => slots,
    };
    let played = play_out(regular)?;
    let target = regular.len() as u32 / 2 + 1;
    let result_of = |s: &Score| {
        if s.a == target {
            MatchResult::AWins
        } else if s.b == target {
            MatchResult::BWins
        } else {
            MatchResult::Draw
        }
    };
    let outcomes = played.outcomes;
    let proba = outcomes.mass_where(|s| result_of(s) == MatchResult::AWins);
    let probb = outcomes.mass_where(|s| result_of(s) == MatchResult::BWins);
    let prob_draw = outcomes.mass_where(|s| result_of(s) == MatchResult::Draw);
    debug!(
        "team match over {} of {} games from {}:{}: {proba:.4}/{prob_draw:.4}/{probb:.4}",
        regular.len(),
        slots.len(),
        played.partial.a,
        played.partial.b
    );

    Ok(ProleaguePrediction {
        proba,
        probb,
        prob_draw,
        partial: played.partial,
        meanres: median(&outcomes).unwrap_or(played.partial),
        outcomes,
        games: Vec::new(),
    })
}
