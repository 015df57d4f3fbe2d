//! Standings and placement tables produced by the composite simulators.

use crate::models::outcome::{Score, PROB_TOLERANCE};
use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// One entrant's row in a probability table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    /// Position of the entrant in the input list (seed order).
    pub entrant: usize,
    pub player: PlayerId,
    pub name: String,
    /// `probs[k]`: probability of finishing at rank/placement/round `k`.
    pub probs: Vec<f64>,
    /// Expected match wins (round-robin only, zero elsewhere).
    #[serde(default)]
    pub expected_wins: f64,
    /// Expected match losses (round-robin only, zero elsewhere).
    #[serde(default)]
    pub expected_losses: f64,
}

impl StandingsRow {
    pub fn new(entrant: usize, player: PlayerId, name: impl Into<String>, columns: usize) -> Self {
        Self {
            entrant,
            player,
            name: name.into(),
            probs: vec![0.0; columns],
            expected_wins: 0.0,
            expected_losses: 0.0,
        }
    }

    pub fn row_sum(&self) -> f64 {
        self.probs.iter().sum()
    }
}

/// Ordered rows of per-entrant probabilities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsTable {
    pub rows: Vec<StandingsRow>,
}

impl StandingsTable {
    pub fn new(rows: Vec<StandingsRow>) -> Self {
        Self { rows }
    }

    pub fn row(&self, entrant: usize) -> Option<&StandingsRow> {
        self.rows.iter().find(|r| r.entrant == entrant)
    }

    pub fn column_sum(&self, column: usize) -> f64 {
        self.rows
            .iter()
            .map(|r| r.probs.get(column).copied().unwrap_or(0.0))
            .sum()
    }

    /// Every row and every column sums to one (a permutation table).
    pub fn is_doubly_stochastic(&self) -> bool {
        let n = self.rows.len();
        self.rows
            .iter()
            .all(|r| (r.row_sum() - 1.0).abs() <= PROB_TOLERANCE)
            && (0..n).all(|c| (self.column_sum(c) - 1.0).abs() <= PROB_TOLERANCE)
    }
}

/// A single predicted match between two known entrants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Position of this match in the structure's match order.
    pub match_index: usize,
    pub entrant_a: usize,
    pub entrant_b: usize,
    pub player_a: String,
    pub player_b: String,
    /// Partial score already played.
    pub partial: Score,
    pub proba: f64,
    pub probb: f64,
    /// Exact final scores with probabilities.
    pub outcomes: Vec<(Score, f64)>,
}

/// One match of the median realization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedianResult {
    pub match_index: usize,
    pub entrant_a: usize,
    pub entrant_b: usize,
    pub player_a: String,
    pub player_b: String,
    pub score: Score,
}

impl MedianResult {
    pub fn winner(&self) -> usize {
        if self.score.a > self.score.b {
            self.entrant_a
        } else {
            self.entrant_b
        }
    }

    pub fn loser(&self) -> usize {
        if self.score.a > self.score.b {
            self.entrant_b
        } else {
            self.entrant_a
        }
    }
}
