//! Pairwise game probabilities shared by the composite simulators.

use crate::error::Result;
use crate::logic::rating::RatingModel;
use crate::logic::series::{predict_series, series_win_probability, SeriesFormat, SeriesPrediction};
use crate::models::{MatchReport, MedianResult, Player, Score};

/// Single-game probabilities for every ordered pair of entrants, computed once up front
/// so invalid ratings fail before any aggregation starts. Every pair is needed: in a
/// knockout bracket any two entrants can meet at their lowest common match.
pub(crate) struct Pairings<'a> {
    players: &'a [Player],
    games: Vec<f64>,
}

impl<'a> Pairings<'a> {
    pub fn new(model: &RatingModel, players: &'a [Player]) -> Result<Self> {
        let n = players.len();
        let mut games = vec![0.5; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let p = model.game_probability(&players[i], &players[j])?;
                games[i * n + j] = p;
                games[j * n + i] = 1.0 - p;
            }
        }
        Ok(Self { players, games })
    }

    /// Probability that `a` beats `b` in one game.
    pub fn game(&self, a: usize, b: usize) -> f64 {
        self.games[a * self.players.len() + b]
    }

    /// Probability that `a` wins the series against `b` from `partial` (scored a:b).
    pub fn series_win(&self, a: usize, b: usize, format: SeriesFormat, partial: Score) -> Result<f64> {
        series_win_probability(self.game(a, b), format, partial)
    }

    pub fn series(&self, a: usize, b: usize, format: SeriesFormat, partial: Score) -> Result<SeriesPrediction> {
        predict_series(self.game(a, b), format, partial)
    }

    pub fn report(
        &self,
        match_index: usize,
        a: usize,
        b: usize,
        format: SeriesFormat,
        partial: Score,
    ) -> Result<MatchReport> {
        let prediction = self.series(a, b, format, partial)?;
        Ok(MatchReport {
            match_index,
            entrant_a: a,
            entrant_b: b,
            player_a: self.players[a].name.clone(),
            player_b: self.players[b].name.clone(),
            partial,
            proba: prediction.proba,
            probb: prediction.probb,
            outcomes: prediction.outcomes.into_entries(),
        })
    }

    /// The match `a` vs `b` resolved at its median score.
    pub fn median(
        &self,
        match_index: usize,
        a: usize,
        b: usize,
        format: SeriesFormat,
        partial: Score,
    ) -> Result<MedianResult> {
        let score = self.series(a, b, format, partial)?.median_score();
        Ok(MedianResult {
            match_index,
            entrant_a: a,
            entrant_b: b,
            player_a: self.players[a].name.clone(),
            player_b: self.players[b].name.clone(),
            score,
        })
    }
}
