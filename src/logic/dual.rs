//! Dual tournament: four entrants, two advance.
//!
//! Matches, in match order:
//! 0. opening, entrants 0 vs 1
//! 1. opening, entrants 2 vs 3
//! 2. winners' match, winner of 0 vs winner of 1 (winner advances first)
//! 3. losers' match, loser of 0 vs loser of 1 (loser finishes fourth)
//! 4. decider, loser of 2 vs winner of 3 (winner advances second, loser finishes third)

use crate::error::{PredictError, Result};
use crate::logic::pairing::Pairings;
use crate::logic::rating::RatingModel;
use crate::logic::series::{SeriesFormat, SeriesState};
use crate::models::{
    MatchReport, MedianResult, OutcomeDistribution, Player, Score, StandingsRow, StandingsTable,
};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DUAL_ENTRANTS: usize = 4;
pub const DUAL_MATCHES: usize = 5;

/// Final placements, in table column order.
pub const PLACEMENTS: [&str; 4] = ["first", "second", "third", "fourth"];

/// A dual tournament group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dual {
    pub players: Vec<Player>,
    pub formats: [SeriesFormat; DUAL_MATCHES],
    #[serde(default)]
    pub partials: [Score; DUAL_MATCHES],
}

impl Dual {
    /// Every match played in the same format.
    pub fn new(players: Vec<Player>, format: SeriesFormat) -> Result<Self> {
        Self::with_formats(players, [format; DUAL_MATCHES])
    }

    pub fn with_formats(players: Vec<Player>, formats: [SeriesFormat; DUAL_MATCHES]) -> Result<Self> {
        let dual = Self {
            players,
            formats,
            partials: [Score::default(); DUAL_MATCHES],
        };
        dual.validate()?;
        Ok(dual)
    }

    pub fn set_partial(&mut self, match_index: usize, score: Score) -> Result<()> {
        let format = *self.formats.get(match_index).ok_or_else(|| {
            PredictError::MalformedBracket(format!("dual has no match {match_index}"))
        })?;
        SeriesState::new(format, score)?;
        self.partials[match_index] = score;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.players.len() != DUAL_ENTRANTS {
            return Err(PredictError::MalformedBracket(format!(
                "dual needs {DUAL_ENTRANTS} entrants, got {}",
                self.players.len()
            )));
        }
        for (format, partial) in self.formats.iter().zip(&self.partials) {
            SeriesState::new(*format, *partial)?;
        }
        Ok(())
    }
}

/// Dual prediction: placement table plus certain matches and median results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualPrediction {
    /// Columns follow [`PLACEMENTS`].
    pub table: StandingsTable,
    pub matches: Vec<MatchReport>,
    pub meanres: Vec<MedianResult>,
}

pub fn simulate_dual(model: &RatingModel, dual: &Dual) -> Result<DualPrediction> {
    dual.validate()?;
    let pairings = Pairings::new(model, &dual.players)?;
    let win = |m: usize, a: usize, b: usize| pairings.series_win(a, b, dual.formats[m], dual.partials[m]);

    let mut placement = [[0.0; DUAL_ENTRANTS]; DUAL_ENTRANTS];
    let mut pairs: Vec<OutcomeDistribution<(usize, usize)>> = vec![OutcomeDistribution::new(); DUAL_MATCHES];

    let openings = [(0, 1), (2, 3)];
    let mut opening_results = Vec::with_capacity(2);
    for (m, (a, b)) in openings.into_iter().enumerate() {
        let p = win(m, a, b)?;
        pairs[m].add((a, b), 1.0);
        opening_results.push([(a, b, p), (b, a, 1.0 - p)]);
    }

    for &(w0, l0, p0) in &opening_results[0] {
        for &(w1, l1, p1) in &opening_results[1] {
            let opening = p0 * p1;
            if opening == 0.0 {
                continue;
            }
            pairs[2].add((w0, w1), opening);
            pairs[3].add((l0, l1), opening);
            let pw = win(2, w0, w1)?;
            let pl = win(3, l0, l1)?;
            for (first, dropped, p2) in [(w0, w1, pw), (w1, w0, 1.0 - pw)] {
                for (survivor, fourth, p3) in [(l0, l1, pl), (l1, l0, 1.0 - pl)] {
                    let mass = opening * p2 * p3;
                    if mass == 0.0 {
                        continue;
                    }
                    pairs[4].add((dropped, survivor), mass);
                    let pd = win(4, dropped, survivor)?;
                    placement[first][0] += mass;
                    placement[dropped][1] += mass * pd;
                    placement[survivor][1] += mass * (1.0 - pd);
                    placement[survivor][2] += mass * pd;
                    placement[dropped][2] += mass * (1.0 - pd);
                    placement[fourth][3] += mass;
                }
            }
        }
    }

    let rows = dual
        .players
        .iter()
        .enumerate()
        .map(|(e, player)| {
            let mut row = StandingsRow::new(e, player.id, player.name.clone(), DUAL_ENTRANTS);
            row.probs = placement[e].to_vec();
            row
        })
        .collect();

    let mut matches = Vec::new();
    for (m, dist) in pairs.iter().enumerate() {
        if dist.len() == 1 && dist.is_normalized() {
            if let Some((&(a, b), _)) = dist.iter().next() {
                matches.push(pairings.report(m, a, b, dual.formats[m], dual.partials[m])?);
            }
        }
    }
    debug!("dual resolved: {} of {DUAL_MATCHES} pairings certain", matches.len());

    Ok(DualPrediction {
        table: StandingsTable::new(rows),
        matches,
        meanres: median_walk(dual, &pairings)?,
    })
}

fn median_walk(dual: &Dual, pairings: &Pairings) -> Result<Vec<MedianResult>> {
    let play = |m: usize, a: usize, b: usize| pairings.median(m, a, b, dual.formats[m], dual.partials[m]);
    let m0 = play(0, 0, 1)?;
    let m1 = play(1, 2, 3)?;
    let m2 = play(2, m0.winner(), m1.winner())?;
    let m3 = play(3, m0.loser(), m1.loser())?;
    let m4 = play(4, m2.loser(), m3.winner())?;
    Ok(vec![m0, m1, m2, m3, m4])
}
