//! Round-robin groups: rank distribution over every combination of match winners.
//!
//! Small groups are enumerated exactly. Larger groups are sampled with seeded
//! generators, one per chunk of trials, so results do not depend on thread count.

use crate::error::{PredictError, Result};
use crate::logic::pairing::Pairings;
use crate::logic::rating::RatingModel;
use crate::logic::series::{SeriesFormat, SeriesState};
use crate::models::{MatchReport, MedianResult, Player, Score, StandingsRow, StandingsTable};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound on matches for exact enumeration, whatever the configured group limit.
pub const MAX_EXACT_MATCHES: usize = 24;

const ENUMERATION_CHUNK: u64 = 1 << 12;
const SAMPLING_CHUNK: usize = 1 << 10;

/// A round-robin group: every entrant plays every other once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub players: Vec<Player>,
    pub format: SeriesFormat,
    /// Already-played scores, one per pairing in match order.
    pub partials: Vec<Score>,
    #[serde(default)]
    pub tiebreak: TiebreakPolicy,
}

impl Group {
    pub fn new(players: Vec<Player>, format: SeriesFormat) -> Result<Self> {
        if players.len() < 2 {
            return Err(PredictError::InvalidGroupSize(players.len()));
        }
        let matches = players.len() * (players.len() - 1) / 2;
        Ok(Self {
            players,
            format,
            partials: vec![Score::default(); matches],
            tiebreak: TiebreakPolicy::default(),
        })
    }

    pub fn with_tiebreak(self, tiebreak: TiebreakPolicy) -> Self {
        Self { tiebreak, ..self }
    }

    /// Pairings in match order: (0,1), (0,2), ..., (1,2), ...
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        pairs_of(self.players.len())
    }

    pub fn set_partial(&mut self, match_index: usize, score: Score) -> Result<()> {
        if match_index >= self.partials.len() {
            return Err(PredictError::InvalidSeriesState(format!(
                "group has no match {match_index}"
            )));
        }
        SeriesState::new(self.format, score)?;
        self.partials[match_index] = score;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let n = self.players.len();
        if n < 2 {
            return Err(PredictError::InvalidGroupSize(n));
        }
        if self.partials.len() != n * (n - 1) / 2 {
            return Err(PredictError::InvalidSeriesState(format!(
                "{} partial scores for {} matches",
                self.partials.len(),
                n * (n - 1) / 2
            )));
        }
        for partial in &self.partials {
            SeriesState::new(self.format, *partial)?;
        }
        Ok(())
    }
}

fn pairs_of(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

/// One realization of a group: who beat whom.
pub struct GroupOutcome {
    n: usize,
    wins: Vec<u32>,
    beat: Vec<bool>,
}

impl GroupOutcome {
    /// `a_won[k]` tells whether the first entrant of `pairs[k]` won.
    pub fn new(n: usize, pairs: &[(usize, usize)], a_won: impl Fn(usize) -> bool) -> Self {
        let mut wins = vec![0; n];
        let mut beat = vec![false; n * n];
        for (k, &(a, b)) in pairs.iter().enumerate() {
            let (w, l) = if a_won(k) { (a, b) } else { (b, a) };
            wins[w] += 1;
            beat[w * n + l] = true;
        }
        Self { n, wins, beat }
    }

    pub fn entrants(&self) -> usize {
        self.n
    }

    pub fn wins(&self, entrant: usize) -> u32 {
        self.wins[entrant]
    }

    pub fn beat(&self, winner: usize, loser: usize) -> bool {
        self.beat[winner * self.n + loser]
    }
}

/// Turns one realization into a ranking, best first.
pub trait Tiebreak: Send + Sync {
    fn rank(&self, outcome: &GroupOutcome) -> Vec<usize>;
}

/// Built-in tiebreak rules.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakPolicy {
    /// Match wins, then wins among the tied entrants. A smaller tie left over by the
    /// head-to-head count is broken again among its own members; a tie that does not
    /// shrink (a cycle) falls back to seed order.
    #[default]
    WinsHeadToHead,
    /// Match wins, then seed order.
    WinsThenSeed,
}

impl Tiebreak for TiebreakPolicy {
    fn rank(&self, outcome: &GroupOutcome) -> Vec<usize> {
        let mut order: Vec<usize> = (0..outcome.entrants()).collect();
        order.sort_by_key(|e| std::cmp::Reverse(outcome.wins(*e)));
        if *self == TiebreakPolicy::WinsThenSeed {
            return order;
        }

        for (start, end) in runs(&order, |e| outcome.wins(e) as usize) {
            if end - start > 1 {
                break_ties(&mut order[start..end], outcome);
            }
        }
        order
    }
}

/// Sort `tied` (in seed order) by wins against each other, then recurse into every
/// strictly smaller group that is still level.
fn break_ties(tied: &mut [usize], outcome: &GroupOutcome) {
    let members = tied.to_vec();
    let h2h = |e: usize| members.iter().filter(|o| outcome.beat(e, **o)).count();
    tied.sort_by_key(|e| std::cmp::Reverse(h2h(*e)));
    for (start, end) in runs(tied, h2h) {
        let len = end - start;
        if len > 1 && len < tied.len() {
            break_ties(&mut tied[start..end], outcome);
        }
    }
}

/// Half-open ranges of consecutive entrants sharing the same `key`.
fn runs(order: &[usize], key: impl Fn(usize) -> usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let k = key(order[start]);
        let end = order[start..]
            .iter()
            .position(|e| key(*e) != k)
            .map_or(order.len(), |off| start + off);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Ask `tiebreak` for a ranking and make sure it is a permutation of the entrants.
fn ranking(tiebreak: &dyn Tiebreak, outcome: &GroupOutcome) -> Result<Vec<usize>> {
    let n = outcome.entrants();
    let order = tiebreak.rank(outcome);
    let mut seen = vec![false; n];
    let permutation = order.len() == n
        && order
            .iter()
            .all(|&e| e < n && !std::mem::replace(&mut seen[e], true));
    if !permutation {
        return Err(PredictError::Config(format!(
            "tiebreak ranking {order:?} is not a permutation of {n} entrants"
        )));
    }
    Ok(order)
}

/// How the rank table was obtained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Enumeration {
    Exact { combinations: u64 },
    /// `error_bound`: 95% bound on the error of any single table cell.
    Sampled { trials: usize, seed: u64, error_bound: f64 },
}

/// One line of the median table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedianStanding {
    pub entrant: usize,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
}

/// Round-robin prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRobinPrediction {
    /// `probs[r]`: probability of finishing at rank `r` (0 is first).
    pub table: StandingsTable,
    /// Standings of the most likely realization, best first.
    pub mtable: Vec<MedianStanding>,
    pub matches: Vec<MatchReport>,
    pub meanres: Vec<MedianResult>,
    pub enumeration: Enumeration,
}

/// Rank counts (or probabilities) indexed `[entrant * n + rank]`.
struct RankAccumulator {
    n: usize,
    cells: Vec<f64>,
}

impl RankAccumulator {
    fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![0.0; n * n],
        }
    }

    fn record(&mut self, order: &[usize], weight: f64) {
        for (rank, e) in order.iter().enumerate() {
            self.cells[e * self.n + rank] += weight;
        }
    }

    fn merge(mut self, other: &RankAccumulator) -> Self {
        for (c, o) in self.cells.iter_mut().zip(&other.cells) {
            *c += o;
        }
        self
    }
}

pub fn simulate_round_robin(model: &RatingModel, group: &Group) -> Result<RoundRobinPrediction> {
    simulate_round_robin_with(model, group, &group.tiebreak)
}

/// Same as [`simulate_round_robin`] with a caller-supplied tiebreak.
pub fn simulate_round_robin_with(
    model: &RatingModel,
    group: &Group,
    tiebreak: &dyn Tiebreak,
) -> Result<RoundRobinPrediction> {
    group.validate()?;
    let n = group.players.len();
    let pairings = Pairings::new(model, &group.players)?;
    let pairs = group.pairs();
    let win: Vec<f64> = pairs
        .iter()
        .zip(&group.partials)
        .map(|(&(a, b), partial)| pairings.series_win(a, b, group.format, *partial))
        .collect::<Result<_>>()?;

    let config = model.config();
    let exact = n <= config.exact_group_limit && pairs.len() <= MAX_EXACT_MATCHES;
    let (ranks, enumeration) = if exact {
        let combinations = 1u64 << pairs.len();
        debug!("round robin: enumerating {combinations} combinations for {n} entrants");
        (enumerate(n, &pairs, &win, tiebreak)?, Enumeration::Exact { combinations })
    } else {
        warn!(
            "round robin: {n} entrants exceeds exact limit {}, sampling {} trials",
            config.exact_group_limit, config.trials
        );
        let error_bound = 1.96 * 0.5 / (config.trials as f64).sqrt();
        (
            sample(n, &pairs, &win, tiebreak, config.trials, config.seed)?,
            Enumeration::Sampled {
                trials: config.trials,
                seed: config.seed,
                error_bound,
            },
        )
    };

    let mut expected = vec![0.0; n];
    for (&(a, b), w) in pairs.iter().zip(&win) {
        expected[a] += w;
        expected[b] += 1.0 - w;
    }
    let rows = group
        .players
        .iter()
        .enumerate()
        .map(|(e, player)| {
            let mut row = StandingsRow::new(e, player.id, player.name.clone(), n);
            row.probs = ranks.cells[e * n..(e + 1) * n].to_vec();
            row.expected_wins = expected[e];
            row.expected_losses = (n - 1) as f64 - expected[e];
            row
        })
        .collect();

    let mut matches = Vec::with_capacity(pairs.len());
    let mut meanres = Vec::with_capacity(pairs.len());
    for (k, (&(a, b), partial)) in pairs.iter().zip(&group.partials).enumerate() {
        matches.push(pairings.report(k, a, b, group.format, *partial)?);
        meanres.push(pairings.median(k, a, b, group.format, *partial)?);
    }
    let mtable = median_table(group, &pairs, &meanres, tiebreak)?;

    Ok(RoundRobinPrediction {
        table: StandingsTable::new(rows),
        mtable,
        matches,
        meanres,
        enumeration,
    })
}

/// Exact: weight every combination of match winners by its probability.
/// Bit `k` of a combination is set when the first entrant of pair `k` wins.
fn enumerate(
    n: usize,
    pairs: &[(usize, usize)],
    win: &[f64],
    tiebreak: &dyn Tiebreak,
) -> Result<RankAccumulator> {
    let combinations = 1u64 << pairs.len();
    let chunks = combinations.div_ceil(ENUMERATION_CHUNK);
    let partials: Vec<RankAccumulator> = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut acc = RankAccumulator::new(n);
            let start = chunk * ENUMERATION_CHUNK;
            let end = (start + ENUMERATION_CHUNK).min(combinations);
            for combo in start..end {
                let a_won = |k: usize| combo >> k & 1 == 1;
                let weight: f64 = win
                    .iter()
                    .enumerate()
                    .map(|(k, w)| if a_won(k) { *w } else { 1.0 - w })
                    .product();
                if weight == 0.0 {
                    continue;
                }
                let outcome = GroupOutcome::new(n, pairs, a_won);
                acc.record(&ranking(tiebreak, &outcome)?, weight);
            }
            Ok(acc)
        })
        .collect::<Result<_>>()?;
    Ok(partials
        .iter()
        .fold(RankAccumulator::new(n), |acc, part| acc.merge(part)))
}

/// Monte Carlo: `trials` simulated groups, seeded per chunk.
fn sample(
    n: usize,
    pairs: &[(usize, usize)],
    win: &[f64],
    tiebreak: &dyn Tiebreak,
    trials: usize,
    seed: u64,
) -> Result<RankAccumulator> {
    let chunks = trials.div_ceil(SAMPLING_CHUNK);
    let partials: Vec<RankAccumulator> = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(chunk as u64));
            let mut acc = RankAccumulator::new(n);
            let count = SAMPLING_CHUNK.min(trials - chunk * SAMPLING_CHUNK);
            let mut draws = vec![false; pairs.len()];
            for _ in 0..count {
                for (d, w) in draws.iter_mut().zip(win) {
                    *d = rng.gen::<f64>() < *w;
                }
                let outcome = GroupOutcome::new(n, pairs, |k| draws[k]);
                acc.record(&ranking(tiebreak, &outcome)?, 1.0);
            }
            Ok(acc)
        })
        .collect::<Result<_>>()?;
    let mut total = partials
        .iter()
        .fold(RankAccumulator::new(n), |acc, part| acc.merge(part));
    for c in &mut total.cells {
        *c /= trials as f64;
    }
    Ok(total)
}

/// Standings of the realization where every match goes to its median score.
fn median_table(
    group: &Group,
    pairs: &[(usize, usize)],
    meanres: &[MedianResult],
    tiebreak: &dyn Tiebreak,
) -> Result<Vec<MedianStanding>> {
    let n = group.players.len();
    let outcome = GroupOutcome::new(n, pairs, |k| meanres[k].winner() == pairs[k].0);
    Ok(ranking(tiebreak, &outcome)?
        .into_iter()
        .map(|e| MedianStanding {
            entrant: e,
            name: group.players[e].name.clone(),
            wins: outcome.wins(e),
            losses: (n - 1) as u32 - outcome.wins(e),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_in_match_order() {
        assert_eq!(pairs_of(3), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn head_to_head_breaks_two_way_tie() {
        // 0 beats 1, 1 beats 2, 2 beats 0, 3 beats 1 and 2, 0 beats 3
        // wins: 0 -> 2, 1 -> 1, 2 -> 1, 3 -> 2. 3 and 0 tie; 0 beat 3.
        let pairs = pairs_of(4);
        let winners = [0, 2, 0, 1, 3, 3];
        let outcome = GroupOutcome::new(4, &pairs, |k| winners[k] == pairs[k].0);
        assert_eq!(outcome.wins(0), 2);
        assert_eq!(outcome.wins(3), 2);
        let order = TiebreakPolicy::WinsHeadToHead.rank(&outcome);
        assert_eq!(&order[..2], &[0, 3]);
        assert_eq!(&order[2..], &[1, 2]);
    }

    #[test]
    fn seed_order_breaks_cycle() {
        // Three-way cycle: everybody has one win and one head-to-head win.
        let pairs = pairs_of(3);
        let winners = [0, 2, 1];
        let outcome = GroupOutcome::new(3, &pairs, |k| winners[k] == pairs[k].0);
        assert_eq!(TiebreakPolicy::WinsHeadToHead.rank(&outcome), vec![0, 1, 2]);
    }

    #[test]
    fn head_to_head_rebreaks_smaller_ties() {
        // 0..=3 all win three. Among them 0 and 1 have two wins, 2 and 3 one,
        // and each of those pairs is then settled by its own game.
        let pairs = pairs_of(6);
        let beats = [
            (1, 0), (0, 2), (0, 3), (3, 2), (2, 1), (1, 3), (0, 4), (5, 0),
            (1, 4), (5, 1), (2, 4), (2, 5), (3, 4), (3, 5), (4, 5),
        ];
        let outcome = GroupOutcome::new(6, &pairs, |k| beats.contains(&pairs[k]));
        assert!((0..4).all(|e| outcome.wins(e) == 3));
        assert_eq!(
            TiebreakPolicy::WinsHeadToHead.rank(&outcome),
            vec![1, 0, 3, 2, 5, 4]
        );
        assert_eq!(
            TiebreakPolicy::WinsThenSeed.rank(&outcome),
            vec![0, 1, 2, 3, 5, 4]
        );
    }

    struct Constant;

    impl Tiebreak for Constant {
        fn rank(&self, outcome: &GroupOutcome) -> Vec<usize> {
            vec![0; outcome.entrants()]
        }
    }

    #[test]
    fn ranking_rejects_non_permutations() {
        let pairs = pairs_of(3);
        let outcome = GroupOutcome::new(3, &pairs, |_| true);
        assert!(matches!(ranking(&Constant, &outcome), Err(PredictError::Config(_))));
        assert_eq!(
            ranking(&TiebreakPolicy::WinsHeadToHead, &outcome).unwrap(),
            vec![0, 1, 2]
        );
    }
}
