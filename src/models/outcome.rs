//! Scores, game slots and outcome distributions.

use serde::{Deserialize, Serialize};

/// Tolerance for "sums to one" checks.
pub const PROB_TOLERANCE: f64 = 1e-9;

/// Which side of a pairing won.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Games won by each side.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn games(&self) -> u32 {
        self.a + self.b
    }

    /// Score seen from the other side.
    pub fn swapped(&self) -> Self {
        Self { a: self.b, b: self.a }
    }

    /// Record one more game for `side`.
    pub fn add(&self, side: Side) -> Self {
        match side {
            Side::A => Self { a: self.a + 1, b: self.b },
            Side::B => Self { a: self.a, b: self.b + 1 },
        }
    }
}

/// Final result of a match that can end level.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    AWins,
    BWins,
    Draw,
}

/// One game of a series or team match: either already played or still to predict.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSlot {
    Played(Side),
    /// Probability that side A wins this game.
    ToPredict(f64),
}

/// Probability mass over a set of outcomes, kept in insertion order.
///
/// Insertion order is the traversal order of whatever produced it, so two runs over
/// the same input yield identical vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for OutcomeDistribution<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq + Clone> OutcomeDistribution<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribution with all mass on one outcome.
    pub fn certain(outcome: K) -> Self {
        Self {
            entries: vec![(outcome, 1.0)],
        }
    }

    /// Add `prob` to `outcome`, inserting it at the end if new.
    pub fn add(&mut self, outcome: K, prob: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == outcome) {
            Some((_, p)) => *p += prob,
            None => self.entries.push((outcome, prob)),
        }
    }

    pub fn probability(&self, outcome: &K) -> f64 {
        self.entries
            .iter()
            .find(|(k, _)| k == outcome)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().fold(0.0, |acc, (_, p)| acc + p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(k, p)| (k, *p))
    }

    /// Total mass of outcomes matching `pred`.
    /// Mass of the outcomes matching `pred`; `0.0` (never `-0.0`) when none do.
    pub fn mass_where(&self, pred: impl Fn(&K) -> bool) -> f64 {
        self.entries
            .iter()
            .filter(|(k, _)| pred(k))
            .fold(0.0, |acc, (_, p)| acc + p)
    }

    /// True if the probabilities sum to one within [`PROB_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= PROB_TOLERANCE
    }

    /// Rescale so the probabilities sum to one. No-op on an empty or zero-mass distribution.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total > 0.0 {
            for (_, p) in &mut self.entries {
                *p /= total;
            }
        }
    }

    /// Drop outcomes at or below `threshold`, then renormalize.
    /// Returns how many outcomes were dropped.
    pub fn prune(&mut self, threshold: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, p)| *p > threshold);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.normalize();
        }
        dropped
    }

    /// Outcome with the highest probability; first one wins ties.
    pub fn mode(&self) -> Option<&K> {
        let mut best: Option<(&K, f64)> = None;
        for (k, p) in &self.entries {
            if best.map_or(true, |(_, bp)| *p > bp) {
                best = Some((k, *p));
            }
        }
        best.map(|(k, _)| k)
    }

    pub fn into_entries(self) -> Vec<(K, f64)> {
        self.entries
    }
}
