//! Best-of-N series: exact-score distribution and winner probability under partial information.
//!
//! Games are independent. A series of `n` slots is won by the first side to
//! `n / 2 + 1` games; with an even slot count, `n/2 : n/2` ends the match drawn.
//! Best-of-N series always have an odd count, so only team matches can draw.

use crate::error::{PredictError, Result};
use crate::models::{GameSlot, OutcomeDistribution, Score, Side};
use serde::{Deserialize, Serialize};

/// Series length. Only odd lengths exist; even lengths belong to drawable team matches.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SeriesFormat {
    best_of: u32,
}

impl SeriesFormat {
    /// Best-of-`n`; fails with `InvalidSeriesState` unless `n` is odd.
    pub fn best_of(n: u32) -> Result<Self> {
        if n == 0 || n % 2 == 0 {
            return Err(PredictError::InvalidSeriesState(format!(
                "series length must be odd, got {n}"
            )));
        }
        Ok(Self { best_of: n })
    }

    /// First to `wins` games.
    pub fn first_to(wins: u32) -> Result<Self> {
        if wins == 0 {
            return Err(PredictError::InvalidSeriesState("first to 0 games".into()));
        }
        Ok(Self {
            best_of: 2 * wins - 1,
        })
    }

    pub fn length(&self) -> u32 {
        self.best_of
    }

    /// Games a side must win to take the series.
    pub fn wins_needed(&self) -> u32 {
        self.best_of / 2 + 1
    }
}

impl TryFrom<u32> for SeriesFormat {
    type Error = PredictError;

    fn try_from(n: u32) -> Result<Self> {
        Self::best_of(n)
    }
}

impl From<SeriesFormat> for u32 {
    fn from(f: SeriesFormat) -> u32 {
        f.best_of
    }
}

/// A best-of-N series at some partial score.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SeriesState {
    pub format: SeriesFormat,
    pub partial: Score,
}

impl SeriesState {
    /// Fails with `InvalidSeriesState` if a side is past the win target or both have reached it.
    pub fn new(format: SeriesFormat, partial: Score) -> Result<Self> {
        let target = format.wins_needed();
        if partial.a > target || partial.b > target || (partial.a == target && partial.b == target) {
            return Err(PredictError::InvalidSeriesState(format!(
                "score {}:{} is impossible in a best-of-{}",
                partial.a,
                partial.b,
                format.length()
            )));
        }
        Ok(Self { format, partial })
    }

    /// Fold a played prefix of game slots into a partial score.
    pub fn from_games(format: SeriesFormat, games: &[GameSlot]) -> Result<Self> {
        let mut partial = Score::default();
        for slot in games {
            match slot {
                GameSlot::Played(side) => partial = partial.add(*side),
                GameSlot::ToPredict(_) => break,
            }
        }
        Self::new(format, partial)
    }

    /// Side that has already won, if any.
    pub fn decided(&self) -> Option<Side> {
        let target = self.format.wins_needed();
        if self.partial.a == target {
            Some(Side::A)
        } else if self.partial.b == target {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Games each side still needs.
    pub fn needed(&self) -> (u32, u32) {
        let target = self.format.wins_needed();
        (target - self.partial.a, target - self.partial.b)
    }
}

/// Predicted outcome of one series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPrediction {
    pub format: SeriesFormat,
    pub partial: Score,
    pub proba: f64,
    pub probb: f64,
    /// Final scores ordered from A's best result to B's best.
    pub outcomes: OutcomeDistribution<Score>,
}

impl SeriesPrediction {
    pub fn win_probability(&self, side: Side) -> f64 {
        match side {
            Side::A => self.proba,
            Side::B => self.probb,
        }
    }

    /// Score at which the cumulative distribution, from A's best result towards B's, reaches one half.
    pub fn median_score(&self) -> Score {
        median(&self.outcomes).unwrap_or(self.partial)
    }
}

/// Predict a best-of-N series where A wins each remaining game with probability `p_game`.
pub fn predict_series(p_game: f64, format: SeriesFormat, partial: Score) -> Result<SeriesPrediction> {
    check_probability(p_game)?;
    let state = SeriesState::new(format, partial)?;

    if let Some(side) = state.decided() {
        return Ok(SeriesPrediction {
            format,
            partial,
            proba: if side == Side::A { 1.0 } else { 0.0 },
            probb: if side == Side::B { 1.0 } else { 0.0 },
            outcomes: OutcomeDistribution::certain(partial),
        });
    }

    let mut slots = Vec::with_capacity(format.length() as usize);
    slots.extend(std::iter::repeat(GameSlot::Played(Side::A)).take(partial.a as usize));
    slots.extend(std::iter::repeat(GameSlot::Played(Side::B)).take(partial.b as usize));
    slots.resize(format.length() as usize, GameSlot::ToPredict(p_game));

    let played = play_out(&slots)?;
    Ok(prediction_from(format, played))
}

/// Predict a series given game by game. Played games must form a prefix; each unplayed
/// game carries its own probability.
pub fn predict_series_games(games: &[GameSlot]) -> Result<SeriesPrediction> {
    let format = SeriesFormat::best_of(games.len() as u32)?;
    let played = play_out(games)?;
    Ok(prediction_from(format, played))
}

fn prediction_from(format: SeriesFormat, played: PlayedOut) -> SeriesPrediction {
    let target = format.wins_needed();
    SeriesPrediction {
        format,
        partial: played.partial,
        proba: played.outcomes.mass_where(|s| s.a == target),
        probb: played.outcomes.mass_where(|s| s.b == target),
        outcomes: played.outcomes,
    }
}

/// Probability that A wins the series from a partial score, by the
/// negative-binomial recursion `W(i, j) = p W(i-1, j) + (1-p) W(i, j-1)`.
pub fn series_win_probability(p_game: f64, format: SeriesFormat, partial: Score) -> Result<f64> {
    check_probability(p_game)?;
    let state = SeriesState::new(format, partial)?;
    let (na, nb) = state.needed();
    Ok(win_recursion(p_game, na as usize, nb as usize))
}

/// `W(na, nb)` with `W(0, j) = 1` and `W(i, 0) = 0` for `i > 0`.
fn win_recursion(p: f64, na: usize, nb: usize) -> f64 {
    if na == 0 {
        return 1.0;
    }
    if nb == 0 {
        return 0.0;
    }
    let q = 1.0 - p;
    // row[j] holds W(i, j) for the current i.
    let mut row = vec![1.0; nb + 1];
    for _ in 1..=na {
        row[0] = 0.0;
        for j in 1..=nb {
            row[j] = p * row[j] + q * row[j - 1];
        }
    }
    row[nb]
}

/// Result of playing a slot sequence to the end.
pub(crate) struct PlayedOut {
    pub partial: Score,
    pub outcomes: OutcomeDistribution<Score>,
}

/// Forward recursion over game slots. States are scores; a state is absorbing once a
/// side reaches `len / 2 + 1` wins, or at `len/2 : len/2` when `len` is even.
pub(crate) fn play_out(slots: &[GameSlot]) -> Result<PlayedOut> {
    let len = slots.len() as u32;
    if len == 0 {
        return Err(PredictError::InvalidSeriesState("no games to play".into()));
    }
    let target = len / 2 + 1;
    let draw_at = (len % 2 == 0).then_some(len / 2);
    let finished = |s: &Score| s.a == target || s.b == target || draw_at.map_or(false, |h| s.a == h && s.b == h);

    let mut partial = Score::default();
    let mut prefix = 0;
    for slot in slots {
        match slot {
            GameSlot::Played(side) => {
                if finished(&partial) {
                    return Err(PredictError::InvalidSeriesState(format!(
                        "game {} played after the match ended at {}:{}",
                        prefix + 1,
                        partial.a,
                        partial.b
                    )));
                }
                partial = partial.add(*side);
                prefix += 1;
            }
            GameSlot::ToPredict(_) => break,
        }
    }
    for slot in &slots[prefix..] {
        match slot {
            GameSlot::Played(_) => {
                return Err(PredictError::InvalidSeriesState(
                    "played games must precede unplayed ones".into(),
                ))
            }
            GameSlot::ToPredict(p) => check_probability(*p)?,
        }
    }

    let mut outcomes = OutcomeDistribution::new();
    let mut frontier = vec![(partial, 1.0)];
    while !frontier.is_empty() {
        let mut next: Vec<(Score, f64)> = Vec::with_capacity(frontier.len() + 1);
        for (score, mass) in frontier {
            if finished(&score) {
                outcomes.add(score, mass);
                continue;
            }
            let p = match slots.get(score.games() as usize) {
                Some(GameSlot::ToPredict(p)) => *p,
                _ => {
                    return Err(PredictError::InvalidSeriesState(format!(
                        "no unplayed game after {}:{}",
                        score.a, score.b
                    )))
                }
            };
            for (succ, m) in [(score.add(Side::A), mass * p), (score.add(Side::B), mass * (1.0 - p))] {
                match next.iter_mut().find(|(s, _)| *s == succ) {
                    Some((_, acc)) => *acc += m,
                    None => next.push((succ, m)),
                }
            }
        }
        frontier = next;
    }

    let mut entries = outcomes.into_entries();
    entries.sort_by_key(|(s, _)| s.b as i64 - s.a as i64);
    let mut outcomes = OutcomeDistribution::new();
    for (score, prob) in entries {
        outcomes.add(score, prob);
    }

    Ok(PlayedOut { partial, outcomes })
}

/// Median of a score distribution ordered from A's best to B's best.
pub(crate) fn median(outcomes: &OutcomeDistribution<Score>) -> Option<Score> {
    let mut cumulative = 0.0;
    let mut last = None;
    for (score, p) in outcomes.iter() {
        cumulative += p;
        last = Some(*score);
        if cumulative >= 0.5 {
            return last;
        }
    }
    last
}

pub(crate) fn check_probability(p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(PredictError::InvalidRating(format!(
            "game probability must be in [0, 1], got {p}"
        )));
    }
    Ok(())
}
