//! Rating roster loaded from CSV, and the compact query format that refers to it by name.

use crate::error::{PredictError, Result};
use crate::logic::{
    Bracket, Dual, Group, PredictionRequest, Proleague, SeriesFormat, SingleMatch,
    TiebreakPolicy, DUAL_MATCHES,
};
use crate::models::{Player, Race, Rating, RatingVector, Score};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One CSV row: `name,race,rating,dev,vp,dev_vp,vt,dev_vt,vz,dev_vz`.
#[derive(Debug, Deserialize)]
struct RosterRecord {
    name: String,
    race: String,
    rating: f64,
    #[serde(default)]
    dev: f64,
    #[serde(default)]
    vp: f64,
    #[serde(default)]
    dev_vp: f64,
    #[serde(default)]
    vt: f64,
    #[serde(default)]
    dev_vt: f64,
    #[serde(default)]
    vz: f64,
    #[serde(default)]
    dev_vz: f64,
}

impl RosterRecord {
    fn into_player(self) -> Result<Player> {
        let race: Race = self.race.parse()?;
        let rating = RatingVector {
            overall: Rating::new(self.rating, self.dev),
            vs_p: Rating::new(self.vp, self.dev_vp),
            vs_t: Rating::new(self.vt, self.dev_vt),
            vs_z: Rating::new(self.vz, self.dev_vz),
        };
        rating.validate()?;
        Ok(Player::new(self.name.trim(), race, rating))
    }
}

/// Players available to queries. Names are unique, case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: Vec<Player>) -> Result<Self> {
        let mut roster = Self::default();
        for p in players {
            roster.add(p)?;
        }
        Ok(roster)
    }

    pub fn add(&mut self, player: Player) -> Result<()> {
        if self.get(&player.name).is_ok() {
            return Err(PredictError::Config(format!(
                "duplicate player name {}",
                player.name
            )));
        }
        self.players.push(player);
        Ok(())
    }

    pub fn from_csv_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut roster = Self::default();
        for record in rdr.deserialize::<RosterRecord>() {
            let record = record.map_err(|e| PredictError::Config(e.to_string()))?;
            roster.add(record.into_player()?)?;
        }
        Ok(roster)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| PredictError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_csv_reader(file)
    }

    pub fn get(&self, name: &str) -> Result<&Player> {
        let name = name.trim();
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PredictError::UnknownPlayer(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Structure kind named by a query.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    SingleMatch,
    Bracket,
    Dual,
    RoundRobin,
    Proleague,
}

/// Already-played score of one match, by match index.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct ScoreUpdate {
    #[serde(rename = "match")]
    pub match_index: usize,
    pub a: u32,
    pub b: u32,
}

/// Compact prediction query.
///
/// - `single_match`: two players, one `bo`, update 0 is the partial score.
/// - `bracket`: `2^rounds` players in seed order (`null` for a bye), one `bo` per round or one for all.
/// - `dual`: four players, one `bo` per match or one for all.
/// - `round_robin`: the group's players, one `bo`.
/// - `proleague`: team A's lineup followed by team B's, game `k` pitting A's `k`-th player
///   against B's; update 0 is the team score so far.
#[derive(Clone, Debug, Deserialize)]
pub struct PredictQuery {
    pub kind: QueryKind,
    pub players: Vec<Option<String>>,
    #[serde(default)]
    pub bo: Vec<u32>,
    /// Race override per player, aligned with `players`.
    #[serde(default)]
    pub races: Vec<Option<String>>,
    #[serde(default)]
    pub updates: Vec<ScoreUpdate>,
    #[serde(default)]
    pub tiebreak: TiebreakPolicy,
}

impl PredictQuery {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PredictError::Config(e.to_string()))
    }

    /// Resolve names against `roster` and build the request.
    pub fn into_request(&self, roster: &Roster) -> Result<PredictionRequest> {
        let entrants = self.resolve(roster)?;
        match self.kind {
            QueryKind::SingleMatch => {
                let [a, b] = self.required::<2>(entrants)?;
                Ok(PredictionRequest::SingleMatch(SingleMatch {
                    a,
                    b,
                    format: self.format(0)?,
                    partial: self.update_score(0),
                }))
            }
            QueryKind::Bracket => {
                let rounds = entrants.len().max(1).trailing_zeros() as usize;
                let formats = (0..rounds)
                    .map(|r| self.format(r))
                    .collect::<Result<Vec<_>>>()?;
                let mut bracket = Bracket::from_seeds(entrants, &formats)?;
                for u in &self.updates {
                    bracket.set_partial(u.match_index, Score::new(u.a, u.b))?;
                }
                Ok(PredictionRequest::Bracket(bracket))
            }
            QueryKind::Dual => {
                let players = self.all_present(entrants)?;
                let mut formats = [SeriesFormat::best_of(1)?; DUAL_MATCHES];
                for (m, f) in formats.iter_mut().enumerate() {
                    *f = self.format(m)?;
                }
                let mut dual = Dual::with_formats(players, formats)?;
                for u in &self.updates {
                    dual.set_partial(u.match_index, Score::new(u.a, u.b))?;
                }
                Ok(PredictionRequest::Dual(dual))
            }
            QueryKind::RoundRobin => {
                let players = self.all_present(entrants)?;
                let mut group = Group::new(players, self.format(0)?)?.with_tiebreak(self.tiebreak);
                for u in &self.updates {
                    group.set_partial(u.match_index, Score::new(u.a, u.b))?;
                }
                Ok(PredictionRequest::RoundRobin(group))
            }
            QueryKind::Proleague => {
                let players = self.all_present(entrants)?;
                if players.is_empty() || players.len() % 2 != 0 {
                    return Err(PredictError::InvalidSeriesState(format!(
                        "team lineups need an even number of players, got {}",
                        players.len()
                    )));
                }
                let half = players.len() / 2;
                let mut team_a = players;
                let team_b = team_a.split_off(half);
                let lineup = team_a.into_iter().zip(team_b).collect();
                let league = Proleague::with_score(lineup, self.update_score(0))?;
                Ok(PredictionRequest::Proleague(league))
            }
        }
    }

    fn resolve(&self, roster: &Roster) -> Result<Vec<Option<Player>>> {
        self.players
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let Some(name) = name else { return Ok(None) };
                let player = roster.get(name)?;
                match self.races.get(i).and_then(|r| r.as_deref()) {
                    Some(tag) => Ok(Some(player.playing(tag.parse()?))),
                    None => Ok(Some(player.clone())),
                }
            })
            .collect()
    }

    fn all_present(&self, entrants: Vec<Option<Player>>) -> Result<Vec<Player>> {
        entrants
            .into_iter()
            .map(|e| e.ok_or_else(|| PredictError::MalformedBracket("byes only allowed in brackets".into())))
            .collect()
    }

    fn required<const N: usize>(&self, entrants: Vec<Option<Player>>) -> Result<[Player; N]> {
        let count = entrants.len();
        self.all_present(entrants)?.try_into().map_err(|_| {
            PredictError::MalformedBracket(format!("expected {N} players, got {count}"))
        })
    }

    /// Format of match (or round) `index`; a single `bo` applies everywhere.
    fn format(&self, index: usize) -> Result<SeriesFormat> {
        let bo = match self.bo.as_slice() {
            [] => 1,
            [only] => *only,
            many => *many.get(index).ok_or_else(|| {
                PredictError::InvalidSeriesState(format!("no series length for match {index}"))
            })?,
        };
        SeriesFormat::best_of(bo)
    }

    fn update_score(&self, match_index: usize) -> Score {
        self.updates
            .iter()
            .rev()
            .find(|u| u.match_index == match_index)
            .map(|u| Score::new(u.a, u.b))
            .unwrap_or_default()
    }
}
