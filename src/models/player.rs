//! Player, Race and rating data structures.

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a player (used in results and lookups).
pub type PlayerId = Uuid;

/// Race a player is presumed to play in a game.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Race {
    #[serde(rename = "P")]
    Protoss,
    #[serde(rename = "T")]
    Terran,
    #[serde(rename = "Z")]
    Zerg,
    /// Picks one of the three at game start.
    #[default]
    #[serde(rename = "R")]
    Random,
}

impl Race {
    /// The three concrete races, in table order.
    pub const CONCRETE: [Race; 3] = [Race::Protoss, Race::Terran, Race::Zerg];

    /// Index into P/T/Z tables; `None` for Random.
    pub fn index(self) -> Option<usize> {
        match self {
            Race::Protoss => Some(0),
            Race::Terran => Some(1),
            Race::Zerg => Some(2),
            Race::Random => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            Race::Protoss => 'P',
            Race::Terran => 'T',
            Race::Zerg => 'Z',
            Race::Random => 'R',
        }
    }
}

impl FromStr for Race {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "P" | "p" => Ok(Race::Protoss),
            "T" | "t" => Ok(Race::Terran),
            "Z" | "z" => Ok(Race::Zerg),
            "R" | "r" => Ok(Race::Random),
            other => Err(PredictError::UnknownRace(other.to_string())),
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single rating component: mean and deviation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mean: f64,
    pub dev: f64,
}

impl Rating {
    pub fn new(mean: f64, dev: f64) -> Self {
        Self { mean, dev }
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.mean.is_finite() || !self.dev.is_finite() {
            return Err(PredictError::InvalidRating(format!(
                "{what} is not finite ({}, {})",
                self.mean, self.dev
            )));
        }
        if self.dev < 0.0 {
            return Err(PredictError::InvalidRating(format!(
                "{what} has negative deviation {}",
                self.dev
            )));
        }
        Ok(())
    }
}

/// Overall rating plus the per-opponent-race offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingVector {
    pub overall: Rating,
    #[serde(default)]
    pub vs_p: Rating,
    #[serde(default)]
    pub vs_t: Rating,
    #[serde(default)]
    pub vs_z: Rating,
}

impl RatingVector {
    /// Flat rating: same strength against every race.
    pub fn flat(mean: f64) -> Self {
        Self {
            overall: Rating::new(mean, 0.0),
            ..Self::default()
        }
    }

    /// Offset against a concrete opponent race.
    pub fn vs(&self, race: Race) -> Option<Rating> {
        match race {
            Race::Protoss => Some(self.vs_p),
            Race::Terran => Some(self.vs_t),
            Race::Zerg => Some(self.vs_z),
            Race::Random => None,
        }
    }

    /// Fails with `InvalidRating` if any component is non-finite.
    pub fn validate(&self) -> Result<()> {
        self.overall.validate("overall rating")?;
        self.vs_p.validate("rating vs P")?;
        self.vs_t.validate("rating vs T")?;
        self.vs_z.validate("rating vs Z")
    }
}

/// A rated player. Immutable for the duration of a prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default = "Uuid::new_v4")]
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub race: Race,
    pub rating: RatingVector,
}

impl Player {
    /// Create a new player with a fresh id.
    pub fn new(name: impl Into<String>, race: Race, rating: RatingVector) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            race,
            rating,
        }
    }

    /// Same player, announced to play `race` instead of their main race.
    pub fn playing(&self, race: Race) -> Self {
        Self {
            race,
            ..self.clone()
        }
    }
}
