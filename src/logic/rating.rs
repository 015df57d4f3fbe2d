//! Single-game win probability from two rating vectors.

use crate::config::ModelConfig;
use crate::error::{PredictError, Result};
use crate::models::{Player, Race, RatingVector};

/// Converts a pair of ratings into the probability that the first side wins one game.
///
/// `p = 1 / (1 + 10^(-(eff_a - eff_b) / scale))`, where each effective rating is
/// the overall mean plus the player's offset against the opponent's race plus the
/// configured matchup modifier. Results are clamped to `[epsilon, 1 - epsilon]`.
#[derive(Clone, Debug, Default)]
pub struct RatingModel {
    config: ModelConfig,
}

impl RatingModel {
    /// Model over a checked configuration; rejects anything `ModelConfig::validate` would.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Probability that A (playing `race_a`) beats B (playing `race_b`) in one game.
    pub fn win_probability(
        &self,
        rating_a: &RatingVector,
        race_a: Race,
        rating_b: &RatingVector,
        race_b: Race,
    ) -> Result<f64> {
        let eff_a = self.effective_rating(rating_a, race_a, rating_b, race_b)?;
        let eff_b = self.effective_rating(rating_b, race_b, rating_a, race_a)?;
        let diff = eff_a - eff_b;
        if !diff.is_finite() {
            return Err(PredictError::InvalidRating(format!(
                "rating difference is not finite ({eff_a} vs {eff_b})"
            )));
        }
        Ok(self.logistic(diff))
    }

    /// [`win_probability`](Self::win_probability) for two players at their announced races.
    pub fn game_probability(&self, a: &Player, b: &Player) -> Result<f64> {
        self.win_probability(&a.rating, a.race, &b.rating, b.race)
    }

    /// Rating of `own` against an opponent rated `opponent` playing `opp_race`.
    ///
    /// A random race on either side averages over P/T/Z using the configured race weights.
    pub fn effective_rating(
        &self,
        own: &RatingVector,
        own_race: Race,
        opponent: &RatingVector,
        opp_race: Race,
    ) -> Result<f64> {
        own.validate()?;
        opponent.validate()?;

        let own_w = self.race_weights(own_race);
        let opp_w = self.race_weights(opp_race);

        let mut vs_offset = 0.0;
        for (j, race) in Race::CONCRETE.iter().enumerate() {
            if let Some(r) = own.vs(*race) {
                vs_offset += opp_w[j] * r.mean;
            }
        }

        let mut modifier = 0.0;
        for (i, wi) in own_w.iter().enumerate() {
            for (j, wj) in opp_w.iter().enumerate() {
                modifier += wi * wj * self.config.matchup_modifiers[i][j];
            }
        }

        Ok(own.overall.mean + vs_offset + modifier)
    }

    fn race_weights(&self, race: Race) -> [f64; 3] {
        match race.index() {
            Some(i) => {
                let mut w = [0.0; 3];
                w[i] = 1.0;
                w
            }
            None => self.config.normalized_race_weights(),
        }
    }

    /// Clamped logistic. Computed on the non-negative side and mirrored, so that
    /// `logistic(d) + logistic(-d) == 1` holds exactly.
    fn logistic(&self, diff: f64) -> f64 {
        let upper = |d: f64| {
            let p = 1.0 / (1.0 + 10f64.powf(-d / self.config.scale));
            p.min(1.0 - self.config.epsilon)
        };
        if diff >= 0.0 {
            upper(diff)
        } else {
            1.0 - upper(-diff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    fn vector(overall: f64, vp: f64, vt: f64, vz: f64) -> RatingVector {
        RatingVector {
            overall: Rating::new(overall, 0.0),
            vs_p: Rating::new(vp, 0.0),
            vs_t: Rating::new(vt, 0.0),
            vs_z: Rating::new(vz, 0.0),
        }
    }

    #[test]
    fn equal_ratings_are_even() {
        let m = RatingModel::default();
        let r = RatingVector::flat(1500.0);
        let p = m.win_probability(&r, Race::Terran, &r, Race::Zerg).unwrap();
        assert_eq!(p, 0.5);
    }

    #[test]
    fn four_hundred_points_is_ten_to_one() {
        let m = RatingModel::default();
        let p = m
            .win_probability(&RatingVector::flat(1900.0), Race::Protoss, &RatingVector::flat(1500.0), Race::Protoss)
            .unwrap();
        assert!((p - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn uses_offset_against_opponent_race() {
        let m = RatingModel::default();
        let a = vector(1500.0, 100.0, 0.0, -100.0);
        let b = RatingVector::flat(1500.0);
        let vs_p = m.win_probability(&a, Race::Terran, &b, Race::Protoss).unwrap();
        let vs_z = m.win_probability(&a, Race::Terran, &b, Race::Zerg).unwrap();
        assert!(vs_p > 0.5);
        assert!(vs_z < 0.5);
    }

    #[test]
    fn random_opponent_averages_offsets() {
        let m = RatingModel::default();
        let a = vector(1500.0, 90.0, 30.0, 0.0);
        let b = RatingVector::flat(1500.0);
        let eff = m.effective_rating(&a, Race::Zerg, &b, Race::Random).unwrap();
        assert!((eff - 1540.0).abs() < 1e-9);
    }

    #[test]
    fn matchup_modifier_applies_by_race_pair() {
        let mut config = ModelConfig::default();
        config.matchup_modifiers[1][2] = 50.0;
        let m = RatingModel::new(config).unwrap();
        let r = RatingVector::flat(1500.0);
        let tvz = m.win_probability(&r, Race::Terran, &r, Race::Zerg).unwrap();
        let tvp = m.win_probability(&r, Race::Terran, &r, Race::Protoss).unwrap();
        assert!(tvz > 0.5);
        assert_eq!(tvp, 0.5);
    }

    #[test]
    fn extreme_gap_is_clamped() {
        let m = RatingModel::default();
        let p = m
            .win_probability(&RatingVector::flat(1e6), Race::Zerg, &RatingVector::flat(0.0), Race::Zerg)
            .unwrap();
        assert!(p < 1.0);
        let q = m
            .win_probability(&RatingVector::flat(0.0), Race::Zerg, &RatingVector::flat(1e6), Race::Zerg)
            .unwrap();
        assert!(q > 0.0);
    }

    #[test]
    fn non_finite_rating_is_rejected() {
        let m = RatingModel::default();
        let bad = RatingVector::flat(f64::NAN);
        assert!(matches!(
            m.win_probability(&bad, Race::Zerg, &RatingVector::flat(0.0), Race::Zerg),
            Err(PredictError::InvalidRating(_))
        ));
    }
}
