//! Integration tests for the single-game rating model and its configuration.

use matchcast::{ModelConfig, Player, PredictError, Race, Rating, RatingModel, RatingVector};

fn vector(overall: f64, vp: f64, vt: f64, vz: f64) -> RatingVector {
    RatingVector {
        overall: Rating::new(overall, 60.0),
        vs_p: Rating::new(vp, 80.0),
        vs_t: Rating::new(vt, 80.0),
        vs_z: Rating::new(vz, 80.0),
    }
}

#[test]
fn probabilities_are_complementary() {
    let model = RatingModel::default();
    let a = vector(1720.0, 35.0, -20.0, 10.0);
    let b = vector(1655.0, -5.0, 60.0, -45.0);
    for ra in [Race::Protoss, Race::Terran, Race::Zerg, Race::Random] {
        for rb in [Race::Protoss, Race::Terran, Race::Zerg, Race::Random] {
            let pab = model.win_probability(&a, ra, &b, rb).unwrap();
            let pba = model.win_probability(&b, rb, &a, ra).unwrap();
            assert_eq!(pab + pba, 1.0, "{ra} vs {rb}");
        }
    }
}

#[test]
fn higher_rating_wins_more_often() {
    let model = RatingModel::default();
    let b = RatingVector::flat(1500.0);
    let mut last = 0.0;
    for step in 0..40 {
        let a = RatingVector::flat(1100.0 + 20.0 * step as f64);
        let p = model.win_probability(&a, Race::Zerg, &b, Race::Terran).unwrap();
        assert!(p > last);
        last = p;
    }
}

#[test]
fn scale_is_configurable() {
    let narrow = RatingModel::new(ModelConfig::from_toml_str("scale = 200.0").unwrap()).unwrap();
    let wide = RatingModel::default();
    let a = Player::new("a", Race::Terran, RatingVector::flat(1700.0));
    let b = Player::new("b", Race::Terran, RatingVector::flat(1500.0));
    let pn = narrow.game_probability(&a, &b).unwrap();
    let pw = wide.game_probability(&a, &b).unwrap();
    assert!((pn - 10.0 / 11.0).abs() < 1e-12);
    assert!(pw < pn);
}

#[test]
fn random_race_uses_configured_weights() {
    let config = ModelConfig::from_toml_str("random_race_weights = [1.0, 0.0, 0.0]").unwrap();
    let model = RatingModel::new(config).unwrap();
    let a = vector(1500.0, 100.0, 0.0, 0.0);
    let b = RatingVector::flat(1500.0);
    let vs_random = model.win_probability(&a, Race::Zerg, &b, Race::Random).unwrap();
    let vs_protoss = model.win_probability(&a, Race::Zerg, &b, Race::Protoss).unwrap();
    assert_eq!(vs_random, vs_protoss);
}

#[test]
fn negative_deviation_is_rejected() {
    let model = RatingModel::default();
    let mut bad = RatingVector::flat(1500.0);
    bad.vs_t.dev = -1.0;
    assert!(matches!(
        model.win_probability(&bad, Race::Protoss, &RatingVector::flat(1500.0), Race::Terran),
        Err(PredictError::InvalidRating(_))
    ));
}

#[test]
fn race_tags_parse() {
    assert_eq!("T".parse::<Race>().unwrap(), Race::Terran);
    assert_eq!("r".parse::<Race>().unwrap(), Race::Random);
    assert!(matches!("X".parse::<Race>(), Err(PredictError::UnknownRace(_))));
}

#[test]
fn bad_config_is_rejected() {
    assert!(ModelConfig::from_toml_str("epsilon = 0.7").is_err());
    assert!(ModelConfig::from_toml_str("random_race_weights = [0.0, 0.0, 0.0]").is_err());
    assert!(ModelConfig::from_toml_str("trials = 0").is_err());
    assert!(ModelConfig::from_toml_str("scale = \"wide\"").is_err());
}

#[test]
fn model_rejects_unchecked_config() {
    let no_trials = ModelConfig {
        trials: 0,
        ..ModelConfig::default()
    };
    assert!(matches!(RatingModel::new(no_trials), Err(PredictError::Config(_))));
    let flat = ModelConfig {
        scale: 0.0,
        ..ModelConfig::default()
    };
    assert!(matches!(RatingModel::new(flat), Err(PredictError::Config(_))));
    assert!(RatingModel::new(ModelConfig::default()).is_ok());
}
