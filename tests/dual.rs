//! Integration tests for the four-entrant dual tournament.

use matchcast::{
    simulate_dual, Dual, Player, PredictError, Race, RatingModel, RatingVector, Score,
    SeriesFormat, DUAL_MATCHES,
};

fn players(ratings: &[f64]) -> Vec<Player> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, r)| Player::new(format!("D{i}"), Race::Zerg, RatingVector::flat(*r)))
        .collect()
}

fn bo(n: u32) -> SeriesFormat {
    SeriesFormat::best_of(n).unwrap()
}

const FOURTH: usize = 3;

#[test]
fn placements_form_a_permutation_table() {
    let dual = Dual::new(players(&[1820.0, 1500.0, 1610.0, 1705.0]), bo(3)).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();
    assert!(prediction.table.is_doubly_stochastic());
}

#[test]
fn top_entrant_rarely_but_possibly_last() {
    let dual = Dual::new(players(&[2000.0, 1800.0, 1600.0, 1400.0]), bo(3)).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();
    let top = prediction.table.row(0).unwrap().probs[FOURTH];
    let second_lowest = prediction.table.row(2).unwrap().probs[FOURTH];
    assert!(top > 0.0);
    assert!(top < second_lowest);
    let first: Vec<f64> = prediction.table.rows.iter().map(|r| r.probs[0]).collect();
    assert!(first.windows(2).all(|w| w[0] > w[1]), "{first:?}");
}

#[test]
fn even_field_is_uniform() {
    let dual = Dual::new(players(&[1500.0; 4]), bo(1)).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();
    for row in &prediction.table.rows {
        for p in &row.probs {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }
}

#[test]
fn only_openings_are_certain_before_play() {
    let dual = Dual::new(players(&[1700.0, 1600.0, 1500.0, 1400.0]), bo(3)).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();
    let indices: Vec<usize> = prediction.matches.iter().map(|m| m.match_index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(prediction.meanres.len(), DUAL_MATCHES);
}

#[test]
fn finished_openings_fix_the_next_pairings() {
    let mut dual = Dual::new(players(&[1500.0; 4]), bo(1)).unwrap();
    dual.set_partial(0, Score::new(0, 1)).unwrap();
    dual.set_partial(1, Score::new(1, 0)).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();

    let indices: Vec<usize> = prediction.matches.iter().map(|m| m.match_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    let winners = &prediction.matches[2];
    assert_eq!((winners.entrant_a, winners.entrant_b), (1, 2));

    // Entrant 0 lost the opening and can no longer finish first.
    assert_eq!(prediction.table.row(0).unwrap().probs[0], 0.0);
    assert_eq!(prediction.table.row(1).unwrap().probs[FOURTH], 0.0);
    assert!(prediction.table.is_doubly_stochastic());
}

#[test]
fn mixed_formats() {
    let formats = [bo(1), bo(1), bo(3), bo(3), bo(5)];
    let dual = Dual::with_formats(players(&[1650.0, 1500.0, 1580.0, 1610.0]), formats).unwrap();
    let prediction = simulate_dual(&RatingModel::default(), &dual).unwrap();
    assert!(prediction.table.is_doubly_stochastic());
    assert_eq!(prediction.matches[0].outcomes.len(), 2);
}

#[test]
fn needs_exactly_four_entrants() {
    assert!(matches!(
        Dual::new(players(&[1500.0; 3]), bo(3)),
        Err(PredictError::MalformedBracket(_))
    ));
    let mut dual = Dual::new(players(&[1500.0; 4]), bo(3)).unwrap();
    assert!(dual.set_partial(5, Score::new(1, 0)).is_err());
    assert!(matches!(
        dual.set_partial(2, Score::new(2, 2)),
        Err(PredictError::InvalidSeriesState(_))
    ));
}
