//! End-to-end tests: CSV roster plus JSON query through to a prediction.

use matchcast::{predict, Prediction, PredictError, PredictQuery, RatingModel, Roster, Score};

const ROSTER: &str = "\
name,race,rating,dev,vp,dev_vp,vt,dev_vt,vz,dev_vz
Hero,P,1820,60,0,80,25,80,-10,80
Maru,T,1900,55,30,70,0,70,15,70
Soulkey,Z,1610,75,-20,90,10,90,0,90
Flash,T,1750,70,0,85,0,85,40,85
Bisu,P,1700,65,10,80,-15,80,35,80
";

fn roster() -> Roster {
    Roster::from_csv_reader(ROSTER.as_bytes()).unwrap()
}

fn run(query: &str) -> Result<Prediction, PredictError> {
    let request = PredictQuery::from_json(query)?.into_request(&roster())?;
    predict(&RatingModel::default(), &request)
}

#[test]
fn roster_loads_every_row() {
    let roster = roster();
    assert_eq!(roster.len(), 5);
    assert_eq!(roster.get("maru").unwrap().name, "Maru");
    assert!(matches!(roster.get("Stork"), Err(PredictError::UnknownPlayer(_))));
}

#[test]
fn single_match_query() {
    let prediction = run(r#"{"kind": "single_match", "players": ["Maru", "Soulkey"], "bo": [5]}"#).unwrap();
    let Prediction::SingleMatch(m) = prediction else {
        panic!("expected a single match prediction");
    };
    assert_eq!(m.player_a, "Maru");
    assert!(m.proba > 0.5);
    assert!((m.proba + m.probb - 1.0).abs() < 1e-12);
    // Maru vs Z: 1900 + 15; Soulkey vs T: 1610 + 10.
    assert!((m.rta - 1915.0).abs() < 1e-9);
    assert!((m.rtb - 1620.0).abs() < 1e-9);
    assert_eq!(m.outcomes.len(), 6);
}

#[test]
fn single_match_with_played_games() {
    let prediction = run(
        r#"{"kind": "single_match", "players": ["Soulkey", "Maru"], "bo": [3],
            "updates": [{"match": 0, "a": 1, "b": 0}]}"#,
    )
    .unwrap();
    let Prediction::SingleMatch(m) = prediction else {
        panic!("expected a single match prediction");
    };
    assert_eq!((m.sca, m.scb), (1, 0));
    assert!(m.outcomes.iter().all(|(s, _)| s.a >= 1));
}

#[test]
fn race_override_changes_the_matchup() {
    let as_main = run(r#"{"kind": "single_match", "players": ["Flash", "Hero"]}"#).unwrap();
    let vs_zerg = run(
        r#"{"kind": "single_match", "players": ["Flash", "Hero"], "races": [null, "Z"]}"#,
    )
    .unwrap();
    let (Prediction::SingleMatch(a), Prediction::SingleMatch(b)) = (as_main, vs_zerg) else {
        panic!("expected single match predictions");
    };
    assert!(b.proba > a.proba);
}

#[test]
fn bracket_query_with_bye() {
    let prediction = run(
        r#"{"kind": "bracket", "players": ["Maru", null, "Flash", "Soulkey"], "bo": [3, 5],
            "updates": [{"match": 1, "a": 1, "b": 0}]}"#,
    )
    .unwrap();
    let Prediction::Bracket(b) = prediction else {
        panic!("expected a bracket prediction");
    };
    assert!(b.winner.is_normalized());
    assert_eq!(b.table.rows.len(), 3);
    assert_eq!(b.matches[0].partial, Score::new(1, 0));
}

#[test]
fn dual_and_group_queries() {
    let dual = run(r#"{"kind": "dual", "players": ["Hero", "Maru", "Flash", "Bisu"], "bo": [3]}"#).unwrap();
    let Prediction::Dual(d) = dual else {
        panic!("expected a dual prediction");
    };
    assert!(d.table.is_doubly_stochastic());

    let group = run(
        r#"{"kind": "round_robin", "players": ["Hero", "Maru", "Flash"], "bo": [1],
            "tiebreak": "wins_then_seed"}"#,
    )
    .unwrap();
    let Prediction::RoundRobin(g) = group else {
        panic!("expected a round robin prediction");
    };
    assert_eq!(g.matches.len(), 3);
}

#[test]
fn proleague_query() {
    let prediction = run(
        r#"{"kind": "proleague", "players": ["Hero", "Flash", "Maru", "Bisu"],
            "updates": [{"match": 0, "a": 0, "b": 1}]}"#,
    )
    .unwrap();
    let Prediction::Proleague(p) = prediction else {
        panic!("expected a proleague prediction");
    };
    assert_eq!(p.partial, Score::new(0, 1));
    assert_eq!(p.proba, 0.0);
    assert!(p.prob_draw > 0.0);
}

#[test]
fn prediction_serializes_with_kind_tag() {
    let prediction = run(r#"{"kind": "single_match", "players": ["Hero", "Bisu"], "bo": [3]}"#).unwrap();
    let json = serde_json::to_value(&prediction).unwrap();
    assert_eq!(json["kind"], "single_match");
    assert!(json["proba"].as_f64().is_some());
}

#[test]
fn bad_queries_fail() {
    assert!(matches!(
        run(r#"{"kind": "single_match", "players": ["Hero", "Stork"]}"#),
        Err(PredictError::UnknownPlayer(_))
    ));
    assert!(matches!(
        run(r#"{"kind": "single_match", "players": ["Hero", "Maru"], "races": ["X"]}"#),
        Err(PredictError::UnknownRace(_))
    ));
    assert!(matches!(
        run(r#"{"kind": "single_match", "players": ["Hero", "Maru"], "bo": [4]}"#),
        Err(PredictError::InvalidSeriesState(_))
    ));
    assert!(matches!(
        run(r#"{"kind": "round_robin", "players": ["Hero"]}"#),
        Err(PredictError::InvalidGroupSize(1))
    ));
    assert!(matches!(
        run(r#"{"kind": "dual", "players": ["Hero", "Maru", "Flash"]}"#),
        Err(PredictError::MalformedBracket(_))
    ));
}

#[test]
fn bad_roster_rows_fail() {
    let unknown_race = "name,race,rating,dev,vp,dev_vp,vt,dev_vt,vz,dev_vz\nX,Q,1500,0,0,0,0,0,0,0\n";
    assert!(matches!(
        Roster::from_csv_reader(unknown_race.as_bytes()),
        Err(PredictError::UnknownRace(_))
    ));
    let duplicate = format!("{ROSTER}hero,P,1500,0,0,0,0,0,0,0\n");
    assert!(matches!(
        Roster::from_csv_reader(duplicate.as_bytes()),
        Err(PredictError::Config(_))
    ));
}
