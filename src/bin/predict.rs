//! Command-line front end: reads a rating roster (CSV) and a query (JSON), prints the prediction as JSON.
//! Run with: cargo run --bin predict -- --roster ratings.csv query.json
//! Reads the query from stdin when no file is given.

use anyhow::{Context, Result};
use clap::Parser;
use matchcast::{predict, ModelConfig, PredictQuery, RatingModel, Roster};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "predict")]
#[command(about = "Predict series, brackets, duals, groups and team matches from ratings")]
struct Cli {
    /// Rating roster: name,race,rating,dev,vp,dev_vp,vt,dev_vt,vz,dev_vz
    #[arg(short, long, env = "PREDICT_ROSTER")]
    roster: PathBuf,

    /// Model configuration (TOML). Defaults apply when omitted.
    #[arg(short, long, env = "PREDICT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the sampling seed.
    #[arg(long, env = "PREDICT_SEED")]
    seed: Option<u64>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Query file; stdin when omitted.
    query: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let roster = Roster::load(&cli.roster)
        .with_context(|| format!("loading roster {}", cli.roster.display()))?;
    log::info!("Loaded {} rated players", roster.len());

    let text = match &cli.query {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading query {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading query from stdin")?;
            buf
        }
    };
    let query = PredictQuery::from_json(&text).context("parsing query")?;
    let request = query.into_request(&roster).context("building request")?;

    let model = RatingModel::new(config).context("invalid model configuration")?;
    let prediction = predict(&model, &request).context("predicting")?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&prediction)?
    } else {
        serde_json::to_string(&prediction)?
    };
    println!("{json}");
    Ok(())
}
