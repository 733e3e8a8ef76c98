use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use mp_common::embedding::{EmbeddingGenerator, HashEmbedder, embed_athlete, embed_club};
use mp_common::geo::{CachedDistance, GazetteerDistance};
use mp_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use mp_common::matching::{MatchScorer, MatchingConfig, MatchingEngine, RankingOptions};
use mp_common::record::MatchRecord;
use mp_common::{AthleteProfile, ClubProfile, run_id};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "mp-ranker",
    about = "Rank every athlete of a market snapshot against its clubs"
)]
struct Args {
    /// JSON file with `{"athletes": [...], "clubs": [...]}`
    #[arg(long)]
    input: PathBuf,

    /// Keep at most this many clubs per athlete
    #[arg(long)]
    limit: Option<usize>,

    /// Drop matches scoring below this total
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_score: u8,

    /// Write JSON lines here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Generate offline embeddings for profiles that have none
    #[arg(long, default_value_t = false)]
    embed_missing: bool,
}

#[derive(Debug, Error)]
enum RankerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

#[derive(Debug, Default, Deserialize)]
struct MarketSnapshot {
    #[serde(default)]
    athletes: Vec<AthleteProfile>,
    #[serde(default)]
    clubs: Vec<ClubProfile>,
}

impl MarketSnapshot {
    fn validate(&self) -> Result<(), RankerError> {
        check_ids("athlete", self.athletes.iter().map(|a| a.id.as_str()))?;
        check_ids("club", self.clubs.iter().map(|c| c.id.as_str()))
    }
}

fn check_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), RankerError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(RankerError::InvalidSnapshot(format!("{kind} with empty id")));
        }
        if !seen.insert(id) {
            return Err(RankerError::InvalidSnapshot(format!("duplicate {kind} id {id:?}")));
        }
    }
    Ok(())
}

fn read_snapshot(reader: impl Read) -> Result<MarketSnapshot, RankerError> {
    let snapshot: MarketSnapshot = serde_json::from_reader(reader)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Returns how many profiles received a vector.
fn fill_missing_embeddings(
    snapshot: &mut MarketSnapshot,
    generator: &dyn EmbeddingGenerator,
) -> usize {
    let mut filled = 0;
    for athlete in snapshot.athletes.iter_mut().filter(|a| a.embedding_vector.is_empty()) {
        athlete.embedding_vector = embed_athlete(generator, athlete);
        filled += 1;
    }
    for club in snapshot.clubs.iter_mut().filter(|c| c.embedding_vector.is_empty()) {
        club.embedding_vector = embed_club(generator, club);
        filled += 1;
    }
    filled
}

/// Athletes keep input order; each athlete's clubs are ranked best first.
fn rank_snapshot(
    engine: &MatchingEngine,
    snapshot: &MarketSnapshot,
    options: &RankingOptions,
) -> Vec<MatchRecord> {
    snapshot
        .athletes
        .iter()
        .flat_map(|athlete| {
            engine
                .rank_clubs_for_athlete(athlete, &snapshot.clubs, options)
                .into_iter()
                .map(move |ranked| MatchRecord::new(&athlete.id, ranked.candidate_id, ranked.score))
        })
        .collect()
}

fn write_records(mut writer: impl Write, records: &[MatchRecord]) -> Result<usize, RankerError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn run(args: Args) -> Result<(), RankerError> {
    let mut snapshot = read_snapshot(BufReader::new(File::open(&args.input)?))?;

    if args.embed_missing {
        let filled = fill_missing_embeddings(&mut snapshot, &HashEmbedder::default());
        info!(filled, "generated missing embeddings");
    }

    let engine = MatchingEngine::new(MatchScorer::new(
        MatchingConfig::from_env(),
        Arc::new(CachedDistance::new(GazetteerDistance::default())),
    ));
    let options = RankingOptions {
        limit: args.limit,
        min_total_score: args.min_score,
    };

    let records = rank_snapshot(&engine, &snapshot, &options);

    let written = match &args.output {
        Some(path) => write_records(BufWriter::new(File::create(path)?), &records)?,
        None => write_records(io::stdout().lock(), &records)?,
    };

    info!(
        athletes = snapshot.athletes.len(),
        clubs = snapshot.clubs.len(),
        written,
        match_run_id = run_id::get(),
        "ranking complete"
    );
    Ok(())
}

fn main() {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    if let Err(err) = run(Args::parse()) {
        tracing::error!(error = %err, "mp-ranker failed");
        std::process::exit(1);
    }
}
