//! Fish Hunt headless driver
//!
//! Reads one JSON request per line on stdin and answers each with one JSON
//! snapshot line on stdout. Stands in for whatever transport fronts the game.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use fish_hunt::highscores::FileScores;
use fish_hunt::{Catalog, GridMap, Request, Session, Simulation, Tuning};

#[derive(Debug, Parser)]
#[command(name = "fish-hunt", about = "Headless fish hunting arena")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// ASCII map file (`#` wall, `.` water, `P` player start)
    #[arg(long)]
    map: Option<PathBuf>,
    /// Catalog JSON file
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Tuning JSON file
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// High score JSON file, updated when a finished session is reset
    #[arg(long)]
    scores: Option<PathBuf>,
}

const DEFAULT_MAP: &str = "\
####################
#P.................#
#..................#
#.....####.........#
#..................#
#..........###.....#
#..................#
#...##.............#
#..................#
#.........#........#
#.........#........#
#..................#
####################
";

fn read(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let map = match &args.map {
        Some(path) => GridMap::parse(&read(path)?),
        None => GridMap::parse(DEFAULT_MAP),
    }
    .context("loading map")?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json(&read(path)?).context("loading catalog")?,
        None => Catalog::default(),
    };
    let tuning = match &args.tuning {
        Some(path) => Tuning::from_json(&read(path)?).context("loading tuning")?,
        None => Tuning::default(),
    };

    let sim = Simulation::new(Arc::new(map), Arc::new(catalog), tuning, args.seed);
    let mut session = Session::new(sim);
    if let Some(path) = args.scores {
        session = session.with_scores(FileScores::open(path).context("opening high scores")?);
    }

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("dropping malformed request: {e}");
                continue;
            }
        };
        let snapshot = session.handle(&request);
        serde_json::to_writer(&mut out, &snapshot)?;
        writeln!(out)?;
        out.flush()?;
    }
    Ok(())
}
