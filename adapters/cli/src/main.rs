#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Bubble Merge engine headlessly.

mod board;
mod config;
mod layout_transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bubble_merge_core::{BubbleType, CellCoord, Tier};
use bubble_merge_engine::{CascadeReport, Engine, EngineConfig, MergeReport, ShotOutcome};
use bubble_merge_world::query;
use clap::{Parser, Subcommand};
use layout_transfer::LayoutSnapshot;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Fire bubbles at a hex grid and watch them merge.
#[derive(Debug, Parser)]
#[command(name = "bubble-merge", version, about)]
struct Cli {
    /// TOML file with `[grid]` and `[tuning]` tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upper bound on ticks spent settling cascades after each shot.
    #[arg(long, global = true, default_value_t = 500)]
    max_ticks: u32,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Fires a scripted sequence of shots.
    Shoot {
        /// Shot as `<type>@<row>,<column>`; the type is a code or a name.
        #[arg(long = "shot", value_parser = parse_shot, required = true)]
        shots: Vec<Shot>,
        /// Layout string to seed the board with.
        #[arg(long)]
        layout: Option<String>,
    },
    /// Fires pseudo-random basic shots from a seed.
    Simulate {
        /// Seed for the shot generator.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of shots to fire.
        #[arg(long, default_value_t = 40)]
        shots: u32,
        /// Number of distinct basic elements in play.
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
        elements: u8,
        /// Layout string to seed the board with.
        #[arg(long)]
        layout: Option<String>,
    },
    /// Prints the board stored in a layout string.
    Show {
        /// Layout string produced by a previous run.
        layout: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Shot {
    bubble_type: BubbleType,
    target: CellCoord,
}

/// Running totals over a session.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    placed: u32,
    despawned: u32,
    merges: u32,
    abandoned: u32,
}

impl Tally {
    fn record_shot(&mut self, outcome: &ShotOutcome) {
        match outcome {
            ShotOutcome::Placed(report) => {
                self.placed += 1;
                if let Some(merge) = &report.merge {
                    self.record_merge(merge);
                }
            }
            ShotOutcome::Despawned(_) => self.despawned += 1,
        }
    }

    fn record_cascades(&mut self, reports: &[CascadeReport]) {
        for report in reports {
            self.record_merge(&report.merge);
        }
    }

    fn record_merge(&mut self, merge: &MergeReport) {
        match merge {
            MergeReport::Executed { .. } => self.merges += 1,
            MergeReport::Abandoned { .. } => self.abandoned += 1,
        }
    }
}

/// Entry point for the Bubble Merge command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let (engine, tally) = match cli.mode {
        Mode::Shoot { shots, layout } => {
            let mut engine = build_engine(config, layout.as_deref())?;
            let mut tally = Tally::default();
            for shot in shots {
                fire(&mut engine, &mut tally, shot, cli.max_ticks);
            }
            (engine, Some(tally))
        }
        Mode::Simulate {
            seed,
            shots,
            elements,
            layout,
        } => {
            let mut engine = build_engine(config, layout.as_deref())?;
            let mut tally = Tally::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..shots {
                let shot = random_shot(&mut rng, &engine, elements);
                fire(&mut engine, &mut tally, shot, cli.max_ticks);
            }
            (engine, Some(tally))
        }
        Mode::Show { layout } => (build_engine(config, Some(&layout))?, None),
    };

    print_report(&engine, tally.as_ref())
}

fn build_engine(mut config: EngineConfig, layout: Option<&str>) -> Result<Engine> {
    let Some(layout) = layout else {
        return Ok(Engine::new(&config));
    };
    let snapshot = LayoutSnapshot::decode(layout).context("failed to decode layout string")?;
    config.grid = snapshot.grid_layout();
    config::validate(&config).context("layout string describes an unusable grid")?;

    let mut engine = Engine::new(&config);
    snapshot
        .seed(&mut engine)
        .context("failed to seed the layout")?;
    Ok(engine)
}

fn fire(engine: &mut Engine, tally: &mut Tally, shot: Shot, max_ticks: u32) {
    let outcome = engine.attempt_shot(shot.bubble_type, shot.target);
    tally.record_shot(&outcome);

    let mut reports = Vec::new();
    let ticks = engine.settle(max_ticks, &mut reports);
    tally.record_cascades(&reports);
    if !engine.is_settled() {
        tracing::warn!(ticks, "cascade still pending after the tick limit");
    }
}

fn random_shot(rng: &mut ChaCha8Rng, engine: &Engine, elements: u8) -> Shot {
    let layout = query::layout(engine.world());
    let row = rng.gen_range(0..layout.rows() as i32);
    let column = rng.gen_range(0..layout.row_length(row) as i32);
    Shot {
        bubble_type: BubbleType::new(rng.gen_range(1..=elements)),
        target: CellCoord::new(row, column),
    }
}

fn print_report(engine: &Engine, tally: Option<&Tally>) -> Result<()> {
    println!("{}", query::welcome_banner(engine.world()));
    println!();
    print!("{}", board::render(engine));
    println!();

    if let Some(tally) = tally {
        println!(
            "shots: {} placed, {} despawned; merges: {} executed, {} abandoned",
            tally.placed, tally.despawned, tally.merges, tally.abandoned
        );
    }
    let assets = engine.assets();
    let per_tier: Vec<String> = Tier::ALL
        .iter()
        .map(|tier| {
            let count = assets.iter().filter(|asset| asset.tier() == *tier).count();
            format!("{} {count}", tier.label())
        })
        .collect();
    println!("assets: {} ({})", assets.len(), per_tier.join(", "));

    let violations = engine.ownership_violations();
    if !violations.is_empty() {
        println!("ownership violations: {violations:?}");
    }

    let encoded = LayoutSnapshot::capture(engine)
        .encode()
        .context("failed to export the layout")?;
    println!("layout: {encoded}");
    Ok(())
}

fn parse_shot(value: &str) -> Result<Shot, String> {
    let malformed = || format!("expected <type>@<row>,<column>, found '{value}'");
    let (kind, cell) = value.split_once('@').ok_or_else(malformed)?;
    let (row, column) = cell.split_once(',').ok_or_else(malformed)?;
    let row = row.trim().parse::<i32>().map_err(|_| malformed())?;
    let column = column.trim().parse::<i32>().map_err(|_| malformed())?;

    Ok(Shot {
        bubble_type: parse_bubble_type(kind.trim())?,
        target: CellCoord::new(row, column),
    })
}

fn parse_bubble_type(value: &str) -> Result<BubbleType, String> {
    if let Ok(code) = value.parse::<u8>() {
        return Ok(BubbleType::new(code));
    }
    (1..=30)
        .map(BubbleType::new)
        .find(|bubble_type| bubble_type.name().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown bubble type '{value}'"))
}
