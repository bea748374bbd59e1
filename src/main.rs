use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ctb_battle::{
    validate_catalogs, AutoMenu, BattleConfig, BattleRunner, ConsolePresenter, Encounter,
};

const DEMO_ENCOUNTER: &str = include_str!("../data/demo.ron");

/// Plays one battle with every party member on autopilot.
#[derive(Debug, Parser)]
#[command(name = "ctb-battle", version, about)]
struct Args {
    /// Battle tuning values (RON). Defaults apply to anything left out.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Party and enemies to fight (RON). Plays the built-in demo when omitted.
    #[arg(long)]
    encounter: Option<PathBuf>,

    /// Seed for the battle's random source; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Print events as JSON lines instead of battle text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    validate_catalogs().context("embedded catalogs are malformed")?;

    let mut config = match &args.config {
        Some(path) => BattleConfig::from_ron_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => BattleConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let encounter = match &args.encounter {
        Some(path) => Encounter::from_ron_file(path)
            .with_context(|| format!("reading encounter {}", path.display()))?,
        None => Encounter::from_ron_str(DEMO_ENCOUNTER).context("parsing the demo encounter")?,
    };
    info!(
        party = encounter.party.len(),
        enemies = encounter.enemies.len(),
        "starting battle"
    );

    let mut runner = BattleRunner::new(
        encounter.templates(),
        config,
        Box::new(AutoMenu),
        Box::new(ConsolePresenter),
    )?;

    let mut printed = 0;
    loop {
        let advanced = runner.advance();
        let events = runner.bus().since(printed);
        for event in events {
            if args.json {
                println!("{}", serde_json::to_string(event)?);
            } else if let Some(text) = event.format(runner.state()) {
                println!("{}", text);
            }
        }
        printed += events.len();
        advanced?;
        if runner.outcome().is_some() {
            break;
        }
    }

    let info = runner.info();
    if args.json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!();
        if let Some(outcome) = info.outcome {
            println!("Outcome: {:?} after {} turns", outcome, info.turn_number);
        }
        for unit in &info.units {
            println!("  {}", unit);
        }
    }
    Ok(())
}
