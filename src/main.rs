//! # Brawl — arena timed event runner
//!
//! Usage:
//!   brawl validate demos/arena.toml          # Check config + descriptors
//!   brawl run demos/arena.toml               # Run a demo cycle
//!   brawl run demos/arena.toml --duration 60s --participants ana,bo

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brawl_core::duration::parse_duration;
use brawl_core::{ArenaConfig, LogParticipant};
use brawl_events::{ActionRegistry, EventKind, LiveCompetition};

#[derive(Parser)]
#[command(name = "brawl", version, about = "⚔️ Brawl — arena timed event runner")]
struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a config and resolve every action descriptor.
    Validate {
        /// Path to the arena config toml
        config: PathBuf,
    },
    /// Run one event cycle against demo participants.
    Run {
        /// Path to the arena config toml
        config: PathBuf,

        /// How long to keep the cycle running
        #[arg(long, default_value = "30s")]
        duration: String,

        /// Comma-separated demo participant names
        #[arg(long, default_value = "ana,bo")]
        participants: String,

        /// Phase to enter before starting events
        #[arg(long, default_value = "ingame")]
        phase: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "brawl=debug,brawl_events=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    match cli.command {
        Command::Validate { config } => validate(&config),
        Command::Run {
            config,
            duration,
            participants,
            phase,
        } => run(&config, &duration, &participants, &phase).await,
    }
}

fn validate(path: &PathBuf) -> Result<()> {
    let config = ArenaConfig::load_from(path)?;
    let registry = ActionRegistry::with_defaults();
    let competition = LiveCompetition::from_config(&config, &registry)
        .with_context(|| format!("config {} did not validate", path.display()))?;

    println!("✅ {} is valid", path.display());
    println!("   arena: {}", competition.arena());
    println!("   timed events:");
    for id in competition.scheduler().timed_event_ids() {
        println!("     - {id}");
    }
    println!("   periodic events:");
    for id in competition.scheduler().periodic_event_ids() {
        println!("     - {id}");
    }
    println!("   action kinds available: {}", registry.names().join(", "));
    Ok(())
}

async fn run(path: &PathBuf, duration: &str, participants: &str, phase: &str) -> Result<()> {
    let window = parse_duration(duration).context("invalid --duration")?;
    let config = ArenaConfig::load_from(path)?;
    let registry = ActionRegistry::with_defaults();
    let competition = LiveCompetition::from_config(&config, &registry)?;

    for (i, name) in participants.split(',').map(str::trim).enumerate() {
        if name.is_empty() {
            continue;
        }
        competition.add_participant(Arc::new(LogParticipant::new(format!("p{}", i + 1), name)));
    }

    competition.set_phase(phase);
    competition.start_timed_events();
    tokio::time::sleep(window).await;

    // Snapshot bookkeeping before stop() clears it.
    println!("\n⚔️ Cycle over after {window:?}");
    for (id, info) in competition.scheduler().all_execution_info() {
        let kind = match info.kind {
            EventKind::Timed => "timed",
            EventKind::Periodic => "periodic",
        };
        println!(
            "   {id} ({kind}): executed={} count={} next={}",
            info.executed,
            info.execution_count,
            info.next_execution_time()
        );
    }
    competition.stop_timed_events();
    Ok(())
}
