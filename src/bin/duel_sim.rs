//! duel-sim: run bot-vs-bot duels from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use duel_engine::{
    ActiveStrategy, DuelEngine, EngineConfig, GuessStrategy, MatchOutcome, MemoryStore,
    NullPublisher, Orchestrator, Participant, ParticipantId, Seat, SimulationSummary,
};

#[derive(Parser)]
#[command(name = "duel-sim")]
#[command(about = "Simulate bot-vs-bot duels", long_about = None)]
struct Cli {
    /// Root seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Resolved turns per match before the run stops
    #[arg(long, default_value_t = 100)]
    max_turns: u32,

    /// Number of matches to play
    #[arg(long, default_value_t = 1)]
    matches: u32,

    /// Active strategy for seat A (random, defensive, aggressive)
    #[arg(long, default_value = "random")]
    active_a: ActiveStrategy,

    /// Guess strategy for seat A (always_equal, random, smart)
    #[arg(long, default_value = "smart")]
    guess_a: GuessStrategy,

    /// Active strategy for seat B
    #[arg(long, default_value = "random")]
    active_b: ActiveStrategy,

    /// Guess strategy for seat B
    #[arg(long, default_value = "smart")]
    guess_b: GuessStrategy,

    /// Engine config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: Level,

    /// Print one JSON summary per line
    #[arg(long, default_value = "false")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let engine = DuelEngine::new(Arc::new(MemoryStore::new()), config, Arc::new(NullPublisher))
        .context("building engine")?;
    let orchestrator = Orchestrator::new(engine.clone());

    let mut wins = [0u32; 2];
    let mut draws = 0u32;

    for n in 0..u64::from(cli.matches) {
        let a = Participant::bot(ParticipantId::new(2 * n + 1), cli.active_a, cli.guess_a);
        let b = Participant::bot(ParticipantId::new(2 * n + 2), cli.active_b, cli.guess_b);
        let match_id = engine.start_match(a, b).context("starting match")?;

        let handle = orchestrator
            .run_auto_simulation(match_id, cli.max_turns)
            .with_context(|| format!("starting simulation for {match_id}"))?;
        let summary = handle.join().await.context("waiting for simulation")?;

        match summary.outcome {
            Some(MatchOutcome::Winner(id)) if id == a.id => wins[0] += 1,
            Some(MatchOutcome::Winner(_)) => wins[1] += 1,
            Some(MatchOutcome::Draw) => draws += 1,
            None => {}
        }
        report(&summary, cli.json)?;
    }

    if !cli.json {
        println!(
            "seat A wins: {}, seat B wins: {}, draws: {}, unfinished: {}",
            wins[0],
            wins[1],
            draws,
            cli.matches - wins[0] - wins[1] - draws
        );
    }
    Ok(())
}

fn report(summary: &SimulationSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary).context("encoding summary")?);
        return Ok(());
    }

    let outcome = match summary.outcome {
        Some(MatchOutcome::Winner(id)) => format!("winner {id}"),
        Some(MatchOutcome::Draw) => "draw".to_string(),
        None => "unfinished".to_string(),
    };
    println!(
        "{}: {:?} after {} turns ({} iterations), score {}-{}, {}",
        summary.match_id,
        summary.reason,
        summary.turns_resolved,
        summary.iterations,
        summary.scores[Seat::A],
        summary.scores[Seat::B],
        outcome
    );
    Ok(())
}
