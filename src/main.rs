//! Riichi Table - Main Binary
//!
//! Play against AI seats from the terminal, or run all-AI simulations

use anyhow::Context;
use clap::{Parser, Subcommand};
use riichi_table::{
    core::Seat,
    engine::TableEngineFactory,
    game::{
        interactive_controller::spawn_stdin_reader, Actor, InteractiveSeat, OutputFormat,
        SeatTable, Session, TableLogger, TextPresenter, VerbosityLevel,
    },
    simulate::{run_simulation, AiKind, SimulationOptions},
    AiSpeed, DelayProfile, TableConfig,
};
use std::sync::Arc;
use std::time::Instant;

/// Verbosity level for output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "riichi")]
#[command(about = "Riichi Table - Japanese Mahjong turn and call engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play at the table from the terminal
    Play {
        /// Seat taken by the human player (0-3)
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..4))]
        seat: u8,

        /// Let AI play every seat and just watch
        #[arg(long)]
        watch: bool,

        /// AI used for the other seats
        #[arg(long, value_enum, default_value = "random")]
        ai: AiKind,

        /// Decision time limit for the human seat
        #[arg(long, value_enum, default_value = "disabled")]
        delay: DelayProfile,

        /// Pause before each AI action
        #[arg(long, value_enum, default_value = "normal")]
        ai_speed: AiSpeed,

        /// Always declare a winning hand automatically
        #[arg(long)]
        auto_win: bool,

        /// Number of rounds to play
        #[arg(long, short = 'r', default_value_t = 1)]
        rounds: u32,

        /// Set random seed for deterministic play
        #[arg(long)]
        seed: Option<u64>,

        /// Verbosity level for output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Emit log lines as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run all-AI sessions in parallel and report statistics
    Simulate {
        /// Number of sessions
        #[arg(long, short = 's', default_value_t = 1000)]
        sessions: usize,

        /// Rounds per session
        #[arg(long, short = 'r', default_value_t = 4)]
        rounds: u32,

        /// Master seed; session seeds derive from it
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, value_enum, default_value = "random")]
        ai: AiKind,

        /// Probability that a random AI accepts a call
        #[arg(long, default_value_t = 0.3)]
        call_rate: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            seat,
            watch,
            ai,
            delay,
            ai_speed,
            auto_win,
            rounds,
            seed,
            verbosity,
            json,
        } => {
            let config = TableConfig::default()
                .with_decision_delay(delay)
                .with_ai_speed(ai_speed)
                .with_auto_win(auto_win)
                .with_max_rounds(Some(rounds));
            let human = (!watch).then(|| Seat::new(seat));
            run_play(config, human, ai, seed, verbosity.into(), json).await?
        }
        Commands::Simulate {
            sessions,
            rounds,
            seed,
            ai,
            call_rate,
        } => run_simulate(SimulationOptions {
            sessions,
            rounds_per_session: rounds,
            seed,
            ai,
            call_rate,
        }),
    }

    Ok(())
}

async fn run_play(
    config: TableConfig,
    human: Option<Seat>,
    ai: AiKind,
    seed: Option<u64>,
    verbosity: VerbosityLevel,
    json: bool,
) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let logger = Arc::new(TableLogger::with_verbosity(verbosity).output_format(format));
    logger.minimal(&format!("Seed: {seed}"));

    let mut input = None;
    let mut actors = Vec::new();
    for seat in Seat::ALL {
        if Some(seat) == human {
            let (interactive, sender) = InteractiveSeat::channel(seat);
            input = Some(sender);
            actors.push(Actor::Interactive(interactive));
        } else {
            actors.push(Actor::Ai(ai.provider(seat, seed, 0.3)));
        }
    }
    let seats = SeatTable::new(actors)?;

    let (mut session, stream) = Session::new(TableEngineFactory::new(seed), seats, config)?;
    session = session.with_logger(Arc::clone(&logger));
    let mut presenter = TextPresenter::new(Arc::clone(&logger));
    if let Some(seat) = human {
        presenter = presenter.with_player(seat);
    }
    let presenting = presenter.spawn(stream);

    let mut reader = None;
    if let Some(sender) = input {
        logger.minimal(
            "Commands: d <tile>, pon, kan [tile], chii <n>, riichi <tile>, ron, tsumo, y, n, ok, quit",
        );
        reader = Some(spawn_stdin_reader(sender.clone(), session.scope().clone()));
        session = session.with_input(sender);
    }

    let handle = session.spawn();
    let summary = handle.join().await.context("round aborted")?;
    presenting.await.context("presenter task failed")?;

    logger.minimal(&format!(
        "Played {} round(s){}",
        summary.rounds_played(),
        if summary.cancelled { ", table closed" } else { "" }
    ));
    // The stdin reader is blocked on a read; it exits with the process
    drop(reader);
    Ok(())
}

fn run_simulate(options: SimulationOptions) {
    println!("=== Riichi Table - Simulation ===\n");
    println!(
        "Running {} sessions of {} round(s), seed {}, {:?} AI\n",
        options.sessions, options.rounds_per_session, options.seed, options.ai
    );

    let start = Instant::now();
    let stats = run_simulation(&options);
    let elapsed = start.elapsed();

    println!("{stats}");
    println!(
        "\nElapsed time: {:.2}s ({:.1} rounds/s)",
        elapsed.as_secs_f64(),
        stats.rounds as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
}
