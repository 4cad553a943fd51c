//! Performance benchmarks for full rounds
//!
//! Plays all-AI rounds on a shuffled table through the turn scheduler.
//! Two iteration modes:
//!
//! 1. **Fresh** - Shuffle and deal a new table for each iteration
//! 2. **Snapshot** - Clone a pre-dealt table each iteration
//!
//! Build with `--no-default-features` to leave out the verbose logging
//! formatting from the measured loop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use riichi_table::{
    core::Seat,
    engine::{RoundEngine, TableEngine},
    game::{events, CancellationScope, RandomController, SeatTable, TurnScheduler},
    Result,
};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Metrics collected during one round
#[derive(Debug, Clone)]
struct RoundMetrics {
    /// Commands the engine recorded
    actions: usize,
    wall_left: usize,
    duration: Duration,
}

impl RoundMetrics {
    fn rounds_per_sec(&self) -> f64 {
        1.0 / self.duration.as_secs_f64()
    }

    fn actions_per_sec(&self) -> f64 {
        self.actions as f64 / self.duration.as_secs_f64()
    }
}

fn seats(seed: u64) -> SeatTable {
    SeatTable::all_ai(|seat| {
        Box::new(RandomController::with_seed(seat, seed + seat.as_u8() as u64).with_call_rate(0.3))
    })
}

fn play(runtime: &Runtime, engine: &mut TableEngine, seed: u64) -> Result<()> {
    let mut seats = seats(seed);
    let scope = CancellationScope::new();
    let (sink, _stream) = events::channel(&scope);
    runtime.block_on(async {
        TurnScheduler::new(engine, &mut seats, sink, scope)
            .run_round()
            .await
    })?;
    Ok(())
}

fn run_round_with_metrics(runtime: &Runtime, seed: u64) -> Result<RoundMetrics> {
    let start = std::time::Instant::now();
    let mut engine = TableEngine::new(seed, Seat::new(0));
    play(runtime, &mut engine, seed)?;

    Ok(RoundMetrics {
        actions: engine.undo_log().len(),
        wall_left: engine.wall_remaining(),
        duration: start.elapsed(),
    })
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to create tokio runtime")
}

/// Benchmark: Fresh mode - deal a new table each iteration
fn bench_round_fresh(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("round_execution");
    group.measurement_time(Duration::from_secs(10));

    let seed = 42u64;
    println!("\nWarmup round (seed {}):", seed);
    if let Ok(metrics) = run_round_with_metrics(&runtime, seed) {
        println!("  Actions: {}", metrics.actions);
        println!("  Wall left: {}", metrics.wall_left);
        println!("  Duration: {:?}", metrics.duration);
        println!("  Rounds/sec: {:.2}", metrics.rounds_per_sec());
        println!("  Actions/sec: {:.2}", metrics.actions_per_sec());
    }

    group.bench_with_input(BenchmarkId::new("fresh", seed), &seed, |b, &seed| {
        b.iter(|| {
            run_round_with_metrics(&runtime, black_box(seed))
                .expect("Round should complete successfully")
        });
    });

    group.finish();
}

/// Benchmark: Snapshot mode - clone a pre-dealt table each iteration
fn bench_round_snapshot(c: &mut Criterion) {
    let runtime = runtime();
    let mut group = c.benchmark_group("round_execution");
    group.measurement_time(Duration::from_secs(10));

    let seed = 42u64;
    let initial = TableEngine::new(seed, Seat::new(0));

    group.bench_function(BenchmarkId::new("snapshot", seed), |b| {
        b.iter(|| {
            let mut engine = initial.clone();
            play(&runtime, &mut engine, black_box(seed))
                .expect("Round should complete successfully");
            engine
        });
    });

    group.finish();
}

criterion_group!(benches, bench_round_fresh, bench_round_snapshot);
criterion_main!(benches);
