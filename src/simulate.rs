//! Full-simulation mode: many all-AI sessions in parallel
//!
//! Sessions run on rayon's pool, each on its own current-thread tokio
//! runtime, with a seed derived from the master seed and the session
//! index so any single session can be replayed on its own.

use crate::config::TableConfig;
use crate::core::{Seat, SEAT_COUNT};
use crate::engine::TableEngineFactory;
use crate::game::controller::DecisionProvider;
use crate::game::events::RoundOutcome;
use crate::game::random_controller::RandomController;
use crate::game::seats::SeatTable;
use crate::game::session::{Session, SessionSummary};
use crate::game::tsumogiri_controller::TsumogiriController;
use crate::Result;
use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which AI fills the seats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum AiKind {
    /// Discards every drawn tile
    Tsumogiri,
    /// Random legal choices
    #[default]
    Random,
}

impl AiKind {
    pub fn provider(self, seat: Seat, seed: u64, call_rate: f64) -> Box<dyn DecisionProvider> {
        match self {
            AiKind::Tsumogiri => Box::new(TsumogiriController::new(seat)),
            AiKind::Random => Box::new(
                RandomController::with_seed(seat, seed.wrapping_add(seat.as_u8() as u64))
                    .with_call_rate(call_rate),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub sessions: usize,
    pub rounds_per_session: u32,
    pub seed: u64,
    pub ai: AiKind,
    pub call_rate: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            sessions: 100,
            rounds_per_session: 4,
            seed: 42,
            ai: AiKind::default(),
            call_rate: 0.3,
        }
    }
}

impl SimulationOptions {
    /// Seed of one session
    pub fn session_seed(&self, index: usize) -> u64 {
        self.seed
            .wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Aggregated results of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub sessions: usize,
    pub rounds: usize,
    pub ron_wins: [usize; SEAT_COUNT],
    pub tsumo_wins: [usize; SEAT_COUNT],
    pub multi_ron_rounds: usize,
    pub robbed_kans: usize,
    pub exhaustive_draws: usize,
    pub aborted_sessions: usize,
}

impl SimulationStats {
    pub fn record(&mut self, summary: &SessionSummary) {
        self.sessions += 1;
        for outcome in &summary.rounds {
            self.rounds += 1;
            match outcome {
                RoundOutcome::Ron {
                    winners,
                    robbed_kan,
                    ..
                } => {
                    for winner in winners {
                        self.ron_wins[winner.index()] += 1;
                    }
                    if winners.len() > 1 {
                        self.multi_ron_rounds += 1;
                    }
                    if *robbed_kan {
                        self.robbed_kans += 1;
                    }
                }
                RoundOutcome::Tsumo { winner, .. } => self.tsumo_wins[winner.index()] += 1,
                RoundOutcome::ExhaustiveDraw => self.exhaustive_draws += 1,
            }
        }
    }

    pub fn record_abort(&mut self) {
        self.sessions += 1;
        self.aborted_sessions += 1;
    }

    pub fn merge(mut self, other: SimulationStats) -> SimulationStats {
        self.sessions += other.sessions;
        self.rounds += other.rounds;
        for seat in 0..SEAT_COUNT {
            self.ron_wins[seat] += other.ron_wins[seat];
            self.tsumo_wins[seat] += other.tsumo_wins[seat];
        }
        self.multi_ron_rounds += other.multi_ron_rounds;
        self.robbed_kans += other.robbed_kans;
        self.exhaustive_draws += other.exhaustive_draws;
        self.aborted_sessions += other.aborted_sessions;
        self
    }
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |n: usize| {
            if self.rounds == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.rounds as f64
            }
        };
        writeln!(f, "Sessions: {} ({} aborted)", self.sessions, self.aborted_sessions)?;
        writeln!(f, "Rounds:   {}", self.rounds)?;
        for seat in Seat::ALL {
            let i = seat.index();
            writeln!(
                f,
                "  {seat}: ron {} ({:.1}%), tsumo {} ({:.1}%)",
                self.ron_wins[i],
                pct(self.ron_wins[i]),
                self.tsumo_wins[i],
                pct(self.tsumo_wins[i])
            )?;
        }
        writeln!(f, "Multi-ron rounds: {}", self.multi_ron_rounds)?;
        writeln!(f, "Robbed kans:      {}", self.robbed_kans)?;
        write!(
            f,
            "Exhaustive draws: {} ({:.1}%)",
            self.exhaustive_draws,
            pct(self.exhaustive_draws)
        )
    }
}

/// Play one all-AI session to completion on the current thread
pub fn run_session(options: &SimulationOptions, index: usize) -> Result<SessionSummary> {
    let seed = options.session_seed(index);
    let seats = SeatTable::all_ai(|seat| options.ai.provider(seat, seed, options.call_rate));
    let config = TableConfig::default().with_max_rounds(Some(options.rounds_per_session));
    let (session, _events) = Session::new(TableEngineFactory::new(seed), seats, config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(session.run())
}

/// Run every session in parallel and aggregate the results
pub fn run_simulation(options: &SimulationOptions) -> SimulationStats {
    (0..options.sessions)
        .into_par_iter()
        .map(|index| {
            let mut stats = SimulationStats::default();
            match run_session(options, index) {
                Ok(summary) => stats.record(&summary),
                Err(e) => {
                    eprintln!("Warning: session {index} aborted: {e}");
                    stats.record_abort();
                }
            }
            stats
        })
        .reduce(SimulationStats::default, SimulationStats::merge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let mut stats = SimulationStats::default();
        stats.record(&SessionSummary {
            rounds: vec![
                RoundOutcome::Ron {
                    winners: vec![Seat::new(1), Seat::new(2)],
                    loser: Seat::new(0),
                    tile: "5m".parse().unwrap(),
                    robbed_kan: true,
                },
                RoundOutcome::Tsumo {
                    winner: Seat::new(3),
                    tile: None,
                    compensation: false,
                },
                RoundOutcome::ExhaustiveDraw,
            ],
            cancelled: false,
        });
        assert_eq!(stats.rounds, 3);
        assert_eq!(stats.ron_wins, [0, 1, 1, 0]);
        assert_eq!(stats.tsumo_wins, [0, 0, 0, 1]);
        assert_eq!(stats.multi_ron_rounds, 1);
        assert_eq!(stats.robbed_kans, 1);
        assert_eq!(stats.exhaustive_draws, 1);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let options = SimulationOptions {
            sessions: 4,
            rounds_per_session: 2,
            seed: 7,
            ..Default::default()
        };
        let first = run_simulation(&options);
        let second = run_simulation(&options);
        assert_eq!(first, second);
        assert_eq!(first.sessions, 4);
        assert_eq!(first.rounds + first.aborted_sessions * 2, 8);
    }

    #[test]
    fn test_session_seeds_differ() {
        let options = SimulationOptions::default();
        assert_ne!(options.session_seed(0), options.session_seed(1));
    }
}
