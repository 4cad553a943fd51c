//! Text presentation of scheduler events
//!
//! Runs as its own task and only ever sees the event stream, never the
//! engine.

use crate::core::{Seat, Tile};
use crate::game::events::{EventStream, SchedulerEvent, WindowResolution};
use crate::game::logger::{TableLogger, VerbosityLevel};
use crate::game::scheduler::describe;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct TextPresenter {
    logger: Arc<TableLogger>,
    /// The interactive seat, whose windows get a full prompt
    player: Option<Seat>,
}

impl TextPresenter {
    pub fn new(logger: Arc<TableLogger>) -> Self {
        TextPresenter {
            logger,
            player: None,
        }
    }

    pub fn with_player(mut self, seat: Seat) -> Self {
        self.player = Some(seat);
        self
    }

    /// Render events until the stream ends; returns how many were seen
    pub fn spawn(self, mut stream: EventStream) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut seen = 0;
            while let Some(event) = stream.next().await {
                self.present(&event);
                seen += 1;
            }
            seen
        })
    }

    pub fn present(&self, event: &SchedulerEvent) {
        let Some((level, line)) = self.render(event) else {
            return;
        };
        match level {
            VerbosityLevel::Silent => {}
            VerbosityLevel::Minimal => self.logger.minimal(&line),
            VerbosityLevel::Normal => self.logger.normal(&line),
            VerbosityLevel::Verbose => self.logger.verbose(&line),
        }
    }

    fn is_player(&self, seat: Seat) -> bool {
        self.player == Some(seat)
    }

    /// The line for an event and the verbosity it belongs to
    pub fn render(&self, event: &SchedulerEvent) -> Option<(VerbosityLevel, String)> {
        use VerbosityLevel::*;

        let rendered = match event {
            SchedulerEvent::RoundStarted {
                round,
                dealer,
                wall_remaining,
            } => (
                Minimal,
                format!("=== Round {} ({dealer} deals, {wall_remaining} in wall) ===", round + 1),
            ),
            SchedulerEvent::TilePicked {
                seat,
                tile,
                compensation,
            } => {
                let from = if *compensation { " from the dead wall" } else { "" };
                if self.is_player(*seat) {
                    (Normal, format!("You draw {tile}{from}"))
                } else {
                    (Verbose, format!("{seat} draws{from}"))
                }
            }
            SchedulerEvent::TileDiscarded { seat, tile, riichi } => {
                let declared = if *riichi { " and declares riichi" } else { "" };
                (Normal, format!("{seat} discards {tile}{declared}"))
            }
            SchedulerEvent::CallAccepted {
                kind, seat, tile, ..
            } => match tile {
                Some(tile) => (Normal, format!("{seat}: {kind} ({tile})")),
                None => (Normal, format!("{seat}: {kind}")),
            },
            SchedulerEvent::CommandRejected { seat, command } => {
                (Verbose, format!("{seat}: '{command}' was refused"))
            }
            SchedulerEvent::CompensationUndone { seat } => {
                (Normal, format!("{seat}'s kan is robbed, replacement tile returned"))
            }
            SchedulerEvent::WindowOpened {
                seat,
                offer,
                hand,
                timeout_ms,
                ..
            } => {
                if !self.is_player(*seat) {
                    return None;
                }
                let limit = timeout_ms
                    .map(|ms| format!(" ({}s)", ms / 1000))
                    .unwrap_or_default();
                (
                    Minimal,
                    format!("Hand: {}\nYou may {offer}{limit}", tiles(hand)),
                )
            }
            SchedulerEvent::WindowClosed {
                seat, resolution, ..
            } => match resolution {
                WindowResolution::Expired if self.is_player(*seat) => {
                    (Normal, "Time is up, default action taken".to_string())
                }
                _ => return None,
            },
            SchedulerEvent::WallCountChanged { remaining } => {
                (Verbose, format!("{remaining} tiles left"))
            }
            SchedulerEvent::RoundEnded { outcome, .. } => (Minimal, describe(outcome)),
            SchedulerEvent::RoundAborted { round, reason } => {
                (Minimal, format!("Round {} aborted: {reason}", round + 1))
            }
            SchedulerEvent::AwaitingAcknowledgement { .. } => {
                (Minimal, "Type 'ok' for the next round".to_string())
            }
        };
        Some(rendered)
    }
}

fn tiles(hand: &[Tile]) -> String {
    hand.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
