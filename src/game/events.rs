//! Scheduler notifications
//!
//! The scheduler emits a typed, ordered event stream; presentation consumes
//! it on its own task. Delivery is fire-and-forget and stops once the
//! session is cancelled, except for a `RoundAborted` queued before the
//! cancellation: that one still reaches the consumer as the last event.

use crate::core::{CallKind, Seat, Tile};
use crate::engine::RoundSnapshot;
use crate::game::cancel::CancellationScope;
use crate::game::offer::{DecisionKind, Offer};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// How a decision window was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowResolution {
    /// The seat answered before the deadline
    Explicit,
    /// The deadline passed and the default action fired
    Expired,
    /// The session was torn down while the window was open
    Cancelled,
}

/// How a round finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Ron {
        /// Winners in seat order from the loser
        winners: Vec<Seat>,
        loser: Seat,
        tile: Tile,
        /// The winning tile was taken from a kan declaration
        robbed_kan: bool,
    },
    Tsumo {
        winner: Seat,
        tile: Option<Tile>,
        compensation: bool,
    },
    ExhaustiveDraw,
}

impl RoundOutcome {
    pub fn winners(&self) -> Vec<Seat> {
        match self {
            RoundOutcome::Ron { winners, .. } => winners.clone(),
            RoundOutcome::Tsumo { winner, .. } => vec![*winner],
            RoundOutcome::ExhaustiveDraw => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerEvent {
    RoundStarted {
        round: u32,
        dealer: Seat,
        wall_remaining: usize,
    },
    TilePicked {
        seat: Seat,
        tile: Tile,
        compensation: bool,
    },
    TileDiscarded {
        seat: Seat,
        tile: Tile,
        riichi: bool,
    },
    CallAccepted {
        kind: CallKind,
        seat: Seat,
        tile: Option<Tile>,
        snapshot: RoundSnapshot,
    },
    /// The engine refused a command the scheduler believed legal
    CommandRejected { seat: Seat, command: String },
    /// A compensation draw was returned after its kan was robbed
    CompensationUndone { seat: Seat },
    WindowOpened {
        id: u64,
        seat: Seat,
        kind: DecisionKind,
        offer: Offer,
        /// The deciding seat's hand, for display
        hand: Vec<Tile>,
        timeout_ms: Option<u64>,
    },
    WindowClosed {
        id: u64,
        seat: Seat,
        resolution: WindowResolution,
    },
    WallCountChanged { remaining: usize },
    RoundEnded { round: u32, outcome: RoundOutcome },
    RoundAborted { round: u32, reason: String },
    /// Results are on display; the next round waits for acknowledgement
    AwaitingAcknowledgement { round: u32 },
}

/// Sending side held by the scheduler
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SchedulerEvent>,
    scope: CancellationScope,
}

impl EventSink {
    /// Queue an event; a no-op once the scope is cancelled
    pub fn emit(&self, event: SchedulerEvent) {
        if self.scope.is_cancelled() {
            return;
        }
        // A dropped receiver just means nobody is watching
        let _ = self.tx.send(event);
    }
}

/// Receiving side consumed by presentation
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<SchedulerEvent>,
    scope: CancellationScope,
    /// Events passed over while looking for the abort notice
    skipped: Vec<SchedulerEvent>,
}

impl EventStream {
    /// Next event in emission order
    ///
    /// Returns `None` when the scheduler is gone or the scope was cancelled.
    /// A round aborted right before cancellation is still reported once.
    pub async fn next(&mut self) -> Option<SchedulerEvent> {
        if !self.scope.is_cancelled() {
            tokio::select! {
                biased;
                _ = self.scope.cancelled() => {}
                event = self.rx.recv() => return event,
            }
        }
        self.terminal()
    }

    fn terminal(&mut self) -> Option<SchedulerEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if matches!(event, SchedulerEvent::RoundAborted { .. }) {
                return Some(event);
            }
            self.skipped.push(event);
        }
        None
    }

    /// Take every queued event regardless of cancellation
    ///
    /// For diagnostics and tests that inspect a finished round.
    pub fn drain_undelivered(&mut self) -> Vec<SchedulerEvent> {
        let mut events = std::mem::take(&mut self.skipped);
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn channel(scope: &CancellationScope) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSink {
            tx,
            scope: scope.clone(),
        },
        EventStream {
            rx,
            scope: scope.clone(),
            skipped: Vec::new(),
        },
    )
}
