//! Call arbitration for a single discard (or an added kan tile)
//!
//! Priority is Ron, then Pon/Kan, then Chii. Every Ron candidate is asked
//! before anything else and all who accept win together. Pon/Kan candidates
//! are asked in seating order from the discarder and the first accepted
//! claim the engine executes ends arbitration. Chii is considered last and
//! only for the seat after the discarder.
//!
//! The arbiter never touches the engine after the initial scan. It is
//! driven step by step so the scheduler can await decisions and execute
//! claims in between:
//!
//! ```ignore
//! let mut arbiter = CallArbiter::scan(engine, discarder, tile, ScanScope::Discard);
//! let verdict = loop {
//!     match arbiter.step() {
//!         ArbiterStep::Ask { seat, offer } => arbiter.answer(seat, decide(seat, offer))?,
//!         ArbiterStep::Execute(claim) => arbiter.executed(execute(claim))?,
//!         ArbiterStep::Done(verdict) => break verdict,
//!     }
//! };
//! ```

use crate::core::{CallKind, ChiiOption, PendingCall, Seat, Tile};
use crate::engine::RoundEngine;
use crate::game::offer::{Choice, Offer};
use crate::{Result, TableError};

/// What the eligibility scan looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// A regular discard: ron, pon/kan and chii
    Discard,
    /// A tile added to a kan: only ron can take it
    KanRobbing,
}

/// A meld claim awaiting execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Pon { seat: Seat, tile: Tile },
    Kan { seat: Seat, tile: Tile },
    Chii { seat: Seat, option: ChiiOption },
}

impl Claim {
    pub fn seat(&self) -> Seat {
        match self {
            Claim::Pon { seat, .. } | Claim::Kan { seat, .. } | Claim::Chii { seat, .. } => *seat,
        }
    }

    pub fn kind(&self) -> CallKind {
        match self {
            Claim::Pon { .. } => CallKind::Pon,
            Claim::Kan { .. } => CallKind::Kan,
            Claim::Chii { .. } => CallKind::Chii,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ron { winners: Vec<Seat>, loser: Seat },
    Claimed(Claim),
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterStep {
    Ask { seat: Seat, offer: Offer },
    Execute(Claim),
    Done(Verdict),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Ron(usize),
    Melds(usize),
    Chii,
    Closed,
}

/// Settle pon versus kan for one seat: an accepted kan wins
pub fn resolve_meld_intent(pon_accepted: bool, kan_accepted: bool) -> Option<CallKind> {
    if kan_accepted {
        Some(CallKind::Kan)
    } else if pon_accepted {
        Some(CallKind::Pon)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct CallArbiter {
    discarder: Seat,
    tile: Tile,
    scope: ScanScope,
    /// Eligible calls in the order they are offered
    calls: Vec<PendingCall>,

    stage: Stage,
    asking: Option<(Seat, Offer)>,
    pending: Option<Claim>,
    winners: Vec<Seat>,
    verdict: Option<Verdict>,
}

impl CallArbiter {
    /// Query every other seat's eligibility on `tile`
    pub fn scan(engine: &dyn RoundEngine, discarder: Seat, tile: Tile, scope: ScanScope) -> Self {
        let mut calls: Vec<PendingCall> = discarder
            .others()
            .filter(|&seat| engine.can_call_ron(seat))
            .map(|seat| PendingCall::new(seat, CallKind::Ron))
            .collect();

        if scope == ScanScope::Discard {
            for seat in discarder.others() {
                let kan_tiles = engine.can_call_kan(seat);
                if !kan_tiles.is_empty() {
                    calls.push(PendingCall::with_tiles(seat, CallKind::Kan, &kan_tiles));
                }
                if engine.can_call_pon(seat) {
                    calls.push(PendingCall::new(seat, CallKind::Pon));
                }
            }
            let next = discarder.next();
            let options = engine.can_call_chii(next);
            if !options.is_empty() {
                calls.push(PendingCall::with_runs(next, &options));
            }
        }

        CallArbiter {
            discarder,
            tile,
            scope,
            calls,
            stage: Stage::Ron(0),
            asking: None,
            pending: None,
            winners: Vec::new(),
            verdict: None,
        }
    }

    /// No seat can call anything
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Every eligible call found by the scan, highest priority first
    pub fn candidates(&self) -> &[PendingCall] {
        &self.calls
    }

    fn ron_seat(&self, i: usize) -> Option<Seat> {
        self.calls
            .iter()
            .filter(|c| c.kind == CallKind::Ron)
            .nth(i)
            .map(|c| c.seat)
    }

    /// The i-th seat holding a pon or kan, with what it may call
    fn meld_seat(&self, i: usize) -> Option<(Seat, bool, bool)> {
        let mut seats: Vec<Seat> = Vec::new();
        for call in &self.calls {
            if matches!(call.kind, CallKind::Pon | CallKind::Kan) && !seats.contains(&call.seat) {
                seats.push(call.seat);
            }
        }
        let seat = *seats.get(i)?;
        let has = |kind| self.calls.iter().any(|c| c.seat == seat && c.kind == kind);
        Some((seat, has(CallKind::Pon), has(CallKind::Kan)))
    }

    fn chii_call(&self) -> Option<&PendingCall> {
        self.calls.iter().find(|c| c.kind == CallKind::Chii)
    }

    /// The next thing the scheduler must do
    pub fn step(&mut self) -> ArbiterStep {
        if let Some(verdict) = &self.verdict {
            return ArbiterStep::Done(verdict.clone());
        }
        if let Some(claim) = self.pending {
            return ArbiterStep::Execute(claim);
        }
        if let Some((seat, offer)) = &self.asking {
            return ArbiterStep::Ask {
                seat: *seat,
                offer: offer.clone(),
            };
        }

        loop {
            match self.stage {
                Stage::Ron(i) => {
                    if let Some(seat) = self.ron_seat(i) {
                        return self.ask(
                            seat,
                            Offer::Ron {
                                tile: self.tile,
                                from: self.discarder,
                            },
                        );
                    }
                    if !self.winners.is_empty() {
                        return self.finish(Verdict::Ron {
                            winners: self.winners.clone(),
                            loser: self.discarder,
                        });
                    }
                    if self.scope == ScanScope::KanRobbing {
                        return self.finish(Verdict::Pass);
                    }
                    self.stage = Stage::Melds(0);
                }
                Stage::Melds(i) => match self.meld_seat(i) {
                    Some((seat, pon, kan)) => {
                        return self.ask(
                            seat,
                            Offer::Meld {
                                tile: self.tile,
                                pon,
                                kan,
                            },
                        );
                    }
                    None => self.stage = Stage::Chii,
                },
                Stage::Chii => {
                    self.stage = Stage::Closed;
                    if let Some(call) = self.chii_call() {
                        let (seat, options) = (call.seat, call.runs().to_vec());
                        return self.ask(
                            seat,
                            Offer::Chii {
                                tile: self.tile,
                                options,
                            },
                        );
                    }
                }
                Stage::Closed => return self.finish(Verdict::Pass),
            }
        }
    }

    /// Record the answer of the seat currently being asked
    ///
    /// A choice that the current tier has no branch for is fatal.
    pub fn answer(&mut self, seat: Seat, choice: Choice) -> Result<()> {
        match &self.asking {
            Some((asked, _)) if *asked == seat => {}
            _ => {
                return Err(TableError::Unreachable(format!(
                    "answer from {seat} while it was not being asked"
                )))
            }
        }
        self.asking = None;

        match (self.stage, choice) {
            (Stage::Ron(i), Choice::Ron) => {
                self.winners.push(seat);
                self.stage = Stage::Ron(i + 1);
            }
            (Stage::Ron(i), Choice::Skip) => self.stage = Stage::Ron(i + 1),
            (Stage::Melds(_), Choice::Pon) => {
                self.pending = Some(Claim::Pon {
                    seat,
                    tile: self.tile,
                })
            }
            (Stage::Melds(_), Choice::Kan(_)) => {
                self.pending = Some(Claim::Kan {
                    seat,
                    tile: self.tile,
                })
            }
            (Stage::Melds(i), Choice::Skip) => self.stage = Stage::Melds(i + 1),
            (Stage::Closed, Choice::Chii(start)) => {
                let option = self
                    .chii_call()
                    .and_then(|call| call.runs().iter().find(|o| o.start == start).copied())
                    .ok_or_else(|| {
                        TableError::Unreachable(format!("chii from {start} was never offered"))
                    })?;
                self.pending = Some(Claim::Chii { seat, option });
            }
            (Stage::Closed, Choice::Skip) => {}
            (stage, choice) => {
                return Err(TableError::Unreachable(format!(
                    "no branch for {choice} from {seat} at {stage:?}"
                )))
            }
        }
        Ok(())
    }

    /// Report whether the engine accepted the pending claim
    ///
    /// A rejected claim counts as never made; arbitration moves on to the
    /// next candidate.
    pub fn executed(&mut self, accepted: bool) -> Result<()> {
        let claim = self.pending.take().ok_or_else(|| {
            TableError::Unreachable("execution reported with no pending claim".to_string())
        })?;
        if accepted {
            self.verdict = Some(Verdict::Claimed(claim));
        } else if let Stage::Melds(i) = self.stage {
            self.stage = Stage::Melds(i + 1);
        }
        Ok(())
    }

    fn ask(&mut self, seat: Seat, offer: Offer) -> ArbiterStep {
        self.asking = Some((seat, offer.clone()));
        ArbiterStep::Ask { seat, offer }
    }

    fn finish(&mut self, verdict: Verdict) -> ArbiterStep {
        self.verdict = Some(verdict.clone());
        ArbiterStep::Done(verdict)
    }
}
