//! Turn scheduler
//!
//! Drives one round: picks, discards and every interrupting call, in a
//! single stream of Round Engine commands. The scheduler is the engine's
//! only writer; everything the presentation side learns arrives as a
//! `SchedulerEvent`.

/// Conditional logging that compiles away without the `verbose-logging`
/// feature, so hot loops skip the `format!` allocations.
macro_rules! log_if_verbose {
    ($logger:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger;
        }
    };
}

use crate::config::TableConfig;
use crate::core::{CallKind, Seat, Tile};
use crate::engine::RoundEngine;
use crate::game::arbiter::{ArbiterStep, CallArbiter, Claim, ScanScope, Verdict};
use crate::game::cancel::CancellationScope;
use crate::game::controller::{ask, TableView};
use crate::game::events::{EventSink, RoundOutcome, SchedulerEvent};
use crate::game::logger::{TableLogger, VerbosityLevel};
use crate::game::offer::{Choice, Offer};
use crate::game::seats::{Actor, SeatTable};
use crate::game::timer::{DecisionTimer, DecisionWindow, WindowGate};
use crate::{Result, TableError};
use std::sync::Arc;
use std::time::Duration;

/// Where the round stands between two scheduler steps
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    AwaitingPick,
    /// The current seat holds a fresh tile
    PostPick {
        compensation: bool,
    },
    AwaitingDiscard,
    PostDiscard {
        discarder: Seat,
        tile: Tile,
    },
    Ended(RoundOutcome),
}

/// Scheduler for a single round
///
/// Borrows the round's engine and the seat table for the duration of the
/// round, like a game loop borrows its game state.
pub struct TurnScheduler<'a, E: RoundEngine> {
    engine: &'a mut E,
    seats: &'a mut SeatTable,
    config: TableConfig,
    sink: EventSink,
    logger: Arc<TableLogger>,
    scope: CancellationScope,
    timer: DecisionTimer,
    gate: WindowGate,
    round: u32,
}

impl<'a, E: RoundEngine> TurnScheduler<'a, E> {
    pub fn new(
        engine: &'a mut E,
        seats: &'a mut SeatTable,
        sink: EventSink,
        scope: CancellationScope,
    ) -> Self {
        let config = TableConfig::default();
        TurnScheduler {
            engine,
            seats,
            timer: DecisionTimer::new(config.decision_delay),
            config,
            sink,
            logger: Arc::new(TableLogger::with_verbosity(VerbosityLevel::Silent)),
            scope,
            gate: WindowGate::new(),
            round: 0,
        }
    }

    /// Use a configuration snapshot for this round
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.timer.set_profile(config.decision_delay);
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Arc<TableLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Play the round to its end
    ///
    /// Returns `TableError::Cancelled` when the scope was signaled. A fatal
    /// error emits one `RoundAborted`, signals cancellation and is returned.
    pub async fn run_round(&mut self) -> Result<RoundOutcome> {
        self.sink.emit(SchedulerEvent::RoundStarted {
            round: self.round,
            dealer: self.engine.current_seat(),
            wall_remaining: self.engine.wall_remaining(),
        });
        self.logger.normal(&format!(
            "Round {} starts, {} deals",
            self.round,
            self.engine.current_seat()
        ));

        match self.drive().await {
            Ok(outcome) => {
                self.finish(&outcome);
                Ok(outcome)
            }
            Err(TableError::Cancelled) => {
                self.timer.disarm();
                self.logger.normal(&format!("Round {} cancelled", self.round));
                Err(TableError::Cancelled)
            }
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<RoundOutcome> {
        let mut phase = Phase::AwaitingPick;
        loop {
            if self.scope.is_cancelled() {
                return Err(TableError::Cancelled);
            }
            phase = match phase {
                Phase::AwaitingPick => self.pick(),
                Phase::PostPick { compensation } => self.post_pick(compensation).await?,
                Phase::AwaitingDiscard => self.await_discard().await?,
                Phase::PostDiscard { discarder, tile } => {
                    self.post_discard(discarder, tile).await?
                }
                Phase::Ended(outcome) => return Ok(outcome),
            };
        }
    }

    fn pick(&mut self) -> Phase {
        if self.engine.is_wall_exhaustion() {
            return Phase::Ended(RoundOutcome::ExhaustiveDraw);
        }
        let seat = self.engine.current_seat();
        match self.engine.pick() {
            Some(tile) => {
                log_if_verbose!(self.logger, "{} draws {}", seat, tile);
                self.sink.emit(SchedulerEvent::TilePicked {
                    seat,
                    tile,
                    compensation: false,
                });
                self.emit_wall_count();
                Phase::PostPick {
                    compensation: false,
                }
            }
            None => Phase::Ended(RoundOutcome::ExhaustiveDraw),
        }
    }

    /// Tsumo, then kan, then riichi, each for the seat that just drew
    async fn post_pick(&mut self, compensation: bool) -> Result<Phase> {
        let seat = self.engine.current_seat();
        let drawn = self.engine.last_drawn(seat);

        if self.engine.can_call_tsumo(seat, compensation) {
            let offer = Offer::Tsumo {
                tile: drawn,
                compensation,
            };
            match self.decide(seat, offer).await? {
                Choice::Tsumo => {
                    self.accepted(CallKind::Tsumo, seat, drawn);
                    return Ok(Phase::Ended(RoundOutcome::Tsumo {
                        winner: seat,
                        tile: drawn,
                        compensation,
                    }));
                }
                Choice::Skip => {}
                other => return Err(unhandled(seat, &other, "tsumo")),
            }
        }

        let kans = self.engine.can_call_kan(seat);
        if !kans.is_empty() {
            match self.decide(seat, Offer::SelfKan { options: kans }).await? {
                Choice::Kan(Some(tile)) => {
                    if let Some(phase) = self.declare_kan(seat, tile).await? {
                        return Ok(phase);
                    }
                }
                Choice::Skip => {}
                other => return Err(unhandled(seat, &other, "kan")),
            }
        }

        let riichi = self.engine.can_call_riichi(seat);
        if !riichi.is_empty() {
            match self.decide(seat, Offer::Riichi { options: riichi }).await? {
                Choice::Riichi(tile) => {
                    if self.engine.call_riichi(seat, tile) {
                        self.accepted(CallKind::Riichi, seat, Some(tile));
                        self.sink.emit(SchedulerEvent::TileDiscarded {
                            seat,
                            tile,
                            riichi: true,
                        });
                        return Ok(Phase::PostDiscard {
                            discarder: seat,
                            tile,
                        });
                    }
                    self.rejected(seat, format!("riichi {tile}"));
                }
                Choice::Skip => {}
                other => return Err(unhandled(seat, &other, "riichi")),
            }
        }

        Ok(Phase::AwaitingDiscard)
    }

    async fn await_discard(&mut self) -> Result<Phase> {
        let seat = self.engine.current_seat();
        let offer = Offer::Discard {
            options: self.engine.legal_discards(seat),
            drawn: self.engine.last_drawn(seat),
        };
        let Some(Choice::Discard(fallback)) = offer.default_choice(false) else {
            return Err(TableError::NoLegalDiscard(seat));
        };

        let tile = match self.decide(seat, offer).await? {
            Choice::Discard(tile) => tile,
            other => return Err(unhandled(seat, &other, "discard")),
        };

        let discarded = if self.engine.discard(seat, tile) {
            tile
        } else {
            self.rejected(seat, format!("discard {tile}"));
            if fallback == tile || !self.engine.discard(seat, fallback) {
                return Err(TableError::Unreachable(format!(
                    "{seat} has no discard the engine accepts"
                )));
            }
            fallback
        };

        log_if_verbose!(self.logger, "{} discards {}", seat, discarded);
        self.sink.emit(SchedulerEvent::TileDiscarded {
            seat,
            tile: discarded,
            riichi: false,
        });
        Ok(Phase::PostDiscard {
            discarder: seat,
            tile: discarded,
        })
    }

    async fn post_discard(&mut self, discarder: Seat, tile: Tile) -> Result<Phase> {
        let arbiter = CallArbiter::scan(&*self.engine, discarder, tile, ScanScope::Discard);
        log_if_verbose!(
            self.logger,
            "{} on {}: {} call(s) open",
            tile,
            discarder,
            arbiter.candidates().len()
        );
        let verdict = if arbiter.is_empty() {
            Verdict::Pass
        } else {
            self.arbitrate(arbiter).await?
        };

        match verdict {
            Verdict::Ron { winners, loser } => Ok(Phase::Ended(RoundOutcome::Ron {
                winners,
                loser,
                tile,
                robbed_kan: false,
            })),
            Verdict::Claimed(Claim::Pon { .. } | Claim::Chii { .. }) => Ok(Phase::AwaitingDiscard),
            Verdict::Claimed(Claim::Kan { seat, tile }) => {
                match self.rob_kan(seat, tile).await? {
                    Some(outcome) => Ok(Phase::Ended(outcome)),
                    None => Ok(Phase::PostPick { compensation: true }),
                }
            }
            Verdict::Pass if self.engine.is_wall_exhaustion() => {
                Ok(Phase::Ended(RoundOutcome::ExhaustiveDraw))
            }
            Verdict::Pass => {
                self.engine.advance_seat();
                Ok(Phase::AwaitingPick)
            }
        }
    }

    /// Run the arbiter to a verdict, asking seats and executing claims
    async fn arbitrate(&mut self, mut arbiter: CallArbiter) -> Result<Verdict> {
        loop {
            if self.scope.is_cancelled() {
                return Err(TableError::Cancelled);
            }
            match arbiter.step() {
                ArbiterStep::Ask { seat, offer } => {
                    let choice = self.decide(seat, offer).await?;
                    arbiter.answer(seat, choice)?;
                }
                ArbiterStep::Execute(claim) => {
                    let accepted = self.execute(claim);
                    arbiter.executed(accepted)?;
                }
                ArbiterStep::Done(verdict) => return Ok(verdict),
            }
        }
    }

    fn execute(&mut self, claim: Claim) -> bool {
        match claim {
            Claim::Pon { seat, tile } => {
                if self.engine.call_pon(seat) {
                    self.accepted(CallKind::Pon, seat, Some(tile));
                    return true;
                }
                self.rejected(seat, format!("pon {tile}"));
            }
            Claim::Chii { seat, option } => {
                if self.engine.call_chii(seat, option.start) {
                    self.accepted(CallKind::Chii, seat, Some(option.claimed));
                    return true;
                }
                self.rejected(seat, format!("chii from {}", option.start));
            }
            Claim::Kan { seat, tile } => match self.engine.call_kan(seat, None) {
                Some(compensation) => {
                    self.accepted(CallKind::Kan, seat, Some(tile));
                    self.compensation_drawn(seat, compensation);
                    return true;
                }
                None => self.rejected(seat, format!("kan {tile}")),
            },
        }
        false
    }

    /// Declare an own-turn kan
    ///
    /// `None` means the engine refused and the turn continues as before.
    async fn declare_kan(&mut self, seat: Seat, tile: Tile) -> Result<Option<Phase>> {
        let Some(compensation) = self.engine.call_kan(seat, Some(tile)) else {
            self.rejected(seat, format!("kan {tile}"));
            return Ok(None);
        };
        self.accepted(CallKind::Kan, seat, Some(tile));
        self.compensation_drawn(seat, compensation);

        Ok(Some(match self.rob_kan(seat, tile).await? {
            Some(outcome) => Phase::Ended(outcome),
            None => Phase::PostPick { compensation: true },
        }))
    }

    /// Give the other seats a chance to ron on a kan
    ///
    /// On ron the compensation draw is undone exactly once and the kan
    /// caller pays.
    async fn rob_kan(&mut self, caller: Seat, tile: Tile) -> Result<Option<RoundOutcome>> {
        let arbiter = CallArbiter::scan(&*self.engine, caller, tile, ScanScope::KanRobbing);
        if arbiter.is_empty() {
            return Ok(None);
        }
        match self.arbitrate(arbiter).await? {
            Verdict::Ron { winners, loser } => {
                if !self.engine.undo_pick_compensation_tile() {
                    return Err(TableError::Unreachable(format!(
                        "kan by {caller} was robbed without a compensation draw to undo"
                    )));
                }
                self.logger.normal(&format!("{caller}'s kan on {tile} is robbed"));
                self.sink.emit(SchedulerEvent::CompensationUndone { seat: caller });
                self.emit_wall_count();
                Ok(Some(RoundOutcome::Ron {
                    winners,
                    loser,
                    tile,
                    robbed_kan: true,
                }))
            }
            Verdict::Pass => Ok(None),
            Verdict::Claimed(claim) => Err(TableError::Unreachable(format!(
                "{} claimed during kan robbing",
                claim.kind()
            ))),
        }
    }

    /// Get one seat's answer to an offer
    ///
    /// The returned choice always fits the offer.
    async fn decide(&mut self, seat: Seat, offer: Offer) -> Result<Choice> {
        let default = offer
            .default_choice(self.config.auto_win)
            .ok_or(TableError::NoLegalDiscard(seat))?;

        if self.config.auto_win && offer.is_win() {
            log_if_verbose!(self.logger, "{} wins automatically ({})", seat, offer);
            return Ok(default);
        }

        if !self.seats.actor_mut(seat).is_interactive() {
            pace(self.config.ai_speed.pause(), &self.scope).await?;
        }

        match self.seats.actor_mut(seat) {
            Actor::Ai(provider) => {
                let view = TableView::new(&*self.engine, seat);
                let raw = ask(provider.as_mut(), &view, &offer);
                match offer.resolve(&raw) {
                    Some(choice) => {
                        self.logger
                            .controller_choice(provider.name(), &format!("{seat}: {choice}"));
                        Ok(choice)
                    }
                    None => {
                        self.logger.anomaly(&format!(
                            "{seat} ({}) answered '{raw}' to '{offer}', using '{default}'",
                            provider.name()
                        ));
                        Ok(default)
                    }
                }
            }
            Actor::Interactive(human) => {
                let stale = human.drain_stale();
                if stale > 0 {
                    self.logger
                        .anomaly(&format!("{seat}: dropped {stale} input(s) sent outside a window"));
                }

                let id = self.gate.open(seat)?;
                let deadline = self.timer.arm();
                let window = DecisionWindow {
                    id,
                    seat,
                    offer,
                    default,
                    deadline,
                };
                self.sink.emit(SchedulerEvent::WindowOpened {
                    id,
                    seat,
                    kind: window.offer.kind(),
                    offer: window.offer.clone(),
                    hand: self.engine.hand(seat),
                    timeout_ms: deadline
                        .and(self.timer.delay())
                        .map(|d| d.as_millis() as u64),
                });

                let (resolution, choice) = human
                    .await_choice(&window, &mut self.timer, &self.scope, &self.logger)
                    .await;
                self.timer.disarm();
                self.gate.close(id);
                self.sink.emit(SchedulerEvent::WindowClosed {
                    id,
                    seat,
                    resolution,
                });
                log_if_verbose!(self.logger, "{} window {} closed: {:?}", seat, id, resolution);
                choice.ok_or(TableError::Cancelled)
            }
        }
    }

    fn accepted(&mut self, kind: CallKind, seat: Seat, tile: Option<Tile>) {
        self.logger.normal(&format!(
            "{seat} calls {kind}{}",
            tile.map(|t| format!(" on {t}")).unwrap_or_default()
        ));
        self.sink.emit(SchedulerEvent::CallAccepted {
            kind,
            seat,
            tile,
            snapshot: self.engine.snapshot(),
        });
    }

    /// A command the engine refused counts as never issued
    fn rejected(&mut self, seat: Seat, command: String) {
        self.logger
            .anomaly(&format!("engine rejected '{command}' from {seat}"));
        self.sink
            .emit(SchedulerEvent::CommandRejected { seat, command });
    }

    fn compensation_drawn(&mut self, seat: Seat, tile: Tile) {
        log_if_verbose!(self.logger, "{} draws {} from the dead wall", seat, tile);
        self.sink.emit(SchedulerEvent::TilePicked {
            seat,
            tile,
            compensation: true,
        });
        self.emit_wall_count();
    }

    fn emit_wall_count(&self) {
        self.sink.emit(SchedulerEvent::WallCountChanged {
            remaining: self.engine.wall_remaining(),
        });
    }

    fn finish(&mut self, outcome: &RoundOutcome) {
        self.logger
            .minimal(&format!("Round {} ends: {}", self.round, describe(outcome)));
        self.sink.emit(SchedulerEvent::RoundEnded {
            round: self.round,
            outcome: outcome.clone(),
        });
        for provider in self.seats.providers_mut() {
            let view = TableView::new(&*self.engine, provider.seat());
            provider.on_round_end(&view, outcome);
        }
    }

    /// Terminal abort: one event, then cancellation
    fn abort(&mut self, error: &TableError) {
        self.timer.disarm();
        self.logger
            .minimal(&format!("Round {} aborted: {error}", self.round));
        self.sink.emit(SchedulerEvent::RoundAborted {
            round: self.round,
            reason: error.to_string(),
        });
        self.scope.cancel();
    }
}

/// Display pacing before an AI action
async fn pace(pause: Duration, scope: &CancellationScope) -> Result<()> {
    if pause.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = scope.cancelled() => Err(TableError::Cancelled),
        _ = tokio::time::sleep(pause) => Ok(()),
    }
}

fn unhandled(seat: Seat, choice: &Choice, stage: &str) -> TableError {
    TableError::Unreachable(format!("no {stage} branch for '{choice}' from {seat}"))
}

/// One-line summary of an outcome
pub fn describe(outcome: &RoundOutcome) -> String {
    match outcome {
        RoundOutcome::Ron {
            winners,
            loser,
            tile,
            robbed_kan,
        } => {
            let names: Vec<String> = winners.iter().map(|w| w.to_string()).collect();
            let robbed = if *robbed_kan { " (robbing a kan)" } else { "" };
            format!("ron on {tile} by {} off {loser}{robbed}", names.join(" and "))
        }
        RoundOutcome::Tsumo { winner, tile, .. } => match tile {
            Some(tile) => format!("tsumo by {winner} on {tile}"),
            None => format!("tsumo by {winner}"),
        },
        RoundOutcome::ExhaustiveDraw => "exhaustive draw".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TableEngine, TableLayout};
    use crate::game::events::{channel, WindowResolution};
    use crate::game::interactive_controller::{InteractiveSeat, SeatInput};
    use crate::game::scripted_controller::ScriptedController;
    use crate::game::tsumogiri_controller::TsumogiriController;

    fn passive_seats() -> SeatTable {
        SeatTable::all_ai(|seat| Box::new(TsumogiriController::new(seat)))
    }

    #[tokio::test]
    async fn test_tsumogiri_round_completes() {
        let scope = CancellationScope::new();
        let (sink, mut stream) = channel(&scope);
        let mut engine = TableEngine::new(11, Seat::new(0));
        let mut seats = passive_seats();

        let outcome = TurnScheduler::new(&mut engine, &mut seats, sink, scope.clone())
            .run_round()
            .await
            .unwrap();

        let events = stream.drain_undelivered();
        assert!(matches!(events.first(), Some(SchedulerEvent::RoundStarted { .. })));
        assert!(matches!(
            events.last(),
            Some(SchedulerEvent::RoundEnded { outcome: o, .. }) if *o == outcome
        ));
        if outcome == RoundOutcome::ExhaustiveDraw {
            assert_eq!(engine.wall_remaining(), 0);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_no_pick() {
        let scope = CancellationScope::new();
        let (sink, _stream) = channel(&scope);
        let mut engine = TableEngine::new(5, Seat::new(0));
        let wall = engine.wall_remaining();
        let mut seats = passive_seats();
        scope.cancel();

        let result = TurnScheduler::new(&mut engine, &mut seats, sink, scope.clone())
            .run_round()
            .await;
        assert!(matches!(result, Err(TableError::Cancelled)));
        assert_eq!(engine.wall_remaining(), wall);
    }

    #[tokio::test]
    async fn test_scripted_discard_is_applied() {
        let scope = CancellationScope::new();
        let (sink, mut stream) = channel(&scope);
        let layout = TableLayout::from_notation(
            Seat::new(0),
            [
                "1m 2m 3m 4m 5m 6m 7m 8m 9m 1p 2p 3p E",
                "1s 2s 3s 4s 5s 6s 7s 8s 9s 4p 5p 6p S",
                "1m 2m 3m 4m 5m 6m 7m 8m 9m 1p 2p 3p W",
                "1s 2s 3s 4s 5s 6s 7s 8s 9s 4p 5p 6p N",
            ],
            "C",
            "P P P F F F",
        )
        .unwrap();
        let mut engine = TableEngine::from_layout(layout).unwrap();
        let mut seats = SeatTable::new(vec![
            Actor::Ai(Box::new(ScriptedController::new(
                Seat::new(0),
                vec![Choice::Discard("E".parse().unwrap())],
            ))),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(1)))),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(2)))),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(3)))),
        ])
        .unwrap();

        let outcome = TurnScheduler::new(&mut engine, &mut seats, sink, scope.clone())
            .run_round()
            .await
            .unwrap();
        assert_eq!(outcome, RoundOutcome::ExhaustiveDraw);

        let discards: Vec<Tile> = stream
            .drain_undelivered()
            .into_iter()
            .filter_map(|e| match e {
                SchedulerEvent::TileDiscarded { tile, .. } => Some(tile),
                _ => None,
            })
            .collect();
        assert_eq!(discards.len(), 1);
        assert!(discards[0].same_kind("E".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_interactive_windows_resolve_explicitly() {
        let scope = CancellationScope::new();
        let (sink, mut stream) = channel(&scope);
        let mut engine = TableEngine::new(21, Seat::new(0));
        let (human, input) = InteractiveSeat::channel(Seat::new(0));
        let mut seats = SeatTable::new(vec![
            Actor::Interactive(human),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(1)))),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(2)))),
            Actor::Ai(Box::new(TsumogiriController::new(Seat::new(3)))),
        ])
        .unwrap();

        // Accept every offer as soon as its window opens
        let player = async move {
            let mut opened = 0;
            let mut explicit = 0;
            while let Some(event) = stream.next().await {
                match event {
                    SchedulerEvent::WindowOpened { .. } => {
                        opened += 1;
                        input.send(SeatInput::Choose(Choice::Accept));
                    }
                    SchedulerEvent::WindowClosed {
                        resolution: WindowResolution::Explicit,
                        ..
                    } => explicit += 1,
                    SchedulerEvent::RoundEnded { .. } => break,
                    _ => {}
                }
            }
            (opened, explicit)
        };

        let mut scheduler = TurnScheduler::new(&mut engine, &mut seats, sink, scope.clone());
        let (result, (opened, explicit)) = tokio::join!(scheduler.run_round(), player);
        assert!(result.is_ok());
        assert!(opened >= 1);
        assert_eq!(opened, explicit);
    }

    #[test]
    fn test_describe_outcomes() {
        let ron = RoundOutcome::Ron {
            winners: vec![Seat::new(0), Seat::new(1)],
            loser: Seat::new(3),
            tile: "5p".parse().unwrap(),
            robbed_kan: true,
        };
        assert_eq!(
            describe(&ron),
            "ron on 5p by seat 0 and seat 1 off seat 3 (robbing a kan)"
        );
        assert_eq!(describe(&RoundOutcome::ExhaustiveDraw), "exhaustive draw");
    }
}
