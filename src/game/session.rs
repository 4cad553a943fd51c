//! Sessions: consecutive rounds at one table
//!
//! A session owns the seats, the engine factory and the cancellation
//! scope. Configuration is read through a watch channel and snapshotted at
//! each round start, so a change made mid-round applies from the next one.

use crate::config::TableConfig;
use crate::engine::EngineFactory;
use crate::game::cancel::CancellationScope;
use crate::game::events::{self, EventSink, EventStream, RoundOutcome, SchedulerEvent};
use crate::game::interactive_controller::{InputSender, SeatInput};
use crate::game::logger::{TableLogger, VerbosityLevel};
use crate::game::scheduler::TurnScheduler;
use crate::game::seats::SeatTable;
use crate::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What happened over a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Outcome of every finished round, in order
    pub rounds: Vec<RoundOutcome>,
    /// The session was closed before reaching its round limit
    pub cancelled: bool,
}

impl SessionSummary {
    pub fn rounds_played(&self) -> usize {
        self.rounds.len()
    }
}

/// Cloneable controls for a session that may be running elsewhere
#[derive(Debug, Clone)]
pub struct SessionControls {
    config: Arc<watch::Sender<TableConfig>>,
    scope: CancellationScope,
    input: Option<InputSender>,
}

impl SessionControls {
    /// Close the session; true only for the first call
    pub fn close(&self) -> bool {
        self.scope.cancel()
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Forward input to the interactive seat
    ///
    /// False when the session has no interactive seat or it is gone.
    pub fn submit(&self, input: SeatInput) -> bool {
        match &self.input {
            Some(sender) => sender.send(input),
            None => false,
        }
    }

    /// Replace the configuration from the next round on
    pub fn reconfigure(&self, config: TableConfig) -> Result<()> {
        config.validate()?;
        self.config.send_replace(config);
        Ok(())
    }

    pub fn config(&self) -> TableConfig {
        self.config.borrow().clone()
    }
}

pub struct Session<F: EngineFactory> {
    factory: F,
    seats: SeatTable,
    config: watch::Receiver<TableConfig>,
    controls: SessionControls,
    sink: EventSink,
    logger: Arc<TableLogger>,
    scope: CancellationScope,
}

impl<F: EngineFactory> Session<F> {
    /// Create a session and the event stream its presenter consumes
    pub fn new(factory: F, seats: SeatTable, config: TableConfig) -> Result<(Self, EventStream)> {
        config.validate()?;
        let scope = CancellationScope::new();
        let (sink, stream) = events::channel(&scope);
        let (config_tx, config_rx) = watch::channel(config);
        let session = Session {
            factory,
            seats,
            config: config_rx,
            controls: SessionControls {
                config: Arc::new(config_tx),
                scope: scope.clone(),
                input: None,
            },
            sink,
            logger: Arc::new(TableLogger::with_verbosity(VerbosityLevel::Silent)),
            scope,
        };
        Ok((session, stream))
    }

    pub fn with_logger(mut self, logger: Arc<TableLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Route `SessionControls::submit` to the interactive seat
    pub fn with_input(mut self, sender: InputSender) -> Self {
        self.controls.input = Some(sender);
        self
    }

    pub fn controls(&self) -> SessionControls {
        self.controls.clone()
    }

    pub fn scope(&self) -> &CancellationScope {
        &self.scope
    }

    /// Play rounds until the round limit or cancellation
    ///
    /// Cancellation ends the session normally with `cancelled` set; only a
    /// fatal round error is returned as `Err`.
    pub async fn run(mut self) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        let mut round = 0u32;

        loop {
            if self.scope.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let config = self.config.borrow_and_update().clone();
            if config.max_rounds.is_some_and(|max| round >= max) {
                break;
            }

            let mut engine = self.factory.new_round(round);
            let result = TurnScheduler::new(
                &mut engine,
                &mut self.seats,
                self.sink.clone(),
                self.scope.clone(),
            )
            .with_config(config)
            .with_logger(Arc::clone(&self.logger))
            .with_round(round)
            .run_round()
            .await;

            match result {
                Ok(outcome) => summary.rounds.push(outcome),
                Err(TableError::Cancelled) => {
                    summary.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }

            let finished = round;
            round += 1;
            let more = !self
                .config
                .borrow()
                .max_rounds
                .is_some_and(|max| round >= max);
            if more && self.seats.has_interactive() && !self.acknowledge(finished).await {
                summary.cancelled = true;
                break;
            }
        }

        self.logger.minimal(&format!(
            "Session over after {} round(s){}",
            summary.rounds_played(),
            if summary.cancelled { " (closed)" } else { "" }
        ));
        Ok(summary)
    }

    /// Hold the table until the human dismisses the results
    async fn acknowledge(&mut self, round: u32) -> bool {
        self.sink
            .emit(SchedulerEvent::AwaitingAcknowledgement { round });
        match self.seats.interactive_mut() {
            Some(human) => human.await_acknowledgement(&self.scope).await,
            None => true,
        }
    }
}

impl<F: EngineFactory + 'static> Session<F>
where
    F::Engine: 'static,
{
    /// Run the session on its own task
    pub fn spawn(self) -> SessionHandle {
        let controls = self.controls();
        let task = tokio::spawn(self.run());
        SessionHandle { controls, task }
    }
}

/// A session running on its own task
pub struct SessionHandle {
    controls: SessionControls,
    task: JoinHandle<Result<SessionSummary>>,
}

impl SessionHandle {
    pub fn controls(&self) -> SessionControls {
        self.controls.clone()
    }

    pub fn close(&self) -> bool {
        self.controls.close()
    }

    pub fn submit(&self, input: SeatInput) -> bool {
        self.controls.submit(input)
    }

    pub fn reconfigure(&self, config: TableConfig) -> Result<()> {
        self.controls.reconfigure(config)
    }

    /// Wait for the session to finish
    pub async fn join(self) -> Result<SessionSummary> {
        self.task.await?
    }
}
