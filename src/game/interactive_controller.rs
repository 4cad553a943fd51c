//! Interactive seat for a human player
//!
//! The human's inputs arrive over an ordered channel from the presentation
//! side. While a decision window is open the seat races that channel
//! against the window's deadline and the session's cancellation; exactly
//! one of them resolves the window.

use crate::core::{Seat, Tile};
use crate::game::cancel::CancellationScope;
use crate::game::events::WindowResolution;
use crate::game::logger::TableLogger;
use crate::game::offer::{Choice, Offer};
use crate::game::timer::{DecisionTimer, DecisionWindow};
use crate::{Result, TableError};
use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;

/// One input from the human player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatInput {
    Choose(Choice),
    /// Dismiss the end-of-round display
    Acknowledge,
}

/// A parsed text command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(SeatInput),
    Quit,
}

/// Sending side held by the presentation actor
#[derive(Debug, Clone)]
pub struct InputSender {
    seat: Seat,
    tx: mpsc::UnboundedSender<SeatInput>,
}

impl InputSender {
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Queue an input; false once the seat is gone
    pub fn send(&self, input: SeatInput) -> bool {
        self.tx.send(input).is_ok()
    }
}

#[derive(Debug)]
pub struct InteractiveSeat {
    seat: Seat,
    rx: mpsc::UnboundedReceiver<SeatInput>,
    input_closed: bool,
}

impl InteractiveSeat {
    pub fn channel(seat: Seat) -> (InteractiveSeat, InputSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            InteractiveSeat {
                seat,
                rx,
                input_closed: false,
            },
            InputSender { seat, tx },
        )
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Discard inputs that arrived while no window was open
    pub fn drain_stale(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.rx.try_recv() {
                Ok(_) => drained += 1,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.input_closed = true;
                    break;
                }
            }
        }
        drained
    }

    /// Wait for the window to resolve
    ///
    /// Explicit input that fits the offer wins over the deadline; input
    /// that does not fit is logged and ignored. If the input channel closes
    /// with no deadline armed, nobody can ever answer and the default is
    /// taken. Returns the resolution and, unless cancelled, the choice.
    pub async fn await_choice(
        &mut self,
        window: &DecisionWindow,
        timer: &mut DecisionTimer,
        scope: &CancellationScope,
        logger: &TableLogger,
    ) -> (WindowResolution, Option<Choice>) {
        loop {
            if self.input_closed && !timer.is_armed() {
                return (WindowResolution::Expired, Some(window.default.clone()));
            }

            tokio::select! {
                biased;
                _ = scope.cancelled() => {
                    timer.disarm();
                    return (WindowResolution::Cancelled, None);
                }
                input = self.rx.recv(), if !self.input_closed => match input {
                    Some(SeatInput::Choose(choice)) => match window.offer.resolve(&choice) {
                        Some(resolved) => {
                            timer.disarm();
                            return (WindowResolution::Explicit, Some(resolved));
                        }
                        None => logger.anomaly(&format!(
                            "{}: '{}' does not answer '{}'",
                            self.seat, choice, window.offer
                        )),
                    },
                    Some(SeatInput::Acknowledge) => {
                        logger.anomaly(&format!("{}: acknowledgement while deciding", self.seat));
                    }
                    None => self.input_closed = true,
                },
                _ = timer.expired() => {
                    if timer.fire(scope) {
                        return (WindowResolution::Expired, Some(window.default.clone()));
                    }
                    return (WindowResolution::Cancelled, None);
                }
            }
        }
    }

    /// Wait for the player to dismiss the round result
    ///
    /// False when the session was cancelled instead.
    pub async fn await_acknowledgement(&mut self, scope: &CancellationScope) -> bool {
        loop {
            if self.input_closed {
                return !scope.is_cancelled();
            }
            tokio::select! {
                biased;
                _ = scope.cancelled() => return false,
                input = self.rx.recv() => match input {
                    Some(SeatInput::Acknowledge) => return true,
                    Some(SeatInput::Choose(_)) => {}
                    None => self.input_closed = true,
                },
            }
        }
    }
}

fn parse_tile_arg(arg: Option<&str>, command: &str) -> Result<Tile> {
    let text = arg.ok_or_else(|| TableError::InvalidCommand(format!("'{command}' needs a tile")))?;
    text.parse()
}

/// Parse one line of player input
///
/// Accepted forms: `d 5m` (or a bare `5m`), `y`/`accept`, `n`/`skip`,
/// `pon`, `kan [tile]`, `chii <start>`, `riichi <tile>`, `ron`, `tsumo`,
/// `ok` to dismiss a result, and `quit`.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(TableError::InvalidCommand("empty input".to_string()));
    };
    let arg = words.next();
    let head = head.to_ascii_lowercase();

    let choice = match head.as_str() {
        "quit" | "q" | "exit" => return Ok(Command::Quit),
        "ok" | "next" => return Ok(Command::Input(SeatInput::Acknowledge)),
        "d" | "discard" => Choice::Discard(parse_tile_arg(arg, &head)?),
        "y" | "yes" | "accept" => Choice::Accept,
        "n" | "no" | "skip" | "pass" => Choice::Skip,
        "pon" => Choice::Pon,
        "kan" => Choice::Kan(arg.map(str::parse).transpose()?),
        "chii" => {
            let start = arg
                .and_then(|a| a.parse::<u8>().ok())
                .filter(|n| (1..=7).contains(n))
                .ok_or_else(|| TableError::InvalidCommand("'chii' needs a start 1-7".to_string()))?;
            Choice::Chii(start)
        }
        "riichi" => Choice::Riichi(parse_tile_arg(arg, &head)?),
        "ron" => Choice::Ron,
        "tsumo" => Choice::Tsumo,
        other => match other.parse::<Tile>() {
            Ok(tile) => Choice::Discard(tile),
            Err(_) => return Err(TableError::InvalidCommand(line.trim().to_string())),
        },
    };
    Ok(Command::Input(SeatInput::Choose(choice)))
}

/// Forward stdin lines to the seat on a dedicated blocking thread
///
/// The thread stops on `quit` (cancelling the session), on end of input,
/// or at the first line read after cancellation.
pub fn spawn_stdin_reader(
    sender: InputSender,
    scope: CancellationScope,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if scope.is_cancelled() {
                break;
            }
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(Command::Quit) => {
                    scope.cancel();
                    break;
                }
                Ok(Command::Input(input)) => {
                    if !sender.send(input) {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelayProfile;
    use crate::game::logger::VerbosityLevel;
    use std::time::Duration;
    use tokio::time::Instant;

    fn tile(s: &str) -> Tile {
        s.parse().unwrap()
    }

    fn discard_window() -> DecisionWindow {
        DecisionWindow {
            id: 1,
            seat: Seat::new(0),
            offer: Offer::Discard {
                options: vec![tile("1m"), tile("E")],
                drawn: Some(tile("E")),
            },
            default: Choice::Discard(tile("E")),
            deadline: None,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("d 5m").unwrap(),
            Command::Input(SeatInput::Choose(Choice::Discard(tile("5m"))))
        );
        assert_eq!(
            parse_command("  9S ").unwrap(),
            Command::Input(SeatInput::Choose(Choice::Discard(tile("9s"))))
        );
        assert_eq!(
            parse_command("kan").unwrap(),
            Command::Input(SeatInput::Choose(Choice::Kan(None)))
        );
        assert_eq!(
            parse_command("chii 3").unwrap(),
            Command::Input(SeatInput::Choose(Choice::Chii(3)))
        );
        assert_eq!(parse_command("ok").unwrap(), Command::Input(SeatInput::Acknowledge));
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("").is_err());
        assert!(parse_command("riichi").is_err());
        assert!(parse_command("chii 9").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_drain_stale_inputs() {
        let (mut seat, sender) = InteractiveSeat::channel(Seat::new(0));
        sender.send(SeatInput::Acknowledge);
        sender.send(SeatInput::Choose(Choice::Skip));
        assert_eq!(seat.drain_stale(), 2);
        assert_eq!(seat.drain_stale(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_input_beats_deadline() {
        let (mut seat, sender) = InteractiveSeat::channel(Seat::new(0));
        let scope = CancellationScope::new();
        let logger = TableLogger::capturing(VerbosityLevel::Silent);
        let mut timer = DecisionTimer::new(DelayProfile::Long);
        timer.arm();

        let start = Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            sender.send(SeatInput::Choose(Choice::Discard(tile("1m"))));
        });

        let (resolution, choice) = seat
            .await_choice(&discard_window(), &mut timer, &scope, &logger)
            .await;
        assert_eq!(resolution, WindowResolution::Explicit);
        assert_eq!(choice, Some(Choice::Discard(tile("1m"))));
        assert!(start.elapsed() < Duration::from_secs(20));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_ignored_until_expiry() {
        let (mut seat, sender) = InteractiveSeat::channel(Seat::new(0));
        let scope = CancellationScope::new();
        let logger = TableLogger::capturing(VerbosityLevel::Silent);
        let mut timer = DecisionTimer::new(DelayProfile::Short);
        timer.arm();

        sender.send(SeatInput::Choose(Choice::Pon));
        let start = Instant::now();
        let (resolution, choice) = seat
            .await_choice(&discard_window(), &mut timer, &scope, &logger)
            .await;
        assert_eq!(resolution, WindowResolution::Expired);
        assert_eq!(choice, Some(Choice::Discard(tile("E"))));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(logger.category_count("anomaly"), 1);
        drop(sender);
    }

    #[tokio::test]
    async fn test_closed_input_without_timer_takes_default() {
        let (mut seat, sender) = InteractiveSeat::channel(Seat::new(0));
        drop(sender);
        let scope = CancellationScope::new();
        let logger = TableLogger::capturing(VerbosityLevel::Silent);
        let mut timer = DecisionTimer::new(DelayProfile::Disabled);
        timer.arm();

        let (resolution, choice) = seat
            .await_choice(&discard_window(), &mut timer, &scope, &logger)
            .await;
        assert_eq!(resolution, WindowResolution::Expired);
        assert_eq!(choice, Some(Choice::Discard(tile("E"))));
    }

    #[tokio::test]
    async fn test_cancel_closes_window() {
        let (mut seat, _sender) = InteractiveSeat::channel(Seat::new(0));
        let scope = CancellationScope::new();
        let logger = TableLogger::capturing(VerbosityLevel::Silent);
        let mut timer = DecisionTimer::new(DelayProfile::Disabled);

        let canceller = scope.clone();
        tokio::spawn(async move {
            canceller.cancel();
        });
        let (resolution, choice) = seat
            .await_choice(&discard_window(), &mut timer, &scope, &logger)
            .await;
        assert_eq!(resolution, WindowResolution::Cancelled);
        assert_eq!(choice, None);
    }

    #[tokio::test]
    async fn test_acknowledgement_skips_choices() {
        let (mut seat, sender) = InteractiveSeat::channel(Seat::new(0));
        let scope = CancellationScope::new();
        sender.send(SeatInput::Choose(Choice::Skip));
        sender.send(SeatInput::Acknowledge);
        assert!(seat.await_acknowledgement(&scope).await);
    }
}
