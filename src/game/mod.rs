//! Turn and call orchestration
//!
//! The scheduler, the call arbiter, decision windows and their timer,
//! cancellation, the event stream and the seats that answer decisions.

pub mod arbiter;
pub mod cancel;
pub mod controller;
pub mod events;
pub mod interactive_controller;
pub mod logger;
pub mod offer;
pub mod presenter;
pub mod random_controller;
pub mod scheduler;
pub mod scripted_controller;
pub mod seats;
pub mod session;
pub mod timer;
pub mod tsumogiri_controller;

pub use arbiter::{ArbiterStep, CallArbiter, Claim, ScanScope, Verdict};
pub use cancel::CancellationScope;
pub use controller::{DecisionProvider, TableView};
pub use events::{EventSink, EventStream, RoundOutcome, SchedulerEvent, WindowResolution};
pub use interactive_controller::{InputSender, InteractiveSeat, SeatInput};
pub use logger::{OutputFormat, OutputMode, TableLogger, VerbosityLevel};
pub use offer::{Choice, DecisionKind, Offer};
pub use presenter::TextPresenter;
pub use random_controller::RandomController;
pub use scheduler::TurnScheduler;
pub use scripted_controller::ScriptedController;
pub use seats::{Actor, SeatTable};
pub use session::{Session, SessionControls, SessionHandle, SessionSummary};
pub use timer::{DecisionTimer, DecisionWindow, WindowGate};
pub use tsumogiri_controller::TsumogiriController;
