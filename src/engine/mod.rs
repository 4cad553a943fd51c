//! Round Engine interface
//!
//! The round engine owns all round state (wall, hands, melds, riichi
//! declarations) and answers legality queries. The scheduler is its only
//! writer; everything it hands to the presentation side is an immutable
//! `RoundSnapshot`.

pub mod agari;
pub mod table;

use crate::core::{ChiiOption, Seat, Tile, SEAT_COUNT};
use serde::{Deserialize, Serialize};

pub use table::{TableEngine, TableEngineFactory, TableLayout};

/// Point-in-time view of the round delivered with notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub current_seat: Seat,
    pub previous_seat: Option<Seat>,
    pub wall_remaining: usize,
    pub riichi: [bool; SEAT_COUNT],
    pub pending_compensation: bool,
    pub hand_sizes: [usize; SEAT_COUNT],
}

/// Commands and legality queries the scheduler issues against a round
///
/// Every `call_*` command and `discard` is legality-checked by the engine;
/// a `false`/`None` return means the command was rejected and no state
/// changed.
pub trait RoundEngine: Send {
    /// Draw for the current seat; `None` when the live wall is exhausted
    fn pick(&mut self) -> Option<Tile>;

    fn discard(&mut self, seat: Seat, tile: Tile) -> bool;

    fn can_call_ron(&self, seat: Seat) -> bool;

    fn can_call_tsumo(&self, seat: Seat, is_kan_compensation: bool) -> bool;

    fn can_call_pon(&self, seat: Seat) -> bool;

    /// Kan selections: own-turn kans for the current seat after a draw,
    /// otherwise an open kan on the last discard
    fn can_call_kan(&self, seat: Seat) -> Vec<Tile>;

    fn can_call_chii(&self, seat: Seat) -> Vec<ChiiOption>;

    /// Tiles whose discard would accompany a legal riichi declaration
    fn can_call_riichi(&self, seat: Seat) -> Vec<Tile>;

    fn call_pon(&mut self, seat: Seat) -> bool;

    /// Declare a kan; returns the compensation tile drawn for the caller
    fn call_kan(&mut self, seat: Seat, tile: Option<Tile>) -> Option<Tile>;

    fn call_chii(&mut self, seat: Seat, start: u8) -> bool;

    /// Declare riichi and discard `tile` in the same step
    fn call_riichi(&mut self, seat: Seat, tile: Tile) -> bool;

    /// Return the latest compensation tile to the dead wall
    ///
    /// Returns false when the latest action was not a compensation draw.
    fn undo_pick_compensation_tile(&mut self) -> bool;

    /// Pass the turn to the next seat
    fn advance_seat(&mut self);

    fn current_seat(&self) -> Seat;

    /// The most recent discarder
    fn previous_seat(&self) -> Option<Seat>;

    fn is_wall_exhaustion(&self) -> bool;

    fn wall_remaining(&self) -> usize;

    fn hand(&self, seat: Seat) -> Vec<Tile>;

    /// Tiles the seat may legally discard right now
    fn legal_discards(&self, seat: Seat) -> Vec<Tile> {
        self.hand(seat)
    }

    /// The tile the seat drew this turn, if it still holds it
    fn last_drawn(&self, seat: Seat) -> Option<Tile>;

    fn last_discard(&self) -> Option<Tile>;

    fn is_riichi(&self, seat: Seat) -> bool;

    fn has_pending_compensation(&self) -> bool;

    fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            current_seat: self.current_seat(),
            previous_seat: self.previous_seat(),
            wall_remaining: self.wall_remaining(),
            riichi: Seat::ALL.map(|seat| self.is_riichi(seat)),
            pending_compensation: self.has_pending_compensation(),
            hand_sizes: Seat::ALL.map(|seat| self.hand(seat).len()),
        }
    }
}

/// Builds a fresh engine for each round of a session
pub trait EngineFactory: Send {
    type Engine: RoundEngine;

    fn new_round(&mut self, round: u32) -> Self::Engine;
}
