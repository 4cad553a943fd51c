//! Undo log for table actions
//!
//! The reference engine journals every state change so that a kan's
//! compensation draw can be rewound when another seat robs the kan.

use crate::core::{Seat, Tile};
use serde::{Deserialize, Serialize};

/// Which meld a seat formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeldKind {
    Chii,
    Pon,
    OpenKan,
    ClosedKan,
    AddedKan,
}

/// Atomic table actions that can be logged and undone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableAction {
    /// Draw from the live wall
    Draw { seat: Seat, tile: Tile },

    /// Discard into the river
    Discard { seat: Seat, tile: Tile },

    /// Riichi declaration (the accompanying discard is logged separately)
    Riichi { seat: Seat },

    /// A meld claimed or declared
    Meld {
        seat: Seat,
        kind: MeldKind,
        tile: Tile,
    },

    /// Replacement draw from the dead wall after a kan
    ///
    /// `replenished` is the live-wall tile moved into the dead wall to keep
    /// it at fourteen tiles, if any was left.
    CompensationDraw {
        seat: Seat,
        tile: Tile,
        replenished: Option<Tile>,
    },

    /// Turn passed to the next seat
    AdvanceSeat { from: Seat, to: Seat },
}

/// Undo log for tracking and rewinding table actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoLog {
    /// Stack of actions (most recent at end)
    actions: Vec<TableAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        UndoLog {
            actions: Vec::new(),
        }
    }

    /// Log an action
    pub fn log(&mut self, action: TableAction) {
        self.actions.push(action);
    }

    /// Get the most recent action without removing it
    pub fn peek(&self) -> Option<&TableAction> {
        self.actions.last()
    }

    /// Pop and return the most recent action
    pub fn pop(&mut self) -> Option<TableAction> {
        self.actions.pop()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}
