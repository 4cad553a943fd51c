//! Call vocabulary shared by the engine interface and the arbiter

use crate::core::{Seat, Tile};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Interrupting calls and declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Chii,
    Pon,
    Kan,
    Riichi,
    Ron,
    Tsumo,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::Chii => "chii",
            CallKind::Pon => "pon",
            CallKind::Kan => "kan",
            CallKind::Riichi => "riichi",
            CallKind::Ron => "ron",
            CallKind::Tsumo => "tsumo",
        };
        f.write_str(name)
    }
}

/// One way to complete a run with a claimed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChiiOption {
    /// Lowest face number of the resulting run (1..=7)
    pub start: u8,
    /// The discarded tile being claimed
    pub claimed: Tile,
}

impl ChiiOption {
    /// True when the claimed tile is the lowest tile of the run
    pub fn is_low_end(&self) -> bool {
        self.claimed.number() == Some(self.start)
    }
}

/// Candidate selections attached to a pending call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallChoices {
    None,
    Tiles(SmallVec<[Tile; 4]>),
    Runs(SmallVec<[ChiiOption; 3]>),
}

/// A call some seat is eligible to make, produced by an eligibility scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    pub seat: Seat,
    pub kind: CallKind,
    pub choices: CallChoices,
}

impl PendingCall {
    pub fn new(seat: Seat, kind: CallKind) -> Self {
        PendingCall {
            seat,
            kind,
            choices: CallChoices::None,
        }
    }

    pub fn with_tiles(seat: Seat, kind: CallKind, tiles: &[Tile]) -> Self {
        PendingCall {
            seat,
            kind,
            choices: CallChoices::Tiles(tiles.iter().copied().collect()),
        }
    }

    pub fn with_runs(seat: Seat, runs: &[ChiiOption]) -> Self {
        PendingCall {
            seat,
            kind: CallKind::Chii,
            choices: CallChoices::Runs(runs.iter().copied().collect()),
        }
    }

    /// Tile selections, empty unless this is a kan or riichi candidate
    pub fn tiles(&self) -> &[Tile] {
        match &self.choices {
            CallChoices::Tiles(tiles) => tiles,
            _ => &[],
        }
    }

    pub fn runs(&self) -> &[ChiiOption] {
        match &self.choices {
            CallChoices::Runs(runs) => runs,
            _ => &[],
        }
    }
}
