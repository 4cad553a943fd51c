//! Decisions offered to seats and the choices that answer them

use crate::core::{ChiiOption, Seat, Tile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of decision a seat is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    Discard,
    Chii,
    Pon,
    Kan,
    Riichi,
    Ron,
    Tsumo,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionKind::Discard => "discard",
            DecisionKind::Chii => "chii",
            DecisionKind::Pon => "pon",
            DecisionKind::Kan => "kan",
            DecisionKind::Riichi => "riichi",
            DecisionKind::Ron => "ron",
            DecisionKind::Tsumo => "tsumo",
        };
        f.write_str(name)
    }
}

/// A decision put to one seat, carrying its legal options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offer {
    Discard {
        options: Vec<Tile>,
        drawn: Option<Tile>,
    },
    Chii {
        tile: Tile,
        options: Vec<ChiiOption>,
    },
    /// Pon and/or open kan on the same discard
    Meld { tile: Tile, pon: bool, kan: bool },
    /// Closed or added kan on the seat's own turn
    SelfKan { options: Vec<Tile> },
    Riichi { options: Vec<Tile> },
    Ron { tile: Tile, from: Seat },
    Tsumo {
        tile: Option<Tile>,
        compensation: bool,
    },
}

/// An answer to an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Discard(Tile),
    /// Chii by the run's lowest number
    Chii(u8),
    Pon,
    /// Kan, optionally naming which kind
    Kan(Option<Tile>),
    Riichi(Tile),
    Ron,
    Tsumo,
    /// Take the preferred option of whatever is offered
    Accept,
    /// Decline
    Skip,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Discard(tile) => write!(f, "discard {tile}"),
            Choice::Chii(start) => write!(f, "chii from {start}"),
            Choice::Pon => f.write_str("pon"),
            Choice::Kan(Some(tile)) => write!(f, "kan {tile}"),
            Choice::Kan(None) => f.write_str("kan"),
            Choice::Riichi(tile) => write!(f, "riichi {tile}"),
            Choice::Ron => f.write_str("ron"),
            Choice::Tsumo => f.write_str("tsumo"),
            Choice::Accept => f.write_str("accept"),
            Choice::Skip => f.write_str("skip"),
        }
    }
}

/// Pick a listed tile matching `wanted`: the same physical tile if listed,
/// otherwise the preferred copy, otherwise the first of its kind
fn match_tile(options: &[Tile], wanted: Tile, preferred: Option<Tile>) -> Option<Tile> {
    if options.contains(&wanted) {
        return Some(wanted);
    }
    if let Some(p) = preferred.filter(|p| p.same_kind(wanted) && options.contains(p)) {
        return Some(p);
    }
    options.iter().copied().find(|t| t.same_kind(wanted))
}

impl Offer {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Offer::Discard { .. } => DecisionKind::Discard,
            Offer::Chii { .. } => DecisionKind::Chii,
            Offer::Meld { pon: true, .. } => DecisionKind::Pon,
            Offer::Meld { .. } | Offer::SelfKan { .. } => DecisionKind::Kan,
            Offer::Riichi { .. } => DecisionKind::Riichi,
            Offer::Ron { .. } => DecisionKind::Ron,
            Offer::Tsumo { .. } => DecisionKind::Tsumo,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Offer::Ron { .. } | Offer::Tsumo { .. })
    }

    /// The choice made when nobody answers
    ///
    /// Discards fall back to the drawn tile, then to the first legal tile;
    /// `None` means there is nothing legal to discard. Calls are declined,
    /// except that wins are taken when `auto_win` is set.
    pub fn default_choice(&self, auto_win: bool) -> Option<Choice> {
        match self {
            Offer::Discard { options, drawn } => drawn
                .filter(|d| options.contains(d))
                .or_else(|| options.first().copied())
                .map(Choice::Discard),
            Offer::Ron { .. } if auto_win => Some(Choice::Ron),
            Offer::Tsumo { .. } if auto_win => Some(Choice::Tsumo),
            _ => Some(Choice::Skip),
        }
    }

    /// Validate an explicit choice against this offer
    ///
    /// Returns the normalized choice (a concrete tile or run, `Accept`
    /// expanded), or `None` when the choice does not answer this offer.
    pub fn resolve(&self, choice: &Choice) -> Option<Choice> {
        match (self, choice) {
            (Offer::Discard { options, drawn }, Choice::Discard(tile)) => {
                match_tile(options, *tile, *drawn).map(Choice::Discard)
            }
            (Offer::Discard { .. }, Choice::Accept) => self.default_choice(false),
            (Offer::Discard { .. }, _) => None,

            (_, Choice::Skip) => Some(Choice::Skip),

            (Offer::Chii { options, .. }, Choice::Chii(start)) => options
                .iter()
                .find(|o| o.start == *start)
                .map(|o| Choice::Chii(o.start)),
            (Offer::Chii { options, .. }, Choice::Accept) => {
                options.first().map(|o| Choice::Chii(o.start))
            }

            (Offer::Meld { pon: true, .. }, Choice::Pon) => Some(Choice::Pon),
            (Offer::Meld { tile, kan: true, .. }, Choice::Kan(_) | Choice::Accept) => {
                Some(Choice::Kan(Some(*tile)))
            }
            (Offer::Meld { pon: true, .. }, Choice::Accept) => Some(Choice::Pon),

            (Offer::SelfKan { options }, Choice::Kan(Some(tile))) => {
                match_tile(options, *tile, None).map(|t| Choice::Kan(Some(t)))
            }
            (Offer::SelfKan { options }, Choice::Kan(None) | Choice::Accept) => {
                options.first().map(|t| Choice::Kan(Some(*t)))
            }

            (Offer::Riichi { options }, Choice::Riichi(tile)) => {
                match_tile(options, *tile, None).map(Choice::Riichi)
            }
            (Offer::Riichi { options }, Choice::Accept) => {
                options.first().map(|t| Choice::Riichi(*t))
            }

            (Offer::Ron { .. }, Choice::Ron | Choice::Accept) => Some(Choice::Ron),
            (Offer::Tsumo { .. }, Choice::Tsumo | Choice::Accept) => Some(Choice::Tsumo),

            _ => None,
        }
    }
}

fn join_tiles(tiles: &[Tile]) -> String {
    tiles
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offer::Discard { options, drawn } => {
                write!(f, "discard one of [{}]", join_tiles(options))?;
                if let Some(drawn) = drawn {
                    write!(f, ", drew {drawn}")?;
                }
                Ok(())
            }
            Offer::Chii { tile, options } => {
                let starts: Vec<String> = options.iter().map(|o| o.start.to_string()).collect();
                write!(f, "chii {tile} starting at [{}]", starts.join(" "))
            }
            Offer::Meld { tile, pon, kan } => match (pon, kan) {
                (true, true) => write!(f, "pon or kan {tile}"),
                (false, true) => write!(f, "kan {tile}"),
                _ => write!(f, "pon {tile}"),
            },
            Offer::SelfKan { options } => write!(f, "kan one of [{}]", join_tiles(options)),
            Offer::Riichi { options } => write!(f, "riichi discarding one of [{}]", join_tiles(options)),
            Offer::Ron { tile, from } => write!(f, "ron on {tile} from {from}"),
            Offer::Tsumo { tile: Some(tile), .. } => write!(f, "tsumo on {tile}"),
            Offer::Tsumo { tile: None, .. } => f.write_str("tsumo"),
        }
    }
}
