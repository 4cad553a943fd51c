//! Core table vocabulary: seats, tiles and calls

pub mod call;
pub mod seat;
pub mod tile;

pub use call::{CallChoices, CallKind, ChiiOption, PendingCall};
pub use seat::{Seat, SEAT_COUNT};
pub use tile::{Suit, Tile, KIND_COUNT, TILE_COUNT};
