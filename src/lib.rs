//! Riichi Table - turn and call orchestration for Japanese Mahjong
//!
//! Sequences picks, discards and interrupting calls (chii, pon, kan,
//! riichi, ron, tsumo) over a rules engine, with bounded decision windows
//! for a human seat and cooperative cancellation of a running session.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod game;
pub mod simulate;
pub mod undo;

pub use config::{AiSpeed, DelayProfile, TableConfig};
pub use error::{Result, TableError};
