//! Error types for the table orchestration engine

use crate::core::Seat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Invalid seat index: {0}")]
    InvalidSeat(u8),

    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unreachable control path: {0}")]
    Unreachable(String),

    #[error("No legal discard for {0}")]
    NoLegalDiscard(Seat),

    #[error("Decision window already open for {0}")]
    WindowAlreadyOpen(Seat),

    #[error("Session cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl TableError {
    /// Errors that abort the current round instead of being absorbed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TableError::Unreachable(_)
                | TableError::NoLegalDiscard(_)
                | TableError::WindowAlreadyOpen(_)
        )
    }
}

impl From<serde_json::Error> for TableError {
    fn from(e: serde_json::Error) -> Self {
        TableError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
