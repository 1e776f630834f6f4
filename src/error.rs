//! Engine errors. Every variant is a contract violation by the caller or an internal
//! sequencing bug; an illegal swap request is not an error (see [`crate::SwapOutcome`]).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },
    #[error("cell ({x}, {y}) is empty")]
    EmptyCellAccess { x: usize, y: usize },
    #[error("cell ({x}, {y}) holds no special piece")]
    NotSpecial { x: usize, y: usize },
    #[error("layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("gem kind {kind} is outside 1..={max}")]
    InvalidGemKind { kind: u8, max: u8 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cascade did not settle within {0} steps")]
    CascadeLimit(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
