//! gemtui: match-three gem puzzle engine with chain-reacting bombs.
//!
//! The engine is a pure grid-state machine: swap two neighbours, find the best match,
//! resolve it into score, refill the holes from above, and repeat until the board is stable.
//! Rendering, input and timing live in the `gemtui` binary and only exchange plain data with
//! the engine (grid snapshots, [`ScoreEvent`]s, [`SwapOutcome`]s and refill events).

pub mod cascade;
pub mod chain;
pub mod config;
pub mod error;
pub mod grid;
pub mod layout;
pub mod matcher;
pub mod refill;
pub mod resolver;
pub mod score;
pub mod swap;

pub use cascade::{CascadeStep, Engine, TurnReport};
pub use chain::explode;
pub use config::EngineConfig;
pub use error::EngineError;
pub use grid::{Cell, GemKind, Grid, Pos, Special};
pub use matcher::{MatchDescriptor, Orientation, ShapeKind, find_best_match};
pub use refill::{Fall, Materialized, RefillReport, refill};
pub use resolver::{ScoreEvent, resolve, spawn_special};
pub use score::{ClearTier, ScoreBoard};
pub use swap::{SwapOutcome, try_swap};
