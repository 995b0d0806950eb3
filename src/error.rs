//! Error types for board parsing and generation.
//!
//! The solver itself never fails: `next_move` returns `None` when no rule
//! applies. Errors surface only from parameter validation and the two wire
//! formats, so callers can map them to client or server failures.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Dimensions, start location, or mine count outside the allowed range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Malformed board input, in either the JSON or the text form.
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    /// The generator exhausted its restart budget without finding a layout
    /// the solver can finish.
    #[error("could not generate a solvable board after {0} fresh layouts")]
    Unsolvable(u32),
}
