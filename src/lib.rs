//! Deductive Minesweeper assistant: a hint-producing solver and a generator
//! for boards the solver can finish without guessing.
//!
//! Two entry points serve the surrounding service. [`next_move`] inspects a
//! board and returns the smallest applicable deduction as a [`Move`], with a
//! step-by-step narration suitable for teaching. [`generate_board`] builds a
//! random layout with a safe 3x3 start block and reworks it until the solver
//! alone can finish it from the start square.
//!
//! Boards cross the boundary as JSON ([`Board::from_json`] /
//! [`Board::to_json`]); moves serialize through serde with the same
//! camelCase conventions.

pub mod board;
pub mod error;
pub mod generate;
pub mod moves;
pub mod rng;
pub mod solver;

pub use board::{Board, Cell};
pub use error::{Error, Result};
pub use generate::{generate_board, generate_board_with};
pub use moves::{Coord, HintStep, Move};
pub use rng::GameRng;
pub use solver::next_move;
