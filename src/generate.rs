//! Solvable-board generation: seed a random layout, drive the solver, and
//! perturb the mine placement whenever it stalls.
//!
//! Pure rejection sampling is hopeless at hard densities, so a stalled board
//! is nudged instead: one frontier mine moves into territory the solver has
//! not opened, which preserves the mine count and the safe start block while
//! loosening the constraints that caused the deadlock. A layout only ships
//! after a clean solver run finishes it from the initial reveal alone.

use crate::board::Board;
use crate::error::{Error, Result};
use crate::moves::{Coord, Move};
use crate::rng::GameRng;
use crate::solver::next_move;

/// Fresh random layouts to try before giving up.
const MAX_RESTARTS: u32 = 5;

/// Generate a board the solver can finish from `(start_x, start_y)` without
/// guessing. The start cell is revealed, everything else hidden.
///
/// Draws from OS entropy; see [`generate_board_with`] for a reproducible
/// variant.
pub fn generate_board(
    width: usize,
    height: usize,
    mines: usize,
    start_x: usize,
    start_y: usize,
) -> Result<Board> {
    generate_board_with(width, height, mines, (start_x, start_y), &mut GameRng::new())
}

/// Generate a solvable board with a caller-provided random source.
pub fn generate_board_with(
    width: usize,
    height: usize,
    mines: usize,
    start: Coord,
    rng: &mut GameRng,
) -> Result<Board> {
    if mines.saturating_add(9) > width.saturating_mul(height) {
        return Err(Error::InvalidParameters(format!(
            "{mines} mines do not fit a {width}x{height} board with a safe start block"
        )));
    }

    let (sx, sy) = start;
    for _ in 0..MAX_RESTARTS {
        let mut board = Board::random(width, height, mines, start, rng)?;
        if make_solvable(&mut board, rng) {
            board.conceal();
            board.reveal(sx, sy);
            return Ok(board);
        }
    }
    Err(Error::Unsolvable(MAX_RESTARTS))
}

/// Drive the solver to completion, perturbing the layout at every stall,
/// until a clean run from the initial reveal finishes the board.
///
/// Reaching a solved state through mid-game perturbations is not enough: a
/// perturbation can invalidate the deductions that opened the current
/// region, so the layout is re-checked from scratch and perturbation resumes
/// from wherever the clean run stalls.
fn make_solvable(board: &mut Board, rng: &mut GameRng) -> bool {
    let (sx, sy) = board.start();
    let mut budget = board.width() * board.height();
    loop {
        board.conceal();
        board.reveal(sx, sy);
        run_solver(board);
        if board.is_solved() {
            return true;
        }
        loop {
            if budget == 0 || !perturb(board, rng) {
                return false;
            }
            budget -= 1;
            run_solver(board);
            if board.is_solved() {
                break;
            }
        }
    }
}

/// Apply solver moves until it stalls or the board is solved.
fn run_solver(board: &mut Board) {
    while !board.is_solved() {
        let Some(mv) = next_move(board) else { return };
        apply_move(board, &mv);
    }
}

/// Apply a move's cell sets to the board.
fn apply_move(board: &mut Board, mv: &Move) {
    for &(x, y) in &mv.cells_to_reveal {
        board.reveal(x, y);
    }
    for &(x, y) in &mv.cells_to_flag {
        board.flag(x, y);
    }
    for &(x, y) in &mv.cells_to_expand {
        board.reveal(x, y);
    }
}

/// Move one frontier mine into territory the solver has not opened.
///
/// The source is a hidden mine with a revealed neighbor, unflagged ones
/// preferred. The target is a hidden safe cell with no revealed neighbor,
/// or failing that a revealed safe cell outside the start block. Both cells
/// end hidden and unflagged, so the mine count and the safe start block are
/// preserved. Returns `false` when no source or target exists.
fn perturb(board: &mut Board, rng: &mut GameRng) -> bool {
    let mut unflagged_sources: Vec<Coord> = Vec::new();
    let mut flagged_sources: Vec<Coord> = Vec::new();
    let mut interior: Vec<Coord> = Vec::new();
    let mut opened: Vec<Coord> = Vec::new();

    for (x, y) in board.coords() {
        let cell = board.cell(x, y);
        let fringe = board
            .neighbors(x, y)
            .iter()
            .any(|&(nx, ny)| board.cell(nx, ny).is_revealed);
        if cell.is_mine && !cell.is_revealed && fringe {
            if cell.is_flagged {
                flagged_sources.push((x, y));
            } else {
                unflagged_sources.push((x, y));
            }
        } else if !cell.is_mine && !cell.is_revealed && !cell.is_flagged && !fringe {
            interior.push((x, y));
        } else if !cell.is_mine && cell.is_revealed && !board.in_start_block(x, y) {
            opened.push((x, y));
        }
    }

    let source = rng
        .pick(&unflagged_sources)
        .copied()
        .or_else(|| rng.pick(&flagged_sources).copied());
    let target = rng
        .pick(&interior)
        .copied()
        .or_else(|| rng.pick(&opened).copied());
    let (Some(from), Some(to)) = (source, target) else {
        return false;
    };
    board.move_mine(from, to);
    true
}
