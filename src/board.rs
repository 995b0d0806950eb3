//! Board model: cells, neighborhood queries, reveal/flag primitives, and the
//! two external representations (JSON and a compact text form for tests).
//!
//! Cells live in a flat row-major `Vec` (`idx = y * width + x`). Neighbor
//! enumeration goes through a precomputed offset table so the solver's inner
//! loops never re-derive bounds checks.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::moves::Coord;
use crate::rng::GameRng;

/// One square of the grid.
///
/// A cell is never both revealed and flagged; `reveal` skips flagged cells
/// and `flag` skips revealed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
}

/// Pre-computed neighbor lists for every cell of a fixed-size grid.
///
/// Flat storage indexed row-major; `get(x, y)` returns the up-to-eight
/// in-bounds neighbors of `(x, y)`.
#[derive(Debug, Clone)]
struct NeighborCache {
    data: Vec<Coord>,
    /// offsets[i] = start index in `data` for cell i; offsets[i + 1] ends it.
    offsets: Vec<usize>,
    width: usize,
}

impl NeighborCache {
    fn new(width: usize, height: usize) -> Self {
        let total = width * height;
        let mut data = Vec::with_capacity(total * 8);
        let mut offsets = Vec::with_capacity(total + 1);

        for y in 0..height {
            for x in 0..width {
                offsets.push(data.len());
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx >= 0 && nx < width as i32 && ny >= 0 && ny < height as i32 {
                            data.push((nx as usize, ny as usize));
                        }
                    }
                }
            }
        }
        offsets.push(data.len());

        Self { data, offsets, width }
    }

    #[inline(always)]
    fn get(&self, x: usize, y: usize) -> &[Coord] {
        let idx = y * self.width + x;
        &self.data[self.offsets[idx]..self.offsets[idx + 1]]
    }
}

/// A Minesweeper board with a fixed mine count and a guaranteed-safe start
/// square.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    mines: usize,
    start: Coord,
    cells: Vec<Cell>,
    neighbors: NeighborCache,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.mines == other.mines
            && self.start == other.start
            && self.cells == other.cells
    }
}

impl Eq for Board {}

impl Board {
    fn empty(width: usize, height: usize, start: Coord) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameters(format!(
                "board dimensions must be positive, got {width}x{height}"
            )));
        }
        if start.0 >= width || start.1 >= height {
            return Err(Error::InvalidParameters(format!(
                "start location ({}, {}) is out of bounds",
                start.0, start.1
            )));
        }
        Ok(Self {
            width,
            height,
            mines: 0,
            start,
            cells: vec![Cell::default(); width * height],
            neighbors: NeighborCache::new(width, height),
        })
    }

    /// A fully hidden board with `mines` mines placed uniformly at random
    /// outside the 3x3 block around `start`.
    pub(crate) fn random(
        width: usize,
        height: usize,
        mines: usize,
        start: Coord,
        rng: &mut GameRng,
    ) -> Result<Self> {
        let mut board = Self::empty(width, height, start)?;
        board.seed_mines(mines, rng);
        Ok(board)
    }

    /// Re-deal the mines at random, leaving the safe start block empty.
    ///
    /// Streaming selection: each candidate is drawn with probability
    /// remaining mines over remaining candidates, which places exactly
    /// `mines` mines in one pass.
    pub(crate) fn seed_mines(&mut self, mines: usize, rng: &mut GameRng) {
        for cell in &mut self.cells {
            cell.is_mine = false;
        }
        let candidates: Vec<Coord> = self
            .coords()
            .filter(|&(x, y)| !self.in_start_block(x, y))
            .collect();
        let mut left = candidates.len();
        let mut to_place = mines;
        for (x, y) in candidates {
            if to_place > 0 && rng.gen_range(left) < to_place {
                self.cell_mut(x, y).is_mine = true;
                to_place -= 1;
            }
            left -= 1;
        }
        self.mines = mines;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The total mine count fixed at construction.
    pub fn mines(&self) -> usize {
        self.mines
    }

    /// The guaranteed-safe start square.
    pub fn start(&self) -> Coord {
        self.start
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline(always)]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    #[inline(always)]
    fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// The in-bounds neighbors of `(x, y)`.
    #[inline(always)]
    pub fn neighbors(&self, x: usize, y: usize) -> &[Coord] {
        self.neighbors.get(x, y)
    }

    /// Number of mined neighbors.
    pub fn mine_count(&self, x: usize, y: usize) -> usize {
        self.neighbors
            .get(x, y)
            .iter()
            .filter(|&&(nx, ny)| self.cell(nx, ny).is_mine)
            .count()
    }

    /// Number of flagged neighbors.
    pub fn flag_count(&self, x: usize, y: usize) -> usize {
        self.neighbors
            .get(x, y)
            .iter()
            .filter(|&&(nx, ny)| self.cell(nx, ny).is_flagged)
            .count()
    }

    /// The hidden, unflagged neighbors of `(x, y)`.
    pub fn hidden_unflagged_neighbors(&self, x: usize, y: usize) -> BTreeSet<Coord> {
        self.neighbors
            .get(x, y)
            .iter()
            .copied()
            .filter(|&(nx, ny)| {
                let cell = self.cell(nx, ny);
                !cell.is_revealed && !cell.is_flagged
            })
            .collect()
    }

    pub fn flagged_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_flagged).count()
    }

    /// Mines not yet accounted for by flags. Saturates at zero when the
    /// board carries more flags than mines, which only well-crafted hostile
    /// input can produce.
    pub fn remaining_mines(&self) -> usize {
        self.mines.saturating_sub(self.flagged_count())
    }

    /// Whether `(x, y)` lies in the 3x3 block around the start square.
    pub(crate) fn in_start_block(&self, x: usize, y: usize) -> bool {
        x.abs_diff(self.start.0) <= 1 && y.abs_diff(self.start.1) <= 1
    }

    /// True when every mine is hidden and every other cell is revealed.
    /// Flags are not consulted.
    pub fn is_solved(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| cell.is_mine != cell.is_revealed)
    }

    /// Reveal a cell. Returns `true` iff no mine was revealed.
    ///
    /// A hidden cell is revealed with a flood fill across zero-neighborhood
    /// cells; the fill stops at flagged cells. Revealing an already-revealed
    /// cell chords it: when its flag count matches its mine count, every
    /// hidden unflagged neighbor is revealed. Revealing a flagged cell does
    /// nothing.
    pub fn reveal(&mut self, x: usize, y: usize) -> bool {
        if self.cell(x, y).is_revealed {
            if self.mine_count(x, y) != self.flag_count(x, y) {
                return true;
            }
            let targets: Vec<Coord> = self.hidden_unflagged_neighbors(x, y).into_iter().collect();
            let mut safe = true;
            for (nx, ny) in targets {
                safe &= self.flood_reveal(nx, ny);
            }
            return safe;
        }
        self.flood_reveal(x, y)
    }

    fn flood_reveal(&mut self, x: usize, y: usize) -> bool {
        let mut safe = true;
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            let cell = self.cell(cx, cy);
            if cell.is_revealed || cell.is_flagged {
                continue;
            }
            let is_mine = cell.is_mine;
            self.cell_mut(cx, cy).is_revealed = true;
            if is_mine {
                safe = false;
                continue;
            }
            if self.mine_count(cx, cy) == 0 {
                stack.extend(self.neighbors.get(cx, cy).iter().copied());
            }
        }
        safe
    }

    /// Toggle the flag on a hidden cell. Revealed cells are left alone.
    pub fn flag(&mut self, x: usize, y: usize) {
        let cell = self.cell_mut(x, y);
        if !cell.is_revealed {
            cell.is_flagged = !cell.is_flagged;
        }
    }

    /// Hide every cell and clear all flags.
    pub(crate) fn conceal(&mut self) {
        for cell in &mut self.cells {
            cell.is_revealed = false;
            cell.is_flagged = false;
        }
    }

    /// Transfer a mine between two cells, leaving both hidden and unflagged.
    pub(crate) fn move_mine(&mut self, from: Coord, to: Coord) {
        let src = self.cell_mut(from.0, from.1);
        src.is_mine = false;
        src.is_flagged = false;
        src.is_revealed = false;
        let dst = self.cell_mut(to.0, to.1);
        dst.is_mine = true;
        dst.is_flagged = false;
        dst.is_revealed = false;
    }

    /// Re-deal the unflagged remaining mines among the hidden unflagged
    /// cells, avoiding the current layout when another one exists.
    ///
    /// Walks at most ten candidate layouts, so this is a cheap
    /// deadlock-breaker rather than a uniform re-sample. Revealed and
    /// flagged cells are untouched. Returns `true` if a new layout was
    /// installed.
    pub fn shuffle_remaining_mines(&mut self, rng: &mut GameRng) -> bool {
        let hidden: Vec<Coord> = self
            .coords()
            .filter(|&(x, y)| {
                let cell = self.cell(x, y);
                !cell.is_revealed && !cell.is_flagged
            })
            .collect();
        let current: BTreeSet<Coord> = hidden
            .iter()
            .copied()
            .filter(|&(x, y)| self.cell(x, y).is_mine)
            .collect();
        let remaining = self.remaining_mines();

        let mut layouts: Vec<BTreeSet<Coord>> = hidden
            .iter()
            .copied()
            .combinations(remaining)
            .take(10)
            .map(|combo| combo.into_iter().collect())
            .collect();
        layouts.retain(|layout| *layout != current);

        let Some(layout) = rng.pick(&layouts) else {
            return false;
        };
        let layout = layout.clone();
        for (x, y) in hidden {
            self.cell_mut(x, y).is_mine = layout.contains(&(x, y));
        }
        true
    }

    /// Parse the text form used by tests: one row per line, `.` revealed
    /// safe, `?` hidden safe, `M` hidden mine, `F` flagged mine. The start
    /// square defaults to `(0, 0)`.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(Error::InvalidBoard("empty board text".into()));
        }

        let width = lines[0].chars().count();
        let height = lines.len();
        let mut board = Self::empty(width, height, (0, 0))?;
        let mut mines = 0;

        for (y, line) in lines.iter().enumerate() {
            if line.chars().count() != width {
                return Err(Error::InvalidBoard(format!(
                    "row {y} has {} cells, expected {width}",
                    line.chars().count()
                )));
            }
            for (x, ch) in line.chars().enumerate() {
                let cell = board.cell_mut(x, y);
                match ch {
                    '.' => cell.is_revealed = true,
                    '?' => {}
                    'M' => {
                        cell.is_mine = true;
                        mines += 1;
                    }
                    'F' => {
                        cell.is_mine = true;
                        cell.is_flagged = true;
                        mines += 1;
                    }
                    _ => {
                        return Err(Error::InvalidBoard(format!(
                            "unknown character '{ch}' at ({x}, {y})"
                        )))
                    }
                }
            }
        }
        board.mines = mines;
        Ok(board)
    }

    /// Parse the JSON wire form. A `mines` field that disagrees with the
    /// grid is tolerated and recomputed from the `isMine` cells.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: BoardWire =
            serde_json::from_str(json).map_err(|e| Error::InvalidBoard(e.to_string()))?;
        if wire.grid.len() != wire.height {
            return Err(Error::InvalidBoard(format!(
                "expected {} rows, found {}",
                wire.height,
                wire.grid.len()
            )));
        }

        let mut board =
            Self::empty(wire.width, wire.height, (wire.start_x, wire.start_y)).map_err(|e| {
                match e {
                    Error::InvalidParameters(msg) => Error::InvalidBoard(msg),
                    other => other,
                }
            })?;

        let mut mines = 0;
        for (y, row) in wire.grid.iter().enumerate() {
            if row.len() != wire.width {
                return Err(Error::InvalidBoard(format!(
                    "row {y} has {} cells, expected {}",
                    row.len(),
                    wire.width
                )));
            }
            for (x, cell) in row.iter().enumerate() {
                if cell.is_visible && cell.is_flagged {
                    return Err(Error::InvalidBoard(format!(
                        "cell ({x}, {y}) is both revealed and flagged"
                    )));
                }
                if cell.is_mine {
                    mines += 1;
                }
                *board.cell_mut(x, y) = Cell {
                    is_mine: cell.is_mine,
                    is_revealed: cell.is_visible,
                    is_flagged: cell.is_flagged,
                };
            }
        }
        board.mines = mines;
        Ok(board)
    }

    /// Serialize to the JSON wire form: `grid[y][x]` with camelCase keys and
    /// per-cell locations.
    pub fn to_json(&self) -> String {
        let grid = (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        let cell = self.cell(x, y);
                        CellWire {
                            is_mine: cell.is_mine,
                            is_visible: cell.is_revealed,
                            is_flagged: cell.is_flagged,
                            location: (x, y),
                        }
                    })
                    .collect()
            })
            .collect();
        let wire = BoardWire {
            width: self.width,
            height: self.height,
            mines: self.mines,
            start_x: self.start.0,
            start_y: self.start.1,
            grid,
        };
        serde_json::to_string(&wire).expect("a board always serializes")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(x, y);
                let ch = if cell.is_flagged {
                    'F'
                } else if cell.is_revealed {
                    '.'
                } else if cell.is_mine {
                    'M'
                } else {
                    '?'
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellWire {
    is_mine: bool,
    is_visible: bool,
    is_flagged: bool,
    location: (usize, usize),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardWire {
    width: usize,
    height: usize,
    mines: usize,
    start_x: usize,
    start_y: usize,
    grid: Vec<Vec<CellWire>>,
}
