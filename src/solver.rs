//! Deductive solver: five rules applied in a fixed priority order, each
//! returning the first applicable move together with a narrated hint trail.
//!
//! The order keeps the smallest reasoning step first: per-cell saturation
//! checks while scanning the grid once, then pairwise subset reasoning, then
//! the two global mine-accounting rules. `next_move` is a pure function of
//! the board and never errors; a board that is solved, contradictory, or
//! needs guessing yields `None`.

use std::collections::{BTreeMap, BTreeSet};
use std::iter;

use crate::board::Board;
use crate::moves::{Coord, HintStep, Move};

/// Exponential-search fuse for the global flag rule: frontier groups larger
/// than this abstain instead of enumerating subsets.
const MAX_GROUP_SIZE: usize = 15;

/// A revealed cell with its live constraint state.
struct Clue {
    loc: Coord,
    mines: usize,
    flags: usize,
    hidden: BTreeSet<Coord>,
}

fn number_word(n: usize) -> &'static str {
    [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight",
    ][n]
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

fn is_are(n: usize) -> &'static str {
    if n > 1 {
        "are"
    } else {
        "is"
    }
}

fn this_these(n: usize) -> &'static str {
    if n > 1 {
        "these"
    } else {
        "this"
    }
}

/// Compute the next deduction for `board`, or `None` when no rule applies.
pub fn next_move(board: &Board) -> Option<Move> {
    let mut clues = Vec::new();
    for (x, y) in board.coords() {
        if !board.cell(x, y).is_revealed {
            continue;
        }
        let clue = Clue {
            loc: (x, y),
            mines: board.mine_count(x, y),
            flags: board.flag_count(x, y),
            hidden: board.hidden_unflagged_neighbors(x, y),
        };
        if let Some(mv) = flag_remaining_neighbors(&clue) {
            return Some(mv);
        }
        if let Some(mv) = expand_saturated_cell(&clue) {
            return Some(mv);
        }
        clues.push(clue);
    }
    intersect_pairs(&clues)
        .or_else(|| reveal_remaining_cells(board))
        .or_else(|| flag_remaining_mines(board))
}

/// A cell whose unaccounted mines exactly fill its hidden neighbors: flag
/// them all.
fn flag_remaining_neighbors(clue: &Clue) -> Option<Move> {
    if clue.hidden.is_empty() || clue.mines != clue.hidden.len() + clue.flags {
        return None;
    }
    let step = HintStep::new(
        format!("Flag the remaining cell{}", plural(clue.hidden.len())),
        [clue.loc],
        clue.hidden.iter().copied(),
    );
    Some(Move::flag(clue.hidden.clone(), vec![step]))
}

/// A saturated cell: every one of its remaining neighbors is safe.
fn expand_saturated_cell(clue: &Clue) -> Option<Move> {
    if clue.hidden.is_empty() || clue.mines != clue.flags {
        return None;
    }
    let step = HintStep::new(
        format!("Reveal the remaining cell{}", plural(clue.hidden.len())),
        [clue.loc],
        clue.hidden.iter().copied(),
    );
    Some(Move::reveal(clue.hidden.clone(), vec![step]))
}

/// Subset and intersection reasoning over pairs of nearby clues.
///
/// Only pairs within Chebyshev distance 2 can share hidden neighbors, so
/// everything farther apart is skipped.
fn intersect_pairs(clues: &[Clue]) -> Option<Move> {
    for (i, a) in clues.iter().enumerate() {
        for b in &clues[i + 1..] {
            if a.loc.0.abs_diff(b.loc.0) > 2 || a.loc.1.abs_diff(b.loc.1) > 2 {
                continue;
            }
            if let Some(mv) = intersect(a, b) {
                return Some(mv);
            }
        }
    }
    None
}

fn intersect(a: &Clue, b: &Clue) -> Option<Move> {
    if a.mines == 0 || b.mines == 0 {
        return None;
    }
    if a.flags >= a.mines || b.flags >= b.mines {
        return None;
    }
    // The set with more hidden cells drives the reasoning; on a tie the
    // second clue's set does.
    let (bigger, smaller) = if a.hidden.len() > b.hidden.len() {
        (a, b)
    } else {
        (b, a)
    };
    let bigger_mines = bigger.mines - bigger.flags;
    let smaller_mines = smaller.mines - smaller.flags;
    let intersection: BTreeSet<Coord> = bigger
        .hidden
        .intersection(&smaller.hidden)
        .copied()
        .collect();
    let unique: BTreeSet<Coord> = bigger.hidden.difference(&smaller.hidden).copied().collect();
    if unique.is_empty() {
        return None;
    }

    if bigger_mines > smaller_mines && bigger_mines - smaller_mines == unique.len() {
        // Every mine beyond the smaller clue's share is confined to the
        // cells unique to the bigger clue, and the smaller clue's own unique
        // cells are left with none.
        let safe: BTreeSet<Coord> = smaller.hidden.difference(&bigger.hidden).copied().collect();
        let diff = bigger_mines - smaller_mines;
        let steps = vec![
            HintStep::new("Check out these two cells.", [a.loc, b.loc], []),
            HintStep::new(
                format!(
                    "There {} only {} remaining mine{} in {} cell{}.",
                    is_are(smaller_mines),
                    number_word(smaller_mines),
                    plural(smaller_mines),
                    this_these(smaller.hidden.len()),
                    plural(smaller.hidden.len()),
                ),
                [smaller.loc],
                smaller.hidden.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "This means there can only be {} remaining mine{} in the cell{} shared by both these numbers.",
                    number_word(smaller_mines),
                    plural(smaller_mines),
                    plural(intersection.len()),
                ),
                [smaller.loc, bigger.loc],
                intersection.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "That accounts for {} of the mines, leaving {} more mine{} in the cells unique to this number.",
                    number_word(smaller_mines),
                    number_word(diff),
                    plural(diff),
                ),
                [bigger.loc],
                unique.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "There {} only {} cell{} unique to this number, so {} should be flagged.",
                    is_are(diff),
                    number_word(diff),
                    plural(diff),
                    if diff > 1 { "these cells" } else { "this cell" },
                ),
                [bigger.loc],
                unique.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "Reveal the safe cell{} unique to this number.",
                    plural(smaller_mines)
                ),
                [smaller.loc],
                safe.iter().copied(),
            ),
        ];
        return Some(Move::reveal_and_flag(safe, unique, steps));
    }

    if bigger_mines == smaller_mines && intersection == smaller.hidden {
        // The smaller clue's cells account for every mine of the bigger one,
        // so the bigger clue's unique cells are all safe.
        let steps = vec![
            HintStep::new("Check out these two cells.", [a.loc, b.loc], []),
            HintStep::new(
                format!(
                    "There {} {} remaining mine{} in {} cell{}.",
                    is_are(smaller_mines),
                    number_word(smaller_mines),
                    plural(smaller_mines),
                    this_these(smaller.hidden.len()),
                    plural(smaller.hidden.len()),
                ),
                [smaller.loc],
                intersection.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "Therefore, there are no remaining mines in {} cell{}.",
                    this_these(unique.len()),
                    plural(unique.len()),
                ),
                [bigger.loc],
                unique.iter().copied(),
            ),
            HintStep::new(
                format!(
                    "Reveal the safe cell{} unique to this number.",
                    plural(unique.len())
                ),
                [bigger.loc],
                unique.iter().copied(),
            ),
        ];
        return Some(Move::reveal(unique, steps));
    }

    None
}

/// Every mine is flagged, so everything still hidden is safe.
fn reveal_remaining_cells(board: &Board) -> Option<Move> {
    if board.flagged_count() != board.mines() {
        return None;
    }
    let hidden: BTreeSet<Coord> = board
        .coords()
        .filter(|&(x, y)| {
            let cell = board.cell(x, y);
            !cell.is_revealed && !cell.is_flagged
        })
        .collect();
    if hidden.is_empty() {
        return None;
    }
    let step = HintStep::new(
        "There are no remaining mines to flag. Reveal the remaining squares!",
        iter::empty(),
        hidden.iter().copied(),
    );
    Some(Move::reveal(hidden, vec![step]))
}

/// Global mine accounting over the hidden cells.
///
/// Either the remaining mines fill every hidden cell, or each frontier group
/// is searched for the unique smallest flag placement that satisfies all of
/// its bordering clues. The move only fires when the forced flags account
/// for every remaining mine.
fn flag_remaining_mines(board: &Board) -> Option<Move> {
    if board.flagged_count() > board.mines() {
        return None;
    }
    let remaining = board.remaining_mines();
    let hidden: Vec<Coord> = board
        .coords()
        .filter(|&(x, y)| {
            let cell = board.cell(x, y);
            !cell.is_revealed && !cell.is_flagged
        })
        .collect();
    if hidden.is_empty() || remaining == 0 {
        return None;
    }

    if remaining == hidden.len() {
        let step = HintStep::new(
            format!(
                "Flag {} remaining mine{}",
                if remaining == 1 { "the" } else { "all" },
                plural(remaining),
            ),
            iter::empty(),
            hidden.iter().copied(),
        );
        return Some(Move::flag(hidden.into_iter().collect(), vec![step]));
    }

    let mut forced: BTreeSet<Coord> = BTreeSet::new();
    for group in frontier_groups(board, &hidden) {
        if group.len() > MAX_GROUP_SIZE {
            return None;
        }
        forced.extend(unique_minimal_assignment(board, &group)?);
    }
    if forced.is_empty() || forced.len() != remaining {
        return None;
    }

    let steps = vec![
        HintStep::new(
            format!(
                "There {} only {} remaining mine{} left",
                is_are(remaining),
                remaining,
                plural(remaining),
            ),
            iter::empty(),
            hidden.iter().copied(),
        ),
        HintStep::new(
            "This is the only possible configuration",
            iter::empty(),
            forced.iter().copied(),
        ),
    ];
    Some(Move::flag(forced, steps))
}

/// Partition the hidden unflagged cells that border a revealed cell into
/// connected components under "shares a revealed neighbor".
fn frontier_groups(board: &Board, hidden: &[Coord]) -> Vec<Vec<Coord>> {
    let frontier: Vec<Coord> = hidden
        .iter()
        .copied()
        .filter(|&(x, y)| {
            board
                .neighbors(x, y)
                .iter()
                .any(|&(nx, ny)| board.cell(nx, ny).is_revealed)
        })
        .collect();
    let frontier_set: BTreeSet<Coord> = frontier.iter().copied().collect();

    let mut visited: BTreeSet<Coord> = BTreeSet::new();
    let mut groups = Vec::new();
    for &seed in &frontier {
        if !visited.insert(seed) {
            continue;
        }
        let mut group = Vec::new();
        let mut queue = vec![seed];
        while let Some((cx, cy)) = queue.pop() {
            group.push((cx, cy));
            for &(nx, ny) in board.neighbors(cx, cy) {
                if !board.cell(nx, ny).is_revealed {
                    continue;
                }
                for &other in board.neighbors(nx, ny) {
                    if frontier_set.contains(&other) && visited.insert(other) {
                        queue.push(other);
                    }
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

/// Find the unique smallest flag placement inside `group` that satisfies
/// every bordering clue exactly.
///
/// Returns `None` when several placements tie at the smallest cardinality,
/// which makes the whole rule abstain. A group with no satisfying placement
/// contributes nothing.
fn unique_minimal_assignment(board: &Board, group: &[Coord]) -> Option<BTreeSet<Coord>> {
    let index: BTreeMap<Coord, usize> = group.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    let mut clue_locs: BTreeSet<Coord> = BTreeSet::new();
    for &(x, y) in group {
        for &(nx, ny) in board.neighbors(x, y) {
            if board.cell(nx, ny).is_revealed {
                clue_locs.insert((nx, ny));
            }
        }
    }

    let mut constraints: Vec<(usize, Vec<usize>)> = Vec::new();
    for &(cx, cy) in &clue_locs {
        let mines = board.mine_count(cx, cy);
        let flags = board.flag_count(cx, cy);
        if flags > mines {
            // No placement can satisfy an over-flagged clue.
            return Some(BTreeSet::new());
        }
        let members: Vec<usize> = board
            .neighbors(cx, cy)
            .iter()
            .filter_map(|n| index.get(n).copied())
            .collect();
        constraints.push((mines - flags, members));
    }

    let satisfies = |mask: u32| {
        constraints.iter().all(|(needed, members)| {
            members.iter().filter(|&&i| mask >> i & 1 == 1).count() == *needed
        })
    };

    let total: u32 = 1 << group.len();
    let mut best_bits = u32::MAX;
    let mut best_mask = 0u32;
    let mut ties = 0usize;
    for mask in 0..total {
        let bits = mask.count_ones();
        if bits > best_bits || !satisfies(mask) {
            continue;
        }
        if bits < best_bits {
            best_bits = bits;
            best_mask = mask;
            ties = 1;
        } else {
            ties += 1;
        }
    }

    if best_bits == u32::MAX {
        return Some(BTreeSet::new());
    }
    if ties > 1 {
        return None;
    }
    Some(
        group
            .iter()
            .enumerate()
            .filter(|&(i, _)| best_mask >> i & 1 == 1)
            .map(|(_, &c)| c)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[Coord]) -> BTreeSet<Coord> {
        coords.iter().copied().collect()
    }

    fn solve(text: &str) -> Move {
        next_move(&Board::parse(text).unwrap()).expect("a move should be found")
    }

    #[test]
    fn test_number_words() {
        assert_eq!(number_word(0), "zero");
        assert_eq!(number_word(1), "one");
        assert_eq!(number_word(8), "eight");
    }

    #[test]
    fn test_flags_remaining_neighbors() {
        let mv = solve("M.M\n...");
        assert_eq!(mv.cells_to_flag, cells(&[(0, 0), (2, 0)]));
        assert!(mv.cells_to_reveal.is_empty());
        assert_eq!(
            mv.steps,
            vec![HintStep::new(
                "Flag the remaining cells",
                [(1, 0)],
                [(0, 0), (2, 0)]
            )]
        );
    }

    #[test]
    fn test_reveals_saturated_cell_neighbors() {
        let mv = solve("F?\n.F\n.?");
        assert_eq!(mv.cells_to_reveal, cells(&[(1, 0), (1, 2)]));
        assert!(mv.cells_to_flag.is_empty());
        assert_eq!(
            mv.steps,
            vec![HintStep::new(
                "Reveal the remaining cells",
                [(0, 1)],
                [(1, 0), (1, 2)]
            )]
        );
    }

    #[test]
    fn test_subset_difference_flags_and_reveals() {
        let mv = solve("F..FF\n??MM.\n????.");
        assert_eq!(mv.cells_to_reveal, cells(&[(0, 1)]));
        assert_eq!(mv.cells_to_flag, cells(&[(3, 1)]));
        assert_eq!(
            mv.steps,
            vec![
                HintStep::new("Check out these two cells.", [(1, 0), (2, 0)], []),
                HintStep::new(
                    "There is only one remaining mine in these cells.",
                    [(1, 0)],
                    [(0, 1), (1, 1), (2, 1)]
                ),
                HintStep::new(
                    "This means there can only be one remaining mine in the cells shared by both these numbers.",
                    [(1, 0), (2, 0)],
                    [(1, 1), (2, 1)]
                ),
                HintStep::new(
                    "That accounts for one of the mines, leaving one more mine in the cells unique to this number.",
                    [(2, 0)],
                    [(3, 1)]
                ),
                HintStep::new(
                    "There is only one cell unique to this number, so this cell should be flagged.",
                    [(2, 0)],
                    [(3, 1)]
                ),
                HintStep::new(
                    "Reveal the safe cell unique to this number.",
                    [(1, 0)],
                    [(0, 1)]
                ),
            ]
        );
    }

    #[test]
    fn test_subset_contained_reveals() {
        let mv = solve("???M\n????\nFF.M\n...?\n..FF");
        assert_eq!(mv.cells_to_reveal, cells(&[(1, 1), (2, 1), (3, 1)]));
        assert!(mv.cells_to_flag.is_empty());
        assert_eq!(
            mv.steps,
            vec![
                HintStep::new("Check out these two cells.", [(2, 2), (2, 3)], []),
                HintStep::new(
                    "There is one remaining mine in these cells.",
                    [(2, 3)],
                    [(3, 2), (3, 3)]
                ),
                HintStep::new(
                    "Therefore, there are no remaining mines in these cells.",
                    [(2, 2)],
                    [(1, 1), (2, 1), (3, 1)]
                ),
                HintStep::new(
                    "Reveal the safe cells unique to this number.",
                    [(2, 2)],
                    [(1, 1), (2, 1), (3, 1)]
                ),
            ]
        );
    }

    #[test]
    fn test_flags_forced_by_mine_count() {
        let mv = solve("MF.\nFF.\n...");
        assert_eq!(mv.cells_to_flag, cells(&[(0, 0)]));
        assert_eq!(
            mv.steps,
            vec![HintStep::new("Flag the remaining mine", [], [(0, 0)])]
        );
    }

    #[test]
    fn test_reveals_when_all_mines_flagged() {
        let mv = solve("?F.\nFF.\n...");
        assert_eq!(mv.cells_to_reveal, cells(&[(0, 0)]));
        assert_eq!(
            mv.steps,
            vec![HintStep::new(
                "There are no remaining mines to flag. Reveal the remaining squares!",
                [],
                [(0, 0)]
            )]
        );
    }

    #[test]
    fn test_rule_priority_prefers_local_deduction() {
        // Both the per-cell flag rule and global accounting apply here (two
        // hidden cells, two remaining mines); the per-cell rule must win.
        let mv = solve("M.M\n...");
        assert_eq!(mv.steps[0].text, "Flag the remaining cells");
        assert_eq!(mv.steps[0].revealed_cells_to_highlight, cells(&[(1, 0)]));
    }

    #[test]
    fn test_no_move_on_finished_board() {
        let board = Board::parse("F.\n..").unwrap();
        assert!(board.is_solved());
        assert!(next_move(&board).is_none());
    }

    #[test]
    fn test_no_move_without_information() {
        // Nothing revealed and the mine count pins nothing down.
        let board = Board::parse("M?\n??").unwrap();
        assert!(next_move(&board).is_none());
    }

    #[test]
    fn test_global_flag_abstains_on_ambiguity() {
        // One mine in two symmetric cells: a coin flip, not a deduction.
        let board = Board::parse("..\n?M").unwrap();
        assert!(next_move(&board).is_none());
    }

    #[test]
    fn test_global_flag_unique_configuration() {
        // Four clues, each seeing the center and two of the corners-and-edges
        // ring. Only the center satisfies all of them with a single mine, but
        // no clue or clue pair pins it alone.
        let mv = solve("?.?\n.M.\n?.?");
        assert_eq!(mv.cells_to_flag, cells(&[(1, 1)]));
        assert_eq!(
            mv.steps,
            vec![
                HintStep::new(
                    "There is only 1 remaining mine left",
                    [],
                    [(0, 0), (2, 0), (1, 1), (0, 2), (2, 2)]
                ),
                HintStep::new("This is the only possible configuration", [], [(1, 1)]),
            ]
        );
    }

    #[test]
    fn test_global_flag_abstains_on_oversized_group() {
        // A 20-cell frontier strip blows the enumeration fuse.
        let text = format!("???M?????M??????M???\n{}", ".".repeat(20));
        let board = Board::parse(&text).unwrap();
        assert!(flag_remaining_mines(&board).is_none());
    }

    #[test]
    fn test_frontier_groups_split_by_shared_clues() {
        // Two hidden pockets separated by revealed cells form two groups.
        let board = Board::parse("?..?\n?..?\n....").unwrap();
        let hidden: Vec<Coord> = board
            .coords()
            .filter(|&(x, y)| !board.cell(x, y).is_revealed)
            .collect();
        let groups = frontier_groups(&board, &hidden);
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&vec![(0, 0), (0, 1)]));
        assert!(groups.contains(&vec![(3, 0), (3, 1)]));
    }

    #[test]
    fn test_solver_finishes_a_simple_game() {
        let mut board = Board::parse("MM?\n???\n???").unwrap();
        board.reveal(2, 2);
        let mut moves = 0;
        while !board.is_solved() {
            let mv = next_move(&board).expect("deduction should finish this board");
            for &(x, y) in &mv.cells_to_reveal {
                assert!(!board.cell(x, y).is_mine, "solver revealed a mine");
                board.reveal(x, y);
            }
            for &(x, y) in &mv.cells_to_flag {
                assert!(board.cell(x, y).is_mine, "solver flagged a safe cell");
                board.flag(x, y);
            }
            for &(x, y) in &mv.cells_to_expand {
                board.reveal(x, y);
            }
            moves += 1;
            assert!(moves < 100, "solver is not making progress");
        }
        assert!(board.is_solved());
    }
}
