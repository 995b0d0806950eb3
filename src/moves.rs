//! Solver output types: a move plus its step-by-step explanation.
//!
//! A `Move` carries three disjoint cell sets (reveal, flag, chord) and the
//! ordered hint narration that justifies them. Both types are immutable
//! values with structural equality; the cell sets are ordered so the wire
//! form is deterministic.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Board coordinates as `(x, y)`, zero-based, x growing rightwards.
pub type Coord = (usize, usize);

/// One narrated sentence of the solver's explanation, with the cells to
/// highlight while it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintStep {
    pub text: String,
    pub revealed_cells_to_highlight: BTreeSet<Coord>,
    pub hidden_cells_to_highlight: BTreeSet<Coord>,
}

impl HintStep {
    pub fn new(
        text: impl Into<String>,
        revealed: impl IntoIterator<Item = Coord>,
        hidden: impl IntoIterator<Item = Coord>,
    ) -> Self {
        Self {
            text: text.into(),
            revealed_cells_to_highlight: revealed.into_iter().collect(),
            hidden_cells_to_highlight: hidden.into_iter().collect(),
        }
    }
}

/// The solver's answer for one board state.
///
/// At least one of the three cell sets is non-empty on every move the solver
/// returns. `cells_to_expand` holds already-revealed cells whose hidden,
/// unflagged neighbors should be revealed (chording); `cells_to_reveal`
/// holds hidden cells to uncover directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Move {
    pub cells_to_reveal: BTreeSet<Coord>,
    pub cells_to_flag: BTreeSet<Coord>,
    pub cells_to_expand: BTreeSet<Coord>,
    #[serde(rename = "hintSteps")]
    pub steps: Vec<HintStep>,
}

impl Move {
    pub fn reveal(cells: BTreeSet<Coord>, steps: Vec<HintStep>) -> Self {
        Self {
            cells_to_reveal: cells,
            steps,
            ..Self::default()
        }
    }

    pub fn flag(cells: BTreeSet<Coord>, steps: Vec<HintStep>) -> Self {
        Self {
            cells_to_flag: cells,
            steps,
            ..Self::default()
        }
    }

    pub fn reveal_and_flag(
        reveal: BTreeSet<Coord>,
        flag: BTreeSet<Coord>,
        steps: Vec<HintStep>,
    ) -> Self {
        Self {
            cells_to_reveal: reveal,
            cells_to_flag: flag,
            steps,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[Coord]) -> BTreeSet<Coord> {
        coords.iter().copied().collect()
    }

    #[test]
    fn test_hint_step_equality_is_structural() {
        let a = HintStep::new("Check out these two cells.", [(1, 0), (2, 0)], []);
        let b = HintStep::new("Check out these two cells.", [(2, 0), (1, 0)], []);
        assert_eq!(a, b);
    }

    #[test]
    fn test_move_json_shape() {
        let mv = Move::reveal_and_flag(
            cells(&[(0, 1)]),
            cells(&[(3, 1)]),
            vec![HintStep::new("Check out these two cells.", [(1, 0)], [(3, 1)])],
        );
        let value = serde_json::to_value(&mv).unwrap();
        assert_eq!(value["cellsToReveal"], serde_json::json!([[0, 1]]));
        assert_eq!(value["cellsToFlag"], serde_json::json!([[3, 1]]));
        assert_eq!(value["cellsToExpand"], serde_json::json!([]));
        assert_eq!(
            value["hintSteps"][0]["text"],
            serde_json::json!("Check out these two cells.")
        );
        assert_eq!(
            value["hintSteps"][0]["revealedCellsToHighlight"],
            serde_json::json!([[1, 0]])
        );
        assert_eq!(
            value["hintSteps"][0]["hiddenCellsToHighlight"],
            serde_json::json!([[3, 1]])
        );
    }

    #[test]
    fn test_move_json_round_trip() {
        let mv = Move::flag(
            cells(&[(0, 0), (2, 0)]),
            vec![HintStep::new("Flag the remaining cells", [(1, 0)], [(0, 0), (2, 0)])],
        );
        let json = serde_json::to_string(&mv).unwrap();
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(mv, back);
    }
}
