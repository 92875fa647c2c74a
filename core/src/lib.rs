use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, Index};

pub use board::*;
pub use cell::*;
pub use error::*;
pub use generator::*;
pub use types::*;

mod board;
mod cell;
mod error;
mod generator;
mod types;

/// Board shape and mine budget for a new game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub side: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(side: Coord, mines: CellCount) -> Self {
        Self { side, mines }
    }

    /// Clamps `side` to at least 1 and `mines` below the total cell count.
    pub fn new(side: Coord, mines: CellCount) -> Self {
        let side = side.max(1);
        let mines = mines.min(square(side) - 1);
        Self::new_unchecked(side, mines)
    }

    pub const fn easy() -> Self {
        Self::new_unchecked(8, 10)
    }

    pub const fn medium() -> Self {
        Self::new_unchecked(10, 15)
    }

    pub const fn hard() -> Self {
        Self::new_unchecked(12, 25)
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.side)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

/// Fixed mine placement for one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineGrid {
    mask: Array2<bool>,
    count: CellCount,
}

impl MineGrid {
    pub fn from_mask(mask: Array2<bool>) -> Self {
        let (rows, cols) = mask.dim();
        debug_assert_eq!(rows, cols, "mine masks are square");

        let count = mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Self { mask, count }
    }

    pub fn from_positions(side: Coord, positions: &[Pos]) -> Result<Self> {
        let mut mask: Array2<bool> = Array2::default((side as usize, side as usize));

        for &pos in positions {
            if pos.0 >= side || pos.1 >= side {
                return Err(GameError::OutOfRange);
            }
            mask[pos.to_grid_index()] = true;
        }

        Ok(Self::from_mask(mask))
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.side(), self.count)
    }

    pub fn validate(&self, pos: Pos) -> Result<Pos> {
        let side = self.side();
        if pos.0 < side && pos.1 < side {
            Ok(pos)
        } else {
            Err(GameError::OutOfRange)
        }
    }

    pub fn side(&self) -> Coord {
        self.mask.dim().0.try_into().unwrap()
    }

    pub fn total_cells(&self) -> CellCount {
        self.mask.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.count
    }

    pub fn contains_mine(&self, pos: Pos) -> bool {
        self[pos]
    }

    /// Exact number of mines among the in-bounds neighbors of `pos`.
    pub fn adjacent_mines(&self, pos: Pos) -> u8 {
        self.mask
            .iter_neighbors(pos)
            .filter(|&neighbor| self[neighbor])
            .count()
            .try_into()
            .unwrap()
    }
}

impl Index<Pos> for MineGrid {
    type Output = bool;

    fn index(&self, pos: Pos) -> &Self::Output {
        &self.mask[pos.to_grid_index()]
    }
}

/// Outcome of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Toggled,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Toggled)
    }
}

/// Outcome of revealing one or more cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    Exploded,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Merges outcomes when a chord reveals several neighbors.
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (Exploded, _) | (_, Exploded) => Exploded,
            (Won, _) | (_, Won) => Won,
            (Revealed, _) | (_, Revealed) => Revealed,
            (NoChange, NoChange) => NoChange,
        }
    }
}
