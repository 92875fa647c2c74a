use serde::{Deserialize, Serialize};

/// Player-visible state tracked by the engine for each cell.
///
/// A cell is a single variant at a time, so a flag can never coexist with a
/// reveal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    Flagged,
    Revealed(u8),
}

impl Cell {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Render-facing view of a single cell, as exposed by `Board::snapshot`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Empty,
    Number(u8),
    Mine,
}
