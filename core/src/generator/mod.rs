use crate::*;

pub use safe_zone::*;

mod safe_zone;

/// Strategy for placing mines once the first reveal is known.
pub trait MinePlacer {
    fn place(self, config: GameConfig) -> MineGrid;
}

/// How much protection the first revealed cell gets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FirstReveal {
    /// Mines may land anywhere, including the first cell.
    Anywhere,
    /// The first cell itself is kept mine-free.
    SafeCell,
    /// The first cell and all its in-bounds neighbors are kept mine-free,
    /// so the first reveal always lands on a zero-count cell.
    SafeZone,
}
