use ndarray::Array2;

/// Row or column coordinate on the board.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Board position as `(row, col)`.
pub type Pos = (Coord, Coord);

pub trait ToGridIndex {
    type Output;
    fn to_grid_index(self) -> Self::Output;
}

impl ToGridIndex for Pos {
    type Output = [usize; 2];

    fn to_grid_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

/// Cell count of a `side`×`side` board.
pub const fn square(side: Coord) -> CellCount {
    (side as CellCount).saturating_mul(side as CellCount)
}

/// Flat row-major index of `pos` on a `side`-wide board.
pub const fn pos_to_index(side: Coord, (row, col): Pos) -> CellCount {
    row as CellCount * side as CellCount + col as CellCount
}

/// Inverse of [`pos_to_index`].
pub const fn index_to_pos(side: Coord, index: CellCount) -> Pos {
    (
        (index / side as CellCount) as Coord,
        (index % side as CellCount) as Coord,
    )
}

// Row-major scan order, so neighbor iteration is stable across calls.
const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `pos`, returning a value only when it remains in bounds.
fn apply_delta((row, col): Pos, (dr, dc): (i8, i8), side: Coord) -> Option<Pos> {
    let next_row = row.checked_add_signed(dr)?;
    if next_row >= side {
        return None;
    }

    let next_col = col.checked_add_signed(dc)?;
    if next_col >= side {
        return None;
    }

    Some((next_row, next_col))
}

/// Up-to-8 in-bounds grid neighbors of `pos` on a `side`×`side` board.
///
/// No wraparound on either axis; iteration order is fixed.
pub fn neighbors(side: Coord, pos: Pos) -> Neighbors {
    Neighbors::new(pos, side)
}

/// Flat-index variant of [`neighbors`].
pub fn adjacent_indices(side: Coord, index: CellCount) -> impl Iterator<Item = CellCount> {
    neighbors(side, index_to_pos(side, index)).map(move |pos| pos_to_index(side, pos))
}

#[derive(Debug)]
pub struct Neighbors {
    center: Pos,
    side: Coord,
    cursor: u8,
}

impl Neighbors {
    fn new(center: Pos, side: Coord) -> Self {
        Self {
            center,
            side,
            cursor: 0,
        }
    }
}

impl Iterator for Neighbors {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        while usize::from(self.cursor) < DISPLACEMENTS.len() {
            let delta = DISPLACEMENTS[usize::from(self.cursor)];
            self.cursor += 1;

            if let Some(pos) = apply_delta(self.center, delta, self.side) {
                return Some(pos);
            }
        }
        None
    }
}

pub trait GridNeighbors {
    /// Neighbors of `pos` within this grid's bounds. Grids are square.
    fn iter_neighbors(&self, pos: Pos) -> Neighbors;
}

impl<T> GridNeighbors for Array2<T> {
    fn iter_neighbors(&self, pos: Pos) -> Neighbors {
        let side = self.dim().0.try_into().unwrap();
        neighbors(side, pos)
    }
}
