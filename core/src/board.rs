use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::BitOr;

use crate::*;

/// Lifecycle of a single game.
///
/// ```text
/// NotStarted --reveal--> InProgress --reveal(mine)--> Lost
///                        InProgress --reveal(last safe cell)--> Won
/// ```
///
/// `Won` and `Lost` are terminal: every mutating call is rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GamePhase {
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// A single minesweeper game from creation to win or loss.
///
/// Mines are not placed at creation time: the first [`Board::reveal`] fixes
/// the layout, keeping the revealed cell and its neighborhood mine-free, so
/// the opening move always lands on a zero-count cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    seed: u64,
    mines: Option<MineGrid>,
    grid: Array2<Cell>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    phase: GamePhase,
    exploded: Option<Pos>,
}

impl Board {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let side = config.side as usize;
        Self {
            config,
            seed,
            mines: None,
            grid: Array2::default((side, side)),
            revealed_count: 0,
            flagged_count: 0,
            phase: Default::default(),
            exploded: None,
        }
    }

    /// Builds a board over a fixed, already-known mine layout.
    pub fn with_mine_grid(mines: MineGrid) -> Self {
        let mut board = Self::new(mines.game_config(), 0);
        board.mines = Some(mines);
        board
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn side(&self) -> Coord {
        self.config.side
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    pub fn total_mines(&self) -> CellCount {
        self.mines
            .as_ref()
            .map_or(self.config.mines, MineGrid::mine_count)
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    /// How many mines have not been flagged yet; negative when overflagged.
    pub fn mines_left(&self) -> isize {
        (self.total_mines() as isize) - (self.flagged_count as isize)
    }

    pub fn cell(&self, pos: Pos) -> Cell {
        self.grid[pos.to_grid_index()]
    }

    /// The mine that ended the game, if it ended in a loss.
    pub fn exploded(&self) -> Option<Pos> {
        self.exploded
    }

    /// Whether `pos` holds a mine. Always false before the first reveal.
    pub fn mine_at(&self, pos: Pos) -> bool {
        self.mines
            .as_ref()
            .is_some_and(|mines| mines.contains_mine(pos))
    }

    /// Reveals the cell at `pos`.
    ///
    /// The first reveal of a game places the mines. Revealing a flagged or
    /// already revealed cell changes nothing; revealing a zero-count cell
    /// floods its whole zero region plus the numbered border.
    pub fn reveal(&mut self, pos: Pos) -> Result<RevealOutcome> {
        let pos = self.validate(pos)?;
        self.check_not_finished()?;

        if !matches!(self.cell(pos), Cell::Hidden) {
            return Ok(RevealOutcome::NoChange);
        }

        if self.mines.is_none() {
            self.place_mines(pos);
        }

        Ok(self.reveal_cell(pos))
    }

    /// Reveals every unflagged neighbor of a revealed numbered cell whose
    /// flagged-neighbor count matches its number; any other cell is a no-op.
    ///
    /// Neighbor reveals reuse the plain reveal semantics, including chained
    /// floods and loss detection.
    pub fn chord(&mut self, pos: Pos) -> Result<RevealOutcome> {
        let pos = self.validate(pos)?;
        self.check_not_finished()?;

        Ok(match self.cell(pos) {
            Cell::Revealed(count) if count > 0 && count == self.count_flagged_neighbors(pos) => {
                neighbors(self.side(), pos)
                    .map(|neighbor| self.reveal_cell(neighbor))
                    .reduce(BitOr::bitor)
                    .unwrap_or(RevealOutcome::NoChange)
            }
            _ => RevealOutcome::NoChange,
        })
    }

    /// Whether [`Board::chord`] at `pos` would reveal anything right now.
    pub fn can_chord(&self, pos: Pos) -> bool {
        if self.validate(pos).is_err() || self.phase.is_finished() {
            return false;
        }

        match self.cell(pos) {
            Cell::Revealed(count) => {
                count > 0
                    && count == self.count_flagged_neighbors(pos)
                    && neighbors(self.side(), pos)
                        .any(|neighbor| matches!(self.cell(neighbor), Cell::Hidden))
            }
            _ => false,
        }
    }

    /// Flips the flag on an unrevealed cell.
    ///
    /// Flags are only accepted while a game is in progress: not before the
    /// first reveal and not after the game ends.
    pub fn toggle_flag(&mut self, pos: Pos) -> Result<FlagOutcome> {
        let pos = self.validate(pos)?;
        match self.phase {
            GamePhase::NotStarted => return Err(GameError::NotStarted),
            GamePhase::Won | GamePhase::Lost => return Err(GameError::AlreadyEnded),
            GamePhase::InProgress => {}
        }

        Ok(match self.cell(pos) {
            Cell::Hidden => {
                self.grid[pos.to_grid_index()] = Cell::Flagged;
                self.flagged_count += 1;
                FlagOutcome::Toggled
            }
            Cell::Flagged => {
                self.grid[pos.to_grid_index()] = Cell::Hidden;
                self.flagged_count -= 1;
                FlagOutcome::Toggled
            }
            Cell::Revealed(_) => FlagOutcome::NoChange,
        })
    }

    /// Render-facing view of a single cell.
    pub fn cell_view(&self, pos: Pos) -> CellView {
        match self.cell(pos) {
            Cell::Hidden => CellView::Hidden,
            Cell::Flagged => CellView::Flagged,
            Cell::Revealed(_) if self.mine_at(pos) => CellView::Mine,
            Cell::Revealed(0) => CellView::Empty,
            Cell::Revealed(count) => CellView::Number(count),
        }
    }

    /// Full serializable snapshot for the presentation layer.
    pub fn snapshot(&self) -> Array2<CellView> {
        let side = self.side() as usize;
        Array2::from_shape_fn((side, side), |(row, col)| {
            self.cell_view((row as Coord, col as Coord))
        })
    }

    fn validate(&self, pos: Pos) -> Result<Pos> {
        let side = self.config.side;
        if pos.0 < side && pos.1 < side {
            Ok(pos)
        } else {
            Err(GameError::OutOfRange)
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.phase.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }

    fn mine_grid(&self) -> &MineGrid {
        self.mines
            .as_ref()
            .expect("mines are placed before any cell is revealed")
    }

    fn place_mines(&mut self, first: Pos) {
        let placer = SafeZonePlacer::new(self.seed, first, FirstReveal::SafeZone);
        let mines = placer.place(self.config);
        log::debug!(
            "placed {} mines after first reveal at {:?}",
            mines.mine_count(),
            first
        );
        self.mines = Some(mines);
    }

    fn reveal_cell(&mut self, pos: Pos) -> RevealOutcome {
        // chords keep iterating after a neighbor ends the game
        if self.phase.is_finished() {
            return RevealOutcome::NoChange;
        }

        match (self.cell(pos), self.mine_grid().contains_mine(pos)) {
            (Cell::Hidden, true) => {
                self.exploded = Some(pos);
                self.end_game(false);
                RevealOutcome::Exploded
            }
            (Cell::Hidden, false) => {
                let count = self.mine_grid().adjacent_mines(pos);
                self.grid[pos.to_grid_index()] = Cell::Revealed(count);
                self.revealed_count += 1;
                log::debug!("revealed {:?}, adjacent mines: {}", pos, count);

                if count == 0 {
                    self.flood_reveal(pos);
                }

                if self.revealed_count == self.mine_grid().safe_cell_count() {
                    self.end_game(true);
                    RevealOutcome::Won
                } else {
                    self.mark_started();
                    RevealOutcome::Revealed
                }
            }
            _ => RevealOutcome::NoChange,
        }
    }

    /// Iterative worklist expansion from a zero-count cell: reveals every
    /// reachable unflagged cell, continuing through zero cells and stopping
    /// at (but still revealing) the numbered border.
    fn flood_reveal(&mut self, start: Pos) {
        let side = self.side();
        let mut visited: HashSet<Pos> = [start].into_iter().collect();
        let mut to_visit: VecDeque<Pos> = neighbors(side, start)
            .filter(|&pos| matches!(self.cell(pos), Cell::Hidden))
            .collect();
        log::trace!("flood reveal from {:?}, frontier: {:?}", start, to_visit);

        while let Some(pos) = to_visit.pop_front() {
            if !visited.insert(pos) {
                continue;
            }

            // flagged cells stay closed, revealed cells are already done
            if !matches!(self.cell(pos), Cell::Hidden) {
                continue;
            }

            // never reveal a mine during expansion
            if self.mine_grid().contains_mine(pos) {
                continue;
            }

            let count = self.mine_grid().adjacent_mines(pos);
            self.grid[pos.to_grid_index()] = Cell::Revealed(count);
            self.revealed_count += 1;
            log::trace!("flood revealed {:?}, adjacent mines: {}", pos, count);

            if count == 0 {
                to_visit.extend(
                    neighbors(side, pos)
                        .filter(|&next| matches!(self.cell(next), Cell::Hidden))
                        .filter(|next| !visited.contains(next)),
                );
            }
        }
    }

    fn count_flagged_neighbors(&self, pos: Pos) -> u8 {
        self.grid
            .iter_neighbors(pos)
            .filter(|&neighbor| matches!(self.cell(neighbor), Cell::Flagged))
            .count()
            .try_into()
            .unwrap()
    }

    fn mark_started(&mut self) {
        if self.phase.is_initial() {
            log::debug!("game started");
            self.phase = GamePhase::InProgress;
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.phase.is_finished() {
            return;
        }

        self.phase = if won { GamePhase::Won } else { GamePhase::Lost };
        log::debug!("game ended, phase: {:?}", self.phase);

        if won {
            self.exploded = None;
            self.flag_remaining_mines();
        } else {
            self.reveal_all_mines();
        }
    }

    /// Loss display: every mine becomes visible, replacing any flag on it.
    /// Flags on non-mine cells are left untouched.
    fn reveal_all_mines(&mut self) {
        let side = self.side();
        for row in 0..side {
            for col in 0..side {
                let pos = (row, col);
                if !self.mine_grid().contains_mine(pos) {
                    continue;
                }

                if matches!(self.cell(pos), Cell::Flagged) {
                    self.flagged_count -= 1;
                }
                if self.cell(pos).is_unrevealed() {
                    let count = self.mine_grid().adjacent_mines(pos);
                    self.grid[pos.to_grid_index()] = Cell::Revealed(count);
                }
            }
        }
    }

    /// Win cosmetics: every mine that survived unrevealed gets a flag.
    fn flag_remaining_mines(&mut self) {
        let side = self.side();
        for row in 0..side {
            for col in 0..side {
                let pos = (row, col);
                if self.mine_grid().contains_mine(pos) && matches!(self.cell(pos), Cell::Hidden) {
                    self.grid[pos.to_grid_index()] = Cell::Flagged;
                    self.flagged_count += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine_grid(side: Coord, mines: &[Pos]) -> MineGrid {
        MineGrid::from_positions(side, mines).unwrap()
    }

    fn board(side: Coord, mines: &[Pos]) -> Board {
        Board::with_mine_grid(mine_grid(side, mines))
    }

    #[test]
    fn reveal_mine_loses_and_reveals_every_mine() {
        let mut board = board(3, &[(0, 0), (2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Exploded);
        assert_eq!(board.phase(), GamePhase::Lost);
        assert_eq!(board.exploded(), Some((0, 0)));
        assert!(matches!(board.cell((2, 2)), Cell::Revealed(_)));
        assert_eq!(board.cell_view((0, 0)), CellView::Mine);
        assert_eq!(board.cell_view((2, 2)), CellView::Mine);
    }

    #[test]
    fn flood_reveal_opens_zero_region_and_numbered_border() {
        // mines form a wall down column 2; the right half must stay hidden
        let mines: Vec<Pos> = (0..5).map(|row| (row, 2)).collect();
        let mut board = board(5, &mines);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(board.phase(), GamePhase::InProgress);
        for row in 0..5 {
            assert_eq!(board.cell((row, 0)), Cell::Revealed(0));
            assert!(matches!(board.cell((row, 1)), Cell::Revealed(n) if n > 0));
            assert_eq!(board.cell((row, 3)), Cell::Hidden);
            assert_eq!(board.cell((row, 4)), Cell::Hidden);
        }
        assert_eq!(board.revealed_count(), 10);
    }

    #[test]
    fn flood_reveal_is_idempotent() {
        let mines: Vec<Pos> = (0..5).map(|row| (row, 2)).collect();
        let mut board = board(5, &mines);

        board.reveal((0, 0)).unwrap();
        let again = board.reveal((0, 0)).unwrap();

        assert_eq!(again, RevealOutcome::NoChange);
        assert_eq!(board.revealed_count(), 10);
    }

    #[test]
    fn win_declared_when_all_safe_cells_revealed() {
        let mut board = board(2, &[(0, 0)]);

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::Won);

        assert_eq!(board.phase(), GamePhase::Won);
        assert_eq!(board.revealed_count(), 3);
    }

    #[test]
    fn win_auto_flags_remaining_mines() {
        let mut board = board(2, &[(0, 0)]);

        board.reveal((0, 1)).unwrap();
        board.reveal((1, 0)).unwrap();
        board.reveal((1, 1)).unwrap();

        assert_eq!(board.cell((0, 0)), Cell::Flagged);
        assert_eq!(board.flagged_count(), 1);
        assert_eq!(board.mines_left(), 0);
        assert_eq!(board.exploded(), None);
    }

    #[test]
    fn chord_reveals_unflagged_neighbors() {
        let mut board = board(3, &[(0, 1), (2, 1)]);

        board.reveal((1, 1)).unwrap();
        board.toggle_flag((0, 1)).unwrap();
        board.toggle_flag((2, 1)).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.cell((1, 0)), Cell::Revealed(2));
        assert_eq!(board.cell((1, 2)), Cell::Revealed(2));
        assert_eq!(board.cell((0, 1)), Cell::Flagged);
    }

    #[test]
    fn chord_needs_matching_flag_count() {
        let mut board = board(3, &[(0, 1), (2, 1)]);

        board.reveal((1, 1)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        assert!(!board.can_chord((1, 1)));
        assert_eq!(board.chord((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.cell((1, 0)), Cell::Hidden);
    }

    #[test]
    fn chord_on_hidden_cell_is_noop() {
        let mut board = board(3, &[(0, 1)]);

        board.reveal((2, 2)).unwrap();

        assert_eq!(board.chord((0, 0)).unwrap(), RevealOutcome::NoChange);
    }

    #[test]
    fn chord_through_wrong_flag_explodes() {
        let mut board = board(3, &[(0, 1)]);

        board.reveal((1, 1)).unwrap();
        board.toggle_flag((0, 0)).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::Exploded);
        assert_eq!(board.phase(), GamePhase::Lost);
        // the wrong flag sits on a safe cell and stays put
        assert_eq!(board.cell((0, 0)), Cell::Flagged);
        assert_eq!(board.cell_view((0, 1)), CellView::Mine);
    }

    #[test]
    fn flags_require_a_running_game() {
        let mut board = board(2, &[(0, 0)]);

        assert_eq!(board.toggle_flag((1, 1)), Err(GameError::NotStarted));

        board.reveal((1, 1)).unwrap();
        assert_eq!(board.toggle_flag((0, 1)).unwrap(), FlagOutcome::Toggled);
        assert_eq!(board.toggle_flag((0, 1)).unwrap(), FlagOutcome::Toggled);
        assert_eq!(board.cell((0, 1)), Cell::Hidden);
        assert_eq!(board.flagged_count(), 0);

        board.reveal((0, 0)).unwrap();
        assert_eq!(board.toggle_flag((0, 1)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn flag_on_revealed_cell_is_noop() {
        let mut board = board(3, &[(0, 1)]);

        board.reveal((1, 1)).unwrap();

        assert_eq!(board.toggle_flag((1, 1)).unwrap(), FlagOutcome::NoChange);
        assert_eq!(board.flagged_count(), 0);
    }

    #[test]
    fn reveal_on_flagged_cell_is_noop() {
        let mut board = board(3, &[(0, 1)]);

        board.reveal((2, 2)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.cell((0, 1)), Cell::Flagged);
        assert_eq!(board.phase(), GamePhase::InProgress);
    }

    #[test]
    fn terminal_board_rejects_moves() {
        let mut board = board(2, &[(0, 0)]);

        board.reveal((0, 0)).unwrap();
        assert_eq!(board.phase(), GamePhase::Lost);

        assert_eq!(board.reveal((1, 1)), Err(GameError::AlreadyEnded));
        assert_eq!(board.chord((1, 1)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let mut board = board(3, &[(0, 1)]);

        assert_eq!(board.reveal((3, 0)), Err(GameError::OutOfRange));
        assert_eq!(board.toggle_flag((0, 3)), Err(GameError::OutOfRange));
        assert_eq!(board.chord((9, 9)), Err(GameError::OutOfRange));
        assert!(!board.can_chord((9, 9)));
    }

    #[test]
    fn first_reveal_places_mines_outside_safe_zone() {
        let mut board = Board::new(GameConfig::new(8, 10), 42);
        assert_eq!(board.total_mines(), 10);
        assert!(!board.mine_at((3, 3)));

        board.reveal((3, 3)).unwrap();

        assert_ne!(board.phase(), GamePhase::Lost);
        assert_eq!(board.cell((3, 3)), Cell::Revealed(0));
        for index in [18, 19, 20, 26, 27, 28, 34, 35, 36] {
            assert!(!board.mine_at(index_to_pos(8, index)), "mine at {index}");
        }

        let mut mines = 0;
        for row in 0..8 {
            for col in 0..8 {
                if board.mine_at((row, col)) {
                    mines += 1;
                }
            }
        }
        assert_eq!(mines, 10);
    }

    #[test]
    fn same_seed_plays_the_same_game() {
        let config = GameConfig::medium();
        let mut a = Board::new(config, 1234);
        let mut b = Board::new(config, 1234);

        assert_eq!(a.reveal((5, 5)).unwrap(), b.reveal((5, 5)).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut board = board(2, &[(0, 0)]);

        board.reveal((1, 1)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        let snapshot = board.snapshot();
        assert_eq!(snapshot[[1, 1]], CellView::Number(1));
        assert_eq!(snapshot[[0, 1]], CellView::Flagged);
        assert_eq!(snapshot[[0, 0]], CellView::Hidden);

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: Array2<CellView> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn mines_left_goes_negative_when_overflagged() {
        let mut board = board(3, &[(0, 0), (0, 2)]);

        board.reveal((2, 2)).unwrap();
        assert_eq!(board.phase(), GamePhase::InProgress);

        board.toggle_flag((0, 0)).unwrap();
        board.toggle_flag((0, 1)).unwrap();
        board.toggle_flag((0, 2)).unwrap();

        assert_eq!(board.mines_left(), -1);
    }
}
