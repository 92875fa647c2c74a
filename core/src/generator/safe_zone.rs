use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::index;
use smallvec::SmallVec;

use super::*;

/// Places mines uniformly at random outside the requested safe area.
///
/// Candidate cells are enumerated explicitly and sampled without replacement,
/// so generation terminates even when the safe area leaves few cells free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafeZonePlacer {
    seed: u64,
    first: Pos,
    policy: FirstReveal,
}

impl SafeZonePlacer {
    pub fn new(seed: u64, first: Pos, policy: FirstReveal) -> Self {
        Self {
            seed,
            first,
            policy,
        }
    }
}

impl MinePlacer for SafeZonePlacer {
    fn place(self, config: GameConfig) -> MineGrid {
        use FirstReveal::*;

        let side = config.side;
        let total = u32::from(config.total_cells());
        let requested = u32::from(config.mines);

        // first cell plus its in-bounds neighbors, at most 9 cells
        let zone: SmallVec<[Pos; 9]> = core::iter::once(self.first)
            .chain(neighbors(side, self.first))
            .collect();

        let policy = match self.policy {
            Anywhere => Anywhere,
            SafeCell | SafeZone if requested + 1 > total => {
                log::warn!("cannot keep the first cell safe, placing mines anywhere");
                Anywhere
            }
            SafeCell => SafeCell,
            SafeZone if requested + zone.len() as u32 > total => {
                log::warn!("cannot keep the first cell's neighborhood mine-free, keeping only the cell itself safe");
                SafeCell
            }
            SafeZone => SafeZone,
        };

        let excluded: &[Pos] = match policy {
            Anywhere => &zone[..0],
            SafeCell => &zone[..1],
            SafeZone => &zone[..],
        };

        let candidates: Vec<Pos> = (0..side)
            .flat_map(|row| (0..side).map(move |col| (row, col)))
            .filter(|pos| !excluded.contains(pos))
            .collect();

        let placed = usize::from(config.mines).min(candidates.len());
        if placed < usize::from(config.mines) {
            log::warn!(
                "only {} cells available for {} mines, placing {}",
                candidates.len(),
                config.mines,
                placed
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mask: Array2<bool> = Array2::default((side as usize, side as usize));
        for pick in index::sample(&mut rng, candidates.len(), placed) {
            mask[candidates[pick].to_grid_index()] = true;
        }

        MineGrid::from_mask(mask)
    }
}
