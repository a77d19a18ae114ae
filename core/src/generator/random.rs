use rand::prelude::*;

use super::*;

/// Uniform placement outside the 3x3 block around the first opened cell.
#[derive(Clone, Debug)]
pub struct RandomMinefieldGenerator {
    rng: SmallRng,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(&mut self, side: Coord, mines: CellCount, safe: Coord2) -> Result<Minefield> {
        check_start(side, safe)?;

        let candidates = mine_candidates(side, safe);
        let available = CellCount::try_from(candidates.len()).unwrap_or(CellCount::MAX);
        let clamp = (mines > available).then(|| {
            log::warn!(
                "Board only fits {} mines outside the start area, requested {}",
                available,
                mines
            );
            MineClamp {
                requested: mines,
                actual: available,
            }
        });
        let count = mines.min(available);

        let mine_coords: Vec<Coord2> = candidates
            .choose_multiple(&mut self.rng, count.into())
            .copied()
            .collect();
        let layout = MineLayout::from_mine_coords(side, &mine_coords)?;

        // double check mine count
        if layout.mine_count() != count {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                count
            );
        }
        log::debug!(
            "Placed {} mines on a {}x{} board, safe start at {:?}",
            layout.mine_count(),
            side,
            side,
            safe
        );

        Ok(Minefield { layout, clamp })
    }

    fn arrange_payloads(&mut self, pool: &mut [MineAsset]) {
        pool.shuffle(&mut self.rng);
    }
}
