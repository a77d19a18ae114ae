use super::*;

/// Replays a fixed set of mine coordinates, ignoring the requested count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetMinefieldGenerator {
    mines: Vec<Coord2>,
}

impl PresetMinefieldGenerator {
    pub fn new(mines: impl Into<Vec<Coord2>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }
}

impl MinefieldGenerator for PresetMinefieldGenerator {
    fn generate(&mut self, side: Coord, mines: CellCount, safe: Coord2) -> Result<Minefield> {
        check_start(side, safe)?;

        let layout = MineLayout::from_mine_coords(side, &self.mines)?;
        if layout.mine_count() != mines {
            log::debug!(
                "Preset layout has {} mines, configuration asked for {}",
                layout.mine_count(),
                mines
            );
        }
        if layout.iter_mines().any(|mine| chebyshev_distance(mine, safe) <= 1) {
            log::warn!("Preset layout places mines next to the start cell {:?}", safe);
        }

        Ok(Minefield {
            layout,
            clamp: None,
        })
    }
}
