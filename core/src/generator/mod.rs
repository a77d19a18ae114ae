use crate::*;
pub use preset::*;
pub use random::*;

mod preset;
mod random;

/// Places mines on a fresh board once the first cell to open is known.
pub trait MinefieldGenerator {
    fn generate(&mut self, side: Coord, mines: CellCount, safe: Coord2) -> Result<Minefield>;

    /// Orders the asset pool before payloads are handed out to mines.
    fn arrange_payloads(&mut self, _pool: &mut [MineAsset]) {}
}

/// Requested mine count lowered to what the board can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MineClamp {
    pub requested: CellCount,
    pub actual: CellCount,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Minefield {
    pub layout: MineLayout,
    pub clamp: Option<MineClamp>,
}

/// Every cell outside the 3x3 block centered on `safe`, in row-major order.
pub fn mine_candidates(side: Coord, safe: Coord2) -> Vec<Coord2> {
    (0..side)
        .flat_map(|row| (0..side).map(move |col| (row, col)))
        .filter(|&coords| chebyshev_distance(coords, safe) > 1)
        .collect()
}

fn check_start(side: Coord, safe: Coord2) -> Result<()> {
    if side == 0 {
        return Err(GameError::InvalidBoardSize);
    }
    if safe.0 >= side || safe.1 >= side {
        return Err(GameError::InvalidCoords);
    }
    Ok(())
}
