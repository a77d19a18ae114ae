use std::collections::VecDeque;

use hashbrown::HashSet;
use ndarray::Array2;
use rand::prelude::*;

use crate::*;

/// Outcome of toggling a flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Change in the number of placed flags.
    pub const fn delta(self) -> i8 {
        match self {
            Self::NoChange => 0,
            Self::Flagged => 1,
            Self::Unflagged => -1,
        }
    }
}

/// A single Hidden to Revealed transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellReveal {
    pub coords: Coord2,
    pub content: CellContent,
}

impl CellReveal {
    pub const fn is_mine_hit(&self) -> bool {
        self.content.is_mine()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MineStyle {
    Loss,
    Win,
}

/// A mine as shown once the game is over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MineDisplay {
    pub coords: Coord2,
    pub payload: MinePayload,
    pub style: MineStyle,
    pub triggered: bool,
}

/// Grid of cells with their hidden contents and player-visible state.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    layout: MineLayout,
    contents: Array2<CellContent>,
    cells: Array2<CellState>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    triggered_mine: Option<Coord2>,
    mines_shown: bool,
}

impl Board {
    /// Places mines away from `safe` and hands out payloads from `mine_pool`.
    ///
    /// Returns the clamp applied when `mine_count` did not fit outside the
    /// 3x3 block around `safe`.
    pub fn initialize<G>(
        safe: Coord2,
        side: Coord,
        mine_count: CellCount,
        mut mine_pool: Vec<MineAsset>,
        generator: &mut G,
    ) -> Result<(Self, Option<MineClamp>)>
    where
        G: MinefieldGenerator + ?Sized,
    {
        let Minefield { layout, clamp } = generator.generate(side, mine_count, safe)?;
        generator.arrange_payloads(&mut mine_pool);
        Ok((Self::from_layout(layout, mine_pool), clamp))
    }

    /// Builds a board from a known layout, mines take payloads in row-major order.
    ///
    /// A pool shorter than the mine count is not used at all: every mine gets
    /// the fallback payload so the board never mixes themed and plain mines.
    pub fn from_layout(layout: MineLayout, mine_pool: Vec<MineAsset>) -> Self {
        let side = layout.side();
        let mine_count = usize::from(layout.mine_count());
        let mut pool = if mine_pool.len() >= mine_count {
            mine_pool
        } else {
            if mine_count > 0 {
                log::warn!(
                    "Only {} themed assets for {} mines, using fallback marker for every mine",
                    mine_pool.len(),
                    mine_count
                );
            }
            Vec::new()
        }
        .into_iter();
        let mut contents: Array2<CellContent> = Array2::default((side, side).to_nd_index());

        for ((row, col), content) in contents.indexed_iter_mut() {
            let coords = (row as Coord, col as Coord);
            *content = if layout.contains_mine(coords) {
                let payload = pool.next().map_or(MinePayload::Fallback, MinePayload::from);
                CellContent::Mine { payload }
            } else {
                CellContent::Safe {
                    adjacent: layout.adjacent_mine_count(coords),
                }
            };
        }

        Self {
            layout,
            contents,
            cells: Array2::default((side, side).to_nd_index()),
            revealed_count: 0,
            flagged_count: 0,
            triggered_mine: None,
            mines_shown: false,
        }
    }

    pub fn side(&self) -> Coord {
        self.layout.side()
    }

    pub fn mine_count(&self) -> CellCount {
        self.layout.mine_count()
    }

    pub fn flag_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    /// Mines minus placed flags, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.layout.mine_count() as isize) - (self.flagged_count as isize)
    }

    pub fn cell_at(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn content_at(&self, coords: Coord2) -> &CellContent {
        &self.contents[coords.to_nd_index()]
    }

    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.layout.contains_mine(coords)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn mines_shown(&self) -> bool {
        self.mines_shown
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.layout.validate_coords(coords)
    }

    /// Opens `coords`, flood filling through zero cells as the returned
    /// iterator is consumed.
    ///
    /// Dropping the iterator early still completes the fill.
    pub fn reveal_from(&mut self, coords: Coord2) -> Result<Reveal<'_>> {
        let coords = self.validate_coords(coords)?;
        Ok(Reveal::new(self, coords))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        use CellState::*;

        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];

        Ok(match *cell {
            Hidden => {
                *cell = Flagged;
                self.flagged_count += 1;
                FlagOutcome::Flagged
            }
            Flagged => {
                *cell = Hidden;
                self.flagged_count -= 1;
                FlagOutcome::Unflagged
            }
            Revealed(_) => FlagOutcome::NoChange,
        })
    }

    /// Every mine with its payload, styled for a loss or a win.
    pub fn reveal_all_mines(&mut self, loss_style: bool) -> Vec<MineDisplay> {
        let style = if loss_style {
            MineStyle::Loss
        } else {
            MineStyle::Win
        };
        self.mines_shown = true;

        self.layout
            .iter_mines()
            .filter_map(|coords| {
                let payload = self.contents[coords.to_nd_index()].payload()?.clone();
                Some(MineDisplay {
                    coords,
                    payload,
                    style,
                    triggered: loss_style && self.triggered_mine == Some(coords),
                })
            })
            .collect()
    }

    /// Whether every safe cell is open. Flags play no part.
    pub fn is_solved(&self) -> bool {
        self.revealed_count == self.layout.safe_cell_count()
    }

    pub fn pick_random_safe_hidden_cell<R>(&self, rng: &mut R) -> Option<Coord2>
    where
        R: Rng + ?Sized,
    {
        self.cells
            .indexed_iter()
            .filter(|&(index, &cell)| cell == CellState::Hidden && !self.contents[index].is_mine())
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .choose(rng)
    }
}

/// Lazy breadth-first reveal started by [`Board::reveal_from`].
#[derive(Debug)]
pub struct Reveal<'a> {
    board: &'a mut Board,
    to_visit: VecDeque<Coord2>,
    visited: HashSet<Coord2>,
}

impl<'a> Reveal<'a> {
    fn new(board: &'a mut Board, start: Coord2) -> Self {
        let mut to_visit = VecDeque::new();
        let mut visited = HashSet::new();
        if board.cell_at(start) == CellState::Hidden {
            to_visit.push_back(start);
            visited.insert(start);
        }
        Self {
            board,
            to_visit,
            visited,
        }
    }
}

impl Iterator for Reveal<'_> {
    type Item = CellReveal;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(coords) = self.to_visit.pop_front() {
            let board = &mut *self.board;

            // skip anything flagged or opened since it was queued
            if board.cell_at(coords) != CellState::Hidden {
                log::trace!("Skipping cell at {:?}", coords);
                continue;
            }

            let content = board.contents[coords.to_nd_index()].clone();
            match content {
                CellContent::Mine { .. } => {
                    board.cells[coords.to_nd_index()] = CellState::Revealed(0);
                    board.triggered_mine = Some(coords);
                    log::debug!("Mine hit at {:?}", coords);
                }
                CellContent::Safe { adjacent } => {
                    board.cells[coords.to_nd_index()] = CellState::Revealed(adjacent);
                    board.revealed_count += 1;
                    log::trace!("Opened cell at {:?}, adjacent mines: {}", coords, adjacent);

                    if adjacent == 0 {
                        for pos in board.layout.iter_neighbors(coords) {
                            if board.cell_at(pos) == CellState::Hidden && self.visited.insert(pos) {
                                self.to_visit.push_back(pos);
                            }
                        }
                    }
                }
            }

            return Some(CellReveal { coords, content });
        }
        None
    }
}

impl Drop for Reveal<'_> {
    fn drop(&mut self) {
        while self.next().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(side: Coord, mines: &[Coord2]) -> Board {
        Board::from_layout(MineLayout::from_mine_coords(side, mines).unwrap(), Vec::new())
    }

    fn reveal(board: &mut Board, coords: Coord2) -> Vec<CellReveal> {
        board.reveal_from(coords).unwrap().collect()
    }

    #[test]
    fn initialize_keeps_start_block_clear() {
        for seed in 0..16 {
            let mut generator = RandomMinefieldGenerator::new(seed);
            let pool = crate::asset::sample_assets(40);
            let (board, clamp) =
                Board::initialize((3, 4), 9, 40, pool, &mut generator).unwrap();

            assert_eq!(clamp, None);
            assert_eq!(board.mine_count(), 40);
            for pos in board.layout.iter_neighbors((3, 4)).chain([(3, 4)]) {
                assert!(!board.has_mine_at(pos));
            }
        }
    }

    #[test]
    fn initialize_reports_clamp() {
        let mut generator = RandomMinefieldGenerator::new(3);
        let (board, clamp) = Board::initialize((2, 2), 5, 20, Vec::new(), &mut generator).unwrap();

        assert_eq!(board.mine_count(), 16);
        assert_eq!(
            clamp,
            Some(MineClamp {
                requested: 20,
                actual: 16
            })
        );
    }

    #[test]
    fn initialize_rejects_empty_board() {
        let mut generator = RandomMinefieldGenerator::new(3);
        let result = Board::initialize((0, 0), 0, 1, Vec::new(), &mut generator);
        assert_eq!(result.err(), Some(GameError::InvalidBoardSize));
    }

    #[test]
    fn short_pool_degrades_every_mine_to_fallback() {
        let board = Board::from_layout(
            MineLayout::from_mine_coords(5, &[(0, 0), (0, 3), (3, 3)]).unwrap(),
            crate::asset::sample_assets(1),
        );

        for mine in board.layout.iter_mines() {
            assert_eq!(board.content_at(mine).payload(), Some(&MinePayload::Fallback));
        }
    }

    #[test]
    fn full_pool_gives_every_mine_a_themed_payload() {
        let board = Board::from_layout(
            MineLayout::from_mine_coords(4, &[(0, 0), (0, 3), (3, 3)]).unwrap(),
            crate::asset::sample_assets(4),
        );

        assert_eq!(
            board.content_at((0, 0)).payload().map(MinePayload::display_name),
            Some("Critter #1")
        );
        assert_eq!(
            board.content_at((3, 3)).payload().map(MinePayload::display_name),
            Some("Critter #3")
        );
        assert!(
            board
                .layout
                .iter_mines()
                .all(|mine| !board.content_at(mine).payload().unwrap().is_fallback())
        );
    }

    #[test]
    fn safe_cells_store_neighbor_mine_count() {
        let mines = [(0, 0), (1, 2), (3, 1), (3, 3)];
        let board = board(4, &mines);

        for row in 0..4 {
            for col in 0..4 {
                let expected = NeighborIter::new((row, col), (4, 4))
                    .filter(|pos| mines.contains(pos))
                    .count() as u8;
                match board.content_at((row, col)) {
                    CellContent::Safe { adjacent } => assert_eq!(*adjacent, expected),
                    CellContent::Mine { .. } => assert!(mines.contains(&(row, col))),
                }
            }
        }
    }

    #[test]
    fn reveal_mine_yields_single_trigger() {
        let mut board = board(3, &[(1, 1)]);

        let reveals = reveal(&mut board, (1, 1));

        assert_eq!(reveals.len(), 1);
        assert!(reveals[0].is_mine_hit());
        assert_eq!(board.triggered_mine(), Some((1, 1)));
        assert_eq!(board.revealed_count(), 0);
    }

    #[test]
    fn reveal_numbered_cell_opens_only_itself() {
        let mut board = board(3, &[(0, 0)]);

        let reveals = reveal(&mut board, (1, 1));

        assert_eq!(
            reveals,
            vec![CellReveal {
                coords: (1, 1),
                content: CellContent::Safe { adjacent: 1 }
            }]
        );
    }

    #[test]
    fn flood_fill_stops_at_numbers() {
        let mut board = board(5, &[(4, 4)]);

        let reveals = reveal(&mut board, (0, 0));

        assert_eq!(reveals.len(), 24);
        assert_eq!(board.cell_at((3, 3)), CellState::Revealed(1));
        assert_eq!(board.cell_at((4, 4)), CellState::Hidden);
        assert!(board.is_solved());
    }

    #[test]
    fn second_reveal_of_region_is_empty() {
        let mut board = board(5, &[(4, 4), (4, 0)]);

        assert!(!reveal(&mut board, (0, 0)).is_empty());
        assert!(reveal(&mut board, (0, 0)).is_empty());
        assert!(reveal(&mut board, (1, 2)).is_empty());
        assert!(reveal(&mut board, (3, 3)).is_empty());
    }

    #[test]
    fn flood_fill_skips_flags() {
        let mut board = board(5, &[(4, 4)]);
        board.toggle_flag((0, 4)).unwrap();

        let reveals = reveal(&mut board, (0, 0));

        assert_eq!(reveals.len(), 23);
        assert_eq!(board.cell_at((0, 4)), CellState::Flagged);
        assert!(!board.is_solved());
        assert!(reveal(&mut board, (0, 4)).is_empty());
    }

    #[test]
    fn dropped_reveal_still_completes_fill() {
        let mut board = board(5, &[(4, 4)]);

        let first = board.reveal_from((0, 0)).unwrap().next();

        assert_eq!(first.map(|reveal| reveal.coords), Some((0, 0)));
        assert_eq!(board.revealed_count(), 24);
    }

    #[test]
    fn toggle_flag_flips_and_ignores_revealed() {
        let mut board = board(3, &[(0, 0)]);

        assert_eq!(board.toggle_flag((2, 2)).unwrap(), FlagOutcome::Flagged);
        assert_eq!(board.flag_count(), 1);
        assert_eq!(board.toggle_flag((2, 2)).unwrap(), FlagOutcome::Unflagged);
        assert_eq!(board.flag_count(), 0);

        reveal(&mut board, (1, 1));
        assert_eq!(board.toggle_flag((1, 1)).unwrap(), FlagOutcome::NoChange);
        assert_eq!(FlagOutcome::NoChange.delta(), 0);
    }

    #[test]
    fn mines_left_goes_negative_when_over_flagged() {
        let mut board = board(3, &[(0, 0)]);
        board.toggle_flag((2, 2)).unwrap();
        board.toggle_flag((2, 1)).unwrap();

        assert_eq!(board.mines_left(), -1);
    }

    #[test]
    fn solved_ignores_flags() {
        let mut board = board(3, &[(1, 1)]);
        for pos in [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)] {
            reveal(&mut board, pos);
        }
        assert!(!board.is_solved());

        board.toggle_flag((2, 2)).unwrap();
        assert!(!board.is_solved());

        board.toggle_flag((2, 2)).unwrap();
        reveal(&mut board, (2, 2));
        assert!(board.is_solved());
        assert_eq!(board.cell_at((1, 1)), CellState::Hidden);
    }

    #[test]
    fn reveal_all_mines_marks_trigger_on_loss() {
        let mut board = board(4, &[(0, 0), (3, 3)]);
        reveal(&mut board, (3, 3));

        let shown = board.reveal_all_mines(true);

        assert!(board.mines_shown());
        assert_eq!(shown.len(), 2);
        assert!(shown.iter().all(|mine| mine.style == MineStyle::Loss));
        assert_eq!(
            shown.iter().filter(|mine| mine.triggered).map(|mine| mine.coords).collect::<Vec<_>>(),
            vec![(3, 3)]
        );
    }

    #[test]
    fn reveal_all_mines_win_style_has_no_trigger() {
        let mut board = board(3, &[(2, 2)]);
        reveal(&mut board, (0, 0));

        let shown = board.reveal_all_mines(false);

        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].style, MineStyle::Win);
        assert!(!shown[0].triggered);
    }

    #[test]
    fn random_safe_hidden_cell_avoids_mines_flags_and_open_cells() {
        let mut board = board(3, &[(0, 0)]);
        board.toggle_flag((2, 2)).unwrap();
        reveal(&mut board, (1, 1));
        let mut rng = SmallRng::seed_from_u64(9);

        for _ in 0..50 {
            let pick = board.pick_random_safe_hidden_cell(&mut rng).unwrap();
            assert!(![(0, 0), (2, 2), (1, 1)].contains(&pick));
        }
    }

    #[test]
    fn random_safe_hidden_cell_none_when_exhausted() {
        let mut board = board(3, &[(2, 2)]);
        reveal(&mut board, (0, 0));
        let mut rng = SmallRng::seed_from_u64(9);

        assert_eq!(board.pick_random_safe_hidden_cell(&mut rng), None);
    }
}
