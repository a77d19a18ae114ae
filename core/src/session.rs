use hashbrown::HashSet;
use rand::prelude::*;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LossReason {
    MineHit,
    Timeout,
}

/// Valid transitions:
/// - Configuring -> Active
/// - Active -> Won
/// - Active -> Lost
///
/// Anything else only happens through [`GameSession::restart`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Configuring,
    Active,
    Won,
    Lost(LossReason),
}

impl SessionState {
    pub const fn is_configuring(self) -> bool {
        matches!(self, Self::Configuring)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost(_))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Configuring
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// One game from the first click to a win or loss, restartable in place.
///
/// All state changes are reported through [`GameEvent`]s; subscribe with
/// [`GameSession::observer`].
pub struct GameSession<S: Scheduler = ManualScheduler> {
    config: GameConfig,
    mine_pool: Vec<MineAsset>,
    generator: Box<dyn MinefieldGenerator>,
    rng: SmallRng,
    scheduler: S,
    events: EventEmitter<GameEvent>,
    generation: Generation,
    state: SessionState,
    board: Option<Board>,
    pending_flags: HashSet<Coord2>,
    hints_left: u8,
    countdown: Countdown,
    /// Adjustments made at construction, reported by [`GameSession::start`].
    startup_clamps: Vec<ConfigClamp>,
}

impl<S: Scheduler> GameSession<S> {
    pub fn new(config: GameConfig, scheduler: S) -> Self {
        Self::with_seed(config, scheduler, rand::random())
    }

    /// Session whose mine placement and hints are reproducible from `seed`.
    pub fn with_seed(config: GameConfig, scheduler: S, seed: u64) -> Self {
        let (config, startup_clamps) = config.normalized();
        let (events, _) = channel();
        Self {
            mine_pool: Vec::new(),
            generator: Box::new(RandomMinefieldGenerator::new(seed)),
            rng: SmallRng::seed_from_u64(seed.rotate_left(32)),
            scheduler,
            events,
            generation: 0,
            state: SessionState::default(),
            board: None,
            pending_flags: HashSet::new(),
            hints_left: config.hint_budget,
            countdown: Countdown::new(config.timer_limit),
            startup_clamps,
            config,
        }
    }

    pub fn with_generator(mut self, generator: impl MinefieldGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn with_mine_pool(mut self, mine_pool: Vec<MineAsset>) -> Self {
        self.mine_pool = mine_pool;
        self
    }

    pub fn observer(&self) -> EventObserver<GameEvent> {
        self.events.observer()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn hints_left(&self) -> u8 {
        self.hints_left
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    pub fn remaining_time(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn mine_pool(&self) -> &[MineAsset] {
        &self.mine_pool
    }

    /// Mines minus flags, negative when the player placed too many flags.
    pub fn mines_left(&self) -> isize {
        match &self.board {
            Some(board) => board.mines_left(),
            None => (self.config.mine_count as isize) - (self.pending_flags.len() as isize),
        }
    }

    /// Mine counter as shown to the player, never below zero.
    pub fn mines_left_display(&self) -> CellCount {
        CellCount::try_from(self.mines_left().max(0)).unwrap_or(CellCount::MAX)
    }

    pub fn cell_at(&self, coords: Coord2) -> CellState {
        match &self.board {
            Some(board) => board.cell_at(coords),
            None if self.pending_flags.contains(&coords) => CellState::Flagged,
            None => CellState::Hidden,
        }
    }

    /// Opens a cell, placing the mines first when this is the opening move.
    pub fn handle_primary_action(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;

        if self.state.is_finished() || self.cell_at(coords) == CellState::Flagged {
            return Ok(RevealOutcome::NoChange);
        }

        if self.board.is_none() {
            self.start_game(coords)?;
        }

        self.open(coords)
    }

    /// Toggles a flag on a covered cell.
    pub fn handle_secondary_action(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        let coords = self.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(FlagOutcome::NoChange);
        }

        let outcome = if let Some(board) = self.board.as_mut() {
            board.toggle_flag(coords)?
        } else if self.pending_flags.remove(&coords) {
            FlagOutcome::Unflagged
        } else {
            self.pending_flags.insert(coords);
            FlagOutcome::Flagged
        };

        if outcome.has_update() {
            self.events.emit(&GameEvent::CellFlagged {
                coords,
                flagged: outcome == FlagOutcome::Flagged,
            });
            self.emit_mine_counter();
        }
        Ok(outcome)
    }

    /// Opens a random safe covered cell, spending one hint.
    ///
    /// Returns the opened cell, or `None` when no hint could be given.
    pub fn use_hint(&mut self) -> Result<Option<Coord2>> {
        if self.state.is_finished() || self.hints_left == 0 {
            return Ok(None);
        }
        let Some(board) = self.board.as_ref() else {
            log::debug!("Hint requested before the first move");
            return Ok(None);
        };
        let Some(coords) = board.pick_random_safe_hidden_cell(&mut self.rng) else {
            return Ok(None);
        };

        self.hints_left -= 1;
        log::debug!("Hint opens {:?}, {} hints left", coords, self.hints_left);
        self.events.emit(&GameEvent::HintsUpdated(self.hints_left));

        self.open(coords)?;
        Ok(Some(coords))
    }

    /// Handles one scheduler wake-up issued for `generation`.
    pub fn tick(&mut self, generation: Generation) {
        if generation != self.generation {
            log::trace!(
                "Dropping tick for generation {}, current is {}",
                generation,
                self.generation
            );
            return;
        }
        let Countdown::Running { remaining, handle } = self.countdown else {
            log::trace!("Dropping tick, countdown is {:?}", self.countdown);
            return;
        };

        let remaining = remaining.saturating_sub(1);
        self.countdown = Countdown::Running { remaining, handle };
        self.events.emit(&GameEvent::TimerUpdated(Some(remaining)));

        if remaining == 0 {
            log::debug!("Time is up");
            self.end_game(EndReason::Timeout, None, None);
        }
    }

    /// Announces the initial game to subscribed observers, including any
    /// settings adjusted when the session was built.
    ///
    /// Call once after subscribing; later games are announced by [`restart`](Self::restart).
    pub fn start(&mut self) {
        for clamp in self.startup_clamps.drain(..) {
            self.events.emit(&GameEvent::ConfigClamped(clamp));
        }
        self.announce_new_game();
    }

    /// Throws away the current game and waits for a first move under `config`.
    pub fn restart(&mut self, config: GameConfig) {
        self.cancel_timer();
        self.generation += 1;

        let (config, clamps) = config.normalized();
        self.startup_clamps.clear();
        for clamp in clamps {
            self.events.emit(&GameEvent::ConfigClamped(clamp));
        }

        self.state = SessionState::Configuring;
        self.board = None;
        self.pending_flags.clear();
        self.hints_left = config.hint_budget;
        self.countdown = Countdown::new(config.timer_limit);
        self.config = config;
        log::debug!("New game, generation {}: {:?}", self.generation, self.config);
        self.announce_new_game();
    }

    /// Applies new settings, refused while a game is in progress.
    pub fn update_config(&mut self, config: GameConfig) -> Result<()> {
        self.check_not_active()?;
        self.restart(config);
        Ok(())
    }

    /// Replaces the mine asset pool used by the next board.
    pub fn set_mine_pool(&mut self, mine_pool: Vec<MineAsset>) -> Result<()> {
        self.check_not_active()?;
        self.mine_pool = mine_pool;
        Ok(())
    }

    /// Fetches one asset per configured mine; shortfalls degrade to fallback payloads.
    pub fn refresh_assets<P>(&mut self, provider: &mut P) -> Result<AssetReport>
    where
        P: AssetProvider + ?Sized,
    {
        self.check_not_active()?;

        let (pool, report) = resolve_mine_pool(provider, &self.config.asset_request());
        if report.is_degraded() {
            self.events.emit(&GameEvent::AssetsDegraded {
                requested: report.requested,
                received: report.received,
            });
        }
        self.mine_pool = pool;
        Ok(report)
    }

    fn announce_new_game(&self) {
        self.events.emit(&GameEvent::NewGame {
            config: self.config.clone(),
        });
        self.emit_mine_counter();
        self.events.emit(&GameEvent::HintsUpdated(self.hints_left));
        self.events
            .emit(&GameEvent::TimerUpdated(self.countdown.remaining()));
    }

    fn start_game(&mut self, safe: Coord2) -> Result<()> {
        let (mut board, clamp) = Board::initialize(
            safe,
            self.config.board_size,
            self.config.mine_count,
            self.mine_pool.clone(),
            self.generator.as_mut(),
        )?;

        if let Some(MineClamp { requested, actual }) = clamp {
            self.events.emit(&GameEvent::ConfigClamped(ConfigClamp {
                field: ConfigField::MineCount,
                requested: requested.into(),
                clamped: actual.into(),
            }));
        }
        for coords in self.pending_flags.drain() {
            board.toggle_flag(coords)?;
        }

        log::debug!(
            "Game started at {:?} with {} mines",
            safe,
            board.mine_count()
        );
        self.board = Some(board);
        self.state = SessionState::Active;
        self.emit_mine_counter();
        self.start_timer();
        Ok(())
    }

    fn open(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let Some(board) = self.board.as_mut() else {
            return Ok(RevealOutcome::NoChange);
        };

        let mut revealed_any = false;
        let mut mine_hit = None;
        for reveal in board.reveal_from(coords)? {
            revealed_any = true;
            if let CellContent::Mine { payload } = &reveal.content {
                mine_hit = Some((reveal.coords, payload.clone()));
            }
            self.events.emit(&GameEvent::CellRevealed {
                coords: reveal.coords,
                content: reveal.content,
            });
        }
        let solved = board.is_solved();

        if let Some((cell, payload)) = mine_hit {
            self.end_game(EndReason::MineHit, Some(cell), Some(payload));
            Ok(RevealOutcome::HitMine)
        } else if !revealed_any {
            Ok(RevealOutcome::NoChange)
        } else if solved {
            self.end_game(EndReason::Cleared, None, None);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    fn end_game(
        &mut self,
        reason: EndReason,
        triggering_cell: Option<Coord2>,
        triggering_payload: Option<MinePayload>,
    ) {
        if self.state.is_finished() {
            return;
        }

        self.stop_timer();
        self.generation += 1;
        let won = reason == EndReason::Cleared;
        self.state = match reason {
            EndReason::Cleared => SessionState::Won,
            EndReason::MineHit => SessionState::Lost(LossReason::MineHit),
            EndReason::Timeout => SessionState::Lost(LossReason::Timeout),
        };
        log::debug!("Game ended: {:?}", self.state);

        let mines = self
            .board
            .as_mut()
            .map(|board| board.reveal_all_mines(!won))
            .unwrap_or_default();
        self.events.emit(&GameEvent::GameEnded(GameEnd {
            won,
            reason,
            triggering_cell,
            triggering_payload,
            mines,
        }));
    }

    fn start_timer(&mut self) {
        if let Countdown::Idle { limit } = self.countdown {
            let handle = self
                .scheduler
                .schedule_repeating(TICK_INTERVAL, self.generation);
            log::debug!("Countdown of {}s started", limit);
            self.countdown = Countdown::Running {
                remaining: limit,
                handle,
            };
            self.events.emit(&GameEvent::TimerUpdated(Some(limit)));
        }
    }

    fn stop_timer(&mut self) {
        if let Countdown::Running { remaining, handle } = self.countdown {
            self.scheduler.cancel(handle);
            self.countdown = Countdown::Stopped { remaining };
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.countdown.handle() {
            self.scheduler.cancel(handle);
        }
    }

    fn emit_mine_counter(&self) {
        self.events
            .emit(&GameEvent::MineCounterUpdated(self.mines_left_display()));
    }

    fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let side = self.config.board_size;
        if coords.0 < side && coords.1 < side {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    fn check_not_active(&self) -> Result<()> {
        if matches!(self.state, SessionState::Active) {
            Err(GameError::SessionActive)
        } else {
            Ok(())
        }
    }
}
