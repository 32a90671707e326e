//! Core game state and logic
//!
//! The game never schedules itself. An external clock calls
//! [`Game::run_tick`] with a monotonically increasing timestamp and the
//! input intents gathered since the previous tick.

use crate::bag::Bag;
use crate::field::Field;
use crate::input::{Action, Direction, Intents};
use crate::piece::{Piece, RotationDirection};
use crate::score::{Level, Score};
use crate::settings::GameplaySettings;
use crate::sound::{Silent, Sound, SoundPlayer};
use crate::storage::Storage;
use std::io;
use tracing::{debug, info};

/// Milliseconds from a monotonic clock
pub type Timestamp = u64;

/// Rows that make a clear count as a tetris
pub const TETRIS_ROWS: usize = 4;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for a level to be selected
    Menu,
    Playing,
    Paused,
    /// Full rows are on screen and about to collapse
    RowClearing,
    GameOver,
}

/// Read-only view of everything a renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub field: &'a Field,
    pub current: Option<&'a Piece>,
    pub next: Option<&'a Piece>,
    /// Row the current piece would land on
    pub landing_row: Option<i32>,
    pub score: u64,
    pub high_score: u64,
    pub level: u32,
    pub cleared_rows: u32,
    /// Rows waiting to collapse, only during RowClearing
    pub clearing_rows: &'a [usize],
}

/// Draws a snapshot
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()>;
}

/// The main game struct
pub struct Game<P: SoundPlayer = Silent> {
    rules: GameplaySettings,
    field: Field,
    bag: Bag,
    current: Option<Piece>,
    next: Option<Piece>,
    score: Score,
    level: Level,
    phase: GamePhase,
    storage: Box<dyn Storage>,
    sound: P,
    /// Time of the latest tick
    now: Timestamp,
    /// Time of the last gravity step
    last_step: Timestamp,
    /// Ticks until a held move key repeats
    movement_delay: u32,
    /// Full rows found by the last lock, top to bottom
    clearing: Vec<usize>,
    clear_until: Timestamp,
    paused_at: Option<Timestamp>,
}

impl<P: SoundPlayer> Game<P> {
    /// Create a game sitting in the menu. The high score is read from `storage`.
    pub fn new(rules: GameplaySettings, storage: Box<dyn Storage>, sound: P) -> Self {
        let rules = rules.sanitized();
        let bag = rules.seed.map(Bag::with_seed).unwrap_or_default();
        let level = Level::new(rules.starting_level, rules.rows_per_level);
        let score = Score::load(storage.as_ref());

        Self {
            rules,
            field: Field::new(),
            bag,
            current: None,
            next: None,
            score,
            level,
            phase: GamePhase::Menu,
            storage,
            sound,
            now: 0,
            last_step: 0,
            movement_delay: 0,
            clearing: Vec::new(),
            clear_until: 0,
            paused_at: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    pub fn next_piece(&self) -> Option<&Piece> {
        self.next.as_ref()
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn level(&self) -> u32 {
        self.level.level
    }

    /// Current gravity interval, ignoring soft drop
    pub fn fall_interval_ms(&self) -> u64 {
        self.level.fall_interval_ms()
    }

    pub fn sound(&self) -> &P {
        &self.sound
    }

    pub fn sound_mut(&mut self) -> &mut P {
        &mut self.sound
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let current = self.current.as_ref();
        Snapshot {
            phase: self.phase,
            field: &self.field,
            current,
            next: self.next.as_ref(),
            landing_row: current.map(|piece| self.field.drop_row(piece)),
            score: self.score.points,
            high_score: self.score.high_score,
            level: self.level.level,
            cleared_rows: self.score.cleared_rows,
            clearing_rows: &self.clearing,
        }
    }

    /// Start a fresh game at `level`. Nothing from a previous game survives,
    /// and a seeded game deals the same pieces every time it starts.
    pub fn start(&mut self, level: u32) {
        self.level = Level::new(level, self.rules.rows_per_level);
        self.field.init();
        match self.rules.seed {
            Some(seed) => self.bag = Bag::with_seed(seed),
            None => self.bag.init(),
        }
        self.score.restart();
        self.current = Some(Piece::new(self.bag.pick_next()));
        self.next = Some(Piece::new(self.bag.pick_next()));
        self.last_step = self.now;
        self.movement_delay = 0;
        self.clearing.clear();
        self.paused_at = None;
        self.phase = GamePhase::Playing;
        info!(
            "Game started at level {} ({} ms per row)",
            self.level.level,
            self.level.fall_interval_ms()
        );
    }

    /// Run one tick, then hand the resulting snapshot to `renderer`
    pub fn frame(
        &mut self,
        now: Timestamp,
        input: &mut Intents,
        renderer: &mut dyn Renderer,
    ) -> io::Result<()> {
        self.run_tick(now, input);
        renderer.render(&self.snapshot())
    }

    /// Advance the simulation to `now`, consuming `input`
    pub fn run_tick(&mut self, now: Timestamp, input: &mut Intents) {
        self.now = now;

        while let Some(action) = input.next_command() {
            self.handle_command(action, input);
        }

        match self.phase {
            GamePhase::Playing => {
                self.process_movement(input);
                if self.phase == GamePhase::Playing {
                    self.process_gravity(input);
                }
            }
            GamePhase::RowClearing => {
                input.discard_presses();
                if now >= self.clear_until {
                    self.finish_clear();
                }
            }
            GamePhase::Menu | GamePhase::Paused | GamePhase::GameOver => {
                input.discard_presses();
            }
        }
    }

    fn handle_command(&mut self, action: Action, input: &mut Intents) {
        match (self.phase, action) {
            (GamePhase::Menu, Action::SelectLevel(level)) => {
                self.sound.play(Sound::Click);
                input.clear();
                self.start(level);
            }
            (GamePhase::Playing, Action::HardDrop) => self.hard_drop(),
            (GamePhase::Playing, Action::RotateCW) => self.rotate(RotationDirection::Clockwise),
            (GamePhase::Playing, Action::RotateCCW) => {
                self.rotate(RotationDirection::CounterClockwise)
            }
            (GamePhase::Playing, Action::Pause) => {
                self.sound.play(Sound::Click);
                self.paused_at = Some(self.now);
                self.phase = GamePhase::Paused;
                info!("Paused");
            }
            (GamePhase::Paused, Action::Pause) => {
                self.sound.play(Sound::Click);
                if let Some(paused_at) = self.paused_at.take() {
                    self.last_step += self.now.saturating_sub(paused_at);
                }
                self.phase = GamePhase::Playing;
                info!("Resumed");
            }
            (GamePhase::Paused | GamePhase::GameOver, Action::Restart) => {
                self.sound.play(Sound::Click);
                input.clear();
                self.start(self.level.initial);
            }
            (GamePhase::Paused | GamePhase::GameOver, Action::ReturnToMenu) => {
                self.sound.play(Sound::Click);
                input.clear();
                self.current = None;
                self.next = None;
                self.phase = GamePhase::Menu;
                info!("Returned to menu");
            }
            (phase, action) => debug!("Ignoring {:?} in {:?}", action, phase),
        }
    }

    /// Apply held left/right keys. A fresh press moves at once; holding
    /// repeats after `movement_delay_ticks`, then every other tick.
    fn process_movement(&mut self, input: &mut Intents) {
        let mut pressed = false;
        for direction in [Direction::Left, Direction::Right] {
            if input.take_pressed(direction) {
                self.shift(direction);
                self.movement_delay = self.rules.movement_delay_ticks;
                pressed = true;
            }
        }
        if pressed {
            return;
        }

        if self.movement_delay > 0 {
            self.movement_delay -= 1;
            return;
        }
        for direction in [Direction::Left, Direction::Right] {
            if input.is_held(direction) {
                self.shift(direction);
                self.movement_delay = 1;
            }
        }
    }

    fn process_gravity(&mut self, input: &Intents) {
        let interval = if input.is_soft_dropping() {
            self.rules.soft_drop_interval_ms
        } else {
            self.level.fall_interval_ms()
        };
        if self.now.saturating_sub(self.last_step) > interval {
            self.step_down();
            self.last_step = self.now;
        }
    }

    fn shift(&mut self, direction: Direction) {
        if let Some(piece) = &mut self.current {
            let col = piece.col + direction.dx();
            if !self.field.is_colliding(piece, col, piece.row) {
                piece.move_by(direction.dx(), 0);
            }
        }
    }

    fn rotate(&mut self, direction: RotationDirection) {
        if let Some(piece) = &self.current {
            if let Some(rotated) = self.field.try_rotated(piece, direction) {
                self.current = Some(rotated);
            }
        }
    }

    fn step_down(&mut self) {
        let Some(piece) = &mut self.current else {
            return;
        };
        if self.field.is_colliding(piece, piece.col, piece.row + 1) {
            self.lock_piece();
        } else {
            piece.move_by(0, 1);
        }
    }

    fn hard_drop(&mut self) {
        if let Some(piece) = &mut self.current {
            piece.row = self.field.drop_row(piece);
            self.lock_piece();
            self.last_step = self.now;
        }
    }

    /// Lock the current piece into the field and start clearing any full rows
    fn lock_piece(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.field.place_block(&piece);
        self.sound.play(Sound::Lock);

        let rows = self.field.filled_rows();
        debug!(
            "Locked {:?} at ({}, {}), full rows {:?}",
            piece.piece_type, piece.col, piece.row, rows
        );
        if rows.is_empty() {
            self.after_lock(false);
            return;
        }

        self.sound.play(if rows.len() >= TETRIS_ROWS {
            Sound::TetrisClear
        } else {
            Sound::RowClear
        });
        self.clearing = rows;
        if self.rules.row_clear_delay_ms == 0 {
            self.finish_clear();
        } else {
            self.clear_until = self.now.saturating_add(self.rules.row_clear_delay_ms);
            self.phase = GamePhase::RowClearing;
        }
    }

    /// Collapse the rows found at lock time and score them, once
    fn finish_clear(&mut self) {
        let rows = std::mem::take(&mut self.clearing);
        for (combo, &row) in rows.iter().enumerate() {
            self.field.clear_row(row);
            self.score.add_cleared_row();
            self.score.add(self.level.level, combo);
        }
        debug!(
            "Cleared {} rows, score {}, total rows {}",
            rows.len(),
            self.score.points,
            self.score.cleared_rows
        );
        self.phase = GamePhase::Playing;
        self.after_lock(!rows.is_empty());
    }

    fn after_lock(&mut self, cleared_any: bool) {
        if self.field.is_block_in_first_row() {
            self.game_over();
            return;
        }
        if cleared_any {
            self.level.update(self.score.cleared_rows);
        }
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.current = self.next.take();
        self.next = Some(Piece::new(self.bag.pick_next()));
        self.last_step = self.now;
        if let Some(piece) = &self.current {
            debug!("Spawned {:?}", piece.piece_type);
        }
    }

    fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.score.update_high_score(self.storage.as_mut());
        self.sound.play(Sound::GameOver);
        info!(
            "Game over: score {}, level {}, rows {}",
            self.score.points, self.level.level, self.score.cleared_rows
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::tests::fill_row_except;
    use crate::field::{Cell, FIELD_COLS, FIELD_ROWS};
    use crate::input::KeyState;
    use crate::score::HIGH_SCORE_KEY;
    use crate::settings::MAX_ROW_CLEAR_DELAY_MS;
    use crate::sound::SoundLog;
    use crate::storage::MemoryStorage;
    use crate::tetromino::{ColorId, TetrominoType};

    fn rules() -> GameplaySettings {
        GameplaySettings {
            seed: Some(7),
            movement_delay_ticks: 3,
            ..GameplaySettings::default()
        }
    }

    fn new_game(rules: GameplaySettings) -> Game<SoundLog> {
        Game::new(rules, Box::new(MemoryStorage::default()), SoundLog::default())
    }

    fn started(level: u32) -> (Game<SoundLog>, Intents) {
        let mut game = new_game(rules());
        let mut input = Intents::new();
        input.apply(Action::SelectLevel(level));
        game.run_tick(0, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        game.sound_mut().played.clear();
        (game, input)
    }

    fn current(game: &Game<SoundLog>) -> Piece {
        *game.current_piece().unwrap()
    }

    #[test]
    fn test_new_game_waits_in_menu() {
        let mut game = new_game(rules());
        let mut input = Intents::new();
        game.run_tick(1000, &mut input);
        assert_eq!(game.phase(), GamePhase::Menu);
        assert!(game.current_piece().is_none());
        assert!(game.field().is_empty());
    }

    #[test]
    fn test_select_level_starts_game() {
        let (game, _) = started(3);
        assert_eq!(game.level(), 3);
        assert_eq!(game.fall_interval_ms(), 400);
        assert!(game.current_piece().is_some());
        assert!(game.next_piece().is_some());
    }

    #[test]
    fn test_first_two_pieces_come_from_one_bag() {
        let (game, _) = started(0);
        assert_ne!(current(&game).piece_type, game.next_piece().unwrap().piece_type);
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let (mut game, mut input) = started(0);
        let start_row = current(&game).row;
        game.run_tick(475, &mut input);
        assert_eq!(current(&game).row, start_row);
        game.run_tick(476, &mut input);
        assert_eq!(current(&game).row, start_row + 1);
        game.run_tick(900, &mut input);
        assert_eq!(current(&game).row, start_row + 1);
        game.run_tick(952, &mut input);
        assert_eq!(current(&game).row, start_row + 2);
    }

    #[test]
    fn test_soft_drop_speeds_up_gravity() {
        let (mut game, mut input) = started(0);
        let start_row = current(&game).row;
        input.apply(Action::SoftDrop(KeyState::Down));
        game.run_tick(31, &mut input);
        game.run_tick(62, &mut input);
        assert_eq!(current(&game).row, start_row + 2);
        input.apply(Action::SoftDrop(KeyState::Up));
        game.run_tick(100, &mut input);
        assert_eq!(current(&game).row, start_row + 2);
    }

    #[test]
    fn test_press_moves_immediately_then_repeats_after_delay() {
        let (mut game, mut input) = started(0);
        let start_col = current(&game).col;
        input.apply(Action::MoveLeft(KeyState::Down));

        game.run_tick(1, &mut input);
        assert_eq!(current(&game).col, start_col - 1);
        // Delay of 3 ticks before repeating
        for t in 2..=4 {
            game.run_tick(t, &mut input);
            assert_eq!(current(&game).col, start_col - 1);
        }
        game.run_tick(5, &mut input);
        assert_eq!(current(&game).col, start_col - 2);
        // Then every other tick
        game.run_tick(6, &mut input);
        assert_eq!(current(&game).col, start_col - 2);
        game.run_tick(7, &mut input);
        assert_eq!(current(&game).col, start_col - 3);

        input.apply(Action::MoveLeft(KeyState::Up));
        for t in 8..12 {
            game.run_tick(t, &mut input);
        }
        assert_eq!(current(&game).col, start_col - 3);
    }

    #[test]
    fn test_move_blocked_by_wall_is_noop() {
        let (mut game, mut input) = started(0);
        for t in 1..40 {
            input.apply(Action::MoveRight(KeyState::Down));
            input.apply(Action::MoveRight(KeyState::Up));
            game.run_tick(t, &mut input);
        }
        let piece = current(&game);
        let rightmost = piece.cells().map(|(_, c)| c).max().unwrap();
        assert_eq!(rightmost, FIELD_COLS as i32 - 1);
    }

    #[test]
    fn test_rotation_applies_and_is_checked() {
        let (mut game, mut input) = started(0);
        game.current = Some(Piece::new(TetrominoType::T).at(4, 5));
        input.apply(Action::RotateCW);
        game.run_tick(1, &mut input);
        assert_eq!(current(&game).matrix, TetrominoType::T.matrix().rotated_cw());
        input.apply(Action::RotateCCW);
        game.run_tick(2, &mut input);
        assert_eq!(current(&game).matrix, TetrominoType::T.matrix());
    }

    #[test]
    fn test_hard_drop_locks_in_same_tick() {
        let (mut game, mut input) = started(0);
        let dropped = current(&game);
        let landed = dropped.at(dropped.col, game.field().drop_row(&dropped));
        let expected_next = game.next_piece().unwrap().piece_type;
        input.apply(Action::HardDrop);
        game.run_tick(1, &mut input);

        for (row, col) in landed.cells() {
            assert_eq!(game.field().get(row, col), Some(Cell::Filled(dropped.color())));
        }
        assert_eq!(current(&game).piece_type, expected_next);
        assert_eq!(game.sound().played, vec![Sound::Lock]);
    }

    #[test]
    fn test_lock_clears_row_and_scores() {
        let (mut game, mut input) = started(1);
        fill_row_except(&mut game.field, FIELD_ROWS - 1, &[4, 5]);
        let o = Piece::new(TetrominoType::O);
        assert_eq!(o.col, 4);
        game.current = Some(o.at(o.col, FIELD_ROWS as i32 - 2));
        let expected_next = game.next_piece().unwrap().piece_type;

        game.run_tick(1000, &mut input);

        assert_eq!(game.score().points, 40);
        assert_eq!(game.score().cleared_rows, 1);
        assert_eq!(game.level(), 1);
        assert_eq!(game.phase(), GamePhase::Playing);
        // The O's upper half dropped into the bottom row
        let bottom: Vec<_> = (0..FIELD_COLS as i32)
            .map(|col| game.field().is_occupied(FIELD_ROWS as i32 - 1, col))
            .collect();
        assert_eq!(
            bottom,
            vec![false, false, false, false, true, true, false, false, false, false]
        );
        assert_eq!(current(&game).piece_type, expected_next);
        assert_eq!(game.sound().played, vec![Sound::Lock, Sound::RowClear]);
    }

    #[test]
    fn test_multi_row_clear_uses_combo_tiers() {
        let (mut game, mut input) = started(2);
        for row in FIELD_ROWS - 4..FIELD_ROWS {
            fill_row_except(&mut game.field, row, &[0]);
        }
        let mut i = Piece::new(TetrominoType::I);
        i.rotate_clockwise();
        // Vertical I sits in matrix column 2
        game.current = Some(i.at(-2, 0));
        input.apply(Action::HardDrop);
        game.run_tick(1, &mut input);

        // 40 * (1 + 2.5 + 7.5 + 30) * 2
        assert_eq!(game.score().points, 3280);
        assert_eq!(game.score().cleared_rows, 4);
        assert!(game.field().is_empty());
        assert_eq!(game.sound().played, vec![Sound::Lock, Sound::TetrisClear]);
    }

    #[test]
    fn test_level_up_after_threshold() {
        let mut game = new_game(GameplaySettings {
            rows_per_level: 30,
            ..rules()
        });
        let mut input = Intents::new();
        input.apply(Action::SelectLevel(0));
        game.run_tick(0, &mut input);
        game.score.cleared_rows = 27;

        for row in FIELD_ROWS - 4..FIELD_ROWS {
            fill_row_except(&mut game.field, row, &[0]);
        }
        let mut i = Piece::new(TetrominoType::I);
        i.rotate_clockwise();
        game.current = Some(i.at(-2, 0));
        input.apply(Action::HardDrop);
        game.run_tick(1, &mut input);

        assert_eq!(game.score().cleared_rows, 31);
        assert_eq!(game.level(), 1);
        assert_eq!(game.fall_interval_ms(), 450);
    }

    #[test]
    fn test_row_clear_delay_holds_rows_on_screen() {
        let mut game = new_game(GameplaySettings {
            row_clear_delay_ms: 200,
            ..rules()
        });
        let mut input = Intents::new();
        input.apply(Action::SelectLevel(1));
        game.run_tick(0, &mut input);

        fill_row_except(&mut game.field, FIELD_ROWS - 1, &[4, 5]);
        game.current = Some(Piece::new(TetrominoType::O).at(4, FIELD_ROWS as i32 - 2));
        input.apply(Action::HardDrop);
        game.run_tick(10, &mut input);

        assert_eq!(game.phase(), GamePhase::RowClearing);
        assert_eq!(game.snapshot().clearing_rows, &[FIELD_ROWS - 1]);
        assert_eq!(game.score().points, 0);
        assert!(game.current_piece().is_none());

        // Movement is ignored while clearing
        input.apply(Action::MoveLeft(KeyState::Down));
        input.apply(Action::MoveLeft(KeyState::Up));
        game.run_tick(100, &mut input);
        assert_eq!(game.phase(), GamePhase::RowClearing);

        game.run_tick(210, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.score().points, 40);
        assert!(game.snapshot().clearing_rows.is_empty());
        assert!(game.current_piece().is_some());

        // Scored exactly once
        game.run_tick(220, &mut input);
        assert_eq!(game.score().points, 40);
    }

    #[test]
    fn test_huge_row_clear_delay_is_clamped() {
        let mut game = new_game(GameplaySettings {
            row_clear_delay_ms: u64::MAX,
            ..rules()
        });
        let mut input = Intents::new();
        input.apply(Action::SelectLevel(1));
        game.run_tick(0, &mut input);

        fill_row_except(&mut game.field, FIELD_ROWS - 1, &[4, 5]);
        game.current = Some(Piece::new(TetrominoType::O).at(4, FIELD_ROWS as i32 - 2));
        input.apply(Action::HardDrop);
        game.run_tick(10, &mut input);
        assert_eq!(game.phase(), GamePhase::RowClearing);

        game.run_tick(10 + MAX_ROW_CLEAR_DELAY_MS, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.score().points, 40);
    }

    fn stack_to_second_row(game: &mut Game<SoundLog>) {
        for row in 2..FIELD_ROWS {
            fill_row_except(&mut game.field, row, &[0]);
        }
    }

    #[test]
    fn test_lock_in_first_row_is_game_over() {
        let (mut game, mut input) = started(0);
        stack_to_second_row(&mut game);
        game.score.points = 999;
        game.current = Some(Piece::new(TetrominoType::O).at(4, 0));

        game.run_tick(1000, &mut input);

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.score().high_score, 999);
        assert_eq!(game.storage.get(HIGH_SCORE_KEY).as_deref(), Some("999"));
        assert_eq!(game.sound().played, vec![Sound::Lock, Sound::GameOver]);

        // Nothing moves after the game ends
        let field = game.field().clone();
        game.run_tick(5000, &mut input);
        assert_eq!(game.field(), &field);
    }

    #[test]
    fn test_game_over_keeps_better_high_score() {
        let mut storage = MemoryStorage::default();
        storage.set(HIGH_SCORE_KEY, "5000").unwrap();
        let mut game = Game::new(rules(), Box::new(storage), SoundLog::default());
        let mut input = Intents::new();
        input.apply(Action::SelectLevel(0));
        game.run_tick(0, &mut input);
        assert_eq!(game.snapshot().high_score, 5000);

        stack_to_second_row(&mut game);
        game.score.points = 10;
        game.current = Some(Piece::new(TetrominoType::O).at(4, 0));
        game.run_tick(1000, &mut input);

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.score().high_score, 5000);
        assert_eq!(game.storage.get(HIGH_SCORE_KEY).as_deref(), Some("5000"));
    }

    #[test]
    fn test_pause_stops_simulation() {
        let (mut game, mut input) = started(0);
        let before = current(&game);
        input.apply(Action::Pause);
        game.run_tick(10, &mut input);
        assert_eq!(game.phase(), GamePhase::Paused);

        input.apply(Action::MoveLeft(KeyState::Down));
        input.apply(Action::RotateCW);
        game.run_tick(10_000, &mut input);
        assert_eq!(current(&game), before);

        input.apply(Action::MoveLeft(KeyState::Up));
        input.apply(Action::Pause);
        game.run_tick(10_010, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        // The paused time does not count towards gravity
        assert_eq!(current(&game), before);
        game.run_tick(10_490, &mut input);
        assert_eq!(current(&game).row, before.row + 1);
        assert_eq!(game.sound().played, vec![Sound::Click, Sound::Click]);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (mut game, mut input) = started(4);
        stack_to_second_row(&mut game);
        game.current = Some(Piece::new(TetrominoType::O).at(4, 0));
        game.score.cleared_rows = 12;
        game.run_tick(1000, &mut input);
        assert_eq!(game.phase(), GamePhase::GameOver);

        input.apply(Action::Restart);
        game.run_tick(2000, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert!(game.field().is_empty());
        assert_eq!(game.score().points, 0);
        assert_eq!(game.score().cleared_rows, 0);
        assert_eq!(game.level(), 4);
        assert_eq!(current(&game).row, Piece::new(current(&game).piece_type).row);
    }

    #[test]
    fn test_seeded_restart_deals_same_pieces() {
        let (mut game, mut input) = started(0);
        let first = (current(&game).piece_type, game.next_piece().unwrap().piece_type);
        for t in 1..=3 {
            input.apply(Action::HardDrop);
            game.run_tick(t, &mut input);
        }

        input.apply(Action::Pause);
        input.apply(Action::Restart);
        game.run_tick(10, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        let again = (current(&game).piece_type, game.next_piece().unwrap().piece_type);
        assert_eq!(again, first);
    }

    #[test]
    fn test_return_to_menu_and_pick_new_level() {
        let (mut game, mut input) = started(2);
        input.apply(Action::Pause);
        input.apply(Action::ReturnToMenu);
        game.run_tick(1, &mut input);
        assert_eq!(game.phase(), GamePhase::Menu);
        assert!(game.snapshot().current.is_none());

        input.apply(Action::SelectLevel(9));
        game.run_tick(2, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.level(), 9);
    }

    #[test]
    fn test_commands_ignored_in_wrong_phase() {
        let (mut game, mut input) = started(0);
        input.apply(Action::SelectLevel(5));
        input.apply(Action::Restart);
        input.apply(Action::ReturnToMenu);
        game.run_tick(1, &mut input);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.level(), 0);
    }

    #[test]
    fn test_snapshot_reports_state() {
        let (mut game, _) = started(1);
        game.field.set(19, 0, Cell::Filled(ColorId::Red));
        game.current = Some(Piece::new(TetrominoType::O).at(0, 0));
        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.landing_row, Some(17));
        assert_eq!(snapshot.field.get(19, 0), Some(Cell::Filled(ColorId::Red)));
        assert!(snapshot.next.is_some());
    }

    #[test]
    fn test_frame_renders_after_tick() {
        struct Recorder(Vec<(GamePhase, u64)>);
        impl Renderer for Recorder {
            fn render(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
                self.0.push((snapshot.phase, snapshot.score));
                Ok(())
            }
        }

        let mut game = new_game(rules());
        let mut input = Intents::new();
        let mut renderer = Recorder(Vec::new());
        game.frame(0, &mut input, &mut renderer).unwrap();
        input.apply(Action::SelectLevel(0));
        game.frame(16, &mut input, &mut renderer).unwrap();
        assert_eq!(
            renderer.0,
            vec![(GamePhase::Menu, 0), (GamePhase::Playing, 0)]
        );
    }

    #[test]
    fn test_same_seed_same_game() {
        let play = || {
            let (mut game, mut input) = started(0);
            for t in 1..200 {
                if t % 7 == 0 {
                    input.apply(Action::HardDrop);
                }
                game.run_tick(t * 16, &mut input);
            }
            (game.field().clone(), game.score().clone())
        };
        assert_eq!(play(), play());
    }
}
