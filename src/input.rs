//! Logical input actions and the intent state the game reads each tick
//!
//! Front-ends translate their raw key events into [`Action`]s and feed
//! them to [`Intents::apply`]. The game consumes the intents once per
//! tick, so nothing here knows about physical keys.

use crate::score::MAX_LEVEL;
use std::collections::VecDeque;
use tracing::warn;

/// Whether a held control went down or came back up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft(KeyState),
    MoveRight(KeyState),
    SoftDrop(KeyState),
    HardDrop,
    RotateCW,
    RotateCCW,
    Pause,
    SelectLevel(u32),
    Restart,
    ReturnToMenu,
}

/// Horizontal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn dx(&self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct HoldState {
    held: bool,
    /// Went down since the game last looked
    pressed: bool,
}

impl HoldState {
    fn apply(&mut self, state: KeyState) {
        match state {
            KeyState::Down if !self.held => {
                self.held = true;
                self.pressed = true;
            }
            KeyState::Down => {}
            KeyState::Up => self.held = false,
        }
    }
}

/// Pending input for the next tick
#[derive(Debug, Clone, Default)]
pub struct Intents {
    left: HoldState,
    right: HoldState,
    soft_drop: bool,
    /// One-shot actions in arrival order
    queued: VecDeque<Action>,
}

impl Intents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action. Out-of-range level selections are dropped here.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::MoveLeft(state) => self.left.apply(state),
            Action::MoveRight(state) => self.right.apply(state),
            Action::SoftDrop(state) => self.soft_drop = state == KeyState::Down,
            Action::SelectLevel(level) if level >= MAX_LEVEL => {
                warn!("Ignoring selection of level {} (max {})", level, MAX_LEVEL - 1);
            }
            other => self.queued.push_back(other),
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.left.held,
            Direction::Right => self.right.held,
        }
    }

    pub fn is_soft_dropping(&self) -> bool {
        self.soft_drop
    }

    /// Whether the key went down since the last call, clearing the edge
    pub fn take_pressed(&mut self, direction: Direction) -> bool {
        let hold = match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        };
        std::mem::take(&mut hold.pressed)
    }

    /// Drop press edges that arrived while movement was not accepted
    pub fn discard_presses(&mut self) {
        self.left.pressed = false;
        self.right.pressed = false;
    }

    /// Next queued one-shot action
    pub fn next_command(&mut self) -> Option<Action> {
        self.queued.pop_front()
    }

    /// Forget everything, as if every key were released
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
