//! BLOCKFALL - falling-block puzzle engine
//!
//! The simulation is a pure state machine driven by [`Game::run_tick`].
//! Rendering, key handling, sound output and persistence sit behind the
//! [`Renderer`], [`SoundPlayer`] and [`Storage`] seams.

pub mod bag;
pub mod error;
pub mod field;
pub mod game;
pub mod input;
pub mod piece;
pub mod score;
pub mod settings;
pub mod sound;
pub mod storage;
pub mod tetromino;

pub use error::{Error, Result};
pub use field::{Cell, Field, FIELD_COLS, FIELD_ROWS};
pub use game::{Game, GamePhase, Renderer, Snapshot, Timestamp};
pub use input::{Action, Intents, KeyState};
pub use piece::{Piece, RotationDirection};
pub use score::{Level, Score, MAX_LEVEL};
pub use settings::{Control, GameplaySettings, KeyBindings, Settings};
pub use sound::{Silent, Sound, SoundPlayer};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use tetromino::{ColorId, TetrominoType};
