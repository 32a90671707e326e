//! Errors from persistence and settings I/O.
//!
//! The simulation itself never fails; only the edges that touch the
//! filesystem return these.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not determine the platform data or config directory")]
    NoProjectDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("failed to parse settings: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}
