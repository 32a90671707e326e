//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blockfall/settings.toml (or platform equivalent)

use crate::error::{Error, Result};
use crate::score::MAX_LEVEL;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Game settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// Audio settings
    pub audio: AudioSettings,
}

/// Controls that can be bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Pause,
    Restart,
    Menu,
    Quit,
}

impl Control {
    pub fn all() -> [Control; 10] {
        [
            Control::MoveLeft,
            Control::MoveRight,
            Control::SoftDrop,
            Control::HardDrop,
            Control::RotateCw,
            Control::RotateCcw,
            Control::Pause,
            Control::Restart,
            Control::Menu,
            Control::Quit,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Control::MoveLeft => "Left",
            Control::MoveRight => "Right",
            Control::SoftDrop => "Soft drop",
            Control::HardDrop => "Hard drop",
            Control::RotateCw => "Rotate",
            Control::RotateCcw => "Rotate back",
            Control::Pause => "Pause",
            Control::Restart => "Restart",
            Control::Menu => "Menu",
            Control::Quit => "Quit",
        }
    }
}

/// Key bindings (stored as strings for easy editing)
/// Each control can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub restart: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub menu: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            soft_drop: vec!["Down".to_string()],
            hard_drop: vec!["Space".to_string()],
            rotate_cw: vec!["s".to_string(), "Up".to_string()],
            rotate_ccw: vec!["a".to_string()],
            pause: vec!["p".to_string(), "Esc".to_string()],
            restart: vec!["r".to_string()],
            menu: vec!["m".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

impl KeyBindings {
    pub fn keys(&self, control: Control) -> &[String] {
        match control {
            Control::MoveLeft => &self.move_left,
            Control::MoveRight => &self.move_right,
            Control::SoftDrop => &self.soft_drop,
            Control::HardDrop => &self.hard_drop,
            Control::RotateCw => &self.rotate_cw,
            Control::RotateCcw => &self.rotate_ccw,
            Control::Pause => &self.pause,
            Control::Restart => &self.restart,
            Control::Menu => &self.menu,
            Control::Quit => &self.quit,
        }
    }

    fn keys_mut(&mut self, control: Control) -> &mut Vec<String> {
        match control {
            Control::MoveLeft => &mut self.move_left,
            Control::MoveRight => &mut self.move_right,
            Control::SoftDrop => &mut self.soft_drop,
            Control::HardDrop => &mut self.hard_drop,
            Control::RotateCw => &mut self.rotate_cw,
            Control::RotateCcw => &mut self.rotate_ccw,
            Control::Pause => &mut self.pause,
            Control::Restart => &mut self.restart,
            Control::Menu => &mut self.menu,
            Control::Quit => &mut self.quit,
        }
    }

    /// Bind `key` to `control` alone, unbinding it from any other control
    pub fn rebind(&mut self, control: Control, key: &str) {
        for other in Control::all() {
            self.keys_mut(other).retain(|k| !k.eq_ignore_ascii_case(key));
        }
        *self.keys_mut(control) = vec![key.to_string()];
    }

    /// Put every binding back to its default
    pub fn restore_defaults(&mut self) {
        *self = Self::default();
    }
}

/// Longest cosmetic row clear accepted from a settings file
pub const MAX_ROW_CLEAR_DELAY_MS: u64 = 2000;

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Level preselected in the menu
    pub starting_level: u32,
    /// Rows to clear per level gained
    pub rows_per_level: u32,
    /// Ticks a held move key waits before repeating
    pub movement_delay_ticks: u32,
    /// Fall interval while soft drop is held
    pub soft_drop_interval_ms: u64,
    /// How long cleared rows stay on screen before collapsing
    pub row_clear_delay_ms: u64,
    /// Fixed piece sequence seed; random when unset
    pub seed: Option<u64>,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            starting_level: 0,
            rows_per_level: 10,
            movement_delay_ticks: 6,
            soft_drop_interval_ms: 30,
            row_clear_delay_ms: 0,
            seed: None,
        }
    }
}

impl GameplaySettings {
    /// Clamp values a hand-edited file could put out of range
    pub fn sanitized(mut self) -> Self {
        self.starting_level = self.starting_level.min(MAX_LEVEL - 1);
        self.rows_per_level = self.rows_per_level.max(1);
        self.row_clear_delay_ms = self.row_clear_delay_ms.min(MAX_ROW_CLEAR_DELAY_MS);
        self
    }
}

/// Audio settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// SFX volume (0-100)
    pub sfx_volume: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { sfx_volume: 50 }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the default file, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, or fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };
        match Self::parse(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(contents)?;
        settings.gameplay = settings.gameplay.sanitized();
        Ok(settings)
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().ok_or(Error::NoProjectDir)?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
