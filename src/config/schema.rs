use std::path::PathBuf;

use serde::Deserialize;

use crate::playlist::RepeatMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Music root used when none is given on the command line.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Where the scan cache and cover store live.
    ///
    /// Defaults to `$XDG_DATA_HOME/cadenza` or `~/.local/share/cadenza`.
    pub data_dir: Option<PathBuf>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: ["mp3", "ogg", "flac", "aac", "m4a", "opus"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
            include_hidden: false,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Default repeat mode.
    pub repeat_mode: RepeatMode,
    /// Output level applied to every track (0.0 - 1.0).
    pub volume: f32,
    /// Output level while another application holds duckable focus.
    pub duck_volume: f32,
    /// Consecutive playback errors tolerated before playback stops.
    pub max_consecutive_errors: u32,
    /// Interval between progress updates while playing (milliseconds).
    pub progress_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatMode::None,
            volume: 1.0,
            duck_volume: 0.3,
            max_consecutive_errors: 3,
            progress_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Window in which a second next/previous turns into a folder jump (milliseconds).
    pub double_tap_ms: u64,
    /// Number of seconds to scrub on fast-forward / rewind.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            double_tap_ms: 500,
            scrub_seconds: 10,
        }
    }
}
