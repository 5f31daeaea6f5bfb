use serde::Deserialize;

/// What happens when the active track finishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Stop after the last track (or after a full shuffle cycle).
    #[default]
    #[serde(alias = "no-repeat", alias = "no_repeat", alias = "off")]
    None,
    /// Restart the current track.
    #[serde(alias = "repeat-one", alias = "repeat_one", alias = "loop-one")]
    One,
    /// Wrap around to the start of the library.
    #[serde(alias = "repeat-all", alias = "repeat_all", alias = "loop-all")]
    All,
}

impl RepeatMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "no-repeat" => Some(Self::None),
            "one" | "repeat-one" => Some(Self::One),
            "all" | "repeat-all" => Some(Self::All),
            _ => None,
        }
    }
}
