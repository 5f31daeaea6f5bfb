/// Audio-focus notifications delivered to the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    /// Another source took over for good.
    Loss,
    /// Short interruption; playback resumes on regain.
    LossTransient,
    /// Short interruption that allows playing on at a lower level.
    LossTransientCanDuck,
}

impl FocusChange {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gain" => Some(Self::Gain),
            "loss" => Some(Self::Loss),
            "transient" | "loss-transient" => Some(Self::LossTransient),
            "duck" | "can-duck" => Some(Self::LossTransientCanDuck),
            _ => None,
        }
    }
}

/// Arbiter granting exclusive playback rights.
pub trait AudioFocus {
    /// Ask for focus; `false` means playback must not start.
    fn request(&mut self) -> bool;
    fn abandon(&mut self);
}

/// Desktop default: nothing competes for the output, so focus is always granted.
#[derive(Debug, Default)]
pub struct AlwaysGranted;

impl AudioFocus for AlwaysGranted {
    fn request(&mut self) -> bool {
        true
    }

    fn abandon(&mut self) {}
}
