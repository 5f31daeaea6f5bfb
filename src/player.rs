//! Single-resource playback: the controller state machine and its collaborators.
//!
//! All controller mutations happen on one control thread that drains a
//! `ControlMsg` channel. Resource callbacks, timers and background metadata
//! extraction post into that channel instead of touching state directly.

mod controller;
mod focus;
mod gesture;
mod output;
mod resource;
mod timer;
mod types;

pub use controller::{ControllerConfig, PlayerController};
pub use focus::{AlwaysGranted, AudioFocus, FocusChange};
pub use gesture::{Disambiguator, GestureAction, GestureKind};
pub use output::{RodioFactory, RodioResource};
pub use resource::{PlaybackResource, ResourceError, ResourceEvent, ResourceEvents, ResourceFactory};
pub use timer::{Schedule, ThreadTimer, TimerMsg};
pub use types::{ControlMsg, NowPlaying, PlayerCmd, PlayerEvent, PlayerState, Snapshot};
