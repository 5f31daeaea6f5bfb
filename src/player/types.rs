//! Commands, events and snapshots exchanged with the control thread.

use std::path::PathBuf;

use crate::library::{LibraryIndex, ScanError, Track};
use crate::playlist::RepeatMode;

use super::focus::FocusChange;
use super::resource::ResourceEvent;
use super::timer::TimerMsg;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Preparing,
    Prepared,
    Playing,
    Paused,
    Error,
}

impl PlayerState {
    /// States in which a resource is loaded and can be seeked.
    pub fn is_loaded(self) -> bool {
        matches!(self, Self::Prepared | Self::Playing | Self::Paused)
    }
}

/// External commands understood by the player controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCmd {
    Play,
    Pause,
    PlayPause,
    Stop,
    /// Next track; a quick second activation jumps to the next folder.
    Next,
    /// Previous track; a quick second activation jumps to the previous folder.
    Previous,
    /// Absolute position in milliseconds.
    Seek(u64),
    /// Relative scrub in seconds, negative to rewind.
    SeekBy(i64),
    ToggleShuffle,
    SetRepeatMode(RepeatMode),
    PlayTrackAt(usize),
    PlayLocator(PathBuf),
}

/// Everything the control thread can receive.
#[derive(Debug)]
pub enum ControlMsg {
    Command(PlayerCmd),
    /// Callback from the resource created for `generation`.
    Resource {
        generation: u64,
        event: ResourceEvent,
    },
    Focus(FocusChange),
    Timer(TimerMsg),
    /// Refined metadata for the track started at `generation`.
    MetadataReady {
        generation: u64,
        now_playing: NowPlaying,
    },
    /// Rescan `root`, or the current library root when `None`.
    Scan(Option<PathBuf>),
    ScanFinished {
        root: PathBuf,
        result: Result<LibraryIndex, ScanError>,
    },
    Status,
    Quit,
}

/// Now-playing details for the active track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NowPlaying {
    pub locator: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub cover_path: Option<PathBuf>,
}

impl NowPlaying {
    /// Placeholder built from what the index already knows.
    pub fn from_track(track: &Track) -> Self {
        Self {
            locator: track.locator.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration_ms: track.duration_ms,
            cover_path: track.cover_path.clone(),
        }
    }
}

/// Owned view of the controller, handed out instead of shared mutable fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub state: PlayerState,
    /// Current navigation position, `None` when the library is empty.
    pub index: Option<usize>,
    pub now_playing: Option<NowPlaying>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
}

/// Events produced for UI and notification consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(Snapshot),
    ScanStarted { root: PathBuf },
    ScanCompleted { tracks: usize, folders: usize },
    /// The library root can no longer be read; the index was cleared.
    LibraryUnavailable { root: PathBuf },
}
