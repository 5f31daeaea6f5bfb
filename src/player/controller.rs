use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::Settings;
use crate::library::{self, FolderId, LibraryIndex, Track};
use crate::playlist::{Navigation, RepeatMode};

use super::focus::{AlwaysGranted, AudioFocus, FocusChange};
use super::gesture::{Disambiguator, GestureAction, GestureKind};
use super::resource::{PlaybackResource, ResourceEvent, ResourceEvents, ResourceFactory};
use super::timer::{Schedule, ThreadTimer, TimerMsg};
use super::types::{ControlMsg, NowPlaying, PlayerCmd, PlayerEvent, PlayerState, Snapshot};

/// Knobs the controller reads; usually derived from `Settings`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub double_tap: Duration,
    pub volume: f32,
    pub duck_volume: f32,
    pub max_consecutive_errors: u32,
    pub progress_interval: Duration,
    /// Re-read tags on a background thread after a track starts.
    pub refine_metadata: bool,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
}

impl ControllerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            double_tap: Duration::from_millis(settings.controls.double_tap_ms),
            volume: settings.playback.volume,
            duck_volume: settings.playback.duck_volume,
            max_consecutive_errors: settings.playback.max_consecutive_errors,
            progress_interval: Duration::from_millis(settings.playback.progress_interval_ms),
            refine_metadata: true,
            shuffle: settings.playback.shuffle,
            repeat_mode: settings.playback.repeat_mode,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

struct Session<R> {
    resource: R,
    generation: u64,
}

/// Owns the single live playback resource and the navigation state.
///
/// Only the control thread calls into this type. Resource callbacks arrive as
/// `ControlMsg::Resource` tagged with a generation; anything not matching the
/// live session is dropped.
pub struct PlayerController<F: ResourceFactory> {
    config: ControllerConfig,
    factory: F,
    nav: Navigation,
    focus: Box<dyn AudioFocus>,
    timer: Box<dyn Schedule>,
    tx: Sender<ControlMsg>,
    events: Sender<PlayerEvent>,

    session: Option<Session<F::Resource>>,
    state: PlayerState,
    generation: u64,
    now_playing: Option<NowPlaying>,
    /// Start as soon as the pending prepare finishes.
    autostart: bool,
    focus_held: bool,
    resume_on_gain: bool,
    ducked: bool,
    gestures: Disambiguator,
    progress_token: u64,
    consecutive_errors: u32,
}

impl<F: ResourceFactory> PlayerController<F> {
    pub fn new(
        config: ControllerConfig,
        factory: F,
        tx: Sender<ControlMsg>,
        events: Sender<PlayerEvent>,
    ) -> Self {
        let gestures = Disambiguator::new(config.double_tap);
        let mut controller = Self {
            factory,
            nav: Navigation::new(),
            focus: Box::new(AlwaysGranted),
            timer: Box::new(ThreadTimer::new(tx.clone())),
            tx,
            events,
            session: None,
            state: PlayerState::Idle,
            generation: 0,
            now_playing: None,
            autostart: false,
            focus_held: false,
            resume_on_gain: false,
            ducked: false,
            gestures,
            progress_token: 0,
            consecutive_errors: 0,
            config,
        };
        controller.apply_playback_defaults();
        controller
    }

    pub fn with_navigation(mut self, nav: Navigation) -> Self {
        self.nav = nav;
        self.apply_playback_defaults();
        self
    }

    pub fn with_focus(mut self, focus: Box<dyn AudioFocus>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_timer(mut self, timer: Box<dyn Schedule>) -> Self {
        self.timer = timer;
        self
    }

    fn apply_playback_defaults(&mut self) {
        self.nav.set_shuffle(self.config.shuffle);
        self.nav.set_repeat_mode(self.config.repeat_mode);
    }

    pub fn navigation(&self) -> &Navigation {
        &self.nav
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        let fallback_duration = self.now_playing.as_ref().map_or(0, |np| np.duration_ms);
        let (position_ms, duration_ms) = match &self.session {
            Some(s) if self.state.is_loaded() => (
                s.resource.position_ms(),
                s.resource.duration_ms().unwrap_or(fallback_duration),
            ),
            _ => (0, fallback_duration),
        };
        Snapshot {
            state: self.state,
            index: (!self.nav.is_empty()).then(|| self.nav.current_index()),
            now_playing: self.now_playing.clone(),
            position_ms,
            duration_ms,
            shuffle: self.nav.is_shuffle_on(),
            repeat_mode: self.nav.repeat_mode(),
        }
    }

    /// Emit the current snapshot as a `StateChanged` event.
    pub fn publish(&self) {
        let _ = self.events.send(PlayerEvent::StateChanged(self.snapshot()));
    }

    /// Entry point for everything the control thread receives that concerns playback.
    pub fn handle(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::Command(cmd) => self.dispatch(cmd),
            ControlMsg::Resource { generation, event } => self.on_resource_event(generation, event),
            ControlMsg::Focus(change) => self.on_focus_change(change),
            ControlMsg::Timer(timer) => self.on_timer(timer),
            ControlMsg::MetadataReady {
                generation,
                now_playing,
            } => self.on_metadata(generation, now_playing),
            ControlMsg::Scan(_)
            | ControlMsg::ScanFinished { .. }
            | ControlMsg::Status
            | ControlMsg::Quit => debug!("player ignoring library/runtime message"),
        }
    }

    pub fn dispatch(&mut self, cmd: PlayerCmd) {
        debug!("command: {cmd:?}");
        match cmd {
            PlayerCmd::Play => self.play(),
            PlayerCmd::Pause => self.pause(),
            PlayerCmd::PlayPause => {
                if self.state == PlayerState::Playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::Next => self.activate(GestureKind::Next),
            PlayerCmd::Previous => self.activate(GestureKind::Previous),
            PlayerCmd::Seek(ms) => self.seek(ms),
            PlayerCmd::SeekBy(seconds) => self.seek_by(seconds),
            PlayerCmd::ToggleShuffle => self.toggle_shuffle(),
            PlayerCmd::SetRepeatMode(mode) => self.set_repeat_mode(mode),
            PlayerCmd::PlayTrackAt(index) => self.play_track_at(index),
            PlayerCmd::PlayLocator(locator) => self.play_locator(&locator),
        }
    }

    pub fn play(&mut self) {
        match self.state {
            PlayerState::Paused | PlayerState::Prepared => self.resume(),
            PlayerState::Preparing => self.autostart = true,
            PlayerState::Playing => {}
            PlayerState::Idle | PlayerState::Error => self.play_current(),
        }
    }

    pub fn pause(&mut self) {
        self.resume_on_gain = false;
        self.pause_output();
    }

    /// Release the resource and forget the active track.
    pub fn stop(&mut self) {
        self.gestures.cancel_all();
        self.release_session();
        self.cancel_progress();
        self.now_playing = None;
        self.autostart = false;
        self.resume_on_gain = false;
        self.ducked = false;
        self.consecutive_errors = 0;
        if self.focus_held {
            self.focus.abandon();
            self.focus_held = false;
        }
        self.state = PlayerState::Idle;
        self.publish();
    }

    /// Seek within the loaded track, clamped to its duration when known.
    pub fn seek(&mut self, position_ms: u64) {
        if !self.state.is_loaded() {
            debug!("seek ignored in {:?}", self.state);
            return;
        }
        let target = match self.known_duration() {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.resource.seek(target) {
                warn!("{e}");
                return;
            }
        }
        self.publish();
    }

    pub fn seek_by(&mut self, seconds: i64) {
        let Some(session) = self.session.as_ref().filter(|_| self.state.is_loaded()) else {
            return;
        };
        let current = session.resource.position_ms() as i64;
        let target = current.saturating_add(seconds.saturating_mul(1000)).max(0);
        self.seek(target as u64);
    }

    pub fn toggle_shuffle(&mut self) {
        let on = self.nav.toggle_shuffle();
        self.gestures.cancel_all();
        info!("shuffle {}", if on { "on" } else { "off" });
        self.publish();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.nav.set_repeat_mode(mode);
        info!("repeat mode {mode:?}");
        self.publish();
    }

    pub fn play_track_at(&mut self, index: usize) {
        if self.nav.set_current_index(index) {
            self.play_current();
        } else {
            warn!("track {index} out of range ({} tracks)", self.nav.len());
        }
    }

    /// Play a library track by locator, or a loose file outside the library.
    ///
    /// A loose file leaves the navigation position where it was, so what
    /// follows it is decided from the library's current track.
    pub fn play_locator(&mut self, locator: &Path) {
        if let Some(index) = self.nav.library().position_of(locator) {
            return self.play_track_at(index);
        }
        info!("{} is not in the library, playing it on its own", locator.display());
        let display_name = library::display_name_of(locator);
        let track = Track {
            locator: locator.to_path_buf(),
            title: display_name.clone(),
            display_name,
            artist: String::new(),
            album: String::new(),
            duration_ms: 0,
            folder_id: FolderId(0),
            cover_path: None,
        };
        if !self.ensure_focus() {
            warn!("audio focus denied, not starting playback");
            return;
        }
        self.start_track(track);
    }

    /// Replace the library; playback stops and navigation restarts at the first track.
    pub fn install_index(&mut self, index: Arc<LibraryIndex>) {
        self.stop();
        self.nav.install(index);
        self.publish();
    }

    fn activate(&mut self, kind: GestureKind) {
        if self.nav.is_empty() {
            return;
        }
        match self.gestures.on_activate(kind, self.nav.is_shuffle_on()) {
            GestureAction::Shuffle => {
                self.nav.shuffle_pick();
                self.play_current();
            }
            GestureAction::Defer { delay, msg } => self.timer.schedule(delay, msg),
            GestureAction::FolderStep(GestureKind::Next) => {
                self.nav.next_folder();
                self.play_current();
            }
            GestureAction::FolderStep(GestureKind::Previous) => {
                self.nav.prev_folder();
                self.play_current();
            }
        }
    }

    fn on_timer(&mut self, timer: TimerMsg) {
        match timer {
            TimerMsg::Gesture { kind, token } => {
                if !self.gestures.on_timer(kind, token) {
                    debug!("stale {kind:?} gesture timer");
                    return;
                }
                match kind {
                    GestureKind::Next => {
                        self.nav.next_track();
                    }
                    GestureKind::Previous => {
                        self.nav.prev_track();
                    }
                }
                self.play_current();
            }
            TimerMsg::Progress { token } => {
                if token != self.progress_token || self.state != PlayerState::Playing {
                    return;
                }
                self.publish();
                self.timer.schedule(self.config.progress_interval, timer);
            }
        }
    }

    fn on_resource_event(&mut self, generation: u64, event: ResourceEvent) {
        if self.session.as_ref().map(|s| s.generation) != Some(generation) {
            debug!("dropping {event:?} from stale generation {generation}");
            return;
        }
        match event {
            ResourceEvent::Prepared => {
                if self.state != PlayerState::Preparing {
                    return;
                }
                self.consecutive_errors = 0;
                self.state = PlayerState::Prepared;
                if self.autostart {
                    self.resume();
                } else {
                    self.apply_volume();
                    self.publish();
                }
            }
            ResourceEvent::Started => debug!("generation {generation} started"),
            ResourceEvent::Completed => {
                self.consecutive_errors = 0;
                self.on_track_complete(false);
            }
            ResourceEvent::Error(message) => self.on_resource_error(&message),
        }
    }

    fn on_resource_error(&mut self, message: &str) {
        let locator = self
            .now_playing
            .as_ref()
            .map(|np| np.locator.display().to_string())
            .unwrap_or_default();
        warn!("playback error on {locator}: {message}");

        self.release_session();
        self.cancel_progress();
        self.now_playing = None;
        self.state = PlayerState::Error;
        self.publish();

        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.config.max_consecutive_errors.max(1) {
            warn!(
                "{} consecutive playback errors, stopping",
                self.consecutive_errors
            );
            self.stop();
            return;
        }
        self.on_track_complete(true);
    }

    /// Decide what follows the current track. `forced` skips past a failed
    /// track, so repeat-one advances instead of retrying it.
    fn on_track_complete(&mut self, forced: bool) {
        let shuffle = self.nav.is_shuffle_on();
        match self.nav.repeat_mode() {
            RepeatMode::One if !forced => self.play_current(),
            RepeatMode::None => {
                if shuffle {
                    if self.nav.shuffle_pick_no_repeat().is_some() {
                        self.play_current();
                    } else {
                        info!("shuffle cycle finished");
                        self.nav.reset_played();
                        self.stop();
                    }
                } else if self.nav.is_last() {
                    info!("reached the end of the library");
                    self.stop();
                } else {
                    self.nav.next_track();
                    self.play_current();
                }
            }
            _ => {
                if shuffle {
                    self.nav.shuffle_pick();
                } else {
                    self.nav.next_track();
                }
                self.play_current();
            }
        }
    }

    fn on_focus_change(&mut self, change: FocusChange) {
        debug!("audio focus: {change:?}");
        match change {
            FocusChange::Loss => {
                self.focus_held = false;
                self.resume_on_gain = false;
                self.ducked = false;
                self.apply_volume();
                self.pause_output();
            }
            FocusChange::LossTransient => match self.state {
                PlayerState::Playing => {
                    self.pause_output();
                    self.resume_on_gain = true;
                }
                // Hold the prepare in Prepared until focus returns.
                PlayerState::Preparing if self.autostart => {
                    self.autostart = false;
                    self.resume_on_gain = true;
                }
                _ => {}
            },
            FocusChange::LossTransientCanDuck => {
                self.ducked = true;
                self.apply_volume();
            }
            FocusChange::Gain => {
                self.focus_held = true;
                if self.ducked {
                    self.ducked = false;
                    self.apply_volume();
                }
                if !std::mem::take(&mut self.resume_on_gain) {
                    return;
                }
                match self.state {
                    PlayerState::Paused | PlayerState::Prepared => self.resume(),
                    PlayerState::Preparing => self.autostart = true,
                    _ => {}
                }
            }
        }
    }

    fn on_metadata(&mut self, generation: u64, now_playing: NowPlaying) {
        if self.session.as_ref().map(|s| s.generation) != Some(generation) {
            debug!("dropping metadata for stale generation {generation}");
            return;
        }
        self.now_playing = Some(now_playing);
        self.publish();
    }

    fn play_current(&mut self) {
        let Some(track) = self.nav.current().cloned() else {
            debug!("nothing to play");
            return;
        };
        if !self.ensure_focus() {
            warn!("audio focus denied, not starting playback");
            return;
        }
        self.start_track(track);
    }

    /// Tear down any live resource and prepare a fresh one for `track`.
    fn start_track(&mut self, track: Track) {
        self.release_session();
        self.cancel_progress();

        self.generation += 1;
        let generation = self.generation;
        self.now_playing = Some(NowPlaying::from_track(&track));

        let events = ResourceEvents::new(generation, self.tx.clone());
        let mut resource = match self.factory.create(events) {
            Ok(resource) => resource,
            Err(e) => return self.on_resource_error(&e.to_string()),
        };
        if let Err(e) = resource.set_source(&track.locator) {
            resource.release();
            return self.on_resource_error(&e.to_string());
        }
        resource.prepare_async();

        self.session = Some(Session {
            resource,
            generation,
        });
        self.state = PlayerState::Preparing;
        self.autostart = true;
        info!("preparing {}", track.locator.display());
        self.publish();
        self.refine_metadata(generation, track);
    }

    fn resume(&mut self) {
        if !self.ensure_focus() {
            warn!("audio focus denied, staying paused");
            return;
        }
        if self.session.is_none() {
            return self.play_current();
        }
        let volume = self.effective_volume();
        if let Some(session) = self.session.as_mut() {
            session.resource.set_volume(volume);
            session.resource.start();
        }
        self.state = PlayerState::Playing;
        self.resume_on_gain = false;
        self.start_progress();
        self.publish();
    }

    fn pause_output(&mut self) {
        match self.state {
            PlayerState::Playing => {
                if let Some(session) = self.session.as_mut() {
                    session.resource.pause();
                }
                self.state = PlayerState::Paused;
                self.cancel_progress();
                self.publish();
            }
            PlayerState::Preparing => self.autostart = false,
            _ => {}
        }
    }

    fn ensure_focus(&mut self) -> bool {
        if !self.focus_held {
            self.focus_held = self.focus.request();
        }
        self.focus_held
    }

    fn effective_volume(&self) -> f32 {
        if self.ducked {
            self.config.duck_volume
        } else {
            self.config.volume
        }
    }

    fn apply_volume(&mut self) {
        let volume = self.effective_volume();
        if let Some(session) = self.session.as_mut() {
            session.resource.set_volume(volume);
        }
    }

    fn known_duration(&self) -> Option<u64> {
        self.session
            .as_ref()
            .and_then(|s| s.resource.duration_ms())
            .or_else(|| self.now_playing.as_ref().map(|np| np.duration_ms))
            .filter(|&d| d > 0)
    }

    fn release_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.resource.release();
        }
    }

    fn start_progress(&mut self) {
        self.progress_token += 1;
        self.timer.schedule(
            self.config.progress_interval,
            TimerMsg::Progress {
                token: self.progress_token,
            },
        );
    }

    fn cancel_progress(&mut self) {
        self.progress_token += 1;
    }

    fn refine_metadata(&self, generation: u64, track: Track) {
        if !self.config.refine_metadata {
            return;
        }
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("cadenza-metadata".to_string())
            .spawn(move || {
                let meta = library::extract(&track.locator);
                let now_playing = NowPlaying {
                    title: meta.title,
                    artist: meta.artist,
                    album: meta.album,
                    duration_ms: if meta.duration_ms > 0 {
                        meta.duration_ms
                    } else {
                        track.duration_ms
                    },
                    cover_path: track.cover_path,
                    locator: track.locator,
                };
                let _ = tx.send(ControlMsg::MetadataReady {
                    generation,
                    now_playing,
                });
            });
        if let Err(e) = spawned {
            warn!("failed to spawn metadata thread: {e}");
        }
    }
}
