use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use log::{info, warn};

use crate::config::Settings;
use crate::library::{self, LibraryIndex, ScanError, Scanner};
use crate::player::{ControlMsg, PlayerController, PlayerEvent, ResourceFactory};

/// Library-level state the control thread keeps beside the player.
pub struct ControlLoop {
    scanner: Scanner,
    cache_path: PathBuf,
    configured_root: Option<PathBuf>,
    scanning: bool,
    tx: Sender<ControlMsg>,
    events: Sender<PlayerEvent>,
}

impl ControlLoop {
    pub fn new(settings: &Settings, tx: Sender<ControlMsg>, events: Sender<PlayerEvent>) -> Self {
        let cache_path = settings.cache_path();
        Self {
            scanner: Scanner::new(
                settings.library.clone(),
                settings.covers_dir(),
                Some(cache_path.clone()),
            ),
            cache_path,
            configured_root: settings.library.root.clone(),
            scanning: false,
            tx,
            events,
        }
    }

    /// Drain control messages until `Quit` arrives or every sender is gone.
    pub fn run<F: ResourceFactory>(&mut self, player: &mut PlayerController<F>, rx: &Receiver<ControlMsg>) {
        while let Ok(msg) = rx.recv() {
            if !self.handle(player, msg) {
                break;
            }
        }
        player.stop();
    }

    /// Returns `false` when the loop should exit.
    pub fn handle<F: ResourceFactory>(&mut self, player: &mut PlayerController<F>, msg: ControlMsg) -> bool {
        match msg {
            ControlMsg::Scan(root) => {
                let root = root
                    .or_else(|| {
                        let current = player.navigation().library().root();
                        (!current.as_os_str().is_empty()).then(|| current.to_path_buf())
                    })
                    .or_else(|| self.configured_root.clone());
                match root {
                    Some(root) => self.start_scan(player, root),
                    None => warn!("no library root to scan; use `scan <path>`"),
                }
            }
            ControlMsg::ScanFinished { root, result } => {
                self.scanning = false;
                self.finish_scan(player, root, result);
            }
            ControlMsg::Status => {
                let snap = player.snapshot();
                info!(
                    "{:?} track {} of {} shuffle={} repeat={:?}",
                    snap.state,
                    snap.index.map_or(0, |i| i + 1),
                    player.navigation().len(),
                    snap.shuffle,
                    snap.repeat_mode
                );
                player.publish();
            }
            ControlMsg::Quit => return false,
            other => player.handle(other),
        }
        true
    }

    /// Stop playback and scan `root` on a background thread.
    fn start_scan<F: ResourceFactory>(&mut self, player: &mut PlayerController<F>, root: PathBuf) {
        if self.scanning {
            warn!("scan already running, ignoring request for {}", root.display());
            return;
        }
        player.stop();
        self.scanning = true;
        let _ = self.events.send(PlayerEvent::ScanStarted { root: root.clone() });
        info!("scanning {}", root.display());

        let scanner = self.scanner.clone();
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("cadenza-scan".to_string())
            .spawn(move || {
                let result = scanner.scan(&root);
                let _ = tx.send(ControlMsg::ScanFinished { root, result });
            });
        if let Err(e) = spawned {
            warn!("failed to spawn scan thread: {e}");
            self.scanning = false;
        }
    }

    fn finish_scan<F: ResourceFactory>(
        &mut self,
        player: &mut PlayerController<F>,
        root: PathBuf,
        result: Result<LibraryIndex, ScanError>,
    ) {
        match result {
            Ok(index) => {
                let (tracks, folders) = (index.len(), index.folders().len());
                player.install_index(Arc::new(index));
                let _ = self.events.send(PlayerEvent::ScanCompleted { tracks, folders });
            }
            Err(e) => {
                warn!("{e}");
                self.library_unavailable(player, root);
            }
        }
    }

    /// Forget the library at `root`: cleared cache, empty index, no rescan.
    pub fn library_unavailable<F: ResourceFactory>(&mut self, player: &mut PlayerController<F>, root: PathBuf) {
        library::clear_cache(&self.cache_path);
        player.install_index(Arc::new(LibraryIndex::empty()));
        let _ = self.events.send(PlayerEvent::LibraryUnavailable { root });
    }
}
