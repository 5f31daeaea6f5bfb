use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::config::Settings;
use crate::player::{
    ControlMsg, ControllerConfig, PlayerController, PlayerEvent, PlayerState, ResourceError,
    RodioFactory, Snapshot,
};

mod commands;
mod event_loop;
mod settings;
mod startup;

use event_loop::ControlLoop;
use startup::StartupPlan;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let requested_root = env::args_os().nth(1).map(PathBuf::from);

    let (tx, rx) = mpsc::channel::<ControlMsg>();
    let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();
    let logger = spawn_event_logger(event_rx)?;

    let plan = startup::plan(
        &settings.cache_path(),
        requested_root,
        settings.library.root.clone(),
    );
    let scrub_seconds = settings.controls.scrub_seconds;
    let control = spawn_control_thread(settings, plan, tx.clone(), rx, event_tx)?;

    info!("{}", commands::HELP);
    read_commands(&tx, scrub_seconds);
    let _ = tx.send(ControlMsg::Quit);
    drop(tx);

    let result = control
        .join()
        .map_err(|_| "control thread panicked")?;
    let _ = logger.join();
    result.map_err(Into::into)
}

/// The control thread owns the output device and every player mutation.
fn spawn_control_thread(
    settings: Settings,
    plan: StartupPlan,
    tx: Sender<ControlMsg>,
    rx: Receiver<ControlMsg>,
    events: Sender<PlayerEvent>,
) -> io::Result<JoinHandle<Result<(), ResourceError>>> {
    thread::Builder::new()
        .name("cadenza-control".to_string())
        .spawn(move || -> Result<(), ResourceError> {
            let factory = RodioFactory::open().inspect_err(|e| error!("{e}"))?;
            let mut player = PlayerController::new(
                ControllerConfig::from_settings(&settings),
                factory,
                tx.clone(),
                events.clone(),
            );
            let mut control = ControlLoop::new(&settings, tx.clone(), events);

            match plan {
                StartupPlan::Cached(index) => player.install_index(Arc::new(index)),
                StartupPlan::Scan(root) => {
                    let _ = tx.send(ControlMsg::Scan(Some(root)));
                }
                StartupPlan::Unavailable(root) => control.library_unavailable(&mut player, root),
                StartupPlan::NoRoot => info!("no library configured; use `scan <path>`"),
            }
            drop(tx);

            control.run(&mut player, &rx);
            debug!("control thread exiting");
            Ok(())
        })
}

/// Forward stdin lines to the control thread until EOF, `quit`, or a closed channel.
fn read_commands(tx: &Sender<ControlMsg>, scrub_seconds: u64) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to read command: {e}");
                break;
            }
        };
        match commands::parse_command(&line, scrub_seconds) {
            Ok(Some(msg)) => {
                let quit = matches!(msg, ControlMsg::Quit);
                if tx.send(msg).is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e}; {}", commands::HELP),
        }
    }
}

fn describe(snap: &Snapshot) -> String {
    let Some(np) = &snap.now_playing else {
        return format!("{:?}", snap.state);
    };
    let who = if np.artist.is_empty() {
        np.title.clone()
    } else {
        format!("{} - {}", np.artist, np.title)
    };
    format!(
        "{:?}: {who} [{}/{}]",
        snap.state,
        format_ms(snap.position_ms),
        format_ms(snap.duration_ms)
    )
}

fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Consumer for player events; stands in for UI and notification collaborators.
fn spawn_event_logger(rx: Receiver<PlayerEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cadenza-events".to_string())
        .spawn(move || {
            let mut last: Option<(PlayerState, Option<usize>)> = None;
            for event in rx {
                match event {
                    PlayerEvent::StateChanged(snap) => {
                        let key = (snap.state, snap.index);
                        if last != Some(key) {
                            info!("{}", describe(&snap));
                            last = Some(key);
                        } else {
                            debug!("{}", describe(&snap));
                        }
                    }
                    PlayerEvent::ScanStarted { root } => info!("scan started: {}", root.display()),
                    PlayerEvent::ScanCompleted { tracks, folders } => {
                        info!("library ready: {tracks} tracks in {folders} folders")
                    }
                    PlayerEvent::LibraryUnavailable { root } => {
                        error!("library at {} is unavailable; run `scan <path>`", root.display())
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::NowPlaying;

    #[test]
    fn format_ms_renders_minutes_and_seconds() {
        assert_eq!(format_ms(0), "0:00");
        assert_eq!(format_ms(61_500), "1:01");
        assert_eq!(format_ms(3_600_000), "60:00");
    }

    #[test]
    fn describe_includes_artist_when_known() {
        let mut snap = Snapshot {
            state: PlayerState::Playing,
            now_playing: Some(NowPlaying {
                title: "Song".to_string(),
                artist: "Band".to_string(),
                ..NowPlaying::default()
            }),
            position_ms: 5_000,
            duration_ms: 125_000,
            ..Snapshot::default()
        };
        assert_eq!(describe(&snap), "Playing: Band - Song [0:05/2:05]");

        snap.now_playing = None;
        snap.state = PlayerState::Idle;
        assert_eq!(describe(&snap), "Idle");
    }
}
