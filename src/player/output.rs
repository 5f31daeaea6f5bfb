//! `rodio`-backed playback resources.
//!
//! The factory owns the default output stream; every resource gets its own
//! `Sink` on that stream's mixer. Decoding and end-of-track detection run on
//! one background thread per resource.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::resource::{PlaybackResource, ResourceError, ResourceEvent, ResourceEvents, ResourceFactory};

const WATCH_INTERVAL: Duration = Duration::from_millis(200);

pub struct RodioFactory {
    stream: OutputStream,
}

impl RodioFactory {
    /// Open the default output device.
    pub fn open() -> Result<Self, ResourceError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| ResourceError::Output(e.to_string()))?;
        // rodio reports the drop on stderr otherwise.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl ResourceFactory for RodioFactory {
    type Resource = RodioResource;

    fn create(&mut self, events: ResourceEvents) -> Result<RodioResource, ResourceError> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        Ok(RodioResource {
            sink: Arc::new(sink),
            events,
            locator: None,
            duration: Arc::new(Mutex::new(None)),
            released: Arc::new(AtomicBool::new(false)),
        })
    }
}

pub struct RodioResource {
    sink: Arc<Sink>,
    events: ResourceEvents,
    locator: Option<PathBuf>,
    duration: Arc<Mutex<Option<Duration>>>,
    released: Arc<AtomicBool>,
}

fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, ResourceError> {
    let file = File::open(path).map_err(|source| ResourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| ResourceError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl PlaybackResource for RodioResource {
    fn set_source(&mut self, locator: &Path) -> Result<(), ResourceError> {
        if !locator.is_file() {
            return Err(ResourceError::Open {
                path: locator.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.locator = Some(locator.to_path_buf());
        Ok(())
    }

    fn prepare_async(&mut self) {
        let Some(path) = self.locator.clone() else {
            self.events.emit(ResourceEvent::Error(ResourceError::NoSource.to_string()));
            return;
        };
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let duration = Arc::clone(&self.duration);
        let released = Arc::clone(&self.released);

        let spawned = thread::Builder::new()
            .name("cadenza-decode".to_string())
            .spawn(move || {
                let source = match open_source(&path) {
                    Ok(source) => source,
                    Err(e) => {
                        events.emit(ResourceEvent::Error(e.to_string()));
                        return;
                    }
                };
                if let Ok(mut d) = duration.lock() {
                    *d = source.total_duration();
                }
                sink.append(source);
                if released.load(Ordering::Acquire) || !events.emit(ResourceEvent::Prepared) {
                    return;
                }

                // The sink drains its queue once the decoder is exhausted.
                loop {
                    thread::sleep(WATCH_INTERVAL);
                    if released.load(Ordering::Acquire) {
                        return;
                    }
                    if sink.empty() {
                        events.emit(ResourceEvent::Completed);
                        return;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("failed to spawn decoder thread: {e}");
            self.events.emit(ResourceEvent::Error(e.to_string()));
        }
    }

    fn start(&mut self) {
        self.sink.play();
        self.events.emit(ResourceEvent::Started);
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        // An emptied sink must not read as a completed track.
        self.released.store(true, Ordering::Release);
        self.sink.stop();
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), ResourceError> {
        self.sink
            .try_seek(Duration::from_millis(position_ms))
            .map_err(|e| ResourceError::Seek(e.to_string()))
    }

    fn position_ms(&self) -> u64 {
        self.sink.get_pos().as_millis() as u64
    }

    fn duration_ms(&self) -> Option<u64> {
        self.duration
            .lock()
            .ok()
            .and_then(|d| *d)
            .map(|d| d.as_millis() as u64)
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn release(&mut self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!("releasing output for generation {}", self.events.generation());
        }
        self.sink.stop();
    }
}

impl Drop for RodioResource {
    fn drop(&mut self) {
        self.release();
    }
}
