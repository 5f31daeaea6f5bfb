//! The playback resource seam: one decoder/output pipeline per track.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use thiserror::Error;

use super::types::ControlMsg;

/// Callbacks a resource reports back to the control thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Prepared,
    Started,
    Completed,
    Error(String),
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no source set")]
    NoSource,

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("seek failed: {0}")]
    Seek(String),
}

/// Posts events for one resource, tagged with the generation it was created for.
#[derive(Debug, Clone)]
pub struct ResourceEvents {
    generation: u64,
    tx: Sender<ControlMsg>,
}

impl ResourceEvents {
    pub fn new(generation: u64, tx: Sender<ControlMsg>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the control thread has gone away.
    pub fn emit(&self, event: ResourceEvent) -> bool {
        self.tx
            .send(ControlMsg::Resource {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// A single-use player for one locator.
///
/// `prepare_async` must report `Prepared` or `Error` through the events the
/// resource was created with, never synchronously through the caller.
pub trait PlaybackResource {
    fn set_source(&mut self, locator: &Path) -> Result<(), ResourceError>;
    fn prepare_async(&mut self);
    fn start(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position_ms: u64) -> Result<(), ResourceError>;
    fn position_ms(&self) -> u64;
    /// Total length once known.
    fn duration_ms(&self) -> Option<u64>;
    fn set_volume(&mut self, volume: f32);
    /// Stop emitting events and free the output; the resource is dead afterwards.
    fn release(&mut self);
}

pub trait ResourceFactory {
    type Resource: PlaybackResource;

    fn create(&mut self, events: ResourceEvents) -> Result<Self::Resource, ResourceError>;
}
