use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::warn;

use super::gesture::GestureKind;
use super::types::ControlMsg;

/// Deferred work posted back to the control thread.
///
/// Tokens let the receiver drop timers that were superseded after scheduling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerMsg {
    Gesture { kind: GestureKind, token: u64 },
    Progress { token: u64 },
}

/// Fire-once scheduling; cancellation is by token on the receiving side.
pub trait Schedule {
    fn schedule(&mut self, delay: Duration, msg: TimerMsg);
}

/// Sleeps on a short-lived thread, then posts `ControlMsg::Timer`.
#[derive(Debug, Clone)]
pub struct ThreadTimer {
    tx: Sender<ControlMsg>,
}

impl ThreadTimer {
    pub fn new(tx: Sender<ControlMsg>) -> Self {
        Self { tx }
    }
}

impl Schedule for ThreadTimer {
    fn schedule(&mut self, delay: Duration, msg: TimerMsg) {
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("cadenza-timer".to_string())
            .spawn(move || {
                thread::sleep(delay);
                let _ = tx.send(ControlMsg::Timer(msg));
            });
        if let Err(e) = spawned {
            warn!("failed to spawn timer thread for {msg:?}: {e}");
        }
    }
}
