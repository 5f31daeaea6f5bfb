//! Single vs. double activation of next/previous.
//!
//! A first activation only schedules the track step. A second activation of
//! the same kind while that step is still pending replaces it with a folder
//! step. In shuffle mode every activation is a shuffle pick.

use std::time::Duration;

use super::timer::TimerMsg;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Next,
    Previous,
}

impl GestureKind {
    fn slot(self) -> usize {
        match self {
            Self::Next => 0,
            Self::Previous => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureAction {
    Shuffle,
    /// Schedule `msg` after `delay`; the track step happens when it fires.
    Defer { delay: Duration, msg: TimerMsg },
    FolderStep(GestureKind),
}

#[derive(Debug)]
pub struct Disambiguator {
    window: Duration,
    next_token: u64,
    pending: [Option<u64>; 2],
}

impl Disambiguator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            next_token: 0,
            pending: [None, None],
        }
    }

    pub fn on_activate(&mut self, kind: GestureKind, shuffle: bool) -> GestureAction {
        if shuffle {
            self.cancel_all();
            return GestureAction::Shuffle;
        }
        let slot = kind.slot();
        if self.pending[slot].take().is_some() {
            return GestureAction::FolderStep(kind);
        }
        self.next_token += 1;
        let token = self.next_token;
        self.pending[slot] = Some(token);
        GestureAction::Defer {
            delay: self.window,
            msg: TimerMsg::Gesture { kind, token },
        }
    }

    /// True when the fired timer is still the pending one for `kind`.
    pub fn on_timer(&mut self, kind: GestureKind, token: u64) -> bool {
        let slot = kind.slot();
        if self.pending[slot] == Some(token) {
            self.pending[slot] = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, kind: GestureKind) -> bool {
        self.pending[kind.slot()].is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending = [None, None];
    }
}
