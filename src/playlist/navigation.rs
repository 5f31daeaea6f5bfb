//! Current position, shuffle and repeat state over an installed `LibraryIndex`.
//!
//! Navigation never touches the playback resource; it only answers "which
//! track comes next" and moves `current_index` accordingly.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::library::{LibraryIndex, Track};

use super::types::RepeatMode;

/// Tracks not yet heard in the current shuffle cycle.
///
/// `remaining` holds unplayed indices; `slot[i]` is the position of `i` in
/// `remaining`, or `usize::MAX` once `i` has been played.
#[derive(Debug)]
struct ShuffleCycle {
    remaining: Vec<usize>,
    slot: Vec<usize>,
}

impl ShuffleCycle {
    fn new(n: usize) -> Self {
        Self {
            remaining: (0..n).collect(),
            slot: (0..n).collect(),
        }
    }

    fn mark_played(&mut self, i: usize) {
        let Some(&pos) = self.slot.get(i) else {
            return;
        };
        if pos == usize::MAX {
            return;
        }
        self.remaining.swap_remove(pos);
        if let Some(&moved) = self.remaining.get(pos) {
            self.slot[moved] = pos;
        }
        self.slot[i] = usize::MAX;
    }

    fn played_count(&self) -> usize {
        self.slot.len() - self.remaining.len()
    }
}

pub struct Navigation {
    index: Arc<LibraryIndex>,
    current_index: usize,
    shuffle_on: bool,
    repeat_mode: RepeatMode,
    cycle: Option<ShuffleCycle>,
    rng: StdRng,
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigation {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Build with an explicit RNG (deterministic shuffles in tests).
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            index: Arc::new(LibraryIndex::empty()),
            current_index: 0,
            shuffle_on: false,
            repeat_mode: RepeatMode::None,
            cycle: None,
            rng,
        }
    }

    /// Replace the library wholesale; position resets to the first track.
    pub fn install(&mut self, index: Arc<LibraryIndex>) {
        self.index = index;
        self.current_index = 0;
        self.cycle = None;
    }

    pub fn library(&self) -> &Arc<LibraryIndex> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_shuffle_on(&self) -> bool {
        self.shuffle_on
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.len()
    }

    pub fn current(&self) -> Option<&Track> {
        self.index.track(self.current_index)
    }

    pub fn next_track(&mut self) -> Option<&Track> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        self.current_index = (self.current_index + 1) % n;
        self.current()
    }

    pub fn prev_track(&mut self) -> Option<&Track> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        self.current_index = if self.current_index == 0 {
            n - 1
        } else {
            self.current_index - 1
        };
        self.current()
    }

    /// Jump to the first track of the folder after the current one (wrapping).
    pub fn next_folder(&mut self) -> Option<&Track> {
        let count = self.index.folders().len();
        if count == 0 || self.is_empty() {
            return None;
        }
        let target = match self.index.folder_index_of(self.current_index) {
            Some(fi) => (fi + 1) % count,
            None => 0,
        };
        self.jump_to_folder(target)
    }

    /// Jump to the first track of the folder before the current one (wrapping).
    pub fn prev_folder(&mut self) -> Option<&Track> {
        let count = self.index.folders().len();
        if count == 0 || self.is_empty() {
            return None;
        }
        let target = match self.index.folder_index_of(self.current_index) {
            Some(0) | None => count - 1,
            Some(fi) => fi - 1,
        };
        self.jump_to_folder(target)
    }

    fn jump_to_folder(&mut self, folder_index: usize) -> Option<&Track> {
        let first = self.index.folders()[folder_index]
            .tracks
            .first()
            .copied()
            .unwrap_or(0);
        self.current_index = first;
        self.current()
    }

    /// Uniform pick over every index except the current one.
    pub fn shuffle_pick(&mut self) -> Option<&Track> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if n > 1 {
            // Draw from n-1 values and step over the current index.
            let r = self.rng.gen_range(0..n - 1);
            self.current_index = if r >= self.current_index { r + 1 } else { r };
        }
        self.current()
    }

    /// Like `shuffle_pick` but never revisits a track within one cycle.
    ///
    /// Returns `None` once every track has been played; the cycle stays
    /// exhausted until shuffle is toggled, a library is installed, or
    /// `reset_played` is called.
    pub fn shuffle_pick_no_repeat(&mut self) -> Option<&Track> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let current = self.current_index;
        let cycle = self.cycle.get_or_insert_with(|| ShuffleCycle::new(n));
        cycle.mark_played(current);
        if cycle.remaining.is_empty() {
            return None;
        }
        let r = self.rng.gen_range(0..cycle.remaining.len());
        self.current_index = cycle.remaining[r];
        self.current()
    }

    pub fn played_count(&self) -> usize {
        self.cycle.as_ref().map_or(0, ShuffleCycle::played_count)
    }

    pub fn reset_played(&mut self) {
        self.cycle = None;
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle_on = !self.shuffle_on;
        self.reset_played();
        self.shuffle_on
    }

    pub fn set_shuffle(&mut self, on: bool) {
        if self.shuffle_on != on {
            self.toggle_shuffle();
        }
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    /// Move to `index`; out-of-range values are ignored.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index < self.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }
}
