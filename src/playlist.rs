//! Playlist navigation: current position, shuffle, repeat and folder jumps.

mod navigation;
mod types;

pub use navigation::Navigation;
pub use types::RepeatMode;

#[cfg(test)]
mod tests;
