//! Line-oriented command surface read from standard input.

use std::path::PathBuf;

use thiserror::Error;

use crate::player::{ControlMsg, FocusChange, PlayerCmd};
use crate::playlist::RepeatMode;

pub const HELP: &str = "commands: play, pause, toggle, stop, next, prev, seek <ms>, ff, rw, \
shuffle, repeat <none|one|all>, track <n>, open <path>, scan [path], \
focus <gain|loss|transient|duck>, status, quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid argument for '{command}': {value}")]
    InvalidArgument { command: &'static str, value: String },
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// `track <n>` is 1-based; `ff`/`rw` scrub by `scrub_seconds`.
pub fn parse_command(line: &str, scrub_seconds: u64) -> Result<Option<ControlMsg>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then_some(rest);
    let scrub = scrub_seconds as i64;

    let cmd = match word.to_ascii_lowercase().as_str() {
        "play" => PlayerCmd::Play,
        "pause" => PlayerCmd::Pause,
        "toggle" | "pp" => PlayerCmd::PlayPause,
        "stop" => PlayerCmd::Stop,
        "next" | "n" => PlayerCmd::Next,
        "prev" | "previous" | "p" => PlayerCmd::Previous,
        "ff" => PlayerCmd::SeekBy(scrub),
        "rw" => PlayerCmd::SeekBy(-scrub),
        "shuffle" => PlayerCmd::ToggleShuffle,
        "seek" => {
            let value = arg.ok_or(CommandError::MissingArgument("seek"))?;
            let ms = value.parse::<u64>().map_err(|_| CommandError::InvalidArgument {
                command: "seek",
                value: value.to_string(),
            })?;
            PlayerCmd::Seek(ms)
        }
        "repeat" => {
            let value = arg.ok_or(CommandError::MissingArgument("repeat"))?;
            let mode = RepeatMode::parse(value).ok_or_else(|| CommandError::InvalidArgument {
                command: "repeat",
                value: value.to_string(),
            })?;
            PlayerCmd::SetRepeatMode(mode)
        }
        "track" => {
            let value = arg.ok_or(CommandError::MissingArgument("track"))?;
            let n = value
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| CommandError::InvalidArgument {
                    command: "track",
                    value: value.to_string(),
                })?;
            PlayerCmd::PlayTrackAt(n - 1)
        }
        "open" => {
            let value = arg.ok_or(CommandError::MissingArgument("open"))?;
            PlayerCmd::PlayLocator(PathBuf::from(value))
        }
        "scan" => return Ok(Some(ControlMsg::Scan(arg.map(PathBuf::from)))),
        "focus" => {
            let value = arg.ok_or(CommandError::MissingArgument("focus"))?;
            let change = FocusChange::parse(value).ok_or_else(|| CommandError::InvalidArgument {
                command: "focus",
                value: value.to_string(),
            })?;
            return Ok(Some(ControlMsg::Focus(change)));
        }
        "status" => return Ok(Some(ControlMsg::Status)),
        "quit" | "exit" | "q" => return Ok(Some(ControlMsg::Quit)),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(ControlMsg::Command(cmd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> PlayerCmd {
        match parse_command(line, 10) {
            Ok(Some(ControlMsg::Command(cmd))) => cmd,
            other => panic!("expected player command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn simple_commands() {
        assert_eq!(cmd("play"), PlayerCmd::Play);
        assert_eq!(cmd("  PAUSE "), PlayerCmd::Pause);
        assert_eq!(cmd("toggle"), PlayerCmd::PlayPause);
        assert_eq!(cmd("stop"), PlayerCmd::Stop);
        assert_eq!(cmd("next"), PlayerCmd::Next);
        assert_eq!(cmd("prev"), PlayerCmd::Previous);
        assert_eq!(cmd("shuffle"), PlayerCmd::ToggleShuffle);
    }

    #[test]
    fn scrub_uses_configured_step() {
        assert_eq!(cmd("ff"), PlayerCmd::SeekBy(10));
        assert_eq!(cmd("rw"), PlayerCmd::SeekBy(-10));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(cmd("seek 1500"), PlayerCmd::Seek(1500));
        assert_eq!(cmd("repeat one"), PlayerCmd::SetRepeatMode(RepeatMode::One));
        assert_eq!(cmd("track 1"), PlayerCmd::PlayTrackAt(0));
        assert_eq!(
            cmd("open /music/My Album/01 Song.mp3"),
            PlayerCmd::PlayLocator(PathBuf::from("/music/My Album/01 Song.mp3"))
        );
    }

    #[test]
    fn control_messages() {
        assert!(matches!(parse_command("scan", 10), Ok(Some(ControlMsg::Scan(None)))));
        assert!(matches!(
            parse_command("scan /srv/music", 10),
            Ok(Some(ControlMsg::Scan(Some(p)))) if p == PathBuf::from("/srv/music")
        ));
        assert!(matches!(
            parse_command("focus duck", 10),
            Ok(Some(ControlMsg::Focus(FocusChange::LossTransientCanDuck)))
        ));
        assert!(matches!(parse_command("status", 10), Ok(Some(ControlMsg::Status))));
        assert!(matches!(parse_command("quit", 10), Ok(Some(ControlMsg::Quit))));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert!(matches!(parse_command("   ", 10), Ok(None)));
    }

    #[test]
    fn bad_input_is_reported() {
        assert_eq!(
            parse_command("dance", 10).unwrap_err(),
            CommandError::Unknown("dance".to_string())
        );
        assert_eq!(
            parse_command("seek", 10).unwrap_err(),
            CommandError::MissingArgument("seek")
        );
        assert!(matches!(
            parse_command("seek soon", 10),
            Err(CommandError::InvalidArgument { command: "seek", .. })
        ));
        assert!(matches!(
            parse_command("track 0", 10),
            Err(CommandError::InvalidArgument { command: "track", .. })
        ));
        assert!(matches!(
            parse_command("repeat sometimes", 10),
            Err(CommandError::InvalidArgument { command: "repeat", .. })
        ));
    }
}
