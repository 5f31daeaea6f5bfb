use super::load::{default_config_path, default_data_dir, resolve_config_path};
use super::schema::*;
use crate::playlist::RepeatMode;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_cadenza_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", "/tmp/cadenza-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/cadenza-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn default_data_dir_falls_back_to_home_local_share() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_DATA_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_data_dir().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".local/share")
            .join("cadenza")
    );
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(
        s.library.extensions,
        vec!["mp3", "ogg", "flac", "aac", "m4a", "opus"]
    );
    assert_eq!(s.controls.double_tap_ms, 500);
    assert_eq!(s.playback.repeat_mode, RepeatMode::None);
    assert!(!s.playback.shuffle);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    s.playback.duck_volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.double_tap_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.progress_interval_ms = 0;
    assert!(s.validate().is_err());
}

#[test]
fn settings_load_from_config_file_and_parse_repeat_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
shuffle = true
repeat_mode = "repeat-one"
volume = 0.8
duck_volume = 0.2
max_consecutive_errors = 5

[controls]
double_tap_ms = 750
scrub_seconds = 15

[library]
root = "/music"
extensions = ["mp3"]
include_hidden = true
follow_links = false
data_dir = "/tmp/cadenza-data"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CADENZA__CONTROLS__DOUBLE_TAP_MS");

    let s = Settings::load().unwrap();
    assert!(s.playback.shuffle);
    assert_eq!(s.playback.repeat_mode, RepeatMode::One);
    assert_eq!(s.playback.volume, 0.8);
    assert_eq!(s.playback.duck_volume, 0.2);
    assert_eq!(s.playback.max_consecutive_errors, 5);
    assert_eq!(s.controls.double_tap_ms, 750);
    assert_eq!(s.controls.scrub_seconds, 15);
    assert_eq!(s.library.root, Some(std::path::PathBuf::from("/music")));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(
        s.cache_path(),
        std::path::PathBuf::from("/tmp/cadenza-data/scan_cache.json")
    );
    assert_eq!(
        s.covers_dir(),
        std::path::PathBuf::from("/tmp/cadenza-data/covers")
    );
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
double_tap_ms = 1000
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CADENZA__CONTROLS__DOUBLE_TAP_MS", "300");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.double_tap_ms, 300);
}
