use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::library::{self, LibraryIndex};

/// How the first library gets installed.
#[derive(Debug, PartialEq)]
pub enum StartupPlan {
    /// A live cache for the requested root; no scan needed.
    Cached(LibraryIndex),
    Scan(PathBuf),
    /// The root cannot be read; its cache has been cleared.
    Unavailable(PathBuf),
    /// Nothing configured; wait for a `scan <path>` command.
    NoRoot,
}

/// Decide between the scan cache and a fresh scan.
///
/// The root comes from the command line, else the cache, else the config.
pub fn plan(cache_path: &Path, requested: Option<PathBuf>, configured: Option<PathBuf>) -> StartupPlan {
    let cached = library::load_cache(cache_path);
    let root = requested
        .or_else(|| cached.as_ref().map(|c| c.root().to_path_buf()))
        .or(configured);
    let Some(root) = root else {
        return StartupPlan::NoRoot;
    };

    if !library::root_is_readable(&root) {
        warn!("library root {} is not readable", root.display());
        library::clear_cache(cache_path);
        return StartupPlan::Unavailable(root);
    }

    match cached {
        Some(index) if index.root() == root && !index.is_empty() => {
            if library::cache_is_live(&index) {
                info!(
                    "loaded scan cache: {} tracks in {} folders",
                    index.len(),
                    index.folders().len()
                );
                StartupPlan::Cached(index)
            } else {
                info!("scan cache for {} is stale, rescanning", root.display());
                StartupPlan::Scan(root)
            }
        }
        _ => StartupPlan::Scan(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibrarySettings;
    use crate::library::Scanner;
    use std::fs;
    use tempfile::tempdir;

    fn scanned(music: &Path, cache_path: &Path) -> LibraryIndex {
        fs::create_dir_all(music.join("Album")).unwrap();
        fs::write(music.join("Album/one.mp3"), b"x").unwrap();
        let data = cache_path.parent().unwrap().to_path_buf();
        Scanner::new(
            LibrarySettings::default(),
            data.join("covers"),
            Some(cache_path.to_path_buf()),
        )
        .scan(music)
        .unwrap()
    }

    #[test]
    fn no_root_anywhere() {
        let data = tempdir().unwrap();
        assert_eq!(
            plan(&data.path().join("scan_cache.json"), None, None),
            StartupPlan::NoRoot
        );
    }

    #[test]
    fn live_cache_skips_scan() {
        let music = tempdir().unwrap();
        let data = tempdir().unwrap();
        let cache = data.path().join("scan_cache.json");
        let index = scanned(music.path(), &cache);

        assert_eq!(plan(&cache, None, None), StartupPlan::Cached(index));
    }

    #[test]
    fn configured_root_without_cache_is_scanned() {
        let music = tempdir().unwrap();
        let data = tempdir().unwrap();
        let cache = data.path().join("scan_cache.json");
        assert_eq!(
            plan(&cache, None, Some(music.path().to_path_buf())),
            StartupPlan::Scan(music.path().to_path_buf())
        );
    }

    #[test]
    fn different_requested_root_is_scanned() {
        let music = tempdir().unwrap();
        let other = tempdir().unwrap();
        let data = tempdir().unwrap();
        let cache = data.path().join("scan_cache.json");
        scanned(music.path(), &cache);

        assert_eq!(
            plan(&cache, Some(other.path().to_path_buf()), None),
            StartupPlan::Scan(other.path().to_path_buf())
        );
    }

    #[test]
    fn stale_cache_triggers_rescan() {
        let music = tempdir().unwrap();
        let data = tempdir().unwrap();
        let cache = data.path().join("scan_cache.json");
        scanned(music.path(), &cache);
        fs::remove_file(music.path().join("Album/one.mp3")).unwrap();

        assert_eq!(
            plan(&cache, None, None),
            StartupPlan::Scan(music.path().to_path_buf())
        );
    }

    #[test]
    fn unreadable_root_clears_cache() {
        let music = tempdir().unwrap();
        let data = tempdir().unwrap();
        let cache = data.path().join("scan_cache.json");
        scanned(music.path(), &cache);
        let root = music.path().to_path_buf();
        drop(music);

        assert_eq!(plan(&cache, None, None), StartupPlan::Unavailable(root));
        assert!(!cache.exists());
    }
}
