use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::cache::save_cache;
use super::cover::CoverStore;
use super::error::ScanError;
use super::metadata::{display_name_of, extract};
use super::model::{Folder, FolderId, LibraryIndex, Track};

/// Lowercased extensions without a leading dot; blanks are dropped.
fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Whether `root` can currently be listed.
pub fn root_is_readable(root: &Path) -> bool {
    fs::read_dir(root).is_ok()
}

/// A directory that directly holds audio files, before sorting.
struct PendingFolder {
    dir: PathBuf,
    name: String,
    path: String,
    files: Vec<(PathBuf, String)>,
}

/// Walks a music root into a `LibraryIndex` and persists it to the scan cache.
#[derive(Debug, Clone)]
pub struct Scanner {
    settings: LibrarySettings,
    extensions: Vec<String>,
    covers_dir: PathBuf,
    cache_path: Option<PathBuf>,
}

impl Scanner {
    pub fn new(settings: LibrarySettings, covers_dir: PathBuf, cache_path: Option<PathBuf>) -> Self {
        Self {
            extensions: normalize_extensions(&settings.extensions),
            settings,
            covers_dir,
            cache_path,
        }
    }

    pub fn scan(&self, root: &Path) -> Result<LibraryIndex, ScanError> {
        let started = Instant::now();
        fs::read_dir(root).map_err(|source| ScanError::RootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut pending = self.collect_folders(root);

        // Folder order, then case-insensitive file order within each folder, is
        // the navigation order; stable sorts keep traversal order for ties.
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        for folder in &mut pending {
            folder.files.sort_by(|(_, a), (_, b)| {
                a.to_lowercase()
                    .cmp(&b.to_lowercase())
                    .then_with(|| a.cmp(b))
            });
        }

        let mut covers = CoverStore::new(&self.covers_dir);
        let mut folders = Vec::with_capacity(pending.len());
        let mut tracks = Vec::new();

        for (order, pf) in pending.into_iter().enumerate() {
            let id = FolderId(order as u32);
            let mut members = Vec::with_capacity(pf.files.len());
            for (path, display_name) in pf.files {
                let meta = extract(&path);
                let cover_path = covers.resolve(meta.cover_bytes.as_deref(), &pf.dir);
                members.push(tracks.len());
                tracks.push(Track {
                    locator: path,
                    display_name,
                    title: meta.title,
                    artist: meta.artist,
                    album: meta.album,
                    duration_ms: meta.duration_ms,
                    folder_id: id,
                    cover_path,
                });
            }
            folders.push(Folder {
                id,
                name: pf.name,
                path: pf.path,
                cover_path: covers.folder_cover(&pf.dir),
                sort_order: order as u32,
                tracks: members,
            });
        }

        let index = LibraryIndex::new(root.to_path_buf(), folders, tracks);
        info!(
            "scan completed: {} tracks in {} folders in {}ms",
            index.len(),
            index.folders().len(),
            started.elapsed().as_millis()
        );

        if let Some(cache_path) = &self.cache_path {
            if let Err(e) = save_cache(&index, cache_path) {
                warn!("failed to save scan cache to {}: {e}", cache_path.display());
            }
        }

        Ok(index)
    }

    /// Depth-first walk grouping audio files by their parent directory.
    fn collect_folders(&self, root: &Path) -> Vec<PendingFolder> {
        let root_name = root
            .file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("Music")
            .to_string();

        let mut pending: Vec<PendingFolder> = Vec::new();
        let mut by_dir: HashMap<PathBuf, usize> = HashMap::new();

        let include_hidden = self.settings.include_hidden;
        let walker = WalkDir::new(root)
            .follow_links(self.settings.follow_links)
            .sort_by_file_name();

        for entry in walker
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !is_audio_file(path, &self.extensions) {
                continue;
            }
            let Some(dir) = path.parent() else {
                continue;
            };

            let slot = match by_dir.get(dir) {
                Some(&slot) => slot,
                None => {
                    let relative = dir.strip_prefix(root).unwrap_or(Path::new(""));
                    let mut folder_path = root_name.clone();
                    for part in relative.components() {
                        folder_path.push('/');
                        folder_path.push_str(&part.as_os_str().to_string_lossy());
                    }
                    let name = if relative.as_os_str().is_empty() {
                        root_name.clone()
                    } else {
                        display_name_of(dir)
                    };
                    pending.push(PendingFolder {
                        dir: dir.to_path_buf(),
                        name,
                        path: folder_path,
                        files: Vec::new(),
                    });
                    by_dir.insert(dir.to_path_buf(), pending.len() - 1);
                    pending.len() - 1
                }
            };
            pending[slot].files.push((path.to_path_buf(), display_name_of(path)));
        }

        pending
    }
}
