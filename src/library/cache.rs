//! On-disk snapshot of a `LibraryIndex`, used to skip rescanning on restart.
//!
//! The document holds two ordered arrays: `tracks` and `folders`, where each
//! folder lists positions in `tracks`. Loading validates the structure; any
//! failure removes the file and reports "no cache".

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::error::CacheError;
use super::model::{Folder, FolderId, LibraryIndex, Track};

const CACHE_VERSION: u32 = 1;
/// How many locators the liveness check probes.
const LIVENESS_PROBES: usize = 5;

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    root: PathBuf,
    tracks: Vec<CachedTrack>,
    folders: Vec<CachedFolder>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedTrack {
    locator: PathBuf,
    display_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    cover_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedFolder {
    name: String,
    path: String,
    #[serde(default)]
    cover_path: Option<PathBuf>,
    indices: Vec<usize>,
}

pub fn save_cache(index: &LibraryIndex, path: &Path) -> Result<(), CacheError> {
    let doc = CacheDocument {
        version: CACHE_VERSION,
        root: index.root().to_path_buf(),
        tracks: index
            .tracks()
            .iter()
            .map(|t| CachedTrack {
                locator: t.locator.clone(),
                display_name: t.display_name.clone(),
                title: t.title.clone(),
                artist: t.artist.clone(),
                album: t.album.clone(),
                duration_ms: t.duration_ms,
                cover_path: t.cover_path.clone(),
            })
            .collect(),
        folders: index
            .folders()
            .iter()
            .map(|f| CachedFolder {
                name: f.name.clone(),
                path: f.path.clone(),
                cover_path: f.cover_path.clone(),
                indices: f.tracks.clone(),
            })
            .collect(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Readers only ever see a complete document.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec(&doc)?)?;
    fs::rename(&tmp, path)?;
    debug!("saved scan cache to {}", path.display());
    Ok(())
}

/// Load the cached index, or `None` when there is no usable cache.
///
/// A present but unreadable or inconsistent cache is deleted.
pub fn load_cache(path: &Path) -> Option<LibraryIndex> {
    if !path.exists() {
        return None;
    }
    match read_cache(path) {
        Ok(index) => Some(index),
        Err(e) => {
            warn!("discarding scan cache {}: {e}", path.display());
            clear_cache(path);
            None
        }
    }
}

pub fn clear_cache(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove scan cache {}: {e}", path.display());
        }
    }
}

/// True when at least one of the first few cached locators is still readable.
pub fn cache_is_live(index: &LibraryIndex) -> bool {
    index
        .tracks()
        .iter()
        .take(LIVENESS_PROBES)
        .any(|t| fs::File::open(&t.locator).is_ok())
}

fn read_cache(path: &Path) -> Result<LibraryIndex, CacheError> {
    let raw = fs::read(path)?;
    let doc: CacheDocument = serde_json::from_slice(&raw)?;
    if doc.version != CACHE_VERSION {
        return Err(CacheError::Invalid(format!(
            "unsupported version {}",
            doc.version
        )));
    }
    validate(&doc)?;

    let mut tracks: Vec<Track> = doc
        .tracks
        .into_iter()
        .map(|t| Track {
            locator: t.locator,
            display_name: t.display_name,
            title: t.title,
            artist: t.artist,
            album: t.album,
            duration_ms: t.duration_ms,
            folder_id: FolderId(0),
            cover_path: t.cover_path,
        })
        .collect();

    let folders: Vec<Folder> = doc
        .folders
        .into_iter()
        .enumerate()
        .map(|(order, f)| {
            let id = FolderId(order as u32);
            for &ti in &f.indices {
                if let Some(track) = tracks.get_mut(ti) {
                    track.folder_id = id;
                }
            }
            Folder {
                id,
                name: f.name,
                path: f.path,
                cover_path: f.cover_path,
                sort_order: order as u32,
                tracks: f.indices,
            }
        })
        .collect();

    Ok(LibraryIndex::new(doc.root, folders, tracks))
}

/// Every track must belong to exactly one non-empty folder, and folders must
/// list tracks in flattened order (folder i's tracks precede folder i+1's).
fn validate(doc: &CacheDocument) -> Result<(), CacheError> {
    let n = doc.tracks.len();
    let mut seen = HashSet::with_capacity(n);
    let mut expected = 0usize;
    for folder in &doc.folders {
        if folder.indices.is_empty() {
            return Err(CacheError::Invalid(format!(
                "folder {:?} has no tracks",
                folder.path
            )));
        }
        for &ti in &folder.indices {
            if ti >= n {
                return Err(CacheError::Invalid(format!(
                    "track index {ti} out of range ({n} tracks)"
                )));
            }
            if !seen.insert(ti) {
                return Err(CacheError::Invalid(format!(
                    "track index {ti} listed twice"
                )));
            }
            if ti != expected {
                return Err(CacheError::Invalid(format!(
                    "track index {ti} out of navigation order"
                )));
            }
            expected += 1;
        }
    }
    if seen.len() != n {
        return Err(CacheError::Invalid(format!(
            "{} of {n} tracks belong to no folder",
            n - seen.len()
        )));
    }
    Ok(())
}
