use std::path::{Path, PathBuf};

/// Identifies a folder within one `LibraryIndex`. Not stable across rescans.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub locator: PathBuf,
    /// File name as found on disk; also the sort key within a folder.
    pub display_name: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub folder_id: FolderId,
    pub cover_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Slash-separated path starting at the root's name, e.g. `Music/Rock/Album`.
    pub path: String,
    pub cover_path: Option<PathBuf>,
    pub sort_order: u32,
    /// Positions in `LibraryIndex::tracks`, in navigation order.
    pub tracks: Vec<usize>,
}

/// Per-track metadata as read from tags, or degraded to the file name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub cover_bytes: Option<Vec<u8>>,
}

/// Folders and tracks in navigation order, plus the derived track -> folder map.
///
/// Built once and never mutated; installing a new library replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryIndex {
    root: PathBuf,
    folders: Vec<Folder>,
    tracks: Vec<Track>,
    track_to_folder: Vec<usize>,
}

impl LibraryIndex {
    /// Build an index, deriving the reverse lookup from `folders[*].tracks`.
    ///
    /// Callers must ensure every track appears in exactly one folder.
    pub fn new(root: PathBuf, folders: Vec<Folder>, tracks: Vec<Track>) -> Self {
        let mut track_to_folder = vec![0; tracks.len()];
        for (fi, folder) in folders.iter().enumerate() {
            for &ti in &folder.tracks {
                if let Some(slot) = track_to_folder.get_mut(ti) {
                    *slot = fi;
                }
            }
        }
        Self {
            root,
            folders,
            tracks,
            track_to_folder,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// O(1) lookup of the folder position owning `track_index`.
    pub fn folder_index_of(&self, track_index: usize) -> Option<usize> {
        self.track_to_folder.get(track_index).copied()
    }

    pub fn position_of(&self, locator: &Path) -> Option<usize> {
        self.tracks.iter().position(|t| t.locator == locator)
    }
}
