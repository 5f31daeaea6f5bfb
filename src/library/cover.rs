//! Cover art resolution: embedded pictures first, then conventional folder images.
//!
//! Embedded art is written once per distinct image into a content-addressed
//! store (`<md5>.<ext>`), so tracks sharing art share a file and the paths
//! survive rescans. Folder art is looked up at most once per folder.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

const COVER_STEMS: &[&str] = &["cover", "folder", "album", "front", "artwork"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

pub struct CoverStore {
    dir: PathBuf,
    folder_covers: HashMap<PathBuf, Option<PathBuf>>,
}

impl CoverStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            folder_covers: HashMap::new(),
        }
    }

    /// Resolve the cover for one track living in `folder`.
    pub fn resolve(&mut self, embedded: Option<&[u8]>, folder: &Path) -> Option<PathBuf> {
        if let Some(bytes) = embedded {
            if let Some(saved) = self.store_embedded(bytes) {
                return Some(saved);
            }
        }
        self.folder_cover(folder)
    }

    /// Persist `bytes` under their content hash; existing files are reused.
    pub fn store_embedded(&self, bytes: &[u8]) -> Option<PathBuf> {
        if bytes.is_empty() {
            return None;
        }
        let name = format!("{:x}.{}", md5::compute(bytes), image_extension(bytes));
        let path = self.dir.join(name);
        if path.exists() {
            return Some(path);
        }
        let written = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, bytes));
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("failed to save embedded cover to {}: {e}", path.display());
                None
            }
        }
    }

    /// Conventional image file directly inside `folder`, cached per folder.
    pub fn folder_cover(&mut self, folder: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.folder_covers.get(folder) {
            return cached.clone();
        }
        let found = find_folder_image(folder);
        if let Some(p) = &found {
            debug!("folder cover for {}: {}", folder.display(), p.display());
        }
        self.folder_covers.insert(folder.to_path_buf(), found.clone());
        found
    }
}

fn find_folder_image(folder: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("failed to scan {} for cover art: {e}", folder.display());
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_cover_name(p))
        .collect();
    // Directory order is unspecified; pick deterministically.
    candidates.sort();
    candidates.into_iter().next()
}

fn is_cover_name(path: &Path) -> bool {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match (stem, ext) {
        (Some(stem), Some(ext)) => {
            COVER_STEMS.contains(&stem.as_str()) && IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// File extension guessed from the image magic bytes.
fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if bytes.starts_with(b"BM") {
        "bmp"
    } else {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cover_names_match_conventional_stems_case_insensitive() {
        assert!(is_cover_name(Path::new("/m/a/Cover.JPG")));
        assert!(is_cover_name(Path::new("/m/a/folder.png")));
        assert!(is_cover_name(Path::new("/m/a/front.webp")));
        assert!(!is_cover_name(Path::new("/m/a/back.jpg")));
        assert!(!is_cover_name(Path::new("/m/a/cover.txt")));
        assert!(!is_cover_name(Path::new("/m/a/cover")));
    }

    #[test]
    fn embedded_art_is_content_addressed_and_deduplicated() {
        let dir = tempdir().unwrap();
        let store = CoverStore::new(dir.path().join("covers"));
        let png = [0x89, b'P', b'N', b'G', 1, 2, 3, 4];

        let a = store.store_embedded(&png).unwrap();
        let b = store.store_embedded(&png).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.extension().unwrap(), "png");
        assert_eq!(fs::read_dir(dir.path().join("covers")).unwrap().count(), 1);

        let other = store.store_embedded(b"\xff\xd8\xffjpeg").unwrap();
        assert_ne!(a, other);
        assert_eq!(other.extension().unwrap(), "jpg");
    }

    #[test]
    fn folder_cover_is_cached_per_folder() {
        let dir = tempdir().unwrap();
        let album = dir.path().join("album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("folder.jpg"), b"img").unwrap();

        let mut store = CoverStore::new(dir.path().join("covers"));
        assert_eq!(store.folder_cover(&album), Some(album.join("folder.jpg")));

        // Removing the file does not trigger a second directory scan.
        fs::remove_file(album.join("folder.jpg")).unwrap();
        assert_eq!(store.folder_cover(&album), Some(album.join("folder.jpg")));
    }

    #[test]
    fn embedded_art_wins_over_folder_art() {
        let dir = tempdir().unwrap();
        let album = dir.path().join("album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("cover.png"), b"img").unwrap();

        let mut store = CoverStore::new(dir.path().join("covers"));
        let resolved = store.resolve(Some(&b"GIF89a..."[..]), &album).unwrap();
        assert!(resolved.starts_with(dir.path().join("covers")));

        let fallback = store.resolve(None, &album).unwrap();
        assert_eq!(fallback, album.join("cover.png"));
    }

    #[test]
    fn missing_folder_has_no_cover() {
        let mut store = CoverStore::new("/nonexistent/covers");
        assert!(store.folder_cover(Path::new("/nonexistent/album")).is_none());
    }
}
