use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::tag::{ItemKey, Tag};
use log::warn;

use super::model::Metadata;

/// Display name of a locator: its file name, or the whole path when it has none.
pub fn display_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn first_non_empty(tag: Option<&Tag>, key: ItemKey) -> Option<String> {
    tag.and_then(|t| t.get_string(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read title/artist/album/duration and the embedded picture of `path`.
///
/// Never fails: unreadable files degrade to the file name as title.
pub fn extract(path: &Path) -> Metadata {
    let display_name = display_name_of(path);
    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
            let cover_bytes = tag.and_then(|t| {
                let pictures = t.pictures();
                pictures
                    .iter()
                    .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
                    .or_else(|| pictures.first())
                    .map(|p| p.data().to_vec())
            });

            Metadata {
                title: first_non_empty(tag, ItemKey::TrackTitle).unwrap_or(display_name),
                artist: first_non_empty(tag, ItemKey::TrackArtist).unwrap_or_default(),
                album: first_non_empty(tag, ItemKey::AlbumTitle).unwrap_or_default(),
                duration_ms: tagged.properties().duration().as_millis() as u64,
                cover_bytes,
            }
        }
        Err(e) => {
            warn!("failed to extract metadata for {display_name}: {e}");
            Metadata {
                title: display_name,
                ..Metadata::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unreadable_file_degrades_to_display_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Broken Song.mp3");
        fs::write(&path, b"definitely not an mp3").unwrap();

        let meta = extract(&path);
        assert_eq!(meta.title, "Broken Song.mp3");
        assert_eq!(meta.artist, "");
        assert_eq!(meta.album, "");
        assert_eq!(meta.duration_ms, 0);
        assert!(meta.cover_bytes.is_none());
    }

    #[test]
    fn missing_file_degrades_too() {
        let meta = extract(Path::new("/nonexistent/dir/ghost.flac"));
        assert_eq!(meta.title, "ghost.flac");
    }
}
