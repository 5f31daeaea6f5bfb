use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::library::{Folder, FolderId, LibraryIndex, Track};

/// Build an index whose folder `i` holds `sizes[i]` tracks, flattened in order.
fn index_with(sizes: &[usize]) -> LibraryIndex {
    let mut folders = Vec::new();
    let mut tracks = Vec::new();
    for (fi, &size) in sizes.iter().enumerate() {
        let id = FolderId(fi as u32);
        let mut members = Vec::new();
        for ti in 0..size {
            members.push(tracks.len());
            let name = format!("{ti:02}.mp3");
            tracks.push(Track {
                locator: PathBuf::from(format!("/music/f{fi}/{name}")),
                display_name: name.clone(),
                title: name,
                artist: String::new(),
                album: String::new(),
                duration_ms: 0,
                folder_id: id,
                cover_path: None,
            });
        }
        folders.push(Folder {
            id,
            name: format!("f{fi}"),
            path: format!("music/f{fi}"),
            cover_path: None,
            sort_order: fi as u32,
            tracks: members,
        });
    }
    LibraryIndex::new(PathBuf::from("/music"), folders, tracks)
}

fn nav_with(sizes: &[usize]) -> Navigation {
    let mut nav = Navigation::with_rng(StdRng::seed_from_u64(7));
    nav.install(Arc::new(index_with(sizes)));
    nav
}

#[test]
fn empty_index_yields_nothing() {
    let mut nav = nav_with(&[]);
    assert!(nav.current().is_none());
    assert!(nav.next_track().is_none());
    assert!(nav.prev_track().is_none());
    assert!(nav.next_folder().is_none());
    assert!(nav.prev_folder().is_none());
    assert!(nav.shuffle_pick().is_none());
    assert!(nav.shuffle_pick_no_repeat().is_none());
}

#[test]
fn next_then_prev_returns_to_start_including_wraparound() {
    let mut nav = nav_with(&[2, 3]);
    for start in 0..nav.len() {
        nav.set_current_index(start);
        nav.next_track();
        nav.prev_track();
        assert_eq!(nav.current_index(), start);

        nav.prev_track();
        nav.next_track();
        assert_eq!(nav.current_index(), start);
    }

    nav.set_current_index(4);
    nav.next_track();
    assert_eq!(nav.current_index(), 0);
    nav.prev_track();
    assert_eq!(nav.current_index(), 4);
}

#[test]
fn next_folder_always_changes_folder_and_cycles_back() {
    let mut nav = nav_with(&[2, 1, 3]);
    let lib = nav.library().clone();
    nav.set_current_index(1);
    let start_folder = lib.folder_index_of(1).unwrap();

    for _ in 0..lib.folders().len() - 1 {
        let before = lib.folder_index_of(nav.current_index()).unwrap();
        nav.next_folder().unwrap();
        let after = lib.folder_index_of(nav.current_index()).unwrap();
        assert_ne!(before, after);
        assert_eq!(nav.current_index(), lib.folders()[after].tracks[0]);
    }
    nav.next_folder();
    assert_eq!(lib.folder_index_of(nav.current_index()), Some(start_folder));
    assert_eq!(nav.current_index(), 0);
}

#[test]
fn prev_folder_wraps_to_last_folder_first_track() {
    let mut nav = nav_with(&[2, 1, 3]);
    nav.set_current_index(1);
    let track = nav.prev_folder().unwrap().locator.clone();
    assert_eq!(nav.current_index(), 3);
    assert_eq!(track, PathBuf::from("/music/f2/00.mp3"));

    nav.prev_folder();
    assert_eq!(nav.current_index(), 2);
}

#[test]
fn shuffle_pick_never_repeats_current_and_covers_all_others() {
    let mut nav = nav_with(&[4, 4]);
    let n = nav.len();
    let mut counts = vec![0usize; n];
    for _ in 0..8000 {
        let before = nav.current_index();
        nav.shuffle_pick();
        let after = nav.current_index();
        assert_ne!(before, after);
        counts[after] += 1;
    }
    // Each index should land near 1000 hits.
    for (i, c) in counts.iter().enumerate() {
        assert!((700..1300).contains(c), "index {i} drawn {c} times");
    }
}

#[test]
fn shuffle_pick_on_single_track_stays_put() {
    let mut nav = nav_with(&[1]);
    assert!(nav.shuffle_pick().is_some());
    assert_eq!(nav.current_index(), 0);
}

#[test]
fn shuffle_pick_no_repeat_exhausts_after_full_cycle_then_resets_on_toggle() {
    let mut nav = nav_with(&[3, 2]);
    let n = nav.len();
    let mut seen = HashSet::new();
    seen.insert(nav.current_index());

    for _ in 0..n - 1 {
        nav.shuffle_pick_no_repeat().unwrap();
        assert!(seen.insert(nav.current_index()), "track repeated in cycle");
    }
    assert_eq!(seen.len(), n);
    assert!(nav.shuffle_pick_no_repeat().is_none());
    assert_eq!(nav.played_count(), n);
    assert!(nav.shuffle_pick_no_repeat().is_none());

    nav.toggle_shuffle();
    assert_eq!(nav.played_count(), 0);
    assert!(nav.shuffle_pick_no_repeat().is_some());
}

#[test]
fn set_current_index_is_bounds_checked() {
    let mut nav = nav_with(&[3]);
    assert!(nav.set_current_index(2));
    assert_eq!(nav.current_index(), 2);
    assert!(!nav.set_current_index(3));
    assert_eq!(nav.current_index(), 2);
}

#[test]
fn install_resets_position_and_played_set() {
    let mut nav = nav_with(&[5]);
    nav.set_current_index(4);
    nav.shuffle_pick_no_repeat();
    assert!(nav.played_count() > 0);

    nav.install(Arc::new(index_with(&[2])));
    assert_eq!(nav.current_index(), 0);
    assert_eq!(nav.played_count(), 0);
    assert_eq!(nav.len(), 2);
}

#[test]
fn toggle_and_repeat_mode_setters() {
    let mut nav = nav_with(&[2]);
    assert!(!nav.is_shuffle_on());
    assert!(nav.toggle_shuffle());
    nav.set_shuffle(true);
    assert!(nav.is_shuffle_on());
    nav.set_repeat_mode(RepeatMode::All);
    assert_eq!(nav.repeat_mode(), RepeatMode::All);
}

#[test]
fn repeat_mode_parse_accepts_aliases() {
    assert_eq!(RepeatMode::parse("One"), Some(RepeatMode::One));
    assert_eq!(RepeatMode::parse("off"), Some(RepeatMode::None));
    assert_eq!(RepeatMode::parse("repeat-all"), Some(RepeatMode::All));
    assert_eq!(RepeatMode::parse("sometimes"), None);
}
