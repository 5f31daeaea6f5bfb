//! Folder-organized music library: scanning, metadata, cover art and the scan cache.

mod cache;
mod cover;
mod error;
mod metadata;
mod model;
mod scan;

pub use cache::{cache_is_live, clear_cache, load_cache, save_cache};
pub use cover::CoverStore;
pub use error::{CacheError, ScanError};
pub use metadata::{display_name_of, extract};
pub use model::{Folder, FolderId, LibraryIndex, Metadata, Track};
pub use scan::{Scanner, root_is_readable};
