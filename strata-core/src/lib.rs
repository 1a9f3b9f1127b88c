//! Strata Core
//!
//! Canonical paths, file entries, and the loader contract shared by every
//! storage back-end mounted into a Strata virtual filesystem.

pub mod entry;
pub mod error;
pub mod loader;
pub mod path;

pub use entry::{EntryKind, FileEntry};
pub use error::{StrataError, StrataResult};
pub use loader::{FileHandle, FileWriter, Loader, ReadHandle, WriteHandle};
pub use path::{CanonicalPath, PathView};
