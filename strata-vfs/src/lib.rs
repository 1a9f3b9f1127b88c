// SPDX-License-Identifier: AGPL-3.0-or-later
//! Overlay virtual filesystem for Strata
//!
//! Loaders are registered once and mounted at directories of a single
//! virtual tree. Every query walks the mount tree as deep as it matches the
//! queried path, then asks that directory's mounts in reverse mount order:
//!
//! ```text
//! ""            base (ro)           assets/x -> hidden by the mount below
//! └── assets    patch (ro), mod (ro) assets/x -> mod, then patch
//! ```
//!
//! A deeper mount point completely hides shallower mounts for paths below
//! it, and a directory whose mounts disagree on write access is read-only.

mod config;
mod error;
mod shared;
mod tree;
mod vfs;

pub use config::{LoaderConfig, MountConfig, MountTable};
pub use error::{ConfigError, MountError};
pub use shared::SharedVfs;
pub use tree::{LoaderId, MountFlags, MountStatus};
pub use vfs::{MountInfo, Vfs};

pub use strata_core::{
    CanonicalPath, FileEntry, FileHandle, FileWriter, Loader, PathView, ReadHandle, WriteHandle,
};
