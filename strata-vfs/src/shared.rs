// SPDX-License-Identifier: AGPL-3.0-or-later
//! Thread-safe handle over a [`Vfs`]

use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_core::{FileEntry, FileHandle, FileWriter, Loader};

use crate::error::MountError;
use crate::tree::{LoaderId, MountFlags, MountStatus};
use crate::vfs::{MountInfo, Vfs};

/// Cloneable, lock-protected [`Vfs`]
///
/// Registration and mounting take the write lock; queries share the read
/// lock, so they never observe a half-applied mount.
#[derive(Clone, Default)]
pub struct SharedVfs {
    inner: Arc<RwLock<Vfs>>,
}

impl SharedVfs {
    pub fn new(vfs: Vfs) -> Self {
        Self { inner: Arc::new(RwLock::new(vfs)) }
    }

    pub fn register_loader(&self, loader: impl Loader + 'static) -> LoaderId {
        self.inner.write().register_loader(loader)
    }

    pub fn mount(
        &self,
        id: LoaderId,
        loader_path: &str,
        virtual_path: &str,
        flags: MountFlags,
    ) -> Result<MountStatus, MountError> {
        self.inner.write().mount(id, loader_path, virtual_path, flags)
    }

    pub fn get_file_entry(&self, virtual_path: &str) -> FileEntry {
        self.inner.read().get_file_entry(virtual_path)
    }

    pub fn open_file(&self, virtual_path: &str) -> Option<FileHandle> {
        self.inner.read().open_file(virtual_path)
    }

    pub fn open_file_write(&self, virtual_path: &str) -> Option<FileWriter> {
        self.inner.read().open_file_write(virtual_path)
    }

    pub fn get_real_path(&self, virtual_path: &str) -> String {
        self.inner.read().get_real_path(virtual_path)
    }

    pub fn get_directory(&self, virtual_path: &str) -> BTreeMap<String, FileEntry> {
        self.inner.read().get_directory(virtual_path)
    }

    pub fn is_read_only(&self, virtual_path: &str) -> bool {
        self.inner.read().is_read_only(virtual_path)
    }

    pub fn mounts(&self) -> Vec<MountInfo> {
        self.inner.read().mounts()
    }

    /// Hold the read lock across several queries
    pub fn read(&self) -> RwLockReadGuard<'_, Vfs> {
        self.inner.read()
    }
}

impl From<Vfs> for SharedVfs {
    fn from(vfs: Vfs) -> Self {
        Self::new(vfs)
    }
}
