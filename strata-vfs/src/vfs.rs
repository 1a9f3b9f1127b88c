// SPDX-License-Identifier: AGPL-3.0-or-later
//! Virtual filesystem: loader registry, mount operation and resolver

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use strata_core::{CanonicalPath, FileEntry, FileHandle, FileWriter, Loader, PathView};

use crate::error::MountError;
use crate::tree::{LoaderId, Mount, MountFlags, MountNode, MountStatus};

/// An active mount, as reported by [`Vfs::mounts`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountInfo {
    /// Virtual directory the mount is attached to (`""` for the root)
    pub virtual_path: String,
    pub loader: LoaderId,
    pub loader_name: String,
    /// Loader-side directory mapped onto `virtual_path`
    pub loader_path: CanonicalPath,
    /// Write access requested by this mount
    pub write: bool,
    /// Effective read-only flag of the directory
    pub read_only: bool,
}

/// Overlay filesystem over registered loaders
///
/// Later mounts at the same directory take priority over earlier ones. A
/// mount below another mount's directory hides that mount for every path
/// under it.
pub struct Vfs {
    loaders: Vec<Box<dyn Loader>>,
    root: MountNode,
}

impl Vfs {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            root: MountNode::new(),
        }
    }

    /// Take ownership of a loader. The returned id stays valid for the
    /// lifetime of this filesystem.
    pub fn register_loader(&mut self, loader: impl Loader + 'static) -> LoaderId {
        self.register_boxed(Box::new(loader))
    }

    pub fn register_boxed(&mut self, loader: Box<dyn Loader>) -> LoaderId {
        let id = self.loaders.len();
        tracing::debug!("Registered loader {} as {}", loader.display_name(), id);
        self.loaders.push(loader);
        id
    }

    pub fn loader(&self, id: LoaderId) -> Option<&dyn Loader> {
        self.loaders.get(id).map(|loader| loader.as_ref())
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.len()
    }

    /// Mount `loader_path` of loader `id` at `virtual_path`.
    ///
    /// `loader_path` may climb above the loader's root; `virtual_path`
    /// cannot climb above the virtual root. Mounting is additive: nothing
    /// previously mounted is replaced.
    pub fn mount(
        &mut self,
        id: LoaderId,
        loader_path: &str,
        virtual_path: &str,
        flags: MountFlags,
    ) -> Result<MountStatus, MountError> {
        let loader = self.loaders.get(id).ok_or_else(|| {
            tracing::warn!("Mount of {} rejected: no loader {}", virtual_path, id);
            MountError::InvalidLoader(id)
        })?;

        let root = CanonicalPath::new(loader_path, true);
        let entry = loader.stat(root.view());
        if !entry.exists {
            tracing::warn!("Mount rejected: {} has no {}", loader.display_name(), root);
            return Err(MountError::InvalidLoaderPath(root.to_string()));
        }
        if !entry.is_directory {
            tracing::warn!("Mount rejected: {} in {} is not a directory", root, loader.display_name());
            return Err(MountError::LoaderPathNotDirectory(root.to_string()));
        }

        let target = CanonicalPath::new(virtual_path, false);
        let node = self.root.descend_or_create(target.view());
        let status = node.add_mount(Mount { loader: id, root, write: flags.write });

        match status {
            MountStatus::ConflictingReadAccess => tracing::warn!(
                "Mounts at '{}' disagree on write access; directory is now read-only",
                target
            ),
            MountStatus::Mounted => tracing::debug!(
                "Mounted {}:{} at '{}' ({})",
                self.loaders[id].display_name(),
                loader_path,
                target,
                if flags.write { "rw" } else { "ro" }
            ),
        }
        Ok(status)
    }

    /// Deepest mount-tree node for `path` and the unmatched suffix, or
    /// `None` when that node has no mounts.
    fn resolve<'p>(&self, path: &'p CanonicalPath) -> Option<(&MountNode, PathView<'p>)> {
        let (node, rest) = self.root.descend(path.view());
        if node.mounts.is_empty() {
            tracing::trace!("'{}': no mounts", path);
            return None;
        }
        Some((node, rest))
    }

    /// Run `op` against each mount of `node`, most recent first, with the
    /// suffix rewritten into that loader's path space. Stops at the first
    /// `Some`.
    fn dispatch<T>(
        &self,
        node: &MountNode,
        suffix: PathView<'_>,
        mut op: impl FnMut(&dyn Loader, &CanonicalPath) -> Option<T>,
    ) -> Option<T> {
        for mount in node.mounts.iter().rev() {
            let Some(loader) = self.loaders.get(mount.loader) else {
                continue;
            };
            let rewritten = mount.root.join(suffix);
            if let Some(found) = op(loader.as_ref(), &rewritten) {
                tracing::trace!("'{}' served by {}", rewritten, loader.display_name());
                return Some(found);
            }
        }
        None
    }

    pub fn get_file_entry(&self, virtual_path: &str) -> FileEntry {
        let path = CanonicalPath::new(virtual_path, false);
        self.resolve(&path)
            .and_then(|(node, suffix)| {
                self.dispatch(node, suffix, |loader, rewritten| {
                    let entry = loader.stat(rewritten.view());
                    entry.exists.then_some(entry)
                })
            })
            .unwrap_or_else(FileEntry::not_found)
    }

    pub fn open_file(&self, virtual_path: &str) -> Option<FileHandle> {
        let path = CanonicalPath::new(virtual_path, false);
        let (node, suffix) = self.resolve(&path)?;
        self.dispatch(node, suffix, |loader, rewritten| loader.open_read(rewritten.view()))
    }

    /// Open for writing. Always `None` under a read-only directory, even if
    /// one of its loaders could write.
    pub fn open_file_write(&self, virtual_path: &str) -> Option<FileWriter> {
        let path = CanonicalPath::new(virtual_path, false);
        let (node, suffix) = self.resolve(&path)?;
        if node.read_only {
            tracing::debug!("'{}' is read-only", path);
            return None;
        }
        self.dispatch(node, suffix, |loader, rewritten| loader.open_write(rewritten.view()))
    }

    /// Loader-side path of the first loader that has `virtual_path`, or
    /// `virtual_path` itself when none does.
    pub fn get_real_path(&self, virtual_path: &str) -> String {
        let path = CanonicalPath::new(virtual_path, false);
        self.resolve(&path)
            .and_then(|(node, suffix)| {
                self.dispatch(node, suffix, |loader, rewritten| {
                    loader
                        .stat(rewritten.view())
                        .exists
                        .then(|| rewritten.to_string())
                })
            })
            .unwrap_or_else(|| virtual_path.to_string())
    }

    /// Merged listing of every mount at the resolved directory. On a name
    /// clash the higher-priority mount's entry is kept.
    pub fn get_directory(&self, virtual_path: &str) -> BTreeMap<String, FileEntry> {
        let mut listing = BTreeMap::new();
        let path = CanonicalPath::new(virtual_path, false);
        let Some((node, suffix)) = self.resolve(&path) else {
            return listing;
        };

        self.dispatch(node, suffix, |loader, rewritten| {
            loader.iterate(rewritten.view(), &mut |name, entry| {
                listing.entry(name.to_string()).or_insert(entry);
            });
            None::<()>
        });
        listing
    }

    /// Read-only flag of the directory the resolver reaches for
    /// `virtual_path`; unmounted paths are read-only.
    pub fn is_read_only(&self, virtual_path: &str) -> bool {
        let path = CanonicalPath::new(virtual_path, false);
        self.resolve(&path).map_or(true, |(node, _)| node.read_only)
    }

    /// Every active mount, depth-first by virtual path, in mount order.
    pub fn mounts(&self) -> Vec<MountInfo> {
        let mut out = Vec::new();
        self.root.walk(&mut Vec::new(), &mut |path, node| {
            for mount in &node.mounts {
                out.push(MountInfo {
                    virtual_path: path.join("/"),
                    loader: mount.loader,
                    loader_name: self
                        .loader(mount.loader)
                        .map(|loader| loader.display_name().to_string())
                        .unwrap_or_default(),
                    loader_path: mount.root.clone(),
                    write: mount.write,
                    read_only: node.read_only,
                });
            }
        });
        out
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.loaders.iter().map(|l| l.display_name()).collect();
        f.debug_struct("Vfs")
            .field("loaders", &names)
            .field("root", &self.root)
            .finish()
    }
}
