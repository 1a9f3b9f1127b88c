// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory loader

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;
use strata_core::{
    CanonicalPath, FileEntry, FileHandle, FileWriter, Loader, PathView, StrataError,
    StrataResult,
};

#[derive(Debug, Clone)]
enum MemoryNode {
    File { data: Bytes, modified: DateTime<Utc> },
    Directory { modified: DateTime<Utc> },
}

/// Flat map keyed by the slash-joined components; `""` is the root.
#[derive(Debug, Default)]
struct MemoryTree {
    nodes: RwLock<BTreeMap<String, MemoryNode>>,
}

impl MemoryTree {
    /// Create every missing ancestor of `key` as a directory.
    fn ensure_parents(nodes: &mut BTreeMap<String, MemoryNode>, key: &str) -> StrataResult<()> {
        let mut end = 0;
        while let Some(pos) = key[end..].find('/') {
            let parent = &key[..end + pos];
            match nodes.get(parent) {
                Some(MemoryNode::File { .. }) => {
                    return Err(StrataError::NotADirectory(parent.to_string()));
                }
                Some(MemoryNode::Directory { .. }) => {}
                None => {
                    nodes.insert(
                        parent.to_string(),
                        MemoryNode::Directory { modified: Utc::now() },
                    );
                }
            }
            end += pos + 1;
        }
        Ok(())
    }

    fn put_file(&self, key: &str, data: Bytes) -> StrataResult<()> {
        let mut nodes = self.nodes.write();
        if let Some(MemoryNode::Directory { .. }) = nodes.get(key) {
            return Err(StrataError::Other(format!("is a directory: {key}")));
        }
        Self::ensure_parents(&mut nodes, key)?;
        nodes.insert(key.to_string(), MemoryNode::File { data, modified: Utc::now() });
        Ok(())
    }
}

/// Loader over an in-memory tree
///
/// Clones share the same tree, so a test or host can keep a handle to the
/// contents after the loader has been moved into a filesystem.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    name: String,
    tree: Arc<MemoryTree>,
    read_only: bool,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            tree: Arc::new(MemoryTree::default()),
            read_only: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Builder form of [`MemoryLoader::insert_file`]; failures are logged.
    pub fn with_file(self, path: &str, data: impl Into<Bytes>) -> Self {
        if let Err(e) = self.insert_file(path, data) {
            tracing::warn!("{}: cannot add file {}: {}", self.name, path, e);
        }
        self
    }

    /// Builder form of [`MemoryLoader::insert_dir`]; failures are logged.
    pub fn with_dir(self, path: &str) -> Self {
        if let Err(e) = self.insert_dir(path) {
            tracing::warn!("{}: cannot add directory {}: {}", self.name, path, e);
        }
        self
    }

    /// Store a file, creating parent directories. Ignores the read-only
    /// setting, which only applies to writes through the loader.
    pub fn insert_file(&self, path: &str, data: impl Into<Bytes>) -> StrataResult<()> {
        let key = Self::key_for(path)?;
        self.tree.put_file(&key, data.into())
    }

    pub fn insert_dir(&self, path: &str) -> StrataResult<()> {
        let key = Self::key_for(path)?;
        let mut nodes = self.tree.nodes.write();
        if let Some(MemoryNode::File { .. }) = nodes.get(&key) {
            return Err(StrataError::NotADirectory(key));
        }
        MemoryTree::ensure_parents(&mut nodes, &key)?;
        nodes
            .entry(key)
            .or_insert_with(|| MemoryNode::Directory { modified: Utc::now() });
        Ok(())
    }

    /// Contents of a stored file
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        let key = Self::key_for(path).ok()?;
        match self.tree.nodes.read().get(&key) {
            Some(MemoryNode::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    fn key_for(path: &str) -> StrataResult<String> {
        let canonical = CanonicalPath::new(path, false);
        if canonical.is_empty() {
            return Err(StrataError::InvalidPath(path.to_string()));
        }
        Ok(canonical.components().join("/"))
    }

    /// Paths that climb out of the tree never resolve.
    fn key(path: PathView<'_>) -> Option<String> {
        if path.climbs_up() {
            return None;
        }
        Some(path.iter().collect::<Vec<_>>().join("/"))
    }

    fn entry(&self, node: &MemoryNode) -> FileEntry {
        let entry = match node {
            MemoryNode::File { data, modified } => {
                FileEntry::file(data.len() as u64).with_modified(*modified)
            }
            MemoryNode::Directory { modified } => FileEntry::directory().with_modified(*modified),
        };
        entry.with_read_only(self.read_only)
    }
}

impl Default for MemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for MemoryLoader {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn iterate(&self, path: PathView<'_>, visit: &mut dyn FnMut(&str, FileEntry)) {
        let Some(key) = Self::key(path) else {
            return;
        };
        let nodes = self.tree.nodes.read();
        if !key.is_empty() && !matches!(nodes.get(&key), Some(MemoryNode::Directory { .. })) {
            return;
        }

        let prefix = if key.is_empty() { key } else { format!("{key}/") };
        for (child, node) in nodes.range(prefix.clone()..) {
            let Some(name) = child.strip_prefix(prefix.as_str()) else {
                break;
            };
            if !name.is_empty() && !name.contains('/') {
                visit(name, self.entry(node));
            }
        }
    }

    fn stat(&self, path: PathView<'_>) -> FileEntry {
        let Some(key) = Self::key(path) else {
            return FileEntry::not_found();
        };
        if key.is_empty() {
            return FileEntry::directory().with_read_only(self.read_only);
        }
        match self.tree.nodes.read().get(&key) {
            Some(node) => self.entry(node),
            None => FileEntry::not_found(),
        }
    }

    fn open_read(&self, path: PathView<'_>) -> Option<FileHandle> {
        let key = Self::key(path)?;
        match self.tree.nodes.read().get(&key) {
            Some(MemoryNode::File { data, .. }) => Some(Box::new(Cursor::new(data.clone()))),
            _ => None,
        }
    }

    fn open_write(&self, path: PathView<'_>) -> Option<FileWriter> {
        if self.read_only {
            return None;
        }
        let key = Self::key(path)?;
        if key.is_empty() {
            return None;
        }
        // Truncate on open, like creating a file on disk
        if let Err(e) = self.tree.put_file(&key, Bytes::new()) {
            tracing::debug!("{}: cannot write {}: {}", self.name, key, e);
            return None;
        }
        Some(Box::new(MemoryWriter {
            tree: Arc::clone(&self.tree),
            key,
            buffer: Cursor::new(Vec::new()),
            dirty: false,
        }))
    }
}

/// Buffers writes and commits them to the tree on flush or drop
struct MemoryWriter {
    tree: Arc<MemoryTree>,
    key: String,
    buffer: Cursor<Vec<u8>>,
    dirty: bool,
}

impl MemoryWriter {
    fn commit(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let data = Bytes::copy_from_slice(self.buffer.get_ref());
        self.tree
            .put_file(&self.key, data)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        self.dirty = false;
        Ok(())
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.buffer.write(buf)?;
        self.dirty = true;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Seek for MemoryWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.commit() {
            tracing::warn!("memory writer for {} dropped without commit: {}", self.key, e);
        }
    }
}
