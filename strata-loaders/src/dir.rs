// SPDX-License-Identifier: AGPL-3.0-or-later
//! Host directory loader

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use strata_core::{FileEntry, FileHandle, FileWriter, Loader, PathView};

/// Serves files below a directory on the host filesystem
pub struct DirLoader {
    name: String,
    root: PathBuf,
    read_only: bool,
}

impl DirLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            name: root.display().to_string(),
            root,
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

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn to_real_path(&self, path: PathView<'_>) -> PathBuf {
        let mut real = self.root.clone();
        for _ in 0..path.climb_count() {
            real.push("..");
        }
        for seg in path.iter() {
            real.push(seg);
        }
        real
    }

    fn entry_from_metadata(&self, meta: &fs::Metadata) -> FileEntry {
        let mut entry = if meta.is_dir() {
            FileEntry::directory()
        } else {
            FileEntry::file(meta.len())
        };
        entry.read_only = self.read_only || meta.permissions().readonly();
        if let Ok(modified) = meta.modified() {
            entry.modified = Some(DateTime::<Utc>::from(modified));
        }
        entry
    }
}

impl Loader for DirLoader {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn iterate(&self, path: PathView<'_>, visit: &mut dyn FnMut(&str, FileEntry)) {
        let real = self.to_real_path(path);
        let read_dir = match fs::read_dir(&real) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::trace!("{}: cannot list {}: {}", self.name, real.display(), e);
                return;
            }
        };

        for entry in read_dir.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // Follow symlinks so linked directories list as directories
            match fs::metadata(entry.path()) {
                Ok(meta) => visit(&name, self.entry_from_metadata(&meta)),
                Err(e) => tracing::trace!("{}: skipping {}: {}", self.name, name, e),
            }
        }
    }

    fn stat(&self, path: PathView<'_>) -> FileEntry {
        match fs::metadata(self.to_real_path(path)) {
            Ok(meta) => self.entry_from_metadata(&meta),
            Err(_) => FileEntry::not_found(),
        }
    }

    fn open_read(&self, path: PathView<'_>) -> Option<FileHandle> {
        let real = self.to_real_path(path);
        if !real.is_file() {
            return None;
        }
        match fs::File::open(&real) {
            Ok(file) => Some(Box::new(file)),
            Err(e) => {
                tracing::debug!("{}: open {} failed: {}", self.name, real.display(), e);
                None
            }
        }
    }

    fn open_write(&self, path: PathView<'_>) -> Option<FileWriter> {
        if self.read_only || path.is_empty() {
            return None;
        }
        let real = self.to_real_path(path);
        if real.is_dir() {
            return None;
        }

        if let Some(parent) = real.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!("{}: create {} failed: {}", self.name, parent.display(), e);
                return None;
            }
        }

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&real);
        match file {
            Ok(file) => Some(Box::new(file)),
            Err(e) => {
                tracing::debug!("{}: create {} failed: {}", self.name, real.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::{Read, Write};
    use strata_core::{CanonicalPath, ReadHandle, WriteHandle};

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("base/maps")).unwrap();
        fs::write(tmp.path().join("base/readme.txt"), b"hello").unwrap();
        fs::write(tmp.path().join("base/maps/one.map"), b"map data").unwrap();
        fs::create_dir_all(tmp.path().join("shared")).unwrap();
        fs::write(tmp.path().join("shared/font.ttf"), b"glyphs").unwrap();
        tmp
    }

    fn path(input: &str) -> CanonicalPath {
        CanonicalPath::new(input, true)
    }

    #[test]
    fn test_stat() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));

        let entry = loader.stat(path("readme.txt").view());
        assert!(entry.is_file());
        assert_eq!(entry.size, 5);
        assert!(entry.modified.is_some());
        assert!(!entry.read_only);

        assert!(loader.stat(path("maps").view()).is_dir());
        assert!(loader.stat(CanonicalPath::root().view()).is_dir());
        assert!(!loader.stat(path("missing").view()).exists);
    }

    #[test]
    fn test_stat_read_only_loader() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base")).with_read_only(true);
        assert!(loader.stat(path("readme.txt").view()).read_only);
    }

    #[test]
    fn test_climbing_path() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let entry = loader.stat(path("../shared/font.ttf").view());
        assert!(entry.is_file());
        assert_eq!(entry.size, 6);
    }

    #[test]
    fn test_absolute_path_stays_under_root() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        assert!(loader.stat(path("/readme.txt").view()).is_file());
    }

    #[test]
    fn test_iterate() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let mut seen = BTreeMap::new();
        loader.iterate(CanonicalPath::root().view(), &mut |name, entry| {
            seen.insert(name.to_string(), entry);
        });
        assert_eq!(seen.len(), 2);
        assert!(seen["readme.txt"].is_file());
        assert!(seen["maps"].is_dir());
    }

    #[test]
    fn test_iterate_missing_is_empty() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let mut count = 0;
        loader.iterate(path("nope").view(), &mut |_, _| count += 1);
        loader.iterate(path("readme.txt").view(), &mut |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_read() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let mut handle = loader.open_read(path("maps/one.map").view()).unwrap();
        let mut content = String::new();
        handle.read_to_string(&mut content).unwrap();
        assert_eq!(content, "map data");
        assert!(handle.is_eof());

        assert!(loader.open_read(path("maps").view()).is_none());
        assert!(loader.open_read(path("missing").view()).is_none());
    }

    #[test]
    fn test_open_write_creates_parents() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let mut writer = loader.open_write(path("saves/slot1.sav").view()).unwrap();
        writer.write_all(b"progress").unwrap();
        writer.close().unwrap();

        let written = fs::read(tmp.path().join("base/saves/slot1.sav")).unwrap();
        assert_eq!(written, b"progress");
    }

    #[test]
    fn test_open_write_truncates() {
        let tmp = fixture();
        let loader = DirLoader::new(tmp.path().join("base"));
        let mut writer = loader.open_write(path("readme.txt").view()).unwrap();
        writer.write_all(b"hi").unwrap();
        drop(writer);
        assert_eq!(fs::read(tmp.path().join("base/readme.txt")).unwrap(), b"hi");
    }

    #[test]
    fn test_open_write_refused() {
        let tmp = fixture();
        let read_only = DirLoader::new(tmp.path().join("base")).with_read_only(true);
        assert!(read_only.open_write(path("new.txt").view()).is_none());

        let loader = DirLoader::new(tmp.path().join("base"));
        assert!(loader.open_write(path("maps").view()).is_none());
        assert!(loader.open_write(CanonicalPath::root().view()).is_none());
    }

    #[test]
    fn test_display_name() {
        let loader = DirLoader::new("/srv/game").with_name("game");
        assert_eq!(loader.display_name(), "game");
        assert_eq!(loader.root(), Path::new("/srv/game"));
    }
}
