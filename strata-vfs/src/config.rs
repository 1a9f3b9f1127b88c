// SPDX-License-Identifier: AGPL-3.0-or-later
//! TOML mount tables
//!
//! ```toml
//! [[loader]]
//! name = "base"
//! kind = "dir"
//! root = "assets"
//!
//! [[mount]]
//! loader = "base"
//! source = ""
//! target = "data"
//! write = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use strata_loaders::LoaderKind;

use crate::error::ConfigError;
use crate::tree::{LoaderId, MountFlags, MountStatus};
use crate::vfs::Vfs;

/// Loader declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub name: String,
    pub kind: LoaderKind,
    /// Host directory for `dir` loaders; relative roots are resolved
    /// against the mount table's directory
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub writable: bool,
}

/// Mount declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    pub loader: String,
    /// Directory inside the loader
    #[serde(default)]
    pub source: String,
    /// Virtual directory
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub write: bool,
}

/// Loaders and mounts, applied in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountTable {
    #[serde(default, rename = "loader")]
    pub loaders: Vec<LoaderConfig>,
    #[serde(default, rename = "mount")]
    pub mounts: Vec<MountConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl MountTable {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read a mount table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut table = Self::from_toml_str(&input)?;
        table.base_dir = path.parent().map(Path::to_path_buf);
        Ok(table)
    }

    /// Directory that relative loader roots are resolved against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve_root(&self, root: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if root.is_relative() => base.join(root),
            _ => root.to_path_buf(),
        }
    }

    /// Build a fresh filesystem from this table
    pub fn build(&self) -> Result<Vfs, ConfigError> {
        let mut vfs = Vfs::new();
        self.apply(&mut vfs)?;
        Ok(vfs)
    }

    /// Register this table's loaders and mounts on `vfs`. Returns the status
    /// of each mount; posture conflicts are warnings, not errors.
    pub fn apply(&self, vfs: &mut Vfs) -> Result<Vec<MountStatus>, ConfigError> {
        let mut ids: HashMap<&str, LoaderId> = HashMap::new();
        for decl in &self.loaders {
            if ids.contains_key(decl.name.as_str()) {
                return Err(ConfigError::DuplicateLoader(decl.name.clone()));
            }
            let root = decl.root.as_deref().map(|root| self.resolve_root(root));
            let loader = decl
                .kind
                .build(&decl.name, root.as_deref(), decl.writable)
                .map_err(|source| ConfigError::Loader { name: decl.name.clone(), source })?;
            ids.insert(decl.name.as_str(), vfs.register_boxed(loader));
        }

        let mut statuses = Vec::with_capacity(self.mounts.len());
        for decl in &self.mounts {
            let id = *ids
                .get(decl.loader.as_str())
                .ok_or_else(|| ConfigError::UnknownLoader(decl.loader.clone()))?;
            let flags = MountFlags { write: decl.write };
            let status = vfs
                .mount(id, &decl.source, &decl.target, flags)
                .map_err(|source| ConfigError::Mount {
                    loader: decl.loader.clone(),
                    target: decl.target.clone(),
                    source,
                })?;
            statuses.push(status);
        }
        tracing::debug!(
            "Applied mount table: {} loaders, {} mounts",
            self.loaders.len(),
            self.mounts.len()
        );
        Ok(statuses)
    }
}
