//! Reference loaders for Strata
//!
//! Two back-ends implementing [`strata_core::Loader`]:
//! - [`DirLoader`]: a directory on the host filesystem
//! - [`MemoryLoader`]: an in-memory tree, shareable between clones

mod dir;
mod memory;

pub use dir::DirLoader;
pub use memory::MemoryLoader;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use strata_core::{Loader, StrataError, StrataResult};

/// Loader back-ends that can be built from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Dir,
    Memory,
}

impl LoaderKind {
    /// Build a loader of this kind.
    ///
    /// `root` is required for [`LoaderKind::Dir`] and must be an existing
    /// directory; it is ignored for [`LoaderKind::Memory`].
    pub fn build(
        self,
        name: &str,
        root: Option<&Path>,
        writable: bool,
    ) -> StrataResult<Box<dyn Loader>> {
        match self {
            LoaderKind::Dir => {
                let root = root.ok_or_else(|| {
                    StrataError::Config(format!("loader '{name}' of kind dir needs a root"))
                })?;
                if !root.exists() {
                    return Err(StrataError::NotFound(root.display().to_string()));
                }
                if !root.is_dir() {
                    return Err(StrataError::NotADirectory(root.display().to_string()));
                }
                let loader = DirLoader::new(root).with_name(name).with_read_only(!writable);
                Ok(Box::new(loader))
            }
            LoaderKind::Memory => {
                let loader = MemoryLoader::new().with_name(name).with_read_only(!writable);
                Ok(Box::new(loader))
            }
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Dir => f.write_str("dir"),
            LoaderKind::Memory => f.write_str("memory"),
        }
    }
}
