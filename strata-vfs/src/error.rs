// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mount and configuration errors

use std::path::PathBuf;
use strata_core::StrataError;
use thiserror::Error;

use crate::tree::LoaderId;

/// Hard mount failures; the mount tree is left untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    #[error("Invalid loader id: {0}")]
    InvalidLoader(LoaderId),

    #[error("Loader path does not exist: {0}")]
    InvalidLoaderPath(String),

    #[error("Loader path is not a directory: {0}")]
    LoaderPathNotDirectory(String),
}

impl MountError {
    /// Numeric result code
    pub fn code(&self) -> i32 {
        match self {
            MountError::InvalidLoader(_) => -10,
            MountError::InvalidLoaderPath(_) => -11,
            MountError::LoaderPathNotDirectory(_) => -12,
        }
    }
}

/// Mount table errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid mount table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Loader declared twice: {0}")]
    DuplicateLoader(String),

    #[error("Unknown loader: {0}")]
    UnknownLoader(String),

    #[error("Cannot build loader {name}: {source}")]
    Loader {
        name: String,
        #[source]
        source: StrataError,
    },

    #[error("Cannot mount {loader} at '{target}': {source}")]
    Mount {
        loader: String,
        target: String,
        #[source]
        source: MountError,
    },
}
