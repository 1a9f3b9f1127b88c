// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use chrono::{DateTime, Utc};
use console::style;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use strata_core::{EntryKind, FileEntry, StrataError, StrataResult};
use strata_vfs::{MountTable, Vfs, WriteHandle};
use tabled::{Table, Tabled};

/// Default mount table: `<config dir>/strata/mounts.toml`
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "hyperpolymath", "strata")
        .map(|dirs| dirs.config_dir().join("mounts.toml"))
}

/// Build the filesystem from `config`, or from the default mount table
fn open_vfs(config: Option<&Path>) -> StrataResult<Vfs> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => default_config_path()
            .filter(|path| path.exists())
            .ok_or_else(|| StrataError::Config("no mount table found; pass --config".into()))?,
    };

    tracing::debug!("Loading mount table {}", path.display());
    MountTable::load(&path)
        .and_then(|table| table.build())
        .map_err(|e| StrataError::Config(e.to_string()))
}

/// Format a timestamp for display
fn format_time(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format file size
fn format_size(entry: &FileEntry, human: bool) -> String {
    match entry.kind() {
        EntryKind::Directory | EntryKind::Missing => "-".to_string(),
        EntryKind::File if human => bytesize::ByteSize(entry.size).to_string(),
        EntryKind::File => entry.size.to_string(),
    }
}

/// Format entry kind
fn format_kind(kind: EntryKind) -> String {
    match kind {
        EntryKind::Directory => style("d").cyan().to_string(),
        EntryKind::File => "-".to_string(),
        EntryKind::Missing => "?".to_string(),
    }
}

fn format_access(read_only: bool) -> &'static str {
    if read_only {
        "ro"
    } else {
        "rw"
    }
}

/// Virtual paths are shown rooted at `/`
fn display_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct MountRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Loader")]
    loader: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Mount")]
    mount: String,
    #[tabled(rename = "Directory")]
    directory: String,
}

fn require_entry(vfs: &Vfs, path: &str) -> StrataResult<FileEntry> {
    let entry = vfs.get_file_entry(path);
    if !entry.exists {
        return Err(StrataError::NotFound(display_path(path)));
    }
    Ok(entry)
}

/// List directory contents
pub fn ls(config: Option<&Path>, path: &str, long: bool, human: bool) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    if !require_entry(&vfs, path)?.is_dir() {
        return Err(StrataError::NotADirectory(display_path(path)));
    }

    let listing = vfs.get_directory(path);
    if listing.is_empty() {
        println!("(empty directory)");
        return Ok(());
    }

    if long {
        let entries: Vec<LsEntry> = listing
            .iter()
            .map(|(name, entry)| LsEntry {
                kind: format_kind(entry.kind()),
                access: format_access(entry.read_only).to_string(),
                size: format_size(entry, human),
                modified: format_time(entry.modified),
                name: name.clone(),
            })
            .collect();
        println!("{}", Table::new(entries));
    } else {
        for name in listing.keys() {
            println!("{name}");
        }
    }

    Ok(())
}

/// Display file contents
pub fn cat(config: Option<&Path>, path: &str) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    let mut handle = vfs
        .open_file(path)
        .ok_or_else(|| StrataError::NotFound(display_path(path)))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut handle, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Show file or directory information
pub fn stat(config: Option<&Path>, path: &str, json: bool) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    let entry = require_entry(&vfs, path)?;

    if json {
        let text = serde_json::to_string_pretty(&entry)
            .map_err(|e| StrataError::Other(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    let kind = match entry.kind() {
        EntryKind::Directory => "directory",
        EntryKind::File => "file",
        EntryKind::Missing => "missing",
    };
    println!("  Path: {}", display_path(path));
    println!("  Type: {kind}");
    println!("  Size: {}", format_size(&entry, true));
    println!("Access: {}", format_access(entry.read_only));
    println!("Modify: {}", format_time(entry.modified));
    println!("Source: {}", vfs.get_real_path(path));
    Ok(())
}

/// Print the loader-side path
pub fn realpath(config: Option<&Path>, path: &str) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    println!("{}", vfs.get_real_path(path));
    Ok(())
}

/// Write stdin or a local file through the overlay
pub fn put(config: Option<&Path>, path: &str, from: Option<&Path>) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    let mut writer = vfs
        .open_file_write(path)
        .ok_or_else(|| StrataError::ReadOnly(display_path(path)))?;

    let written = match from {
        Some(local) => io::copy(&mut fs::File::open(local)?, &mut writer)?,
        None => io::copy(&mut io::stdin().lock(), &mut writer)?,
    };
    writer.close()?;

    tracing::debug!("Wrote {} bytes to {}", written, display_path(path));
    Ok(())
}

/// List active mounts
pub fn mounts(config: Option<&Path>) -> StrataResult<()> {
    let vfs = open_vfs(config)?;
    let rows: Vec<MountRow> = vfs
        .mounts()
        .into_iter()
        .map(|info| MountRow {
            target: display_path(&info.virtual_path),
            loader: format!("{} (#{})", info.loader_name, info.loader),
            source: info.loader_path.to_string(),
            mount: format_access(!info.write).to_string(),
            directory: format_access(info.read_only).to_string(),
        })
        .collect();

    if rows.is_empty() {
        println!("(no mounts)");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}
