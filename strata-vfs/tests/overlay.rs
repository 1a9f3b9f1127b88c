//! Integration tests for overlay resolution across disk and memory loaders.
//!
//! Covers:
//! - priority: later mounts at a directory win
//! - read-only stickiness when mounts disagree on write access
//! - shadowing of a parent mount by a deeper mount point
//! - merged directory listings
//! - real-path rewriting and its fallback

use std::fs;
use std::io::{Read, Write};

use strata_loaders::{DirLoader, MemoryLoader};
use strata_vfs::{MountError, MountFlags, MountStatus, Vfs, WriteHandle};

/// Two on-disk trees, `a/` and `b/`, both with `data/f` of different sizes.
fn disk_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    for (tree, body) in [("a", "from a"), ("b", "from b, longer")] {
        fs::create_dir_all(tmp.path().join(tree).join("data")).unwrap();
        fs::write(tmp.path().join(tree).join("data/f"), body).unwrap();
    }
    fs::write(tmp.path().join("a/data/a_only"), "a").unwrap();
    fs::create_dir_all(tmp.path().join("b/data/b_dir")).unwrap();
    tmp
}

fn read_to_string(vfs: &Vfs, path: &str) -> Option<String> {
    let mut handle = vfs.open_file(path)?;
    let mut text = String::new();
    handle.read_to_string(&mut text).ok()?;
    Some(text)
}

#[test]
fn later_mount_wins_on_disk() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a")));
    let b = vfs.register_loader(DirLoader::new(tmp.path().join("b")));
    vfs.mount(a, "data", "data", MountFlags::read_only()).unwrap();
    vfs.mount(b, "data", "data", MountFlags::read_only()).unwrap();

    let entry = vfs.get_file_entry("data/f");
    assert!(entry.is_file());
    assert_eq!(entry.size, "from b, longer".len() as u64);
    assert_eq!(read_to_string(&vfs, "data/f").as_deref(), Some("from b, longer"));
    assert_eq!(read_to_string(&vfs, "data/a_only").as_deref(), Some("a"));
}

#[test]
fn merged_listing_keeps_higher_priority_entry() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a")));
    let b = vfs.register_loader(DirLoader::new(tmp.path().join("b")));
    vfs.mount(a, "data", "", MountFlags::read_only()).unwrap();
    vfs.mount(b, "data", "", MountFlags::read_only()).unwrap();

    let listing = vfs.get_directory("");
    let names: Vec<&str> = listing.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a_only", "b_dir", "f"]);
    assert_eq!(listing["f"].size, "from b, longer".len() as u64);
}

#[test]
fn read_only_then_writable_mount_stays_read_only() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let ro = vfs.register_loader(DirLoader::new(tmp.path().join("a")).with_read_only(true));
    let rw = vfs.register_loader(DirLoader::new(tmp.path().join("b")));

    let first = vfs.mount(ro, "data", "data", MountFlags::read_only()).unwrap();
    assert_eq!(first.code(), 0);
    let second = vfs.mount(rw, "data", "data", MountFlags::writable()).unwrap();
    assert_eq!(second, MountStatus::ConflictingReadAccess);
    assert_eq!(second.code(), 10);

    assert!(vfs.is_read_only("data"));
    assert!(vfs.open_file_write("data/f").is_none());
    assert!(vfs.open_file_write("data/new.txt").is_none());
    assert!(!tmp.path().join("b/data/new.txt").exists());

    // Both mounts still serve reads
    assert_eq!(read_to_string(&vfs, "data/a_only").as_deref(), Some("a"));
    assert_eq!(read_to_string(&vfs, "data/f").as_deref(), Some("from b, longer"));
}

#[test]
fn writes_go_to_newest_writable_loader() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a")));
    let b = vfs.register_loader(DirLoader::new(tmp.path().join("b")));
    vfs.mount(a, "", "", MountFlags::writable()).unwrap();
    vfs.mount(b, "", "", MountFlags::writable()).unwrap();

    let mut writer = vfs.open_file_write("saves/slot.sav").unwrap();
    writer.write_all(b"checkpoint").unwrap();
    writer.close().unwrap();

    assert_eq!(fs::read(tmp.path().join("b/saves/slot.sav")).unwrap(), b"checkpoint");
    assert!(!tmp.path().join("a/saves").exists());
    assert_eq!(read_to_string(&vfs, "saves/slot.sav").as_deref(), Some("checkpoint"));
}

#[test]
fn falls_through_read_only_loader_when_writing() {
    let mut vfs = Vfs::new();
    let writable = MemoryLoader::new();
    let w = vfs.register_loader(writable.clone());
    let r = vfs.register_loader(MemoryLoader::new().with_read_only(true));
    vfs.mount(w, "", "", MountFlags::writable()).unwrap();
    vfs.mount(r, "", "", MountFlags::writable()).unwrap();

    let mut writer = vfs.open_file_write("log.txt").unwrap();
    writer.write_all(b"line").unwrap();
    drop(writer);
    assert_eq!(writable.contents("log.txt").unwrap().as_ref(), b"line");
}

#[test]
fn deeper_mount_hides_parent_coverage() {
    let root = MemoryLoader::new()
        .with_file("assets/x", "root copy")
        .with_file("readme", "top");
    let assets = MemoryLoader::new().with_file("y", "assets copy");

    let mut vfs = Vfs::new();
    let one = vfs.register_loader(root);
    let two = vfs.register_loader(assets);
    vfs.mount(one, "", "", MountFlags::read_only()).unwrap();
    vfs.mount(two, "", "assets", MountFlags::read_only()).unwrap();

    assert!(!vfs.get_file_entry("assets/x").exists);
    assert!(vfs.open_file("assets/x").is_none());
    assert_eq!(read_to_string(&vfs, "assets/y").as_deref(), Some("assets copy"));
    assert_eq!(read_to_string(&vfs, "readme").as_deref(), Some("top"));
}

#[test]
fn intermediate_mount_directory_has_no_coverage() {
    let mut vfs = Vfs::new();
    let base = vfs.register_loader(MemoryLoader::new().with_file("mods/other.txt", "x"));
    let extra = vfs.register_loader(MemoryLoader::new());
    vfs.mount(base, "", "", MountFlags::read_only()).unwrap();
    vfs.mount(extra, "", "mods/extra", MountFlags::read_only()).unwrap();

    // The walk stops at "mods", which carries no mounts of its own
    assert!(!vfs.get_file_entry("mods/other.txt").exists);
    assert!(vfs.get_directory("mods").is_empty());
}

#[test]
fn real_path_rewrites_into_loader_space() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a")));
    vfs.mount(a, "data", "game/content", MountFlags::read_only()).unwrap();

    assert_eq!(vfs.get_real_path("game/content/f"), "data/f");
    assert_eq!(vfs.get_real_path("/game/./content/a_only"), "data/a_only");
    assert_eq!(vfs.get_real_path("game/content/missing"), "game/content/missing");
    assert_eq!(vfs.get_real_path("elsewhere/f"), "elsewhere/f");
}

#[test]
fn loader_path_may_climb() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a/data")));
    vfs.mount(a, "../../b/data", "other", MountFlags::read_only()).unwrap();

    assert_eq!(read_to_string(&vfs, "other/f").as_deref(), Some("from b, longer"));
    assert_eq!(vfs.get_real_path("other/f"), "../../b/data/f");
}

#[test]
fn failed_mounts_leave_tree_untouched() {
    let tmp = disk_fixture();
    let mut vfs = Vfs::new();
    let a = vfs.register_loader(DirLoader::new(tmp.path().join("a")));

    let err = vfs.mount(5, "", "x", MountFlags::read_only()).unwrap_err();
    assert_eq!(err.code(), -10);
    let err = vfs.mount(a, "nothing", "y", MountFlags::read_only()).unwrap_err();
    assert_eq!(err.code(), -11);
    let err = vfs.mount(a, "data/f", "z", MountFlags::read_only()).unwrap_err();
    assert!(matches!(err, MountError::LoaderPathNotDirectory(_)));

    assert!(vfs.mounts().is_empty());
    vfs.mount(a, "", "", MountFlags::read_only()).unwrap();
    // "x", "y" and "z" were never created, so nothing shadows the root mount
    assert!(vfs.get_file_entry("data/f").exists);
    assert_eq!(vfs.get_directory("").len(), 1);
}
