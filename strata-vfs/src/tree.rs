// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mount tree
//!
//! One node per virtual directory that appears on some mounted path. Nodes
//! are created only while mounting and never removed.

use serde::Serialize;
use std::collections::BTreeMap;
use strata_core::{CanonicalPath, PathView};

/// Registration index of a loader
pub type LoaderId = usize;

/// Mount options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountFlags {
    /// Allow writes through this mount
    pub write: bool,
}

impl MountFlags {
    pub fn read_only() -> Self {
        Self { write: false }
    }

    pub fn writable() -> Self {
        Self { write: true }
    }
}

/// Outcome of a successful mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MountStatus {
    Mounted,
    /// Mounted, but the target directory was forced read-only because its
    /// mounts disagree on write access
    ConflictingReadAccess,
}

impl MountStatus {
    /// Numeric result code
    pub fn code(&self) -> i32 {
        match self {
            MountStatus::Mounted => 0,
            MountStatus::ConflictingReadAccess => 10,
        }
    }

    pub fn is_warning(&self) -> bool {
        *self != MountStatus::Mounted
    }
}

/// A loader sub-path attached to a node
#[derive(Debug, Clone)]
pub(crate) struct Mount {
    pub loader: LoaderId,
    pub root: CanonicalPath,
    pub write: bool,
}

#[derive(Debug)]
pub(crate) struct MountNode {
    pub children: BTreeMap<String, MountNode>,
    pub read_only: bool,
    /// Mount order; queries walk it back to front
    pub mounts: Vec<Mount>,
}

impl MountNode {
    pub fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            read_only: true,
            mounts: Vec::new(),
        }
    }

    /// Walk down `path`, creating missing nodes.
    pub fn descend_or_create(&mut self, path: PathView<'_>) -> &mut MountNode {
        let mut node = self;
        for component in path.iter() {
            node = node
                .children
                .entry(component.to_string())
                .or_insert_with(MountNode::new);
        }
        node
    }

    /// Walk down `path` while children match. Returns the deepest node
    /// reached and the unmatched remainder.
    pub fn descend<'n, 'p>(&'n self, path: PathView<'p>) -> (&'n MountNode, PathView<'p>) {
        let mut node = self;
        let mut rest = path;
        while let Some(component) = rest.first() {
            match node.children.get(component) {
                Some(child) => {
                    node = child;
                    rest = rest.advance(1);
                }
                None => break,
            }
        }
        (node, rest)
    }

    /// Append a mount, settling the read-only flag.
    ///
    /// The first mount sets the flag from its posture. A later mount whose
    /// posture differs from the current flag forces it to read-only for good.
    pub fn add_mount(&mut self, mount: Mount) -> MountStatus {
        let read_only = !mount.write;
        let status = if self.mounts.is_empty() {
            self.read_only = read_only;
            MountStatus::Mounted
        } else if self.read_only != read_only {
            self.read_only = true;
            MountStatus::ConflictingReadAccess
        } else {
            MountStatus::Mounted
        };
        self.mounts.push(mount);
        status
    }

    /// Depth-first visit of every node with its virtual path
    pub fn walk<'n>(&'n self, prefix: &mut Vec<&'n str>, visit: &mut dyn FnMut(&[&'n str], &'n MountNode)) {
        visit(prefix, self);
        for (name, child) in &self.children {
            prefix.push(name);
            child.walk(prefix, visit);
            prefix.pop();
        }
    }
}
