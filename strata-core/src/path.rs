//! Canonical path abstraction
//!
//! A [`CanonicalPath`] is parsed once from user input and never changes. It
//! keeps its joined string form together with the byte offset of every
//! component, so a [`PathView`] can hand out any suffix as a borrowed `&str`.

use serde::{Serialize, Serializer};
use std::fmt;

/// Normalized slash-delimited path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    /// Path components, never empty, `.` or `..`
    components: Vec<String>,
    /// Input started with `/`
    absolute: bool,
    /// Leading ascends retained because climbing was allowed
    climbs: usize,
    /// Joined string form
    full: String,
    /// Byte offset of each component in `full`
    offsets: Vec<usize>,
}

impl CanonicalPath {
    /// Parse `input`, collapsing `.`, empty segments and `..`.
    ///
    /// A `..` with no preceding component is kept as an ascend when
    /// `allow_climb` is set and silently dropped otherwise. Absolute paths
    /// never climb: `..` at the origin is always dropped.
    pub fn new(input: &str, allow_climb: bool) -> Self {
        let mut components: Vec<String> = Vec::new();
        let mut absolute = false;
        let mut climbs = 0;

        for (index, part) in input.split('/').enumerate() {
            match part {
                "" => {
                    if index == 0 && !input.is_empty() {
                        absolute = true;
                    }
                }
                "." => {}
                ".." => {
                    if components.pop().is_none() && allow_climb && !absolute {
                        climbs += 1;
                    }
                }
                _ => components.push(part.to_string()),
            }
        }

        Self::from_parts(components, absolute, climbs)
    }

    /// Empty relative path
    pub fn root() -> Self {
        Self::from_parts(Vec::new(), false, 0)
    }

    fn from_parts(components: Vec<String>, absolute: bool, climbs: usize) -> Self {
        let mut full = String::new();
        if absolute {
            full.push('/');
        }
        for index in 0..climbs {
            if index > 0 {
                full.push('/');
            }
            full.push_str("..");
        }

        let mut offsets = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            if index > 0 || climbs > 0 {
                full.push('/');
            }
            offsets.push(full.len());
            full.push_str(component);
        }

        Self {
            components,
            absolute,
            climbs,
            full,
            offsets,
        }
    }

    /// Append the components of `suffix` and re-canonicalize with climbing
    /// allowed. Ascends carried by a full-length view are kept.
    pub fn join(&self, suffix: PathView<'_>) -> Self {
        if suffix.is_empty() && suffix.climb_count() == 0 {
            return self.clone();
        }

        let mut joined = self.full.clone();
        let mut push = |segment: &str| {
            if !joined.is_empty() && !joined.ends_with('/') {
                joined.push('/');
            }
            joined.push_str(segment);
        };
        for _ in 0..suffix.climb_count() {
            push("..");
        }
        for component in suffix.iter() {
            push(component);
        }

        Self::new(&joined, true)
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// Number of components, not counting retained ascends
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn climbs_up(&self) -> bool {
        self.climbs > 0
    }

    pub fn climb_count(&self) -> usize {
        self.climbs
    }

    pub fn name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// View over the whole path
    pub fn view(&self) -> PathView<'_> {
        PathView { path: self, offset: 0 }
    }

    /// View starting at component `offset`, clamped to the path length
    pub fn view_from(&self, offset: usize) -> PathView<'_> {
        PathView {
            path: self,
            offset: offset.min(self.components.len()),
        }
    }
}

impl Default for CanonicalPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl Serialize for CanonicalPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

/// Borrowed suffix of a [`CanonicalPath`]
#[derive(Debug, Clone, Copy)]
pub struct PathView<'a> {
    path: &'a CanonicalPath,
    offset: usize,
}

impl<'a> PathView<'a> {
    pub fn path(&self) -> &'a CanonicalPath {
        self.path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Components remaining after the offset
    pub fn len(&self) -> usize {
        self.path.components.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component at `index`, relative to the offset
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.path
            .components
            .get(self.offset + index)
            .map(String::as_str)
    }

    pub fn first(&self) -> Option<&'a str> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.path.components[self.offset..].iter().map(String::as_str)
    }

    /// Suffix string. A full view includes the leading `/` or `../` of the
    /// underlying path.
    pub fn as_str(&self) -> &'a str {
        if self.offset == 0 {
            &self.path.full
        } else if self.offset >= self.path.offsets.len() {
            ""
        } else {
            &self.path.full[self.path.offsets[self.offset]..]
        }
    }

    /// Narrower view `n` components further in
    pub fn advance(&self, n: usize) -> PathView<'a> {
        self.path.view_from(self.offset + n)
    }

    /// Ascends only belong to a view that starts at the path origin
    pub fn climb_count(&self) -> usize {
        if self.offset == 0 {
            self.path.climbs
        } else {
            0
        }
    }

    pub fn climbs_up(&self) -> bool {
        self.climb_count() > 0
    }

    pub fn is_absolute(&self) -> bool {
        self.offset == 0 && self.path.absolute
    }
}

impl fmt::Display for PathView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
