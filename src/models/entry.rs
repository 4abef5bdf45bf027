// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Package tree nodes: named regular files and directories of named children.
//!
//! A directory keeps its children in insertion order and indexes them by
//! name, so lookups are O(1) while listings stay stable. Ownership is strictly
//! downward; a child never refers to its parent.

use std::collections::HashMap;

use thiserror::Error;

/// Failures raised by tree mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A sibling with this name already exists and the call site forbids replacement.
    #[error("an entry named `{0}` already exists")]
    DuplicateNameConflict(String),
    /// The operation needs a directory but the entry is a regular file.
    #[error("`{0}` is not a directory")]
    NotADirectory(String),
    /// No child with this name exists.
    #[error("no entry named `{0}`")]
    NotFound(String),
    /// The name cannot be used for an entry inside a package.
    #[error("invalid entry name `{0}`")]
    InvalidName(String),
}

/// Whether `add_child` may silently replace a same-named sibling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Detach the old sibling and insert the new entry in its place.
    #[default]
    Replace,
    /// Fail with [`TreeError::DuplicateNameConflict`].
    Reject,
}

/// Content of an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile(Vec<u8>),
    Directory(Children),
}

/// A single named node of a package tree.
#[derive(Clone, Debug)]
pub struct Entry {
    name: String,
    kind: EntryKind,
}

/// Insertion-ordered, unique-by-name children of a directory.
#[derive(Clone, Debug, Default)]
pub struct Children {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

/// Check whether `name` can be used as a single path component in a package.
///
/// Rejects empty names, `.`/`..`, and names carrying `/`, `\` or NUL.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

impl Entry {
    /// Wrap bytes as a regular file.
    pub fn file(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::RegularFile(bytes.into()),
        }
    }

    /// Create an empty directory.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory(Children::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory(_))
    }

    pub fn is_regular_file(&self) -> bool {
        matches!(self.kind, EntryKind::RegularFile(_))
    }

    /// Bytes of a regular file, `None` for directories.
    pub fn regular_file_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::RegularFile(bytes) => Some(bytes),
            EntryKind::Directory(_) => None,
        }
    }

    /// Look up a direct child by name. `None` when absent or when `self` is a file.
    pub fn get_child(&self, name: &str) -> Option<&Entry> {
        match &self.kind {
            EntryKind::Directory(children) => children.get(name),
            EntryKind::RegularFile(_) => None,
        }
    }

    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut Entry> {
        match &mut self.kind {
            EntryKind::Directory(children) => children.get_mut(name),
            EntryKind::RegularFile(_) => None,
        }
    }

    /// Insert `entry` as a child of this directory.
    ///
    /// With [`ReplacePolicy::Replace`] a same-named sibling is detached and
    /// returned; the new entry always lands at the end of the listing.
    pub fn add_child(
        &mut self,
        entry: Entry,
        policy: ReplacePolicy,
    ) -> Result<Option<Entry>, TreeError> {
        if !is_valid_name(&entry.name) {
            return Err(TreeError::InvalidName(entry.name));
        }
        let children = self.children_mut()?;
        if children.contains(&entry.name) && policy == ReplacePolicy::Reject {
            return Err(TreeError::DuplicateNameConflict(entry.name));
        }
        let replaced = children.remove(&entry.name);
        children.push(entry);
        Ok(replaced)
    }

    /// Detach and return the named child, if present.
    pub fn remove_child(&mut self, name: &str) -> Option<Entry> {
        match &mut self.kind {
            EntryKind::Directory(children) => children.remove(name),
            EntryKind::RegularFile(_) => None,
        }
    }

    /// Rename a child in place, keeping its position in the listing.
    pub fn rename_child(&mut self, old: &str, new: &str) -> Result<(), TreeError> {
        if !is_valid_name(new) {
            return Err(TreeError::InvalidName(new.to_string()));
        }
        let children = self.children_mut()?;
        if old == new {
            return if children.contains(old) {
                Ok(())
            } else {
                Err(TreeError::NotFound(old.to_string()))
            };
        }
        if children.contains(new) {
            return Err(TreeError::DuplicateNameConflict(new.to_string()));
        }
        let pos = children
            .index
            .remove(old)
            .ok_or_else(|| TreeError::NotFound(old.to_string()))?;
        children.entries[pos].name = new.to_string();
        children.index.insert(new.to_string(), pos);
        Ok(())
    }

    /// Children in insertion order. Empty for regular files.
    ///
    /// Every call returns a fresh iterator.
    pub fn children(&self) -> impl Iterator<Item = &Entry> + '_ {
        let slice: &[Entry] = match &self.kind {
            EntryKind::Directory(children) => &children.entries,
            EntryKind::RegularFile(_) => &[],
        };
        slice.iter()
    }

    /// Number of direct children (0 for files).
    pub fn child_count(&self) -> usize {
        match &self.kind {
            EntryKind::Directory(children) => children.entries.len(),
            EntryKind::RegularFile(_) => 0,
        }
    }

    /// Total bytes of all regular files in this subtree.
    pub fn total_size(&self) -> u64 {
        match &self.kind {
            EntryKind::RegularFile(bytes) => bytes.len() as u64,
            EntryKind::Directory(children) => {
                children.entries.iter().map(Entry::total_size).sum()
            }
        }
    }

    /// Number of regular files in this subtree.
    pub fn file_count(&self) -> usize {
        match &self.kind {
            EntryKind::RegularFile(_) => 1,
            EntryKind::Directory(children) => {
                children.entries.iter().map(Entry::file_count).sum()
            }
        }
    }

    fn children_mut(&mut self) -> Result<&mut Children, TreeError> {
        match &mut self.kind {
            EntryKind::Directory(children) => Ok(children),
            EntryKind::RegularFile(_) => Err(TreeError::NotADirectory(self.name.clone())),
        }
    }
}

// Child order is not part of equality: a bundle read back from disk lists
// entries in filesystem order.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for Entry {}

impl Children {
    fn get(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        match self.index.get(name) {
            Some(&pos) => Some(&mut self.entries[pos]),
            None => None,
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn push(&mut self, entry: Entry) {
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    fn remove(&mut self, name: &str) -> Option<Entry> {
        let pos = self.index.remove(name)?;
        let removed = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }
}

impl PartialEq for Children {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|entry| other.get(&entry.name) == Some(entry))
    }
}

impl Eq for Children {}

#[cfg(test)]
mod tests {
    use super::{Entry, ReplacePolicy, TreeError, is_valid_name};

    fn names(dir: &Entry) -> Vec<&str> {
        dir.children().map(Entry::name).collect()
    }

    #[test]
    fn get_child_returns_none_when_absent() {
        let dir = Entry::directory("root");
        assert!(dir.get_child("missing").is_none());
        assert!(Entry::file("f", b"x".to_vec()).get_child("any").is_none());
    }

    #[test]
    fn add_child_preserves_insertion_order() {
        let mut dir = Entry::directory("root");
        for name in ["b", "a", "c"] {
            dir.add_child(Entry::file(name, name.as_bytes()), ReplacePolicy::Reject)
                .unwrap();
        }
        assert_eq!(names(&dir), vec!["b", "a", "c"]);
        // A second listing starts from the beginning again.
        assert_eq!(dir.children().count(), 3);
    }

    #[test]
    fn add_child_replaces_and_returns_old_entry() {
        let mut dir = Entry::directory("root");
        dir.add_child(Entry::file("Text.rtf", b"old".to_vec()), ReplacePolicy::Replace)
            .unwrap();
        dir.add_child(Entry::file("other", b"o".to_vec()), ReplacePolicy::Replace)
            .unwrap();

        let old = dir
            .add_child(Entry::file("Text.rtf", b"new".to_vec()), ReplacePolicy::Replace)
            .unwrap()
            .expect("old entry detached");

        assert_eq!(old.regular_file_bytes(), Some(&b"old"[..]));
        assert_eq!(
            dir.get_child("Text.rtf").and_then(Entry::regular_file_bytes),
            Some(&b"new"[..])
        );
        assert_eq!(names(&dir), vec!["other", "Text.rtf"]);
    }

    #[test]
    fn add_child_rejects_duplicates_when_policy_forbids() {
        let mut dir = Entry::directory("root");
        dir.add_child(Entry::file("a.txt", b"1".to_vec()), ReplacePolicy::Reject)
            .unwrap();
        let err = dir
            .add_child(Entry::file("a.txt", b"2".to_vec()), ReplacePolicy::Reject)
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateNameConflict("a.txt".into()));
        assert_eq!(
            dir.get_child("a.txt").and_then(Entry::regular_file_bytes),
            Some(&b"1"[..])
        );
    }

    #[test]
    fn add_child_on_file_fails() {
        let mut file = Entry::file("plain", Vec::new());
        let err = file
            .add_child(Entry::file("x", Vec::new()), ReplacePolicy::Replace)
            .unwrap_err();
        assert_eq!(err, TreeError::NotADirectory("plain".into()));
    }

    #[test]
    fn remove_child_detaches_and_keeps_index_consistent() {
        let mut dir = Entry::directory("root");
        for name in ["a", "b", "c"] {
            dir.add_child(Entry::file(name, Vec::new()), ReplacePolicy::Reject)
                .unwrap();
        }
        let removed = dir.remove_child("a").expect("removed");
        assert_eq!(removed.name(), "a");
        assert!(dir.remove_child("a").is_none());
        assert_eq!(dir.get_child("c").map(Entry::name), Some("c"));
        assert_eq!(names(&dir), vec!["b", "c"]);
    }

    #[test]
    fn rename_child_updates_key_and_keeps_position() {
        let mut dir = Entry::directory("root");
        for name in ["a", "b"] {
            dir.add_child(Entry::file(name, Vec::new()), ReplacePolicy::Reject)
                .unwrap();
        }
        dir.rename_child("a", "z").unwrap();
        assert!(dir.get_child("a").is_none());
        assert_eq!(dir.get_child("z").map(Entry::name), Some("z"));
        assert_eq!(names(&dir), vec!["z", "b"]);

        assert_eq!(
            dir.rename_child("z", "b"),
            Err(TreeError::DuplicateNameConflict("b".into()))
        );
        assert_eq!(
            dir.rename_child("nope", "y"),
            Err(TreeError::NotFound("nope".into()))
        );
    }

    #[test]
    fn nested_directories_are_allowed() {
        let mut inner = Entry::directory("inner");
        inner
            .add_child(Entry::file("deep.bin", vec![1, 2, 3]), ReplacePolicy::Reject)
            .unwrap();
        let mut root = Entry::directory("root");
        root.add_child(inner, ReplacePolicy::Reject).unwrap();
        root.add_child(Entry::file("top", vec![9]), ReplacePolicy::Reject)
            .unwrap();

        assert_eq!(root.total_size(), 4);
        assert_eq!(root.file_count(), 2);
        assert!(root.get_child("inner").unwrap().is_directory());
    }

    #[test]
    fn equality_ignores_child_order() {
        let mut left = Entry::directory("root");
        let mut right = Entry::directory("root");
        for name in ["a", "b"] {
            left.add_child(Entry::file(name, name.as_bytes()), ReplacePolicy::Reject)
                .unwrap();
        }
        for name in ["b", "a"] {
            right
                .add_child(Entry::file(name, name.as_bytes()), ReplacePolicy::Reject)
                .unwrap();
        }
        assert_eq!(left, right);

        right.remove_child("a");
        right
            .add_child(Entry::file("a", b"changed".to_vec()), ReplacePolicy::Reject)
            .unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("a/b"));
        assert!(is_valid_name(".bashrc"));

        let mut dir = Entry::directory("root");
        assert_eq!(
            dir.add_child(Entry::file("a/b", Vec::new()), ReplacePolicy::Replace),
            Err(TreeError::InvalidName("a/b".into()))
        );
    }
}
