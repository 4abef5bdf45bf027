// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Document package: a root directory holding `Text.rtf` and an optional
//! `Attachments` directory.

use crate::models::entry::{Entry, ReplacePolicy, TreeError};

/// Name of the rich-text payload inside a package.
pub const TEXT_FILE_NAME: &str = "Text.rtf";

/// Name of the lazily created attachments directory inside a package.
pub const ATTACHMENTS_DIR_NAME: &str = "Attachments";

/// Root entry of a document bundle plus the well-known-name rules.
#[derive(Clone, Debug)]
pub struct Package {
    root: Entry,
}

// The root's own name is wherever the bundle happens to live on disk.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.root.kind() == other.root.kind()
    }
}

impl Eq for Package {}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

impl Package {
    /// Empty package for a brand-new document.
    pub fn new() -> Self {
        Self {
            root: Entry::directory(""),
        }
    }

    /// Wrap an existing root. Returns the entry back when it is not a directory.
    pub fn from_root(root: Entry) -> Result<Self, Entry> {
        if root.is_directory() {
            Ok(Self { root })
        } else {
            Err(root)
        }
    }

    pub fn root(&self) -> &Entry {
        &self.root
    }

    pub fn into_root(self) -> Entry {
        self.root
    }

    /// The `Text.rtf` entry, if present.
    pub fn text_entry(&self) -> Option<&Entry> {
        self.root.get_child(TEXT_FILE_NAME)
    }

    /// Store freshly encoded text, detaching any previous `Text.rtf`.
    pub fn replace_text(&mut self, bytes: Vec<u8>) -> Result<(), TreeError> {
        self.root
            .add_child(Entry::file(TEXT_FILE_NAME, bytes), ReplacePolicy::Replace)
            .map(|_| ())
    }

    /// The `Attachments` entry as stored. May be a regular file in a damaged bundle.
    pub fn attachments_entry(&self) -> Option<&Entry> {
        self.root.get_child(ATTACHMENTS_DIR_NAME)
    }

    /// The `Attachments` directory, `None` when it was never created.
    pub fn attachments_dir(&self) -> Option<&Entry> {
        self.attachments_entry().filter(|entry| entry.is_directory())
    }

    /// Return the `Attachments` directory, creating it on first use.
    ///
    /// Fails with [`TreeError::NotADirectory`] when the name is occupied by a
    /// regular file.
    pub fn ensure_attachments_dir(&mut self) -> Result<&mut Entry, TreeError> {
        if self.root.get_child(ATTACHMENTS_DIR_NAME).is_none() {
            log::debug!("event=attachments_dir_created module=package status=ok");
            self.root.add_child(
                Entry::directory(ATTACHMENTS_DIR_NAME),
                ReplacePolicy::Reject,
            )?;
        }
        match self.root.get_child_mut(ATTACHMENTS_DIR_NAME) {
            Some(dir) if dir.is_directory() => Ok(dir),
            _ => Err(TreeError::NotADirectory(ATTACHMENTS_DIR_NAME.to_string())),
        }
    }

    /// Existing `Attachments` directory for mutation, without creating it.
    pub fn attachments_dir_mut(&mut self) -> Option<&mut Entry> {
        self.root
            .get_child_mut(ATTACHMENTS_DIR_NAME)
            .filter(|entry| entry.is_directory())
    }

    /// Attachments in insertion order; empty when the directory does not exist.
    pub fn attachments(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.attachments_dir()
            .into_iter()
            .flat_map(|dir| dir.children())
    }
}

#[cfg(test)]
mod tests {
    use super::{ATTACHMENTS_DIR_NAME, Package, TEXT_FILE_NAME};
    use crate::models::entry::{Entry, ReplacePolicy, TreeError};

    #[test]
    fn new_package_has_no_text_and_no_attachments() {
        let package = Package::new();
        assert!(package.text_entry().is_none());
        assert!(package.attachments_dir().is_none());
        assert_eq!(package.attachments().count(), 0);
    }

    #[test]
    fn from_root_rejects_regular_files() {
        let file = Entry::file("note", b"x".to_vec());
        assert!(Package::from_root(file).is_err());
    }

    #[test]
    fn replace_text_keeps_single_text_entry() {
        let mut package = Package::new();
        package.replace_text(b"one".to_vec()).unwrap();
        package.replace_text(b"two".to_vec()).unwrap();

        let texts = package
            .root()
            .children()
            .filter(|e| e.name() == TEXT_FILE_NAME)
            .count();
        assert_eq!(texts, 1);
        assert_eq!(
            package.text_entry().and_then(Entry::regular_file_bytes),
            Some(&b"two"[..])
        );
    }

    #[test]
    fn attachments_dir_is_created_once_and_survives_emptying() {
        let mut package = Package::new();
        package
            .ensure_attachments_dir()
            .unwrap()
            .add_child(Entry::file("a.txt", b"a".to_vec()), ReplacePolicy::Reject)
            .unwrap();
        package.ensure_attachments_dir().unwrap();
        assert_eq!(package.attachments().count(), 1);

        package.attachments_dir_mut().unwrap().remove_child("a.txt");
        assert!(package.attachments_dir().is_some());
        assert_eq!(package.attachments().count(), 0);
    }

    #[test]
    fn ensure_attachments_dir_fails_when_name_is_a_file() {
        let mut root = Entry::directory("");
        root.add_child(
            Entry::file(ATTACHMENTS_DIR_NAME, b"oops".to_vec()),
            ReplacePolicy::Reject,
        )
        .unwrap();
        let mut package = Package::from_root(root).unwrap();

        assert_eq!(
            package.ensure_attachments_dir().unwrap_err(),
            TreeError::NotADirectory(ATTACHMENTS_DIR_NAME.into())
        );
        assert_eq!(package.attachments().count(), 0);
    }
}
