// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Directory-bundle persistence: one file per regular entry, one directory per
//! directory entry, recursively.
//!
//! Writes go to a hidden sibling staging directory that is swapped into place
//! once complete, so an interrupted save leaves the previous bundle intact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::models::entry::{Entry, EntryKind, ReplacePolicy, TreeError};
use crate::models::package::Package;

/// Failures reading or writing a package on disk.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0:?} is not a package directory")]
    NotADirectory(PathBuf),
    #[error("entry name is not valid UTF-8: {0:?}")]
    NonUtf8Name(PathBuf),
    #[error("package tree rejected an entry: {0}")]
    Tree(#[from] TreeError),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("unsafe or malformed path in archive: {0}")]
    UnsafeArchivePath(String),
    #[error("could not write {path:?} and the previous bundle is left at {backup:?}: {source}")]
    BackupStranded {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a bundle directory into an entry tree.
///
/// Children are listed in name order. Symlinks and special files are skipped.
pub fn read_package(path: &Path) -> Result<Entry, PersistError> {
    let meta = fs::metadata(path).map_err(io_at(path))?;
    if !meta.is_dir() {
        return Err(PersistError::NotADirectory(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let root = read_directory(path, name)?;
    log::info!(
        "event=package_read module=bundle status=ok files={} bytes={}",
        root.file_count(),
        root.total_size()
    );
    Ok(root)
}

fn read_directory(path: &Path, name: String) -> Result<Entry, PersistError> {
    let mut dir = Entry::directory(name);

    let mut children = Vec::new();
    for item in fs::read_dir(path).map_err(io_at(path))? {
        let item = item.map_err(io_at(path))?;
        let child_path = item.path();
        let child_name = item
            .file_name()
            .into_string()
            .map_err(|_| PersistError::NonUtf8Name(child_path.clone()))?;
        children.push((child_name, child_path));
    }
    children.sort();

    for (child_name, child_path) in children {
        let meta = fs::symlink_metadata(&child_path).map_err(io_at(&child_path))?;
        let child = if meta.is_dir() {
            read_directory(&child_path, child_name)?
        } else if meta.is_file() {
            let bytes = fs::read(&child_path).map_err(io_at(&child_path))?;
            Entry::file(child_name, bytes)
        } else {
            log::warn!(
                "event=package_entry_skipped module=bundle status=skipped reason=not_regular path={:?}",
                child_path
            );
            continue;
        };
        dir.add_child(child, ReplacePolicy::Reject)?;
    }

    Ok(dir)
}

/// Write `package` as a bundle directory at `path`, replacing any existing bundle.
pub fn write_package(path: &Path, package: &Package) -> Result<(), PersistError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PersistError::NotADirectory(path.to_path_buf()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if path.exists() && !path.is_dir() {
        return Err(PersistError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(&parent).map_err(io_at(&parent))?;

    let staging = parent.join(format!(".{name}.tmp-{}", Uuid::new_v4()));
    if let Err(err) = write_tree(&staging, package.root()) {
        discard(&staging);
        return Err(err);
    }

    if path.exists() {
        let backup = parent.join(format!(".{name}.old-{}", Uuid::new_v4()));
        if let Err(err) = fs::rename(path, &backup) {
            discard(&staging);
            return Err(io_at(path)(err));
        }
        if let Err(err) = fs::rename(&staging, path) {
            discard(&staging);
            return Err(restore_backup(path, &backup, err));
        }
        if let Err(err) = fs::remove_dir_all(&backup) {
            log::warn!(
                "event=package_backup_cleanup module=bundle status=error path={:?} error={}",
                backup,
                err
            );
        }
    } else {
        fs::rename(&staging, path).map_err(io_at(path))?;
    }

    log::info!(
        "event=package_written module=bundle status=ok files={} bytes={}",
        package.root().file_count(),
        package.root().total_size()
    );
    Ok(())
}

fn write_tree(path: &Path, entry: &Entry) -> Result<(), PersistError> {
    match entry.kind() {
        EntryKind::RegularFile(bytes) => fs::write(path, bytes).map_err(io_at(path)),
        EntryKind::Directory(_) => {
            fs::create_dir(path).map_err(io_at(path))?;
            for child in entry.children() {
                write_tree(&path.join(child.name()), child)?;
            }
            Ok(())
        }
    }
}

/// Move the previous bundle back after a failed swap and build the error.
fn restore_backup(path: &Path, backup: &Path, source: io::Error) -> PersistError {
    match fs::rename(backup, path) {
        Ok(()) => io_at(path)(source),
        Err(err) => {
            log::error!(
                "event=package_restore module=bundle status=error path={:?} backup={:?} error={}",
                path,
                backup,
                err
            );
            PersistError::BackupStranded {
                path: path.to_path_buf(),
                backup: backup.to_path_buf(),
                source,
            }
        }
    }
}

fn discard(path: &Path) {
    if path.exists()
        && let Err(err) = fs::remove_dir_all(path)
    {
        log::warn!(
            "event=staging_cleanup module=bundle status=error path={:?} error={}",
            path,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{PersistError, read_package, restore_backup, write_package};
    use crate::models::entry::{Entry, ReplacePolicy};
    use crate::models::package::{ATTACHMENTS_DIR_NAME, Package, TEXT_FILE_NAME};

    fn sample_package() -> Package {
        let mut package = Package::new();
        package.replace_text(b"{\\rtf1 hi}".to_vec()).unwrap();
        let dir = package.ensure_attachments_dir().unwrap();
        dir.add_child(Entry::file("photo.json", b"{}".to_vec()), ReplacePolicy::Reject)
            .unwrap();
        dir.add_child(Entry::file("empty.bin", Vec::new()), ReplacePolicy::Reject)
            .unwrap();
        package
    }

    #[test]
    fn write_then_read_produces_equal_package() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Note.ideas");
        let package = sample_package();

        write_package(&path, &package).unwrap();

        assert!(path.join(TEXT_FILE_NAME).is_file());
        assert!(path.join(ATTACHMENTS_DIR_NAME).join("photo.json").is_file());
        let read = Package::from_root(read_package(&path).unwrap()).unwrap();
        assert_eq!(read, package);
    }

    #[test]
    fn rewrite_replaces_previous_bundle_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Note.ideas");
        write_package(&path, &sample_package()).unwrap();

        let mut smaller = Package::new();
        smaller.replace_text(b"{\\rtf1 bye}".to_vec()).unwrap();
        write_package(&path, &smaller).unwrap();

        assert!(!path.join(ATTACHMENTS_DIR_NAME).exists());
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "staging and backup dirs are cleaned up");
    }

    #[test]
    fn read_package_rejects_regular_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("not-a-bundle.rtf");
        fs::write(&path, b"{\\rtf1}").unwrap();

        assert!(matches!(
            read_package(&path),
            Err(PersistError::NotADirectory(_))
        ));
    }

    #[test]
    fn read_package_reports_missing_paths() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            read_package(&tmp.path().join("missing")),
            Err(PersistError::Io { .. })
        ));
    }

    #[test]
    fn read_package_lists_children_by_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.ideas");
        fs::create_dir_all(path.join("nested")).unwrap();
        fs::write(path.join("zeta"), b"z").unwrap();
        fs::write(path.join("alpha"), b"a").unwrap();
        fs::write(path.join("nested").join("inner"), b"i").unwrap();

        let root = read_package(&path).unwrap();
        let names: Vec<_> = root.children().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["alpha", "nested", "zeta"]);
        assert_eq!(root.name(), "b.ideas");
        assert_eq!(root.file_count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn read_package_skips_symlinks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.ideas");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("real"), b"r").unwrap();
        std::os::unix::fs::symlink(path.join("real"), path.join("link")).unwrap();

        let root = read_package(&path).unwrap();
        assert!(root.get_child("link").is_none());
        assert!(root.get_child("real").is_some());
    }

    #[test]
    fn write_package_refuses_to_replace_a_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("occupied");
        fs::write(&path, b"keep me").unwrap();

        assert!(matches!(
            write_package(&path, &sample_package()),
            Err(PersistError::NotADirectory(_))
        ));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn failed_swap_restores_previous_bundle() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Note.ideas");
        let backup = tmp.path().join(".Note.ideas.old");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join(TEXT_FILE_NAME), b"{\\rtf1 old}").unwrap();

        let err = restore_backup(&path, &backup, std::io::Error::other("swap failed"));

        assert!(matches!(err, PersistError::Io { path: ref p, .. } if *p == path));
        assert_eq!(fs::read(path.join(TEXT_FILE_NAME)).unwrap(), b"{\\rtf1 old}");
        assert!(!backup.exists());
    }

    #[test]
    fn failed_restore_reports_where_the_backup_is() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Note.ideas");
        let backup = tmp.path().join("gone").join(".Note.ideas.old");

        let err = restore_backup(&path, &backup, std::io::Error::other("swap failed"));

        assert!(err.to_string().contains(&format!("{backup:?}")));
        match err {
            PersistError::BackupStranded {
                path: p, backup: b, ..
            } => {
                assert_eq!(p, path);
                assert_eq!(b, backup);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    mod property_tests {
        use std::collections::BTreeMap;

        use proptest::prelude::*;
        use tempfile::TempDir;

        use super::super::{read_package, write_package};
        use crate::models::entry::{Entry, ReplacePolicy};
        use crate::models::package::Package;

        fn build(
            files: &BTreeMap<String, Vec<u8>>,
            dirs: &BTreeMap<String, BTreeMap<String, Vec<u8>>>,
            remove_first: bool,
        ) -> Package {
            let mut root = Entry::directory("");
            for (name, bytes) in files {
                root.add_child(Entry::file(name.clone(), bytes.clone()), ReplacePolicy::Reject)
                    .unwrap();
            }
            for (name, inner) in dirs {
                let mut dir = Entry::directory(name.clone());
                for (child, bytes) in inner {
                    dir.add_child(Entry::file(child.clone(), bytes.clone()), ReplacePolicy::Reject)
                        .unwrap();
                }
                root.add_child(dir, ReplacePolicy::Reject).unwrap();
            }
            if remove_first && let Some(first) = files.keys().next() {
                root.remove_child(first);
            }
            Package::from_root(root).unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn bundle_roundtrip_preserves_tree(
                files in prop::collection::btree_map(
                    "f[a-z]{1,6}(\\.[a-z]{1,3})?",
                    prop::collection::vec(any::<u8>(), 0..64),
                    0..5,
                ),
                dirs in prop::collection::btree_map(
                    "d[a-z]{1,6}",
                    prop::collection::btree_map(
                        "[a-z]{1,6}",
                        prop::collection::vec(any::<u8>(), 0..16),
                        0..3,
                    ),
                    0..3,
                ),
                remove_first in any::<bool>(),
            ) {
                let package = build(&files, &dirs, remove_first);
                let tmp = TempDir::new().unwrap();
                let path = tmp.path().join("p.ideas");

                write_package(&path, &package).unwrap();
                let read = Package::from_root(read_package(&path).unwrap()).unwrap();
                prop_assert_eq!(read, package);
            }
        }
    }
}
