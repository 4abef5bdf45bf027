// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Single-file ZIP form of a package.
//!
//! Layout: one root folder named after the archive file, holding `Text.rtf` and
//! the `Attachments/` directory exactly as the bundle form does.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::FileOptions};

use crate::logic::bundle::PersistError;
use crate::models::entry::{Entry, EntryKind, ReplacePolicy, is_valid_name};
use crate::models::package::Package;
use crate::utils::sanitize_component;

/// File extension used for exported archives.
pub const ARCHIVE_EXTENSION: &str = "ideaz";

/// Force a specific extension onto a path when it is missing or different.
///
/// Keeps existing matching extension (case-insensitive); otherwise replaces it.
pub fn ensure_extension(mut path: PathBuf, extension: &str) -> PathBuf {
    let replace = !matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case(extension)
    );

    if replace {
        path.set_extension(extension);
    }
    path
}

/// Write `package` as a ZIP archive at `output` (extension forced to `.ideaz`).
///
/// Parent directories are created if missing. Returns the final archive path.
pub fn export_archive(output: &Path, package: &Package) -> Result<PathBuf, PersistError> {
    let output = ensure_extension(output.to_path_buf(), ARCHIVE_EXTENSION);
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| PersistError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let root_folder = sanitize_component(
        output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("note"),
    );
    let file = File::create(&output).map_err(|source| PersistError::Io {
        path: output.clone(),
        source,
    })?;
    write_archive(file, &root_folder, package)?;

    log::info!(
        "event=archive_exported module=archive status=ok files={} bytes={}",
        package.root().file_count(),
        package.root().total_size()
    );
    Ok(output)
}

/// Encode `package` as in-memory ZIP bytes under `root_folder/`.
pub fn archive_bytes(root_folder: &str, package: &Package) -> Result<Vec<u8>, PersistError> {
    let cursor = write_archive(Cursor::new(Vec::new()), root_folder, package)?;
    Ok(cursor.into_inner())
}

fn write_archive<W: Write + Seek>(
    sink: W,
    root_folder: &str,
    package: &Package,
) -> Result<W, PersistError> {
    let mut zip = ZipWriter::new(sink);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let root_prefix = format!("{root_folder}/");
    zip.add_directory(&root_prefix, options)?;
    for child in package.root().children() {
        write_entry(&mut zip, &root_prefix, child, options)?;
    }
    Ok(zip.finish()?)
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    prefix: &str,
    entry: &Entry,
    options: FileOptions<'_, ()>,
) -> Result<(), PersistError> {
    match entry.kind() {
        EntryKind::RegularFile(bytes) => {
            let archive_path = format!("{prefix}{}", entry.name());
            zip.start_file(&archive_path, options)?;
            zip.write_all(bytes).map_err(|source| PersistError::Io {
                path: PathBuf::from(archive_path),
                source,
            })?;
        }
        EntryKind::Directory(_) => {
            let dir_prefix = format!("{prefix}{}/", entry.name());
            zip.add_directory(&dir_prefix, options)?;
            for child in entry.children() {
                write_entry(zip, &dir_prefix, child, options)?;
            }
        }
    }
    Ok(())
}

/// Rebuild a package tree from ZIP bytes produced by [`export_archive`].
///
/// Every member must live under a single root folder; absolute paths, `..`
/// components and names the tree would reject are refused.
pub fn read_archive(bytes: &[u8]) -> Result<Entry, PersistError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut root: Option<Entry> = None;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let raw_name = member.name().to_string();
        let components = split_member_path(&raw_name)?;
        let Some((first, rest)) = components.split_first() else {
            continue;
        };

        // The first member names the root folder; every later one must share it.
        let tree = root.get_or_insert_with(|| Entry::directory(*first));
        if tree.name() != *first {
            return Err(PersistError::UnsafeArchivePath(raw_name));
        }

        if member.is_dir() {
            directory_at(tree, rest, &raw_name)?;
            continue;
        }
        let Some((file_name, parents)) = rest.split_last() else {
            return Err(PersistError::UnsafeArchivePath(raw_name));
        };
        // Declared sizes are untrusted; cap the hint at the archive length.
        let hint = member.size().min(bytes.len() as u64) as usize;
        let mut contents = Vec::with_capacity(hint);
        member
            .read_to_end(&mut contents)
            .map_err(|source| PersistError::Io {
                path: PathBuf::from(&raw_name),
                source,
            })?;
        let parent = directory_at(tree, parents, &raw_name)?;
        parent.add_child(Entry::file(*file_name, contents), ReplacePolicy::Reject)?;
    }

    let root = root.unwrap_or_else(|| Entry::directory(""));
    log::info!(
        "event=archive_read module=archive status=ok files={} bytes={}",
        root.file_count(),
        root.total_size()
    );
    Ok(root)
}

fn split_member_path(raw: &str) -> Result<Vec<&str>, PersistError> {
    if raw.starts_with('/') || raw.contains('\\') {
        return Err(PersistError::UnsafeArchivePath(raw.to_string()));
    }
    let components: Vec<&str> = raw.split('/').filter(|c| !c.is_empty()).collect();
    if components.iter().any(|c| !is_valid_name(c)) {
        return Err(PersistError::UnsafeArchivePath(raw.to_string()));
    }
    Ok(components)
}

/// Walk to the directory at `components`, creating missing levels.
fn directory_at<'e>(
    root: &'e mut Entry,
    components: &[&str],
    raw_name: &str,
) -> Result<&'e mut Entry, PersistError> {
    let mut current = root;
    for name in components {
        if current.get_child(name).is_none() {
            current.add_child(Entry::directory(*name), ReplacePolicy::Reject)?;
        }
        current = current
            .get_child_mut(name)
            .filter(|entry| entry.is_directory())
            .ok_or_else(|| PersistError::UnsafeArchivePath(raw_name.to_string()))?;
    }
    Ok(current)
}
