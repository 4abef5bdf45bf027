// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Attachment display metadata derived from package entries (UI-agnostic).

use serde::Serialize;

use crate::models::entry::Entry;
use crate::utils::{FileCategory, category_for, hash_bytes, mime_for_name};

/// Metadata shown for one attachment in a listing.
///
/// Derived on demand from the entry; renaming the entry means building a new summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    pub name: String,
    pub mime: String,
    pub category: FileCategory,
    pub size: u64,
    /// SHA-256 of the file contents; `None` for nested directories.
    pub sha256: Option<String>,
}

impl AttachmentSummary {
    pub fn from_entry(entry: &Entry) -> Self {
        let mime = mime_for_name(entry.name());
        Self {
            name: entry.name().to_string(),
            category: category_for(&mime, entry.name()),
            mime,
            size: entry.total_size(),
            sha256: entry.regular_file_bytes().map(hash_bytes),
        }
    }
}

/// Human-readable formatting for byte sizes with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
