// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Shared helper utilities reused by the document model and the CLI.

pub mod file_icons;
pub mod file_types;
pub mod hash;
pub mod sanitize_component;

/// Pick an icon category for the given MIME/name.
pub use file_icons::{FileCategory, category_for};
/// Extension extraction and type classification.
pub use file_types::{
    MimeTypeResolver, TypeIdentifier, TypeResolver, conforms_to, extension_of, mime_for_name,
    type_identifier_for,
};
/// Compute the SHA-256 hash of attachment bytes.
pub use hash::hash_bytes;
/// Sanitize user-provided strings into filesystem-safe path components.
pub use sanitize_component::{sanitize_component, unique_name};
