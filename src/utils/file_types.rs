// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Filename extension extraction and semantic file-type classification.
//!
//! Type identifiers are MIME essence strings. Resolution goes through the
//! [`TypeResolver`] trait so hosts can plug in a platform type registry;
//! [`MimeTypeResolver`] is the default backed by `mime_guess`.

use std::fmt;

use crate::models::entry::Entry;

/// Semantic file type, e.g. `application/json`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeIdentifier(String);

impl TypeIdentifier {
    /// Build an identifier; the value is lowercased and parameters are dropped.
    pub fn new(value: &str) -> Self {
        let essence = value.split(';').next().unwrap_or("").trim();
        Self(essence.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Top-level media type (`image` for `image/png`).
    pub fn top_level(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(top, _)| top)
    }

    /// Subtype (`png` for `image/png`), empty when missing.
    pub fn subtype(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, sub)| sub)
    }

    pub fn json() -> Self {
        Self::new("application/json")
    }

    pub fn data() -> Self {
        Self::new(mime_guess::mime::APPLICATION_OCTET_STREAM.essence_str())
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry mapping extensions to types and answering conformance questions.
pub trait TypeResolver {
    /// Preferred type for `extension`, `None` when unknown.
    fn resolve_type(&self, extension: &str) -> Option<TypeIdentifier>;

    /// Whether the concrete `type_id` is a kind of `candidate`.
    fn conforms(&self, type_id: &TypeIdentifier, candidate: &TypeIdentifier) -> bool;
}

/// Default resolver using the `mime_guess` extension table.
#[derive(Clone, Copy, Debug, Default)]
pub struct MimeTypeResolver;

impl TypeResolver for MimeTypeResolver {
    fn resolve_type(&self, extension: &str) -> Option<TypeIdentifier> {
        mime_guess::from_ext(extension)
            .first()
            .map(|mime| TypeIdentifier::new(mime.essence_str()))
    }

    fn conforms(&self, type_id: &TypeIdentifier, candidate: &TypeIdentifier) -> bool {
        if type_id == candidate || *candidate == TypeIdentifier::data() {
            return true;
        }
        if type_id.top_level() != candidate.top_level() {
            return false;
        }
        match candidate.subtype() {
            "*" => true,
            // Every text type is readable as plain text.
            "plain" if candidate.top_level() == "text" => true,
            // Structured syntax suffix: `ld+json` is a kind of `json`.
            sub => type_id
                .subtype()
                .rsplit_once('+')
                .is_some_and(|(_, suffix)| suffix == sub),
        }
    }
}

/// Extension of a filename: the text after the last `.`.
///
/// Returns `None` when there is no `.`, when nothing follows the last `.`,
/// and for hidden files whose only `.` is the leading one: splitting
/// `.bashrc` on `.` gives `["", "bashrc"]`, and the empty stem marks the dot
/// as a hidden-file prefix rather than an extension separator.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || stem.is_empty() {
        return None;
    }
    Some(ext.to_string())
}

/// Resolve the semantic type of an extension through `resolver`.
pub fn type_identifier_for(
    extension: &str,
    resolver: &dyn TypeResolver,
) -> Option<TypeIdentifier> {
    resolver.resolve_type(&extension.to_ascii_lowercase())
}

/// Resolve the semantic type of a filename, if it has a known extension.
pub fn type_identifier_of(name: &str, resolver: &dyn TypeResolver) -> Option<TypeIdentifier> {
    extension_of(name).and_then(|ext| type_identifier_for(&ext, resolver))
}

/// Whether `entry` is a kind of `candidate`, judged by its filename extension.
pub fn conforms_to(entry: &Entry, candidate: &TypeIdentifier, resolver: &dyn TypeResolver) -> bool {
    let Some(extension) = extension_of(entry.name()) else {
        return false;
    };
    let Some(type_id) = type_identifier_for(&extension, resolver) else {
        return false;
    };
    resolver.conforms(&type_id, candidate)
}

/// MIME string for display, falling back to `application/octet-stream`.
pub fn mime_for_name(name: &str) -> String {
    type_identifier_of(name, &MimeTypeResolver)
        .unwrap_or_else(TypeIdentifier::data)
        .to_string()
}
