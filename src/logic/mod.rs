// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Business logic: the RTF codec, persistence collaborators and the document controller.

pub mod archive;
pub mod bundle;
pub mod document;
pub mod rtf;

pub use archive::{ARCHIVE_EXTENSION, ensure_extension, export_archive, read_archive};
pub use bundle::{PersistError, read_package, write_package};
pub use document::{
    AttachError, Document, DocumentEvent, DocumentState, LoadError, SaveError, TextProblem,
};
pub use rtf::{RichText, RtfError};
