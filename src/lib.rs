// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Note documents stored as filesystem packages.
//!
//! A package is a directory holding the note text as `Text.rtf` and, once the
//! first file is attached, an `Attachments` directory. [`Document`] owns a
//! loaded package and mediates every edit; the `logic::bundle` and
//! `logic::archive` collaborators move packages to and from disk.

pub mod logging;
pub mod logic;
pub mod models;
pub mod utils;

pub use logic::{
    AttachError, Document, DocumentEvent, DocumentState, LoadError, PersistError, RichText,
    SaveError,
};
pub use models::{Entry, EntryKind, Package, ReplacePolicy, TreeError};
