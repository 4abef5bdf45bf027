// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Domain layer: the package tree and data derived from it.

pub mod attachment;
pub mod entry;
pub mod package;

pub use attachment::AttachmentSummary;
pub use entry::{Entry, EntryKind, ReplacePolicy, TreeError};
pub use package::{ATTACHMENTS_DIR_NAME, Package, TEXT_FILE_NAME};
