// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Document controller: owns the package and the decoded note text, tracks the
//! load/edit/save lifecycle and notifies observers when content changes.
//!
//! Saving is split in two steps. [`Document::prepare_for_save`] encodes the
//! text and hands out an independent snapshot of the package; the caller
//! writes it wherever it likes and reports back through
//! [`Document::finish_save`]. Edits made between the two calls keep the
//! document marked as modified.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

use crate::logic::archive;
use crate::logic::bundle::{self, PersistError};
use crate::logic::rtf::{self, RichText, RtfError};
use crate::models::attachment::AttachmentSummary;
use crate::models::entry::{Entry, ReplacePolicy, TreeError, is_valid_name};
use crate::models::package::Package;
use crate::utils::{TypeIdentifier, TypeResolver, conforms_to, sanitize_component, unique_name};

/// Why `Text.rtf` could not be turned into note text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextProblem {
    #[error("Text.rtf is missing")]
    Missing,
    #[error("Text.rtf is not a regular file")]
    NotAFile,
    #[error(transparent)]
    Malformed(#[from] RtfError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("package root is not a directory")]
    CannotLoadFileWrappers,
    #[error("cannot load the note text: {0}")]
    CannotLoadText(#[source] TextProblem),
    #[error(transparent)]
    Io(#[from] PersistError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("the Attachments folder is occupied by a regular file")]
    CannotAccessAttachments,
    #[error("`{0}` is not a valid attachment name")]
    InvalidName(String),
    #[error("an attachment named `{0}` already exists")]
    NameTaken(String),
    #[error("no attachment named `{0}`")]
    NotFound(String),
}

impl From<TreeError> for AttachError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::DuplicateNameConflict(name) => AttachError::NameTaken(name),
            TreeError::InvalidName(name) => AttachError::InvalidName(name),
            TreeError::NotFound(name) => AttachError::NotFound(name),
            TreeError::NotADirectory(_) => AttachError::CannotAccessAttachments,
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("cannot save the note text: {0}")]
    CannotSaveText(#[source] RtfError),
    #[error("cannot store Text.rtf: {0}")]
    Tree(#[from] TreeError),
    #[error("no save is in progress")]
    NotSaving,
    #[error("writing the package failed: {0}")]
    Persistence(#[source] PersistError),
}

/// Lifecycle of a loaded or new document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentState {
    /// Matches what was last read or written.
    Loaded,
    /// Has edits that were never written.
    Modified,
    /// A snapshot was handed out and the write has not been reported yet.
    Saving,
}

/// Change notifications delivered to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentEvent {
    AttachmentsChanged,
    TextChanged,
    Saved,
}

/// A note package open for editing.
#[derive(Debug)]
pub struct Document {
    package: Package,
    text: RichText,
    state: DocumentState,
    /// Bumped on every edit.
    generation: u64,
    /// Generation captured by the pending save, if any.
    saving_generation: Option<u64>,
    subscribers: Vec<Sender<DocumentEvent>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Brand-new empty document. It has never been saved, so it starts modified.
    pub fn new() -> Self {
        Self::with_package(Package::new(), RichText::default(), DocumentState::Modified)
    }

    fn with_package(package: Package, text: RichText, state: DocumentState) -> Self {
        Self {
            package,
            text,
            state,
            generation: 0,
            saving_generation: None,
            subscribers: Vec::new(),
        }
    }

    /// Take ownership of a package tree read by a persistence collaborator.
    pub fn load(root: Entry) -> Result<Self, LoadError> {
        let package = Package::from_root(root).map_err(|_| {
            log::warn!("event=document_load module=document status=error reason=root_not_directory");
            LoadError::CannotLoadFileWrappers
        })?;

        let text = decode_text(&package).map_err(|problem| {
            log::warn!(
                "event=document_load module=document status=error reason=text problem={}",
                problem
            );
            LoadError::CannotLoadText(problem)
        })?;

        log::info!(
            "event=document_load module=document status=ok attachments={} text_chars={}",
            package.attachments().count(),
            text.char_count()
        );
        Ok(Self::with_package(package, text, DocumentState::Loaded))
    }

    /// Read a bundle directory and load it.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        Self::load(bundle::read_package(path)?)
    }

    /// Load from the bytes of an exported archive.
    pub fn load_archive(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::load(archive::read_archive(bytes)?)
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// True while there are edits not yet confirmed as written.
    pub fn is_modified(&self) -> bool {
        self.state != DocumentState::Loaded
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn text(&self) -> &RichText {
        &self.text
    }

    /// Replace the note text. Setting identical text is not an edit.
    pub fn set_text(&mut self, text: RichText) {
        if text == self.text {
            return;
        }
        self.text = text;
        self.mark_modified();
        self.emit(DocumentEvent::TextChanged);
    }

    /// Attachments in insertion order; empty until the first one is added.
    pub fn current_attachments(&self) -> Vec<&Entry> {
        self.package.attachments().collect()
    }

    pub fn attachment(&self, name: &str) -> Option<&Entry> {
        self.package.attachments_dir()?.get_child(name)
    }

    /// Listing metadata for every attachment.
    pub fn attachment_summaries(&self) -> Vec<AttachmentSummary> {
        self.package
            .attachments()
            .map(AttachmentSummary::from_entry)
            .collect()
    }

    /// Attachments whose extension resolves to a type conforming to `candidate`.
    pub fn attachments_conforming_to(
        &self,
        candidate: &TypeIdentifier,
        resolver: &dyn TypeResolver,
    ) -> Vec<&Entry> {
        self.package
            .attachments()
            .filter(|entry| conforms_to(entry, candidate, resolver))
            .collect()
    }

    /// Sanitized, collision-free name for an attachment suggested as `suggested`.
    ///
    /// [`Document::add_attachment`] never renames on its own; callers that want
    /// automatic disambiguation pass the result of this helper.
    pub fn available_attachment_name(&self, suggested: &str) -> String {
        let sanitized = sanitize_component(suggested);
        unique_name(&sanitized, |candidate| self.attachment(candidate).is_some())
    }

    /// Add a regular file under `Attachments`, creating the directory on first use.
    pub fn add_attachment(
        &mut self,
        bytes: impl Into<Vec<u8>>,
        suggested_name: &str,
    ) -> Result<(), AttachError> {
        if !is_valid_name(suggested_name) {
            return Err(AttachError::InvalidName(suggested_name.to_string()));
        }
        let dir = self.package.ensure_attachments_dir()?;
        let entry = Entry::file(suggested_name, bytes);
        let size = entry.total_size();
        dir.add_child(entry, ReplacePolicy::Reject)?;

        log::info!(
            "event=attachment_added module=document status=ok size={}",
            size
        );
        self.mark_modified();
        self.emit(DocumentEvent::AttachmentsChanged);
        Ok(())
    }

    /// Detach an attachment and hand it back. The `Attachments` directory stays.
    pub fn remove_attachment(&mut self, name: &str) -> Result<Entry, AttachError> {
        let removed = self
            .package
            .attachments_dir_mut()
            .and_then(|dir| dir.remove_child(name))
            .ok_or_else(|| AttachError::NotFound(name.to_string()))?;

        log::info!("event=attachment_removed module=document status=ok");
        self.mark_modified();
        self.emit(DocumentEvent::AttachmentsChanged);
        Ok(removed)
    }

    pub fn rename_attachment(&mut self, old: &str, new: &str) -> Result<(), AttachError> {
        let dir = self
            .package
            .attachments_dir_mut()
            .ok_or_else(|| AttachError::NotFound(old.to_string()))?;
        dir.rename_child(old, new)?;

        log::info!("event=attachment_renamed module=document status=ok");
        self.mark_modified();
        self.emit(DocumentEvent::AttachmentsChanged);
        Ok(())
    }

    /// Encode `current_text` into `Text.rtf` and return a snapshot to write.
    ///
    /// Calling this twice with the same text and no edits in between yields
    /// byte-identical snapshots. On failure the state is unchanged.
    pub fn prepare_for_save(&mut self, current_text: &RichText) -> Result<Package, SaveError> {
        let bytes = rtf::encode(current_text).map_err(|err| {
            log::warn!(
                "event=save_prepare module=document status=error reason=encode error={}",
                err
            );
            SaveError::CannotSaveText(err)
        })?;

        self.package.replace_text(bytes)?;
        let text_changed = *current_text != self.text;
        if text_changed {
            self.text = current_text.clone();
            self.generation += 1;
        }
        self.state = DocumentState::Saving;
        self.saving_generation = Some(self.generation);

        log::debug!(
            "event=save_prepare module=document status=ok files={}",
            self.package.root().file_count()
        );
        if text_changed {
            self.emit(DocumentEvent::TextChanged);
        }
        Ok(self.package.clone())
    }

    /// Report the outcome of writing the snapshot from [`Document::prepare_for_save`].
    pub fn finish_save(&mut self, result: Result<(), PersistError>) -> Result<(), SaveError> {
        let Some(saved_generation) = self.saving_generation.take() else {
            return Err(SaveError::NotSaving);
        };

        match result {
            Ok(()) => {
                self.state = if saved_generation == self.generation {
                    DocumentState::Loaded
                } else {
                    DocumentState::Modified
                };
                log::info!(
                    "event=save_finish module=document status=ok state={:?}",
                    self.state
                );
                self.emit(DocumentEvent::Saved);
                Ok(())
            }
            Err(err) => {
                self.state = DocumentState::Modified;
                log::warn!(
                    "event=save_finish module=document status=error error={}",
                    err
                );
                Err(SaveError::Persistence(err))
            }
        }
    }

    /// Abandon a pending save; the document stays modified.
    pub fn cancel_save(&mut self) {
        if self.saving_generation.take().is_some() {
            self.state = DocumentState::Modified;
            log::debug!("event=save_cancel module=document status=ok");
        }
    }

    /// Write the document as a bundle directory at `path`.
    pub fn save(&mut self, path: &Path) -> Result<(), SaveError> {
        let text = self.text.clone();
        let snapshot = self.prepare_for_save(&text)?;
        let result = bundle::write_package(path, &snapshot);
        self.finish_save(result)
    }

    /// Write the document as a single-file archive; returns the final path.
    pub fn save_archive(&mut self, path: &Path) -> Result<PathBuf, SaveError> {
        let text = self.text.clone();
        let snapshot = self.prepare_for_save(&text)?;
        match archive::export_archive(path, &snapshot) {
            Ok(written) => self.finish_save(Ok(())).map(|()| written),
            Err(err) => self.finish_save(Err(err)).map(|()| path.to_path_buf()),
        }
    }

    /// Receive change notifications. Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> Receiver<DocumentEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn mark_modified(&mut self) {
        self.generation += 1;
        if self.state != DocumentState::Saving {
            self.state = DocumentState::Modified;
        }
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

fn decode_text(package: &Package) -> Result<RichText, TextProblem> {
    let entry = package.text_entry().ok_or(TextProblem::Missing)?;
    let bytes = entry.regular_file_bytes().ok_or(TextProblem::NotAFile)?;
    Ok(rtf::decode(bytes)?)
}
