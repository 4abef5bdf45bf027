// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges
//! Icon category selection based on MIME type and filename.
//!
//! Presentation layers map a [`FileCategory`] to whatever glyph set they use.
//! MIME matches win; extension and name checks cover composite archive
//! suffixes (e.g. `*.tar.bz2`) that MIME tables miss.

use std::fmt;

use serde::Serialize;

use crate::utils::file_types::extension_of;

/// Coarse icon category for an attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Spreadsheet,
    Archive,
    Document,
    Presentation,
    Code,
    Text,
    #[serde(rename = "file")]
    Generic,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::Archive => "archive",
            Self::Document => "document",
            Self::Presentation => "presentation",
            Self::Code => "code",
            Self::Text => "text",
            Self::Generic => "file",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the icon category for a file from its MIME type and name.
pub fn category_for(mime: &str, name: &str) -> FileCategory {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let ext = extension_of(name)
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let fname = name.to_ascii_lowercase();

    if mime.starts_with("image/") {
        return FileCategory::Image;
    }
    if mime.starts_with("video/") {
        return FileCategory::Video;
    }
    if mime.starts_with("audio/") {
        return FileCategory::Audio;
    }
    if mime == "application/pdf" {
        return FileCategory::Pdf;
    }
    if mime == "text/csv"
        || mime == "application/vnd.ms-excel"
        || mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        || mime == "application/vnd.oasis.opendocument.spreadsheet"
        || matches!(ext.as_str(), "csv" | "xls" | "xlsx" | "ods" | "numbers")
    {
        return FileCategory::Spreadsheet;
    }
    if is_archive(&mime, &ext, &fname) {
        return FileCategory::Archive;
    }
    if mime == "application/msword"
        || mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        || mime == "application/vnd.oasis.opendocument.text"
        || mime == "application/rtf"
        || matches!(ext.as_str(), "doc" | "docx" | "odt" | "rtf" | "pages")
    {
        return FileCategory::Document;
    }
    if mime == "application/vnd.ms-powerpoint"
        || mime == "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        || mime == "application/vnd.oasis.opendocument.presentation"
        || matches!(ext.as_str(), "ppt" | "pptx" | "odp" | "key")
    {
        return FileCategory::Presentation;
    }
    if mime == "application/json"
        || mime.ends_with("+json")
        || mime == "application/xml"
        || mime == "text/xml"
        || mime == "text/html"
        || mime == "text/css"
        || mime == "application/javascript"
        || mime == "text/javascript"
        || matches!(
            ext.as_str(),
            "json" | "xml" | "html" | "htm" | "css" | "js" | "jsx" | "ts" | "tsx" | "rs" | "py"
                | "c" | "h" | "cpp" | "cc" | "cxx" | "cs" | "swift" | "sql" | "sh" | "toml"
                | "yaml" | "yml" | "ini"
        )
    {
        return FileCategory::Code;
    }
    if ext == "txt" || ext == "md" || mime.starts_with("text/") {
        return FileCategory::Text;
    }

    FileCategory::Generic
}

fn is_archive(mime: &str, ext: &str, fname: &str) -> bool {
    mime == "application/zip"
        || mime == "application/gzip"
        || mime == "application/x-7z-compressed"
        || mime == "application/x-rar-compressed"
        || mime == "application/x-gtar"
        || mime == "application/x-tar"
        || mime == "application/x-bzip2"
        || mime == "application/x-xz"
        || mime == "application/zstd"
        || matches!(ext, "zip" | "rar" | "7z" | "xz" | "zst" | "bz2" | "gz" | "tgz")
        || fname.ends_with(".tar.gz")
        || fname.ends_with(".tar.bz2")
        || fname.ends_with(".tbz2")
        || fname.ends_with(".tar.xz")
        || fname.ends_with(".tar.zst")
}
