// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Command-line front end: parses arguments, initializes logging and drives
//! [`Document`] for one command per invocation.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use ideas::logging::{default_log_level, init_logging};
use ideas::logic::{Document, RichText, export_archive};
use ideas::models::ATTACHMENTS_DIR_NAME;
use ideas::models::attachment::format_bytes;
use ideas::utils::{MimeTypeResolver, TypeIdentifier};

/// Create and edit note packages: rich text plus an Attachments folder.
#[derive(Debug, Parser)]
#[command(name = "ideas", version, about)]
pub struct Cli {
    /// Log level written to stderr (off, error, warn, info, debug, trace)
    #[arg(long, global = true, env = "IDEAS_LOG", default_value = default_log_level())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new note package
    New {
        path: PathBuf,
        /// Initial note text
        #[arg(long)]
        text: Option<String>,
    },
    /// Print the note text
    Show { path: PathBuf },
    /// Replace the note text with --text or standard input
    Edit {
        path: PathBuf,
        #[arg(long)]
        text: Option<String>,
    },
    /// Copy files into the package's Attachments folder
    Attach {
        path: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an attachment
    Detach { path: PathBuf, name: String },
    /// Rename an attachment
    Rename {
        path: PathBuf,
        from: String,
        to: String,
    },
    /// List attachments
    List {
        path: PathBuf,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
        /// Only list attachments conforming to this MIME type (e.g. text/plain)
        #[arg(long = "type")]
        type_filter: Option<String>,
    },
    /// Open an attachment with the system's default application
    Open { path: PathBuf, name: String },
    /// Export the package as a single .ideaz archive
    Export { path: PathBuf, output: PathBuf },
    /// Unpack an .ideaz archive into a package directory
    Import { archive: PathBuf, path: PathBuf },
}

/// Parse arguments, start logging and run the requested command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level).map_err(|err| anyhow!(err))?;
    let stdout = io::stdout();
    execute(cli.command, &mut stdout.lock())
}

fn execute(command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::New { path, text } => {
            if path.exists() {
                bail!("{:?} already exists", path);
            }
            let mut doc = Document::new();
            doc.set_text(RichText::new(text.unwrap_or_default()));
            doc.save(&path)
                .with_context(|| format!("Failed to create package {:?}", path))?;
            writeln!(out, "Created {}", path.display())?;
        }
        Command::Show { path } => {
            let doc = open(&path)?;
            writeln!(out, "{}", doc.text().as_str())?;
        }
        Command::Edit { path, text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read note text from stdin")?;
                    buffer
                }
            };
            let mut doc = open(&path)?;
            doc.set_text(RichText::new(text));
            save(&mut doc, &path)?;
        }
        Command::Attach { path, files } => {
            let mut doc = open(&path)?;
            for file in &files {
                let bytes =
                    fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
                let suggested = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                let name = doc.available_attachment_name(suggested);
                doc.add_attachment(bytes, &name)
                    .with_context(|| format!("Failed to attach {:?}", file))?;
                writeln!(out, "Attached {name}")?;
            }
            save(&mut doc, &path)?;
        }
        Command::Detach { path, name } => {
            let mut doc = open(&path)?;
            doc.remove_attachment(&name)?;
            save(&mut doc, &path)?;
        }
        Command::Rename { path, from, to } => {
            let mut doc = open(&path)?;
            doc.rename_attachment(&from, &to)?;
            save(&mut doc, &path)?;
        }
        Command::List {
            path,
            json,
            type_filter,
        } => {
            let doc = open(&path)?;
            let mut summaries = doc.attachment_summaries();
            if let Some(filter) = type_filter {
                let candidate = TypeIdentifier::new(&filter);
                let matching: Vec<String> = doc
                    .attachments_conforming_to(&candidate, &MimeTypeResolver)
                    .iter()
                    .map(|entry| entry.name().to_string())
                    .collect();
                summaries.retain(|summary| matching.contains(&summary.name));
            }
            if json {
                serde_json::to_writer_pretty(&mut *out, &summaries)?;
                writeln!(out)?;
            } else {
                for summary in &summaries {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}",
                        summary.name,
                        summary.category,
                        summary.mime,
                        format_bytes(summary.size)
                    )?;
                }
            }
        }
        Command::Open { path, name } => {
            let doc = open(&path)?;
            if doc.attachment(&name).is_none() {
                bail!("No attachment named `{name}` in {:?}", path);
            }
            let target = path.join(ATTACHMENTS_DIR_NAME).join(&name);
            open::that(&target).with_context(|| format!("Failed to open {:?}", target))?;
        }
        Command::Export { path, output } => {
            let doc = open(&path)?;
            let written = export_archive(&output, doc.package())
                .with_context(|| format!("Failed to export {:?}", output))?;
            writeln!(out, "Exported {}", written.display())?;
        }
        Command::Import { archive, path } => {
            if path.exists() {
                bail!("{:?} already exists", path);
            }
            let bytes =
                fs::read(&archive).with_context(|| format!("Failed to read {:?}", archive))?;
            let mut doc = Document::load_archive(&bytes)
                .with_context(|| format!("Failed to load archive {:?}", archive))?;
            save(&mut doc, &path)?;
            writeln!(out, "Imported {}", path.display())?;
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<Document> {
    Document::open(path).with_context(|| format!("Failed to open package {:?}", path))
}

fn save(doc: &mut Document, path: &Path) -> Result<()> {
    doc.save(path)
        .with_context(|| format!("Failed to save package {:?}", path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use tempfile::TempDir;

    use super::{Cli, execute};
    use ideas::logic::Document;

    fn run_args(args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("ideas").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(cli.command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn new_attach_list_and_show() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("Idea.ideas");
        let pkg_str = pkg.to_str().unwrap();
        let src = tmp.path().join("photo.json");
        fs::write(&src, b"{}").unwrap();
        let src_str = src.to_str().unwrap();

        run_args(&["new", pkg_str, "--text", "first idea"]).unwrap();
        let attached = run_args(&["attach", pkg_str, src_str, src_str]).unwrap();
        assert!(attached.contains("Attached photo.json"));
        assert!(attached.contains("Attached photo 2.json"));

        let listing = run_args(&["list", pkg_str]).unwrap();
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.contains("application/json"));

        let shown = run_args(&["show", pkg_str]).unwrap();
        assert_eq!(shown.trim_end(), "first idea");
    }

    #[test]
    fn list_json_filters_by_type() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("n.ideas");
        let pkg_str = pkg.to_str().unwrap();
        let mut doc = Document::new();
        doc.add_attachment(b"hi".to_vec(), "readme.txt").unwrap();
        doc.add_attachment(b"\x89PNG".to_vec(), "shot.png").unwrap();
        doc.save(&pkg).unwrap();

        let out = run_args(&["list", pkg_str, "--json", "--type", "image/png"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "shot.png");
        assert_eq!(items[0]["category"], "image");
    }

    #[test]
    fn rename_detach_export_import() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("n.ideas");
        let pkg_str = pkg.to_str().unwrap();
        let mut doc = Document::new();
        doc.set_text("body".into());
        doc.add_attachment(b"1".to_vec(), "a.txt").unwrap();
        doc.add_attachment(b"2".to_vec(), "b.txt").unwrap();
        doc.save(&pkg).unwrap();

        run_args(&["rename", pkg_str, "a.txt", "c.txt"]).unwrap();
        run_args(&["detach", pkg_str, "b.txt"]).unwrap();

        let archive = tmp.path().join("out.ideaz");
        let archive_str = archive.to_str().unwrap();
        run_args(&["export", pkg_str, archive_str]).unwrap();
        let copy = tmp.path().join("copy.ideas");
        run_args(&["import", archive_str, copy.to_str().unwrap()]).unwrap();

        let imported = Document::open(&copy).unwrap();
        assert_eq!(imported.text().as_str(), "body");
        let names: Vec<_> = imported
            .current_attachments()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["c.txt"]);
    }

    #[test]
    fn new_refuses_existing_path_and_detach_reports_missing() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("n.ideas");
        let pkg_str = pkg.to_str().unwrap();

        run_args(&["new", pkg_str]).unwrap();
        assert!(run_args(&["new", pkg_str]).is_err());
        let err = run_args(&["detach", pkg_str, "ghost.txt"]).unwrap_err();
        assert!(err.to_string().contains("ghost.txt"));
    }

    #[test]
    fn edit_replaces_text() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("n.ideas");
        let pkg_str = pkg.to_str().unwrap();

        run_args(&["new", pkg_str, "--text", "old"]).unwrap();
        run_args(&["edit", pkg_str, "--text", "new\ttext {x}"]).unwrap();

        let doc = Document::open(&pkg).unwrap();
        assert_eq!(doc.text().as_str(), "new\ttext {x}");
    }
}
