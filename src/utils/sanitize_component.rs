// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Filesystem-safe attachment names and collision-free naming for imports.

/// Name used when nothing usable survives sanitization.
const FALLBACK_NAME: &str = "attachment";

/// Windows device names that cannot be used as a basename.
const RESERVED_BASENAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Produce a filesystem-safe path component for an imported attachment.
///
/// # Steps
/// - Transliterate Unicode to ASCII with `deunicode` (e.g., "Å" → "A").
/// - Keep ASCII alphanumerics plus `-`, `_`, and `.`; everything else becomes `_`.
/// - Collapse runs of `_` and `.`; trim trailing dots/spaces.
/// - Guard against reserved/empty names.
///
/// Multi-part extensions survive (`data.v1.2.tar.gz` stays as is), and a
/// leading dot is kept so hidden files stay hidden.
pub fn sanitize_component(value: &str) -> String {
    let transliterated = deunicode::deunicode(value);
    let mut out = String::with_capacity(transliterated.len());

    for ch in transliterated.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            ch
        } else {
            '_'
        };
        let repeats_separator = matches!(mapped, '_' | '.') && out.ends_with(mapped);
        if !repeats_separator {
            out.push(mapped);
        }
    }

    // A stray underscore right before a dot adds nothing.
    while let Some(pos) = out.find("_.") {
        out.remove(pos);
    }

    let trimmed_len = out.trim_end_matches(['.', ' ']).len();
    out.truncate(trimmed_len);

    if out.is_empty() || out == "_" {
        return FALLBACK_NAME.to_string();
    }

    let suffixed = match out.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && is_reserved(base) => {
            Some(format!("{base}_.{ext}"))
        }
        None if is_reserved(&out) => Some(format!("{out}_")),
        _ => None,
    };
    suffixed.unwrap_or(out)
}

fn is_reserved(basename: &str) -> bool {
    let upper = basename.to_ascii_uppercase();
    RESERVED_BASENAMES.contains(&upper.as_str())
}

/// Pick a name based on `suggested` that `is_taken` does not claim.
///
/// The first candidate is `suggested` itself; later ones insert ` 2`, ` 3`, ...
/// before the extension (`photo.json` → `photo 2.json`).
pub fn unique_name(suggested: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(suggested) {
        return suggested.to_string();
    }
    let (stem, ext) = match suggested.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (suggested, None),
    };
    (2u32..)
        .map(|n| match ext {
            Some(ext) => format!("{stem} {n}.{ext}"),
            None => format!("{stem} {n}"),
        })
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| suggested.to_string())
}
