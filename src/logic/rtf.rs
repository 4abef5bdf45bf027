// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Rich-text payload of `Text.rtf`.
//!
//! Notes are stored as RTF so other editors can open them. The writer emits a
//! fixed header and escapes the text; the reader accepts RTF from common
//! writers (including Cocoa's), keeps the character content, and drops
//! formatting and ignorable destinations such as font and color tables.

use std::fmt::Write as _;

use thiserror::Error;

/// Header written before the text. The trailing space ends `\fs24`.
const HEADER: &str = "{\\rtf1\\ansi\\ansicpg1252\\deff0{\\fonttbl{\\f0\\fswiss Helvetica;}}\n\\f0\\fs24 ";

/// Destinations whose content is not document text.
const IGNORED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "footer",
    "footerl",
    "footerr",
    "footnote",
    "listtable",
    "listoverridetable",
    "revtbl",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "object",
];

/// Windows-1252 characters for bytes 0x80..=0x9F; the rest match Latin-1.
const CP1252_HIGH: [char; 32] = [
    '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8d}', 'Ž', '\u{8f}',
    '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9d}', 'ž', 'Ÿ',
];

/// Failures while reading or writing RTF.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RtfError {
    #[error("payload does not start with an RTF header")]
    MissingHeader,
    #[error("unbalanced closing brace at byte {0}")]
    UnbalancedGroups(usize),
    #[error("unexpected end of RTF input")]
    UnexpectedEof,
    #[error("invalid hex escape at byte {0}")]
    InvalidHexEscape(usize),
}

/// Character content of a note.
///
/// Paragraphs are separated by `\n`; carriage returns are normalized away on
/// construction so the text encodes the same way on every platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichText {
    text: String,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            text
        };
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character count, as shown in a status line.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RichText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Encode text as an RTF document.
///
/// Output is deterministic: the same text always yields the same bytes. Every
/// `char` has an RTF spelling, so anything [`decode`] produced encodes again.
pub fn encode(text: &RichText) -> Result<Vec<u8>, RtfError> {
    let mut out = String::with_capacity(HEADER.len() + text.as_str().len() + 16);
    out.push_str(HEADER);

    for ch in text.as_str().chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\par\n"),
            '\t' => out.push_str("\\tab "),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\'{:02x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // `\u` takes a signed 16-bit value; `?` is the skipped fallback.
                    let _ = write!(out, "\\u{}?", *unit as i16);
                }
            }
        }
    }

    out.push('}');
    Ok(out.into_bytes())
}

/// Decode an RTF document into its character content.
pub fn decode(bytes: &[u8]) -> Result<RichText, RtfError> {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .ok_or(RtfError::MissingHeader)?;
    if !bytes[start..].starts_with(b"{\\rtf") {
        return Err(RtfError::MissingHeader);
    }
    let mut reader = Reader::new(&bytes[start..]);
    reader.run()?;
    Ok(RichText::new(reader.out))
}

#[derive(Clone, Copy, Debug)]
struct GroupState {
    /// Inside a destination whose text is discarded.
    skip: bool,
    /// Fallback characters to skip after each `\u`.
    uc: usize,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    out: String,
    stack: Vec<GroupState>,
    current: GroupState,
    pending_high: Option<u16>,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            out: String::new(),
            stack: Vec::new(),
            current: GroupState { skip: false, uc: 1 },
            pending_high: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn run(&mut self) -> Result<(), RtfError> {
        while let Some(byte) = self.peek() {
            match byte {
                b'{' => {
                    self.stack.push(self.current);
                    self.pos += 1;
                }
                b'}' => {
                    self.current = self
                        .stack
                        .pop()
                        .ok_or(RtfError::UnbalancedGroups(self.pos))?;
                    self.pos += 1;
                    if self.stack.is_empty() {
                        // Anything after the outermost group is not part of the document.
                        return Ok(());
                    }
                }
                b'\\' => {
                    self.pos += 1;
                    self.control()?;
                }
                b'\r' | b'\n' => self.pos += 1,
                other => {
                    self.pos += 1;
                    self.push_char(cp1252_char(other));
                }
            }
        }
        Err(RtfError::UnexpectedEof)
    }

    fn control(&mut self) -> Result<(), RtfError> {
        let byte = self.peek().ok_or(RtfError::UnexpectedEof)?;
        if byte.is_ascii_alphabetic() {
            let (word, param) = self.control_word();
            self.apply_word(&word, param);
            return Ok(());
        }

        self.pos += 1;
        match byte {
            b'\\' | b'{' | b'}' => self.push_char(byte as char),
            b'\'' => {
                let at = self.pos - 2;
                let hex = self
                    .bytes
                    .get(self.pos..self.pos + 2)
                    .ok_or(RtfError::UnexpectedEof)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(RtfError::InvalidHexEscape(at));
                }
                let value = std::str::from_utf8(hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or(RtfError::InvalidHexEscape(at))?;
                self.pos += 2;
                self.push_char(cp1252_char(value));
            }
            b'~' => self.push_char('\u{a0}'),
            b'_' => self.push_char('\u{2011}'),
            b'*' => self.current.skip = true,
            // Backslash-newline is a paragraph break in Cocoa output.
            b'\n' | b'\r' => self.push_char('\n'),
            _ => {}
        }
        Ok(())
    }

    fn control_word(&mut self) -> (String, Option<i32>) {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();

        let param_start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let param = std::str::from_utf8(&self.bytes[param_start..self.pos])
            .ok()
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(|value| value.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        if param.is_none() {
            // A lone `-` is not a parameter.
            self.pos = param_start;
        }

        if self.peek() == Some(b' ') {
            self.pos += 1;
        }
        (word, param)
    }

    fn apply_word(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" | "line" | "sect" | "row" => self.push_char('\n'),
            "tab" => self.push_char('\t'),
            "emdash" => self.push_char('—'),
            "endash" => self.push_char('–'),
            "bullet" => self.push_char('•'),
            "lquote" => self.push_char('‘'),
            "rquote" => self.push_char('’'),
            "ldblquote" => self.push_char('“'),
            "rdblquote" => self.push_char('”'),
            "uc" => self.current.uc = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(value) = param {
                    let unit = if value < 0 { value + 65536 } else { value };
                    self.push_utf16(unit as u16);
                    self.skip_fallback();
                }
            }
            w if IGNORED_DESTINATIONS.contains(&w) => self.current.skip = true,
            _ => {}
        }
    }

    /// Skip the ANSI fallback that follows a `\u` keyword.
    fn skip_fallback(&mut self) {
        for _ in 0..self.current.uc {
            match self.peek() {
                Some(b'\\') if self.bytes.get(self.pos + 1) == Some(&b'\'') => self.pos += 4,
                Some(b'{' | b'}' | b'\\') | None => return,
                Some(_) => self.pos += 1,
            }
        }
    }

    fn push_utf16(&mut self, unit: u16) {
        if self.current.skip {
            return;
        }
        match (self.pending_high.take(), unit) {
            (None, 0xD800..=0xDBFF) => self.pending_high = Some(unit),
            (Some(high), 0xDC00..=0xDFFF) => {
                let decoded = char::decode_utf16([high, unit])
                    .next()
                    .and_then(Result::ok)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.out.push(decoded);
            }
            (pending, _) => {
                if pending.is_some() {
                    self.out.push(char::REPLACEMENT_CHARACTER);
                }
                if (0xD800..=0xDBFF).contains(&unit) {
                    self.pending_high = Some(unit);
                } else {
                    self.out
                        .push(char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
        }
    }

    fn push_char(&mut self, ch: char) {
        if self.current.skip {
            return;
        }
        if self.pending_high.take().is_some() {
            self.out.push(char::REPLACEMENT_CHARACTER);
        }
        self.out.push(ch);
    }
}

fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9f => CP1252_HIGH[(byte - 0x80) as usize],
        other => other as char,
    }
}
