//! Line extraction rules.
//!
//! A raw line is trimmed of surrounding whitespace, then dropped if it is
//! empty or starts with `#` or `//`. Survivors are kept once each, compared
//! byte for byte, and come out in ascending byte order.
//!
//! Lines are handled as bytes so files that are not valid UTF-8 still
//! normalize instead of failing. Trimming decodes characters inward from
//! each edge and stops at the first one that is not whitespace; an invalid
//! byte counts as non-whitespace.

use std::collections::BTreeSet;
use std::io::{self, BufRead};

/// Comment markers recognised at the start of a trimmed line.
pub const COMMENT_PREFIXES: [&[u8]; 2] = [b"#", b"//"];

/// Trim surrounding Unicode whitespace from a raw line.
#[must_use]
pub fn trim_line(raw: &[u8]) -> &[u8] {
    let lead = raw.utf8_chunks().next().map_or(0, |chunk| {
        let valid = chunk.valid();
        valid.len() - valid.trim_start().len()
    });
    let rest = &raw[lead..];

    let trail = rest
        .utf8_chunks()
        .last()
        .filter(|chunk| chunk.invalid().is_empty())
        .map_or(0, |chunk| {
            let valid = chunk.valid();
            valid.len() - valid.trim_end().len()
        });
    &rest[..rest.len() - trail]
}

/// `true` if a trimmed line is a comment.
#[must_use]
pub fn is_comment(trimmed: &[u8]) -> bool {
    COMMENT_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

/// The kept form of a raw line, or `None` if the line is discarded.
#[must_use]
pub fn keep_line(raw: &[u8]) -> Option<&[u8]> {
    let trimmed = trim_line(raw);
    if trimmed.is_empty() || is_comment(trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Distinct kept lines of one file, ordered byte-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSet {
    lines: BTreeSet<Vec<u8>>,
}

impl LineSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kept line; returns `false` if it was already present.
    pub fn insert(&mut self, line: &[u8]) -> bool {
        !self.lines.contains(line) && self.lines.insert(line.to_vec())
    }

    /// Greatest line so far.
    #[must_use]
    pub fn last(&self) -> Option<&[u8]> {
        self.lines.last().map(Vec::as_slice)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` when no line survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(Vec::as_slice)
    }

    /// Serialized file content: every line followed by a single `\n`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let capacity = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = Vec::with_capacity(capacity);
        for line in &self.lines {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        out
    }
}

/// Result of reading a file's lines.
#[derive(Debug, Clone, Default)]
pub struct ScannedLines {
    /// Kept lines.
    pub lines: LineSet,
    /// Raw lines read, including discarded ones.
    pub lines_read: usize,
    /// `true` if the input bytes already equal `lines.to_bytes()`.
    pub already_normalized: bool,
}

/// Read every line from `reader` into a [`LineSet`].
///
/// Lines are read with `read_until`, so there is no upper bound on line
/// length. While reading, tracks whether the input is already in
/// normalized form so callers can skip rewriting it.
///
/// # Errors
///
/// Propagates read errors from `reader`.
pub fn scan_lines<R: BufRead>(mut reader: R) -> io::Result<ScannedLines> {
    let mut scanned = ScannedLines {
        already_normalized: true,
        ..ScannedLines::default()
    };
    let mut chunk = Vec::new();

    loop {
        chunk.clear();
        if reader.read_until(b'\n', &mut chunk)? == 0 {
            break;
        }
        scanned.lines_read += 1;

        let (body, terminated) = match chunk.strip_suffix(b"\n") {
            Some(body) => (body, true),
            None => (chunk.as_slice(), false),
        };

        match keep_line(body) {
            Some(line) => {
                if scanned.already_normalized {
                    let ascending = scanned.lines.last().is_none_or(|last| line > last);
                    scanned.already_normalized = terminated && line == body && ascending;
                }
                scanned.lines.insert(line);
            }
            None => scanned.already_normalized = false,
        }
    }

    Ok(scanned)
}

/// Normalize in-memory content.
#[must_use]
pub fn normalize_bytes(content: &[u8]) -> Vec<u8> {
    match scan_lines(content) {
        Ok(scanned) => scanned.lines.to_bytes(),
        // Reading from a byte slice cannot fail.
        Err(_) => Vec::new(),
    }
}
