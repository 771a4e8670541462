//! Source locations and the pattern-based position resolver
//!
//! Detectors frequently know only an approximate line for a problem (for
//! example from bytecode line tables). [`resolve`] turns "line 12, look for
//! `recycle`" into a precise character span by searching the file contents
//! around that line.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A point in a text file. Lines and columns are 0-based.
///
/// `column == None` marks a whole-line position: the exact column is unknown
/// and renderers should highlight the full line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

/// Where a finding lives. File-level locations carry no positions.
///
/// A location can chain a secondary location (for example the first
/// definition in a duplicate-definition report).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,

    /// Message specific to this location (used on secondary locations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Box<Location>>,

    /// Whether renderers may present this location on its own. Secondary
    /// locations that only give context for their primary are hidden.
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

impl Location {
    /// A location pointing at a file as a whole.
    pub fn file_level(file: impl Into<PathBuf>) -> Location {
        Location {
            file: file.into(),
            start: None,
            end: None,
            message: None,
            secondary: None,
            visible: true,
        }
    }

    pub fn new(file: impl Into<PathBuf>, start: Position, end: Position) -> Location {
        Location {
            file: file.into(),
            start: Some(start),
            end: Some(end),
            message: None,
            secondary: None,
            visible: true,
        }
    }

    /// Build a location from byte offsets into `contents`.
    pub fn from_offsets(
        file: impl Into<PathBuf>,
        contents: &str,
        start: usize,
        end: usize,
    ) -> Location {
        Location::new(
            file,
            position_at(contents, start),
            position_at(contents, end),
        )
    }

    /// A whole-line location. The line is clamped to the file's line count.
    pub fn whole_line(file: impl Into<PathBuf>, contents: &str, line: usize) -> Location {
        let (line, start, end) = line_span(contents, line);
        Location::new(
            file,
            Position {
                line,
                column: None,
                offset: start,
            },
            Position {
                line,
                column: None,
                offset: end,
            },
        )
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Location {
        self.message = Some(message.into());
        self
    }

    pub fn with_secondary(mut self, secondary: Location) -> Location {
        self.secondary = Some(Box::new(secondary));
        self
    }

    /// Mark the location as context-only, to be shown with its primary and
    /// never as a standalone entry.
    pub fn hidden(mut self) -> Location {
        self.visible = false;
        self
    }
}

/// Which way [`resolve`] searches from the anchor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// First match at or after the start of the anchor line.
    Forward,
    /// Last match at or before the start of the anchor line.
    Backward,
    /// Last match at or before the end of the anchor line. Useful when the
    /// anchor line itself usually contains the pattern.
    EolBackward,
    /// Best match in either direction from the start of the anchor line,
    /// ranked by line distance, then byte distance.
    #[default]
    Nearest,
    /// Like `Nearest`, anchored at the end of the anchor line.
    EolNearest,
}

/// Hints controlling how [`resolve`] validates candidate matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchHints {
    pub direction: SearchDirection,
    whole_word: bool,
    java_symbol: bool,
    constructor: bool,
}

impl SearchHints {
    pub fn new(direction: SearchDirection) -> SearchHints {
        SearchHints {
            direction,
            ..Default::default()
        }
    }

    /// Reject matches embedded in a larger identifier.
    pub fn whole_word(mut self) -> SearchHints {
        self.whole_word = true;
        self
    }

    /// Like [`whole_word`](Self::whole_word), and additionally reject matches
    /// immediately preceded by a quote character (string contents).
    pub fn java_symbol(mut self) -> SearchHints {
        self.java_symbol = true;
        self
    }

    /// The pattern names a constructed type: also consider `super` call sites
    /// and pick whichever is nearer.
    pub fn constructor(mut self) -> SearchHints {
        self.constructor = true;
        self
    }
}

/// Resolve an approximate line plus a search pattern into a precise span.
///
/// When `end_pattern` is given, the span extends to the end of its first
/// occurrence after the primary match; otherwise the span covers the match
/// itself. When no valid match exists anywhere in the file, the result
/// degrades to a whole-line location at the (clamped) anchor line.
pub fn resolve(
    file: &Path,
    contents: &str,
    line: usize,
    pattern: &str,
    end_pattern: Option<&str>,
    hints: SearchHints,
) -> Location {
    if pattern.is_empty() {
        return Location::whole_line(file, contents, line);
    }

    let (line, line_start, line_end) = line_span(contents, line);

    let mut best = find_match(contents, pattern, line_start, line_end, &hints, false);
    if hints.constructor {
        // A constructor call may appear as `new Type(...)` or as a `super(...)`
        // delegation; pick whichever token is nearer to the anchor.
        let anchor = anchor_offset(line_start, line_end, hints.direction);
        let alt = find_match(contents, "super", line_start, line_end, &hints, true);
        best = match (best, alt) {
            // The super call wins ties.
            (Some(m), Some(s)) => {
                if rank(contents, anchor, s.0) <= rank(contents, anchor, m.0) {
                    Some(s)
                } else {
                    Some(m)
                }
            }
            (m, s) => m.or(s),
        };
    }

    match best {
        Some((start, matched_len)) => {
            let mut end = start + matched_len;
            if let Some(end_pattern) = end_pattern {
                if let Some(rel) = contents[end..].find(end_pattern) {
                    end = end + rel + end_pattern.len();
                }
            }
            Location::from_offsets(file, contents, start, end)
        }
        None => Location::whole_line(file, contents, line),
    }
}

/// Compute the 0-based position of a byte offset.
pub fn position_at(contents: &str, offset: usize) -> Position {
    let offset = offset.min(contents.len());
    let mut line = 0;
    let mut line_start = 0;
    for (idx, byte) in contents.as_bytes()[..offset].iter().enumerate() {
        if *byte == b'\n' {
            line += 1;
            line_start = idx + 1;
        }
    }
    Position {
        line,
        column: Some(offset - line_start),
        offset,
    }
}

/// Byte span of a 0-based line, exclusive of its newline. Lines past the end
/// of the file clamp to the last line.
fn line_span(contents: &str, line: usize) -> (usize, usize, usize) {
    let mut start = 0;
    let mut current = 0;
    while current < line {
        match contents[start..].find('\n') {
            Some(rel) => {
                start += rel + 1;
                current += 1;
            }
            None => break, // clamp to the last line
        }
    }
    let end = contents[start..]
        .find('\n')
        .map(|rel| start + rel)
        .unwrap_or(contents.len());
    (current, start, end)
}

fn anchor_offset(line_start: usize, line_end: usize, direction: SearchDirection) -> usize {
    match direction {
        SearchDirection::EolBackward | SearchDirection::EolNearest => line_end,
        _ => line_start,
    }
}

/// Ranking key for `Nearest` searches: fewer line crossings win, byte
/// distance breaks ties.
fn rank(contents: &str, anchor: usize, candidate: usize) -> (usize, usize) {
    let (lo, hi) = if candidate < anchor {
        (candidate, anchor)
    } else {
        (anchor, candidate)
    };
    let newlines = contents.as_bytes()[lo..hi]
        .iter()
        .filter(|b| **b == b'\n')
        .count();
    (newlines, hi - lo)
}

fn find_match(
    contents: &str,
    pattern: &str,
    line_start: usize,
    line_end: usize,
    hints: &SearchHints,
    require_call: bool,
) -> Option<(usize, usize)> {
    let found = match hints.direction {
        SearchDirection::Forward => find_forward(contents, pattern, line_start, hints, require_call),
        SearchDirection::Backward => {
            find_backward(contents, pattern, line_start, hints, require_call)
        }
        SearchDirection::EolBackward => {
            find_backward(contents, pattern, line_end, hints, require_call)
        }
        SearchDirection::Nearest => find_nearest(contents, pattern, line_start, hints, require_call),
        SearchDirection::EolNearest => {
            find_nearest(contents, pattern, line_end, hints, require_call)
        }
    };
    found.map(|idx| (idx, pattern.len()))
}

fn find_nearest(
    contents: &str,
    pattern: &str,
    anchor: usize,
    hints: &SearchHints,
    require_call: bool,
) -> Option<usize> {
    let fwd = find_forward(contents, pattern, anchor, hints, require_call);
    let back = find_backward(contents, pattern, anchor.saturating_sub(1), hints, require_call);
    match (fwd, back) {
        (Some(f), Some(b)) => {
            if rank(contents, anchor, b) < rank(contents, anchor, f) {
                Some(b)
            } else {
                Some(f)
            }
        }
        (f, b) => f.or(b),
    }
}

/// First valid match starting at or after `from`.
fn find_forward(
    contents: &str,
    pattern: &str,
    from: usize,
    hints: &SearchHints,
    require_call: bool,
) -> Option<usize> {
    let mut pos = from.min(contents.len());
    while !contents.is_char_boundary(pos) {
        pos += 1;
    }
    while let Some(rel) = contents[pos..].find(pattern) {
        let idx = pos + rel;
        if is_valid_match(contents, pattern, idx, hints, require_call) {
            return Some(idx);
        }
        // Step past the first character of the rejected match.
        pos = idx
            + contents[idx..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    None
}

/// Last valid match starting at or before `from`.
fn find_backward(
    contents: &str,
    pattern: &str,
    from: usize,
    hints: &SearchHints,
    require_call: bool,
) -> Option<usize> {
    let mut end = from.saturating_add(pattern.len()).min(contents.len());
    while !contents.is_char_boundary(end) {
        end -= 1;
    }
    loop {
        let idx = contents[..end].rfind(pattern)?;
        if is_valid_match(contents, pattern, idx, hints, require_call) {
            return Some(idx);
        }
        if idx == 0 {
            return None;
        }
        end = idx + pattern.len() - 1;
        while !contents.is_char_boundary(end) {
            end -= 1;
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_valid_match(
    contents: &str,
    pattern: &str,
    idx: usize,
    hints: &SearchHints,
    require_call: bool,
) -> bool {
    let word_bounded = hints.whole_word || hints.java_symbol || require_call;
    let before = contents[..idx].chars().next_back();
    let after = contents[idx + pattern.len()..].chars().next();
    if word_bounded {
        if before.is_some_and(is_ident_char) || after.is_some_and(is_ident_char) {
            return false;
        }
    }
    if hints.java_symbol && before == Some('"') {
        return false;
    }
    if require_call {
        let rest = contents[idx + pattern.len()..].trim_start();
        if !rest.starts_with('(') {
            return false;
        }
    }
    true
}
