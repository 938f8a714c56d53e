//! Row classification heuristics.
//!
//! A row whose first cell happens to start with `##` is always read as a
//! group title, even when it was meant as data. This is a known limitation of
//! the heuristics and is kept as is.

use crate::parser::RawRow;

/// First-cell markers that turn a row into a separator (compared lowercase).
const SEPARATOR_MARKERS: &[&str] = &["#sep", "---", "\u{2014}"];

const GROUP_PREFIX: &str = "##";

/// Quote characters stripped around a first cell before marker matching.
const MARKER_QUOTES: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Minimum number of keyword hits for a header row.
pub const HEADER_KEYWORD_HITS: usize = 2;

/// Minimum number of non-empty cells that make a row a header on its own.
const HEADER_MIN_CELLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data,
    Separator,
    GroupTitle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub kind: RowKind,
    pub cells: RawRow,
    /// Caption of a group title row.
    pub title: Option<String>,
}

impl ClassifiedRow {
    pub fn new(kind: RowKind, cells: RawRow) -> Self {
        Self {
            kind,
            cells,
            title: None,
        }
    }

    fn group(cells: RawRow) -> Self {
        let title = group_title(normalized_first_cell(&cells));
        Self {
            kind: RowKind::GroupTitle,
            cells,
            title: Some(title),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.kind, RowKind::Separator | RowKind::GroupTitle)
    }
}

/// Lowercased column names that identify a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderKeywords(Vec<String>);

impl HeaderKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for HeaderKeywords {
    fn default() -> Self {
        Self::new(["timestamp", "type", "from"])
    }
}

/// Number of distinct `names` found among `cells`, trimmed and
/// case-insensitive.
pub fn keyword_overlap<S: AsRef<str>>(cells: &[String], names: &[S]) -> usize {
    let cells: Vec<String> = cells.iter().map(|c| c.trim().to_lowercase()).collect();
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim().to_lowercase();
        if !seen.contains(&name) && cells.contains(&name) {
            seen.push(name);
        }
    }
    seen.len()
}

/// Label every row. Only the first qualifying row becomes the header.
pub fn classify(rows: Vec<RawRow>, keywords: &HeaderKeywords) -> Vec<ClassifiedRow> {
    let mut header_found = false;
    rows.into_iter()
        .map(|cells| {
            let row = classify_row(cells, keywords, header_found);
            header_found |= row.kind == RowKind::Header;
            row
        })
        .collect()
}

fn classify_row(cells: RawRow, keywords: &HeaderKeywords, header_found: bool) -> ClassifiedRow {
    if is_blank(&cells) || is_separator_marker(&cells) {
        return ClassifiedRow::new(RowKind::Separator, cells);
    }
    if is_group_title(&cells) {
        return ClassifiedRow::group(cells);
    }
    if !header_found && is_header_candidate(&cells, keywords) {
        return ClassifiedRow::new(RowKind::Header, cells);
    }
    ClassifiedRow::new(RowKind::Data, cells)
}

pub fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

fn normalized_first_cell(cells: &[String]) -> &str {
    let first = cells.first().map(|c| c.trim()).unwrap_or("");
    let first = first.strip_prefix(MARKER_QUOTES).unwrap_or(first);
    first.strip_suffix(MARKER_QUOTES).unwrap_or(first).trim()
}

pub fn is_separator_marker(cells: &[String]) -> bool {
    let first = normalized_first_cell(cells).to_lowercase();
    SEPARATOR_MARKERS.contains(&first.as_str())
}

pub fn is_group_title(cells: &[String]) -> bool {
    normalized_first_cell(cells).starts_with(GROUP_PREFIX)
}

/// Caption of a group title row. Works on the trimmed first cell with
/// surrounding quotes removed, so trailing whitespace and quotes are dropped
/// too, not just the `##` prefix.
fn group_title(first: &str) -> String {
    first
        .strip_prefix(GROUP_PREFIX)
        .unwrap_or(first)
        .trim_start()
        .to_string()
}

fn is_header_candidate(cells: &[String], keywords: &HeaderKeywords) -> bool {
    if keyword_overlap(cells, keywords.as_slice()) >= HEADER_KEYWORD_HITS {
        return true;
    }
    cells.iter().filter(|c| !c.trim().is_empty()).count() >= HEADER_MIN_CELLS
}
