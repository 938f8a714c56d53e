//! Schema resolution: inferred header or caller-supplied locked header.

use tracing::{debug, trace};

use crate::classifier::{ClassifiedRow, HEADER_KEYWORD_HITS, RowKind, keyword_overlap};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Inferred(Vec<String>),
    Locked(Vec<String>),
}

impl Schema {
    pub fn columns(&self) -> &[String] {
        match self {
            Schema::Inferred(c) | Schema::Locked(c) => c,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Schema::Locked(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub schema: Schema,
    /// Column order of the `Data` rows in `body`.
    pub source_header: Vec<String>,
    pub body: Vec<ClassifiedRow>,
    /// A row of the input was used up as the header.
    pub header_row_consumed: bool,
}

/// Split classified rows into schema and body.
///
/// Returns `None` when nothing in the input can anchor a table: no header row
/// without a lock, or no header/data row at all with a lock.
pub fn resolve(rows: Vec<ClassifiedRow>, locked_header: Option<&[String]>) -> Option<Resolved> {
    match locked_header {
        None => resolve_inferred(rows),
        Some(locked) => resolve_locked(rows, locked),
    }
}

fn resolve_inferred(rows: Vec<ClassifiedRow>) -> Option<Resolved> {
    let header_idx = rows.iter().position(|r| r.kind == RowKind::Header)?;
    trace!("Header found at row {header_idx}, {header_idx} leading rows dropped");

    let mut rows = rows.into_iter().skip(header_idx);
    let header = rows.next()?.cells;
    Some(Resolved {
        schema: Schema::Inferred(header.clone()),
        source_header: header,
        body: rows.collect(),
        header_row_consumed: true,
    })
}

fn resolve_locked(rows: Vec<ClassifiedRow>, locked: &[String]) -> Option<Resolved> {
    let anchor_idx = rows.iter().position(|r| !r.is_passthrough())?;
    let overlap = keyword_overlap(&rows[anchor_idx].cells, locked);
    let consumed = overlap >= HEADER_KEYWORD_HITS;
    debug!(
        "Locked header, anchor row {anchor_idx} overlaps {overlap} column(s), {}",
        if consumed { "skipped as source header" } else { "kept as data" }
    );

    let mut source_header = locked.to_vec();
    let mut body = Vec::with_capacity(rows.len());
    for (idx, mut row) in rows.into_iter().enumerate() {
        if idx == anchor_idx && consumed {
            source_header = row.cells;
            continue;
        }
        if row.kind == RowKind::Header {
            row.kind = RowKind::Data;
        }
        body.push(row);
    }

    Some(Resolved {
        schema: Schema::Locked(locked.to_vec()),
        source_header,
        body,
        header_row_consumed: consumed,
    })
}
