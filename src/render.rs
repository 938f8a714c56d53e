//! Declarative table model handed to the display surfaces.

use crate::classifier::{ClassifiedRow, RowKind};

pub const PLACEHOLDER_EMPTY: &str = "No table data found.";

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedRow {
    /// Exactly one cell per schema column.
    Data(Vec<String>),
    /// Full width divider without content.
    Separator,
    /// Full width caption.
    Group(String),
}

impl RenderedRow {
    /// Searchable cells of the row, in display order.
    pub fn cells(&self) -> &[String] {
        match self {
            RenderedRow::Data(cells) => cells,
            RenderedRow::Separator => &[],
            RenderedRow::Group(title) => std::slice::from_ref(title),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, RenderedRow::Separator)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableModel {
    pub header: Vec<String>,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Table(TableModel),
    Placeholder(String),
}

impl Rendered {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder(_))
    }

    pub fn table(&self) -> Option<&TableModel> {
        match self {
            Rendered::Table(t) => Some(t),
            Rendered::Placeholder(_) => None,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Rendered::Table(t) => t.to_html(),
            Rendered::Placeholder(msg) => {
                format!("<div class=\"placeholder\">{}</div>", escape_html(msg))
            }
        }
    }
}

/// Build the table for an already projected body. `Data` rows are cut or
/// padded to the schema width.
pub fn render(schema: &[String], rows: &[ClassifiedRow]) -> TableModel {
    let width = schema.len();
    let rows = rows
        .iter()
        .map(|row| match row.kind {
            RowKind::Separator => RenderedRow::Separator,
            RowKind::GroupTitle => RenderedRow::Group(row.title.clone().unwrap_or_default()),
            RowKind::Header | RowKind::Data => {
                let mut cells: Vec<String> = row.cells.iter().take(width).cloned().collect();
                cells.resize(width, String::new());
                RenderedRow::Data(cells)
            }
        })
        .collect();

    TableModel {
        header: schema.to_vec(),
        rows,
    }
}

impl TableModel {
    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows.iter().filter_map(|r| match r {
            RenderedRow::Data(cells) => Some(cells),
            _ => None,
        })
    }

    /// Cell at a body position, `None` for separators and out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.cells().get(column))
            .map(String::as_str)
    }

    /// Display width per column: the longest header or data cell, capped at
    /// `max_width`. Group captions span the table and are not counted.
    pub fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for cells in self.data_rows() {
            for (w, cell) in widths.iter_mut().zip(cells) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths.into_iter().map(|w| w.clamp(1, max_width.max(1))).collect()
    }

    pub fn to_html(&self) -> String {
        let colspan = self.width();
        let th: String = self
            .header
            .iter()
            .map(|h| format!("<th>{}</th>", escape_html(h)))
            .collect();

        let mut body = String::new();
        for row in &self.rows {
            match row {
                RenderedRow::Separator => {
                    body.push_str(&format!("<tr class=\"sep-row\"><td colspan=\"{colspan}\"></td></tr>"));
                }
                RenderedRow::Group(title) => {
                    body.push_str(&format!(
                        "<tr class=\"group-row\"><td colspan=\"{colspan}\">{}</td></tr>",
                        escape_html(title)
                    ));
                }
                RenderedRow::Data(cells) => {
                    let tds: String = cells
                        .iter()
                        .map(|c| format!("<td>{}</td>", escape_html(c)))
                        .collect();
                    body.push_str(&format!("<tr>{tds}</tr>"));
                }
            }
        }
        format!("<table><thead><tr>{th}</tr></thead><tbody>{body}</tbody></table>")
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_html`].
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
