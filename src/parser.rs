//! Quote-aware delimited text parser with tab/comma detection.

use std::str::FromStr;

use crate::domain::LTVError;

/// Cells of a single source line, in source order.
pub type RawRow = Vec<String>;

/// Number of sampled lines used for delimiter detection.
const DETECTION_SAMPLE_LINES: usize = 10;

const QUOTE: char = '"';

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
    Other(char),
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Other(c) => c,
        }
    }
}

impl From<char> for Delimiter {
    fn from(c: char) -> Self {
        match c {
            ',' => Delimiter::Comma,
            '\t' => Delimiter::Tab,
            c => Delimiter::Other(c),
        }
    }
}

impl FromStr for Delimiter {
    type Err = LTVError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "tab" | "\\t" | "\t" => Ok(Delimiter::Tab),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c != QUOTE && c != '\n' && c != '\r' => Ok(c.into()),
                    _ => Err(LTVError::InvalidDelimiter(s.to_string())),
                }
            }
        }
    }
}

/// Split `text` into rows of cells.
///
/// Quoted fields may contain the delimiter and line breaks, `""` inside a
/// quoted field is a literal quote. An unterminated quote is closed by the end
/// of input. `\r` outside of quotes is dropped. A leading byte order mark is
/// skipped. Without an explicit delimiter, [`detect_delimiter`] picks one.
pub fn parse(text: &str, delimiter: Option<char>) -> Vec<RawRow> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(text));

    let mut rows = Vec::new();
    let mut row: RawRow = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    // Something was read since the last line break
    let mut pending = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    cur.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cur.push(ch);
            }
            continue;
        }

        match ch {
            QUOTE => {
                in_quotes = true;
                pending = true;
            }
            '\n' => {
                row.push(std::mem::take(&mut cur));
                rows.push(std::mem::take(&mut row));
                pending = false;
            }
            '\r' => {}
            c if c == delimiter => {
                row.push(std::mem::take(&mut cur));
                pending = true;
            }
            c => {
                cur.push(c);
                pending = true;
            }
        }
    }

    if pending {
        row.push(cur);
        rows.push(row);
    }
    rows
}

/// Pick tab or comma by counting both outside of quotes in the first
/// non-empty, non-comment lines. Comma wins ties.
pub fn detect_delimiter(text: &str) -> char {
    let (tabs, commas) = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .take(DETECTION_SAMPLE_LINES)
        .fold((0, 0), |(tabs, commas), line| {
            (
                tabs + count_unquoted(line, '\t'),
                commas + count_unquoted(line, ','),
            )
        });

    if tabs > commas { '\t' } else { ',' }
}

fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut count = 0;
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            QUOTE => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => count += 1,
            _ => {}
        }
    }
    count
}

/// Serialize a row so that [`parse`] reads it back unchanged.
pub fn write_row<S: AsRef<str>>(row: &[S], delimiter: char) -> String {
    let mut out = String::new();
    for (idx, cell) in row.iter().enumerate() {
        if idx > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote_cell(cell.as_ref(), delimiter));
    }
    out
}

/// Serialize rows, each terminated by a line break.
pub fn write_rows(rows: &[RawRow], delimiter: char) -> String {
    rows.iter()
        .map(|r| write_row(r, delimiter) + "\n")
        .collect()
}

fn quote_cell(cell: &str, delimiter: char) -> String {
    let needs_quoting = cell
        .chars()
        .any(|c| c == delimiter || c == QUOTE || c == '\n' || c == '\r');
    if needs_quoting {
        format!("\"{}\"", cell.replace(QUOTE, "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(v: &[&[&str]]) -> Vec<RawRow> {
        v.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn parses_simple_csv() {
        let parsed = parse("a,b,c\n1,2,3\n", None);
        assert_eq!(parsed, rows(&[&["a", "b", "c"], &["1", "2", "3"]]));
    }

    #[test]
    fn flushes_trailing_partial_row() {
        let parsed = parse("a,b\n1,2", Some(','));
        assert_eq!(parsed, rows(&[&["a", "b"], &["1", "2"]]));
    }

    #[test]
    fn keeps_blank_lines_as_rows() {
        let parsed = parse("a\n\nb\n", Some(','));
        assert_eq!(parsed, rows(&[&["a"], &[""], &["b"]]));
    }

    #[test]
    fn quoted_fields() {
        let parsed = parse("\"x, y\",\"say \"\"hi\"\"\",\"two\nlines\"\n", Some(','));
        assert_eq!(parsed, rows(&[&["x, y", "say \"hi\"", "two\nlines"]]));
    }

    #[test]
    fn skips_byte_order_mark() {
        let parsed = parse("\u{feff}Timestamp\tType\n1\t2\n", None);
        assert_eq!(parsed, rows(&[&["Timestamp", "Type"], &["1", "2"]]));
    }

    #[test]
    fn carriage_returns_are_dropped() {
        let parsed = parse("a,b\r\n1,2\r\n", Some(','));
        assert_eq!(parsed, rows(&[&["a", "b"], &["1", "2"]]));
    }

    #[test]
    fn unterminated_quote_closes_at_end() {
        let parsed = parse("a,\"open,still\nopen", Some(','));
        assert_eq!(parsed, rows(&[&["a", "open,still\nopen"]]));
    }

    #[test]
    fn detects_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3\n"), '\t');
        let parsed = parse("a\tb, c\n1\t2\n", None);
        assert_eq!(parsed, rows(&[&["a", "b, c"], &["1", "2"]]));
    }

    #[test]
    fn detection_defaults_to_comma() {
        assert_eq!(detect_delimiter(""), ',');
        assert_eq!(detect_delimiter("a\tb,c,d\n"), ',');
        assert_eq!(detect_delimiter("a\tb\n\"x\t\t\t\",y,z\n"), ',');
    }

    #[test]
    fn detection_skips_comment_lines() {
        let text = "#sep,#,#,#,#\n#more,,,,\na\tb\tc\n";
        assert_eq!(detect_delimiter(text), '\t');
    }

    #[test]
    fn delimiter_from_str() {
        assert_eq!("tab".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!(",".parse::<Delimiter>().unwrap(), Delimiter::Comma);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::Other(';'));
        assert!("\"".parse::<Delimiter>().is_err());
        assert!(";;".parse::<Delimiter>().is_err());
    }

    #[test]
    fn write_row_quotes_when_needed() {
        assert_eq!(write_row(&["a", "b c", "d,e", "f\"g"], ','), "a,b c,\"d,e\",\"f\"\"g\"");
    }

    proptest! {
        #[test]
        fn reparsing_written_rows_is_stable(text in "[a-c,\"\\n\\r\\t #]{0,60}") {
            let first = parse(&text, Some(','));
            let second = parse(&write_rows(&first, ','), Some(','));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn reparsing_written_tsv_is_stable(text in "[a-c,\"\\n\\r\\t #]{0,60}") {
            let first = parse(&text, Some('\t'));
            let second = parse(&write_rows(&first, '\t'), Some('\t'));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn parse_never_panics(text in "\\PC{0,200}") {
            let _ = parse(&text, None);
        }
    }
}
