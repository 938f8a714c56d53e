//! Text to table: parse, classify, resolve, project and render one dataset.

use std::time::Instant;

use tracing::{error, info, trace};

use crate::classifier::{RowKind, classify};
use crate::domain::DatasetSpec;
use crate::parser::parse;
use crate::projector::Projection;
use crate::render::{PLACEHOLDER_EMPTY, Rendered, render};
use crate::schema::resolve;
use crate::source::DataSource;

/// A dataset together with its latest render.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub spec: DatasetSpec,
    pub rendered: Rendered,
}

impl Dataset {
    pub fn load(source: &dyn DataSource, spec: DatasetSpec) -> Self {
        let rendered = load(source, &spec);
        Self { spec, rendered }
    }
}

/// Fetch and build a dataset. Never fails, an unavailable source renders as
/// a placeholder.
pub fn load(source: &dyn DataSource, spec: &DatasetSpec) -> Rendered {
    match source.fetch_text(&spec.locator) {
        Ok(text) => build(&text, spec),
        Err(e) => {
            error!("Loading {} failed: {e}", spec.name);
            Rendered::Placeholder(format!("{}: data unavailable ({e})", spec.name))
        }
    }
}

pub fn build(text: &str, spec: &DatasetSpec) -> Rendered {
    let start_time = Instant::now();

    let rows = parse(text, spec.delimiter);
    let nrows = rows.len();
    let classified = classify(rows, &spec.keywords);

    let Some(resolved) = resolve(classified, spec.locked_header.as_deref()) else {
        info!("{}: no header row in {nrows} rows", spec.name);
        return Rendered::Placeholder(PLACEHOLDER_EMPTY.to_string());
    };

    let schema = resolved.schema.columns();
    let projection = if resolved.schema.is_locked() && resolved.header_row_consumed {
        Projection::new(&resolved.source_header, schema)
    } else {
        Projection::positional(schema.len())
    };
    trace!(
        "{}: schema {:?}, source {:?}, identity projection {}",
        spec.name,
        schema,
        resolved.source_header,
        projection.is_identity()
    );

    let mut body = resolved.body;
    if !projection.is_identity() {
        for row in body.iter_mut().filter(|r| r.kind == RowKind::Data) {
            row.cells = projection.apply(&row.cells);
        }
    }
    let table = render(schema, &body);

    info!(
        "{}: {} rows, {} columns in {}ms",
        spec.name,
        table.rows.len(),
        table.width(),
        start_time.elapsed().as_millis()
    );
    Rendered::Table(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedRow;
    use crate::search::SearchState;
    use crate::source::{FileSource, InMemorySource};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOG: &str = "Timestamp,Type,From\n2024-01-01,A,X\n#sep\n2024-01-02,B,Y\n";

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn data(cells: &[&str]) -> RenderedRow {
        RenderedRow::Data(strings(cells))
    }

    #[test]
    fn inferred_schema() {
        let rendered = build(LOG, &DatasetSpec::new("s1", "s1"));
        let table = rendered.table().unwrap();
        assert_eq!(table.header, strings(&["Timestamp", "Type", "From"]));
        assert_eq!(
            table.rows,
            vec![
                data(&["2024-01-01", "A", "X"]),
                RenderedRow::Separator,
                data(&["2024-01-02", "B", "Y"]),
            ]
        );
    }

    #[test]
    fn locked_schema_projects_columns() {
        let spec = DatasetSpec::new("s1", "s1").with_locked_header(strings(&["Timestamp", "From"]));
        let rendered = build(LOG, &spec);
        let table = rendered.table().unwrap();
        assert_eq!(table.header, strings(&["Timestamp", "From"]));
        let rows: Vec<&Vec<String>> = table.data_rows().collect();
        assert_eq!(rows, vec![&strings(&["2024-01-01", "X"]), &strings(&["2024-01-02", "Y"])]);
    }

    #[test]
    fn locked_schema_with_padded_file_header() {
        let spec = DatasetSpec::new("s1", "s1").with_locked_header(strings(&["Timestamp", "From"]));
        let table = build("Timestamp, Type, From\n2024-01-01,A,X\n", &spec)
            .table()
            .cloned()
            .unwrap();
        assert_eq!(table.rows, vec![data(&["2024-01-01", "X"])]);
    }

    #[test]
    fn locked_schema_from_file_with_byte_order_mark() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "\u{feff}{LOG}").unwrap();
        let spec = DatasetSpec::new("s1", file.path().to_str().unwrap())
            .with_locked_header(strings(&["Timestamp", "From"]));
        let rendered = load(&FileSource::new(), &spec);
        let table = rendered.table().unwrap();
        let rows: Vec<&Vec<String>> = table.data_rows().collect();
        assert_eq!(rows, vec![&strings(&["2024-01-01", "X"]), &strings(&["2024-01-02", "Y"])]);

        let inferred = load(&FileSource::new(), &DatasetSpec::new("s1", file.path().to_str().unwrap()));
        assert_eq!(inferred.table().unwrap().header, strings(&["Timestamp", "Type", "From"]));
    }

    #[test]
    fn locked_schema_without_header_in_file() {
        let locked = strings(&["Timestamp", "Type", "Stop 1 Info", "Route", "Sender"]);
        let spec = DatasetSpec::new("s2", "s2").with_locked_header(locked.clone());
        let text = "## Monday\n2024-01-01\tA\tDepot\tR7\tAnn\tsurplus\n2024-01-02\tB\n";
        let table = build(text, &spec).table().cloned().unwrap();
        assert_eq!(table.header, locked);
        assert_eq!(
            table.rows,
            vec![
                RenderedRow::Group("Monday".to_string()),
                data(&["2024-01-01", "A", "Depot", "R7", "Ann"]),
                data(&["2024-01-02", "B", "", "", ""]),
            ]
        );
    }

    #[test]
    fn locked_rows_always_have_schema_width() {
        let locked = strings(&["From", "Missing", "Timestamp"]);
        let spec = DatasetSpec::new("s", "s").with_locked_header(locked);
        let text = "Timestamp,Type,From\n1\n1,2,3,4,5\n,,\n";
        let table = build(text, &spec).table().cloned().unwrap();
        assert!(table.data_rows().all(|r| r.len() == 3));
        assert_eq!(table.data_rows().next(), Some(&strings(&["", "", "1"])));
    }

    #[test]
    fn search_on_rendered_table() {
        let rendered = build(LOG, &DatasetSpec::new("s1", "s1"));
        let mut state = SearchState::new();
        state.set_query("b", rendered.table());
        assert_eq!(state.position(), (1, 1));
        let current = state.current().unwrap();
        assert_eq!(rendered.table().unwrap().cell(current.row, current.column), Some("B"));
    }

    #[test]
    fn unrecognized_text_is_placeholder() {
        let rendered = build("just a note\n\n#sep\n", &DatasetSpec::new("s3", "s3"));
        assert_eq!(rendered, Rendered::Placeholder(PLACEHOLDER_EMPTY.to_string()));
    }

    #[test]
    fn unavailable_source_is_placeholder() {
        let source = InMemorySource::new();
        let dataset = Dataset::load(&source, DatasetSpec::new("s1", "data/s1.csv"));
        assert!(dataset.rendered.is_placeholder());
        assert!(dataset.rendered.to_html().contains("s1: data unavailable"));
    }

    #[test]
    fn loads_from_source() {
        let mut source = InMemorySource::new();
        source.insert("data/s1.csv", LOG);
        let rendered = load(&source, &DatasetSpec::new("s1", "data/s1.csv"));
        assert_eq!(rendered.table().map(|t| t.rows.len()), Some(3));
    }
}
