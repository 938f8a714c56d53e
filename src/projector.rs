//! Column projection from a source header onto a target header.

use crate::parser::RawRow;

/// Precomputed mapping of target columns to source column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    indices: Vec<Option<usize>>,
    identity: bool,
}

impl Projection {
    /// Target names are matched case-sensitively against the first source
    /// column of the same name. Surrounding whitespace is ignored on both
    /// sides.
    pub fn new(source_header: &[String], target_header: &[String]) -> Self {
        let indices: Vec<Option<usize>> = target_header
            .iter()
            .map(|name| {
                source_header
                    .iter()
                    .position(|s| s.trim() == name.trim())
            })
            .collect();
        let identity = indices
            .iter()
            .enumerate()
            .all(|(target, source)| *source == Some(target));
        Self { indices, identity }
    }

    /// Mapping that keeps columns in place, used when the rows already follow
    /// the target order.
    pub fn positional(columns: usize) -> Self {
        Self {
            indices: (0..columns).map(Some).collect(),
            identity: true,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Cells for every target column, empty where the source has none.
    pub fn apply(&self, row: &[String]) -> RawRow {
        self.indices
            .iter()
            .map(|idx| idx.and_then(|i| row.get(i)).cloned().unwrap_or_default())
            .collect()
    }
}

pub fn project(row: &[String], source_header: &[String], target_header: &[String]) -> RawRow {
    Projection::new(source_header, target_header).apply(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reorders_and_drops_columns() {
        let source = strings(&["Timestamp", "Type", "From"]);
        let target = strings(&["From", "Timestamp"]);
        let row = strings(&["2024-01-01", "A", "X"]);
        assert_eq!(project(&row, &source, &target), strings(&["X", "2024-01-01"]));
    }

    #[test]
    fn missing_columns_are_empty() {
        let source = strings(&["Timestamp", "Type"]);
        let target = strings(&["Timestamp", "Route", "Type"]);
        let row = strings(&["t"]);
        assert_eq!(project(&row, &source, &target), strings(&["t", "", ""]));
    }

    #[test]
    fn matching_is_case_sensitive_and_first_wins() {
        let source = strings(&["from", "From", "From"]);
        let target = strings(&["From"]);
        let row = strings(&["a", "b", "c"]);
        assert_eq!(project(&row, &source, &target), strings(&["b"]));
    }

    #[test]
    fn projection_is_idempotent() {
        let source = strings(&["a", "b", "c"]);
        let target = strings(&["c", "a"]);
        let once = project(&strings(&["1", "2", "3"]), &source, &target);
        let twice = project(&once, &target, &target);
        assert_eq!(once, twice);
        assert!(Projection::new(&target, &target).is_identity());
        assert!(!Projection::new(&source, &target).is_identity());
    }

    #[test]
    fn padded_source_names_still_match() {
        let source = strings(&["Timestamp", " Type", " From "]);
        let target = strings(&["Timestamp", "From"]);
        let row = strings(&["2024-01-01", "A", "X"]);
        assert_eq!(project(&row, &source, &target), strings(&["2024-01-01", "X"]));
        assert_eq!(project(&row, &source, &strings(&["from"])), strings(&[""]));
    }

    #[test]
    fn positional_pads_and_truncates() {
        let p = Projection::positional(2);
        assert_eq!(p.apply(&strings(&["a"])), strings(&["a", ""]));
        assert_eq!(p.apply(&strings(&["a", "b", "c"])), strings(&["a", "b"]));
    }
}
