//! Live substring search over a rendered table.

use tracing::trace;

use crate::render::TableModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Body row of the table.
    pub row: usize,
    pub column: usize,
    /// Position among all matches, 0-based.
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// Query set, nothing found.
    Scanning,
    Navigating { current: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    query: String,
    matches: Vec<SearchMatch>,
    phase: SearchPhase,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// Replace the query and rescan `table` from scratch.
    pub fn set_query(&mut self, query: &str, table: Option<&TableModel>) {
        self.query = query.trim().to_string();
        self.rescan(table);
    }

    /// The visible table changed, keep the query and rescan.
    pub fn refresh(&mut self, table: Option<&TableModel>) {
        self.rescan(table);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn rescan(&mut self, table: Option<&TableModel>) {
        self.matches.clear();
        self.phase = SearchPhase::Idle;

        let Some(table) = table else {
            return;
        };
        if self.query.is_empty() {
            return;
        }

        let needle = self.query.to_lowercase();
        for (ridx, row) in table.rows.iter().enumerate() {
            if row.is_separator() {
                continue;
            }
            for (cidx, cell) in row.cells().iter().enumerate() {
                if cell.to_lowercase().contains(&needle) {
                    self.matches.push(SearchMatch {
                        row: ridx,
                        column: cidx,
                        rank: self.matches.len(),
                    });
                }
            }
        }

        self.phase = if self.matches.is_empty() {
            SearchPhase::Scanning
        } else {
            SearchPhase::Navigating { current: 0 }
        };
        trace!("Search '{}' found {} matches", self.query, self.matches.len());
    }

    pub fn next(&mut self) -> Option<SearchMatch> {
        self.step(1)
    }

    pub fn prev(&mut self) -> Option<SearchMatch> {
        self.step(-1)
    }

    fn step(&mut self, step: isize) -> Option<SearchMatch> {
        let SearchPhase::Navigating { current } = self.phase else {
            return None;
        };
        let n = self.matches.len() as isize;
        let current = (current as isize + step).rem_euclid(n) as usize;
        self.phase = SearchPhase::Navigating { current };
        self.current()
    }

    pub fn current(&self) -> Option<SearchMatch> {
        match self.phase {
            SearchPhase::Navigating { current } => self.matches.get(current).copied(),
            _ => None,
        }
    }

    /// `(current + 1, total)`, or `(0, 0)` without a current match.
    pub fn position(&self) -> (usize, usize) {
        match self.current() {
            Some(m) => (m.rank + 1, self.matches.len()),
            None => (0, 0),
        }
    }

    pub fn is_match(&self, row: usize, column: usize) -> bool {
        self.matches
            .binary_search_by(|m| (m.row, m.column).cmp(&(row, column)))
            .is_ok()
    }

    pub fn is_current(&self, row: usize, column: usize) -> bool {
        self.current()
            .is_some_and(|m| m.row == row && m.column == column)
    }
}
