use std::path::PathBuf;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::classifier::HeaderKeywords;

#[derive(Debug, Error)]
pub enum LTVError {
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source '{name}' unavailable: {reason}")]
    SourceUnavailable { name: String, reason: String },

    #[error("Invalid lock specification '{0}', expected NAME=COL1,COL2,..")]
    InvalidLockSpec(String),

    #[error("Invalid delimiter '{0}'")]
    InvalidDelimiter(String),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LTVError>;

/// One named dataset and how to read it.
#[derive(Debug, Clone, Default, PartialEq, Setters)]
#[setters(prefix = "with_", into)]
pub struct DatasetSpec {
    /// Display name, used for section titles and `--lock` lookups.
    pub name: String,
    /// Identifier handed to the data source (a path for files).
    pub locator: String,
    #[setters(strip_option)]
    pub locked_header: Option<Vec<String>>,
    #[setters(strip_option)]
    pub delimiter: Option<char>,
    pub keywords: HeaderKeywords,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LTVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub datasets: Vec<DatasetSpec>,
}

impl Default for LTVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            datasets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextSection,
    PrevSection,
    Search,
    SearchNext,
    SearchPrev,
    CopyCell,
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
q          quit
arrows/hjkl move the cursor
PgUp/PgDn  move one page
g / G      first / last row
Tab        next section
Shift-Tab  previous section
/          search (live), Enter keeps the query, Esc clears it
n / N      next / previous match
c / C      copy cell / row
?          this help
Esc        close popup";
