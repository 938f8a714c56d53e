//! Log table viewer: turns loosely structured CSV/TSV logs into a table with
//! separator rows, group captions and an optional fixed column schema, and
//! searches the rendered result.
//!
//! ```
//! use ltv::domain::DatasetSpec;
//! use ltv::pipeline::build;
//! use ltv::search::SearchState;
//!
//! let text = "Timestamp,Type,From\n2024-01-01,A,X\n#sep\n2024-01-02,B,Y\n";
//! let rendered = build(text, &DatasetSpec::new("s1", "s1.csv"));
//!
//! let mut search = SearchState::new();
//! search.set_query("b", rendered.table());
//! assert_eq!(search.position(), (1, 1));
//! ```

pub mod classifier;
pub mod controller;
pub mod domain;
pub mod inputter;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod projector;
pub mod render;
pub mod schema;
pub mod search;
pub mod source;
pub mod ui;

pub use domain::{DatasetSpec, LTVConfig, LTVError, Result};
pub use pipeline::{Dataset, build, load};
pub use render::{Rendered, RenderedRow, TableModel};
pub use search::{SearchMatch, SearchState};
