//! Compiles relational predicates into lexscan engine expressions and streams the matching
//! records of an index's sources table back as rows.
//!
//! The host drives everything: [`path::initialize`] installs the planner hook, [`path::offer_path`]
//! offers a custom path when a table has a lexscan index, and the plan node built from that path
//! runs [`scan::LexScanState`] through the begin / next / rescan / end protocol.

pub mod broken;
pub mod catalog;
pub mod chooser;
pub mod column_name;
pub mod config;
pub mod convert;
pub mod datum;
pub mod error;
pub mod lookup;
pub mod materialize;
pub mod node;
pub mod path;
pub mod positions;
pub mod scan;
pub mod search;

/// Access method name identifying lexscan indexes in the catalog
pub const ACCESS_METHOD: &str = "lexscan";

/// Name of the custom scan, as shown by EXPLAIN
pub const SCAN_NAME: &str = "LexScan";

pub use broken::list_broken_indexes;
pub use catalog::{Catalog, MemoryCatalog, Oid};
pub use chooser::choose_index;
pub use config::{DatabaseEncoding, ScanConfig};
pub use datum::{Datum, TypeId};
pub use error::{ErrorLevel, ScanError, ScanResult};
pub use materialize::Row;
pub use node::{EState, ScanNode};
pub use path::{finalize, initialize, offer_path, Hooks};
pub use positions::match_positions_byte;
pub use scan::LexScanState;
pub use search::{ConditionCompiler, ParamList, SearchData};
