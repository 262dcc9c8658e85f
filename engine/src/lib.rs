//! An in-memory inverted-index search engine.
//!
//! Everything hangs off a [`Context`]: named tables, lexicons and their columns. Handles are
//! reference counted and not `Send`; a context and everything opened from it belong to one thread.

pub mod column;
pub mod context;
pub mod cursor;
pub mod error;
pub mod expr;
pub mod lexicon;
pub mod query;
pub mod selector;
pub mod table;
pub mod value;

/// Record id within a table. Ids start at 1.
pub type Id = u32;

/// The id no record ever has
pub const ID_NIL: Id = 0;

/// Upper bound (exclusive) on the size in bytes of a table key or object name
pub const TABLE_MAX_KEY_SIZE: usize = 4096;

pub use column::Column;
pub use context::{Context, Object, ObjectStatus};
pub use cursor::{Order, TableCursor};
pub use error::{EngineError, ReturnCode};
pub use expr::{Condition, Expr, Operator, SetOperation, Target};
pub use lexicon::{IndexColumn, Lexicon, Normalizer, Tokenizer};
pub use query::Query;
pub use selector::TableSelector;
pub use table::{Table, TableKind};
pub use value::{DataType, Value};
