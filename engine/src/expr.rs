use crate::column::Column;
use crate::lexicon::IndexColumn;
use crate::table::Table;
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
    /// Substring containment on normalized text
    Match,
    /// A query in the engine query syntax
    Query,
}

/// How the records a selection finds are merged into the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperation {
    Or,
    And,
    AndNot,
}

/// What a condition is evaluated against
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Column(Column),
    Index(IndexColumn),
}

impl Target {
    pub fn name(&self) -> String {
        match self {
            Target::Column(column) => column.full_name(),
            Target::Index(index) => format!("{}<-{}", index.name(), index.source().full_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf { target: Target, operator: Operator, value: Value },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn leaf(target: Target, operator: Operator, value: Value) -> Self { Condition::Leaf { target, operator, value } }

    /// Number of leaves in the condition tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Condition::Leaf { .. } => 1,
            Condition::And(children) | Condition::Or(children) => children.iter().map(Condition::leaf_count).sum(),
        }
    }
}

/// A search expression over one table: its top-level clauses are merged by the selector's set operation
#[derive(Debug, Clone)]
pub struct Expr {
    table: Table,
    clauses: Vec<Condition>,
}

impl Expr {
    pub fn new(table: &Table) -> Self { Expr { table: table.clone(), clauses: Vec::new() } }

    pub fn append(&mut self, condition: Condition) { self.clauses.push(condition) }

    pub fn table(&self) -> &Table { &self.table }
    pub fn clauses(&self) -> &[Condition] { &self.clauses }
    pub fn is_empty(&self) -> bool { self.clauses.is_empty() }
}
