use crate::catalog::Relation;
use crate::config::DatabaseEncoding;
use crate::convert::to_datum;
use crate::datum::{Datum, TypeId};
use crate::error::{ErrorLevel, ScanError, ScanResult};
use crate::lookup::lookup_column;
use lexql::ast::Literal;
use lexql::selection::filter::{self, Filterable};
use lexscan_engine::{Column, Id, Normalizer, Query, Table};
use serde::Serialize;

/// A relational tuple built from one source record. `None` values are NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: Id,
    pub relation: String,
    pub values: Vec<(String, Option<Datum>)>,
}

impl Row {
    /// The value of column `name`; `None` when it is NULL or not part of the row
    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.values.iter().find(|(column, _)| column == name).and_then(|(_, value)| value.as_ref())
    }

    pub fn has_column(&self, name: &str) -> bool { self.values.iter().any(|(column, _)| column == name) }

    /// The row restricted to `columns`, in that order
    pub fn project(&self, columns: &[String]) -> Row {
        let values = columns.iter().filter_map(|name| self.values.iter().find(|(column, _)| column == name).cloned()).collect();
        Row { id: self.id, relation: self.relation.clone(), values }
    }
}

impl Filterable for Row {
    fn collection(&self) -> &str { &self.relation }

    fn value(&self, name: &str) -> Option<Literal> {
        self.values.iter().find(|(column, _)| column == name).map(|(_, value)| value.as_ref().map_or(Literal::Null, Datum::to_literal))
    }

    fn matches_query(&self, text: &str, query: &str) -> Result<bool, filter::Error> {
        let query = Query::parse(query).map_err(|e| filter::Error::Unsupported(e.message))?;
        Ok(query.matches(text, Normalizer::Auto))
    }
}

/// Reads source records as rows. Column handles are resolved once, when the materializer is built.
#[derive(Debug)]
pub struct Materializer {
    relation: String,
    columns: Vec<(String, TypeId, Column)>,
}

impl Materializer {
    pub fn new(relation: &Relation, sources: &Table, columns: &[String], encoding: DatabaseEncoding) -> ScanResult<Self> {
        let mut resolved = Vec::with_capacity(columns.len());
        for name in columns {
            let (_, attribute) = relation
                .attribute(name)
                .ok_or_else(|| ScanError::NotFound(format!("[materialize] {}.{name} does not exist", relation.name)))?;
            let column = lookup_column(sources, name, encoding, ErrorLevel::Error)?
                .ok_or_else(|| ScanError::NotFound(format!("[materialize] {}.{name} is not stored in the index", relation.name)))?;
            resolved.push((name.clone(), attribute.type_id, column));
        }
        Ok(Self { relation: relation.name.clone(), columns: resolved })
    }

    pub fn materialize(&self, id: Id) -> ScanResult<Row> {
        let mut values = Vec::with_capacity(self.columns.len());
        for (name, type_id, column) in &self.columns {
            let datum = to_datum(&column.get_value(id), *type_id)
                .map_err(|e| ScanError::Conversion(format!("{}.{name} of record {id}: {e}", self.relation)))?;
            values.push((name.clone(), datum));
        }
        Ok(Row { id, relation: self.relation.clone(), values })
    }
}
