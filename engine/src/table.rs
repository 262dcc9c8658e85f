use crate::column::Column;
use crate::context::{validate_name, ObjectStatus};
use crate::error::{EngineError, Result};
use crate::value::{DataType, Value};
use crate::{Id, ID_NIL};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Records have no key; ids are assigned sequentially
    NoKey,
    Hash,
    PatriciaTrie,
    /// Records are ids of a source table (a selected set)
    Result,
}

#[derive(Debug)]
struct TableData {
    name: Option<String>,
    kind: TableKind,
    key_type: Option<DataType>,
    source: Option<Table>,
    records: RefCell<BTreeMap<Id, Value>>,
    keys: RefCell<BTreeMap<Vec<u8>, Id>>,
    next_id: Cell<Id>,
    columns: RefCell<IndexMap<String, Column>>,
    status: ObjectStatus,
}

/// Handle to a table. Clones share the table.
#[derive(Debug, Clone)]
pub struct Table(Rc<TableData>);

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

fn key_bytes(key: &Value) -> Vec<u8> {
    match key {
        Value::Text(s) => s.as_bytes().to_vec(),
        other => format!("{other:?}").into_bytes(),
    }
}

impl Table {
    pub(crate) fn new(name: Option<String>, kind: TableKind, key_type: Option<DataType>, source: Option<Table>) -> Self {
        Table(Rc::new(TableData {
            name,
            kind,
            key_type,
            source,
            records: RefCell::new(BTreeMap::new()),
            keys: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(ID_NIL + 1),
            columns: RefCell::new(IndexMap::new()),
            status: ObjectStatus::default(),
        }))
    }

    pub fn name(&self) -> Option<&str> { self.0.name.as_deref() }
    pub fn kind(&self) -> TableKind { self.0.kind }
    pub fn key_type(&self) -> Option<DataType> { self.0.key_type }
    pub fn status(&self) -> &ObjectStatus { &self.0.status }

    /// The table a result table's ids refer to
    pub fn source(&self) -> Option<&Table> { self.0.source.as_ref() }

    pub fn size(&self) -> usize { self.0.records.borrow().len() }
    pub fn is_empty(&self) -> bool { self.size() == 0 }
    pub fn contains(&self, id: Id) -> bool { self.0.records.borrow().contains_key(&id) }

    /// All record ids in ascending order
    pub fn ids(&self) -> Vec<Id> { self.0.records.borrow().keys().copied().collect() }

    /// Add a record, returning its id. For keyed tables an existing key returns the existing id.
    pub fn add(&self, key: Option<Value>) -> Result<Id> {
        match (self.0.kind, key) {
            (TableKind::Result, _) => Err(EngineError::invalid_argument("[table][add] use add_id for result tables")),
            (TableKind::NoKey, Some(_)) => Err(EngineError::invalid_argument("[table][add] table has no key")),
            (TableKind::NoKey, None) => Ok(self.next_record(Value::Void)),
            (_, None) => Err(EngineError::invalid_argument("[table][add] key is required")),
            (_, Some(key)) => {
                let key = match self.0.key_type {
                    Some(key_type) => key.cast(key_type)?,
                    None => key,
                };
                let bytes = key_bytes(&key);
                if bytes.len() >= crate::TABLE_MAX_KEY_SIZE {
                    return Err(EngineError::invalid_argument(format!("[table][add] key is too long: {} bytes", bytes.len())));
                }
                if let Some(id) = self.0.keys.borrow().get(&bytes) {
                    return Ok(*id);
                }
                let id = self.next_record(key);
                self.0.keys.borrow_mut().insert(bytes, id);
                Ok(id)
            }
        }
    }

    fn next_record(&self, key: Value) -> Id {
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);
        self.0.records.borrow_mut().insert(id, key);
        id
    }

    /// Add a source record id to a result table. Adding an id twice is a no-op.
    pub fn add_id(&self, id: Id) -> Result<()> {
        let source = self.source().ok_or_else(|| EngineError::invalid_argument("[table][add_id] not a result table"))?;
        if !source.contains(id) {
            return Err(EngineError::invalid_argument(format!("[table][add_id] no record {id} in source table")));
        }
        self.0.records.borrow_mut().entry(id).or_insert(Value::Void);
        Ok(())
    }

    pub fn key(&self, id: Id) -> Option<Value> { self.0.records.borrow().get(&id).cloned() }

    pub fn lookup(&self, key: &Value) -> Option<Id> {
        let key = match self.0.key_type {
            Some(key_type) => key.cast(key_type).ok()?,
            None => key.clone(),
        };
        self.0.keys.borrow().get(&key_bytes(&key)).copied()
    }

    /// Delete a record and clear its column values (which also removes it from any index)
    pub fn delete(&self, id: Id) -> Result<()> {
        let key = self.0.records.borrow_mut().remove(&id);
        let Some(key) = key else {
            return Err(EngineError::invalid_argument(format!("[table][delete] no record {id}")));
        };
        if !key.is_void() {
            self.0.keys.borrow_mut().remove(&key_bytes(&key));
        }
        if self.0.kind != TableKind::Result {
            for column in self.columns() {
                column.set_value(id, Value::Void)?;
            }
        }
        Ok(())
    }

    pub fn create_column(&self, name: &str, data_type: DataType) -> Result<Column> {
        if self.0.kind == TableKind::Result {
            return Err(EngineError::invalid_argument("[column][create] result tables share their source's columns"));
        }
        validate_name(name)?;
        if self.0.columns.borrow().contains_key(name) {
            return Err(EngineError::invalid_argument(format!("[column][create] already used name: <{name}>")));
        }
        let column = Column::new(name.to_string(), self.name().map(str::to_string), data_type);
        self.0.columns.borrow_mut().insert(name.to_string(), column.clone());
        Ok(column)
    }

    /// Look up a column. Result tables resolve names against their source table.
    pub fn column(&self, name: &str) -> Option<Column> {
        match self.source() {
            Some(source) => source.column(name),
            None => self.0.columns.borrow().get(name).cloned(),
        }
    }

    pub fn columns(&self) -> Vec<Column> {
        match self.source() {
            Some(source) => source.columns(),
            None => self.0.columns.borrow().values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::ReturnCode;

    #[test]
    fn test_no_key_table_assigns_sequential_ids() {
        let ctx = Context::new();
        let table = ctx.create_table(Some("Sources1"), TableKind::NoKey, None).unwrap();
        assert!(table.is_empty());
        let ids: Vec<Id> = (0..3).map(|_| table.add(None).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(table.ids(), vec![1, 2, 3]);
        assert!(table.add(Some(Value::Int32(1))).is_err());
    }

    #[test]
    fn test_hash_table_keys() {
        let ctx = Context::new();
        let table = ctx.create_table(None, TableKind::Hash, Some(DataType::ShortText)).unwrap();
        let a = table.add(Some(Value::Text("a".into()))).unwrap();
        let b = table.add(Some(Value::Text("b".into()))).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.add(Some(Value::Text("a".into()))).unwrap(), a);
        assert_eq!(table.lookup(&Value::Text("b".into())), Some(b));
        assert_eq!(table.key(a), Some(Value::Text("a".into())));

        table.delete(a).unwrap();
        assert_eq!(table.lookup(&Value::Text("a".into())), None);
        assert_eq!(table.delete(a).unwrap_err().rc, ReturnCode::InvalidArgument);
    }

    #[test]
    fn test_result_table_shares_source_columns() {
        let ctx = Context::new();
        let source = ctx.create_table(Some("Sources1"), TableKind::NoKey, None).unwrap();
        let title = source.create_column("title", DataType::ShortText).unwrap();
        let id = source.add(None).unwrap();
        title.set_value(id, Value::Text("hello".into())).unwrap();

        let result = ctx.create_result_table(&source).unwrap();
        result.add_id(id).unwrap();
        result.add_id(id).unwrap();
        assert_eq!(result.size(), 1);
        assert!(result.add_id(99).is_err());
        assert!(result.create_column("other", DataType::Int32).is_err());

        let via_result = result.column("title").unwrap();
        assert_eq!(via_result.get_value(id), Value::Text("hello".into()));
    }

    #[test]
    fn test_delete_clears_column_values() {
        let ctx = Context::new();
        let source = ctx.create_table(Some("Sources1"), TableKind::NoKey, None).unwrap();
        let price = source.create_column("price", DataType::Int32).unwrap();
        let id = source.add(None).unwrap();
        price.set_value(id, Value::Int32(5)).unwrap();
        source.delete(id).unwrap();
        assert!(price.get_value(id).is_void());
        assert!(source.create_column("price", DataType::Int32).is_err());
    }
}
