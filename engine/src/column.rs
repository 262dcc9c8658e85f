use crate::context::ObjectStatus;
use crate::error::Result;
use crate::lexicon::{IndexColumn, IndexColumnData};
use crate::value::{DataType, Value};
use crate::Id;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Debug)]
struct ColumnData {
    name: String,
    table_name: Option<String>,
    data_type: DataType,
    values: RefCell<BTreeMap<Id, Value>>,
    indexes: RefCell<Vec<Weak<IndexColumnData>>>,
    status: ObjectStatus,
}

/// Handle to a scalar column. Setting a value keeps every index column over it up to date.
#[derive(Debug, Clone)]
pub struct Column(Rc<ColumnData>);

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl Column {
    pub(crate) fn new(name: String, table_name: Option<String>, data_type: DataType) -> Self {
        Column(Rc::new(ColumnData {
            name,
            table_name,
            data_type,
            values: RefCell::new(BTreeMap::new()),
            indexes: RefCell::new(Vec::new()),
            status: ObjectStatus::default(),
        }))
    }

    pub fn name(&self) -> &str { &self.0.name }

    /// `Table.column`, or just the column name for anonymous tables
    pub fn full_name(&self) -> String {
        match &self.0.table_name {
            Some(table) => format!("{table}.{}", self.0.name),
            None => self.0.name.clone(),
        }
    }

    pub fn data_type(&self) -> DataType { self.0.data_type }
    pub fn status(&self) -> &ObjectStatus { &self.0.status }

    /// The stored value, or `Void` when the record has none
    pub fn get_value(&self, id: Id) -> Value { self.0.values.borrow().get(&id).cloned().unwrap_or(Value::Void) }

    /// Store `value` (cast to the column type) for record `id`. `Void` clears it.
    pub fn set_value(&self, id: Id, value: Value) -> Result<()> {
        let value = value.cast(self.0.data_type)?;
        let old = if value.is_void() {
            self.0.values.borrow_mut().remove(&id)
        } else {
            self.0.values.borrow_mut().insert(id, value.clone())
        };
        let old = old.unwrap_or(Value::Void);
        for index in self.indexes() {
            index.update(id, &old, &value)?;
        }
        Ok(())
    }

    /// Ids of records with a non-void value, ascending
    pub fn ids(&self) -> Vec<Id> { self.0.values.borrow().keys().copied().collect() }

    /// Every (id, value) pair, ascending by id
    pub fn entries(&self) -> Vec<(Id, Value)> { self.0.values.borrow().iter().map(|(id, v)| (*id, v.clone())).collect() }

    /// Index columns whose source is this column
    pub fn indexes(&self) -> Vec<IndexColumn> {
        self.0.indexes.borrow().iter().filter_map(|w| w.upgrade().map(IndexColumn::from_data)).collect()
    }

    pub(crate) fn attach_index(&self, index: &IndexColumn) {
        let mut indexes = self.0.indexes.borrow_mut();
        indexes.retain(|w| w.strong_count() > 0);
        indexes.push(index.downgrade());
    }
}
