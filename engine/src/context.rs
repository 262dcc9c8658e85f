use crate::error::{EngineError, Result};
use crate::lexicon::{Lexicon, Normalizer, Tokenizer};
use crate::table::{Table, TableKind};
use crate::value::DataType;
use crate::TABLE_MAX_KEY_SIZE;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Lock and corruption flags every persistent object carries
#[derive(Debug, Default)]
pub struct ObjectStatus {
    locked: Cell<bool>,
    corrupt: Cell<bool>,
}

impl ObjectStatus {
    pub fn is_locked(&self) -> bool { self.locked.get() }
    pub fn is_corrupt(&self) -> bool { self.corrupt.get() }
    pub fn lock(&self) { self.locked.set(true) }
    pub fn unlock(&self) { self.locked.set(false) }
    pub fn mark_corrupt(&self) { self.corrupt.set(true) }
    pub fn is_broken(&self) -> bool { self.is_locked() || self.is_corrupt() }
}

/// A named object registered in a context
#[derive(Debug, Clone)]
pub enum Object {
    Table(Table),
    Lexicon(Lexicon),
}

impl Object {
    pub fn name(&self) -> Option<&str> {
        match self {
            Object::Table(table) => table.name(),
            Object::Lexicon(lexicon) => Some(lexicon.name()),
        }
    }

    pub fn status(&self) -> &ObjectStatus {
        match self {
            Object::Table(table) => table.status(),
            Object::Lexicon(lexicon) => lexicon.status(),
        }
    }
}

/// Validate an object or column name: `[0-9A-Za-z_@#-]`, not starting with `_`, shorter than the key limit
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::invalid_argument("[object][name] name is empty"));
    }
    if name.len() >= TABLE_MAX_KEY_SIZE {
        return Err(EngineError::invalid_argument(format!("[object][name] name is too long: {} bytes", name.len())));
    }
    if name.starts_with('_') {
        return Err(EngineError::invalid_argument(format!("[object][name] name must not start with '_': <{name}>")));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '#' | '-'))) {
        return Err(EngineError::invalid_argument(format!("[object][name] invalid character {c:?} in <{name}>")));
    }
    Ok(())
}

/// The process-wide engine handle. Not reentrant; one per thread.
#[derive(Debug, Default)]
pub struct Context {
    objects: RefCell<IndexMap<String, Object>>,
}

impl Context {
    pub fn new() -> Self { Self::default() }

    /// Create a table. Named tables are registered and can be looked up later; anonymous ones live as
    /// long as their handle.
    pub fn create_table(&self, name: Option<&str>, kind: TableKind, key_type: Option<DataType>) -> Result<Table> {
        if kind == TableKind::Result {
            return Err(EngineError::invalid_argument("[table][create] result tables are created with create_result_table"));
        }
        if kind == TableKind::NoKey && key_type.is_some() {
            return Err(EngineError::invalid_argument("[table][create] a table without keys cannot have a key type"));
        }
        if let Some(name) = name {
            validate_name(name)?;
            if self.objects.borrow().contains_key(name) {
                return Err(EngineError::invalid_argument(format!("[table][create] already used name: <{name}>")));
            }
        }
        let table = Table::new(name.map(str::to_string), kind, key_type, None);
        if let Some(name) = name {
            debug!("created table {name} ({kind:?})");
            self.objects.borrow_mut().insert(name.to_string(), Object::Table(table.clone()));
        }
        Ok(table)
    }

    /// An anonymous hash table whose records are ids of `source`. Its columns are the source's columns.
    pub fn create_result_table(&self, source: &Table) -> Result<Table> {
        if source.kind() == TableKind::Result {
            return Err(EngineError::invalid_argument("[table][create] cannot create a result table over a result table"));
        }
        Ok(Table::new(None, TableKind::Result, None, Some(source.clone())))
    }

    pub fn create_lexicon(&self, name: &str, tokenizer: Tokenizer, normalizer: Normalizer) -> Result<Lexicon> {
        validate_name(name)?;
        if self.objects.borrow().contains_key(name) {
            return Err(EngineError::invalid_argument(format!("[lexicon][create] already used name: <{name}>")));
        }
        let lexicon = Lexicon::new(name.to_string(), tokenizer, normalizer);
        debug!("created lexicon {name} ({tokenizer:?}, {normalizer:?})");
        self.objects.borrow_mut().insert(name.to_string(), Object::Lexicon(lexicon.clone()));
        Ok(lexicon)
    }

    pub fn get(&self, name: &str) -> Option<Object> { self.objects.borrow().get(name).cloned() }

    pub fn table(&self, name: &str) -> Option<Table> {
        match self.get(name)? {
            Object::Table(table) => Some(table),
            Object::Lexicon(_) => None,
        }
    }

    pub fn lexicon(&self, name: &str) -> Option<Lexicon> {
        match self.get(name)? {
            Object::Lexicon(lexicon) => Some(lexicon),
            Object::Table(_) => None,
        }
    }

    /// All registered objects in creation order
    pub fn objects(&self) -> Vec<Object> { self.objects.borrow().values().cloned().collect() }

    pub fn remove(&self, name: &str) -> Result<()> {
        match self.objects.borrow_mut().shift_remove(name) {
            Some(_) => {
                debug!("removed {name}");
                Ok(())
            }
            None => Err(EngineError::not_found(format!("[object][remove] no such object: <{name}>"))),
        }
    }
}
