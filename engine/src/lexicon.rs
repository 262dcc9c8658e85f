use crate::column::Column;
use crate::context::{validate_name, ObjectStatus};
use crate::error::{EngineError, ReturnCode, Result};
use crate::query::Query;
use crate::value::{DataType, Value};
use crate::{Id, ID_NIL};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tokenizer {
    /// Overlapping two-character tokens; the last character of a text is also a token
    Bigram,
    /// Whitespace separated words
    Delimit,
    /// The whole text is one token
    None,
}

impl Tokenizer {
    pub fn tokenize(&self, normalized: &str) -> Vec<String> {
        match self {
            Tokenizer::Bigram => {
                let chars: Vec<char> = normalized.chars().collect();
                (0..chars.len()).map(|i| chars[i..(i + 2).min(chars.len())].iter().collect()).collect()
            }
            Tokenizer::Delimit => normalized.split_whitespace().map(str::to_string).collect(),
            Tokenizer::None if normalized.is_empty() => Vec::new(),
            Tokenizer::None => vec![normalized.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Normalizer {
    /// Case folding
    Auto,
    None,
}

impl Normalizer {
    pub fn normalize(&self, text: &str) -> String {
        match self {
            Normalizer::Auto => text.to_lowercase(),
            Normalizer::None => text.to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct LexiconData {
    name: String,
    tokenizer: Tokenizer,
    normalizer: Normalizer,
    terms: RefCell<BTreeMap<String, Id>>,
    next_id: Cell<Id>,
    index_columns: RefCell<IndexMap<String, IndexColumn>>,
    status: ObjectStatus,
}

/// A term table. Terms are kept sorted, so prefix lookups are range scans.
#[derive(Debug, Clone)]
pub struct Lexicon(Rc<LexiconData>);

impl PartialEq for Lexicon {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl Lexicon {
    pub(crate) fn new(name: String, tokenizer: Tokenizer, normalizer: Normalizer) -> Self {
        Lexicon(Rc::new(LexiconData {
            name,
            tokenizer,
            normalizer,
            terms: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(ID_NIL + 1),
            index_columns: RefCell::new(IndexMap::new()),
            status: ObjectStatus::default(),
        }))
    }

    pub fn name(&self) -> &str { &self.0.name }
    pub fn tokenizer(&self) -> Tokenizer { self.0.tokenizer }
    pub fn normalizer(&self) -> Normalizer { self.0.normalizer }
    pub fn status(&self) -> &ObjectStatus { &self.0.status }
    pub fn size(&self) -> usize { self.0.terms.borrow().len() }

    pub fn term_id(&self, term: &str) -> Option<Id> { self.0.terms.borrow().get(term).copied() }

    pub fn terms_with_prefix(&self, prefix: &str) -> Vec<Id> {
        let terms = self.0.terms.borrow();
        terms.range(prefix.to_string()..).take_while(|(term, _)| term.starts_with(prefix)).map(|(_, id)| *id).collect()
    }

    fn get_or_add_term(&self, term: &str) -> Id {
        if let Some(id) = self.term_id(term) {
            return id;
        }
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);
        self.0.terms.borrow_mut().insert(term.to_string(), id);
        id
    }

    /// Create an index column over `source` and index the values it already holds
    pub fn create_index_column(&self, name: &str, source: &Column) -> Result<IndexColumn> {
        validate_name(name)?;
        if self.0.index_columns.borrow().contains_key(name) {
            return Err(EngineError::invalid_argument(format!("[index][create] already used name: <{}.{name}>", self.name())));
        }
        let index = IndexColumn(Rc::new(IndexColumnData {
            name: name.to_string(),
            lexicon: Rc::downgrade(&self.0),
            source: source.clone(),
            postings: RefCell::new(BTreeMap::new()),
            status: ObjectStatus::default(),
        }));
        for (id, value) in source.entries() {
            index.update(id, &Value::Void, &value)?;
        }
        source.attach_index(&index);
        self.0.index_columns.borrow_mut().insert(name.to_string(), index.clone());
        Ok(index)
    }

    pub fn index_column(&self, name: &str) -> Option<IndexColumn> { self.0.index_columns.borrow().get(name).cloned() }

    pub fn index_columns(&self) -> Vec<IndexColumn> { self.0.index_columns.borrow().values().cloned().collect() }
}

#[derive(Debug)]
pub(crate) struct IndexColumnData {
    name: String,
    lexicon: Weak<LexiconData>,
    source: Column,
    postings: RefCell<BTreeMap<Id, BTreeSet<Id>>>,
    status: ObjectStatus,
}

/// An inverted index: for each lexicon term, the ids of source records containing it
#[derive(Debug, Clone)]
pub struct IndexColumn(Rc<IndexColumnData>);

impl PartialEq for IndexColumn {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

fn index_text(value: &Value) -> Option<String> {
    match value {
        Value::Void => None,
        Value::Text(s) => Some(s.clone()),
        other => other.cast(DataType::Text).ok().and_then(|v| v.as_text().map(str::to_string)),
    }
}

impl IndexColumn {
    pub(crate) fn from_data(data: Rc<IndexColumnData>) -> Self { IndexColumn(data) }
    pub(crate) fn downgrade(&self) -> Weak<IndexColumnData> { Rc::downgrade(&self.0) }

    pub fn name(&self) -> &str { &self.0.name }
    pub fn source(&self) -> &Column { &self.0.source }
    pub fn status(&self) -> &ObjectStatus { &self.0.status }

    pub fn lexicon(&self) -> Result<Lexicon> {
        self.0
            .lexicon
            .upgrade()
            .map(Lexicon)
            .ok_or_else(|| EngineError::new(ReturnCode::ObjectCorrupt, format!("[index][{}] lexicon has been dropped", self.name())))
    }

    pub(crate) fn update(&self, id: Id, old: &Value, new: &Value) -> Result<()> {
        let lexicon = self.lexicon()?;
        let mut postings = self.0.postings.borrow_mut();
        if let Some(text) = index_text(old) {
            for token in lexicon.tokenizer().tokenize(&lexicon.normalizer().normalize(&text)) {
                if let Some(term) = lexicon.term_id(&token) {
                    if let Some(ids) = postings.get_mut(&term) {
                        ids.remove(&id);
                    }
                }
            }
        }
        if let Some(text) = index_text(new) {
            for token in lexicon.tokenizer().tokenize(&lexicon.normalizer().normalize(&text)) {
                let term = lexicon.get_or_add_term(&token);
                postings.entry(term).or_default().insert(id);
            }
        }
        Ok(())
    }

    fn postings(&self, term: Id) -> BTreeSet<Id> { self.0.postings.borrow().get(&term).cloned().unwrap_or_default() }

    /// Number of records posted under `term`
    pub fn estimate_size(&self, term: &str) -> Result<usize> {
        let lexicon = self.lexicon()?;
        Ok(lexicon.term_id(term).map(|t| self.postings(t).len()).unwrap_or(0))
    }

    /// Ids of source records whose normalized text contains the normalized `keyword`
    pub fn match_keyword(&self, keyword: &str) -> Result<BTreeSet<Id>> {
        let lexicon = self.lexicon()?;
        let normalizer = lexicon.normalizer();
        let needle = normalizer.normalize(keyword);
        let contains = |id: &Id| index_text(&self.0.source.get_value(*id)).is_some_and(|text| normalizer.normalize(&text).contains(&needle));

        let chars: Vec<char> = needle.chars().collect();
        let candidates: Vec<Id> = match lexicon.tokenizer() {
            Tokenizer::Bigram if chars.len() == 1 => {
                let mut ids = BTreeSet::new();
                for term in lexicon.terms_with_prefix(&needle) {
                    ids.extend(self.postings(term));
                }
                ids.into_iter().collect()
            }
            Tokenizer::Bigram if chars.len() > 1 => {
                let mut result: Option<BTreeSet<Id>> = None;
                for pair in chars.windows(2) {
                    let token: String = pair.iter().collect();
                    let ids = lexicon.term_id(&token).map(|t| self.postings(t)).unwrap_or_default();
                    result = Some(match result {
                        Some(acc) => acc.intersection(&ids).copied().collect(),
                        None => ids,
                    });
                    if result.as_ref().is_some_and(BTreeSet::is_empty) {
                        break;
                    }
                }
                result.unwrap_or_default().into_iter().collect()
            }
            // empty keyword, or a tokenizer that cannot answer substring queries from postings
            _ => self.0.source.ids(),
        };
        let matched: BTreeSet<Id> = candidates.into_iter().filter(contains).collect();
        trace!("[index][{}] match {keyword:?}: {} records", self.name(), matched.len());
        Ok(matched)
    }

    /// Ids of source records matching a query in the engine query syntax
    pub fn search_query(&self, query: &Query) -> Result<BTreeSet<Id>> {
        let universe: BTreeSet<Id> = self.0.source.ids().into_iter().collect();
        query.select(&universe, |term| self.match_keyword(term))
    }
}
