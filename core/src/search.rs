//! Turns the restriction clauses of a scan into a search expression over the index's sources table.
//!
//! Every clause compiles to a condition or is skipped. Skipping is always safe: the clauses the host
//! hands the scan are rechecked against each row it returns, so the expression only has to select a
//! superset of the matching records. Compiled clauses are merged with OR.

use crate::catalog::{Catalog, IndexRelation, Relation, Strategy};
use crate::config::DatabaseEncoding;
use crate::convert::to_engine_value;
use crate::datum::Datum;
use crate::error::{ErrorLevel, ScanError, ScanResult};
use crate::lookup::{lookup_column, lookup_index_column};
use lexql::ast::{ComparisonOperator, Expr as Operand, Identifier, Literal, Predicate};
use lexql::ConjunctFinder;
use lexscan_engine::{Condition, Context, Expr, IndexColumn, Normalizer, Operator, Table, Target};
use tracing::{debug, trace};

/// Values of the `$n` placeholders of a scan, bound at begin and on every rescan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList(Vec<Literal>);

impl ParamList {
    pub fn new(values: Vec<Literal>) -> Self { Self(values) }

    /// Value of `$number`; placeholders count from 1
    pub fn get(&self, number: usize) -> Option<&Literal> { number.checked_sub(1).and_then(|i| self.0.get(i)) }

    pub fn as_slice(&self) -> &[Literal] { &self.0 }
}

impl From<Vec<Literal>> for ParamList {
    fn from(values: Vec<Literal>) -> Self { Self(values) }
}

#[derive(Debug, Clone)]
pub struct SearchData {
    pub expression: Expr,
    /// No clause compiled; the scan reads every source record
    pub is_empty_condition: bool,
}

fn engine_operator(strategy: Strategy) -> Operator {
    match strategy {
        Strategy::Less => Operator::Less,
        Strategy::LessEqual => Operator::LessEqual,
        Strategy::Equal => Operator::Equal,
        Strategy::GreaterEqual => Operator::GreaterEqual,
        Strategy::Greater => Operator::Greater,
        Strategy::NotEqual => Operator::NotEqual,
        Strategy::Contain => Operator::Match,
        Strategy::Query => Operator::Query,
    }
}

pub struct ConditionCompiler<'a> {
    ctx: &'a Context,
    catalog: &'a dyn Catalog,
    relation: &'a Relation,
    index: &'a IndexRelation,
    sources: &'a Table,
    encoding: DatabaseEncoding,
    params: &'a ParamList,
}

impl<'a> ConditionCompiler<'a> {
    pub fn new(
        ctx: &'a Context,
        catalog: &'a dyn Catalog,
        relation: &'a Relation,
        index: &'a IndexRelation,
        sources: &'a Table,
        encoding: DatabaseEncoding,
        params: &'a ParamList,
    ) -> Self {
        Self { ctx, catalog, relation, index, sources, encoding, params }
    }

    pub fn compile(&self, predicates: &[Predicate]) -> ScanResult<SearchData> {
        let mut expression = Expr::new(self.sources);
        for predicate in predicates {
            match self.compile_predicate(predicate)? {
                Some(condition) => expression.append(condition),
                None => trace!("[search] {}: skipped {predicate:?}", self.index.name),
            }
        }
        let is_empty_condition = expression.is_empty();
        debug!(
            "[search] {}: {} of {} clauses compiled ({} leaves)",
            self.index.name,
            expression.clauses().len(),
            predicates.len(),
            expression.clauses().iter().map(Condition::leaf_count).sum::<usize>()
        );
        Ok(SearchData { expression, is_empty_condition })
    }

    fn compile_predicate(&self, predicate: &Predicate) -> ScanResult<Option<Condition>> {
        match predicate {
            Predicate::Comparison { left, operator, right } => self.compile_comparison(left, *operator, right),
            // any subset of the conjuncts still selects a superset of the rows
            Predicate::And(..) => {
                let mut children = Vec::new();
                for conjunct in ConjunctFinder::find(predicate) {
                    if let Some(condition) = self.compile_predicate(&conjunct)? {
                        children.push(condition);
                    }
                }
                Ok(match children.len() {
                    0 => None,
                    1 => children.pop(),
                    _ => Some(Condition::And(children)),
                })
            }
            Predicate::Or(..) => {
                let mut children = Vec::new();
                for disjunct in ConjunctFinder::disjuncts(predicate) {
                    match self.compile_predicate(&disjunct)? {
                        Some(condition) => children.push(condition),
                        None => return Ok(None),
                    }
                }
                Ok(Some(Condition::Or(children)))
            }
            Predicate::Not(_) | Predicate::IsNull(_) | Predicate::True | Predicate::False => Ok(None),
        }
    }

    fn operand_literal(&self, operand: &Operand) -> ScanResult<Option<Literal>> {
        match operand {
            Operand::Literal(literal) => Ok(Some(literal.clone())),
            Operand::Param(number) => {
                let literal = self.params.get(*number).cloned();
                literal.map(Some).ok_or_else(|| ScanError::InvalidArgument(format!("[search] parameter ${number} is not bound")))
            }
            Operand::Identifier(_) | Operand::Predicate(_) => Ok(None),
        }
    }

    /// Index column of the lexicon over key `key`, used for full text search when the lexicon folds
    /// case the way the recheck does. Otherwise the condition scans the source column.
    fn full_text_index(&self, key: usize) -> ScanResult<Option<IndexColumn>> {
        let Some(index_column) = lookup_index_column(self.ctx, self.index, key, ErrorLevel::Silent)? else {
            return Ok(None);
        };
        let lexicon = index_column.lexicon()?;
        if lexicon.normalizer() != Normalizer::Auto {
            trace!("[search] {}: {} does not fold case, scanning instead", self.index.name, lexicon.name());
            return Ok(None);
        }
        Ok(Some(index_column))
    }

    fn compile_comparison(&self, left: &Operand, operator: ComparisonOperator, right: &Operand) -> ScanResult<Option<Condition>> {
        let (identifier, operator, operand) = match (left, right) {
            (Operand::Identifier(_), Operand::Identifier(_)) => return Ok(None),
            (Operand::Identifier(identifier), operand) => (identifier, operator, operand),
            (operand, Operand::Identifier(identifier)) => match operator.commute() {
                Some(commuted) => (identifier, commuted, operand),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        let Some(literal) = self.operand_literal(operand)? else {
            return Ok(None);
        };
        if let Identifier::CollectionProperty(relation, _) = identifier {
            if *relation != self.relation.name {
                return Ok(None);
            }
        }
        let Some((attribute, definition)) = self.relation.attribute(identifier.name()) else {
            return Ok(None);
        };
        let Some(key) = self.index.key_position(attribute) else {
            trace!("[search] {}: {} is not indexed", self.index.name, definition.name);
            return Ok(None);
        };
        let Some(datum) = Datum::resolve(&literal, definition.type_id)? else {
            return Ok(None);
        };
        let Some(opfamily) = self.index.opfamilies.get(key) else {
            return Ok(None);
        };
        let Some(strategy) = self.catalog.op_strategy(*opfamily, operator, definition.type_id, definition.type_id) else {
            trace!("[search] {}: {operator} is not in the operator family of {}", self.index.name, definition.name);
            return Ok(None);
        };

        let Some(column) = lookup_column(self.sources, &definition.name, self.encoding, ErrorLevel::Error)? else {
            return Ok(None);
        };
        let index_column = match strategy {
            Strategy::Contain | Strategy::Query => self.full_text_index(key)?,
            _ => None,
        };
        let target = match index_column {
            Some(index_column) => Target::Index(index_column),
            None => Target::Column(column.clone()),
        };
        let value = to_engine_value(&datum)
            .cast(column.data_type())
            .map_err(|e| ScanError::InvalidArgument(format!("[search] {}: {}", definition.name, e.message)))?;

        trace!("[search] {}: {} {:?} {value:?}", self.index.name, target.name(), strategy);
        Ok(Some(Condition::leaf(target, engine_operator(strategy), value)))
    }
}
