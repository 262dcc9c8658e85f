use crate::column::Column;
use crate::error::{EngineError, Result};
use crate::expr::{Condition, Expr, Operator, SetOperation, Target};
use crate::lexicon::Normalizer;
use crate::query::Query;
use crate::table::Table;
use crate::value::{DataType, Value};
use crate::Id;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Evaluates an expression over a table and adds the matching records to a result table
pub struct TableSelector<'a> {
    table: &'a Table,
    expr: &'a Expr,
    op: SetOperation,
}

impl<'a> TableSelector<'a> {
    pub fn open(table: &'a Table, expr: &'a Expr, op: SetOperation) -> Result<Self> {
        if expr.table() != table {
            return Err(EngineError::invalid_argument("[table-selector][open] expression is bound to another table"));
        }
        Ok(Self { table, expr, op })
    }

    /// Combine the expression's clauses with the set operation and add the records found to `result`,
    /// which must be a result table over the selector's table.
    pub fn select(&self, result: &Table) -> Result<()> {
        if result.source() != Some(self.table) {
            return Err(EngineError::invalid_argument("[table-selector][select] result table is not over the selected table"));
        }
        let matched = self.evaluate()?;
        for id in &matched {
            result.add_id(*id)?;
        }
        debug!("[table-selector] {} clauses ({:?}) selected {} of {} records", self.expr.clauses().len(), self.op, matched.len(), self.table.size());
        Ok(())
    }

    /// Ids matching the expression, ascending
    pub fn evaluate(&self) -> Result<BTreeSet<Id>> {
        let universe: BTreeSet<Id> = self.table.ids().into_iter().collect();
        let mut clauses = self.expr.clauses().iter();
        let Some(first) = clauses.next() else {
            return Ok(BTreeSet::new());
        };
        let mut acc = evaluate_condition(first, &universe)?;
        for clause in clauses {
            let ids = evaluate_condition(clause, &universe)?;
            acc = match self.op {
                SetOperation::Or => acc.union(&ids).copied().collect(),
                SetOperation::And => acc.intersection(&ids).copied().collect(),
                SetOperation::AndNot => acc.difference(&ids).copied().collect(),
            };
        }
        Ok(acc)
    }
}

fn keyword(value: &Value) -> Result<String> {
    match value.cast(DataType::LongText)? {
        Value::Text(text) => Ok(text),
        other => Err(EngineError::invalid_argument(format!("[table-selector] not a keyword: {other:?}"))),
    }
}

fn compare(operator: Operator, stored: &Value, operand: &Value) -> bool {
    let Some(ordering) = stored.compare(operand) else {
        return false;
    };
    match operator {
        Operator::Less => ordering == Ordering::Less,
        Operator::LessEqual => ordering != Ordering::Greater,
        Operator::Equal => ordering == Ordering::Equal,
        Operator::GreaterEqual => ordering != Ordering::Less,
        Operator::Greater => ordering == Ordering::Greater,
        Operator::NotEqual => ordering != Ordering::Equal,
        Operator::Match | Operator::Query => false,
    }
}

/// Sequential evaluation of a leaf against a scalar column
fn scan_column(column: &Column, operator: Operator, operand: &Value, universe: &BTreeSet<Id>) -> Result<BTreeSet<Id>> {
    let entries = column.entries().into_iter().filter(|(id, _)| universe.contains(id));
    let text_of = |value: &Value| value.cast(DataType::LongText).ok().and_then(|v| v.as_text().map(str::to_string));
    Ok(match operator {
        Operator::Match => {
            let needle = Normalizer::Auto.normalize(&keyword(operand)?);
            entries.filter(|(_, v)| text_of(v).is_some_and(|t| Normalizer::Auto.normalize(&t).contains(&needle))).map(|(id, _)| id).collect()
        }
        Operator::Query => {
            let query = Query::parse(&keyword(operand)?)?;
            entries.filter(|(_, v)| text_of(v).is_some_and(|t| query.matches(&t, Normalizer::Auto))).map(|(id, _)| id).collect()
        }
        _ => entries.filter(|(_, v)| compare(operator, v, operand)).map(|(id, _)| id).collect(),
    })
}

fn evaluate_condition(condition: &Condition, universe: &BTreeSet<Id>) -> Result<BTreeSet<Id>> {
    match condition {
        Condition::Leaf { value, .. } if value.is_void() => Ok(BTreeSet::new()),
        Condition::Leaf { target, operator, value } => {
            let ids = match (target, operator) {
                (Target::Index(index), Operator::Match) => index.match_keyword(&keyword(value)?)?.intersection(universe).copied().collect(),
                (Target::Index(index), Operator::Query) => {
                    let query = Query::parse(&keyword(value)?)?;
                    index.search_query(&query)?.intersection(universe).copied().collect()
                }
                (Target::Index(index), _) => scan_column(index.source(), *operator, value, universe)?,
                (Target::Column(column), _) => scan_column(column, *operator, value, universe)?,
            };
            trace!("[table-selector] {} {operator:?} {value:?}: {} records", target.name(), ids.len());
            Ok(ids)
        }
        Condition::And(children) => {
            let mut acc = universe.clone();
            for child in children {
                if acc.is_empty() {
                    break;
                }
                let ids = evaluate_condition(child, universe)?;
                acc = acc.intersection(&ids).copied().collect();
            }
            Ok(acc)
        }
        Condition::Or(children) => {
            let mut acc = BTreeSet::new();
            for child in children {
                acc.extend(evaluate_condition(child, universe)?);
            }
            Ok(acc)
        }
    }
}
