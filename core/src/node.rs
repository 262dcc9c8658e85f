//! The host side of a custom scan: the executor state the scan is driven with and the plan node that
//! wraps a provider's exec methods, rechecks its rows against the plan's clauses and projects them.

use crate::catalog::{Catalog, Relation};
use crate::config::ScanConfig;
use crate::datum::{Datum, TypeId};
use crate::error::{ScanError, ScanResult};
use crate::materialize::Row;
use crate::path::{CustomScanPlan, Hooks};
use crate::search::ParamList;
use lexql::ast::{Expr, Literal, Predicate};
use lexql::selection::filter::evaluate_predicate;
use lexscan_engine::Context;
use tracing::trace;

/// Everything a running scan reads from its surroundings
pub struct EState<'a> {
    pub catalog: &'a dyn Catalog,
    pub ctx: &'a Context,
    pub config: &'a ScanConfig,
    pub params: ParamList,
}

impl<'a> EState<'a> {
    pub fn new(catalog: &'a dyn Catalog, ctx: &'a Context, config: &'a ScanConfig) -> Self {
        Self { catalog, ctx, config, params: ParamList::default() }
    }

    pub fn with_params(mut self, params: impl Into<ParamList>) -> Self {
        self.params = params.into();
        self
    }
}

#[derive(Debug, Default)]
pub struct ExplainState {
    pub properties: Vec<(String, String)>,
}

impl ExplainState {
    pub fn property(&mut self, label: &str, value: &str) { self.properties.push((label.to_string(), value.to_string())) }
}

pub trait CustomExecMethods {
    fn begin(&mut self, estate: &EState) -> ScanResult<()>;
    fn exec(&mut self) -> ScanResult<Option<Row>>;
    fn end(&mut self);
    fn rescan(&mut self, estate: &EState) -> ScanResult<()>;
    fn explain(&self, es: &mut ExplainState);
    fn is_filtered(&self) -> bool { false }
}

/// Substitute the parameters of `predicate` and read every constant compared with a column of
/// `relation` as a value of that column's type, the way the rows of the scan present it.
pub fn bind_predicate(relation: &Relation, predicate: &Predicate, params: &ParamList) -> ScanResult<Predicate> {
    Ok(match predicate {
        Predicate::Comparison { left, operator, right } => {
            let column_type = |expr: &Expr| match expr {
                Expr::Identifier(id) => relation.attribute(id.name()).map(|(_, attribute)| attribute.type_id),
                _ => None,
            };
            let left_type = column_type(right);
            let right_type = column_type(left);
            Predicate::Comparison {
                left: Box::new(bind_operand(left, left_type, params)?),
                operator: *operator,
                right: Box::new(bind_operand(right, right_type, params)?),
            }
        }
        Predicate::IsNull(expr) => Predicate::IsNull(Box::new(bind_operand(expr, None, params)?)),
        Predicate::And(left, right) => {
            Predicate::And(Box::new(bind_predicate(relation, left, params)?), Box::new(bind_predicate(relation, right, params)?))
        }
        Predicate::Or(left, right) => {
            Predicate::Or(Box::new(bind_predicate(relation, left, params)?), Box::new(bind_predicate(relation, right, params)?))
        }
        Predicate::Not(inner) => Predicate::Not(Box::new(bind_predicate(relation, inner, params)?)),
        Predicate::True => Predicate::True,
        Predicate::False => Predicate::False,
    })
}

fn bind_operand(expr: &Expr, column_type: Option<TypeId>, params: &ParamList) -> ScanResult<Expr> {
    let literal = match expr {
        Expr::Literal(literal) => literal.clone(),
        Expr::Param(number) => {
            params.get(*number).cloned().ok_or_else(|| ScanError::InvalidArgument(format!("[recheck] parameter ${number} is not bound")))?
        }
        Expr::Identifier(_) | Expr::Predicate(_) => return Ok(expr.clone()),
    };
    let Some(ty) = column_type else {
        return Ok(Expr::Literal(literal));
    };
    let literal = match &literal {
        Literal::String(text) => Datum::parse(text, ty)?.to_literal(),
        other => Datum::resolve(other, ty)?.map_or(literal.clone(), |datum| datum.to_literal()),
    };
    Ok(Expr::Literal(literal))
}

/// A custom scan plan node as the host executor runs it
pub struct ScanNode {
    plan: CustomScanPlan,
    state: Box<dyn CustomExecMethods>,
    recheck: Vec<Predicate>,
}

impl ScanNode {
    /// Instantiate `plan` through the scan methods registered under its name
    pub fn new(hooks: &Hooks, plan: CustomScanPlan) -> ScanResult<Self> {
        let methods = hooks
            .custom_scan_methods(&plan.methods)
            .ok_or_else(|| ScanError::NotFound(format!("[scan-node] no custom scan methods named {}", plan.methods)))?;
        let state = methods.create_custom_scan_state(&plan);
        Ok(Self { plan, state, recheck: Vec::new() })
    }

    pub fn plan(&self) -> &CustomScanPlan { &self.plan }

    fn bind(&mut self, estate: &EState) -> ScanResult<()> {
        let relid = self.plan.relid;
        let relation = estate.catalog.relation(relid).ok_or_else(|| ScanError::NotFound(format!("[scan-node] relation {relid}")))?;
        self.recheck = self.plan.qual.iter().map(|p| bind_predicate(relation, p, &estate.params)).collect::<ScanResult<_>>()?;
        Ok(())
    }

    pub fn begin(&mut self, estate: &EState) -> ScanResult<()> {
        self.bind(estate)?;
        self.state.begin(estate)
    }

    /// Next row satisfying every clause of the plan, projected onto the target list
    pub fn next(&mut self) -> ScanResult<Option<Row>> {
        while let Some(row) = self.state.exec()? {
            if self.passes(&row)? {
                return Ok(Some(row.project(&self.plan.targetlist)));
            }
            trace!("[scan-node] record {} failed the recheck", row.id);
        }
        Ok(None)
    }

    fn passes(&self, row: &Row) -> ScanResult<bool> {
        for predicate in &self.recheck {
            if !evaluate_predicate(row, predicate, &[])? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn rescan(&mut self, estate: &EState) -> ScanResult<()> {
        self.bind(estate)?;
        self.state.rescan(estate)
    }

    pub fn end(&mut self) { self.state.end() }

    pub fn is_filtered(&self) -> bool { self.state.is_filtered() }

    pub fn explain(&self) -> String {
        let mut es = ExplainState::default();
        self.state.explain(&mut es);
        es.properties.iter().map(|(label, value)| format!("{label}: {value}")).collect::<Vec<_>>().join("\n")
    }

    /// Run the scan from the start and collect every row
    pub fn collect(&mut self, estate: &EState) -> ScanResult<Vec<Row>> {
        self.begin(estate)?;
        let mut rows = Vec::new();
        while let Some(row) = self.next()? {
            rows.push(row);
        }
        self.end();
        Ok(rows)
    }
}
