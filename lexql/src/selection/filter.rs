//! Filter records based on a predicate. This is the brute-force path: it is used where a set of records
//! has not been pre-filtered by an index search, and to re-check the candidates an index search produced.
//!
//! Evaluation uses SQL three-valued logic. A comparison with a NULL operand is unknown, and a record
//! passes only when the whole predicate is known to be true.

use crate::ast::{ComparisonOperator, Expr, Identifier, Literal, Predicate};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("collection mismatch: expected {expected}, got {actual}")]
    CollectionMismatch { expected: String, actual: String },
    #[error("property not found: {0}")]
    PropertyNotFound(String),
    #[error("parameter ${0} is not bound")]
    UnboundParameter(usize),
    #[error("cannot compare {left} {operator} {right}")]
    TypeMismatch { left: String, operator: ComparisonOperator, right: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub trait Filterable {
    fn collection(&self) -> &str;
    /// `None` when the record has no such property, `Some(Literal::Null)` when it is NULL
    fn value(&self, name: &str) -> Option<Literal>;
    /// Whether `text` satisfies a query in the search engine's own query syntax (`@@`)
    fn matches_query(&self, _text: &str, query: &str) -> Result<bool, Error> {
        Err(Error::Unsupported(format!("query matching is not available for {} ({query})", self.collection())))
    }
}

fn evaluate_expr<R: Filterable>(record: &R, expr: &Expr, params: &[Literal]) -> Result<Literal, Error> {
    match expr {
        Expr::Literal(lit) => Ok(lit.clone()),
        Expr::Param(index) => params.get(index.wrapping_sub(1)).cloned().ok_or(Error::UnboundParameter(*index)),
        Expr::Identifier(id) => {
            if let Identifier::CollectionProperty(collection, _) = id {
                if collection != record.collection() {
                    return Err(Error::CollectionMismatch { expected: collection.clone(), actual: record.collection().to_string() });
                }
            }
            record.value(id.name()).ok_or_else(|| Error::PropertyNotFound(id.name().to_string()))
        }
        Expr::Predicate(_) => Err(Error::Unsupported("nested predicate used as an operand".into())),
    }
}

fn describe(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => format!("'{s}'"),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn compare_literals(left: &Literal, operator: ComparisonOperator, right: &Literal) -> Result<Option<Ordering>, Error> {
    Ok(match (left, right) {
        (Literal::Integer(l), Literal::Integer(r)) => Some(l.cmp(r)),
        (Literal::Integer(l), Literal::Float(r)) => (*l as f64).partial_cmp(r),
        (Literal::Float(l), Literal::Integer(r)) => l.partial_cmp(&(*r as f64)),
        (Literal::Float(l), Literal::Float(r)) => l.partial_cmp(r),
        (Literal::String(l), Literal::String(r)) => Some(l.cmp(r)),
        (Literal::Boolean(l), Literal::Boolean(r)) => Some(l.cmp(r)),
        _ => return Err(Error::TypeMismatch { left: describe(left), operator, right: describe(right) }),
    })
}

fn evaluate_comparison<R: Filterable>(record: &R, left: &Literal, operator: ComparisonOperator, right: &Literal) -> Result<Option<bool>, Error> {
    if matches!(left, Literal::Null) || matches!(right, Literal::Null) {
        return Ok(None);
    }
    match operator {
        ComparisonOperator::Contains | ComparisonOperator::Matches => {
            let (Literal::String(text), Literal::String(keyword)) = (left, right) else {
                return Err(Error::TypeMismatch { left: describe(left), operator, right: describe(right) });
            };
            if operator == ComparisonOperator::Contains {
                Ok(Some(text.to_lowercase().contains(&keyword.to_lowercase())))
            } else {
                record.matches_query(text, keyword).map(Some)
            }
        }
        _ => {
            let Some(ordering) = compare_literals(left, operator, right)? else {
                return Ok(None);
            };
            Ok(Some(match operator {
                ComparisonOperator::Equal => ordering == Ordering::Equal,
                ComparisonOperator::NotEqual => ordering != Ordering::Equal,
                ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
                ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                ComparisonOperator::LessThan => ordering == Ordering::Less,
                ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
                ComparisonOperator::Contains | ComparisonOperator::Matches => unreachable!("handled above"),
            }))
        }
    }
}

/// Evaluate `predicate` against `record` with three-valued logic. `None` is SQL's unknown.
pub fn evaluate_three_valued<R: Filterable>(record: &R, predicate: &Predicate, params: &[Literal]) -> Result<Option<bool>, Error> {
    match predicate {
        Predicate::Comparison { left, operator, right } => {
            let left_val = evaluate_expr(record, left, params)?;
            let right_val = evaluate_expr(record, right, params)?;
            evaluate_comparison(record, &left_val, *operator, &right_val)
        }
        Predicate::And(left, right) => {
            let l = evaluate_three_valued(record, left, params)?;
            if l == Some(false) {
                return Ok(Some(false));
            }
            let r = evaluate_three_valued(record, right, params)?;
            Ok(match (l, r) {
                (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            })
        }
        Predicate::Or(left, right) => {
            let l = evaluate_three_valued(record, left, params)?;
            if l == Some(true) {
                return Ok(Some(true));
            }
            let r = evaluate_three_valued(record, right, params)?;
            Ok(match (l, r) {
                (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            })
        }
        Predicate::Not(pred) => Ok(evaluate_three_valued(record, pred, params)?.map(|b| !b)),
        Predicate::IsNull(expr) => Ok(Some(matches!(evaluate_expr(record, expr, params)?, Literal::Null))),
        Predicate::True => Ok(Some(true)),
        Predicate::False => Ok(Some(false)),
    }
}

/// Whether `record` satisfies `predicate`. Unknown counts as not satisfied.
pub fn evaluate_predicate<R: Filterable>(record: &R, predicate: &Predicate, params: &[Literal]) -> Result<bool, Error> {
    Ok(evaluate_three_valued(record, predicate, params)? == Some(true))
}

#[derive(Debug, PartialEq)]
pub enum FilterResult<R> {
    Pass(R),
    Skip(R),
    Error(R, Error),
}

pub struct FilterIterator<I> {
    iter: I,
    predicate: Predicate,
    params: Vec<Literal>,
}

impl<I, R> FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    pub fn new(iter: I, predicate: Predicate) -> Self { Self { iter, predicate, params: Vec::new() } }

    pub fn with_params(iter: I, predicate: Predicate, params: Vec<Literal>) -> Self { Self { iter, predicate, params } }
}

impl<I, R> Iterator for FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    type Item = FilterResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|record| match evaluate_predicate(&record, &self.predicate, &self.params) {
            Ok(true) => FilterResult::Pass(record),
            Ok(false) => FilterResult::Skip(record),
            Err(e) => FilterResult::Error(record, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_selection;

    #[derive(Debug, Clone, PartialEq)]
    struct TestRecord {
        name: String,
        age: Option<i64>,
        bio: Option<String>,
    }

    impl Filterable for TestRecord {
        fn collection(&self) -> &str { "users" }

        fn value(&self, name: &str) -> Option<Literal> {
            match name {
                "name" => Some(Literal::String(self.name.clone())),
                "age" => Some(self.age.into()),
                "bio" => Some(self.bio.clone().into()),
                _ => None,
            }
        }
    }

    impl TestRecord {
        fn new(name: &str, age: Option<i64>, bio: Option<&str>) -> Self {
            Self { name: name.to_string(), age, bio: bio.map(str::to_string) }
        }
    }

    fn people() -> Vec<TestRecord> {
        vec![
            TestRecord::new("Alice", Some(30), Some("Writes Rust compilers")),
            TestRecord::new("Bob", Some(25), None),
            TestRecord::new("Charlie", None, Some("search engines")),
        ]
    }

    fn passing(selection: &str, params: Vec<Literal>) -> Vec<String> {
        let predicate = parse_selection(selection).unwrap();
        FilterIterator::with_params(people().into_iter(), predicate, params)
            .filter_map(|r| match r {
                FilterResult::Pass(r) => Some(r.name),
                FilterResult::Skip(_) => None,
                FilterResult::Error(_, e) => panic!("unexpected error {e}"),
            })
            .collect()
    }

    #[test]
    fn test_simple_equality() {
        let predicate = parse_selection("name = 'Alice'").unwrap();
        let results: Vec<_> = FilterIterator::new(people().into_iter(), predicate).collect();
        assert_eq!(results, vec![
            FilterResult::Pass(TestRecord::new("Alice", Some(30), Some("Writes Rust compilers"))),
            FilterResult::Skip(TestRecord::new("Bob", Some(25), None)),
            FilterResult::Skip(TestRecord::new("Charlie", None, Some("search engines"))),
        ]);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(passing("age > 26.5", vec![]), vec!["Alice"]);
        assert_eq!(passing("age <= $1", vec![Literal::Float(25.0)]), vec!["Bob"]);
    }

    #[test]
    fn test_null_is_unknown() {
        // Charlie has no age: neither the comparison nor its negation holds
        assert_eq!(passing("age > 0", vec![]), vec!["Alice", "Bob"]);
        assert_eq!(passing("NOT age > 0", vec![]), Vec::<String>::new());
        assert_eq!(passing("age IS NULL", vec![]), vec!["Charlie"]);
        // unknown OR true is true
        assert_eq!(passing("age > 100 OR name = 'Charlie'", vec![]), vec!["Charlie"]);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        assert_eq!(passing("bio %% 'rust'", vec![]), vec!["Alice"]);
        assert_eq!(passing("bio %% 'E'", vec![]), vec!["Alice", "Charlie"]);
    }

    #[test]
    fn test_errors() {
        let record = TestRecord::new("Alice", Some(30), None);
        let mismatch = parse_selection("age = 'thirty'").unwrap();
        assert!(matches!(evaluate_predicate(&record, &mismatch, &[]), Err(Error::TypeMismatch { .. })));
        let missing = parse_selection("height = 3").unwrap();
        assert_eq!(evaluate_predicate(&record, &missing, &[]), Err(Error::PropertyNotFound("height".into())));
        let unbound = parse_selection("age = $2").unwrap();
        assert_eq!(evaluate_predicate(&record, &unbound, &[Literal::Integer(1)]), Err(Error::UnboundParameter(2)));
        let wrong = parse_selection("orders.age = 30").unwrap();
        assert!(matches!(evaluate_predicate(&record, &wrong, &[]), Err(Error::CollectionMismatch { .. })));
        let query = parse_selection("name @@ 'Alice'").unwrap();
        assert!(matches!(evaluate_predicate(&record, &query, &[]), Err(Error::Unsupported(_))));
    }
}
