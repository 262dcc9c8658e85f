use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Identifier(Identifier),
    /// Positional parameter (`$1`, `$2`, ...), bound at execution time
    Param(usize),
    Predicate(Predicate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Identifier {
    Property(String),
    CollectionProperty(String, String),
}

impl Identifier {
    /// The column part of the identifier, without any relation qualifier
    pub fn name(&self) -> &str {
        match self {
            Identifier::Property(name) => name,
            Identifier::CollectionProperty(_, name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison { left: Box<Expr>, operator: ComparisonOperator, right: Box<Expr> },
    IsNull(Box<Expr>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    True,
    False,
}

impl Predicate {
    /// Every identifier referenced anywhere in the predicate, in order of appearance
    pub fn identifiers(&self) -> Vec<&Identifier> {
        let mut found = Vec::new();
        self.collect_identifiers(&mut found);
        found
    }

    fn collect_identifiers<'a>(&'a self, found: &mut Vec<&'a Identifier>) {
        match self {
            Predicate::Comparison { left, right, .. } => {
                for expr in [left.as_ref(), right.as_ref()] {
                    match expr {
                        Expr::Identifier(id) => found.push(id),
                        Expr::Predicate(p) => p.collect_identifiers(found),
                        _ => {}
                    }
                }
            }
            Predicate::IsNull(expr) => match expr.as_ref() {
                Expr::Identifier(id) => found.push(id),
                Expr::Predicate(p) => p.collect_identifiers(found),
                _ => {}
            },
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.collect_identifiers(found);
                right.collect_identifiers(found);
            }
            Predicate::Not(inner) => inner.collect_identifiers(found),
            Predicate::True | Predicate::False => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,              // =
    NotEqual,           // <> or !=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    LessThan,           // <
    LessThanOrEqual,    // <=
    Contains,           // %%  (keyword containment)
    Matches,            // @@  (engine query syntax)
}

impl ComparisonOperator {
    /// The operator to use when the operands are swapped (`5 < a` is `a > 5`).
    /// Containment and query matching are not commutative.
    pub fn commute(&self) -> Option<Self> {
        Some(match self {
            ComparisonOperator::Equal => ComparisonOperator::Equal,
            ComparisonOperator::NotEqual => ComparisonOperator::NotEqual,
            ComparisonOperator::GreaterThan => ComparisonOperator::LessThan,
            ComparisonOperator::GreaterThanOrEqual => ComparisonOperator::LessThanOrEqual,
            ComparisonOperator::LessThan => ComparisonOperator::GreaterThan,
            ComparisonOperator::LessThanOrEqual => ComparisonOperator::GreaterThanOrEqual,
            ComparisonOperator::Contains | ComparisonOperator::Matches => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Contains => "%%",
            ComparisonOperator::Matches => "@@",
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.symbol()) }
}
