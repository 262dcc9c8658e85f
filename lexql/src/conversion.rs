use crate::ast::{self, Predicate};
use crate::error::ParseError;
use crate::parser;
use std::convert::TryFrom;

impl<'a> TryFrom<&'a str> for Predicate {
    type Error = ParseError;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> { parser::parse_selection(value) }
}
impl TryFrom<String> for Predicate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> { parser::parse_selection(&value) }
}

impl TryFrom<ast::Expr> for Predicate {
    type Error = ParseError;

    fn try_from(value: ast::Expr) -> Result<Self, Self::Error> {
        match value {
            ast::Expr::Predicate(p) => Ok(p),
            ast::Expr::Literal(ast::Literal::Boolean(true)) => Ok(Predicate::True),
            ast::Expr::Literal(ast::Literal::Boolean(false)) => Ok(Predicate::False),
            _ => Err(ParseError::InvalidPredicate("Expression is not a predicate".into())),
        }
    }
}

impl From<i64> for ast::Literal {
    fn from(value: i64) -> Self { ast::Literal::Integer(value) }
}
impl From<f64> for ast::Literal {
    fn from(value: f64) -> Self { ast::Literal::Float(value) }
}
impl From<bool> for ast::Literal {
    fn from(value: bool) -> Self { ast::Literal::Boolean(value) }
}
impl From<&str> for ast::Literal {
    fn from(value: &str) -> Self { ast::Literal::String(value.to_string()) }
}
impl From<String> for ast::Literal {
    fn from(value: String) -> Self { ast::Literal::String(value) }
}
impl<T: Into<ast::Literal>> From<Option<T>> for ast::Literal {
    fn from(value: Option<T>) -> Self { value.map(Into::into).unwrap_or(ast::Literal::Null) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_str() {
        let predicate = Predicate::try_from("a = 1").unwrap();
        assert!(matches!(predicate, Predicate::Comparison { .. }));
        assert!(Predicate::try_from(String::from("a =")).is_err());
    }

    #[test]
    fn test_expr_to_predicate() {
        assert_eq!(Predicate::try_from(ast::Expr::Literal(ast::Literal::Boolean(true))).unwrap(), Predicate::True);
        assert!(Predicate::try_from(ast::Expr::Param(1)).is_err());
    }

    #[test]
    fn test_literal_from_option() {
        assert_eq!(ast::Literal::from(None::<i64>), ast::Literal::Null);
        assert_eq!(ast::Literal::from(Some("x")), ast::Literal::String("x".into()));
    }
}
