use crate::grammar;
use thiserror::Error;

/// Custom error type for parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    SyntaxError(String),
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Expected {expected}, got {got:?}")]
    UnexpectedRule { expected: &'static str, got: grammar::Rule },
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Missing {0} operand")]
    MissingOperand(&'static str),
}

impl From<pest::error::Error<grammar::Rule>> for ParseError {
    fn from(error: pest::error::Error<grammar::Rule>) -> Self { ParseError::SyntaxError(error.to_string()) }
}
