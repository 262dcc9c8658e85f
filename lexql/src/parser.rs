use crate::ast;
use crate::error::ParseError;
use crate::grammar::{self, LexqlParser, Rule};
use pest::iterators::Pair;
use pest::Parser;

/// Parse a selection expression into a predicate AST.
/// AND binds tighter than OR; both associate to the left.
pub fn parse_selection(input: &str) -> Result<ast::Predicate, ParseError> {
    let mut pairs = LexqlParser::parse(Rule::Selection, input)?;

    // Selection is silent, so the first pair is the top-level OrExpr
    let expr = pairs.next().ok_or(ParseError::EmptyExpression)?;
    if expr.as_rule() != Rule::OrExpr {
        return Err(ParseError::UnexpectedRule { expected: "OrExpr", got: expr.as_rule() });
    }

    parse_or(expr)
}

fn parse_or(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::Or);
    let first = inner.next().ok_or(ParseError::MissingOperand("first"))?;
    let mut result = parse_and(first)?;
    for next in inner {
        result = ast::Predicate::Or(Box::new(result), Box::new(parse_and(next)?));
    }
    Ok(result)
}

fn parse_and(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    if pair.as_rule() != Rule::AndExpr {
        return Err(ParseError::UnexpectedRule { expected: "AndExpr", got: pair.as_rule() });
    }
    let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::And);
    let first = inner.next().ok_or(ParseError::MissingOperand("first"))?;
    let mut result = parse_not(first)?;
    for next in inner {
        result = ast::Predicate::And(Box::new(result), Box::new(parse_not(next)?));
    }
    Ok(result)
}

fn parse_not(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    if pair.as_rule() != Rule::NotExpr {
        return Err(ParseError::UnexpectedRule { expected: "NotExpr", got: pair.as_rule() });
    }
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or(ParseError::EmptyExpression)?;
    match first.as_rule() {
        Rule::Not => {
            let operand = inner.next().ok_or(ParseError::MissingOperand("NOT"))?;
            Ok(ast::Predicate::Not(Box::new(parse_not(operand)?)))
        }
        Rule::OrExpr => parse_or(first),
        Rule::Comparison => parse_comparison(first),
        Rule::IsNull => {
            let operand = first.into_inner().next().ok_or(ParseError::MissingOperand("IS NULL"))?;
            Ok(ast::Predicate::IsNull(Box::new(parse_operand(operand)?)))
        }
        Rule::BoolPredicate => {
            let keyword = first.into_inner().next().ok_or(ParseError::EmptyExpression)?;
            match keyword.as_rule() {
                Rule::TrueKw => Ok(ast::Predicate::True),
                Rule::FalseKw => Ok(ast::Predicate::False),
                got => Err(ParseError::UnexpectedRule { expected: "TRUE or FALSE", got }),
            }
        }
        got => Err(ParseError::UnexpectedRule { expected: "predicate", got }),
    }
}

fn parse_comparison(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    let mut inner = pair.into_inner();
    let left = inner.next().ok_or(ParseError::MissingOperand("left"))?;
    let op = inner.next().ok_or(ParseError::MissingOperand("operator"))?;
    let right = inner.next().ok_or(ParseError::MissingOperand("right"))?;

    let operator = match op.as_rule() {
        Rule::Eq => ast::ComparisonOperator::Equal,
        Rule::NotEq => ast::ComparisonOperator::NotEqual,
        Rule::GtEq => ast::ComparisonOperator::GreaterThanOrEqual,
        Rule::Gt => ast::ComparisonOperator::GreaterThan,
        Rule::LtEq => ast::ComparisonOperator::LessThanOrEqual,
        Rule::Lt => ast::ComparisonOperator::LessThan,
        Rule::Contains => ast::ComparisonOperator::Contains,
        Rule::Matches => ast::ComparisonOperator::Matches,
        got => return Err(ParseError::UnexpectedRule { expected: "comparison operator", got }),
    };

    Ok(ast::Predicate::Comparison { left: Box::new(parse_operand(left)?), operator, right: Box::new(parse_operand(right)?) })
}

fn parse_operand(pair: Pair<grammar::Rule>) -> Result<ast::Expr, ParseError> {
    match pair.as_rule() {
        Rule::Param => {
            let text = pair.as_str();
            let index = text[1..].parse::<usize>().map_err(|e| ParseError::InvalidPredicate(format!("bad parameter {text}: {e}")))?;
            if index == 0 {
                return Err(ParseError::InvalidPredicate("parameters are numbered from $1".into()));
            }
            Ok(ast::Expr::Param(index))
        }
        Rule::Unsigned => {
            let text = pair.as_str();
            let value = text.parse::<i64>().map_err(|e| ParseError::InvalidPredicate(format!("bad integer {text}: {e}")))?;
            Ok(ast::Expr::Literal(ast::Literal::Integer(value)))
        }
        Rule::Float => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|e| ParseError::InvalidPredicate(format!("bad float {text}: {e}")))?;
            Ok(ast::Expr::Literal(ast::Literal::Float(value)))
        }
        Rule::SingleQuotedString => {
            let content = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(ast::Expr::Literal(ast::Literal::String(content.replace("''", "'"))))
        }
        Rule::TrueKw => Ok(ast::Expr::Literal(ast::Literal::Boolean(true))),
        Rule::FalseKw => Ok(ast::Expr::Literal(ast::Literal::Boolean(false))),
        Rule::NullKw => Ok(ast::Expr::Literal(ast::Literal::Null)),
        Rule::IdentifierRef => {
            let mut parts = pair.into_inner();
            let first = parse_identifier(parts.next().ok_or(ParseError::MissingOperand("identifier"))?)?;
            match parts.next() {
                Some(second) => Ok(ast::Expr::Identifier(ast::Identifier::CollectionProperty(first, parse_identifier(second)?))),
                None => Ok(ast::Expr::Identifier(ast::Identifier::Property(first))),
            }
        }
        got => Err(ParseError::UnexpectedRule { expected: "operand", got }),
    }
}

fn parse_identifier(pair: Pair<Rule>) -> Result<String, ParseError> {
    let inner = pair.into_inner().next().ok_or(ParseError::MissingOperand("identifier"))?;
    match inner.as_rule() {
        Rule::BareIdentifier => Ok(inner.as_str().to_string()),
        Rule::QuotedIdentifier => {
            let content = inner.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(content.replace("\"\"", "\""))
        }
        got => Err(ParseError::UnexpectedRule { expected: "identifier", got }),
    }
}
