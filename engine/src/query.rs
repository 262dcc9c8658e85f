//! The engine's own query syntax, used by the `@@` operator.
//!
//! Words separated by whitespace must all occur (`rust engine`), `OR` between groups makes either
//! side enough, a leading `-` excludes a word, `"..."` quotes a phrase and parentheses group.
//! Every word or phrase is a substring test on normalized text.

use crate::error::{EngineError, ReturnCode, Result};
use crate::lexicon::Normalizer;
use crate::Id;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::BTreeSet;

#[derive(Parser)]
#[grammar = "query.pest"]
struct QueryParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term(String),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    root: Option<QueryNode>,
}

fn syntax_error(query: &str, detail: impl std::fmt::Display) -> EngineError {
    EngineError::new(ReturnCode::SyntaxError, format!("[query][parse] <{query}>: {detail}"))
}

impl Query {
    pub fn parse(text: &str) -> Result<Query> {
        let mut pairs = QueryParser::parse(Rule::Query, text).map_err(|e| syntax_error(text, e))?;
        let root = match pairs.next() {
            Some(pair) if pair.as_rule() == Rule::OrGroup => Some(Self::parse_or(text, pair)?),
            _ => None,
        };
        Ok(Query { text: text.to_string(), root })
    }

    fn parse_or(text: &str, pair: Pair<Rule>) -> Result<QueryNode> {
        let mut groups =
            pair.into_inner().filter(|p| p.as_rule() == Rule::AndGroup).map(|p| Self::parse_and(text, p)).collect::<Result<Vec<_>>>()?;
        Ok(if groups.len() == 1 { groups.remove(0) } else { QueryNode::Or(groups) })
    }

    fn parse_and(text: &str, pair: Pair<Rule>) -> Result<QueryNode> {
        let mut units = pair.into_inner().map(|p| Self::parse_unary(text, p)).collect::<Result<Vec<_>>>()?;
        Ok(if units.len() == 1 { units.remove(0) } else { QueryNode::And(units) })
    }

    fn parse_unary(text: &str, pair: Pair<Rule>) -> Result<QueryNode> {
        let mut exclude = false;
        let mut node = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::Exclude => exclude = true,
                Rule::OrGroup => node = Some(Self::parse_or(text, inner)?),
                Rule::Word => node = Some(QueryNode::Term(inner.as_str().to_string())),
                Rule::Phrase => {
                    let content = inner.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                    node = Some(QueryNode::Term(content.replace("\\\"", "\"")));
                }
                other => return Err(syntax_error(text, format!("unexpected {other:?}"))),
            }
        }
        let node = node.ok_or_else(|| syntax_error(text, "missing term"))?;
        Ok(if exclude { QueryNode::Not(Box::new(node)) } else { node })
    }

    pub fn text(&self) -> &str { &self.text }
    pub fn root(&self) -> Option<&QueryNode> { self.root.as_ref() }

    /// Whether `text` satisfies the query. An empty query matches nothing.
    pub fn matches(&self, text: &str, normalizer: Normalizer) -> bool {
        let normalized = normalizer.normalize(text);
        self.root.as_ref().is_some_and(|root| Self::matches_node(root, &normalized, normalizer))
    }

    fn matches_node(node: &QueryNode, text: &str, normalizer: Normalizer) -> bool {
        match node {
            QueryNode::Term(term) => text.contains(&normalizer.normalize(term)),
            QueryNode::And(nodes) => nodes.iter().all(|n| Self::matches_node(n, text, normalizer)),
            QueryNode::Or(nodes) => nodes.iter().any(|n| Self::matches_node(n, text, normalizer)),
            QueryNode::Not(inner) => !Self::matches_node(inner, text, normalizer),
        }
    }

    /// Evaluate the query as set operations over `universe`, resolving each term with `term`
    pub fn select<F>(&self, universe: &BTreeSet<Id>, term: F) -> Result<BTreeSet<Id>>
    where F: Fn(&str) -> Result<BTreeSet<Id>> {
        match &self.root {
            Some(root) => Self::select_node(root, universe, &term),
            None => Ok(BTreeSet::new()),
        }
    }

    fn select_node<F>(node: &QueryNode, universe: &BTreeSet<Id>, term: &F) -> Result<BTreeSet<Id>>
    where F: Fn(&str) -> Result<BTreeSet<Id>> {
        Ok(match node {
            QueryNode::Term(text) => term(text)?.intersection(universe).copied().collect(),
            QueryNode::And(nodes) => {
                let mut acc = universe.clone();
                for n in nodes {
                    if acc.is_empty() {
                        break;
                    }
                    let ids = Self::select_node(n, universe, term)?;
                    acc = acc.intersection(&ids).copied().collect();
                }
                acc
            }
            QueryNode::Or(nodes) => {
                let mut acc = BTreeSet::new();
                for n in nodes {
                    acc.extend(Self::select_node(n, universe, term)?);
                }
                acc
            }
            QueryNode::Not(inner) => universe.difference(&Self::select_node(inner, universe, term)?).copied().collect(),
        })
    }
}
