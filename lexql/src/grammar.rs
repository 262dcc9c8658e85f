use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "lexql.pest"]
pub struct LexqlParser;
