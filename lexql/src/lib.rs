pub mod ast;
pub mod conjunct;
pub mod conversion;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod selection;

pub use conjunct::ConjunctFinder;
pub use error::ParseError;
pub use parser::parse_selection;
