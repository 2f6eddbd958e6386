//! SQL front end
//!
//! Lexer, token definitions, AST and parser for the minirel command language.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::error::Result;

/// Parse a single command string into a [`Statement`]
pub fn parse(sql: &str) -> Result<Statement> {
    Parser::new(sql)?.parse()
}
