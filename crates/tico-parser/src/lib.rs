//! Tico parser: converts a token stream into an AST.

mod options;
mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use options::ParseOptions;
pub use parser::Parser;

use tico_types::ast::Ast;
use tico_types::{SourceFile, TicoError};

/// Lex and parse `source` with default options.
pub fn parse(source: &str) -> Result<Ast, TicoError> {
    parse_with(source, &ParseOptions::default())
}

pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Ast, TicoError> {
    let file = SourceFile::new(source);
    Parser::from_source(&file)
        .with_options(options.clone())
        .parse()
}
