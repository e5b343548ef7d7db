//! Shared types for Tico.
//!
//! Source spans, the syntax error type, and the AST produced by the parser
//! and walked by the evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCode, TicoError};
pub use span::{SourceFile, Span, TAB_WIDTH};

/// Result type used by the front end.
pub type Result<T> = std::result::Result<T, TicoError>;
