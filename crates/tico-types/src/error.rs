use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric syntax error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    /// A token that starts no production where one was required.
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    /// A specific token (`)`, `}`, `=`, ...) is missing.
    pub const EXPECTED_TOKEN: Self = Self(101);
    /// A production (expression member, statement, identifier) is missing.
    pub const EXPECTED_PRODUCTION: Self = Self(102);
    /// A literal token whose text cannot be converted to a value.
    pub const INVALID_LITERAL: Self = Self(103);
    /// Blocks or expressions nested past the parser's depth limit.
    pub const NESTING_TOO_DEEP: Self = Self(104);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A Tico syntax error.
///
/// `message` is the stable, human-readable part (`Unexpected token [$]`,
/// `Expected ")"`); position and source line are carried alongside so hosts
/// can render their own diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {message}")]
pub struct TicoError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// The source line the error points into.
    pub source_line: String,
}

impl TicoError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }
}
