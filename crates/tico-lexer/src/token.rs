//! Token types for the Tico lexer.
//!
//! Defines [`TokenKind`], the pattern registry that drives the lexer, and
//! [`Token`], which pairs a kind with its text, sub-matches and position.

use std::fmt;
use tico_types::Span;

/// Every reserved word. These never lex as identifiers.
pub const ALL_KEYWORDS: &[&str] = &[
    "function", "return", "if", "elif", "else", "while", "for", "break", "static",
];

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Token categories. The concrete lexeme is in [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    Whitespace,
    Keyword,
    String,
    BigInt,
    Number,
    Boolean,
    Null,
    Undefined,
    /// `* / % ** // %% + -`
    BinaryOperator,
    /// `== != >= <= > < && ||`
    Comparison,
    /// `( ) { } , ; = !`
    Symbol,
    Identifier,
    /// Text no pattern accepted.
    Invalid,
    Eof,
}

impl TokenKind {
    /// Kinds the lexer consumes without emitting.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Whitespace)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::BigInt
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::Undefined
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Keyword => "keyword",
            TokenKind::String => "string",
            TokenKind::BigInt => "bigint",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Undefined => "undefined",
            TokenKind::BinaryOperator => "binary operator",
            TokenKind::Comparison => "comparison operator",
            TokenKind::Symbol => "symbol",
            TokenKind::Identifier => "identifier",
            TokenKind::Invalid => "invalid",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Pattern registry
// ─────────────────────────────────────────────────────────────────────

/// Kinds in registration order with their alternative patterns.
///
/// Order is significant twice over: the first kind whose alternation matches
/// at the cursor wins, and inside a kind the first alternative wins. Capture
/// groups inside a pattern become [`Token::captures`].
pub(crate) const REGISTRY: &[(TokenKind, &[&str])] = &[
    (TokenKind::Comment, &[r"#\*(?s:.*?)\*#", r"#[^\n]*"]),
    (TokenKind::Whitespace, &[r"\s+"]),
    (
        TokenKind::Keyword,
        &[r"(?:function|return|if|elif|else|while|for|break|static)\b"],
    ),
    (
        TokenKind::String,
        &[
            r#""""((?s:.*?))""""#,
            r"'''((?s:.*?))'''",
            r#""((?:[^"\\\n]|\\.)*)""#,
            r"'((?:[^'\\\n]|\\.)*)'",
            r"`([^`]*)`",
        ],
    ),
    (TokenKind::BigInt, &[r"([0-9]+)n\b"]),
    (
        TokenKind::Number,
        &[
            r"[0-9]+(?:\.[0-9]+)?[eE][+-]?[0-9]+",
            r"[0-9]+\.[0-9]+",
            r"\.[0-9]+",
            r"[0-9]+",
        ],
    ),
    (TokenKind::Boolean, &[r"(?:true|false)\b"]),
    (TokenKind::Null, &[r"null\b"]),
    (TokenKind::Undefined, &[r"undefined\b"]),
    (
        TokenKind::BinaryOperator,
        &[r"\*\*", r"\*", r"//", r"/", r"%%", r"%", r"\+", r"-"],
    ),
    (
        TokenKind::Comparison,
        &[r"==", r"!=", r">=", r"<=", r">", r"<", r"&&", r"\|\|"],
    ),
    (TokenKind::Symbol, &[r"\(", r"\)", r"\{", r"\}", r",", r";", r"=", r"!"]),
    (TokenKind::Identifier, &[r"[A-Za-z_][A-Za-z0-9_]*"]),
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Tico lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The matched source text.
    pub text: String,
    /// Capture groups of the winning pattern that took part in the match,
    /// e.g. a string's body or a big integer's digits.
    pub captures: Vec<String>,
    /// Byte range and 1-based line/column of the first character.
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            captures: Vec::new(),
            span,
        }
    }

    pub fn with_captures(mut self, captures: Vec<String>) -> Self {
        self.captures = captures;
        self
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    /// `true` for the keyword `word`.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// `true` for the symbol `symbol`.
    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    /// `true` for a binary or comparison operator spelled `op`.
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self.kind, TokenKind::BinaryOperator | TokenKind::Comparison) && self.text == op
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            _ => f.write_str(&self.text),
        }
    }
}
