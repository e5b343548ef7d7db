//! Core parser infrastructure: token cursor, branch arena, error helpers.

use tico_lexer::{Lexer, Token, TokenKind};
use tico_types::ast::{Ast, Branch, BranchId, BranchKind, Ident, Stmt};
use tico_types::{ErrorCode, SourceFile, Span, TicoError};

use crate::options::ParseOptions;

/// Outcome of a speculative rule: `Ok(None)` means "did not match" and the
/// cursor is back where the rule started; `Err` is a real syntax error.
pub(crate) type Attempt<T> = Result<Option<T>, TicoError>;

/// The Tico parser.
///
/// Recursive descent over a token vector with save/restore backtracking.
/// Fails fast: the first syntax error aborts the parse.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    /// Source file for error context.
    file: &'src SourceFile,
    pub(crate) options: ParseOptions,
    /// Branches built so far; children are pushed before their parents.
    branches: Vec<Branch>,
    /// Open nesting levels, bounded by `options.max_depth`.
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Create a parser over an already lexed token stream. A missing
    /// trailing `Eof` is appended.
    pub fn new(mut tokens: Vec<Token>, file: &'src SourceFile) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = file.source.len();
            tokens.push(Token::new(TokenKind::Eof, "", file.span(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            file,
            options: ParseOptions::default(),
            branches: Vec::new(),
            depth: 0,
        }
    }

    /// Lex `file` and create a parser over the result.
    pub fn from_source(file: &'src SourceFile) -> Self {
        Self::new(Lexer::new(file).lex(), file)
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Current token. Past the end this keeps returning the final `Eof`.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Cursor position, for [`Parser::rewind`].
    pub(crate) fn save(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn check_symbol(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    pub(crate) fn check_keyword(&self, word: &str) -> bool {
        self.peek().is_keyword(word)
    }

    pub(crate) fn eat_symbol(&mut self, symbol: &str) -> Option<Token> {
        self.check_symbol(symbol).then(|| self.advance())
    }

    pub(crate) fn eat_keyword(&mut self, word: &str) -> Option<Token> {
        self.check_keyword(word).then(|| self.advance())
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Consume `symbol` or fail with `Expected "<symbol>"`.
    pub(crate) fn expect_symbol(&mut self, symbol: &str) -> Result<Token, TicoError> {
        self.eat_symbol(symbol).ok_or_else(|| {
            self.error_at_current(ErrorCode::EXPECTED_TOKEN, format!("Expected \"{symbol}\""))
        })
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Ident, TicoError> {
        if self.peek().kind == TokenKind::Identifier {
            let token = self.advance();
            Ok(Ident::new(token.text, token.span))
        } else {
            Err(self.error_at_current(ErrorCode::EXPECTED_PRODUCTION, "Expected identifier"))
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> TicoError {
        let source_line = self.file.line(span.line).unwrap_or("");
        TicoError::new(code, message, span, source_line)
    }

    pub(crate) fn error_at_current(&self, code: ErrorCode, message: impl Into<String>) -> TicoError {
        self.error_at(code, message, self.peek().span)
    }

    /// `Unexpected token [<text>]` at the current token.
    pub(crate) fn unexpected(&self) -> TicoError {
        let token = self.peek();
        self.error_at(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("Unexpected token [{}]", token.text),
            token.span,
        )
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Open one nesting level, failing past `max_depth`.
    pub(crate) fn descend(&mut self) -> Result<(), TicoError> {
        if self.depth >= self.options.max_depth {
            return Err(self.error_at_current(ErrorCode::NESTING_TOO_DEEP, "Nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn restore_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    // ── Branch Arena ──────────────────────────────────────────────────────────

    pub(crate) fn push_branch(&mut self, kind: BranchKind, body: Vec<Stmt>, span: Span) -> BranchId {
        let id = BranchId(self.branches.len() as u32);
        self.branches.push(Branch {
            id,
            kind,
            body,
            span,
        });
        id
    }

    pub(crate) fn stmt_span(&self, stmt: &Stmt) -> Span {
        match stmt {
            Stmt::Set(set) => set.span,
            Stmt::Return(ret) => ret.span,
            Stmt::Break(span) => *span,
            Stmt::Expr(expr) => expr.span,
            Stmt::Function(id) | Stmt::If(id) | Stmt::While(id) | Stmt::For(id) => {
                self.branches[id.index()].span
            }
        }
    }

    /// Span from the first to the last statement, or `fallback` when empty.
    pub(crate) fn body_span(&self, body: &[Stmt], fallback: Span) -> Span {
        match (body.first(), body.last()) {
            (Some(first), Some(last)) => self.stmt_span(first).merge(self.stmt_span(last)),
            _ => fallback,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the whole token stream into an [`Ast`].
    pub fn parse(mut self) -> Result<Ast, TicoError> {
        let start = self.peek().span;
        let mut body = Vec::new();
        while !self.at_end() {
            match self.parse_statement()? {
                Some(stmt) => body.push(stmt),
                None => return Err(self.unexpected()),
            }
        }
        let span = self.body_span(&body, start);
        let root = self.push_branch(BranchKind::Block, body, span);
        Ok(Ast {
            branches: self.branches,
            root,
        })
    }
}
