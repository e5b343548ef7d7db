//! Statement parsing: assignments, control flow, bodies.

use tico_lexer::{Token, TokenKind};
use tico_types::ast::*;
use tico_types::{ErrorCode, Span, TicoError};

use crate::parser::{Attempt, Parser};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse one statement and an optional trailing `;`.
    ///
    /// Returns `Ok(None)` when nothing at the cursor starts a statement.
    pub(crate) fn parse_statement(&mut self) -> Attempt<Stmt> {
        let stmt = if self.check_keyword("function") {
            Some(Stmt::Function(self.parse_function_decl()?))
        } else if self.check_keyword("return") {
            Some(self.parse_return()?)
        } else if let Some(token) = self.eat_keyword("break") {
            Some(Stmt::Break(token.span))
        } else if self.check_keyword("if") {
            Some(Stmt::If(self.parse_if()?))
        } else if self.check_keyword("while") {
            Some(Stmt::While(self.parse_while()?))
        } else if self.check_keyword("for") {
            Some(Stmt::For(self.parse_for()?))
        } else {
            self.parse_simple_statement()?
        };

        if stmt.is_some() {
            self.eat_symbol(";");
        }
        Ok(stmt)
    }

    /// An assignment or a bare expression. This is what `for` headers accept.
    fn parse_simple_statement(&mut self) -> Attempt<Stmt> {
        if let Some(set) = self.parse_assignment()? {
            return Ok(Some(Stmt::Set(set)));
        }
        Ok(self.parse_expression()?.map(Stmt::Expr))
    }

    /// `identifier "=" expression`
    fn parse_assignment(&mut self) -> Attempt<SetStmt> {
        let is_set = self.peek().kind == TokenKind::Identifier
            && self.peek_at(1).is_some_and(|t| t.is_symbol("="));
        if !is_set {
            return Ok(None);
        }
        let name = self.advance();
        self.advance();
        let value = self.expect_expression()?;
        let span = name.span.merge(value.span);
        Ok(Some(SetStmt {
            target: Ident::new(name.text, name.span),
            value,
            span,
        }))
    }

    /// `"return" [expression]`
    fn parse_return(&mut self) -> Result<Stmt, TicoError> {
        let keyword = self.advance();
        let value = self.parse_expression()?;
        let span = match &value {
            Some(expr) => keyword.span.merge(expr.span),
            None => keyword.span,
        };
        Ok(Stmt::Return(ReturnStmt { value, span }))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Bodies
    // ══════════════════════════════════════════════════════════════════════════

    /// A braced statement list or a single statement. Returns the statements
    /// and the span from the first to the last one.
    pub(crate) fn parse_body(&mut self) -> Result<(Vec<Stmt>, Span), TicoError> {
        self.descend()?;
        let body = self.parse_body_statements();
        self.ascend();
        body
    }

    fn parse_body_statements(&mut self) -> Result<(Vec<Stmt>, Span), TicoError> {
        if let Some(open) = self.eat_symbol("{") {
            let mut body = Vec::new();
            loop {
                if let Some(close) = self.eat_symbol("}") {
                    let span = self.body_span(&body, open.span.merge(close.span));
                    return Ok((body, span));
                }
                if self.at_end() {
                    return Err(self.error_at_current(ErrorCode::EXPECTED_TOKEN, "Expected \"}\""));
                }
                match self.parse_statement()? {
                    Some(stmt) => body.push(stmt),
                    None => return Err(self.unexpected()),
                }
            }
        }

        match self.parse_statement()? {
            Some(stmt) => {
                let span = self.stmt_span(&stmt);
                Ok((vec![stmt], span))
            }
            None => Err(self.error_at_current(ErrorCode::EXPECTED_PRODUCTION, "Expected statement")),
        }
    }

    /// `"(" expression ")"` after `if`, `elif` and `while`.
    fn parse_condition(&mut self) -> Result<Expr, TicoError> {
        self.expect_symbol("(")?;
        let condition = self.expect_expression()?;
        self.expect_symbol(")")?;
        Ok(condition)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Control Flow
    // ══════════════════════════════════════════════════════════════════════════

    /// `"if" condition body {"elif" condition body} ["else" body]`
    ///
    /// Each `elif` becomes the `next` of the branch before it, and a final
    /// `else` hangs off the last one. A `;` may separate a body from the
    /// `elif` or `else` after it.
    fn parse_if(&mut self) -> Result<BranchId, TicoError> {
        self.advance();
        let condition = self.parse_condition()?;
        let (body, span) = self.parse_body()?;

        let mut elifs = Vec::new();
        while self.eat_chained("elif").is_some() {
            let condition = self.parse_condition()?;
            let (body, span) = self.parse_body()?;
            elifs.push((condition, body, span));
        }
        let mut next = match self.eat_chained("else") {
            Some(_) => {
                let (body, span) = self.parse_body()?;
                Some(self.push_branch(BranchKind::Else, body, span))
            }
            None => None,
        };

        // Back to front, so each branch can name the one after it.
        for (condition, body, span) in elifs.into_iter().rev() {
            next = Some(self.push_branch(BranchKind::If { condition, next }, body, span));
        }
        Ok(self.push_branch(BranchKind::If { condition, next }, body, span))
    }

    /// `[";"] word`, consuming nothing unless `word` is there.
    fn eat_chained(&mut self, word: &str) -> Option<Token> {
        let start = self.save();
        self.eat_symbol(";");
        let token = self.eat_keyword(word);
        if token.is_none() {
            self.rewind(start);
        }
        token
    }

    /// `"while" condition body`
    fn parse_while(&mut self) -> Result<BranchId, TicoError> {
        self.advance();
        let condition = self.parse_condition()?;
        let (body, span) = self.parse_body()?;
        Ok(self.push_branch(BranchKind::While { condition }, body, span))
    }

    /// `"for" "(" simple ";" expression ";" simple ")" body`
    fn parse_for(&mut self) -> Result<BranchId, TicoError> {
        self.advance();
        self.expect_symbol("(")?;
        let init = self.expect_simple_statement()?;
        self.expect_symbol(";")?;
        let condition = self.expect_expression()?;
        self.expect_symbol(";")?;
        let iterate = self.expect_simple_statement()?;
        self.expect_symbol(")")?;
        let (body, span) = self.parse_body()?;
        Ok(self.push_branch(
            BranchKind::For {
                init: Box::new(init),
                condition,
                iterate: Box::new(iterate),
            },
            body,
            span,
        ))
    }

    fn expect_simple_statement(&mut self) -> Result<Stmt, TicoError> {
        match self.parse_simple_statement()? {
            Some(stmt) => Ok(stmt),
            None => Err(self.error_at_current(ErrorCode::EXPECTED_PRODUCTION, "Expected statement")),
        }
    }
}
