//! Expression parsing.
//!
//! An expression is a chain of members joined by binary operators. Members
//! are tried in order: `!member`, `( expression )`, call, identifier,
//! literal. Operators are grouped by precedence climbing over the tier table
//! in [`ParseOptions`](crate::ParseOptions); every tier is left-associative.

use num_bigint::BigInt;
use tico_lexer::{Token, TokenKind};
use tico_types::ast::*;
use tico_types::{ErrorCode, TicoError};

use crate::parser::{Attempt, Parser};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Points
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression, or `Ok(None)` if no member starts here.
    pub(crate) fn parse_expression(&mut self) -> Attempt<Expr> {
        let Some(left) = self.parse_member()? else {
            return Ok(None);
        };
        self.parse_binary(left, 1).map(Some)
    }

    /// Parse an expression that must be present.
    pub(crate) fn expect_expression(&mut self) -> Result<Expr, TicoError> {
        match self.parse_expression()? {
            Some(expr) => Ok(expr),
            None => Err(self.expected_member()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Operators
    // ══════════════════════════════════════════════════════════════════════════

    /// The operator at the cursor with its binding power.
    fn peek_operator(&self) -> Option<(BinOp, u8)> {
        let token = self.peek();
        if !matches!(token.kind, TokenKind::BinaryOperator | TokenKind::Comparison) {
            return None;
        }
        let op = BinOp::from_symbol(&token.text)?;
        Some((op, self.options.binding_power(op)))
    }

    /// Fold operators of at least `min_power` onto `left`.
    ///
    /// Every fold nests `left` one level deeper, so folds count against the
    /// depth limit like nested members do.
    fn parse_binary(&mut self, mut left: Expr, min_power: u8) -> Result<Expr, TicoError> {
        let outer = self.depth();
        while let Some((op, power)) = self.peek_operator() {
            if power < min_power {
                break;
            }
            self.descend()?;
            self.advance();
            let mut right = self.expect_member()?;
            while let Some((_, next)) = self.peek_operator() {
                if next <= power {
                    break;
                }
                right = self.parse_binary(right, power + 1)?;
            }
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        self.restore_depth(outer);
        Ok(left)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Members
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_member(&mut self) -> Attempt<Expr> {
        self.descend()?;
        let member = self.parse_member_alternatives();
        self.ascend();
        member
    }

    fn parse_member_alternatives(&mut self) -> Attempt<Expr> {
        if let Some(expr) = self.parse_negation()? {
            return Ok(Some(expr));
        }
        if let Some(expr) = self.parse_parenthesized()? {
            return Ok(Some(expr));
        }
        if let Some(expr) = self.parse_call()? {
            return Ok(Some(expr));
        }
        if let Some(expr) = self.parse_identifier()? {
            return Ok(Some(expr));
        }
        self.parse_literal()
    }

    fn expect_member(&mut self) -> Result<Expr, TicoError> {
        match self.parse_member()? {
            Some(expr) => Ok(expr),
            None => Err(self.expected_member()),
        }
    }

    fn expected_member(&self) -> TicoError {
        self.error_at_current(ErrorCode::EXPECTED_PRODUCTION, "Expected expression member")
    }

    /// `"!" member`
    fn parse_negation(&mut self) -> Attempt<Expr> {
        let Some(bang) = self.eat_symbol("!") else {
            return Ok(None);
        };
        let operand = self.expect_member()?;
        let span = bang.span.merge(operand.span);
        Ok(Some(Expr::new(ExprKind::Negate(Box::new(operand)), span)))
    }

    /// `"(" expression ")"`
    fn parse_parenthesized(&mut self) -> Attempt<Expr> {
        let start = self.save();
        let Some(open) = self.eat_symbol("(") else {
            return Ok(None);
        };
        let Some(mut inner) = self.parse_expression()? else {
            self.rewind(start);
            return Ok(None);
        };
        let close = self.expect_symbol(")")?;
        inner.span = open.span.merge(close.span);
        Ok(Some(inner))
    }

    /// `identifier "(" [expression {"," expression}] ")"`
    fn parse_call(&mut self) -> Attempt<Expr> {
        let is_call = self.peek().kind == TokenKind::Identifier
            && self.peek_at(1).is_some_and(|t| t.is_symbol("("));
        if !is_call {
            return Ok(None);
        }
        let name = self.advance();
        self.advance();

        let mut args = Vec::new();
        if !self.check_symbol(")") {
            loop {
                args.push(self.expect_expression()?);
                if self.eat_symbol(",").is_none() {
                    break;
                }
            }
        }
        let close = self.expect_symbol(")")?;
        let span = name.span.merge(close.span);
        Ok(Some(Expr::new(
            ExprKind::Call {
                callee: Ident::new(name.text, name.span),
                args,
            },
            span,
        )))
    }

    fn parse_identifier(&mut self) -> Attempt<Expr> {
        if self.peek().kind != TokenKind::Identifier {
            return Ok(None);
        }
        let token = self.advance();
        let span = token.span;
        Ok(Some(Expr::new(
            ExprKind::Identifier(Ident::new(token.text, span)),
            span,
        )))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Literals
    // ══════════════════════════════════════════════════════════════════════════

    /// A literal token, or `-` directly followed by a number or big integer.
    fn parse_literal(&mut self) -> Attempt<Expr> {
        let signed = self.peek().is_operator("-")
            && self
                .peek_at(1)
                .is_some_and(|t| matches!(t.kind, TokenKind::Number | TokenKind::BigInt));
        if signed {
            let minus = self.advance();
            let token = self.advance();
            return self.literal_from(&token, true).map(|(value, raw)| {
                let span = minus.span.merge(token.span);
                Some(Expr::new(ExprKind::Literal { value, raw }, span))
            });
        }

        if !self.peek().kind.is_literal() {
            return Ok(None);
        }
        let token = self.advance();
        let (value, raw) = self.literal_from(&token, false)?;
        Ok(Some(Expr::new(ExprKind::Literal { value, raw }, token.span)))
    }

    fn literal_from(&self, token: &Token, negative: bool) -> Result<(Literal, String), TicoError> {
        let raw = if negative {
            format!("-{}", token.text)
        } else {
            token.text.clone()
        };
        let invalid = || {
            self.error_at(
                ErrorCode::INVALID_LITERAL,
                format!("Invalid literal [{raw}]"),
                token.span,
            )
        };

        let value = match token.kind {
            TokenKind::Number => Literal::Number(raw.parse::<f64>().map_err(|_| invalid())?),
            TokenKind::BigInt => {
                let digits = token.captures.first().ok_or_else(invalid)?;
                let value = digits.parse::<BigInt>().map_err(|_| invalid())?;
                Literal::BigInt(if negative { -value } else { value })
            }
            TokenKind::String => {
                let body = token.captures.first().map(String::as_str).unwrap_or("");
                let is_raw = token.text.starts_with('`')
                    || token.text.starts_with("\"\"\"")
                    || token.text.starts_with("'''");
                Literal::String(if is_raw {
                    body.to_string()
                } else {
                    unescape(body)
                })
            }
            TokenKind::Boolean => Literal::Bool(token.text == "true"),
            TokenKind::Null => Literal::Null,
            TokenKind::Undefined => Literal::Undefined,
            _ => return Err(invalid()),
        };
        Ok((value, raw))
    }
}

/// Resolve backslash escapes in a quoted string body. An unknown escape
/// keeps the escaped character.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
