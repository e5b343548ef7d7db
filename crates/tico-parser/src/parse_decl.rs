//! Function declarations.

use tico_types::ast::*;
use tico_types::{ErrorCode, TicoError};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `"function" identifier "(" [arg {"," arg}] ")" body`
    pub(crate) fn parse_function_decl(&mut self) -> Result<BranchId, TicoError> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect_symbol("(")?;

        let mut params = Vec::new();
        if !self.check_symbol(")") {
            loop {
                params.push(self.parse_function_arg()?);
                if self.eat_symbol(",").is_none() {
                    break;
                }
            }
        }
        self.expect_symbol(")")?;

        let (body, span) = self.parse_body()?;
        Ok(self.push_branch(BranchKind::Function { name, params }, body, span))
    }

    /// `["static"] identifier ["=" expression]`
    ///
    /// A `static` argument must carry a default.
    fn parse_function_arg(&mut self) -> Result<FunctionArg, TicoError> {
        let marker = self.eat_keyword("static");
        let name = self.expect_identifier()?;
        let start = marker.as_ref().map_or(name.span, |t| t.span);

        let default = if self.eat_symbol("=").is_some() {
            Some(self.expect_expression()?)
        } else if marker.is_some() {
            return Err(self.error_at_current(ErrorCode::EXPECTED_TOKEN, "Expected \"=\""));
        } else {
            None
        };

        let end = default.as_ref().map_or(name.span, |d| d.span);
        Ok(FunctionArg {
            name,
            default,
            is_static: marker.is_some(),
            span: start.merge(end),
        })
    }
}
