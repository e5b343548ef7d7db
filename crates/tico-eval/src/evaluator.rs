//! Core statement and expression evaluator.
//!
//! Evaluation is `async` so the scheduler can suspend at any statement or
//! expression boundary. Methods that recurse through the tree return boxed
//! local futures.

use futures::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use tico_types::ast::*;
use tico_types::Span;

use crate::activation::{ActivationId, Callable, ScopeKind, ScriptFunction};
use crate::config::Semantics;
use crate::env::{Environment, Globals};
use crate::error::{EvalError, EvalResult};
use crate::ops;
use crate::scheduler::Scheduler;
use crate::value::Value;

/// Walks one [`Ast`] for the duration of a single run.
pub(crate) struct Evaluator<'p> {
    ast: &'p Ast,
    env: Environment,
    semantics: Semantics,
    scheduler: Scheduler,
    /// Open statement, body and expression frames.
    depth: usize,
    max_depth: usize,
    /// Span of the last node reached, reported with runtime errors.
    pub(crate) last_span: Span,
}

impl<'p> Evaluator<'p> {
    pub(crate) fn new(
        ast: &'p Ast,
        globals: Globals,
        semantics: Semantics,
        scheduler: Scheduler,
        max_depth: usize,
    ) -> Self {
        Self {
            ast,
            env: Environment::new(globals, semantics.shared_scopes),
            semantics,
            scheduler,
            depth: 0,
            max_depth,
            last_span: ast.root().span,
        }
    }

    /// Run the program. The result is the value of a top-level `return`, or
    /// else the value of the last top-level statement.
    pub(crate) async fn run(&mut self) -> EvalResult<Value> {
        let root = self.env.enter(self.ast.root(), None);
        let last = self.exec_body(root).await?;
        Ok(self.env.get(root).return_value.clone().unwrap_or(last))
    }

    async fn checkpoint(&mut self, span: Span) -> EvalResult<()> {
        self.last_span = span;
        self.scheduler.checkpoint().await
    }

    /// Open one frame of tree recursion. Every frame holds native stack
    /// while it runs, so nesting is capped at `max_depth`.
    fn descend(&mut self) -> EvalResult<()> {
        if self.depth >= self.max_depth {
            return Err(EvalError::DepthExceeded(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    /// Run the statements of `scope`'s branch until one stops the scope.
    fn exec_body<'e>(&'e mut self, scope: ActivationId) -> LocalBoxFuture<'e, EvalResult<Value>> {
        async move {
            self.descend()?;
            let result = self.run_body(scope).await;
            self.ascend();
            result
        }
        .boxed_local()
    }

    async fn run_body(&mut self, scope: ActivationId) -> EvalResult<Value> {
        let ast = self.ast;
        let branch = ast.branch(self.env.get(scope).branch);
        let mut last = Value::Undefined;
        for stmt in &branch.body {
            if self.env.get(scope).stopped {
                break;
            }
            last = self.exec_stmt(stmt, scope).await?;
        }
        Ok(last)
    }

    fn exec_stmt<'e>(
        &'e mut self,
        stmt: &'p Stmt,
        scope: ActivationId,
    ) -> LocalBoxFuture<'e, EvalResult<Value>> {
        async move {
            self.checkpoint(stmt.span(self.ast)).await?;
            self.descend()?;
            let result = self.run_stmt(stmt, scope).await;
            self.ascend();
            result
        }
        .boxed_local()
    }

    async fn run_stmt(&mut self, stmt: &'p Stmt, scope: ActivationId) -> EvalResult<Value> {
        match stmt {
            Stmt::Set(set) => {
                let value = self.eval_expr(&set.value, scope).await?;
                self.env.set_var(scope, &set.target.name, value.clone());
                Ok(value)
            }
            Stmt::Function(id) => {
                self.declare_function(*id, scope).await?;
                Ok(Value::Undefined)
            }
            Stmt::Return(ret) => self.exec_return(ret, scope).await,
            Stmt::Break(_) => {
                self.exec_break(scope)?;
                Ok(Value::Undefined)
            }
            Stmt::If(id) => self.exec_if(*id, scope).await,
            Stmt::While(id) => self.exec_while(*id, scope).await,
            Stmt::For(id) => self.exec_for(*id, scope).await,
            Stmt::Expr(expr) => self.eval_expr(expr, scope).await,
        }
    }

    /// Static defaults are evaluated here, once, in the declaring scope.
    async fn declare_function(&mut self, id: BranchId, scope: ActivationId) -> EvalResult<()> {
        let ast = self.ast;
        let branch = ast.branch(id);
        let BranchKind::Function { name, params } = &branch.kind else {
            return Err(unexpected_branch(branch, "FunctionExpression"));
        };

        let mut statics = Vec::with_capacity(params.len());
        for param in params {
            let value = match &param.default {
                Some(default) if param.is_static => Some(self.eval_expr(default, scope).await?),
                _ => None,
            };
            statics.push(value);
        }

        let function = ScriptFunction {
            branch: id,
            closure: scope,
            statics,
        };
        self.env
            .define_fn(scope, &name.name, Callable::Script(Rc::new(function)))
    }

    /// Stop every scope up to the nearest function, or the root, and record
    /// the value there.
    async fn exec_return(&mut self, ret: &'p ReturnStmt, scope: ActivationId) -> EvalResult<Value> {
        let value = match &ret.value {
            Some(expr) => self.eval_expr(expr, scope).await?,
            None => Value::Undefined,
        };

        let mut current = Some(scope);
        while let Some(id) = current {
            let activation = self.env.get_mut(id);
            activation.stopped = true;
            if activation.kind == ScopeKind::Function || activation.parent.is_none() {
                activation.return_value = Some(value.clone());
                break;
            }
            current = activation.parent;
        }
        Ok(value)
    }

    /// Stop every scope up to the nearest loop. Nothing is touched when no
    /// loop is reachable.
    fn exec_break(&mut self, scope: ActivationId) -> EvalResult<()> {
        let chain: Vec<ActivationId> = self.env.chain(scope).collect();
        let mut target = None;
        for (depth, &id) in chain.iter().enumerate() {
            match self.env.get(id).kind {
                ScopeKind::While => {}
                ScopeKind::For if self.semantics.break_exits_for_loops => {}
                ScopeKind::Function => break,
                _ => continue,
            }
            target = Some(depth);
            break;
        }

        let depth = target.ok_or(EvalError::BreakOutsideLoop)?;
        for &id in &chain[..=depth] {
            self.env.get_mut(id).stopped = true;
        }
        Ok(())
    }

    // ── Control Flow ─────────────────────────────────────────────────────

    /// Walk the `if`/`elif`/`else` chain; conditions run in `scope`.
    async fn exec_if(&mut self, id: BranchId, scope: ActivationId) -> EvalResult<Value> {
        let ast = self.ast;
        let mut current = Some(id);
        while let Some(id) = current {
            let branch = ast.branch(id);
            match &branch.kind {
                BranchKind::If { condition, next } => {
                    if self.eval_expr(condition, scope).await?.is_truthy() {
                        return self.exec_branch(branch, scope).await;
                    }
                    current = *next;
                }
                _ => return self.exec_branch(branch, scope).await,
            }
        }
        Ok(Value::Undefined)
    }

    async fn exec_while(&mut self, id: BranchId, scope: ActivationId) -> EvalResult<Value> {
        let ast = self.ast;
        let branch = ast.branch(id);
        let BranchKind::While { condition } = &branch.kind else {
            return Err(unexpected_branch(branch, "WhileLoopExpression"));
        };

        while self.eval_expr(condition, scope).await?.is_truthy() {
            if !self.exec_iteration(branch, scope).await? {
                break;
            }
        }
        Ok(Value::Undefined)
    }

    /// `init` and `iterate` run in the enclosing scope, like the condition.
    async fn exec_for(&mut self, id: BranchId, scope: ActivationId) -> EvalResult<Value> {
        let ast = self.ast;
        let branch = ast.branch(id);
        let BranchKind::For {
            init,
            condition,
            iterate,
        } = &branch.kind
        else {
            return Err(unexpected_branch(branch, "ForLoopExpression"));
        };

        self.exec_stmt(init, scope).await?;
        while self.eval_expr(condition, scope).await?.is_truthy() {
            if !self.exec_iteration(branch, scope).await? {
                break;
            }
            self.exec_stmt(iterate, scope).await?;
        }
        Ok(Value::Undefined)
    }

    /// One loop iteration in a new activation. `false` once the body
    /// stopped it.
    async fn exec_iteration(&mut self, branch: &'p Branch, scope: ActivationId) -> EvalResult<bool> {
        let iteration = self.env.enter(branch, Some(scope));
        self.exec_body(iteration).await?;
        let stopped = self.env.get(iteration).stopped;
        self.env.leave(iteration);
        Ok(!stopped)
    }

    async fn exec_branch(&mut self, branch: &'p Branch, parent: ActivationId) -> EvalResult<Value> {
        let scope = self.env.enter(branch, Some(parent));
        let value = self.exec_body(scope).await?;
        self.env.leave(scope);
        Ok(value)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval_expr<'e>(
        &'e mut self,
        expr: &'p Expr,
        scope: ActivationId,
    ) -> LocalBoxFuture<'e, EvalResult<Value>> {
        async move {
            self.checkpoint(expr.span).await?;
            self.descend()?;
            let result = self.run_expr(expr, scope).await;
            self.ascend();
            result
        }
        .boxed_local()
    }

    async fn run_expr(&mut self, expr: &'p Expr, scope: ActivationId) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Literal { value, .. } => Ok(Value::from(value)),
            ExprKind::Identifier(ident) => self.read_var(&ident.name, scope),
            ExprKind::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, scope).await?;
                let rhs = self.eval_expr(right, scope).await?;
                self.last_span = expr.span;
                ops::apply(*op, lhs, rhs, &self.semantics)
            }
            ExprKind::Negate(inner) => {
                let value = self.eval_expr(inner, scope).await?;
                Ok(Value::Bool(!value.is_truthy()))
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, scope).await,
        }
    }

    fn read_var(&self, name: &str, scope: ActivationId) -> EvalResult<Value> {
        match self.env.get_var(scope, name) {
            Some(value) => Ok(value.clone()),
            None if self.semantics.strict_variables => {
                Err(EvalError::UndefinedVariable(name.to_string()))
            }
            None => Ok(Value::Undefined),
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────

    /// Arguments are evaluated left to right in the caller's scope.
    async fn eval_call(
        &mut self,
        callee: &'p Ident,
        args: &'p [Expr],
        scope: ActivationId,
    ) -> EvalResult<Value> {
        let function = self
            .env
            .get_fn(scope, &callee.name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedFunction(callee.name.clone()))?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, scope).await?);
        }
        self.last_span = callee.span;

        match function {
            Callable::Native(native) => native.call(values).map_err(|message| EvalError::Native {
                name: callee.name.clone(),
                message,
            }),
            Callable::Script(function) => self.call_script(&function, values, scope).await,
        }
    }

    /// Bind parameters positionally and run the body under the function's
    /// closure. A missing argument takes its static default, else its
    /// dynamic default evaluated in the caller's scope, else `undefined`.
    async fn call_script(
        &mut self,
        function: &ScriptFunction,
        args: Vec<Value>,
        caller: ActivationId,
    ) -> EvalResult<Value> {
        let ast = self.ast;
        let branch = ast.branch(function.branch);
        let BranchKind::Function { params, .. } = &branch.kind else {
            return Err(unexpected_branch(branch, "FunctionExpression"));
        };

        let mut args = args.into_iter();
        let mut bound = Vec::with_capacity(params.len());
        for (param, cached) in params.iter().zip(&function.statics) {
            let value = match (args.next(), cached, &param.default) {
                (Some(value), _, _) => value,
                (None, Some(value), _) => value.clone(),
                (None, None, Some(default)) => self.eval_expr(default, caller).await?,
                (None, None, None) => Value::Undefined,
            };
            bound.push((param.name.name.as_str(), value));
        }

        let scope = self.env.enter(branch, Some(function.closure));
        for (name, value) in bound {
            self.env.define_var(scope, name, value);
        }
        self.exec_body(scope).await?;
        let result = self.env.get(scope).return_value.clone();
        self.env.leave(scope);
        Ok(result.unwrap_or(Value::Undefined))
    }
}

fn unexpected_branch(branch: &Branch, expected: &str) -> EvalError {
    EvalError::Runtime(format!(
        "expected {expected}, found {}",
        branch.kind.name()
    ))
}
