//! Program: a parsed script plus the host-facing run configuration.
//!
//! Owns the AST, the output sinks, the scheduler timings and the run
//! control. Every run gets its own activations, so one `Program` can be run
//! any number of times.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tico_parser::ParseOptions;
use tico_types::ast::Ast;
use tico_types::{Span, TicoError};

use crate::activation::Callable;
use crate::builtins::{builtins, default_stderr, default_stdout, OutputFn};
use crate::config::{RunConfig, Semantics};
use crate::env::Globals;
use crate::error::{EvalError, RunError};
use crate::evaluator::Evaluator;
use crate::scheduler::{RunControl, Scheduler};
use crate::value::{NativeFn, Value};

/// A runnable Tico program.
pub struct Program {
    ast: Ast,
    batch: Duration,
    wait: Duration,
    max_depth: usize,
    semantics: Semantics,
    stdout: OutputFn,
    stderr: OutputFn,
    control: RunControl,
}

impl Program {
    /// Wrap an already parsed tree.
    pub fn new(ast: Ast) -> Self {
        let config = RunConfig::default();
        Self {
            ast,
            batch: config.batch_duration(),
            wait: config.wait_duration(),
            max_depth: config.max_depth,
            semantics: config.semantics,
            stdout: default_stdout(),
            stderr: default_stderr(),
            control: RunControl::new(),
        }
    }

    pub fn from_source_code(source: &str) -> Result<Self, TicoError> {
        Self::from_source_with(source, &ParseOptions::default())
    }

    pub fn from_source_with(source: &str, options: &ParseOptions) -> Result<Self, TicoError> {
        tico_parser::parse_with(source, options).map(Self::new)
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    // ── Configuration ────────────────────────────────────────────────────

    /// How long a run executes before it suspends. Zero suspends at every
    /// statement and expression.
    pub fn set_exec_batch_duration(&mut self, batch: Duration) {
        self.batch = batch;
    }

    /// How long each suspension lasts. Zero yields to the executor once.
    pub fn set_wait_duration(&mut self, wait: Duration) {
        self.wait = wait;
    }

    /// Redirect `write` and `writeLine` (and color escapes).
    pub fn set_stdout(&mut self, sink: impl Fn(&str) + 'static) {
        self.stdout = Rc::new(sink);
    }

    /// Redirect `writeError` and `writeErrorLine`.
    pub fn set_stderr(&mut self, sink: impl Fn(&str) + 'static) {
        self.stderr = Rc::new(sink);
    }

    /// Cap on nested statements, bodies and expressions during a run.
    /// Deeper runs fail with `DepthExceeded` instead of exhausting the
    /// thread's stack; raise it only together with the stack size.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn set_semantics(&mut self, semantics: Semantics) {
        self.semantics = semantics;
    }

    pub fn semantics(&self) -> &Semantics {
        &self.semantics
    }

    pub fn configure(&mut self, config: &RunConfig) {
        self.batch = config.batch_duration();
        self.wait = config.wait_duration();
        self.max_depth = config.max_depth;
        self.semantics = config.semantics.clone();
    }

    // ── Run control ──────────────────────────────────────────────────────

    /// A handle that can stop, pause or resume runs from another task or
    /// thread.
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    // ── Running ──────────────────────────────────────────────────────────

    /// Run the program on the current tokio runtime.
    ///
    /// `variables` and `functions` become globals. Caller functions replace
    /// builtins of the same name.
    pub async fn run(
        &self,
        variables: HashMap<String, Value>,
        functions: HashMap<String, NativeFn>,
    ) -> Result<Value, RunError> {
        self.control.begin_run();

        let mut globals = Globals {
            variables,
            functions: HashMap::new(),
        };
        for (name, function) in builtins(&self.stdout, &self.stderr) {
            globals
                .functions
                .insert(name.to_string(), Callable::Native(function));
        }
        for (name, function) in functions {
            globals.functions.insert(name, Callable::Native(function));
        }

        let scheduler = Scheduler::new(self.batch, self.wait, self.control.clone());
        let mut evaluator = Evaluator::new(
            &self.ast,
            globals,
            self.semantics.clone(),
            scheduler,
            self.max_depth,
        );
        let result = evaluator.run().await;
        result.map_err(|error| RunError::new(error, evaluator.last_span))
    }

    /// Run to completion on a private current-thread runtime.
    pub fn run_blocking(
        &self,
        variables: HashMap<String, Value>,
        functions: HashMap<String, NativeFn>,
    ) -> Result<Value, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| RunError::new(EvalError::Runtime(e.to_string()), Span::default()))?;
        runtime.block_on(self.run(variables, functions))
    }
}
