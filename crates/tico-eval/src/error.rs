//! Runtime error types for the Tico evaluator.

use tico_types::Span;

/// Evaluation error. Every variant aborts the current run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Call to a name no scope, global or builtin defines.
    #[error("undefined function [{0}]")]
    UndefinedFunction(String),
    /// Function declaration whose name already resolves.
    #[error("identifier already exists [{0}]")]
    DuplicateFunction(String),
    /// `break` with no enclosing loop before a function boundary.
    #[error("break outside of a loop")]
    BreakOutsideLoop,
    /// Unresolved read; only raised with strict variables.
    #[error("undefined variable [{0}]")]
    UndefinedVariable(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Big integer division by zero, negative exponent, etc.
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),
    /// A native function or host overload reported failure.
    #[error("native function {name} failed: {message}")]
    Native { name: String, message: String },
    /// Statements, bodies and expressions nested deeper than the run's
    /// `max_depth`, usually through runaway recursion.
    #[error("maximum nesting depth exceeded ({0})")]
    DepthExceeded(usize),
    /// The run was stopped through its [`RunControl`](crate::RunControl).
    #[error("run cancelled")]
    Cancelled,
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// A failed run: the error and the last node the evaluator reached.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{span}: {error}")]
pub struct RunError {
    #[source]
    pub error: EvalError,
    pub span: Span,
}

impl RunError {
    pub fn new(error: EvalError, span: Span) -> Self {
        Self { error, span }
    }
}
