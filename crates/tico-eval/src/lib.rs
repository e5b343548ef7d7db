//! Tico tree-walking evaluator.
//!
//! Runs a parsed program against host-supplied variables and native
//! functions, suspending cooperatively so hosts can pause, resume and stop
//! long runs.

mod activation;
mod builtins;
mod config;
mod env;
mod error;
mod evaluator;
mod ops;
mod program;
mod scheduler;
mod value;

pub use builtins::OutputFn;
pub use config::{RunConfig, Semantics, DEFAULT_MAX_DEPTH};
pub use error::{EvalError, EvalResult, RunError};
pub use program::Program;
pub use scheduler::{RunControl, RunState};
pub use value::{HostObject, NativeFn, Overload, Value};

pub use tico_parser::ParseOptions;
