//! Run configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Evaluation switches. The defaults reproduce the reference behaviour
/// except for `shared_scopes`, which is opt-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Semantics {
    /// One activation per block, reset on every entry. Recursion and other
    /// re-entry clobber the outer activation.
    pub shared_scopes: bool,
    /// Let `break` leave `for` loops as well as `while` loops.
    pub break_exits_for_loops: bool,
    /// Negate the result of host `and`/`or` overloads.
    pub negate_logical_overloads: bool,
    /// Reading an unresolved variable is an error instead of `undefined`.
    pub strict_variables: bool,
}

impl Default for Semantics {
    fn default() -> Self {
        Self {
            shared_scopes: false,
            break_exits_for_loops: false,
            negate_logical_overloads: true,
            strict_variables: false,
        }
    }
}

/// Default cap on open evaluation frames. Sized for a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Scheduler timings, limits and semantics, loadable from JSON.
///
/// ```json
/// { "batch_ms": 15, "wait_ms": 0, "max_depth": 256, "semantics": { "strict_variables": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How long the evaluator runs before suspending.
    pub batch_ms: u64,
    /// How long a suspension waits. Zero yields to the executor once.
    pub wait_ms: u64,
    /// How deeply statements, bodies and expressions may nest at run time.
    /// Each script call opens several frames.
    pub max_depth: usize,
    pub semantics: Semantics,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_ms: 15,
            wait_ms: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            semantics: Semantics::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn batch_duration(&self) -> Duration {
        Duration::from_millis(self.batch_ms)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}
