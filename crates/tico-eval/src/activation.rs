//! Activation records: the runtime instances of AST branches.

use std::collections::HashMap;
use std::rc::Rc;
use tico_types::ast::{BranchId, BranchKind};

use crate::value::{NativeFn, Value};

/// Handle of an [`Activation`] inside an [`Environment`](crate::env::Environment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ActivationId(pub(crate) u32);

impl ActivationId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a scope is, as far as `return` and `break` are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Block,
    If,
    Else,
    While,
    For,
    Function,
}

impl From<&BranchKind> for ScopeKind {
    fn from(kind: &BranchKind) -> Self {
        match kind {
            BranchKind::Block => ScopeKind::Block,
            BranchKind::If { .. } => ScopeKind::If,
            BranchKind::Else => ScopeKind::Else,
            BranchKind::While { .. } => ScopeKind::While,
            BranchKind::For { .. } => ScopeKind::For,
            BranchKind::Function { .. } => ScopeKind::Function,
        }
    }
}

/// A function declared by a script.
#[derive(Debug)]
pub(crate) struct ScriptFunction {
    pub(crate) branch: BranchId,
    /// Scope the declaration ran in; calls use it as their parent.
    pub(crate) closure: ActivationId,
    /// Per parameter, the value of a `static` default.
    pub(crate) statics: Vec<Option<Value>>,
}

#[derive(Debug, Clone)]
pub(crate) enum Callable {
    Native(NativeFn),
    Script(Rc<ScriptFunction>),
}

/// One live execution of a branch.
#[derive(Debug)]
pub(crate) struct Activation {
    pub(crate) branch: BranchId,
    pub(crate) kind: ScopeKind,
    pub(crate) parent: Option<ActivationId>,
    pub(crate) variables: HashMap<String, Value>,
    pub(crate) functions: HashMap<String, Callable>,
    /// Set by `return` and `break`; no further statements run.
    pub(crate) stopped: bool,
    /// Set by `return` on function activations and the root.
    pub(crate) return_value: Option<Value>,
}

impl Activation {
    pub(crate) fn new(branch: BranchId, kind: ScopeKind, parent: Option<ActivationId>) -> Self {
        Self {
            branch,
            kind,
            parent,
            variables: HashMap::new(),
            functions: HashMap::new(),
            stopped: false,
            return_value: None,
        }
    }

    /// Empty the activation for another entry of its branch.
    pub(crate) fn reset(&mut self, parent: Option<ActivationId>) {
        self.parent = parent;
        self.variables.clear();
        self.functions.clear();
        self.stopped = false;
        self.return_value = None;
    }
}
