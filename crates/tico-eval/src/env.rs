//! Scoped environment for the Tico evaluator.
//!
//! Holds the activation arena and the program globals. Lookups walk from an
//! activation up its parent links, then fall back to the globals.

use std::collections::HashMap;
use tico_types::ast::{Branch, BranchId};

use crate::activation::{Activation, ActivationId, Callable, ScopeKind};
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Variables and functions visible from every scope.
#[derive(Debug, Default)]
pub(crate) struct Globals {
    pub(crate) variables: HashMap<String, Value>,
    pub(crate) functions: HashMap<String, Callable>,
}

pub(crate) struct Environment {
    activations: Vec<Activation>,
    /// Released slots, reused by later activations.
    free: Vec<ActivationId>,
    /// Shared-scope mode: the single activation of each branch.
    shared: Option<HashMap<BranchId, ActivationId>>,
    pub(crate) globals: Globals,
}

impl Environment {
    pub(crate) fn new(globals: Globals, shared_scopes: bool) -> Self {
        Self {
            activations: Vec::new(),
            free: Vec::new(),
            shared: shared_scopes.then(HashMap::new),
            globals,
        }
    }

    // ── Activation lifecycle ─────────────────────────────────────────────

    /// Activate `branch` under `parent`.
    ///
    /// In shared-scope mode this resets and returns the branch's one
    /// activation, otherwise it allocates a fresh one.
    pub(crate) fn enter(&mut self, branch: &Branch, parent: Option<ActivationId>) -> ActivationId {
        if let Some(shared) = &self.shared {
            if let Some(&id) = shared.get(&branch.id) {
                self.activations[id.index()].reset(parent);
                return id;
            }
        }

        let activation = Activation::new(branch.id, ScopeKind::from(&branch.kind), parent);
        let id = match self.free.pop() {
            Some(id) => {
                self.activations[id.index()] = activation;
                id
            }
            None => {
                self.activations.push(activation);
                ActivationId(self.activations.len() as u32 - 1)
            }
        };
        if let Some(shared) = &mut self.shared {
            shared.insert(branch.id, id);
        }
        id
    }

    /// Release a fresh activation for reuse.
    ///
    /// Functions declared in it go with it: a declared function can only be
    /// named from scopes whose chain passes through its declaring
    /// activation, so none of them can outlive it.
    pub(crate) fn leave(&mut self, id: ActivationId) {
        if self.shared.is_some() {
            return;
        }
        let activation = &mut self.activations[id.index()];
        activation.variables.clear();
        activation.functions.clear();
        activation.return_value = None;
        self.free.push(id);
    }

    /// Slots in the arena, live or free.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.activations.len()
    }

    pub(crate) fn get(&self, id: ActivationId) -> &Activation {
        &self.activations[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: ActivationId) -> &mut Activation {
        &mut self.activations[id.index()]
    }

    /// `id` followed by its ancestors, innermost first.
    pub(crate) fn chain(&self, id: ActivationId) -> impl Iterator<Item = ActivationId> + '_ {
        std::iter::successors(Some(id), move |&id| self.get(id).parent)
    }

    // ── Variables ────────────────────────────────────────────────────────

    pub(crate) fn get_var(&self, scope: ActivationId, name: &str) -> Option<&Value> {
        self.chain(scope)
            .find_map(|id| self.get(id).variables.get(name))
            .or_else(|| self.globals.variables.get(name))
    }

    /// Overwrite the nearest binding of `name`, or define it in `scope`.
    pub(crate) fn set_var(&mut self, scope: ActivationId, name: &str, value: Value) {
        let owner = self
            .chain(scope)
            .find(|&id| self.get(id).variables.contains_key(name));
        if let Some(owner) = owner {
            self.get_mut(owner).variables.insert(name.to_string(), value);
        } else if let Some(slot) = self.globals.variables.get_mut(name) {
            *slot = value;
        } else {
            self.define_var(scope, name, value);
        }
    }

    /// Bind `name` in `scope` itself, shadowing outer bindings.
    pub(crate) fn define_var(&mut self, scope: ActivationId, name: &str, value: Value) {
        self.get_mut(scope)
            .variables
            .insert(name.to_string(), value);
    }

    // ── Functions ────────────────────────────────────────────────────────

    pub(crate) fn get_fn(&self, scope: ActivationId, name: &str) -> Option<&Callable> {
        self.chain(scope)
            .find_map(|id| self.get(id).functions.get(name))
            .or_else(|| self.globals.functions.get(name))
    }

    /// Declare `name` in `scope`. Fails if the name already resolves.
    pub(crate) fn define_fn(
        &mut self,
        scope: ActivationId,
        name: &str,
        function: Callable,
    ) -> EvalResult<()> {
        if self.get_fn(scope, name).is_some() {
            return Err(EvalError::DuplicateFunction(name.to_string()));
        }
        self.get_mut(scope)
            .functions
            .insert(name.to_string(), function);
        Ok(())
    }
}
