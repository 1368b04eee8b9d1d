use std::{cell::RefCell, fmt::Debug, rc::Rc};

use rustc_hash::FxHashMap;

use super::{callable::Call, Value};

#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Call(Call),
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Binding::Value(value)
    }
}

impl From<Call> for Binding {
    fn from(call: Call) -> Self {
        Binding::Call(call)
    }
}

struct Scope {
    bindings: FxHashMap<String, Binding>,
    parent: Option<Environment>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<Binding> {
        if let Some(binding) = self.bindings.get(name) {
            Some(binding.clone())
        } else if let Some(parent) = &self.parent {
            parent.get(name)
        } else {
            None
        }
    }
}

/// A lexical scope and, through its parent, every scope enclosing it.
///
/// Writes only ever land in the scope's own bindings; parents are read-only
/// through a child.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    pub fn from_bindings<N: Into<String>>(bindings: impl IntoIterator<Item = (N, Binding)>) -> Self {
        let environment = Self::new();
        for (name, binding) in bindings {
            environment.bind(name, binding);
        }
        environment
    }

    fn with_parent(parent: Option<Environment>) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent,
        })))
    }

    /// A fresh child scope of this one.
    pub fn extend(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    pub fn get(&self, name: &str) -> Option<Binding> {
        self.0.borrow().get(name)
    }

    /// Looks `name` up in this scope only.
    pub fn local(&self, name: &str) -> Option<Binding> {
        self.0.borrow().bindings.get(name).cloned()
    }

    pub fn bind(&self, name: impl Into<String>, binding: impl Into<Binding>) {
        self.0.borrow_mut().bindings.insert(name.into(), binding.into());
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = self.0.borrow();
        let mut bindings = scope
            .bindings
            .iter()
            .map(|(name, binding)| {
                let description = match binding {
                    Binding::Value(v) => v.to_string(),
                    Binding::Call(c) => c.to_string(),
                };
                (name.clone(), description)
            })
            .collect::<Vec<_>>();
        bindings.sort();

        f.debug_struct(format!("Environment<{:?}>", Rc::as_ptr(&self.0)).as_str())
            .field("bindings", &bindings)
            .field("parent", &scope.parent.as_ref().map(|p| Rc::as_ptr(&p.0)))
            .finish()
    }
}
