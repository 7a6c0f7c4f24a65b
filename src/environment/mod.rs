pub mod formatter;

use compact_str::CompactString;
use std::{cell::RefCell, rc::Rc};

use crate::value::Value;

/// A scope frame: the bindings of one function invocation (or of the
/// program) and a link to the frame it was created in.
///
/// Cloning an `Environment` aliases the frame. Closures keep their defining
/// frame alive by holding such a clone.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<RefCell<EnvironmentImpl>>,
}

#[derive(Default)]
struct EnvironmentImpl {
    values: Vec<(CompactString, Value)>,
    parent: Option<Environment>,
}

impl EnvironmentImpl {
    fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        match self.values.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.values.push((name.into(), value));
                None
            }
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvironmentImpl::default())),
        }
    }

    pub fn new_scope(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvironmentImpl {
                values: Vec::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let inner = current.inner.borrow();
                if let Some(value) = inner.get(name) {
                    return Some(value.clone());
                }
                inner.parent.clone()
            };
            current = parent?;
        }
    }

    /// Binds `name` in this frame, shadowing any binding in an enclosing frame.
    pub fn define(&self, name: &str, value: Value) {
        let previous = self.inner.borrow_mut().set(name, value);
        drop(previous);
    }

    /// Updates the nearest frame that already binds `name`. When no frame does,
    /// the binding is created in this frame.
    pub fn assign(&self, name: &str, value: Value) {
        let owner = self.owner_of(name).unwrap_or_else(|| self.clone());
        owner.define(name, value);
    }

    fn owner_of(&self, name: &str) -> Option<Environment> {
        let mut current = Some(self.clone());
        while let Some(environment) = current {
            if environment.inner.borrow().get(name).is_some() {
                return Some(environment);
            }
            current = environment.parent();
        }
        None
    }

    /// A snapshot of the bindings local to this frame, in definition order.
    pub fn bindings(&self) -> Vec<(CompactString, Value)> {
        self.inner.borrow().values.clone()
    }

    pub fn parent(&self) -> Option<Environment> {
        self.inner.borrow().parent.clone()
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// An identifier that is unique among live frames.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Frames can reach themselves through closures, so only names are printed.
impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Environment")
            .field("id", &self.id())
            .field(
                "names",
                &inner.values.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("parent", &inner.parent.as_ref().map(Environment::id))
            .finish()
    }
}
