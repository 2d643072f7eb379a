//! Scoped key/value bindings with stack-discipline restoration.

use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};
use tracing::debug;

/// Bindings applied when entering a scope.
///
/// Positional layers are applied first, in order, later layers winning.
/// Named overrides are applied last and take precedence over every layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    layers: Vec<Map<String, Value>>,
    named: Map<String, Value>,
}

impl Overrides {
    /// Create an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional mapping layer.
    #[must_use]
    pub fn layer(mut self, layer: Map<String, Value>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Bind `key` to `value` with the highest precedence.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Returns `true` when applying these overrides changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.layers.iter().all(Map::is_empty)
    }

    fn apply(self, scope: &mut Map<String, Value>) {
        for layer in self.layers {
            scope.extend(layer);
        }
        scope.extend(self.named);
    }
}

/// Stack of value scopes.
///
/// The top scope is always present; entering pushes a copy of it with
/// overrides applied and leaving restores the exact prior snapshot.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use terranetes::values::{Overrides, ValueStack};
///
/// let mut stack = ValueStack::default();
/// stack.set("foo", json!("top"));
/// {
///     let inner = stack.enter(Overrides::new().set("foo", "bottom"));
///     assert_eq!(inner.get("foo"), Some(&json!("bottom")));
/// }
/// assert_eq!(stack.get("foo"), Some(&json!("top")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStack {
    current: Map<String, Value>,
    saved: Vec<Map<String, Value>>,
}

impl ValueStack {
    /// Create a stack whose root scope holds `root`.
    #[must_use]
    pub const fn with_root(root: Map<String, Value>) -> Self {
        Self {
            current: root,
            saved: Vec::new(),
        }
    }

    /// Push a new scope and return a guard that pops it when dropped.
    pub fn enter(&mut self, overrides: Overrides) -> ScopeGuard<'_> {
        let restore_to = self.depth();
        self.push(overrides);
        ScopeGuard {
            stack: self,
            restore_to,
        }
    }

    /// Run `f` inside a new scope, restoring the prior scope afterwards.
    pub fn scoped<R>(&mut self, overrides: Overrides, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut guard = self.enter(overrides);
        f(&mut *guard)
    }

    /// Look up `key` in the current scope.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// Look up `key`, falling back to `default` when unbound.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.current.get(key).cloned().unwrap_or(default)
    }

    /// Bind `key` in the current scope only.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.current.insert(key.into(), value);
    }

    /// Bindings visible in the current scope.
    #[must_use]
    pub const fn bindings(&self) -> &Map<String, Value> {
        &self.current
    }

    /// Number of scopes on the stack, the root included.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.saved.len() + 1
    }

    pub(crate) fn push(&mut self, overrides: Overrides) {
        let mut next = self.current.clone();
        overrides.apply(&mut next);
        self.saved.push(std::mem::replace(&mut self.current, next));
        debug!(depth = self.depth(), "entered value scope");
    }

    pub(crate) fn pop(&mut self) {
        if let Some(previous) = self.saved.pop() {
            self.current = previous;
        }
    }

    pub(crate) fn restore_to(&mut self, depth: usize) {
        while self.depth() > depth.max(1) {
            self.pop();
        }
    }
}

/// Guard returned by [`ValueStack::enter`].
///
/// Dereferences to the stack and restores the scope that was current
/// before the matching `enter` on drop, including scopes left open by
/// inner code.
#[derive(Debug)]
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    stack: &'a mut ValueStack,
    restore_to: usize,
}

impl Deref for ScopeGuard<'_> {
    type Target = ValueStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.restore_to(self.restore_to);
    }
}
