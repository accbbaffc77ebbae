//! Scopes and name resolution.
//!
//! The environment is a stack of scopes with the permanent module
//! scope at the bottom. Scopes link to their lexical parent through
//! shared cells, so a function value can capture its defining scope
//! *by reference*: invoking the function pushes a fresh scope whose
//! parent is the captured chain (lexical scoping, not dynamic), and
//! reads through the chain observe mutations made after capture.
//!
//! Binding rules:
//! - Reads walk the chain innermost-out; the first binding wins.
//! - Writes update an existing binding found *within the current
//!   frame* (the block scopes up to the nearest function, class, or
//!   module scope), else create a binding in the innermost scope.
//!   Writes never cross a function or class boundary, which is what
//!   makes assignment create locals and class bodies write-isolated.
//! - `global` redirects writes of a name to the module scope;
//!   `nonlocal` to the nearest enclosing function scope that already
//!   binds it (class scopes are skipped in that search).

use indexmap::IndexMap;
use kea_ir::Name;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::value::{Shared, Value};

/// Error from `bind`/`declare_nonlocal`: no enclosing function scope
/// binds the name. The interpreter turns this into a `NameError` with
/// the identifier text (the interner is not reachable from here).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoNonlocalBinding(pub Name);

/// Insertion-ordered binding table.
pub type BindingMap = IndexMap<Name, Value, FxBuildHasher>;

/// What pushed a scope; decides how writes resolve through it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// The permanent bottom scope.
    Module,
    /// A function call frame.
    Function,
    /// A class body; writes here become class members.
    Class,
    /// A loop iteration, conditional branch, or try-block scope.
    Block,
}

/// A single scope: bindings plus lexical parent link.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    bindings: BindingMap,
    parent: Option<Shared<Scope>>,
    /// Names declared `global` in this scope.
    globals: FxHashSet<Name>,
    /// Names declared `nonlocal` in this scope.
    nonlocals: FxHashSet<Name>,
}

impl Scope {
    /// Create a scope with no parent (the module scope).
    pub fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            bindings: BindingMap::default(),
            parent: None,
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
        }
    }

    /// Create a scope linked to a lexical parent.
    pub fn with_parent(kind: ScopeKind, parent: Shared<Scope>) -> Self {
        Scope {
            kind,
            bindings: BindingMap::default(),
            parent: Some(parent),
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
        }
    }

    /// Define a binding in this scope, shadowing any outer one.
    #[inline]
    pub fn define(&mut self, name: Name, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a binding in this scope only.
    #[inline]
    pub fn get_local(&self, name: Name) -> Option<Value> {
        self.bindings.get(&name).cloned()
    }

    /// Whether this scope binds the name itself.
    #[inline]
    pub fn has_local(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }

    /// Remove a binding from this scope, preserving the order of the
    /// remaining bindings.
    pub fn remove_local(&mut self, name: Name) -> Option<Value> {
        self.bindings.shift_remove(&name)
    }

    /// Look up a name through the lexical chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.bindings.get(&name) {
            return Some(value.clone());
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().lookup(name))
    }

    /// The lexical parent, if any.
    pub fn parent(&self) -> Option<Shared<Scope>> {
        self.parent.clone()
    }

    /// Move this scope's bindings out, in insertion order. Used when
    /// a class body's scope becomes the class member map.
    pub fn take_bindings(&mut self) -> BindingMap {
        std::mem::take(&mut self.bindings)
    }

    /// Bindings in insertion order (read-only view).
    pub fn bindings(&self) -> &BindingMap {
        &self.bindings
    }
}

/// The call stack of scopes.
pub struct Environment {
    /// Stack of scopes, innermost last. The bottom entry is the
    /// module scope and is never popped.
    scopes: Vec<Shared<Scope>>,
    module: Shared<Scope>,
}

impl Environment {
    /// Create an environment with only the module scope.
    pub fn new() -> Self {
        let module = Shared::new(Scope::new(ScopeKind::Module));
        Environment {
            scopes: vec![module.clone()],
            module,
        }
    }

    /// The innermost scope.
    #[inline]
    pub fn current(&self) -> Shared<Scope> {
        self.scopes.last().unwrap_or(&self.module).clone()
    }

    /// The module scope.
    #[inline]
    pub fn module(&self) -> Shared<Scope> {
        self.module.clone()
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push a scope whose parent is the current scope.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        let parent = self.current();
        self.scopes.push(Shared::new(Scope::with_parent(kind, parent)));
    }

    /// Push a scope onto an explicit parent chain. Function calls use
    /// the callee's captured defining scope here, not the caller's
    /// chain: scoping is lexical, not dynamic.
    pub fn push_scope_with_parent(&mut self, kind: ScopeKind, parent: Shared<Scope>) {
        self.scopes.push(Shared::new(Scope::with_parent(kind, parent)));
    }

    /// Pop the innermost scope. The module scope stays.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Resolve a name through the current lexical chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        self.current().borrow().lookup(name)
    }

    /// Define a binding in the innermost scope unconditionally.
    pub fn define(&mut self, name: Name, value: Value) {
        self.current().borrow_mut().define(name, value);
    }

    /// Bind a name following the assignment rules.
    pub fn bind(&mut self, name: Name, value: Value) -> Result<(), NoNonlocalBinding> {
        let current = self.current();
        if current.borrow().globals.contains(&name) {
            self.module.borrow_mut().define(name, value);
            return Ok(());
        }
        if current.borrow().nonlocals.contains(&name) {
            return self.bind_nonlocal(name, value);
        }

        // Update an existing binding within the current frame: block
        // scopes up to and including the nearest function, class, or
        // module scope. Never cross that boundary.
        let mut scope = current.clone();
        loop {
            if scope.borrow().has_local(name) {
                scope.borrow_mut().define(name, value);
                return Ok(());
            }
            if scope.borrow().kind != ScopeKind::Block {
                break;
            }
            let parent = scope.borrow().parent();
            match parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        current.borrow_mut().define(name, value);
        Ok(())
    }

    fn bind_nonlocal(&mut self, name: Name, value: Value) -> Result<(), NoNonlocalBinding> {
        if let Some(target) = self.find_nonlocal_scope(name) {
            target.borrow_mut().define(name, value);
            return Ok(());
        }
        Err(NoNonlocalBinding(name))
    }

    /// Remove a binding following the same frame rules as `bind`.
    pub fn unbind(&mut self, name: Name) -> bool {
        let current = self.current();
        if current.borrow().globals.contains(&name) {
            return self.module.borrow_mut().remove_local(name).is_some();
        }
        if current.borrow().nonlocals.contains(&name) {
            if let Some(target) = self.find_nonlocal_scope(name) {
                return target.borrow_mut().remove_local(name).is_some();
            }
            return false;
        }

        let mut scope = current;
        loop {
            if scope.borrow_mut().remove_local(name).is_some() {
                return true;
            }
            if scope.borrow().kind != ScopeKind::Block {
                return false;
            }
            let parent = scope.borrow().parent();
            match parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }

    /// Mark a name as `global` for the current scope.
    pub fn declare_global(&mut self, name: Name) {
        self.current().borrow_mut().globals.insert(name);
    }

    /// Mark a name as `nonlocal` for the current scope.
    ///
    /// Fails when no enclosing function scope binds the name; class
    /// scopes are skipped in the search and the module scope is not a
    /// valid target.
    pub fn declare_nonlocal(&mut self, name: Name) -> Result<(), NoNonlocalBinding> {
        if self.find_nonlocal_scope(name).is_none() {
            return Err(NoNonlocalBinding(name));
        }
        self.current().borrow_mut().nonlocals.insert(name);
        Ok(())
    }

    /// Nearest enclosing function scope (above the current frame)
    /// that binds `name`, skipping class scopes.
    fn find_nonlocal_scope(&self, name: Name) -> Option<Shared<Scope>> {
        // Skip out of the current frame first: a nonlocal target is
        // never the scope the declaration appears in.
        let mut scope = self.current();
        loop {
            let kind = scope.borrow().kind;
            let parent = scope.borrow().parent();
            if kind != ScopeKind::Block {
                scope = parent?;
                break;
            }
            scope = parent?;
        }
        loop {
            let kind = scope.borrow().kind;
            match kind {
                ScopeKind::Function if scope.borrow().has_local(name) => return Some(scope),
                ScopeKind::Module => return None,
                _ => {}
            }
            let parent = scope.borrow().parent();
            scope = parent?;
        }
    }

    /// The scope a function defined here should capture: the current
    /// scope, except that class scopes are skipped so methods close
    /// over the scope *around* the class body.
    pub fn capture_defining_scope(&self) -> Shared<Scope> {
        let mut scope = self.current();
        while scope.borrow().kind == ScopeKind::Class {
            let parent = scope.borrow().parent();
            match parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
