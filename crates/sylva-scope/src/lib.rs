/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! # Sylva Scope
//!
//! Symbol table and scope resolver. [SymbolTable::analyze] walks a [sylva_ast::Ast] once and builds a tree of
//! [Scope]s, each holding the [Symbol]s bound in it, including their definition and use sites and a best-effort
//! type.

use std::{fmt::Display, ops::Index};

use ahash::AHashSet;
use lazy_static::lazy_static;
use slotmap::{new_key_type, SlotMap};
use sylva_ast::NodeRef;

mod analyze;
mod error;
pub mod infer;
mod scope;

pub use error::SymbolError;
pub use scope::{Scope, Symbol, SymbolKind, TypeInfo};

new_key_type! {
    pub struct ScopeRef;
    pub struct SymbolRef;
}

lazy_static! {
    ///Names that are always available in the root scope.
    pub static ref BUILTINS: AHashSet<&'static str> = [
        "abs", "all", "any", "bool", "bytes", "callable", "chr", "dict", "dir", "enumerate", "filter", "float",
        "format", "getattr", "hasattr", "hash", "id", "input", "int", "isinstance", "issubclass", "iter", "len",
        "list", "map", "max", "min", "next", "object", "open", "ord", "pow", "print", "range", "repr", "reversed",
        "round", "set", "setattr", "slice", "sorted", "str", "sum", "super", "tuple", "type", "zip", "None",
        "True", "False", "Exception", "ValueError", "TypeError", "KeyError", "IndexError", "RuntimeError",
        "StopIteration", "NotImplementedError", "AttributeError", "__name__", "__file__",
    ]
    .into_iter()
    .collect();
}

///Scope tree of one analysed program.
pub struct SymbolTable {
    scopes: SlotMap<ScopeRef, Scope>,
    symbols: SlotMap<SymbolRef, Symbol>,
    root: ScopeRef,
    current: ScopeRef,
    ///Nodes that were already analysed.
    visited: AHashSet<NodeRef>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut scopes = SlotMap::with_key();
        let root = scopes.insert(Scope::new("global", 0, None));
        SymbolTable {
            scopes,
            symbols: SlotMap::with_key(),
            root,
            current: root,
            visited: AHashSet::default(),
        }
    }

    pub fn root_scope(&self) -> ScopeRef {
        self.root
    }

    pub fn current_scope(&self) -> ScopeRef {
        self.current
    }

    pub fn scope(&self, scope: ScopeRef) -> Option<&Scope> {
        self.scopes.get(scope)
    }

    pub fn symbol(&self, symbol: SymbolRef) -> Option<&Symbol> {
        self.symbols.get(symbol)
    }

    ///All scopes in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeRef, &Scope)> + '_ {
        self.scopes.iter()
    }

    ///All symbols of all scopes.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolRef, &Symbol)> + '_ {
        self.symbols.iter()
    }

    ///Opens a child scope of the current scope and makes it current.
    pub fn enter_scope(&mut self, name: impl Into<String>) -> ScopeRef {
        let level = self.scopes[self.current].level + 1;
        let new = self
            .scopes
            .insert(Scope::new(name, level, Some(self.current)));
        self.scopes[self.current].children.push(new);
        self.current = new;
        new
    }

    ///Makes the parent of the current scope current again.
    pub fn exit_scope(&mut self) -> Result<ScopeRef, SymbolError> {
        let scope = self
            .scopes
            .get(self.current)
            .ok_or_else(|| SymbolError::UnknownScope {
                scope: format!("{:?}", self.current),
                symbol: None,
            })?;
        match scope.parent {
            Some(parent) => {
                self.current = parent;
                Ok(parent)
            }
            None => Err(SymbolError::ExitRootScope {
                scope: scope.name.clone(),
                symbol: None,
            }),
        }
    }

    ///Resolves `name` starting at `scope` and walking up to the root. The first match wins.
    pub fn lookup_from(&self, scope: ScopeRef, name: &str) -> Option<SymbolRef> {
        let mut next = Some(scope);
        while let Some(scope) = next {
            let s = self.scopes.get(scope)?;
            if s.globals.contains(name) {
                return self.scopes[self.root].symbols.get(name).copied();
            }
            if let Some(sym) = s.symbols.get(name) {
                return Some(self.resolved(*sym));
            }
            next = s.parent;
        }
        None
    }

    ///Follows a resolved forward reference to its definition. Any other symbol is returned as is.
    pub fn resolved(&self, mut symbol: SymbolRef) -> SymbolRef {
        while let Some(target) = self.symbols.get(symbol).and_then(|s| s.resolved_to) {
            symbol = target;
        }
        symbol
    }

    ///Resolves `name` from the current scope.
    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.lookup_from(self.current, name)
    }

    ///Marks `name` as `global` in the current scope.
    pub fn declare_global(&mut self, name: impl Into<String>) {
        self.scopes[self.current].globals.insert(name.into());
    }

    ///Marks `name` as `nonlocal` in the current scope.
    pub fn declare_nonlocal(&mut self, name: impl Into<String>) {
        self.scopes[self.current].nonlocals.insert(name.into());
    }

    //Finds the symbol `name` in `scope`, or creates a new one.
    fn symbol_in(&mut self, scope: ScopeRef, name: &str, kind: SymbolKind) -> SymbolRef {
        if let Some(sym) = self.scopes[scope].symbols.get(name) {
            return *sym;
        }
        let level = self.scopes[scope].level;
        let sym = self
            .symbols
            .insert(Symbol::new(name, kind, scope, level));
        self.scopes[scope].symbols.insert(name.to_owned(), sym);
        sym
    }

    //Scope a definition of `name` in the current scope binds in.
    fn binding_scope(&self, name: &str) -> (ScopeRef, bool, bool) {
        let current = &self.scopes[self.current];
        if current.globals.contains(name) {
            return (self.root, true, false);
        }
        if current.nonlocals.contains(name) {
            let mut next = current.parent;
            while let Some(scope) = next {
                let s = &self.scopes[scope];
                if s.is_root() {
                    break;
                }
                if s.symbols.contains_key(name) {
                    return (scope, false, true);
                }
                next = s.parent;
            }
            //no enclosing binding, defined locally
            return (self.current, false, true);
        }
        (self.current, false, false)
    }

    ///Records a definition of `name` at `node`. Binds in the current scope, unless `name` was declared `global`
    /// or `nonlocal` there.
    pub fn define(
        &mut self,
        name: &str,
        kind: SymbolKind,
        node: NodeRef,
        ty: Option<TypeInfo>,
    ) -> SymbolRef {
        let (scope, is_global, is_nonlocal) = self.binding_scope(name);
        let sym = self.symbol_in(scope, name, kind);
        let symbol = &mut self.symbols[sym];
        if symbol.definitions.is_empty() {
            symbol.kind = kind;
        }
        symbol.definitions.push(node);
        symbol.is_global |= is_global;
        symbol.is_nonlocal |= is_nonlocal;
        if let Some(ty) = ty {
            symbol.merge_type(ty);
        }
        sym
    }

    ///Records a read of `name` at `node`. If `name` can not be resolved, a placeholder symbol is created. Builtins
    /// are placed in the root scope.
    pub fn add_use(&mut self, name: &str, node: NodeRef) -> SymbolRef {
        let sym = match self.lookup(name) {
            Some(sym) => sym,
            None if BUILTINS.contains(name) => {
                let sym = self.symbol_in(self.root, name, SymbolKind::Variable);
                self.symbols[sym].is_builtin = true;
                sym
            }
            None => {
                let (scope, _, _) = self.binding_scope(name);
                self.symbol_in(scope, name, SymbolKind::Variable)
            }
        };
        self.symbols[sym].uses.push(node);
        sym
    }

    //Placeholders in inner scopes whose name got defined in an enclosing scope later on are pointed at that
    // definition, which takes over their uses. The placeholder stays in its scope.
    fn resolve_forward_references(&mut self) {
        let placeholders: Vec<SymbolRef> = self
            .symbols
            .iter()
            .filter(|(_, s)| {
                !s.is_defined() && !s.is_builtin && !s.is_resolved() && s.level > 0
            })
            .map(|(k, _)| k)
            .collect();

        for placeholder in placeholders {
            let (name, scope) = {
                let s = &self.symbols[placeholder];
                (s.name.clone(), s.scope)
            };
            let Some(target) = self.enclosing_definition(scope, &name) else {
                continue;
            };
            let uses = std::mem::take(&mut self.symbols[placeholder].uses);
            self.symbols[placeholder].resolved_to = Some(target);
            self.symbols[target].uses.extend(uses);

            #[cfg(feature = "log")]
            log::trace!("resolved forward reference to {name} in {}", self.scopes[scope].name);
        }
    }

    //First defined symbol `name` in the scopes enclosing `scope`.
    fn enclosing_definition(&self, scope: ScopeRef, name: &str) -> Option<SymbolRef> {
        let mut next = self.scopes[scope].parent;
        while let Some(scope) = next {
            let s = &self.scopes[scope];
            if let Some(sym) = s.symbols.get(name) {
                let sym = self.resolved(*sym);
                if self.symbols[sym].is_defined() {
                    return Some(sym);
                }
            }
            next = s.parent;
        }
        None
    }

    ///Variables that are defined, but never read.
    pub fn unused_variables(&self) -> Vec<SymbolRef> {
        self.symbols
            .iter()
            .filter(|(_, s)| {
                matches!(s.kind, SymbolKind::Variable | SymbolKind::Lambda)
                    && !s.is_used()
                    && !s.is_builtin
                    && s.is_defined()
            })
            .map(|(k, _)| k)
            .collect()
    }

    ///Symbols that are read, but never defined.
    pub fn undefined_variables(&self) -> Vec<SymbolRef> {
        self.symbols
            .iter()
            .filter(|(_, s)| !s.is_defined() && !s.is_builtin && !s.is_resolved())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn symbols_of_kind(&self, kind: SymbolKind) -> Vec<SymbolRef> {
        self.symbols
            .iter()
            .filter(|(_, s)| s.kind == kind && !s.is_resolved())
            .map(|(k, _)| k)
            .collect()
    }

    ///Symbols bound directly in `scope`, sorted by name.
    pub fn scope_symbols(&self, scope: ScopeRef) -> Vec<SymbolRef> {
        let Some(scope) = self.scopes.get(scope) else {
            return Vec::new();
        };
        let mut symbols: Vec<_> = scope.symbols.iter().collect();
        symbols.sort_by(|a, b| a.0.cmp(b.0));
        symbols.into_iter().map(|(_, s)| *s).collect()
    }
}

impl Index<ScopeRef> for SymbolTable {
    type Output = Scope;
    fn index(&self, index: ScopeRef) -> &Self::Output {
        &self.scopes[index]
    }
}

impl Index<SymbolRef> for SymbolTable {
    type Output = Symbol;
    fn index(&self, index: SymbolRef) -> &Self::Output {
        &self.symbols[index]
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Symbol Table:")?;
        let mut stack = vec![self.root];
        while let Some(scope) = stack.pop() {
            let s = &self.scopes[scope];
            let indent = "  ".repeat(s.level);
            writeln!(f, "{indent}Scope: {}", s.name)?;
            for sym in self.scope_symbols(scope) {
                let sym = &self.symbols[sym];
                write!(
                    f,
                    "{indent}  {} ({}): {} defs, {} uses",
                    sym.name,
                    sym.kind,
                    sym.definitions.len(),
                    sym.uses.len()
                )?;
                if let Some(ty) = &sym.ty {
                    write!(f, ", type {ty}")?;
                }
                if sym.is_builtin {
                    write!(f, ", builtin")?;
                }
                if let Some(target) = sym.resolved_to {
                    write!(f, ", resolved to {}", self.scopes[self.symbols[target].scope].name)?;
                }
                writeln!(f)?;
            }
            stack.extend(s.children.iter().rev());
        }
        Ok(())
    }
}
