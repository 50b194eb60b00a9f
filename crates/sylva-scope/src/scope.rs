/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::fmt::Display;

use ahash::{AHashMap, AHashSet};
use sylva_ast::NodeRef;

use crate::{ScopeRef, SymbolRef};

///What kind of entity a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    ///A name bound directly to a lambda expression.
    Lambda,
    Import,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Lambda => "lambda",
            SymbolKind::Import => "import",
        };
        write!(f, "{name}")
    }
}

///Best-effort type of a symbol or expression. `confidence` is in `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub confidence: f32,
}

impl TypeInfo {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        TypeInfo {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn unknown(confidence: f32) -> Self {
        Self::new(Self::UNKNOWN, confidence)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == Self::UNKNOWN
    }

    ///Merges a newly inferred type into this one. Agreeing types keep the higher confidence, a different type
    /// replaces this one at half its confidence.
    pub fn merge(&mut self, new: TypeInfo) {
        if self.name == new.name {
            self.confidence = self.confidence.max(new.confidence);
        } else {
            self.name = new.name;
            self.confidence = new.confidence * 0.5;
        }
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2})", self.name, self.confidence)
    }
}

///A named entity, with all its definition and use sites.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    ///Nodes that bind the name, for instance the `Name` node of an assignment target, or the `FunctionDef` that
    /// declares a parameter.
    pub definitions: Vec<NodeRef>,
    ///`Name` nodes that read the symbol.
    pub uses: Vec<NodeRef>,
    pub scope: ScopeRef,
    ///Lexical depth of the owning scope.
    pub level: usize,
    pub ty: Option<TypeInfo>,
    pub is_global: bool,
    pub is_nonlocal: bool,
    pub is_builtin: bool,
    ///Set on a forward reference once the definition it refers to is known. Its uses then live on that
    /// symbol.
    pub resolved_to: Option<SymbolRef>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, scope: ScopeRef, level: usize) -> Self {
        Symbol {
            name: name.into(),
            kind,
            definitions: Vec::new(),
            uses: Vec::new(),
            scope,
            level,
            ty: None,
            is_global: false,
            is_nonlocal: false,
            is_builtin: false,
            resolved_to: None,
        }
    }

    pub fn is_used(&self) -> bool {
        !self.uses.is_empty()
    }

    pub fn is_defined(&self) -> bool {
        !self.definitions.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_to.is_some()
    }

    pub fn merge_type(&mut self, ty: TypeInfo) {
        match &mut self.ty {
            Some(old) => old.merge(ty),
            None => self.ty = Some(ty),
        }
    }
}

///A lexical binding context.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub level: usize,
    pub parent: Option<ScopeRef>,
    pub children: Vec<ScopeRef>,
    pub symbols: AHashMap<String, SymbolRef>,
    ///Names declared `global` in this scope.
    pub globals: AHashSet<String>,
    ///Names declared `nonlocal` in this scope.
    pub nonlocals: AHashSet<String>,
}

impl Scope {
    pub fn new(name: impl Into<String>, level: usize, parent: Option<ScopeRef>) -> Self {
        Scope {
            name: name.into(),
            level,
            parent,
            children: Vec::new(),
            symbols: AHashMap::default(),
            globals: AHashSet::default(),
            nonlocals: AHashSet::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
