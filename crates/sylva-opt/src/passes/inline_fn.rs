/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Inlines calls to trivial functions.
//!
//! A function is trivial if it is defined at module level and its body is a single `return <expr>`. A call
//! `f(...)` whose callee is the plain name of such a function is replaced by a copy of that expression.
//! Arguments are not substituted. Functions that reach themselves through the calls in their returned
//! expression are never inlined, and the definitions themselves are left untouched.

use ahash::{AHashMap, AHashSet};
use sylva_ast::{Ast, NodeKind, NodeRef};

use crate::{Pass, PassError};

#[derive(Debug, Default)]
pub struct FunctionInlining {
    functions: AHashMap<String, NodeRef>,
    definitions: AHashSet<NodeRef>,
    inlined: usize,
}

impl FunctionInlining {
    pub const NAME: &'static str = "function_inlining";

    pub fn inlined(&self) -> usize {
        self.inlined
    }

    //Returns the returned expression, if `def` is trivial.
    fn trivial_body(ast: &Ast, def: NodeRef) -> Option<(&str, NodeRef)> {
        let NodeKind::FunctionDef { name, body, .. } = &ast[def].kind else {
            return None;
        };
        let [stmt] = body.as_slice() else {
            return None;
        };
        match &ast[*stmt].kind {
            NodeKind::Return { value: Some(value) } => Some((name, *value)),
            _ => None,
        }
    }

    ///Names of the functions called by plain name within `value`.
    fn callees<'a>(ast: &'a Ast, value: NodeRef) -> AHashSet<&'a str> {
        ast.walk_unique(value)
            .filter_map(|n| match &ast[n].kind {
                NodeKind::Call { func: Some(f), .. } => ast[*f].kind.identifier(),
                _ => None,
            })
            .collect()
    }

    ///Functions that can reach themselves by inlining.
    fn recursive_functions(&self, ast: &Ast) -> Vec<String> {
        let calls: AHashMap<&str, AHashSet<&str>> = self
            .functions
            .iter()
            .map(|(name, value)| {
                let mut callees = Self::callees(ast, *value);
                callees.retain(|c| self.functions.contains_key(*c));
                (name.as_str(), callees)
            })
            .collect();

        let mut recursive = Vec::new();
        for (start, callees) in &calls {
            let mut seen = AHashSet::default();
            let mut stack: Vec<&str> = callees.iter().copied().collect();
            while let Some(next) = stack.pop() {
                if next == *start {
                    recursive.push(start.to_string());
                    break;
                }
                if seen.insert(next) {
                    if let Some(further) = calls.get(next) {
                        stack.extend(further.iter().copied());
                    }
                }
            }
        }
        recursive
    }

    fn drop_recursive(&mut self, ast: &Ast) {
        for name in self.recursive_functions(ast) {
            #[cfg(feature = "log")]
            log::debug!("not inlining recursive function {name}");
            self.functions.remove(&name);
        }
    }
}

impl Pass for FunctionInlining {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn begin(&mut self, ast: &Ast, root: NodeRef) -> Result<(), PassError> {
        self.functions.clear();
        self.definitions.clear();
        let Some(NodeKind::Program { body }) = ast.kind(root) else {
            return Ok(());
        };
        for stmt in body {
            match Self::trivial_body(ast, *stmt) {
                Some((name, value)) => {
                    self.functions.insert(name.to_owned(), value);
                }
                None => {
                    //a later non-trivial definition shadows an earlier trivial one
                    if let Some(name) = ast[*stmt].kind.def_name() {
                        self.functions.remove(name);
                    }
                }
            }
        }
        self.drop_recursive(ast);
        //the inlined expressions stay as they are in their definitions
        self.definitions = body
            .iter()
            .filter(|stmt| {
                Self::trivial_body(ast, **stmt)
                    .map(|(name, value)| self.functions.get(name) == Some(&value))
                    .unwrap_or(false)
            })
            .copied()
            .collect();

        #[cfg(feature = "log")]
        log::debug!("{} functions can be inlined", self.functions.len());

        Ok(())
    }

    fn should_transform(&self, _ast: &Ast, node: NodeRef) -> bool {
        !self.definitions.contains(&node)
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        let NodeKind::Call {
            func: Some(func), ..
        } = &ast[node].kind
        else {
            return Ok(node);
        };
        let Some(callee) = ast[*func].kind.identifier() else {
            return Ok(node);
        };

        match self.functions.get(callee) {
            Some(value) => {
                let value = *value;
                self.inlined += 1;
                Ok(ast.deep_clone(value))
            }
            None => Ok(node),
        }
    }
}
