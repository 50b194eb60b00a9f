/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::sync::Arc;

use ahash::AHashMap;
use sylva_ast::{Ast, NodeRef, NodeTag};

use crate::{
    compile_query,
    patterns::{AssignPattern, CallPattern, Captures, NameMatch, NamePattern, NodePattern, Pattern},
    MatchError,
};

///A node that matched, together with the pattern's captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub node: NodeRef,
    pub captures: Captures,
}

///Runs patterns over trees. Named patterns are looked up before a string is compiled as a query.
///
/// All searches are deterministic pre-order walks. A matching node's children are still visited.
#[derive(Default, Clone)]
pub struct Matcher {
    patterns: AHashMap<String, Arc<dyn Pattern>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    ///Creates a matcher that already knows `patterns`.
    pub fn with_patterns(
        patterns: impl IntoIterator<Item = (String, Arc<dyn Pattern>)>,
    ) -> Self {
        Matcher {
            patterns: patterns.into_iter().collect(),
        }
    }

    pub fn register_pattern(&mut self, name: impl Into<String>, pattern: impl Pattern + 'static) {
        self.patterns.insert(name.into(), Arc::new(pattern));
    }

    pub fn pattern(&self, name: &str) -> Option<&Arc<dyn Pattern>> {
        self.patterns.get(name)
    }

    ///Resolves `pattern` against the registered patterns first, and compiles it as a query otherwise.
    pub fn resolve(&self, pattern: &str) -> Result<Arc<dyn Pattern>, MatchError> {
        if let Some(p) = self.patterns.get(pattern) {
            return Ok(p.clone());
        }
        compile_query(pattern)
            .map(Arc::from)
            .map_err(|e| MatchError::UnknownPattern {
                pattern: pattern.to_owned(),
                source: Box::new(e),
            })
    }

    ///All nodes below (and including) `root` that match the named pattern or query `pattern`.
    pub fn find_matches(
        &self,
        ast: &Ast,
        root: NodeRef,
        pattern: &str,
    ) -> Result<Vec<NodeRef>, MatchError> {
        let resolved = self.resolve(pattern)?;
        self.find_pattern(ast, root, resolved.as_ref())
    }

    pub fn find_pattern(
        &self,
        ast: &Ast,
        root: NodeRef,
        pattern: &dyn Pattern,
    ) -> Result<Vec<NodeRef>, MatchError> {
        let mut matches = Vec::new();
        for node in ast.walk(root) {
            if pattern.matches(ast, node)? {
                matches.push(node);
            }
        }
        #[cfg(feature = "log")]
        log::debug!("{pattern:?} matched {} nodes", matches.len());
        Ok(matches)
    }

    ///Like [find_pattern](Self::find_pattern), but also collects the captures of each match.
    pub fn find_captures(
        &self,
        ast: &Ast,
        root: NodeRef,
        pattern: &dyn Pattern,
    ) -> Result<Vec<Match>, MatchError> {
        let mut matches = Vec::new();
        for node in ast.walk(root) {
            if pattern.matches(ast, node)? {
                matches.push(Match {
                    node,
                    captures: pattern.capture(ast, node),
                });
            }
        }
        Ok(matches)
    }

    ///All nodes for which `predicate` returns true.
    pub fn query(
        &self,
        ast: &Ast,
        root: NodeRef,
        mut predicate: impl FnMut(&Ast, NodeRef) -> bool,
    ) -> Vec<NodeRef> {
        ast.walk(root).filter(|n| predicate(ast, *n)).collect()
    }

    pub fn find_functions(&self, ast: &Ast, root: NodeRef) -> Vec<NodeRef> {
        ast.find_all(root, NodeTag::FunctionDef)
    }

    pub fn find_calls(
        &self,
        ast: &Ast,
        root: NodeRef,
        func_name: Option<&str>,
    ) -> Result<Vec<NodeRef>, MatchError> {
        let pattern = CallPattern::new(exact_or_any(func_name));
        self.find_pattern(ast, root, &pattern)
    }

    pub fn find_assignments(
        &self,
        ast: &Ast,
        root: NodeRef,
        target_name: Option<&str>,
    ) -> Result<Vec<NodeRef>, MatchError> {
        let pattern = AssignPattern {
            target: exact_or_any(target_name),
            value_tag: None,
        };
        self.find_pattern(ast, root, &pattern)
    }

    pub fn find_names(
        &self,
        ast: &Ast,
        root: NodeRef,
        name: Option<&str>,
    ) -> Result<Vec<NodeRef>, MatchError> {
        let pattern = NamePattern {
            name: exact_or_any(name),
        };
        self.find_pattern(ast, root, &pattern)
    }

    ///All nodes of `tag`.
    pub fn find_tag(&self, ast: &Ast, root: NodeRef, tag: NodeTag) -> Result<Vec<NodeRef>, MatchError> {
        self.find_pattern(ast, root, &NodePattern::new(tag))
    }

    pub fn count_matches(&self, ast: &Ast, root: NodeRef, pattern: &str) -> Result<usize, MatchError> {
        self.find_matches(ast, root, pattern).map(|m| m.len())
    }

    ///True if any node matches. Stops at the first match.
    pub fn has_match(&self, ast: &Ast, root: NodeRef, pattern: &str) -> Result<bool, MatchError> {
        let resolved = self.resolve(pattern)?;
        for node in ast.walk(root) {
            if resolved.matches(ast, node)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn exact_or_any(name: Option<&str>) -> NameMatch {
    match name {
        Some(n) => NameMatch::Exact(n.to_owned()),
        None => NameMatch::Any,
    }
}
