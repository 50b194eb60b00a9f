/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Removes assignment targets that are never read anywhere in the tree.
//!
//! Only plain name targets are considered. If no target is left, the assignment is replaced by its value
//! expression.

use ahash::AHashSet;
use sylva_ast::{Ast, ExprContext, NodeKind, NodeRef};

use crate::{Pass, PassError};

#[derive(Debug, Default)]
pub struct UnusedVariableRemoval {
    used: AHashSet<String>,
}

impl UnusedVariableRemoval {
    pub const NAME: &'static str = "unused_variable_removal";
}

impl Pass for UnusedVariableRemoval {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn begin(&mut self, ast: &Ast, root: NodeRef) -> Result<(), PassError> {
        self.used.clear();
        for node in ast.walk_unique(root) {
            match &ast[node].kind {
                NodeKind::Name { id, ctx } if *ctx != ExprContext::Store => {
                    self.used.insert(id.clone());
                }
                //read-modify-write reads the target
                NodeKind::AugAssign {
                    target: Some(target),
                    ..
                } => {
                    if let Some(id) = ast[*target].kind.identifier() {
                        self.used.insert(id.to_owned());
                    }
                }
                _ => {}
            }
        }

        #[cfg(feature = "log")]
        log::debug!("{} names are read", self.used.len());

        Ok(())
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        let NodeKind::Assign { targets, value } = &ast[node].kind else {
            return Ok(node);
        };
        let value = *value;
        let kept: Vec<NodeRef> = targets
            .iter()
            .copied()
            .filter(|t| match ast[*t].kind.identifier() {
                Some(id) => self.used.contains(id),
                None => true,
            })
            .collect();

        if kept.is_empty() {
            #[cfg(feature = "log")]
            log::trace!("removing assignment {node:?}");
            return Ok(value.unwrap_or(node));
        }

        if let NodeKind::Assign { targets, .. } = &mut ast[node].kind {
            *targets = kept;
        }
        Ok(node)
    }
}
