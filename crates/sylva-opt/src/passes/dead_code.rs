/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Dead code elimination. Replaces statements that follow a terminator (`return`, `break`, `continue`, `raise`)
//! in the same statement list with `pass`.

use sylva_ast::{Ast, Node, NodeKind, NodeRef};

use crate::{Pass, PassError};

#[derive(Debug, Default)]
pub struct DeadCodeElimination {
    removed: usize,
}

impl DeadCodeElimination {
    pub const NAME: &'static str = "dead_code_elimination";

    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl Pass for DeadCodeElimination {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        let schema = ast[node].schema();
        for list in schema.lists.iter().filter(|l| l.statements) {
            let Some(stmts) = ast[node].kind.list(list.name).map(|l| l.to_vec()) else {
                continue;
            };

            let mut reachable = true;
            for (idx, stmt) in stmts.into_iter().enumerate() {
                if reachable {
                    reachable = !ast[stmt].kind.is_terminator();
                    continue;
                }
                if matches!(ast[stmt].kind, NodeKind::Pass {}) {
                    continue;
                }

                let mut pass = Node::new(NodeKind::Pass {});
                pass.position = ast[stmt].position.clone();
                let pass = ast.insert(pass);
                if let Some(slot) = ast[node].kind.list_mut(list.name).and_then(|l| l.get_mut(idx)) {
                    *slot = pass;
                }
                self.removed += 1;
            }
        }

        Ok(node)
    }
}
