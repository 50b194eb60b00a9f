/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Constant folding.
//!
//! Each outermost [BinOp](NodeKind::BinOp) is folded bottom-up in one go. That way a single run folds
//! arbitrarily nested literal expressions, and a second run has nothing left to do.

use sylva_ast::{schema::SlotIndex, Ast, Node, NodeKind, NodeRef};

use crate::{config::ConfigFolding, numeric::eval_binop, Pass, PassError};

#[derive(Debug, Default)]
pub struct ConstantFolding {
    config: ConfigFolding,
    folded: usize,
}

impl ConstantFolding {
    pub const NAME: &'static str = "constant_folding";

    pub fn new(config: ConfigFolding) -> Self {
        ConstantFolding { config, folded: 0 }
    }

    ///Number of binary operations folded so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    //Tries to fold the single `binop`, whose operands are already folded.
    fn fold_one(&self, ast: &mut Ast, binop: NodeRef) -> Result<Option<NodeRef>, PassError> {
        let NodeKind::BinOp {
            left: Some(left),
            right: Some(right),
            op,
        } = &ast[binop].kind
        else {
            return Ok(None);
        };
        let (Some(l), Some(r)) = (ast[*left].kind.literal(), ast[*right].kind.literal()) else {
            return Ok(None);
        };

        let Some(value) = eval_binop(op, l, r, &self.config)? else {
            return Ok(None);
        };

        let mut folded = Node::new(NodeKind::Constant { value });
        folded.position = ast[binop].position.clone();
        Ok(Some(ast.insert(folded)))
    }
}

impl Pass for ConstantFolding {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        if !matches!(ast[node].kind, NodeKind::BinOp { .. }) {
            return Ok(node);
        }

        //collect the nested BinOp chain in pre-order, together with the slot each one sits in
        let mut chain: Vec<(Option<(NodeRef, SlotIndex)>, NodeRef)> = Vec::new();
        let mut stack = vec![(None, node)];
        while let Some((parent, binop)) = stack.pop() {
            chain.push((parent, binop));
            for (slot, child) in ast[binop].kind.child_slots() {
                if matches!(ast[child].kind, NodeKind::BinOp { .. }) {
                    stack.push((Some((binop, slot)), child));
                }
            }
        }

        let mut result = node;
        for (parent, binop) in chain.into_iter().rev() {
            let Some(folded) = self.fold_one(ast, binop)? else {
                continue;
            };
            self.folded += 1;
            match parent {
                Some((parent, slot)) => {
                    ast[parent].kind.set_child(slot, folded);
                }
                None => result = folded,
            }
        }

        #[cfg(feature = "log")]
        if result != node {
            log::trace!(
                "folded {:?} to {}",
                node,
                ast[result]
                    .kind
                    .literal()
                    .map(|l| l.to_string())
                    .unwrap_or_default()
            );
        }

        Ok(result)
    }
}
