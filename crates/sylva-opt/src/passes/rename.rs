/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Renames every name reference `old` to `new`, regardless of scope.

use sylva_ast::{Ast, NodeKind, NodeRef};

use crate::{Pass, PassError};

#[derive(Debug)]
pub struct RenameVariable {
    old: String,
    new: String,
    name: String,
    renamed: usize,
}

impl RenameVariable {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        let (old, new) = (old.into(), new.into());
        RenameVariable {
            name: format!("rename_{old}_to_{new}"),
            old,
            new,
            renamed: 0,
        }
    }

    pub fn renamed(&self) -> usize {
        self.renamed
    }
}

impl Pass for RenameVariable {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        if let NodeKind::Name { id, .. } = &mut ast[node].kind {
            if *id == self.old {
                id.clone_from(&self.new);
                self.renamed += 1;
            }
        }
        Ok(node)
    }
}
