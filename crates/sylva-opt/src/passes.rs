/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Built-in transformation passes.

use crate::{config::Config, Pass};

mod constant_folding;
mod dead_code;
mod inline_fn;
mod rename;
mod simplify;
mod unused_vars;

pub use constant_folding::ConstantFolding;
pub use dead_code::DeadCodeElimination;
pub use inline_fn::FunctionInlining;
pub use rename::RenameVariable;
pub use simplify::ExpressionSimplification;
pub use unused_vars::UnusedVariableRemoval;

///Names of the built-in passes that can be created without arguments.
pub const BUILTIN_PASSES: &[&str] = &[
    ConstantFolding::NAME,
    DeadCodeElimination::NAME,
    UnusedVariableRemoval::NAME,
    ExpressionSimplification::NAME,
    FunctionInlining::NAME,
];

///Creates the built-in pass called `name`. Besides the names in [BUILTIN_PASSES] this accepts
/// `rename_<old>_to_<new>`, which creates a [RenameVariable] pass.
pub fn pass_by_name(name: &str, config: &Config) -> Option<Box<dyn Pass>> {
    let pass: Box<dyn Pass> = match name {
        ConstantFolding::NAME => Box::new(ConstantFolding::new(config.folding.clone())),
        DeadCodeElimination::NAME => Box::new(DeadCodeElimination::default()),
        UnusedVariableRemoval::NAME => Box::new(UnusedVariableRemoval::default()),
        ExpressionSimplification::NAME => Box::new(ExpressionSimplification::default()),
        FunctionInlining::NAME => Box::new(FunctionInlining::default()),
        other => {
            let (old, new) = other.strip_prefix("rename_")?.split_once("_to_")?;
            if old.is_empty() || new.is_empty() {
                return None;
            }
            Box::new(RenameVariable::new(old, new))
        }
    };
    Some(pass)
}
