/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! # Sylva Optimizer
//!
//! Ordered transformation pipeline over a [sylva_ast::Ast]. A [Transformer] owns a list of [Pass]es and applies
//! them one after another. Each pass rewrites the whole tree in pre-order (see [Ast::rewrite]) before the next
//! one starts.
//!
//! The built-in passes live in [passes] and can be instantiated by name via [passes::pass_by_name].

use sylva_ast::{util::RewriteStep, Ast, NodeRef};

pub mod config;
mod error;
pub mod numeric;
pub mod passes;

pub use config::{Config, ConfigFolding};
pub use error::{ArithmeticError, PassError, TransformError};

///A single tree-rewriting pass.
pub trait Pass: Send {
    ///Name the pass is registered and reported under.
    fn name(&self) -> &str;

    ///Called once before the pass rewrites the tree at `root`. Use it to collect tree-wide information.
    fn begin(&mut self, _ast: &Ast, _root: NodeRef) -> Result<(), PassError> {
        Ok(())
    }

    ///If false, neither `node` nor any of its descendants are transformed.
    fn should_transform(&self, _ast: &Ast, _node: NodeRef) -> bool {
        true
    }

    ///Transforms `node`. Either mutates the node in place and returns it, or returns the node that replaces it.
    fn transform(&mut self, _ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        Ok(node)
    }
}

///Ordered list of passes.
#[derive(Default)]
pub struct Transformer {
    passes: Vec<Box<dyn Pass>>,
    pub config: Config,
}

impl Transformer {
    pub fn new(config: Config) -> Self {
        Transformer {
            passes: Vec::new(),
            config,
        }
    }

    ///The default optimization pipeline: constant folding, expression simplification, dead code elimination and
    /// unused variable removal, in that order.
    pub fn optimizing(config: Config) -> Self {
        let mut transformer = Transformer::new(config);
        let folding = passes::ConstantFolding::new(transformer.config.folding.clone());
        transformer.add_pass(folding);
        transformer.add_pass(passes::ExpressionSimplification::default());
        transformer.add_pass(passes::DeadCodeElimination::default());
        transformer.add_pass(passes::UnusedVariableRemoval::default());
        transformer
    }

    ///Appends `pass` to the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn add_boxed_pass(&mut self, pass: Box<dyn Pass>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    ///Removes the first pass called `name`.
    pub fn remove_pass(&mut self, name: &str) -> Option<Box<dyn Pass>> {
        let idx = self.passes.iter().position(|p| p.name() == name)?;
        Some(self.passes.remove(idx))
    }

    pub fn pass_by_name(&self, name: &str) -> Option<&dyn Pass> {
        self.passes
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn clear_passes(&mut self) {
        self.passes.clear();
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    ///Runs all passes in order on `ast`. Updates `ast.root` if a pass replaced the root.
    ///
    /// Stops at the first failing pass. Changes made until then stay applied.
    pub fn run(&mut self, ast: &mut Ast) -> Result<(), TransformError> {
        for pass in self.passes.iter_mut() {
            #[cfg(feature = "log")]
            log::info!("running pass {}", pass.name());

            let root = ast.root;
            pass.begin(ast, root).map_err(|source| TransformError {
                pass: pass.name().to_owned(),
                tag: ast.tag(root).map(|t| t.to_string()).unwrap_or_default(),
                source,
            })?;

            let new_root = ast.rewrite(root, |ast, node| {
                if !pass.should_transform(ast, node) {
                    return Ok(RewriteStep::Skip(node));
                }
                let tag = ast.tag(node);
                match pass.transform(ast, node) {
                    Ok(n) => Ok(RewriteStep::Descend(n)),
                    Err(source) => Err(TransformError {
                        pass: pass.name().to_owned(),
                        tag: tag.map(|t| t.to_string()).unwrap_or_default(),
                        source,
                    }),
                }
            });

            let new_root = match new_root {
                Ok(r) => r,
                Err(e) => {
                    #[cfg(feature = "log")]
                    log::error!("{e}");
                    return Err(e);
                }
            };
            ast.root = new_root;

            if self.config.dump_all {
                #[cfg(feature = "log")]
                log::info!("after {}:\n{}", pass.name(), ast.dump(ast.root));
            }
        }

        if self.config.collect_garbage {
            let _removed = ast.collect_garbage();
            #[cfg(feature = "log")]
            log::debug!("collected {_removed} unreachable nodes");
        }

        Ok(())
    }
}

///Runs the default optimization pipeline (see [Transformer::optimizing]) on `ast`.
pub fn optimize(ast: &mut Ast) -> Result<(), TransformError> {
    Transformer::optimizing(Config::from_env()).run(ast)
}

#[cfg(test)]
mod test {
    use sylva_ast::{Ast, ExprContext, NodeKind, NodeRef, NodeTag};

    use crate::{Config, Pass, PassError, Transformer};

    struct Nop(&'static str);
    impl Pass for Nop {
        fn name(&self) -> &str {
            self.0
        }
    }

    //Renames everything, but never enters function definitions.
    struct NoFunctions;
    impl Pass for NoFunctions {
        fn name(&self) -> &str {
            "no_functions"
        }
        fn should_transform(&self, ast: &Ast, node: NodeRef) -> bool {
            ast[node].tag() != NodeTag::FunctionDef
        }
        fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
            if let NodeKind::Name { id, .. } = &mut ast[node].kind {
                id.push('_');
            }
            Ok(node)
        }
    }

    #[test]
    fn pass_management() {
        let mut t = Transformer::new(Config::default());
        t.add_pass(Nop("a")).add_pass(Nop("b")).add_pass(Nop("a"));
        assert_eq!(t.pass_names(), vec!["a", "b", "a"]);
        assert!(t.remove_pass("a").is_some());
        assert_eq!(t.pass_names(), vec!["b", "a"]);
        assert!(t.pass_by_name("b").is_some());
        assert!(t.remove_pass("c").is_none());
        t.clear_passes();
        assert!(t.pass_names().is_empty());
    }

    #[test]
    fn should_transform_skips_subtree() {
        let _ = pretty_env_logger::try_init();
        let mut ast = Ast::new();
        let inner = ast.new_name("inner", ExprContext::Load);
        let ret = ast.new_return(Some(inner));
        let f = ast.new_function("f", vec![], vec![ret]);
        ast.push_stmt(f);
        let outer = ast.new_name("outer", ExprContext::Load);
        let stmt = ast.new_expr_stmt(outer);
        ast.push_stmt(stmt);

        let mut t = Transformer::default();
        t.add_pass(NoFunctions);
        t.run(&mut ast).unwrap();

        assert_eq!(ast[inner].kind.identifier(), Some("inner"));
        assert_eq!(ast[outer].kind.identifier(), Some("outer_"));
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let mut ast = Ast::new();
        let c = ast.new_constant(1);
        let stmt = ast.new_expr_stmt(c);
        ast.push_stmt(stmt);
        let before = ast.clone();
        Transformer::default().run(&mut ast).unwrap();
        assert!(ast.structural_eq(ast.root, &before, before.root));
    }
}
