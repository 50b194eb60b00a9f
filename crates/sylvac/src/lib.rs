/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! # Sylvac
//!
//! Ties together the parts of sylva into a single library. A [Registry] is created once, and handed to
//! the front-end, matcher and transformer it builds. The free functions cover the common one-shot usage,
//! [Pipeline] the parse → analyse → transform → serialize round trip.
//!
//! ```ignore
//! let registry = Registry::default();
//! let mut ast = sylvac::parse(&registry, "x = 1 + 2").unwrap();
//! sylvac::transform(&registry, &mut ast, &["constant_folding"]).unwrap();
//! let assignments = sylvac::query(&registry, &ast, "assign x").unwrap();
//! ```

use std::{path::Path, sync::Arc};

use ahash::AHashMap;
use sylva_ast::{
    serialize::{self, SerializeConfig},
    Ast, NodeRef,
};
use sylva_common::SylvaError;
use sylva_opt::{passes::pass_by_name, Config, Pass, Transformer};
use sylva_query::{Matcher, Pattern};
use sylva_scope::SymbolTable;
use sylva_tree_sitter_parser::{
    error::ParserError, Converters, NodeConverter, ParserConfig, PythonParser,
};

mod error;
pub use error::PipelineError;

pub use sylva_ast;
pub use sylva_common;
pub use sylva_opt;
pub use sylva_query;
pub use sylva_scope;
pub use sylva_tree_sitter_parser;

///Creates a pass from the transformer configuration.
pub type PassFactory = Arc<dyn Fn(&Config) -> Box<dyn Pass> + Send + Sync>;

///Everything that can be plugged into sylva: named patterns, pass factories and front-end converters,
/// as well as the configuration the parser and transformer are created with.
///
/// Registered passes shadow built-in passes of the same name.
#[derive(Clone, Default)]
pub struct Registry {
    patterns: AHashMap<String, Arc<dyn Pattern>>,
    passes: AHashMap<String, PassFactory>,
    converters: Converters,
    pub parser_config: ParserConfig,
    pub transform_config: Config,
}

impl Registry {
    ///Registry with configuration taken from the environment.
    pub fn from_env() -> Self {
        Registry {
            parser_config: ParserConfig::from_env(),
            transform_config: Config::from_env(),
            ..Default::default()
        }
    }

    pub fn register_pattern(&mut self, name: impl Into<String>, pattern: impl Pattern + 'static) -> &mut Self {
        self.patterns.insert(name.into(), Arc::new(pattern));
        self
    }

    pub fn register_pass(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Config) -> Box<dyn Pass> + Send + Sync + 'static,
    ) -> &mut Self {
        self.passes.insert(name.into(), Arc::new(factory));
        self
    }

    ///Uses `converter` for all upstream nodes of `kind`.
    pub fn register_converter(
        &mut self,
        kind: impl Into<String>,
        converter: impl NodeConverter + 'static,
    ) -> &mut Self {
        self.converters.insert(kind.into(), Arc::new(converter));
        self
    }

    pub fn has_pattern(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    ///Creates the pass called `name`. Registered factories are tried first, then the built-in passes.
    pub fn create_pass(&self, name: &str) -> Option<Box<dyn Pass>> {
        match self.passes.get(name) {
            Some(factory) => Some(factory(&self.transform_config)),
            None => pass_by_name(name, &self.transform_config),
        }
    }

    ///Front-end that knows all registered converters.
    pub fn parser(&self) -> PythonParser {
        PythonParser::new(self.parser_config.clone()).with_converters(self.converters.clone())
    }

    ///Matcher that knows all registered patterns.
    pub fn matcher(&self) -> Matcher {
        Matcher::with_patterns(self.patterns.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    ///Transformer running the passes `names` in order.
    pub fn transformer(&self, names: &[impl AsRef<str>]) -> Result<Transformer, PipelineError> {
        let mut transformer = Transformer::new(self.transform_config.clone());
        for name in names {
            let name = name.as_ref();
            let pass = self
                .create_pass(name)
                .ok_or_else(|| PipelineError::UnknownPass {
                    name: name.to_owned(),
                })?;
            transformer.add_boxed_pass(pass);
        }
        Ok(transformer)
    }
}

///Parses `source`. On syntax errors the best-effort tree is returned next to the errors.
pub fn parse(registry: &Registry, source: &str) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
    registry.parser().parse_string(source)
}

pub fn parse_file(
    registry: &Registry,
    file: impl AsRef<Path>,
) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
    registry.parser().parse_file(file)
}

///Builds the symbol table of `ast`.
pub fn analyze(ast: &Ast) -> Result<SymbolTable, PipelineError> {
    let mut table = SymbolTable::new();
    table.analyze(ast, ast.root)?;
    Ok(table)
}

///Runs the passes `names` over `ast`, in order.
pub fn transform(
    registry: &Registry,
    ast: &mut Ast,
    names: &[impl AsRef<str>],
) -> Result<(), PipelineError> {
    registry.transformer(names)?.run(ast)?;
    Ok(())
}

///All nodes of `ast` matching the named pattern or query `pattern`, in pre-order.
pub fn query(registry: &Registry, ast: &Ast, pattern: &str) -> Result<Vec<NodeRef>, PipelineError> {
    let matches = registry.matcher().find_matches(ast, ast.root, pattern)?;
    Ok(matches)
}

pub fn serialize(ast: &Ast) -> Result<String, PipelineError> {
    Ok(serialize::to_string(ast, &SerializeConfig::from_env())?)
}

pub fn deserialize(text: &str) -> Result<Ast, PipelineError> {
    Ok(serialize::from_str(text)?)
}

///Result of a [Pipeline] run.
pub struct PipelineOutput {
    pub ast: Ast,
    ///Symbols of the transformed tree.
    pub symbols: SymbolTable,
    ///The transformed tree in the exchange format.
    pub text: String,
}

///An executable pipeline. There are always four steps:
/// 1. _somehow_ get an AST,
/// 2. run the configured passes,
/// 3. analyse the symbols of the result,
/// 4. serialize the result.
pub struct Pipeline {
    pub registry: Registry,
    ///Passes that are executed in order.
    pub passes: Vec<String>,
    pub serialize_config: SerializeConfig,
}

impl Pipeline {
    pub fn new(registry: Registry) -> Self {
        Pipeline {
            registry,
            passes: Vec::new(),
            serialize_config: SerializeConfig::from_env(),
        }
    }

    ///Pipeline that runs the default optimization passes.
    pub fn optimizing(registry: Registry) -> Self {
        let passes = [
            sylva_opt::passes::ConstantFolding::NAME,
            sylva_opt::passes::ExpressionSimplification::NAME,
            sylva_opt::passes::DeadCodeElimination::NAME,
            sylva_opt::passes::UnusedVariableRemoval::NAME,
        ];
        Pipeline {
            passes: passes.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::new(registry)
        }
    }

    pub fn with_pass(mut self, name: impl Into<String>) -> Self {
        self.passes.push(name.into());
        self
    }

    ///Takes an already prepared AST and runs the pipeline on it.
    pub fn execute_on_ast(&self, mut ast: Ast) -> Result<PipelineOutput, PipelineError> {
        self.registry.transformer(&self.passes)?.run(&mut ast)?;
        let symbols = analyze(&ast)?;
        let text = serialize::to_string(&ast, &self.serialize_config)?;
        Ok(PipelineOutput { ast, symbols, text })
    }

    ///Parses `source` and runs the pipeline. Fails with the first syntax error, if there is any.
    pub fn execute_on_str(&self, source: &str) -> Result<PipelineOutput, PipelineError> {
        let ast = parse(&self.registry, source).map_err(|(_, mut errors)| {
            log::error!("there where {} errors while parsing source", errors.len());
            errors.remove(0)
        })?;
        self.execute_on_ast(ast)
    }

    ///Parses `file` and runs the pipeline. Fails with the first syntax error, if there is any.
    pub fn execute_on_file(&self, file: &Path) -> Result<PipelineOutput, PipelineError> {
        let ast = parse_file(&self.registry, file).map_err(|(_, mut errors)| {
            log::error!("there where {} errors while parsing {file:?}", errors.len());
            errors.remove(0)
        })?;
        self.execute_on_ast(ast)
    }
}
