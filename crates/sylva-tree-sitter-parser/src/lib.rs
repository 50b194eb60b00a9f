/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! # Sylva tree-sitter front-end
//!
//! Converts the concrete syntax tree of [tree_sitter_python] into a [sylva_ast::Ast]. Each upstream node kind
//! has its own conversion routine. Kinds without one become [Extension](NodeKind::Extension) nodes.
//!
//! With [error recovery](ParserConfig::error_recovery) enabled, syntax errors do not abort parsing.
//! Unparseable regions are kept as opaque string constants flagged with `extra.unparsed = true`, and reported
//! next to the partial tree.

use std::{path::Path, sync::Arc};

use ahash::AHashMap;
use error::ParserError;
use sylva_ast::{Ast, Node, NodeKind, NodeRef, Position};
use sylva_common::{Span, SylvaError};
use tree_sitter::Parser;

pub use tree_sitter;
pub use tree_sitter_python;

pub mod error;
mod expr;
mod literal;
mod stmt;

///Custom conversion routine for one upstream node kind. Registered converters take precedence over the
/// built-in ones.
pub trait NodeConverter: Send + Sync {
    fn convert(&self, ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef;
}

impl<F> NodeConverter for F
where
    F: Fn(&mut ParserCtx, &tree_sitter::Node) -> NodeRef + Send + Sync,
{
    fn convert(&self, ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef {
        self(ctx, node)
    }
}

pub type Converters = AHashMap<String, Arc<dyn NodeConverter>>;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    ///Attach comments to the surrounding statements. If false, comments are dropped.
    pub attach_comments: bool,
    ///Keep converting after the first syntax error.
    pub error_recovery: bool,
    ///Prints each syntax error, together with the offending source, to stderr. Can be set via
    /// `SYLVA_REPORT_ERRORS`.
    pub report_errors: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            attach_comments: true,
            error_recovery: true,
            report_errors: false,
        }
    }
}

impl ParserConfig {
    pub fn from_env() -> Self {
        ParserConfig {
            report_errors: std::env::var("SYLVA_REPORT_ERRORS").is_ok(),
            ..Default::default()
        }
    }
}

///Context on the parser, like the current src file, the tree being built, and errors that occurred, but are
/// ignored.
pub struct ParserCtx<'a> {
    pub ast: Ast,
    src: &'a [u8],
    src_file: String,
    errors: Vec<SylvaError<ParserError>>,
    converters: &'a Converters,
    config: &'a ParserConfig,
}

impl<'a> ParserCtx<'a> {
    fn new(
        src: &'a [u8],
        src_file: Option<String>,
        converters: &'a Converters,
        config: &'a ParserConfig,
    ) -> Self {
        ParserCtx {
            ast: Ast::new(),
            src,
            src_file: src_file.unwrap_or_default(),
            errors: Vec::new(),
            converters,
            config,
        }
    }

    ///Creates a new span for `node` on this context.
    pub fn span(&self, node: &tree_sitter::Node) -> Span {
        let from = node.start_position();
        let to = node.end_position();
        Span {
            file: self.src_file.clone(),
            from: (from.row, from.column),
            to: (to.row, to.column),
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
        }
    }

    pub fn position(&self, node: &tree_sitter::Node) -> Position {
        self.span(node).position()
    }

    pub fn get_file(&self) -> Option<&str> {
        if self.src_file.is_empty() {
            None
        } else {
            Some(self.src_file.as_str())
        }
    }

    ///Source text of `node`.
    pub fn text(&self, node: &tree_sitter::Node) -> &'a str {
        node.utf8_text(self.src).unwrap_or_default()
    }

    ///Adds a node of `kind`, positioned at `at`.
    pub fn add(&mut self, kind: NodeKind, at: &tree_sitter::Node) -> NodeRef {
        let position = self.position(at);
        self.ast.insert(Node::new(kind).with_position(position))
    }

    ///Records an error at `node` without aborting the conversion.
    pub fn push_error(&mut self, error: ParserError, node: &tree_sitter::Node, message: impl ToString) {
        #[cfg(feature = "log")]
        log::warn!("{error} at {:?}", node.start_position());
        let err = SylvaError::error_here(error, self.span(node), message);
        self.errors.push(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn converter(&self, kind: &str) -> Option<Arc<dyn NodeConverter>> {
        self.converters.get(kind).cloned()
    }

    ///Converts `node` as an expression.
    pub fn convert_expr(&mut self, node: &tree_sitter::Node) -> NodeRef {
        expr::convert(self, node)
    }

    ///Converts `node` as an assignment target. Names, tuples and lists get the store context.
    pub fn convert_target(&mut self, node: &tree_sitter::Node) -> NodeRef {
        expr::convert_target(self, node)
    }

    ///Converts `node` as a statement.
    pub fn convert_stmt(&mut self, node: &tree_sitter::Node) -> Vec<NodeRef> {
        stmt::convert(self, node)
    }

    ///Converts all statements of a block (or module) node.
    pub fn convert_block(&mut self, node: Option<tree_sitter::Node>) -> Vec<NodeRef> {
        stmt::block(self, node)
    }

    ///Placeholder for a node kind without converter. Keeps the kind name, the source text and the text of all
    /// fields.
    pub fn extension(&mut self, node: &tree_sitter::Node) -> NodeRef {
        let ext = self.add(
            NodeKind::Extension {
                kind: node.kind().to_owned(),
            },
            node,
        );

        let mut fields = sylva_ast::Extra::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                if let Some(field) = cursor.field_name() {
                    let text = self.text(&cursor.node());
                    fields.insert(field.to_owned(), text.into());
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        let text = self.text(node);
        let extra = &mut self.ast[ext].extra;
        extra.insert("text".to_owned(), text.into());
        if !fields.is_empty() {
            extra.insert("fields".to_owned(), fields.into());
        }
        ext
    }

    ///Opaque string constant for source that could not be parsed.
    pub fn unparsed(&mut self, node: &tree_sitter::Node, text: &str) -> NodeRef {
        let constant = self.add(
            NodeKind::Constant {
                value: text.into(),
            },
            node,
        );
        self.ast[constant]
            .extra
            .insert("unparsed".to_owned(), true.into());
        constant
    }
}

///Parses Python source with a fixed set of custom converters.
#[derive(Clone, Default)]
pub struct PythonParser {
    pub config: ParserConfig,
    converters: Converters,
}

impl PythonParser {
    pub fn new(config: ParserConfig) -> Self {
        PythonParser {
            config,
            converters: Converters::default(),
        }
    }

    ///Uses `converter` for all upstream nodes of `kind`.
    pub fn register_converter(&mut self, kind: impl Into<String>, converter: impl NodeConverter + 'static) {
        self.converters.insert(kind.into(), Arc::new(converter));
    }

    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters.extend(converters);
        self
    }

    ///Parses `string`. Returns the [Ast] on success, or a partially parsed AST, and the reported errors, if any
    /// parsing errors happened.
    pub fn parse_string(&self, string: &str) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
        self.parse_data(string.as_bytes(), None)
    }

    ///Parses `file`. Returns the [Ast] on success, or a partially parsed AST, and the reported errors, if any
    /// parsing errors happened.
    pub fn parse_file(
        &self,
        file: impl AsRef<Path>,
    ) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
        let dta = match std::fs::read(file.as_ref()) {
            Ok(dta) => dta,
            Err(e) => {
                let err = SylvaError::new(ParserError::FSError(e.to_string()));
                return Err((Ast::new(), vec![err]));
            }
        };
        if let Err(e) = std::str::from_utf8(&dta) {
            let err = SylvaError::new(ParserError::Utf8ParseError(e));
            return Err((Ast::new(), vec![err]));
        }
        let file_src_str = file.as_ref().to_str().unwrap_or("NonUnicodeFilename");
        self.parse_data(&dta, Some(file_src_str.to_owned()))
    }

    ///Parses `content` as a single expression. The returned tree's root is that expression.
    pub fn parse_expression(&self, content: &str) -> Result<Ast, SylvaError<ParserError>> {
        let data = content.as_bytes();
        let tree = parser()?
            .parse(data, None)
            .ok_or_else(|| SylvaError::new(ParserError::TreeSitterFailed))?;
        let mut ctx = ParserCtx::new(data, None, &self.converters, &self.config);
        stmt::scan_errors(&mut ctx, &tree.root_node());

        let root = tree.root_node();
        let mut cursor = root.walk();
        let stmts: Vec<_> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();
        let expr = match stmts.as_slice() {
            [stmt] if stmt.kind() == "expression_statement" => {
                let mut cursor = stmt.walk();
                let exprs: Vec<_> = stmt
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .collect();
                match exprs.as_slice() {
                    [expr] if !matches!(expr.kind(), "assignment" | "augmented_assignment") => *expr,
                    _ => {
                        return Err(SylvaError::error_here(
                            ParserError::NotAnExpression { count: exprs.len() },
                            ctx.span(stmt),
                            "expected one expression",
                        ))
                    }
                }
            }
            _ => {
                return Err(SylvaError::error_here(
                    ParserError::NotAnExpression { count: stmts.len() },
                    ctx.span(&root),
                    "expected one expression",
                ))
            }
        };

        let converted = ctx.convert_expr(&expr);
        if let Some(err) = ctx.errors.into_iter().next() {
            return Err(err);
        }
        let mut ast = ctx.ast;
        ast.root = converted;
        Ok(ast)
    }

    fn parse_data(
        &self,
        data: &[u8],
        src_file: Option<String>,
    ) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
        let mut parser = match parser() {
            Ok(p) => p,
            Err(e) => return Err((Ast::new(), vec![e])),
        };
        let syn_tree = match parser.parse(data, None) {
            None => {
                return Err((
                    Ast::new(),
                    vec![SylvaError::new(ParserError::TreeSitterFailed)],
                ));
            }
            Some(syntree) => syntree,
        };

        let mut ctx = ParserCtx::new(data, src_file, &self.converters, &self.config);
        let root = syn_tree.root_node();
        stmt::scan_errors(&mut ctx, &root);
        if self.config.report_errors {
            let source = String::from_utf8_lossy(data);
            for err in &ctx.errors {
                err.report(&source);
            }
        }
        if !self.config.error_recovery && ctx.has_errors() {
            return Err((ctx.ast, ctx.errors));
        }

        let body = ctx.convert_block(Some(root));
        let program = ctx.ast.root;
        let position = ctx.position(&root);
        ctx.ast[program].position = Some(position);
        if let NodeKind::Program { body: program_body } = &mut ctx.ast[program].kind {
            *program_body = body;
        }

        #[cfg(feature = "log")]
        log::debug!(
            "parsed {} nodes with {} errors",
            ctx.ast.len(),
            ctx.errors.len()
        );

        if ctx.errors.is_empty() {
            Ok(ctx.ast)
        } else {
            Err((ctx.ast, ctx.errors))
        }
    }
}

///Parses `string` with the default configuration.
pub fn parse_string(string: &str) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
    PythonParser::default().parse_string(string)
}

///Parses `file` with the default configuration.
pub fn parse_file(file: impl AsRef<Path>) -> Result<Ast, (Ast, Vec<SylvaError<ParserError>>)> {
    PythonParser::default().parse_file(file)
}

///Parses `content` as a single expression with the default configuration.
pub fn parse_expression(content: &str) -> Result<Ast, SylvaError<ParserError>> {
    PythonParser::default().parse_expression(content)
}

//load the python tree-sitter grammar / parser
fn parser() -> Result<Parser, SylvaError<ParserError>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SylvaError::new(ParserError::LanguageError(e.to_string())))?;
    Ok(parser)
}
