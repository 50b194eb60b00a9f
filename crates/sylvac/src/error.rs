/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_ast::SerializeError;
use sylva_common::{
    thiserror::{self, Error},
    Details, Diagnostic, ErrorKind, SylvaError,
};
use sylva_opt::TransformError;
use sylva_query::MatchError;
use sylva_scope::SymbolError;
use sylva_tree_sitter_parser::error::ParserError;

///Error type collection of the library surface.
///Mostly transparent errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    ParserError(#[from] SylvaError<ParserError>),
    #[error(transparent)]
    TransformError(#[from] TransformError),
    #[error(transparent)]
    MatchError(#[from] MatchError),
    #[error(transparent)]
    SymbolError(#[from] SymbolError),
    #[error(transparent)]
    SerializeError(#[from] SerializeError),
    #[error("No pass named '{name}' is registered")]
    UnknownPass { name: String },
}

impl Diagnostic for PipelineError {
    fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ParserError(e) => e.kind(),
            PipelineError::TransformError(e) => e.kind(),
            PipelineError::MatchError(e) => e.kind(),
            PipelineError::SymbolError(e) => e.kind(),
            PipelineError::SerializeError(e) => e.kind(),
            PipelineError::UnknownPass { .. } => ErrorKind::Transform,
        }
    }

    fn details(&self) -> Details {
        match self {
            PipelineError::ParserError(e) => e.details(),
            PipelineError::TransformError(e) => e.details(),
            PipelineError::MatchError(e) => e.details(),
            PipelineError::SymbolError(e) => e.details(),
            PipelineError::SerializeError(e) => e.details(),
            PipelineError::UnknownPass { name } => {
                let mut details = Details::new();
                details.insert("pass_name".to_owned(), name.clone().into());
                details
            }
        }
    }
}
