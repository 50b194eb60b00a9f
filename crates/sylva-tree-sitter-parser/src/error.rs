/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::str::Utf8Error;

use sylva_common::{Details, Diagnostic, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserError {
    #[error("Could not run tree-sitter")]
    TreeSitterFailed,
    #[error("Could not load the python grammar: {0}")]
    LanguageError(String),
    #[error("File Error occured: {0}")]
    FSError(String),
    #[error("Syntax error, could not parse \"{text}\"")]
    SyntaxError { text: String },
    #[error("Syntax error, missing {kind}")]
    Missing { kind: String },
    #[error("Invalid {kind} literal \"{text}\"")]
    InvalidLiteral { kind: String, text: String },
    #[error("Expected a single expression, found {count}")]
    NotAnExpression { count: usize },
    #[error("UTF8 parser error: {0}")]
    Utf8ParseError(Utf8Error),
}

impl Diagnostic for ParserError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Parse
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        match self {
            ParserError::SyntaxError { text } => {
                details.insert("text".to_owned(), text.clone().into());
            }
            ParserError::Missing { kind } => {
                details.insert("node_type".to_owned(), kind.clone().into());
            }
            ParserError::InvalidLiteral { kind, text } => {
                details.insert("node_type".to_owned(), kind.clone().into());
                details.insert("text".to_owned(), text.clone().into());
            }
            _ => {}
        }
        details
    }
}
