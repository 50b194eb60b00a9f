/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_common::{Details, Diagnostic, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum MatchError {
    #[error("Invalid query pattern: {query}")]
    InvalidQuery { query: String },
    #[error("Invalid regex '{regex}' in pattern: {reason}")]
    InvalidRegex { regex: String, reason: String },
    #[error("Pattern '{pattern}' not registered and invalid query: {source}")]
    UnknownPattern {
        pattern: String,
        source: Box<MatchError>,
    },
    #[error("Error during pattern matching of {pattern} on {tag}: {message}")]
    PredicateFailed {
        pattern: String,
        tag: String,
        message: String,
    },
}

impl Diagnostic for MatchError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Match
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        match self {
            MatchError::InvalidQuery { query } => {
                details.insert("pattern".to_owned(), query.clone().into());
            }
            MatchError::InvalidRegex { regex, .. } => {
                details.insert("pattern".to_owned(), regex.clone().into());
            }
            MatchError::UnknownPattern { pattern, .. } => {
                details.insert("pattern".to_owned(), pattern.clone().into());
            }
            MatchError::PredicateFailed { pattern, tag, .. } => {
                details.insert("pattern".to_owned(), pattern.clone().into());
                details.insert("node_type".to_owned(), tag.clone().into());
            }
        }
        details
    }
}
