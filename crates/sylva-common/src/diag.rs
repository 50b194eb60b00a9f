/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::fmt::Display;

use serde_json::{json, Value};

///Structured, ordered detail map attached to every error.
pub type Details = serde_json::Map<String, Value>;

///The error families a sylva operation can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ///Front-end error, tagged with a source position.
    Parse,
    ///Pipeline error, tagged with the pass name and node tag.
    Transform,
    ///Matcher error, tagged with the pattern and node tag.
    Match,
    ///Scope resolver error, tagged with the symbol and scope.
    Symbol,
    ///Exchange format error, tagged with the format and node tag.
    Serialize,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "PARSE_ERROR",
            ErrorKind::Transform => "TRANSFORM_ERROR",
            ErrorKind::Match => "MATCH_ERROR",
            ErrorKind::Symbol => "SYMBOL_ERROR",
            ErrorKind::Serialize => "SERIALIZE_ERROR",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Transform => "TransformError",
            ErrorKind::Match => "MatchError",
            ErrorKind::Symbol => "SymbolError",
            ErrorKind::Serialize => "SerializeError",
        };
        write!(f, "{name}")
    }
}

///Implemented by all error types of the sylva crates. Exposes the error as
/// `{kind, message, details}`, where `message` is the [Display] implementation.
pub trait Diagnostic: std::error::Error {
    fn kind(&self) -> ErrorKind;

    ///Tag specific details, like the position of a parse error, or the pass-name of a transform error.
    fn details(&self) -> Details {
        Details::new()
    }

    fn code(&self) -> &'static str {
        self.kind().code()
    }

    ///Dictionary representation of the error.
    fn to_value(&self) -> Value {
        json!({
            "type": self.kind().to_string(),
            "code": self.code(),
            "message": self.to_string(),
            "details": self.details(),
        })
    }
}
