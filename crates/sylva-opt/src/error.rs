/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use sylva_common::{
    thiserror::{self, Error},
    Details, Diagnostic, ErrorKind,
};

///Failures while evaluating constant expressions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArithmeticError {
    #[error("{op}: division by zero")]
    DivisionByZero { op: String },
    #[error("integer overflow in {lhs} {op} {rhs}")]
    Overflow {
        lhs: String,
        op: String,
        rhs: String,
    },
}

///Error of a single pass on a single node.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PassError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error("{0}")]
    Any(String),
}

///A pass failed. Carries the pass name and the tag of the node it failed on.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Transformation pass '{pass}' failed on {tag}: {source}")]
pub struct TransformError {
    pub pass: String,
    pub tag: String,
    pub source: PassError,
}

impl TransformError {
    ///The arithmetic error that caused this transform error, if any.
    pub fn arithmetic(&self) -> Option<&ArithmeticError> {
        match &self.source {
            PassError::Arithmetic(a) => Some(a),
            PassError::Any(_) => None,
        }
    }
}

impl Diagnostic for TransformError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Transform
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        details.insert("pass_name".to_owned(), self.pass.clone().into());
        details.insert("node_type".to_owned(), self.tag.clone().into());
        if self.arithmetic().is_some() {
            details.insert("cause".to_owned(), "arithmetic".into());
        }
        details
    }
}
