/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Common diagnosis helper. Source positions and spans of nodes, the error taxonomy that is shared by all sylva crates,
//! as well as the error reporting.

pub use ariadne;
pub use serde_json;
pub use thiserror;

mod diag;
pub mod error;
mod span;

pub use diag::{Details, Diagnostic, ErrorKind};
pub use error::SylvaError;
pub use span::{Position, Span};

///Prints `report` to stderr, using `source` as the content of the reported file.
pub fn report(report: ariadne::Report<'_, Span>, file: &str, source: &str) {
    let cache = (file.to_owned(), ariadne::Source::from(source.to_owned()));
    if let Err(e) = report.eprint(cache) {
        eprintln!("Failed to print report: {e}");
    }
}
