/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Structural pattern matching over [sylva_ast] trees, and the small textual query language
//! that compiles to patterns.

mod error;
mod matcher;
pub mod patterns;
mod query;

pub use error::MatchError;
pub use matcher::{Match, Matcher};
pub use patterns::{Captures, Pattern};
pub use query::compile_query;
