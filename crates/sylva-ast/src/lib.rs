/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! # Sylva AST
//!
//! Uniform tree representation for Python-like programs. All nodes of a tree live in one [Ast] arena and are
//! referenced by [NodeRef]. The node set is closed ([NodeKind]), except for the [Extension](NodeKind::Extension)
//! placeholder and the open `extra` map every [Node] carries.
//!
//! The [schema] declares for each [NodeTag] which attributes are children and which are scalar data.
//! All traversals ([Ast::children], [Ast::walk], [Ast::rewrite]) are derived from it.
//!
//! The [serialize] module implements the graph-safe exchange format.

mod ctx;
pub mod error;
mod literal;
mod node;
pub mod schema;
pub mod serialize;
pub mod util;

pub use ctx::{Ast, NodeRef};
pub use error::SerializeError;
pub use literal::Literal;
pub use node::{Alias, ChildVec, ExprContext, Extra, Node, NodeKind, NodeTag, SlotVec};
pub use sylva_common::Position;
