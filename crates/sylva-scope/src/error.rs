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

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymbolError {
    #[error("Cannot exit root scope")]
    ExitRootScope {
        scope: String,
        symbol: Option<String>,
    },
    #[error("Scope {scope} does not exist in this table")]
    UnknownScope {
        scope: String,
        symbol: Option<String>,
    },
}

impl SymbolError {
    ///Names the symbol whose scope was being processed.
    pub fn with_symbol(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            SymbolError::ExitRootScope { symbol, .. } | SymbolError::UnknownScope { symbol, .. } => {
                *symbol = Some(name.into());
            }
        }
        self
    }
}

impl Diagnostic for SymbolError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Symbol
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        match self {
            SymbolError::ExitRootScope { scope, symbol }
            | SymbolError::UnknownScope { scope, symbol } => {
                details.insert("scope_name".to_owned(), scope.clone().into());
                details.insert("symbol_name".to_owned(), symbol.clone().into());
            }
        }
        details
    }
}
