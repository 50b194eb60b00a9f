/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use serde::{Deserialize, Serialize};

///Position of a node in its source. `line` is 1-based, `column` is the 0-based
/// byte column within that line and `offset` the byte offset into the whole source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
            end_line: None,
            end_column: None,
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }
}

///Source-Code span information. `from` and `to` are (row, column) pairs as reported by the front-end (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: String,
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Span {
    pub fn empty() -> Self {
        Span {
            file: String::with_capacity(0),
            from: (0, 0),
            to: (0, 0),
            byte_start: 0,
            byte_end: 0,
        }
    }

    pub fn get_file(&self) -> Option<&str> {
        if self.file.is_empty() {
            None
        } else {
            Some(&self.file)
        }
    }

    ///The node-level [Position] this span starts at.
    pub fn position(&self) -> Position {
        Position::new(self.from.0 + 1, self.from.1, self.byte_start).with_end(self.to.0 + 1, self.to.1)
    }
}

impl ariadne::Span for Span {
    type SourceId = String;
    fn source(&self) -> &Self::SourceId {
        &self.file
    }
    fn start(&self) -> usize {
        self.byte_start
    }
    fn end(&self) -> usize {
        self.byte_end
    }
}
