/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! The textual query language.
//!
//! ```text
//! query := "*"
//!        | ("call" | "assign" | "name") [ <identifier> | "/" <regex> "/" ]
//! ```
//!
//! Without an argument the query matches any node of that shape. The argument is the rest of the query
//! after the keyword.

use crate::{
    patterns::{AssignPattern, CallPattern, NameMatch, NamePattern, Pattern, WildcardPattern},
    MatchError,
};

//None for an identifier that contains whitespace.
fn name_match(arg: Option<&str>) -> Option<Result<NameMatch, MatchError>> {
    match arg {
        None => Some(Ok(NameMatch::Any)),
        Some(re) if re.len() >= 2 && re.starts_with('/') && re.ends_with('/') => {
            Some(NameMatch::regex(&re[1..re.len() - 1]))
        }
        Some(name) if name.contains(char::is_whitespace) => None,
        Some(name) => Some(Ok(NameMatch::Exact(name.to_owned()))),
    }
}

///Compiles `query` into a pattern.
pub fn compile_query(query: &str) -> Result<Box<dyn Pattern>, MatchError> {
    let invalid = || MatchError::InvalidQuery {
        query: query.to_owned(),
    };
    let trimmed = query.trim();
    if trimmed == "*" {
        return Ok(Box::new(WildcardPattern::default()));
    }

    //everything after the keyword is the argument, so a regex may contain spaces
    let (keyword, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, Some(rest.trim())),
        None => (trimmed, None),
    };
    if keyword.is_empty() {
        return Err(invalid());
    }
    let name = || name_match(arg).unwrap_or_else(|| Err(invalid()));

    let pattern: Box<dyn Pattern> = match keyword {
        "call" => Box::new(CallPattern::new(name()?)),
        "assign" => Box::new(AssignPattern {
            target: name()?,
            value_tag: None,
        }),
        "name" => Box::new(NamePattern { name: name()? }),
        _ => return Err(invalid()),
    };
    Ok(pattern)
}
