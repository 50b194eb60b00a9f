/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Numeric and string literals.

use sylva_ast::{Literal, NodeKind, NodeRef};

use crate::{error::ParserError, ParserCtx};

pub fn integer(ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef {
    let text = ctx.text(node);
    let clean = text.replace('_', "").to_lowercase();
    //complex and long integers have no literal representation
    if clean.ends_with('j') || clean.ends_with('l') {
        return ctx.extension(node);
    }

    let parsed = if let Some(hex) = clean.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = clean.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = clean.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        clean.parse::<i64>()
    };

    match parsed {
        Ok(i) => ctx.add(
            NodeKind::Constant {
                value: Literal::Int(i),
            },
            node,
        ),
        Err(_) => {
            #[cfg(feature = "log")]
            log::warn!("integer literal {text} does not fit into 64bit");
            ctx.extension(node)
        }
    }
}

pub fn float(ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef {
    let text = ctx.text(node);
    let clean = text.replace('_', "").to_lowercase();
    if clean.ends_with('j') {
        return ctx.extension(node);
    }
    match clean.parse::<f64>() {
        Ok(f) => ctx.add(
            NodeKind::Constant {
                value: Literal::Float(f),
            },
            node,
        ),
        Err(_) => {
            ctx.push_error(
                ParserError::InvalidLiteral {
                    kind: "float".to_owned(),
                    text: text.to_owned(),
                },
                node,
                "could not parse float",
            );
            ctx.unparsed(node, text)
        }
    }
}

enum StrValue {
    Str(String),
    Bytes(Vec<u8>),
}

//Decodes a single `string` node. Returns None for formatted strings.
fn decode_string(text: &str) -> Option<StrValue> {
    let quote_start = text.find(['"', '\''])?;
    let prefix = text[..quote_start].to_lowercase();
    if prefix.contains('f') || prefix.contains('t') {
        return None;
    }
    let body = &text[quote_start..];
    let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    let content = if body.len() >= 2 * quote_len {
        &body[quote_len..body.len() - quote_len]
    } else {
        //unterminated string
        &body[quote_len.min(body.len())..]
    };

    let value = if prefix.contains('r') {
        content.to_owned()
    } else {
        unescape(content)
    };

    if prefix.contains('b') {
        Some(StrValue::Bytes(
            value.chars().map(|c| (c as u32 & 0xff) as u8).collect(),
        ))
    } else {
        Some(StrValue::Str(value))
    }
}

///Resolves backslash escapes the way the analysed language does. Unknown escapes are kept verbatim.
pub fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' | 'u' | 'U' => {
                let len = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..len).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(ch) if digits.len() == len => out.push(ch),
                    _ => {
                        out.push('\\');
                        out.push(esc);
                        out.push_str(&digits);
                    }
                }
            }
            '0'..='7' => {
                let mut digits = String::from(esc);
                while digits.len() < 3 {
                    match chars.next_if(|c| ('0'..='7').contains(c)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

///Converts `string` and `concatenated_string` nodes.
pub fn string(ctx: &mut ParserCtx, node: &tree_sitter::Node) -> NodeRef {
    let parts: Vec<tree_sitter::Node> = if node.kind() == "concatenated_string" {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|n| n.kind() == "string")
            .collect()
    } else {
        vec![*node]
    };

    let mut value: Option<StrValue> = None;
    for part in parts {
        let Some(decoded) = decode_string(ctx.text(&part)) else {
            return ctx.extension(node);
        };
        value = match (value, decoded) {
            (None, d) => Some(d),
            (Some(StrValue::Str(mut a)), StrValue::Str(b)) => {
                a.push_str(&b);
                Some(StrValue::Str(a))
            }
            (Some(StrValue::Bytes(mut a)), StrValue::Bytes(b)) => {
                a.extend(b);
                Some(StrValue::Bytes(a))
            }
            //mixing bytes and str is invalid
            _ => return ctx.extension(node),
        };
    }

    let value = match value {
        Some(StrValue::Str(s)) => Literal::Str(s),
        Some(StrValue::Bytes(b)) => Literal::Bytes(b),
        None => Literal::Str(String::new()),
    };
    ctx.add(NodeKind::Constant { value }, node)
}

#[cfg(test)]
mod test {
    use super::unescape;

    #[test]
    fn escapes() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r"\x41ä\101"), "A\u{e4}A");
        assert_eq!(unescape(r"\q"), "\\q");
        assert_eq!(unescape("line\\\ncontinued"), "linecontinued");
        assert_eq!(unescape(r"\\"), "\\");
    }
}
