/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

///Value of a [Constant](crate::NodeKind::Constant) node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Literal {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

impl Literal {
    ///Name of the literal's type, as the analysed language would call it.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::None => "NoneType",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::Bytes(_) => "bytes",
            Literal::Ellipsis => "ellipsis",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Bool(_) | Literal::Int(_) | Literal::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Literal::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(fl) => write!(f, "{fl:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Literal::Ellipsis => write!(f, "..."),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_owned())
    }
}

//Exchange representation. Everything JSON can express natively is written as is,
// the rest is wrapped in a single-key object.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LiteralRepr {
    None(()),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Special(Special),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Special {
    Bytes(Vec<u8>),
    Float(String),
    Ellipsis(bool),
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Literal::None => LiteralRepr::None(()),
            Literal::Bool(b) => LiteralRepr::Bool(*b),
            Literal::Int(i) => LiteralRepr::Int(*i),
            Literal::Float(f) if f.is_finite() => LiteralRepr::Float(*f),
            Literal::Float(f) => LiteralRepr::Special(Special::Float(f.to_string())),
            Literal::Str(s) => LiteralRepr::Str(s.clone()),
            Literal::Bytes(b) => LiteralRepr::Special(Special::Bytes(b.clone())),
            Literal::Ellipsis => LiteralRepr::Special(Special::Ellipsis(true)),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lit = match LiteralRepr::deserialize(deserializer)? {
            LiteralRepr::None(()) => Literal::None,
            LiteralRepr::Bool(b) => Literal::Bool(b),
            LiteralRepr::Int(i) => Literal::Int(i),
            LiteralRepr::Float(f) => Literal::Float(f),
            LiteralRepr::Str(s) => Literal::Str(s),
            LiteralRepr::Special(Special::Bytes(b)) => Literal::Bytes(b),
            LiteralRepr::Special(Special::Float(f)) => {
                Literal::Float(f.parse().map_err(serde::de::Error::custom)?)
            }
            LiteralRepr::Special(Special::Ellipsis(_)) => Literal::Ellipsis,
        };
        Ok(lit)
    }
}

#[cfg(test)]
mod test {
    use super::Literal;
    use serde_json::json;

    #[test]
    fn json_native_literals() {
        assert_eq!(serde_json::to_value(Literal::Int(3)).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(Literal::Float(3.0)).unwrap(), json!(3.0));
        assert_eq!(serde_json::to_value(Literal::None).unwrap(), json!(null));
        let back: Literal = serde_json::from_value(json!(3.0)).unwrap();
        assert_eq!(back, Literal::Float(3.0));
        let back: Literal = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(back, Literal::Int(3));
    }

    #[test]
    fn non_native_literals() {
        let inf = serde_json::to_value(Literal::Float(f64::INFINITY)).unwrap();
        assert_eq!(inf, json!({"float": "inf"}));
        let back: Literal = serde_json::from_value(inf).unwrap();
        assert_eq!(back, Literal::Float(f64::INFINITY));

        let bytes = serde_json::to_value(Literal::Bytes(vec![1, 2])).unwrap();
        let back: Literal = serde_json::from_value(bytes).unwrap();
        assert_eq!(back, Literal::Bytes(vec![1, 2]));

        let back: Literal =
            serde_json::from_value(serde_json::to_value(Literal::Ellipsis).unwrap()).unwrap();
        assert_eq!(back, Literal::Ellipsis);
    }
}
