/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Evaluation of binary operators on literals. Follows the numeric semantics of the analysed language: integer
//! division yields floats, floor-division and modulo round towards negative infinity, and integers never wrap.

use sylva_ast::Literal;

use crate::{config::ConfigFolding, error::ArithmeticError};

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_literal(lit: &Literal) -> Option<Self> {
        match lit {
            Literal::Bool(b) => Some(Num::Int(*b as i64)),
            Literal::Int(i) => Some(Num::Int(*i)),
            Literal::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

///Evaluates `lhs op rhs`. Returns `Ok(None)` if the operation is not defined for the operands, or not supported
/// by the folder. In that case the expression stays as it is.
pub fn eval_binop(
    op: &str,
    lhs: &Literal,
    rhs: &Literal,
    config: &ConfigFolding,
) -> Result<Option<Literal>, ArithmeticError> {
    match (Num::from_literal(lhs), Num::from_literal(rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => eval_int(op, a, b),
        (Some(a), Some(b)) => eval_float(op, a.as_float(), b.as_float()),
        _ if config.fold_strings => Ok(eval_str(op, lhs, rhs, config)),
        _ => Ok(None),
    }
}

fn overflow(lhs: impl ToString, op: &str, rhs: impl ToString) -> ArithmeticError {
    ArithmeticError::Overflow {
        lhs: lhs.to_string(),
        op: op.to_owned(),
        rhs: rhs.to_string(),
    }
}

fn zero_div(op: &str) -> ArithmeticError {
    ArithmeticError::DivisionByZero { op: op.to_owned() }
}

fn eval_int(op: &str, a: i64, b: i64) -> Result<Option<Literal>, ArithmeticError> {
    let result = match op {
        "+" => a.checked_add(b).ok_or_else(|| overflow(a, op, b))?,
        "-" => a.checked_sub(b).ok_or_else(|| overflow(a, op, b))?,
        "*" => a.checked_mul(b).ok_or_else(|| overflow(a, op, b))?,
        "/" => {
            if b == 0 {
                return Err(zero_div(op));
            }
            return Ok(Some(Literal::Float(a as f64 / b as f64)));
        }
        "//" => {
            if b == 0 {
                return Err(zero_div(op));
            }
            let q = a.checked_div(b).ok_or_else(|| overflow(a, op, b))?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        "%" => {
            if b == 0 {
                return Err(zero_div(op));
            }
            let m = a.checked_rem(b).ok_or_else(|| overflow(a, op, b))?;
            if m != 0 && ((m < 0) != (b < 0)) {
                m + b
            } else {
                m
            }
        }
        "**" => {
            if b < 0 {
                if a == 0 {
                    return Err(zero_div(op));
                }
                return Ok(Some(Literal::Float((a as f64).powf(b as f64))));
            }
            let exp = u32::try_from(b).map_err(|_| overflow(a, op, b))?;
            a.checked_pow(exp).ok_or_else(|| overflow(a, op, b))?
        }
        _ => return Ok(None),
    };

    Ok(Some(Literal::Int(result)))
}

fn eval_float(op: &str, a: f64, b: f64) -> Result<Option<Literal>, ArithmeticError> {
    let result = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(zero_div(op));
            }
            a / b
        }
        "//" => {
            if b == 0.0 {
                return Err(zero_div(op));
            }
            (a / b).floor()
        }
        "%" => {
            if b == 0.0 {
                return Err(zero_div(op));
            }
            let m = a % b;
            if m != 0.0 && ((m < 0.0) != (b < 0.0)) {
                m + b
            } else {
                m
            }
        }
        "**" => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_div(op));
            }
            //would be a complex number
            if a < 0.0 && b.fract() != 0.0 {
                return Ok(None);
            }
            let r = a.powf(b);
            if !r.is_finite() && a.is_finite() && b.is_finite() {
                return Err(overflow(a, op, b));
            }
            r
        }
        _ => return Ok(None),
    };

    Ok(Some(Literal::Float(result)))
}

fn eval_str(op: &str, lhs: &Literal, rhs: &Literal, config: &ConfigFolding) -> Option<Literal> {
    let repeat = |s: &str, n: i64| -> Option<Literal> {
        let n = usize::try_from(n.max(0)).ok()?;
        if s.len().checked_mul(n)? > config.max_string_len {
            return None;
        }
        Some(Literal::Str(s.repeat(n)))
    };

    match (op, lhs, rhs) {
        ("+", Literal::Str(a), Literal::Str(b)) => {
            if a.len() + b.len() > config.max_string_len {
                None
            } else {
                Some(Literal::Str(format!("{a}{b}")))
            }
        }
        ("*", Literal::Str(s), Literal::Int(n)) | ("*", Literal::Int(n), Literal::Str(s)) => repeat(s, *n),
        ("*", Literal::Str(s), Literal::Bool(b)) | ("*", Literal::Bool(b), Literal::Str(s)) => {
            repeat(s, *b as i64)
        }
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::eval_binop;
    use crate::{config::ConfigFolding, error::ArithmeticError};
    use sylva_ast::Literal;

    fn eval(op: &str, a: impl Into<Literal>, b: impl Into<Literal>) -> Result<Option<Literal>, ArithmeticError> {
        eval_binop(op, &a.into(), &b.into(), &ConfigFolding::default())
    }

    #[test]
    fn int_ops() {
        assert_eq!(eval("+", 1, 2), Ok(Some(Literal::Int(3))));
        assert_eq!(eval("*", 6, 7), Ok(Some(Literal::Int(42))));
        assert_eq!(eval("/", 7, 2), Ok(Some(Literal::Float(3.5))));
        assert_eq!(eval("**", 2, 10), Ok(Some(Literal::Int(1024))));
        assert_eq!(eval("**", 2, -1), Ok(Some(Literal::Float(0.5))));
    }

    #[test]
    fn floor_semantics() {
        assert_eq!(eval("//", -7, 2), Ok(Some(Literal::Int(-4))));
        assert_eq!(eval("%", -7, 2), Ok(Some(Literal::Int(1))));
        assert_eq!(eval("%", 7, -2), Ok(Some(Literal::Int(-1))));
        assert_eq!(eval("//", -7.0, 2.0), Ok(Some(Literal::Float(-4.0))));
        assert_eq!(eval("%", -7.0, 2.0), Ok(Some(Literal::Float(1.0))));
    }

    #[test]
    fn division_by_zero() {
        for op in ["/", "//", "%"] {
            assert!(matches!(
                eval(op, 1, 0),
                Err(ArithmeticError::DivisionByZero { .. })
            ));
            assert!(matches!(
                eval(op, 1.0, 0.0),
                Err(ArithmeticError::DivisionByZero { .. })
            ));
        }
        assert!(matches!(
            eval("**", 0, -1),
            Err(ArithmeticError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn overflow() {
        assert!(matches!(
            eval("+", i64::MAX, 1),
            Err(ArithmeticError::Overflow { .. })
        ));
        assert!(matches!(
            eval("**", 10, 40),
            Err(ArithmeticError::Overflow { .. })
        ));
        assert!(matches!(
            eval("**", 10.0, 400.0),
            Err(ArithmeticError::Overflow { .. })
        ));
    }

    #[test]
    fn mixed_and_unsupported() {
        assert_eq!(eval("+", 1, 0.5), Ok(Some(Literal::Float(1.5))));
        assert_eq!(eval("+", true, 1), Ok(Some(Literal::Int(2))));
        assert_eq!(eval("+", "a", 1), Ok(None));
        assert_eq!(eval("<<", 1, 2), Ok(None));
        assert_eq!(eval("**", -8.0, 0.5), Ok(None));
    }

    #[test]
    fn strings() {
        assert_eq!(
            eval("+", "ab", "cd"),
            Ok(Some(Literal::Str("abcd".to_owned())))
        );
        assert_eq!(eval("*", "ab", 3), Ok(Some(Literal::Str("ababab".to_owned()))));
        assert_eq!(eval("*", "ab", -1), Ok(Some(Literal::Str(String::new()))));

        let tight = ConfigFolding {
            fold_strings: true,
            max_string_len: 4,
        };
        assert_eq!(
            eval_binop("*", &"ab".into(), &Literal::Int(3), &tight),
            Ok(None)
        );
        let off = ConfigFolding {
            fold_strings: false,
            ..Default::default()
        };
        assert_eq!(eval_binop("+", &"a".into(), &"b".into(), &off), Ok(None));
    }
}
