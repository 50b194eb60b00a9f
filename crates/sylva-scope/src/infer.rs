/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Best-effort type inference for expressions. Never fails, unknown or conflicting information only lowers the
//! confidence of the result.
//!
//! Binary operations on operands of the same type keep that type, regardless of the operator. So `1 / 2` is an
//! `int` and `True + True` a `bool`. Mixed numeric operands widen to `float` if either side is one, else to `int`.

use sylva_ast::{Ast, NodeKind, NodeRef};

use crate::{SymbolTable, TypeInfo};

//Deeper expressions are not inspected.
const MAX_DEPTH: usize = 128;

///Infers the type of the expression `node`. Names are resolved from the table's current scope.
pub fn infer_type(table: &SymbolTable, ast: &Ast, node: NodeRef) -> TypeInfo {
    infer_at(table, ast, node, 0)
}

fn infer_at(table: &SymbolTable, ast: &Ast, node: NodeRef, depth: usize) -> TypeInfo {
    if depth > MAX_DEPTH {
        return TypeInfo::unknown(0.0);
    }
    let Some(kind) = ast.kind(node) else {
        return TypeInfo::unknown(0.0);
    };

    match kind {
        NodeKind::Constant { value } => TypeInfo::new(value.kind_name(), 1.0),
        NodeKind::BinOp {
            left: Some(left),
            right: Some(right),
            op,
        } => {
            let l = infer_at(table, ast, *left, depth + 1);
            let r = infer_at(table, ast, *right, depth + 1);
            binop_type(op, l, r)
        }
        NodeKind::UnaryOp {
            operand: Some(operand),
            op,
        } => {
            if op == "not" {
                TypeInfo::new("bool", 1.0)
            } else {
                let ty = infer_at(table, ast, *operand, depth + 1);
                if ty.name == "bool" {
                    TypeInfo::new("int", ty.confidence)
                } else {
                    ty
                }
            }
        }
        NodeKind::BoolOp { values, .. } => {
            let mut types = values.iter().map(|v| infer_at(table, ast, *v, depth + 1));
            let Some(first) = types.next() else {
                return TypeInfo::unknown(0.0);
            };
            types.try_fold(first, |acc, ty| {
                if acc.name == ty.name {
                    Some(TypeInfo::new(acc.name, acc.confidence.min(ty.confidence)))
                } else {
                    None
                }
            })
            .unwrap_or_else(|| TypeInfo::unknown(0.3))
        }
        NodeKind::Compare { .. } => TypeInfo::new("bool", 1.0),
        NodeKind::List { .. } | NodeKind::ListComp { .. } => TypeInfo::new("list", 1.0),
        NodeKind::Tuple { .. } => TypeInfo::new("tuple", 1.0),
        NodeKind::SetComp { .. } => TypeInfo::new("set", 1.0),
        NodeKind::DictComp { .. } => TypeInfo::new("dict", 1.0),
        NodeKind::GeneratorExp { .. } => TypeInfo::new("generator", 1.0),
        NodeKind::Lambda { .. } => TypeInfo::new("function", 1.0),
        NodeKind::Name { id, .. } => table
            .lookup(id)
            .and_then(|sym| table[sym].ty.as_ref())
            .map(|ty| TypeInfo::new(ty.name.clone(), ty.confidence * 0.9))
            .unwrap_or_else(|| TypeInfo::unknown(0.0)),
        NodeKind::Call { .. } => TypeInfo::unknown(0.1),
        _ => TypeInfo::unknown(0.0),
    }
}

fn binop_type(op: &str, l: TypeInfo, r: TypeInfo) -> TypeInfo {
    let confidence = l.confidence.min(r.confidence);
    if l.is_unknown() || r.is_unknown() {
        return TypeInfo::unknown(confidence * 0.5);
    }

    let numeric = |t: &str| matches!(t, "bool" | "int" | "float");
    match (l.name.as_str(), r.name.as_str()) {
        (a, b) if a == b => TypeInfo::new(a, confidence),
        (a, b) if numeric(a) && numeric(b) => {
            let name = if a == "float" || b == "float" {
                "float"
            } else {
                "int"
            };
            TypeInfo::new(name, confidence)
        }
        ("str", "int") | ("int", "str") if op == "*" => TypeInfo::new("str", confidence),
        ("list", "int") | ("int", "list") if op == "*" => TypeInfo::new("list", confidence),
        _ => TypeInfo::unknown(confidence * 0.5),
    }
}

#[cfg(test)]
mod test {
    use sylva_ast::{Ast, ExprContext};

    use super::infer_type;
    use crate::{SymbolKind, SymbolTable, TypeInfo};

    #[test]
    fn literals_and_promotion() {
        let mut ast = Ast::new();
        let table = SymbolTable::new();
        let one = ast.new_constant(1);
        let half = ast.new_constant(0.5);
        let s = ast.new_constant("s");

        assert_eq!(infer_type(&table, &ast, one), TypeInfo::new("int", 1.0));
        let sum = ast.new_binop(one, "+", one);
        assert_eq!(infer_type(&table, &ast, sum), TypeInfo::new("int", 1.0));
        let mixed = ast.new_binop(one, "*", half);
        assert_eq!(infer_type(&table, &ast, mixed), TypeInfo::new("float", 1.0));
        let div = ast.new_binop(one, "/", one);
        assert_eq!(infer_type(&table, &ast, div).name, "int");
        let t = ast.new_constant(true);
        let bools = ast.new_binop(t, "+", t);
        assert_eq!(infer_type(&table, &ast, bools).name, "bool");
        let widened = ast.new_binop(t, "+", one);
        assert_eq!(infer_type(&table, &ast, widened).name, "int");
        let float_div = ast.new_binop(half, "/", one);
        assert_eq!(infer_type(&table, &ast, float_div).name, "float");
        let rep = ast.new_binop(s, "*", one);
        assert_eq!(infer_type(&table, &ast, rep).name, "str");
        let bad = ast.new_binop(s, "-", one);
        assert!(infer_type(&table, &ast, bad).is_unknown());
    }

    #[test]
    fn calls_and_names() {
        let mut ast = Ast::new();
        let mut table = SymbolTable::new();
        let call = ast.new_call_name("f", vec![]);
        let ty = infer_type(&table, &ast, call);
        assert!(ty.is_unknown());
        assert!(ty.confidence < 0.5);

        let site = ast.new_pass();
        table.define("x", SymbolKind::Variable, site, Some(TypeInfo::new("int", 1.0)));
        let x = ast.new_name("x", ExprContext::Load);
        let ty = infer_type(&table, &ast, x);
        assert_eq!(ty.name, "int");
        assert!(ty.confidence < 1.0);
    }
}
