/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! Removes additive and multiplicative identities: `x + 0`, `0 + x`, `x - 0`, `x * 1` and `1 * x` become `x`.

use sylva_ast::{Ast, Literal, NodeKind, NodeRef};

use crate::{Pass, PassError};

#[derive(Debug, Default)]
pub struct ExpressionSimplification {
    simplified: usize,
}

impl ExpressionSimplification {
    pub const NAME: &'static str = "expression_simplification";

    pub fn simplified(&self) -> usize {
        self.simplified
    }
}

fn is_literal(ast: &Ast, node: NodeRef, value: i64) -> bool {
    match ast[node].kind.literal() {
        Some(Literal::Int(i)) => *i == value,
        Some(Literal::Float(f)) => *f == value as f64,
        _ => false,
    }
}

impl Pass for ExpressionSimplification {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(&mut self, ast: &mut Ast, node: NodeRef) -> Result<NodeRef, PassError> {
        //the replacement itself is not visited again, so simplify until nothing changes
        let mut current = node;
        while let Some(simplified) = simplify_once(ast, current) {
            self.simplified += 1;
            current = simplified;
        }
        Ok(current)
    }
}

fn simplify_once(ast: &Ast, node: NodeRef) -> Option<NodeRef> {
    let NodeKind::BinOp {
        left: Some(left),
        right: Some(right),
        op,
    } = &ast[node].kind
    else {
        return None;
    };
    let (left, right) = (*left, *right);

    match op.as_str() {
        "+" if is_literal(ast, right, 0) => Some(left),
        "+" if is_literal(ast, left, 0) => Some(right),
        "-" if is_literal(ast, right, 0) => Some(left),
        "*" if is_literal(ast, right, 1) => Some(left),
        "*" if is_literal(ast, left, 1) => Some(right),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use sylva_ast::{Ast, ExprContext};

    use crate::{passes::ExpressionSimplification, Pass};

    #[test]
    fn identities() {
        let mut ast = Ast::new();
        let mut pass = ExpressionSimplification::default();
        let x = ast.new_name("x", ExprContext::Load);

        let zero = ast.new_constant(0);
        let add = ast.new_binop(x, "+", zero);
        assert_eq!(pass.transform(&mut ast, add).unwrap(), x);

        let add = ast.new_binop(zero, "+", x);
        assert_eq!(pass.transform(&mut ast, add).unwrap(), x);

        let one = ast.new_constant(1.0);
        let mul = ast.new_binop(one, "*", x);
        assert_eq!(pass.transform(&mut ast, mul).unwrap(), x);

        //0 - x is not x
        let sub = ast.new_binop(zero, "-", x);
        assert_eq!(pass.transform(&mut ast, sub).unwrap(), sub);

        //"" is not an identity
        let empty = ast.new_constant("");
        let add = ast.new_binop(x, "+", empty);
        assert_eq!(pass.transform(&mut ast, add).unwrap(), add);

        //(x * 1) + 0
        let mul = ast.new_binop(x, "*", one);
        let add = ast.new_binop(mul, "+", zero);
        assert_eq!(pass.transform(&mut ast, add).unwrap(), x);

        assert_eq!(pass.simplified(), 5);
    }
}
