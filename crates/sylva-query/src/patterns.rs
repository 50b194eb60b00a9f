/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use regex::Regex;
use serde_json::Value;
use sylva_ast::{schema::AttrValue, Ast, NodeKind, NodeRef, NodeTag};

use crate::MatchError;

///Named sub-nodes captured by a pattern.
pub type Captures = BTreeMap<String, NodeRef>;

///Fallible predicate on an attribute value. An `Err` aborts the matching run.
pub type Predicate = Arc<dyn Fn(&Ast, &AttrValue<'_>) -> Result<bool, String> + Send + Sync>;

///Structural predicate over nodes.
pub trait Pattern: Debug + Send + Sync {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError>;

    ///Named nodes this pattern captures on `node`. Only meaningful if `node` matches.
    fn capture(&self, _ast: &Ast, _node: NodeRef) -> Captures {
        Captures::new()
    }
}

///How a name (identifier, callee, assignment target) is matched.
#[derive(Debug, Clone)]
pub enum NameMatch {
    Any,
    Exact(String),
    ///Regex that must match at the start of the name.
    Regex(Regex),
}

///Compiles `regex` so that it only matches at the start of the input.
fn anchored(regex: &str) -> Result<Regex, MatchError> {
    Regex::new(&format!("^(?:{regex})")).map_err(|e| MatchError::InvalidRegex {
        regex: regex.to_owned(),
        reason: e.to_string(),
    })
}

impl NameMatch {
    pub fn regex(regex: &str) -> Result<Self, MatchError> {
        anchored(regex).map(NameMatch::Regex)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, NameMatch::Any)
    }

    pub fn accepts(&self, name: &str) -> bool {
        match self {
            NameMatch::Any => true,
            NameMatch::Exact(n) => n == name,
            NameMatch::Regex(r) => r.is_match(name),
        }
    }

    ///Matches the identifier of the [Name](NodeKind::Name) node `node`. Fails for any other node if a name is constrained.
    fn accepts_name_node(&self, ast: &Ast, node: Option<NodeRef>) -> bool {
        if self.is_any() {
            return true;
        }
        match node.and_then(|n| ast.kind(n)).and_then(NodeKind::identifier) {
            Some(id) => self.accepts(id),
            None => false,
        }
    }
}

#[derive(Clone)]
pub enum Constraint {
    ///Scalar attribute equals the value. A child attribute equals `null` if it is absent.
    Equals(Value),
    Predicate(Predicate),
}

impl Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equals(v) => write!(f, "== {v}"),
            Constraint::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

///Matches nodes of a tag, constrained on some attributes. Constraints on attributes the tag doesn't declare are ignored.
#[derive(Debug, Clone)]
pub struct NodePattern {
    pub tag: NodeTag,
    pub constraints: Vec<(String, Constraint)>,
}

impl NodePattern {
    pub fn new(tag: NodeTag) -> Self {
        NodePattern {
            tag,
            constraints: Vec::new(),
        }
    }

    pub fn with_attr(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push((attr.into(), Constraint::Equals(value.into())));
        self
    }

    pub fn with_predicate(
        mut self,
        attr: impl Into<String>,
        predicate: impl Fn(&Ast, &AttrValue<'_>) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        self.constraints
            .push((attr.into(), Constraint::Predicate(Arc::new(predicate))));
        self
    }

    fn describe(&self) -> String {
        format!("NodePattern({})", self.tag)
    }
}

impl Pattern for NodePattern {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        let Some(n) = ast.get(node) else {
            return Ok(false);
        };
        if n.tag() != self.tag {
            return Ok(false);
        }
        for (attr, constraint) in &self.constraints {
            let Some(value) = n.kind.attr(attr) else {
                continue;
            };
            let accepted = match constraint {
                Constraint::Equals(expected) => match &value {
                    AttrValue::Scalar(v) => v == expected,
                    AttrValue::Child(None) => expected.is_null(),
                    _ => false,
                },
                Constraint::Predicate(pred) => {
                    pred(ast, &value).map_err(|message| MatchError::PredicateFailed {
                        pattern: self.describe(),
                        tag: n.tag().to_string(),
                        message,
                    })?
                }
            };
            if !accepted {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

///Matches [Name](NodeKind::Name) nodes by identifier.
#[derive(Debug, Clone)]
pub struct NamePattern {
    pub name: NameMatch,
}

impl Pattern for NamePattern {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        Ok(match ast.kind(node) {
            Some(NodeKind::Name { id, .. }) => self.name.accepts(id),
            _ => false,
        })
    }
}

///Matches calls by callee name and positional argument count.
#[derive(Debug, Clone)]
pub struct CallPattern {
    pub func: NameMatch,
    pub args_count: Option<usize>,
    pub min_args: Option<usize>,
    pub max_args: Option<usize>,
}

impl CallPattern {
    pub fn new(func: NameMatch) -> Self {
        CallPattern {
            func,
            args_count: None,
            min_args: None,
            max_args: None,
        }
    }
}

impl Pattern for CallPattern {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        let Some(NodeKind::Call { func, args, .. }) = ast.kind(node) else {
            return Ok(false);
        };
        if !self.func.accepts_name_node(ast, *func) {
            return Ok(false);
        }
        let count = args.len();
        Ok(self.args_count.map_or(true, |c| c == count)
            && self.min_args.map_or(true, |min| count >= min)
            && self.max_args.map_or(true, |max| count <= max))
    }
}

///Matches assignments by their first target's name and optionally the tag of the assigned value.
#[derive(Debug, Clone)]
pub struct AssignPattern {
    pub target: NameMatch,
    pub value_tag: Option<NodeTag>,
}

impl Pattern for AssignPattern {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        let Some(NodeKind::Assign { value, targets }) = ast.kind(node) else {
            return Ok(false);
        };
        if !self.target.accepts_name_node(ast, targets.first().copied()) {
            return Ok(false);
        }
        if let (Some(tag), Some(value)) = (self.value_tag, value) {
            if ast.tag(*value) != Some(tag) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

///Matches everything, capturing the node under `capture_name`.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pub capture_name: String,
}

impl Default for WildcardPattern {
    fn default() -> Self {
        WildcardPattern {
            capture_name: "_".to_owned(),
        }
    }
}

impl Pattern for WildcardPattern {
    fn matches(&self, _ast: &Ast, _node: NodeRef) -> Result<bool, MatchError> {
        Ok(true)
    }

    fn capture(&self, _ast: &Ast, node: NodeRef) -> Captures {
        Captures::from([(self.capture_name.clone(), node)])
    }
}

///Matches nodes whose string attribute `attribute` matches `regex` at its start.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    pub attribute: String,
    pub regex: Regex,
}

impl RegexPattern {
    pub fn new(attribute: impl Into<String>, regex: &str) -> Result<Self, MatchError> {
        Ok(RegexPattern {
            attribute: attribute.into(),
            regex: anchored(regex)?,
        })
    }
}

impl Pattern for RegexPattern {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        let value = ast.kind(node).and_then(|k| k.scalar(&self.attribute));
        Ok(match value {
            Some(Value::String(s)) => self.regex.is_match(&s),
            _ => false,
        })
    }
}

///Matches if all sub-patterns match. Captures of all sub-patterns are merged, later ones win.
#[derive(Debug)]
pub struct And(pub Vec<Box<dyn Pattern>>);

impl Pattern for And {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        for p in &self.0 {
            if !p.matches(ast, node)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn capture(&self, ast: &Ast, node: NodeRef) -> Captures {
        let mut captures = Captures::new();
        for p in &self.0 {
            captures.extend(p.capture(ast, node));
        }
        captures
    }
}

///Matches if any sub-pattern matches. Captures only those of the first matching sub-pattern.
#[derive(Debug)]
pub struct Or(pub Vec<Box<dyn Pattern>>);

impl Pattern for Or {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        for p in &self.0 {
            if p.matches(ast, node)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn capture(&self, ast: &Ast, node: NodeRef) -> Captures {
        for p in &self.0 {
            if let Ok(true) = p.matches(ast, node) {
                return p.capture(ast, node);
            }
        }
        Captures::new()
    }
}

///Inverts a pattern. Never captures.
#[derive(Debug)]
pub struct Not(pub Box<dyn Pattern>);

impl Pattern for Not {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        Ok(!self.0.matches(ast, node)?)
    }
}

impl Pattern for Arc<dyn Pattern> {
    fn matches(&self, ast: &Ast, node: NodeRef) -> Result<bool, MatchError> {
        self.as_ref().matches(ast, node)
    }

    fn capture(&self, ast: &Ast, node: NodeRef) -> Captures {
        self.as_ref().capture(ast, node)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sylva_ast::ExprContext;

    fn sample() -> (Ast, NodeRef, NodeRef) {
        let mut ast = Ast::new();
        let one = ast.new_constant(1);
        let two = ast.new_constant(2);
        let add = ast.new_binop(one, "+", two);
        let call = ast.new_call_name("print", vec![add]);
        (ast, add, call)
    }

    #[test]
    fn node_pattern_constraints() {
        let (ast, add, _) = sample();
        assert!(NodePattern::new(NodeTag::BinOp)
            .with_attr("op", "+")
            .matches(&ast, add)
            .unwrap());
        assert!(!NodePattern::new(NodeTag::BinOp)
            .with_attr("op", "-")
            .matches(&ast, add)
            .unwrap());
        //unknown attributes are ignored
        assert!(NodePattern::new(NodeTag::BinOp)
            .with_attr("color", "red")
            .matches(&ast, add)
            .unwrap());
    }

    #[test]
    fn failing_predicate_is_reported() {
        let (ast, add, _) = sample();
        let pattern = NodePattern::new(NodeTag::BinOp)
            .with_predicate("left", |_, _| Err("boom".to_owned()));
        let err = pattern.matches(&ast, add).unwrap_err();
        assert!(matches!(
            err,
            MatchError::PredicateFailed { ref tag, ref message, .. } if tag == "BinOp" && message == "boom"
        ));
    }

    #[test]
    fn call_shapes() {
        let (ast, _, call) = sample();
        let mut pattern = CallPattern::new(NameMatch::Exact("print".to_owned()));
        assert!(pattern.matches(&ast, call).unwrap());
        pattern.args_count = Some(2);
        assert!(!pattern.matches(&ast, call).unwrap());
        pattern.args_count = None;
        pattern.max_args = Some(0);
        assert!(!pattern.matches(&ast, call).unwrap());

        let regex = CallPattern::new(NameMatch::regex("pr").unwrap());
        assert!(regex.matches(&ast, call).unwrap());
        let regex = CallPattern::new(NameMatch::regex("int").unwrap());
        assert!(!regex.matches(&ast, call).unwrap(), "regex is anchored at the start");
    }

    #[test]
    fn combinator_captures() {
        let mut ast = Ast::new();
        let x = ast.new_name("x", ExprContext::Load);

        let and = And(vec![
            Box::new(WildcardPattern {
                capture_name: "a".to_owned(),
            }),
            Box::new(WildcardPattern {
                capture_name: "b".to_owned(),
            }),
        ]);
        assert_eq!(and.capture(&ast, x).len(), 2);

        let or = Or(vec![
            Box::new(NamePattern {
                name: NameMatch::Exact("y".to_owned()),
            }),
            Box::new(WildcardPattern {
                capture_name: "first".to_owned(),
            }),
            Box::new(WildcardPattern {
                capture_name: "second".to_owned(),
            }),
        ]);
        let captures = or.capture(&ast, x);
        assert_eq!(captures.len(), 1);
        assert_eq!(captures.get("first"), Some(&x));

        let not = Not(Box::new(WildcardPattern::default()));
        assert!(!not.matches(&ast, x).unwrap());
        assert!(not.capture(&ast, x).is_empty());
    }

    #[test]
    fn regex_on_attribute() {
        let mut ast = Ast::new();
        let attr = ast.new_name("obj", ExprContext::Load);
        let access = ast.add(NodeKind::Attribute {
            value: Some(attr),
            attr: "get_value".to_owned(),
            ctx: ExprContext::Load,
        });
        let pattern = RegexPattern::new("attr", "get_").unwrap();
        assert!(pattern.matches(&ast, access).unwrap());
        assert!(!pattern.matches(&ast, attr).unwrap());
    }
}
