/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
//! The analysis walk. Uses an explicit work list instead of recursion, so arbitrarily deep trees can be analysed.

use sylva_ast::{Ast, ExprContext, NodeKind, NodeRef, NodeTag};

use crate::{infer::infer_type, SymbolError, SymbolKind, SymbolTable, TypeInfo};

enum Work {
    Visit(NodeRef),
    ///Binds the assignment target `target`, optionally to the expression `value`.
    Bind {
        target: NodeRef,
        value: Option<NodeRef>,
    },
    ///Read-modify-write of `target`.
    Update(NodeRef),
    ///Defines the scope-opening node and enters its scope.
    Open(NodeRef),
    ///Leaves the scope opened by the node.
    Close(NodeRef),
}

impl SymbolTable {
    ///Analyses the tree at `root`, starting in the current scope. Nodes that were analysed before are skipped.
    pub fn analyze(&mut self, ast: &Ast, root: NodeRef) -> Result<(), SymbolError> {
        let mut work = vec![Work::Visit(root)];
        while let Some(item) = work.pop() {
            let mut seq = Vec::new();
            match item {
                Work::Visit(node) => {
                    if !self.visited.insert(node) {
                        continue;
                    }
                    if let Some(n) = ast.get(node) {
                        self.visit(node, &n.kind, &mut seq);
                    }
                }
                Work::Bind { target, value } => self.bind(ast, target, value, &mut seq),
                Work::Update(target) => match ast.kind(target) {
                    Some(NodeKind::Name { id, .. }) => {
                        self.visited.insert(target);
                        self.add_use(id, target);
                        self.define(id, SymbolKind::Variable, target, None);
                    }
                    _ => seq.push(Work::Visit(target)),
                },
                Work::Open(node) => self.open(ast, node),
                Work::Close(node) => {
                    self.exit_scope().map_err(|e| {
                        match ast.kind(node).and_then(NodeKind::def_name) {
                            Some(name) => e.with_symbol(name),
                            None => e,
                        }
                    })?;
                }
            }
            //seq is in execution order
            work.extend(seq.into_iter().rev());
        }

        self.resolve_forward_references();

        #[cfg(feature = "log")]
        log::info!("{self}");

        Ok(())
    }

    fn visit(&mut self, node: NodeRef, kind: &NodeKind, seq: &mut Vec<Work>) {
        let visit_all = |seq: &mut Vec<Work>, nodes: &[NodeRef]| {
            seq.extend(nodes.iter().map(|n| Work::Visit(*n)));
        };
        let visit_opt = |seq: &mut Vec<Work>, node: &Option<NodeRef>| {
            if let Some(n) = node {
                seq.push(Work::Visit(*n));
            }
        };

        match kind {
            NodeKind::FunctionDef {
                returns,
                decorator_list,
                defaults,
                body,
                ..
            } => {
                visit_all(seq, decorator_list);
                visit_all(seq, defaults);
                visit_opt(seq, returns);
                seq.push(Work::Open(node));
                visit_all(seq, body);
                seq.push(Work::Close(node));
            }
            NodeKind::ClassDef {
                bases,
                keywords,
                decorator_list,
                body,
                ..
            } => {
                visit_all(seq, decorator_list);
                visit_all(seq, bases);
                visit_all(seq, keywords);
                seq.push(Work::Open(node));
                visit_all(seq, body);
                seq.push(Work::Close(node));
            }
            NodeKind::Lambda { body, defaults, .. } => {
                visit_all(seq, defaults);
                seq.push(Work::Open(node));
                visit_opt(seq, body);
                seq.push(Work::Close(node));
            }
            NodeKind::ListComp { elt, generators }
            | NodeKind::SetComp { elt, generators }
            | NodeKind::GeneratorExp { elt, generators } => {
                seq.push(Work::Open(node));
                visit_all(seq, generators);
                visit_opt(seq, elt);
                seq.push(Work::Close(node));
            }
            NodeKind::DictComp {
                key,
                value,
                generators,
            } => {
                seq.push(Work::Open(node));
                visit_all(seq, generators);
                visit_opt(seq, key);
                visit_opt(seq, value);
                seq.push(Work::Close(node));
            }
            NodeKind::Comprehension {
                target, iter, ifs, ..
            } => {
                visit_opt(seq, iter);
                if let Some(target) = target {
                    seq.push(Work::Bind {
                        target: *target,
                        value: None,
                    });
                }
                visit_all(seq, ifs);
            }
            NodeKind::Assign { value, targets } => {
                visit_opt(seq, value);
                seq.extend(targets.iter().map(|t| Work::Bind {
                    target: *t,
                    value: *value,
                }));
            }
            NodeKind::AugAssign { target, value, .. } => {
                visit_opt(seq, value);
                if let Some(target) = target {
                    seq.push(Work::Update(*target));
                }
            }
            NodeKind::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                visit_opt(seq, iter);
                if let Some(target) = target {
                    seq.push(Work::Bind {
                        target: *target,
                        value: None,
                    });
                }
                visit_all(seq, body);
                visit_all(seq, orelse);
            }
            NodeKind::WithItem {
                context_expr,
                optional_vars,
            } => {
                visit_opt(seq, context_expr);
                if let Some(target) = optional_vars {
                    seq.push(Work::Bind {
                        target: *target,
                        value: None,
                    });
                }
            }
            NodeKind::ExceptHandler { type_, body, name } => {
                if let Some(name) = name {
                    self.define(name, SymbolKind::Variable, node, None);
                }
                visit_opt(seq, type_);
                visit_all(seq, body);
            }
            NodeKind::Import { names } => {
                for alias in names {
                    //`import a.b` binds `a`
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => alias.name.split('.').next().unwrap_or(&alias.name),
                    };
                    self.define(
                        bound,
                        SymbolKind::Import,
                        node,
                        Some(TypeInfo::new("module", 1.0)),
                    );
                }
            }
            NodeKind::ImportFrom { names, .. } => {
                for alias in names.iter().filter(|a| a.name != "*") {
                    self.define(alias.bound_name(), SymbolKind::Import, node, None);
                }
            }
            NodeKind::Global { names } => {
                for name in names {
                    self.declare_global(name.clone());
                }
            }
            NodeKind::Nonlocal { names } => {
                for name in names {
                    self.declare_nonlocal(name.clone());
                }
            }
            NodeKind::Name { id, ctx } => match ctx {
                ExprContext::Load | ExprContext::Del => {
                    self.add_use(id, node);
                }
                ExprContext::Store => {
                    self.define(id, SymbolKind::Variable, node, None);
                }
            },
            other => {
                seq.extend(other.children().into_iter().map(Work::Visit));
            }
        }
    }

    fn bind(&mut self, ast: &Ast, target: NodeRef, value: Option<NodeRef>, seq: &mut Vec<Work>) {
        match ast.kind(target) {
            Some(NodeKind::Name { id, .. }) => {
                if !self.visited.insert(target) {
                    return;
                }
                let ty = value.map(|v| infer_type(self, ast, v));
                let kind = match value.and_then(|v| ast.tag(v)) {
                    Some(NodeTag::Lambda) => SymbolKind::Lambda,
                    _ => SymbolKind::Variable,
                };
                self.define(id, kind, target, ty);
            }
            Some(NodeKind::Tuple { elts, .. }) | Some(NodeKind::List { elts, .. }) => {
                if !self.visited.insert(target) {
                    return;
                }
                //`a, b = 1, 2` binds element-wise
                let values: Vec<Option<NodeRef>> = match value.and_then(|v| ast.kind(v)) {
                    Some(NodeKind::Tuple { elts: values, .. })
                    | Some(NodeKind::List { elts: values, .. })
                        if values.len() == elts.len() =>
                    {
                        values.iter().map(|v| Some(*v)).collect()
                    }
                    _ => vec![None; elts.len()],
                };
                seq.extend(
                    elts.iter()
                        .zip(values)
                        .map(|(target, value)| Work::Bind {
                            target: *target,
                            value,
                        }),
                );
            }
            //attribute and subscript targets read their object
            _ => seq.push(Work::Visit(target)),
        }
    }

    fn open(&mut self, ast: &Ast, node: NodeRef) {
        let Some(kind) = ast.kind(node) else {
            self.enter_scope("<invalid>");
            return;
        };
        match kind {
            NodeKind::FunctionDef { name, args, .. } => {
                self.define(
                    name,
                    SymbolKind::Function,
                    node,
                    Some(TypeInfo::new("function", 1.0)),
                );
                self.enter_scope(format!("function_{name}"));
                for arg in args {
                    self.define(arg, SymbolKind::Parameter, node, None);
                }
            }
            NodeKind::ClassDef { name, .. } => {
                self.define(name, SymbolKind::Class, node, Some(TypeInfo::new("type", 1.0)));
                self.enter_scope(format!("class_{name}"));
            }
            NodeKind::Lambda { args, .. } => {
                self.enter_scope("lambda");
                for arg in args {
                    self.define(arg, SymbolKind::Parameter, node, None);
                }
            }
            NodeKind::ListComp { .. } => {
                self.enter_scope("<listcomp>");
            }
            NodeKind::SetComp { .. } => {
                self.enter_scope("<setcomp>");
            }
            NodeKind::DictComp { .. } => {
                self.enter_scope("<dictcomp>");
            }
            NodeKind::GeneratorExp { .. } => {
                self.enter_scope("<genexpr>");
            }
            other => {
                self.enter_scope(other.tag().name());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use sylva_ast::{Ast, ExprContext, NodeKind};

    use crate::{SymbolKind, SymbolTable};

    #[test]
    fn function_scope() {
        let _ = pretty_env_logger::try_init();
        //def f(a):
        //    b = a
        //    return b
        let mut ast = Ast::new();
        let a = ast.new_name("a", ExprContext::Load);
        let assign = ast.new_assign_name("b", a);
        let b = ast.new_name("b", ExprContext::Load);
        let ret = ast.new_return(Some(b));
        let f = ast.new_function("f", vec!["a".to_owned()], vec![assign, ret]);
        ast.push_stmt(f);

        let mut table = SymbolTable::new();
        table.analyze(&ast, ast.root).unwrap();
        assert_eq!(table.current_scope(), table.root_scope());

        let root = &table[table.root_scope()];
        assert_eq!(root.children.len(), 1);
        let f_scope = root.children[0];
        assert_eq!(table[f_scope].name, "function_f");
        assert_eq!(table[f_scope].level, 1);

        let f_sym = table.lookup("f").unwrap();
        assert_eq!(table[f_sym].kind, SymbolKind::Function);

        let param = table.lookup_from(f_scope, "a").unwrap();
        assert_eq!(table[param].kind, SymbolKind::Parameter);
        assert_eq!(table[param].uses, vec![a]);

        let local = table.lookup_from(f_scope, "b").unwrap();
        assert_eq!(table[local].definitions.len(), 1);
        assert_eq!(table[local].uses, vec![b]);
        assert!(table.lookup("b").is_none());
    }

    #[test]
    fn tuple_unpacking_types() {
        //a, b = 1, "x"
        let mut ast = Ast::new();
        let ta = ast.new_name("a", ExprContext::Store);
        let tb = ast.new_name("b", ExprContext::Store);
        let target = ast.add(NodeKind::Tuple {
            elts: vec![ta, tb],
            ctx: ExprContext::Store,
        });
        let one = ast.new_constant(1);
        let x = ast.new_constant("x");
        let value = ast.add(NodeKind::Tuple {
            elts: vec![one, x],
            ctx: ExprContext::Load,
        });
        let assign = ast.new_assign(vec![target], value);
        ast.push_stmt(assign);

        let mut table = SymbolTable::new();
        table.analyze(&ast, ast.root).unwrap();
        let a = table.lookup("a").unwrap();
        let b = table.lookup("b").unwrap();
        assert_eq!(table[a].ty.as_ref().unwrap().name, "int");
        assert_eq!(table[b].ty.as_ref().unwrap().name, "str");
    }

    #[test]
    fn comprehension_scope() {
        //[i for i in range(3)]
        let mut ast = Ast::new();
        let target = ast.new_name("i", ExprContext::Store);
        let three = ast.new_constant(3);
        let iter = ast.new_call_name("range", vec![three]);
        let gen = ast.add(NodeKind::Comprehension {
            target: Some(target),
            iter: Some(iter),
            ifs: vec![],
            is_async: false,
        });
        let elt = ast.new_name("i", ExprContext::Load);
        let comp = ast.add(NodeKind::ListComp {
            elt: Some(elt),
            generators: vec![gen],
        });
        let stmt = ast.new_expr_stmt(comp);
        ast.push_stmt(stmt);

        let mut table = SymbolTable::new();
        table.analyze(&ast, ast.root).unwrap();
        assert!(table.lookup("i").is_none());
        let comp_scope = table[table.root_scope()].children[0];
        assert_eq!(table[comp_scope].name, "<listcomp>");
        let i = table.lookup_from(comp_scope, "i").unwrap();
        assert_eq!(table[i].uses, vec![elt]);
        assert!(table.undefined_variables().is_empty());
    }
}
