//! CST → AST lowering.
//!
//! The grammar hides several rules (`_expr`, `_suffixed`, `_unary_expr`), so
//! an expression reaches us as a *splice*: an optional run of unary operator
//! tokens, one atom, then zero or more `suffix_*` siblings (`.f`, `[e]`,
//! slices, call argument lists, implicit-plus objects). The builder folds
//! each splice back into a single expression node and dispatches on the CST
//! kind for everything else.
//!
//! Robustness rules:
//! - Unknown kinds (including tree-sitter `ERROR` recovery nodes) lower to
//!   `Error` nodes at the offending range; the walk never aborts.
//! - Grammar extensions outside the Jsonnet language (destructuring binds,
//!   the `??` operator) also lower to `Error`.
//! - Comments are stripped from every child list before structural parsing.

use lsp_types::{Range, Url};
use tree_sitter::Node as Cst;

use super::node::{ImportKind, NodeData, NodeId, NodeKind, Operator, UnaryOp, Visibility};
use super::Document;
use crate::errors::Result;
use crate::location::{merge_ranges, LineIndex};
use crate::parse::parse_jsonnet;

pub(super) fn build(uri: Url, source: String) -> Result<Document> {
    let tree = parse_jsonnet(&source)?;
    let (nodes, root) = {
        let mut builder = Builder::new(&source);
        let root = builder.document(tree.root_node());
        (builder.nodes, root)
    };
    Ok(Document::assemble(uri, source, nodes, root))
}

const SUFFIX_KINDS: &[&str] = &[
    "suffix_index",
    "suffix_index_expr",
    "suffix_slice",
    "suffix_apply",
    "suffix_object_apply",
];

fn is_comment(n: Cst) -> bool {
    matches!(n.kind(), "line_comment" | "block_comment")
}

fn is_suffix(n: Cst) -> bool {
    SUFFIX_KINDS.contains(&n.kind())
}

struct Builder<'s> {
    source: &'s str,
    line_index: LineIndex,
    nodes: Vec<NodeData>,
}

impl<'s> Builder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            line_index: LineIndex::new(source),
            nodes: Vec::new(),
        }
    }

    fn alloc(&mut self, range: Range, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            range,
            parent: None,
            kind,
        });
        id
    }

    fn range_of(&self, n: Cst) -> Range {
        self.line_index.range(self.source, n.byte_range())
    }

    fn node_range(&self, id: NodeId) -> Range {
        self.nodes[id.index()].range
    }

    fn text(&self, n: Cst) -> &'s str {
        &self.source[n.byte_range()]
    }

    fn error(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        self.alloc(
            range,
            NodeKind::Error {
                cst_kind: n.kind().to_string(),
            },
        )
    }

    fn error_at(&mut self, range: Range, cst_kind: &str) -> NodeId {
        self.alloc(
            range,
            NodeKind::Error {
                cst_kind: cst_kind.to_string(),
            },
        )
    }

    /// All children except comments, anonymous tokens included.
    fn raw_children<'t>(&self, n: Cst<'t>) -> Vec<Cst<'t>> {
        let mut cursor = n.walk();
        n.children(&mut cursor).filter(|c| !is_comment(*c)).collect()
    }

    /// Named children except comments.
    fn named_children<'t>(&self, n: Cst<'t>) -> Vec<Cst<'t>> {
        let mut cursor = n.walk();
        n.named_children(&mut cursor)
            .filter(|c| !is_comment(*c))
            .collect()
    }

    /// The nodes of an expression splice: named children plus the anonymous
    /// unary operator tokens that the hidden `_unary_expr` rule leaves
    /// behind. Keywords and punctuation stay out (they are not in the unary
    /// token set).
    fn expr_nodes<'t>(&self, children: &[Cst<'t>]) -> Vec<Cst<'t>> {
        children
            .iter()
            .copied()
            .filter(|c| {
                (c.is_named() && !is_comment(*c))
                    || (!c.is_named() && UnaryOp::from_token(self.text(*c)).is_some())
            })
            .collect()
    }

    // ---- splice folding

    /// Fold one expression splice (unary tokens, atom, suffixes) into a
    /// single node. `fallback` is used when the splice is empty.
    fn expr_from_nodes(&mut self, nodes: &[Cst], fallback: Range) -> NodeId {
        let mut i = 0;
        let mut unary_ops: Vec<(UnaryOp, Range)> = Vec::new();
        while i < nodes.len() && !nodes[i].is_named() {
            match UnaryOp::from_token(self.text(nodes[i])) {
                Some(op) => {
                    unary_ops.push((op, self.range_of(nodes[i])));
                    i += 1;
                }
                None => break,
            }
        }

        let Some(&atom) = nodes.get(i) else {
            return self.error_at(fallback, "missing expression");
        };

        let mut expr = self.atom(atom);
        for &suffix in &nodes[i + 1..] {
            expr = self.apply_suffix(expr, suffix);
        }

        // Unary operators bind tighter than binary but looser than any
        // suffix, so they wrap the folded chain, innermost last.
        for (op, op_range) in unary_ops.into_iter().rev() {
            let range = merge_ranges(op_range, self.node_range(expr));
            expr = self.alloc(range, NodeKind::Unary { op, operand: expr });
        }
        expr
    }

    /// Wrap `base` with one suffix node.
    fn apply_suffix(&mut self, base: NodeId, suffix: Cst) -> NodeId {
        let range = merge_ranges(self.node_range(base), self.range_of(suffix));
        match suffix.kind() {
            "suffix_index" => {
                let field = match self.named_children(suffix).first() {
                    Some(&ident) if ident.kind() == "ident" => {
                        let r = self.range_of(ident);
                        let name = self.text(ident).to_string();
                        self.alloc(r, NodeKind::FieldRef { name })
                    }
                    _ => self.error(suffix),
                };
                self.alloc(
                    range,
                    NodeKind::FieldAccess {
                        target: base,
                        field,
                    },
                )
            }
            "suffix_index_expr" => {
                let inner = self.expr_nodes(&self.raw_children(suffix));
                let begin = self.expr_from_nodes(&inner, self.range_of(suffix));
                self.alloc(
                    range,
                    NodeKind::Slice {
                        target: base,
                        begin: Some(begin),
                        end: None,
                        step: None,
                    },
                )
            }
            "suffix_slice" => {
                let (begin, end, step) = self.slice_parts(suffix);
                self.alloc(
                    range,
                    NodeKind::Slice {
                        target: base,
                        begin,
                        end,
                        step,
                    },
                )
            }
            "suffix_apply" => {
                let args = self
                    .named_children(suffix)
                    .into_iter()
                    .filter(|c| c.kind() == "arg")
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|a| self.arg(a))
                    .collect();
                self.alloc(range, NodeKind::Call { callee: base, args })
            }
            // `a {}` is object composition without an explicit operator.
            "suffix_object_apply" => {
                let rhs = match self.named_children(suffix).first() {
                    Some(&obj) => self.atom(obj),
                    None => self.error(suffix),
                };
                self.alloc(
                    range,
                    NodeKind::Binary {
                        op: Operator::Plus,
                        lhs: base,
                        rhs,
                    },
                )
            }
            _ => self.error(suffix),
        }
    }

    /// Split `a[begin:end:step]` on its top-level `:` tokens; every part is
    /// optional.
    fn slice_parts(&mut self, suffix: Cst) -> (Option<NodeId>, Option<NodeId>, Option<NodeId>) {
        let mut parts: [Vec<Cst>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        let mut slot = 0usize;
        for child in self.raw_children(suffix) {
            if !child.is_named() && self.text(child) == ":" {
                slot = (slot + 1).min(2);
            } else if matches!(self.text(child), "[" | "]") && !child.is_named() {
                // brackets delimit, nothing to collect
            } else {
                parts[slot].push(child);
            }
        }
        let mut build = |nodes: &[Cst]| {
            let nodes = self.expr_nodes(nodes);
            if nodes.is_empty() {
                None
            } else {
                Some(self.expr_from_nodes(&nodes, self.range_of(suffix)))
            }
        };
        let begin = build(&parts[0]);
        let end = build(&parts[1]);
        let step = build(&parts[2]);
        (begin, end, step)
    }

    /// Split the element region of an array into per-element splices. A new
    /// element starts at every non-suffix node once the current element has
    /// consumed its atom; leading unary tokens keep an element open.
    fn split_elements<'t>(&self, nodes: &[Cst<'t>]) -> Vec<Vec<Cst<'t>>> {
        let mut groups: Vec<Vec<Cst<'t>>> = Vec::new();
        let mut current: Vec<Cst<'t>> = Vec::new();
        let mut has_atom = false;
        for &n in nodes {
            if has_atom && !is_suffix(n) {
                groups.push(std::mem::take(&mut current));
                has_atom = false;
            }
            if n.is_named() {
                has_atom = true;
            }
            current.push(n);
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    // ---- dispatch

    fn document(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let nodes = self.expr_nodes(&self.raw_children(n));
        let body = self.expr_from_nodes(&nodes, range);
        self.alloc(range, NodeKind::Document { body })
    }

    fn atom(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        match n.kind() {
            "literal" => match self.text(n) {
                "null" => self.alloc(range, NodeKind::Null),
                "true" => self.alloc(range, NodeKind::Bool { value: true }),
                "false" => self.alloc(range, NodeKind::Bool { value: false }),
                "self" => self.alloc(range, NodeKind::SelfRef),
                "super" => self.alloc(range, NodeKind::Super),
                _ => self.error(n),
            },
            "number" => {
                let text: String = self.text(n).chars().filter(|&c| c != '_').collect();
                match text.parse::<f64>() {
                    Ok(value) => self.alloc(range, NodeKind::Num { value }),
                    Err(_) => self.error(n),
                }
            }
            "string" => {
                let raw = strip_delimiters(self.text(n), 1, 1);
                self.alloc(range, NodeKind::Str { raw })
            }
            "verbatim_string" => {
                let raw = strip_delimiters(self.text(n), 2, 1);
                self.alloc(range, NodeKind::Str { raw })
            }
            "string_block" => {
                let raw = strip_delimiters(self.text(n), 3, 3);
                self.alloc(range, NodeKind::Str { raw })
            }
            "ident_ref" => {
                let name = self.text(n).trim().to_string();
                self.alloc(
                    range,
                    NodeKind::VarRef {
                        name,
                        scope: None,
                        target: None,
                    },
                )
            }
            "dollar" => self.alloc(range, NodeKind::Dollar),
            "array" => self.array_or_list_comp(n),
            "object" => self.object_or_obj_comp(n),
            // Parentheses are transparent: the inner expression keeps its
            // own range and the parens disappear from the tree.
            "parened" => {
                let nodes = self.expr_nodes(&self.raw_children(n));
                self.expr_from_nodes(&nodes, range)
            }
            "if_then_else" => self.if_then_else(n),
            "function_expr" => self.function_expr(n),
            "import_expr" => self.import_expr(n),
            "local_expr" => self.local_expr(n),
            "assert_expr" => self.assert_expr(n),
            "binary_expr" => self.binary_expr(n),
            _ => self.error(n),
        }
    }

    fn binary_expr(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);

        let op = n
            .child_by_field_name("op")
            .and_then(|t| Operator::from_token(self.text(t)));
        let Some(op) = op else {
            // `??` and anything else outside the operator set.
            return self.error(n);
        };

        let mut cursor = n.walk();
        let lhs_nodes: Vec<Cst> = n
            .children_by_field_name("lhs", &mut cursor)
            .filter(|c| !is_comment(*c))
            .collect();
        let mut cursor = n.walk();
        let rhs_nodes: Vec<Cst> = n
            .children_by_field_name("rhs", &mut cursor)
            .filter(|c| !is_comment(*c))
            .collect();

        let lhs = self.expr_from_nodes(&lhs_nodes, range);
        let rhs = self.expr_from_nodes(&rhs_nodes, range);
        self.alloc(range, NodeKind::Binary { op, lhs, rhs })
    }

    fn local_expr(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let nodes = self.expr_nodes(&self.raw_children(n));

        let bind_count = nodes.iter().take_while(|c| c.kind() == "bind").count();
        let binds: Vec<NodeId> = nodes[..bind_count]
            .iter()
            .map(|&b| self.bind(b))
            .collect();
        let body = self.expr_from_nodes(&nodes[bind_count..], range);
        self.alloc(range, NodeKind::Local { binds, body })
    }

    /// `x = e`, `f(p) = e`, and `f = function(p) e`; the latter two both
    /// surface a `params` child and collapse into a `Fn`-valued bind.
    fn bind(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let Some(&ident) = children.iter().find(|c| c.kind() == "ident") else {
            // Destructuring patterns are a grammar extension we do not model.
            return self.error(n);
        };
        let params = children.iter().copied().find(|c| c.kind() == "params");
        let eq = children
            .iter()
            .position(|c| !c.is_named() && self.text(*c) == "=");

        let value_region: Vec<Cst> = match eq {
            Some(i) => children[i + 1..]
                .iter()
                .copied()
                .filter(|c| Some(c.id()) != params.map(|p| p.id()))
                .collect(),
            None => Vec::new(),
        };
        let value_nodes = self.expr_nodes(&value_region);

        let id = self.var(ident);
        let value = match params {
            Some(params_node) => {
                let params = self.params_list(params_node);
                let body = self.expr_from_nodes(&value_nodes, range);
                self.alloc(range, NodeKind::Fn { params, body })
            }
            None => self.expr_from_nodes(&value_nodes, range),
        };
        self.alloc(range, NodeKind::Bind { id, value })
    }

    fn var(&mut self, ident: Cst) -> NodeId {
        let range = self.range_of(ident);
        let name = self.text(ident).to_string();
        self.alloc(
            range,
            NodeKind::Var {
                name,
                references: Vec::new(),
            },
        )
    }

    fn params_list(&mut self, params: Cst) -> Vec<NodeId> {
        self.named_children(params)
            .into_iter()
            .filter(|c| c.kind() == "param")
            .collect::<Vec<_>>()
            .into_iter()
            .map(|p| self.param(p))
            .collect()
    }

    fn param(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let Some(first) = children.iter().find(|c| c.is_named()) else {
            return self.error(n);
        };
        if first.kind() != "ident" {
            return self.error(n);
        }
        let id = self.var(*first);

        let eq = children
            .iter()
            .position(|c| !c.is_named() && self.text(*c) == "=");
        let default = eq.map(|i| {
            let nodes = self.expr_nodes(&children[i + 1..]);
            self.expr_from_nodes(&nodes, range)
        });
        self.alloc(range, NodeKind::Param { id, default })
    }

    fn function_expr(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let nodes = self.expr_nodes(&self.raw_children(n));

        let params_at = nodes.iter().position(|c| c.kind() == "params");
        let (params, body_nodes): (Vec<NodeId>, &[Cst]) = match params_at {
            Some(i) => (self.params_list(nodes[i]), &nodes[i + 1..]),
            None => (Vec::new(), &nodes[..]),
        };
        let body = self.expr_from_nodes(body_nodes, range);
        self.alloc(range, NodeKind::Fn { params, body })
    }

    fn arg(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let eq = children
            .iter()
            .position(|c| !c.is_named() && self.text(*c) == "=");
        match eq {
            Some(i) => {
                let name = children[..i]
                    .iter()
                    .find(|c| c.kind() == "ident")
                    .map(|&ident| {
                        let r = self.range_of(ident);
                        let name = self.text(ident).to_string();
                        self.alloc(r, NodeKind::ParamRef { name })
                    });
                let nodes = self.expr_nodes(&children[i + 1..]);
                let value = self.expr_from_nodes(&nodes, range);
                self.alloc(range, NodeKind::Arg { value, name })
            }
            None => {
                let nodes = self.expr_nodes(&children);
                let value = self.expr_from_nodes(&nodes, range);
                self.alloc(range, NodeKind::Arg { value, name: None })
            }
        }
    }

    fn import_expr(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let kind = children
            .first()
            .filter(|c| !c.is_named())
            .map(|&kw| match self.text(kw) {
                "importstr" => ImportKind::Str,
                "importbin" => ImportKind::Bin,
                _ => ImportKind::Default,
            })
            .unwrap_or(ImportKind::Default);

        let path = match children.iter().find(|c| c.is_named()) {
            Some(&s) => self.atom(s),
            None => return self.error(n),
        };
        self.alloc(range, NodeKind::Import { kind, path })
    }

    fn assert_expr(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let assertion = match children.iter().find(|c| c.kind() == "assertion") {
            Some(&a) => self.assertion(a),
            None => self.error(n),
        };
        let after: Vec<Cst> = children
            .iter()
            .copied()
            .skip_while(|c| c.kind() != "assertion")
            .skip(1)
            .collect();
        let body_nodes = self.expr_nodes(&after);
        let body = self.expr_from_nodes(&body_nodes, range);
        self.alloc(range, NodeKind::AssertExpr { assertion, body })
    }

    fn assertion(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        // `assert <cond> [: <message>]`; the separator is the only
        // top-level anonymous `:`.
        let colon = children
            .iter()
            .position(|c| !c.is_named() && self.text(*c) == ":");
        let (cond_region, msg_region) = match colon {
            Some(i) => (&children[..i], &children[i + 1..]),
            None => (&children[..], &children[..0]),
        };

        let cond_nodes = self.expr_nodes(cond_region);
        let condition = self.expr_from_nodes(&cond_nodes, range);
        let msg_nodes = self.expr_nodes(msg_region);
        let message = if msg_nodes.is_empty() {
            None
        } else {
            Some(self.expr_from_nodes(&msg_nodes, range))
        };
        self.alloc(range, NodeKind::Assert { condition, message })
    }

    fn if_then_else(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let keyword = |text: &str| {
            children
                .iter()
                .position(|c| !c.is_named() && self.text(*c) == text)
        };
        let then_at = keyword("then");
        let else_at = keyword("else");

        let cond_region = match then_at {
            Some(i) => &children[..i],
            None => &children[..],
        };
        let cons_region = match (then_at, else_at) {
            (Some(t), Some(e)) => &children[t + 1..e],
            (Some(t), None) => &children[t + 1..],
            _ => &children[..0],
        };
        let alt_region = match else_at {
            Some(e) => &children[e + 1..],
            None => &children[..0],
        };

        let cond_nodes = self.expr_nodes(cond_region);
        let condition = self.expr_from_nodes(&cond_nodes, range);
        let cons_nodes = self.expr_nodes(cons_region);
        let consequence = self.expr_from_nodes(&cons_nodes, range);
        let alt_nodes = self.expr_nodes(alt_region);
        let alternative = if alt_nodes.is_empty() {
            None
        } else {
            Some(self.expr_from_nodes(&alt_nodes, range))
        };

        self.alloc(
            range,
            NodeKind::If {
                condition,
                consequence,
                alternative,
            },
        )
    }

    fn array_or_list_comp(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let spec_at = children
            .iter()
            .position(|c| matches!(c.kind(), "for_spec" | "if_spec"));

        let element_region = match spec_at {
            Some(i) => &children[..i],
            None => &children[..],
        };
        let element_nodes = self.expr_nodes(element_region);
        let groups = self.split_elements(&element_nodes);

        match spec_at {
            None => {
                let values = groups
                    .iter()
                    .map(|g| self.expr_from_nodes(g, range))
                    .collect();
                self.alloc(range, NodeKind::Array { values })
            }
            Some(i) => {
                let specs: Vec<Cst> = children[i..]
                    .iter()
                    .copied()
                    .filter(|c| matches!(c.kind(), "for_spec" | "if_spec"))
                    .collect();
                if specs.first().map(|c| c.kind()) != Some("for_spec") {
                    return self.error(n);
                }
                let Some(expr_group) = groups.first() else {
                    return self.error(n);
                };
                let expr = self.expr_from_nodes(expr_group, range);
                let for_spec = self.for_spec(specs[0]);
                let comp_spec = specs[1..]
                    .iter()
                    .map(|&s| self.comp_spec_node(s))
                    .collect();
                self.alloc(
                    range,
                    NodeKind::ListComp {
                        expr,
                        for_spec,
                        comp_spec,
                    },
                )
            }
        }
    }

    fn comp_spec_node(&mut self, n: Cst) -> NodeId {
        match n.kind() {
            "for_spec" => self.for_spec(n),
            "if_spec" => self.if_spec(n),
            _ => self.error(n),
        }
    }

    fn for_spec(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let Some(&ident) = children.iter().find(|c| c.is_named()) else {
            return self.error(n);
        };
        if ident.kind() != "ident" {
            return self.error(n);
        }
        let id = self.var(ident);

        let in_at = children
            .iter()
            .position(|c| !c.is_named() && self.text(*c) == "in");
        let source_region = match in_at {
            Some(i) => &children[i + 1..],
            None => &children[..0],
        };
        let source_nodes = self.expr_nodes(source_region);
        let source = self.expr_from_nodes(&source_nodes, range);
        self.alloc(range, NodeKind::ForSpec { id, source })
    }

    fn if_spec(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let nodes = self.expr_nodes(&self.raw_children(n));
        let condition = self.expr_from_nodes(&nodes, range);
        self.alloc(range, NodeKind::IfSpec { condition })
    }

    fn object_or_obj_comp(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.named_children(n);

        let mut binds = Vec::new();
        let mut asserts = Vec::new();
        let mut fields = Vec::new();
        let mut specs: Vec<NodeId> = Vec::new();
        let mut spec_kinds: Vec<&str> = Vec::new();

        for child in children {
            match child.kind() {
                "member" => {
                    let Some(&inner) = self.named_children(child).first() else {
                        continue;
                    };
                    match inner.kind() {
                        "member_local" => {
                            if let Some(&b) =
                                self.named_children(inner).iter().find(|c| c.kind() == "bind")
                            {
                                binds.push(self.bind(b));
                            }
                        }
                        "member_assert" => {
                            if let Some(&a) = self
                                .named_children(inner)
                                .iter()
                                .find(|c| c.kind() == "assertion")
                            {
                                asserts.push(self.assertion(a));
                            }
                        }
                        "field" => fields.push(self.field(inner)),
                        _ => {}
                    }
                }
                "for_spec" | "if_spec" => {
                    spec_kinds.push(child.kind());
                    specs.push(self.comp_spec_node(child));
                }
                _ => {}
            }
        }

        if specs.is_empty() {
            let object = self.alloc(
                range,
                NodeKind::Object {
                    binds,
                    asserts,
                    fields,
                },
            );
            return object;
        }

        // Object comprehension: exactly one field, computed key, and the
        // leading spec must be a for-spec.
        if spec_kinds.first() != Some(&"for_spec") {
            return self.error_at(range, "object");
        }
        if fields.len() != 1 {
            return self.error_at(range, "object");
        }
        let field = fields[0];
        let computed = matches!(
            self.nodes[field.index()].kind,
            NodeKind::Field { key, .. } if matches!(self.nodes[key.index()].kind, NodeKind::ComputedKey { .. })
        );
        if !computed {
            return self.error_at(range, "object");
        }

        let for_spec = specs[0];
        let comp_spec = specs[1..].to_vec();
        self.alloc(
            range,
            NodeKind::ObjComp {
                field,
                binds,
                asserts,
                for_spec,
                comp_spec,
            },
        )
    }

    fn field(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        let key = match children.iter().find(|c| c.kind() == "field_name") {
            Some(&k) => self.field_key(k),
            None => self.error(n),
        };

        let vis_at = children.iter().position(|c| c.kind() == "visibility");
        let visibility = vis_at
            .map(|i| Visibility::from_token(self.text(children[i])))
            .unwrap_or_default();

        // An anonymous `+` before the visibility marker is the `+:` form; a
        // `+` after it would be a unary token of the value splice.
        let inherited = match vis_at {
            Some(i) => children[..i]
                .iter()
                .any(|c| !c.is_named() && self.text(*c) == "+"),
            None => false,
        };

        let params = children.iter().copied().find(|c| c.kind() == "params");

        let value_region: Vec<Cst> = match vis_at {
            Some(i) => children[i + 1..]
                .iter()
                .copied()
                .filter(|c| Some(c.id()) != params.map(|p| p.id()))
                .collect(),
            None => Vec::new(),
        };
        let value_nodes = self.expr_nodes(&value_region);

        let value = match params {
            Some(params_node) => {
                let params_range = self.range_of(params_node);
                let param_ids = self.params_list(params_node);
                let body = self.expr_from_nodes(&value_nodes, range);
                let fn_range = merge_ranges(params_range, self.node_range(body));
                self.alloc(
                    fn_range,
                    NodeKind::Fn {
                        params: param_ids,
                        body,
                    },
                )
            }
            None => self.expr_from_nodes(&value_nodes, range),
        };

        self.alloc(
            range,
            NodeKind::Field {
                key,
                value,
                visibility,
                inherited,
            },
        )
    }

    fn field_key(&mut self, n: Cst) -> NodeId {
        let range = self.range_of(n);
        let children = self.raw_children(n);

        // `[e]` is a computed key.
        if children
            .first()
            .is_some_and(|c| !c.is_named() && self.text(*c) == "[")
        {
            let nodes = self.expr_nodes(&children);
            let expr = self.expr_from_nodes(&nodes, range);
            return self.alloc(range, NodeKind::ComputedKey { expr });
        }

        match children.iter().find(|c| c.is_named()) {
            Some(&ident) if ident.kind() == "ident" => {
                let r = self.range_of(ident);
                let name = self.text(ident).to_string();
                let id = self.alloc(r, NodeKind::FieldId { name });
                self.alloc(range, NodeKind::FixedKey { id })
            }
            Some(&s) if matches!(s.kind(), "string" | "verbatim_string" | "string_block") => {
                let id = self.atom(s);
                self.alloc(range, NodeKind::FixedKey { id })
            }
            _ => self.error(n),
        }
    }
}

/// Strip `prefix`/`suffix` delimiter bytes from a token's text, tolerating
/// truncated tokens from error recovery.
fn strip_delimiters(text: &str, prefix: usize, suffix: usize) -> String {
    if text.len() >= prefix + suffix {
        text[prefix..text.len() - suffix].to_string()
    } else {
        String::new()
    }
}
