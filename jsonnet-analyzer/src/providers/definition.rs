//! Go-to-definition.
//!
//! Variable references are answered straight from the resolver's links.
//! Field and named-argument references require chasing the semantic graph:
//! through composition (`+`), conditional branches, field accesses,
//! variable bindings, imports, and the reflexive `self` / `super` / `$`
//! forms. The chase is cycle-guarded per node and per importee URI.

use std::collections::HashSet;
use std::sync::Arc;

use lsp_types::{Location, Position, Url};

use crate::ast::{AnalysisPhase, Document, ImportKind, NodeId, NodeKind, Operator};
use crate::loader::DocumentLoader;
use crate::scope::{FieldBinding, FieldScopeId};

/// A set of field bindings visible on some expression.
///
/// Objects contribute their own field scope; `a + b` contributes a composed
/// view where the right side shadows the left (the left is the `super`
/// chain).
#[derive(Clone)]
pub enum FieldScopeView {
    Object {
        doc: Arc<Document>,
        scope: FieldScopeId,
    },
    Composed {
        base: Box<FieldScopeView>,
        overlay: Box<FieldScopeView>,
    },
}

impl FieldScopeView {
    fn object(doc: &Arc<Document>, scope: FieldScopeId) -> Self {
        Self::Object {
            doc: Arc::clone(doc),
            scope,
        }
    }

    fn composed(base: Self, overlay: Self) -> Self {
        Self::Composed {
            base: Box::new(base),
            overlay: Box::new(overlay),
        }
    }

    /// All bindings for `name`, overlay before base: a composed object may
    /// define the field on both sides (`o + { f: 2 }` overrides `o.f`), and
    /// every definition site is an answer.
    pub fn lookup(&self, name: &str) -> Vec<(Arc<Document>, FieldBinding)> {
        match self {
            Self::Object { doc, scope } => doc
                .scopes()
                .lookup_field(*scope, name)
                .cloned()
                .map(|binding| (Arc::clone(doc), binding))
                .into_iter()
                .collect(),
            Self::Composed { base, overlay } => {
                let mut out = overlay.lookup(name);
                out.extend(base.lookup(name));
                out
            }
        }
    }
}

/// Cycle guard threaded through the recursive scope search. Entries are
/// pushed on entry and popped on exit, so diamonds (two paths reaching the
/// same expression) still contribute while true cycles terminate.
#[derive(Default)]
struct Visited {
    nodes: HashSet<(Url, NodeId)>,
    imports: HashSet<Url>,
}

pub struct DefinitionProvider<'a> {
    loader: &'a mut DocumentLoader,
}

impl<'a> DefinitionProvider<'a> {
    pub fn new(loader: &'a mut DocumentLoader) -> Self {
        Self { loader }
    }

    /// Definition sites for the reference at `pos`, empty when the position
    /// is not on a reference (or the document is not resolved).
    pub fn serve(&mut self, doc: &Arc<Document>, pos: Position) -> Vec<Location> {
        if doc.phase() != AnalysisPhase::ScopeResolved {
            return Vec::new();
        }
        let Some(node) = doc.node_at_position(pos) else {
            return Vec::new();
        };
        self.find_definitions(doc, node)
    }

    pub fn find_definitions(&mut self, doc: &Arc<Document>, node: NodeId) -> Vec<Location> {
        match doc.kind(node) {
            NodeKind::VarRef {
                target: Some(var), ..
            } => vec![doc.location(*var)],
            NodeKind::VarRef { .. } => Vec::new(),
            NodeKind::FieldRef { .. } => self
                .find_field_binding(doc, node)
                .into_iter()
                .map(|(key_doc, binding)| key_doc.location(binding.key))
                .collect(),
            NodeKind::ParamRef { .. } => self.find_param_binding(doc, node),
            _ => Vec::new(),
        }
    }

    /// Every field binding a `FieldRef` may resolve to, deduplicated.
    pub fn find_field_binding(
        &mut self,
        doc: &Arc<Document>,
        field_ref: NodeId,
    ) -> Vec<(Arc<Document>, FieldBinding)> {
        let mut visited = Visited::default();
        self.field_bindings_of(doc, field_ref, &mut visited)
    }

    fn field_bindings_of(
        &mut self,
        doc: &Arc<Document>,
        field_ref: NodeId,
        visited: &mut Visited,
    ) -> Vec<(Arc<Document>, FieldBinding)> {
        let NodeKind::FieldRef { name } = doc.kind(field_ref) else {
            return Vec::new();
        };
        let name = name.clone();

        let Some(access) = doc.parent(field_ref) else {
            return Vec::new();
        };
        let NodeKind::FieldAccess { target, field } = doc.kind(access) else {
            return Vec::new();
        };
        if *field != field_ref {
            return Vec::new();
        }
        let target = *target;

        let scopes = self.find_field_scope(doc, target, visited);
        let mut seen: HashSet<(String, NodeId)> = HashSet::new();
        let mut out = Vec::new();
        for scope in scopes {
            for (key_doc, binding) in scope.lookup(&name) {
                if seen.insert((key_doc.uri().to_string(), binding.key)) {
                    out.push((key_doc, binding));
                }
            }
        }
        out
    }

    /// The field scope set of an expression. Several scopes may come back:
    /// both branches of an `if` contribute, and compositions contribute
    /// pairwise views.
    fn find_field_scope(
        &mut self,
        doc: &Arc<Document>,
        expr: NodeId,
        visited: &mut Visited,
    ) -> Vec<FieldScopeView> {
        let key = (doc.uri().clone(), expr);
        if !visited.nodes.insert(key.clone()) {
            return Vec::new();
        }
        let result = self.find_field_scope_inner(doc, expr, visited);
        visited.nodes.remove(&key);
        result
    }

    fn find_field_scope_inner(
        &mut self,
        doc: &Arc<Document>,
        expr: NodeId,
        visited: &mut Visited,
    ) -> Vec<FieldScopeView> {
        match doc.kind(expr) {
            NodeKind::Object { .. } => doc
                .field_scope_of(expr)
                .map(|scope| vec![FieldScopeView::object(doc, scope)])
                .unwrap_or_default(),

            NodeKind::Binary {
                op: Operator::Plus,
                lhs,
                rhs,
            } => {
                let (lhs, rhs) = (*lhs, *rhs);
                let left = self.find_field_scope(doc, lhs, visited);
                let right = self.find_field_scope(doc, rhs, visited);
                match (left.is_empty(), right.is_empty()) {
                    (true, _) => right,
                    (_, true) => left,
                    _ => {
                        let mut out = Vec::new();
                        for l in &left {
                            for r in &right {
                                out.push(FieldScopeView::composed(l.clone(), r.clone()));
                            }
                        }
                        out
                    }
                }
            }

            NodeKind::FieldAccess { field, .. } => {
                let field = *field;
                let bindings = self.field_bindings_of(doc, field, visited);
                let mut out = Vec::new();
                for (key_doc, binding) in bindings {
                    if let NodeKind::Field { value, .. } = key_doc.kind(binding.target) {
                        out.extend(self.find_field_scope(&key_doc, *value, visited));
                    }
                }
                out
            }

            NodeKind::VarRef {
                name,
                scope: Some(scope),
                ..
            } => {
                let target = doc
                    .scopes()
                    .lookup(*scope, name)
                    .map(|binding| binding.target);
                match target {
                    Some(target) => self.find_field_scope(doc, target, visited),
                    None => Vec::new(),
                }
            }

            NodeKind::If {
                consequence,
                alternative,
                ..
            } => {
                let (consequence, alternative) = (*consequence, *alternative);
                let mut out = self.find_field_scope(doc, consequence, visited);
                if let Some(alt) = alternative {
                    out.extend(self.find_field_scope(doc, alt, visited));
                }
                out
            }

            NodeKind::Import {
                kind: ImportKind::Default,
                ..
            } => {
                let Some(importee) = self.loader.importee(doc, expr) else {
                    return Vec::new();
                };
                let importee_uri = importee.uri().clone();
                if !visited.imports.insert(importee_uri.clone()) {
                    return Vec::new();
                }
                let body = importee.body();
                let out = self.find_field_scope(&importee, body, visited);
                visited.imports.remove(&importee_uri);
                out
            }

            NodeKind::SelfRef => self
                .enclosing_object(doc, expr)
                .and_then(|obj| doc.field_scope_of(obj))
                .map(|scope| vec![FieldScopeView::object(doc, scope)])
                .unwrap_or_default(),

            NodeKind::Dollar => self
                .outermost_object(doc, expr)
                .and_then(|obj| doc.field_scope_of(obj))
                .map(|scope| vec![FieldScopeView::object(doc, scope)])
                .unwrap_or_default(),

            NodeKind::Super => self.super_base_scopes(doc, expr, visited),

            _ => {
                let tails = doc.tails(expr);
                if tails.len() == 1 && tails[0] == expr {
                    return Vec::new();
                }
                let mut out = Vec::new();
                for tail in tails {
                    out.extend(self.find_field_scope(doc, tail, visited));
                }
                out
            }
        }
    }

    /// Nearest object literal enclosing `node`.
    fn enclosing_object(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.ancestors(node)
            .find(|&a| matches!(doc.kind(a), NodeKind::Object { .. }))
    }

    /// Outermost object literal enclosing `node` (what `$` refers to).
    fn outermost_object(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.ancestors(node)
            .filter(|&a| matches!(doc.kind(a), NodeKind::Object { .. }))
            .last()
    }

    /// The compose base of the object enclosing a `super` expression: walk
    /// up through transparent wrappers until the object turns out to be the
    /// right operand of a `+`, then take the left operand's scopes.
    fn super_base_scopes(
        &mut self,
        doc: &Arc<Document>,
        super_node: NodeId,
        visited: &mut Visited,
    ) -> Vec<FieldScopeView> {
        let Some(object) = self.enclosing_object(doc, super_node) else {
            return Vec::new();
        };

        let mut current = object;
        while let Some(parent) = doc.parent(current) {
            match doc.kind(parent) {
                NodeKind::Binary {
                    op: Operator::Plus,
                    lhs,
                    rhs,
                } if *rhs == current => {
                    let lhs = *lhs;
                    return self.find_field_scope(doc, lhs, visited);
                }
                NodeKind::Local { body, .. } | NodeKind::AssertExpr { body, .. }
                    if *body == current =>
                {
                    current = parent;
                }
                NodeKind::If {
                    consequence,
                    alternative,
                    ..
                } if *consequence == current || *alternative == Some(current) => {
                    current = parent;
                }
                _ => break,
            }
        }
        Vec::new()
    }

    /// Definition sites of a named call argument: find the callee
    /// function(s), then the parameter with the argument's name.
    fn find_param_binding(&mut self, doc: &Arc<Document>, param_ref: NodeId) -> Vec<Location> {
        let NodeKind::ParamRef { name } = doc.kind(param_ref) else {
            return Vec::new();
        };
        let name = name.clone();

        let Some(arg) = doc.parent(param_ref) else {
            return Vec::new();
        };
        if !matches!(doc.kind(arg), NodeKind::Arg { name: Some(n), .. } if *n == param_ref) {
            return Vec::new();
        }
        let Some(call) = doc.parent(arg) else {
            return Vec::new();
        };
        let NodeKind::Call { callee, .. } = doc.kind(call) else {
            return Vec::new();
        };
        let callee = *callee;

        let mut visited = Visited::default();
        let mut out = Vec::new();
        for (fn_doc, fn_node) in self.find_fn(doc, callee, &mut visited) {
            let NodeKind::Fn { params, .. } = fn_doc.kind(fn_node) else {
                continue;
            };
            for &param in params {
                let NodeKind::Param { id: var, .. } = fn_doc.kind(param) else {
                    continue;
                };
                if fn_doc.name_of(*var) == Some(name.as_str()) {
                    out.push(fn_doc.location(*var));
                }
            }
        }
        out
    }

    /// The function(s) an expression may evaluate to, for call-site
    /// parameter lookups.
    fn find_fn(
        &mut self,
        doc: &Arc<Document>,
        expr: NodeId,
        visited: &mut Visited,
    ) -> Vec<(Arc<Document>, NodeId)> {
        let key = (doc.uri().clone(), expr);
        if !visited.nodes.insert(key.clone()) {
            return Vec::new();
        }
        let result = self.find_fn_inner(doc, expr, visited);
        visited.nodes.remove(&key);
        result
    }

    fn find_fn_inner(
        &mut self,
        doc: &Arc<Document>,
        expr: NodeId,
        visited: &mut Visited,
    ) -> Vec<(Arc<Document>, NodeId)> {
        match doc.kind(expr) {
            NodeKind::Fn { .. } => vec![(Arc::clone(doc), expr)],

            NodeKind::VarRef {
                name,
                scope: Some(scope),
                ..
            } => {
                let target = doc
                    .scopes()
                    .lookup(*scope, name)
                    .map(|binding| binding.target);
                match target {
                    Some(target) => self.find_fn(doc, target, visited),
                    None => Vec::new(),
                }
            }

            NodeKind::FieldRef { .. } => {
                let bindings = self.field_bindings_of(doc, expr, visited);
                let mut out = Vec::new();
                for (key_doc, binding) in bindings {
                    if let NodeKind::Field { value, .. } = key_doc.kind(binding.target) {
                        out.extend(self.find_fn(&key_doc, *value, visited));
                    }
                }
                out
            }

            NodeKind::FieldAccess { field, .. } => {
                let field = *field;
                self.find_fn(doc, field, visited)
            }

            NodeKind::Import {
                kind: ImportKind::Default,
                ..
            } => {
                let Some(importee) = self.loader.importee(doc, expr) else {
                    return Vec::new();
                };
                let importee_uri = importee.uri().clone();
                if !visited.imports.insert(importee_uri.clone()) {
                    return Vec::new();
                }
                let body = importee.body();
                let out = self.find_fn(&importee, body, visited);
                visited.imports.remove(&importee_uri);
                out
            }

            NodeKind::Field { value, .. } => {
                let value = *value;
                if matches!(doc.kind(value), NodeKind::Fn { .. }) {
                    vec![(Arc::clone(doc), value)]
                } else {
                    Vec::new()
                }
            }

            _ => Vec::new(),
        }
    }
}
