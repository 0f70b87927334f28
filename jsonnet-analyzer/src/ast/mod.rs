//! The Jsonnet AST: arena document, CST lowering, traversal, printers.

mod build;
mod node;
pub mod pretty;
pub mod visitor;

pub use node::{ImportKind, NodeData, NodeId, NodeKind, Operator, UnaryOp, Visibility};

use std::collections::HashMap;

use lsp_types::{Location, Position, Range, Url};

use crate::errors::Result;
use crate::location::{point_range, range_contains};
use crate::scope::{FieldScopeId, ScopeId, Scopes};

/// Analysis lifecycle of a document.
///
/// Providers require [`AnalysisPhase::ScopeResolved`]; a document that is
/// merely parsed yields empty answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Parsed,
    ScopeResolved,
}

/// One parsed Jsonnet file: source text, the node arena, and (after
/// resolution) the scope arenas hanging off it.
#[derive(Debug)]
pub struct Document {
    uri: Url,
    source: String,
    nodes: Vec<NodeData>,
    root: NodeId,
    phase: AnalysisPhase,
    pub(crate) scopes: Scopes,
    /// Scope owned by a node, for the owners that introduce one.
    pub(crate) var_scope_of: HashMap<NodeId, ScopeId>,
    /// Field scope of each object literal.
    pub(crate) field_scope_of: HashMap<NodeId, FieldScopeId>,
}

impl Document {
    /// Parse `source` and lower the CST into an AST arena. Parent links are
    /// wired before this returns; scopes are not yet resolved.
    pub fn from_source(uri: Url, source: String) -> Result<Self> {
        build::build(uri, source)
    }

    pub(crate) fn assemble(
        uri: Url,
        source: String,
        mut nodes: Vec<NodeData>,
        root: NodeId,
    ) -> Self {
        // Wire parent links in one pass over the finished arena.
        let edges: Vec<(NodeId, Vec<NodeId>)> = nodes
            .iter()
            .enumerate()
            .map(|(i, data)| (NodeId::new(i), data.kind.children()))
            .collect();
        for (parent, children) in edges {
            for child in children {
                nodes[child.index()].parent = Some(parent);
            }
        }

        Self {
            uri,
            source,
            nodes,
            root,
            phase: AnalysisPhase::Parsed,
            scopes: Scopes::default(),
            var_scope_of: HashMap::new(),
            field_scope_of: HashMap::new(),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: AnalysisPhase) {
        self.phase = phase;
    }

    /// The root `Document` node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The document's body expression.
    pub fn body(&self) -> NodeId {
        match &self.nodes[self.root.index()].kind {
            NodeKind::Document { body } => *body,
            _ => self.root,
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn range(&self, id: NodeId) -> Range {
        self.nodes[id.index()].range
    }

    pub fn location(&self, id: NodeId) -> Location {
        Location::new(self.uri.clone(), self.range(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.index()].kind.children()
    }

    /// Walk from `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    /// Number of arena slots (for diagnostics and the CLI).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node ids in allocation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// The narrowest node whose range contains `target`: descends into the
    /// first child (document order) that contains the target, falling back
    /// to the current node when no child qualifies.
    pub fn node_at(&self, target: Range) -> Option<NodeId> {
        self.node_at_from(self.root, target)
    }

    /// `node_at` for a single position (an empty range).
    pub fn node_at_position(&self, pos: Position) -> Option<NodeId> {
        self.node_at(point_range(pos))
    }

    fn node_at_from(&self, from: NodeId, target: Range) -> Option<NodeId> {
        let candidate = self
            .children(from)
            .into_iter()
            .filter(|&child| range_contains(&self.range(child), &target))
            .find_map(|child| self.node_at_from(child, target));

        match candidate {
            Some(node) => Some(node),
            None if range_contains(&self.range(from), &target) => Some(from),
            None => None,
        }
    }

    /// The variable scope introduced by `id`, when it is a scope owner.
    pub fn var_scope_of(&self, id: NodeId) -> Option<ScopeId> {
        self.var_scope_of.get(&id).copied()
    }

    /// The field scope of an object literal.
    pub fn field_scope_of(&self, id: NodeId) -> Option<FieldScopeId> {
        self.field_scope_of.get(&id).copied()
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// The nearest enclosing variable scope at `id`: the scope introduced by
    /// the closest scope-owning ancestor (or the node itself).
    pub fn enclosing_scope(&self, id: NodeId) -> Option<ScopeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.var_scope_of(n))
    }

    /// The identifier (or raw string content) carried by name-like nodes.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Var { name, .. }
            | NodeKind::VarRef { name, .. }
            | NodeKind::FieldId { name }
            | NodeKind::FieldRef { name }
            | NodeKind::ParamRef { name } => Some(name),
            NodeKind::Str { raw } => Some(raw),
            _ => None,
        }
    }

    /// The name a `FixedKey` binds (identifier text or raw string content).
    pub fn key_name(&self, fixed_key: NodeId) -> Option<&str> {
        match self.kind(fixed_key) {
            NodeKind::FixedKey { id } => self.name_of(*id),
            _ => None,
        }
    }

    /// The "effective result" subexpressions behind transparent wrappers:
    /// `local`/`assert` bodies, function bodies, and both `if` branches.
    /// Plain expressions are their own (single) tail.
    pub fn tails(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Document { body } => self.tails(*body),
            NodeKind::Local { body, .. } => self.tails(*body),
            NodeKind::Fn { body, .. } => self.tails(*body),
            NodeKind::AssertExpr { body, .. } => self.tails(*body),
            NodeKind::If {
                consequence,
                alternative,
                ..
            } => {
                let mut tails = self.tails(*consequence);
                if let Some(alt) = alternative {
                    tails.extend(self.tails(*alt));
                }
                tails
            }
            _ => vec![id],
        }
    }
}
