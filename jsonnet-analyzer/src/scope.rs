//! Variable and field scopes.
//!
//! Two parallel hierarchies: variable scopes form a tree rooted at the
//! document (keyed on the AST owners that introduce bindings), field scopes
//! hang off every object literal and do not inherit; composition over `+`
//! is assembled at query time by the definition provider.

use crate::ast::NodeId;

/// Index of a variable scope in a document's scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a field scope in a document's scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldScopeId(u32);

impl FieldScopeId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A name introduced into a variable scope.
///
/// `id` is the `Var` node of the binding site; `target` is what the name
/// stands for: the bound value of a `local`, the `Param` node of a
/// function parameter, or the `ForSpec` node of an iteration variable.
#[derive(Debug, Clone)]
pub struct VarBinding {
    pub name: String,
    pub id: NodeId,
    pub target: NodeId,
}

/// One lexical variable scope.
#[derive(Debug)]
pub struct VarScope {
    pub owner: NodeId,
    pub parent: Option<ScopeId>,
    /// Front-first: the most recent binding wins lookups, which implements
    /// last-write-wins shadowing inside one scope.
    pub bindings: Vec<VarBinding>,
    pub children: Vec<ScopeId>,
}

/// A field key bound inside one object literal.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub name: String,
    /// The `FixedKey` node that defines the field.
    pub key: NodeId,
    /// The `Field` node the key belongs to.
    pub target: NodeId,
}

/// The field bindings of a single object. No parent: composition is
/// explicit.
#[derive(Debug)]
pub struct FieldScope {
    pub owner: NodeId,
    pub bindings: Vec<FieldBinding>,
}

/// Per-document arena of both scope kinds.
#[derive(Debug, Default)]
pub struct Scopes {
    var_scopes: Vec<VarScope>,
    field_scopes: Vec<FieldScope>,
}

impl Scopes {
    /// Allocate the root variable scope (no parent).
    pub(crate) fn alloc_root(&mut self, owner: NodeId) -> ScopeId {
        debug_assert!(self.var_scopes.is_empty(), "root scope allocated twice");
        self.var_scopes.push(VarScope {
            owner,
            parent: None,
            bindings: Vec::new(),
            children: Vec::new(),
        });
        ScopeId::new(0)
    }

    /// Allocate a child scope under `parent`.
    pub(crate) fn nest(&mut self, parent: ScopeId, owner: NodeId) -> ScopeId {
        let id = ScopeId::new(self.var_scopes.len());
        self.var_scopes.push(VarScope {
            owner,
            parent: Some(parent),
            bindings: Vec::new(),
            children: Vec::new(),
        });
        self.var_scopes[parent.index()].children.push(id);
        id
    }

    /// Allocate the (empty) field scope of an object.
    pub(crate) fn alloc_field_scope(&mut self, owner: NodeId) -> FieldScopeId {
        let id = FieldScopeId::new(self.field_scopes.len());
        self.field_scopes.push(FieldScope {
            owner,
            bindings: Vec::new(),
        });
        id
    }

    pub(crate) fn bind_var(&mut self, scope: ScopeId, name: String, id: NodeId, target: NodeId) {
        self.var_scopes[scope.index()]
            .bindings
            .insert(0, VarBinding { name, id, target });
    }

    pub(crate) fn bind_field(
        &mut self,
        scope: FieldScopeId,
        name: String,
        key: NodeId,
        target: NodeId,
    ) {
        self.field_scopes[scope.index()]
            .bindings
            .insert(0, FieldBinding { name, key, target });
    }

    pub fn var_scope(&self, id: ScopeId) -> &VarScope {
        &self.var_scopes[id.index()]
    }

    pub fn field_scope(&self, id: FieldScopeId) -> &FieldScope {
        &self.field_scopes[id.index()]
    }

    /// First-match-wins lookup through the scope chain; `None` when no
    /// enclosing scope binds `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&VarBinding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.var_scope(id);
            if let Some(binding) = scope.bindings.iter().find(|b| b.name == name) {
                return Some(binding);
            }
            current = scope.parent;
        }
        None
    }

    /// Lookup inside one object's field scope (no inheritance).
    pub fn lookup_field(&self, scope: FieldScopeId, name: &str) -> Option<&FieldBinding> {
        self.field_scope(scope)
            .bindings
            .iter()
            .find(|b| b.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(i: usize) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let mut scopes = Scopes::default();
        let root = scopes.alloc_root(node(0));
        let child = scopes.nest(root, node(1));
        scopes.bind_var(root, "a".into(), node(2), node(3));

        assert_eq!(scopes.lookup(child, "a").map(|b| b.id), Some(node(2)));
        assert!(scopes.lookup(child, "b").is_none());
    }

    #[test]
    fn rebinding_shadows_front_first() {
        let mut scopes = Scopes::default();
        let root = scopes.alloc_root(node(0));
        scopes.bind_var(root, "x".into(), node(1), node(2));
        scopes.bind_var(root, "x".into(), node(3), node(4));

        // The later binding wins; the earlier one is still recorded.
        assert_eq!(scopes.lookup(root, "x").map(|b| b.id), Some(node(3)));
        assert_eq!(scopes.var_scope(root).bindings.len(), 2);
    }

    #[test]
    fn inner_scopes_shadow_outer_ones() {
        let mut scopes = Scopes::default();
        let root = scopes.alloc_root(node(0));
        let inner = scopes.nest(root, node(1));
        scopes.bind_var(root, "x".into(), node(2), node(3));
        scopes.bind_var(inner, "x".into(), node(4), node(5));

        assert_eq!(scopes.lookup(inner, "x").map(|b| b.id), Some(node(4)));
        assert_eq!(scopes.lookup(root, "x").map(|b| b.id), Some(node(2)));
    }

    #[test]
    fn field_scopes_do_not_inherit() {
        let mut scopes = Scopes::default();
        let fs = scopes.alloc_field_scope(node(0));
        scopes.bind_field(fs, "f".into(), node(1), node(2));

        let other = scopes.alloc_field_scope(node(3));
        assert!(scopes.lookup_field(other, "f").is_none());
        assert_eq!(scopes.lookup_field(fs, "f").map(|b| b.key), Some(node(1)));
    }
}
