//! One-pass scope resolution.
//!
//! Runs once per document, right after parent wiring, and establishes:
//! - the variable scope tree (owners: document, `local`, functions,
//!   comprehensions, for-specs, and every object literal);
//! - the field scope of every object literal;
//! - `VarRef → Var` links plus each `Var`'s reference list.
//!
//! Nothing here fails: unresolved references stay unlinked, duplicate names
//! shadow in insertion order, malformed nodes are skipped.

use tracing::debug;

use crate::ast::{AnalysisPhase, Document, NodeId, NodeKind};
use crate::scope::ScopeId;

pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolve `doc` in place and advance it to
    /// [`AnalysisPhase::ScopeResolved`]. Idempotent.
    pub fn resolve(doc: &mut Document) {
        if doc.phase() == AnalysisPhase::ScopeResolved {
            return;
        }

        let root = doc.root();
        let root_scope = doc.scopes.alloc_root(root);
        doc.var_scope_of.insert(root, root_scope);

        let body = doc.body();
        resolve_node(doc, body, root_scope);

        doc.set_phase(AnalysisPhase::ScopeResolved);
        debug!(uri = %doc.uri(), nodes = doc.node_count(), "scope-resolved document");
    }
}

fn resolve_node(doc: &mut Document, id: NodeId, scope: ScopeId) {
    match doc.kind(id) {
        NodeKind::Document { body } => {
            let body = *body;
            resolve_node(doc, body, scope);
        }

        NodeKind::Local { binds, body } => {
            let (binds, body) = (binds.clone(), *body);
            let local_scope = doc.scopes.nest(scope, id);
            doc.var_scope_of.insert(id, local_scope);
            for bind in binds {
                resolve_bind(doc, bind, local_scope);
            }
            resolve_node(doc, body, local_scope);
        }

        NodeKind::Bind { .. } => resolve_bind(doc, id, scope),

        NodeKind::Fn { params, body } => {
            let (params, body) = (params.clone(), *body);
            let fn_scope = doc.scopes.nest(scope, id);
            doc.var_scope_of.insert(id, fn_scope);

            // Bind every parameter before visiting any default expression:
            // defaults may reference peer parameters in either direction.
            let mut defaults = Vec::new();
            for param in &params {
                if let NodeKind::Param { id: var, default } = doc.kind(*param) {
                    let (var, default) = (*var, *default);
                    if let NodeKind::Var { name, .. } = doc.kind(var) {
                        let name = name.clone();
                        doc.scopes.bind_var(fn_scope, name, var, *param);
                    }
                    defaults.extend(default);
                }
            }
            for default in defaults {
                resolve_node(doc, default, fn_scope);
            }
            resolve_node(doc, body, fn_scope);
        }

        NodeKind::Object {
            binds,
            asserts,
            fields,
        } => {
            let (binds, asserts, fields) = (binds.clone(), asserts.clone(), fields.clone());
            let object_scope = doc.scopes.nest(scope, id);
            doc.var_scope_of.insert(id, object_scope);
            let field_scope = doc.scopes.alloc_field_scope(id);
            doc.field_scope_of.insert(id, field_scope);

            // Keys first: object locals must not be visible inside computed
            // keys, so key expressions resolve before any local is bound.
            for &field in &fields {
                let NodeKind::Field { key, .. } = doc.kind(field) else {
                    continue;
                };
                let key = *key;
                match doc.kind(key) {
                    NodeKind::FixedKey { id: key_id } => {
                        if let Some(name) = doc.name_of(*key_id).map(str::to_owned) {
                            doc.scopes.bind_field(field_scope, name, key, field);
                        }
                    }
                    NodeKind::ComputedKey { expr } => {
                        let expr = *expr;
                        resolve_node(doc, expr, object_scope);
                    }
                    _ => {}
                }
            }
            for bind in binds {
                resolve_bind(doc, bind, object_scope);
            }
            for assert in asserts {
                resolve_node(doc, assert, object_scope);
            }
            for field in fields {
                if let NodeKind::Field { value, .. } = doc.kind(field) {
                    let value = *value;
                    resolve_node(doc, value, object_scope);
                }
            }
        }

        NodeKind::ObjComp {
            field,
            binds,
            asserts,
            for_spec,
            comp_spec,
        } => {
            let field = *field;
            let binds = binds.clone();
            let asserts = asserts.clone();
            let mut specs = vec![*for_spec];
            specs.extend(comp_spec);

            resolve_comp_chain(doc, &specs, scope, &mut |doc, inner| {
                // The computed key sees the iteration variables but not the
                // object locals, hence it resolves before the object scope
                // is created.
                if let NodeKind::Field { key, value, .. } = doc.kind(field) {
                    let (key, value) = (*key, *value);
                    if let NodeKind::ComputedKey { expr } = doc.kind(key) {
                        let expr = *expr;
                        resolve_node(doc, expr, inner);
                    }
                    let obj_scope = doc.scopes.nest(inner, id);
                    doc.var_scope_of.insert(id, obj_scope);
                    for &bind in &binds {
                        resolve_bind(doc, bind, obj_scope);
                    }
                    for &assert in &asserts {
                        resolve_node(doc, assert, obj_scope);
                    }
                    resolve_node(doc, value, obj_scope);
                }
            });
        }

        NodeKind::ListComp {
            expr,
            for_spec,
            comp_spec,
        } => {
            let expr = *expr;
            let mut specs = vec![*for_spec];
            specs.extend(comp_spec);

            let comp_scope = doc.scopes.nest(scope, id);
            doc.var_scope_of.insert(id, comp_scope);
            resolve_comp_chain(doc, &specs, comp_scope, &mut |doc, inner| {
                resolve_node(doc, expr, inner);
            });
        }

        NodeKind::VarRef { name, .. } => {
            let name = name.clone();
            let target = doc.scopes.lookup(scope, &name).map(|b| b.id);
            if let NodeKind::VarRef {
                scope: ref_scope,
                target: ref_target,
                ..
            } = doc.kind_mut(id)
            {
                *ref_scope = Some(scope);
                *ref_target = target;
            }
            if let Some(var) = target {
                if let NodeKind::Var { references, .. } = doc.kind_mut(var) {
                    references.push(id);
                }
            }
        }

        NodeKind::If {
            condition,
            consequence,
            alternative,
        } => {
            let (c, t, e) = (*condition, *consequence, *alternative);
            resolve_node(doc, c, scope);
            resolve_node(doc, t, scope);
            if let Some(e) = e {
                resolve_node(doc, e, scope);
            }
        }

        NodeKind::AssertExpr { assertion, body } => {
            let (assertion, body) = (*assertion, *body);
            resolve_node(doc, assertion, scope);
            resolve_node(doc, body, scope);
        }

        NodeKind::Assert { condition, message } => {
            let (condition, message) = (*condition, *message);
            resolve_node(doc, condition, scope);
            if let Some(message) = message {
                resolve_node(doc, message, scope);
            }
        }

        NodeKind::Array { values } => {
            for value in values.clone() {
                resolve_node(doc, value, scope);
            }
        }

        NodeKind::Call { callee, args } => {
            let (callee, args) = (*callee, args.clone());
            resolve_node(doc, callee, scope);
            for arg in args {
                resolve_node(doc, arg, scope);
            }
        }

        NodeKind::Arg { value, .. } => {
            let value = *value;
            resolve_node(doc, value, scope);
        }

        NodeKind::Slice {
            target,
            begin,
            end,
            step,
        } => {
            let parts = [Some(*target), *begin, *end, *step];
            for part in parts.into_iter().flatten() {
                resolve_node(doc, part, scope);
            }
        }

        NodeKind::FieldAccess { target, .. } => {
            let target = *target;
            resolve_node(doc, target, scope);
        }

        NodeKind::Binary { lhs, rhs, .. } => {
            let (lhs, rhs) = (*lhs, *rhs);
            resolve_node(doc, lhs, scope);
            resolve_node(doc, rhs, scope);
        }

        NodeKind::Unary { operand, .. } => {
            let operand = *operand;
            resolve_node(doc, operand, scope);
        }

        // Leaves and nodes with nothing to wire.
        NodeKind::Num { .. }
        | NodeKind::Str { .. }
        | NodeKind::Bool { .. }
        | NodeKind::Null
        | NodeKind::Var { .. }
        | NodeKind::FieldId { .. }
        | NodeKind::FieldRef { .. }
        | NodeKind::ParamRef { .. }
        | NodeKind::SelfRef
        | NodeKind::Super
        | NodeKind::Dollar
        | NodeKind::Import { .. }
        | NodeKind::Param { .. }
        | NodeKind::Field { .. }
        | NodeKind::FixedKey { .. }
        | NodeKind::ForSpec { .. }
        | NodeKind::IfSpec { .. }
        | NodeKind::Error { .. } => {}

        NodeKind::ComputedKey { expr } => {
            let expr = *expr;
            resolve_node(doc, expr, scope);
        }
    }
}

/// Bind a `local` name into `scope` before descending into its value, so a
/// bind may reference itself; the value gets a fresh child scope so its own
/// lookups cannot disturb sibling shadowing.
fn resolve_bind(doc: &mut Document, bind: NodeId, scope: ScopeId) {
    let NodeKind::Bind { id: var, value } = doc.kind(bind) else {
        return;
    };
    let (var, value) = (*var, *value);

    if let NodeKind::Var { name, .. } = doc.kind(var) {
        let name = name.clone();
        doc.scopes.bind_var(scope, name, var, value);
    }

    let value_scope = doc.scopes.nest(scope, bind);
    doc.var_scope_of.insert(bind, value_scope);
    resolve_node(doc, value, value_scope);
}

/// Walk a comprehension spec chain: every for-spec evaluates its source in
/// the scope outside itself, then opens a child scope holding the iteration
/// variable for everything that follows.
fn resolve_comp_chain(
    doc: &mut Document,
    specs: &[NodeId],
    scope: ScopeId,
    body: &mut dyn FnMut(&mut Document, ScopeId),
) {
    let Some((&head, rest)) = specs.split_first() else {
        body(doc, scope);
        return;
    };

    match doc.kind(head) {
        NodeKind::ForSpec { id: var, source } => {
            let (var, source) = (*var, *source);
            resolve_node(doc, source, scope);

            let spec_scope = doc.scopes.nest(scope, head);
            doc.var_scope_of.insert(head, spec_scope);
            if let NodeKind::Var { name, .. } = doc.kind(var) {
                let name = name.clone();
                doc.scopes.bind_var(spec_scope, name, var, head);
            }
            resolve_comp_chain(doc, rest, spec_scope, body);
        }
        NodeKind::IfSpec { condition } => {
            let condition = *condition;
            resolve_node(doc, condition, scope);
            resolve_comp_chain(doc, rest, scope, body);
        }
        _ => resolve_comp_chain(doc, rest, scope, body),
    }
}
