//! Read-only AST traversal with overridable hooks.
//!
//! The default methods walk every child exactly once. Comprehension specs
//! are threaded through an explicit continuation so that an override can
//! control scope nesting order (each spec decides what runs "inside" it);
//! the object walk visits field keys before object locals, asserts, and
//! field values, which is the order the scoping rules demand.

use super::{Document, NodeId, NodeKind};

/// The continuation passed through comprehension spec chains.
pub type Next<'a, V> = &'a mut dyn FnMut(&mut V, &Document);

pub trait Visitor: Sized {
    fn visit(&mut self, doc: &Document, id: NodeId) {
        match doc.kind(id) {
            NodeKind::Document { body } => self.visit_document(doc, id, *body),
            NodeKind::Var { .. } => self.visit_var(doc, id),
            NodeKind::VarRef { .. } => self.visit_var_ref(doc, id),
            NodeKind::FieldId { .. } | NodeKind::FieldRef { .. } | NodeKind::ParamRef { .. } => {}
            NodeKind::Num { .. } | NodeKind::Str { .. } | NodeKind::Bool { .. } | NodeKind::Null => {
            }
            NodeKind::Array { .. } => self.visit_array(doc, id),
            NodeKind::Object { .. } => self.visit_object(doc, id),
            NodeKind::ObjComp { .. } => self.visit_obj_comp(doc, id),
            NodeKind::Local { .. } => self.visit_local(doc, id),
            NodeKind::If { .. } => self.visit_if(doc, id),
            NodeKind::AssertExpr { .. } => self.visit_assert_expr(doc, id),
            NodeKind::Fn { .. } => self.visit_fn(doc, id),
            NodeKind::Call { .. } => self.visit_call(doc, id),
            NodeKind::ListComp { .. } => self.visit_list_comp(doc, id),
            NodeKind::Slice { .. } => self.visit_slice(doc, id),
            NodeKind::FieldAccess { .. } => self.visit_field_access(doc, id),
            NodeKind::Binary { .. } => self.visit_binary(doc, id),
            NodeKind::Unary { operand, .. } => self.visit(doc, *operand),
            NodeKind::SelfRef => self.visit_self(doc, id),
            NodeKind::Super => self.visit_super(doc, id),
            NodeKind::Dollar => self.visit_dollar(doc, id),
            NodeKind::Import { .. } => self.visit_import(doc, id),
            NodeKind::Bind { .. } => self.visit_bind(doc, id),
            NodeKind::Param { .. } => self.visit_param(doc, id),
            NodeKind::Arg { .. } => self.visit_arg(doc, id),
            NodeKind::Field { .. } => self.visit_field_value(doc, id),
            NodeKind::FixedKey { .. } => {}
            NodeKind::ComputedKey { expr } => self.visit(doc, *expr),
            NodeKind::Assert { .. } => self.visit_assert(doc, id),
            NodeKind::ForSpec { .. } => {
                // A bare for-spec outside a comprehension chain (only seen
                // when someone visits it directly): walk the source.
                if let NodeKind::ForSpec { source, .. } = doc.kind(id) {
                    self.visit(doc, *source);
                }
            }
            NodeKind::IfSpec { condition } => self.visit(doc, *condition),
            NodeKind::Error { .. } => {}
        }
    }

    fn visit_document(&mut self, doc: &Document, _id: NodeId, body: NodeId) {
        self.visit(doc, body);
    }

    fn visit_var(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_var_ref(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_array(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Array { values } = doc.kind(id) {
            for &value in values {
                self.visit(doc, value);
            }
        }
    }

    fn visit_local(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Local { binds, body } = doc.kind(id) {
            for &bind in binds {
                self.visit(doc, bind);
            }
            self.visit(doc, *body);
        }
    }

    fn visit_bind(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Bind { value, .. } = doc.kind(id) {
            self.visit(doc, *value);
        }
    }

    fn visit_fn(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Fn { params, body } = doc.kind(id) {
            for &param in params {
                self.visit(doc, param);
            }
            self.visit(doc, *body);
        }
    }

    fn visit_param(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Param {
            default: Some(default),
            ..
        } = doc.kind(id)
        {
            self.visit(doc, *default);
        }
    }

    fn visit_call(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Call { callee, args } = doc.kind(id) {
            self.visit(doc, *callee);
            for &arg in args {
                self.visit(doc, arg);
            }
        }
    }

    fn visit_arg(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Arg { value, .. } = doc.kind(id) {
            self.visit(doc, *value);
        }
    }

    fn visit_if(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::If {
            condition,
            consequence,
            alternative,
        } = doc.kind(id)
        {
            self.visit(doc, *condition);
            self.visit(doc, *consequence);
            if let Some(alt) = alternative {
                self.visit(doc, *alt);
            }
        }
    }

    fn visit_assert_expr(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::AssertExpr { assertion, body } = doc.kind(id) {
            self.visit(doc, *assertion);
            self.visit(doc, *body);
        }
    }

    fn visit_assert(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Assert { condition, message } = doc.kind(id) {
            self.visit(doc, *condition);
            if let Some(message) = message {
                self.visit(doc, *message);
            }
        }
    }

    fn visit_slice(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Slice {
            target,
            begin,
            end,
            step,
        } = doc.kind(id)
        {
            self.visit(doc, *target);
            for part in [begin, end, step].into_iter().flatten() {
                self.visit(doc, *part);
            }
        }
    }

    fn visit_field_access(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::FieldAccess { target, .. } = doc.kind(id) {
            self.visit(doc, *target);
        }
    }

    fn visit_binary(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Binary { lhs, rhs, .. } = doc.kind(id) {
            self.visit(doc, *lhs);
            self.visit(doc, *rhs);
        }
    }

    fn visit_self(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_super(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_dollar(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_import(&mut self, _doc: &Document, _id: NodeId) {}

    fn visit_list_comp(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::ListComp {
            expr,
            for_spec,
            comp_spec,
        } = doc.kind(id)
        {
            let expr = *expr;
            let mut specs = vec![*for_spec];
            specs.extend(comp_spec);
            self.visit_comp_spec(doc, &specs, &mut |v, d| v.visit(d, expr));
        }
    }

    fn visit_obj_comp(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::ObjComp {
            field,
            binds,
            asserts,
            for_spec,
            comp_spec,
        } = doc.kind(id)
        {
            let field = *field;
            let binds = binds.clone();
            let asserts = asserts.clone();
            let mut specs = vec![*for_spec];
            specs.extend(comp_spec);
            self.visit_comp_spec(doc, &specs, &mut |v, d| {
                if let NodeKind::Field { key, value, .. } = d.kind(field) {
                    v.visit(d, *key);
                    let value = *value;
                    for &bind in &binds {
                        v.visit(d, bind);
                    }
                    for &assert in &asserts {
                        v.visit(d, assert);
                    }
                    v.visit(d, value);
                }
            });
        }
    }

    /// Walk a comprehension spec chain: each spec runs, then hands control
    /// to the rest of the chain (ending in `next`, the comprehension body).
    fn visit_comp_spec(&mut self, doc: &Document, specs: &[NodeId], next: Next<'_, Self>) {
        match specs.split_first() {
            None => next(self, doc),
            Some((&head, rest)) => match doc.kind(head) {
                NodeKind::ForSpec { .. } => {
                    self.visit_for_spec(doc, head, &mut |v, d| {
                        v.visit_comp_spec(d, rest, &mut *next)
                    });
                }
                NodeKind::IfSpec { .. } => {
                    self.visit_if_spec(doc, head, &mut |v, d| {
                        v.visit_comp_spec(d, rest, &mut *next)
                    });
                }
                _ => {
                    self.visit(doc, head);
                    self.visit_comp_spec(doc, rest, next);
                }
            },
        }
    }

    fn visit_for_spec(&mut self, doc: &Document, id: NodeId, next: Next<'_, Self>) {
        if let NodeKind::ForSpec { source, .. } = doc.kind(id) {
            self.visit(doc, *source);
        }
        next(self, doc);
    }

    fn visit_if_spec(&mut self, doc: &Document, id: NodeId, next: Next<'_, Self>) {
        if let NodeKind::IfSpec { condition } = doc.kind(id) {
            self.visit(doc, *condition);
        }
        next(self, doc);
    }

    /// Object walk in scope-correct order: field keys first, then object
    /// locals, asserts, and finally field values.
    fn visit_object(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Object {
            binds,
            asserts,
            fields,
        } = doc.kind(id)
        {
            for &field in fields {
                if let NodeKind::Field { key, .. } = doc.kind(field) {
                    match doc.kind(*key) {
                        NodeKind::FixedKey { .. } => self.visit_fixed_key(doc, id, field, *key),
                        NodeKind::ComputedKey { .. } => self.visit_computed_key(doc, field, *key),
                        _ => {}
                    }
                }
            }
            for &bind in binds {
                self.visit(doc, bind);
            }
            for &assert in asserts {
                self.visit(doc, assert);
            }
            for &field in fields {
                self.visit_field_value(doc, field);
            }
        }
    }

    fn visit_fixed_key(&mut self, _doc: &Document, _object: NodeId, _field: NodeId, _key: NodeId) {}

    fn visit_computed_key(&mut self, doc: &Document, _field: NodeId, key: NodeId) {
        if let NodeKind::ComputedKey { expr } = doc.kind(key) {
            self.visit(doc, *expr);
        }
    }

    fn visit_field_value(&mut self, doc: &Document, field: NodeId) {
        if let NodeKind::Field { value, .. } = doc.kind(field) {
            self.visit(doc, *value);
        }
    }
}
