//! Scope resolution: binding placement, shadowing, reference linking, and
//! the object/comprehension visibility rules.

mod support;

use jsonnet_analyzer::lsp_types::Range;
use jsonnet_analyzer::{AnalysisPhase, NodeKind};
use pretty_assertions::assert_eq;
use support::Fixture;

#[test]
fn documents_reach_the_resolved_phase() {
    let mut f = Fixture::new("local x = 1; x\n");
    assert_eq!(f.doc().phase(), AnalysisPhase::ScopeResolved);
}

#[test]
fn local_binds_live_in_the_local_scope() {
    let mut f = Fixture::new(
        "local x = 1, y = 2; x + y\n\
         \u{20}     ^x     ^y\n",
    );
    let doc = f.doc();

    let local = doc.body();
    assert!(matches!(doc.kind(local), NodeKind::Local { .. }));
    let scope = doc.var_scope_of(local).expect("local owns a scope");

    let bindings = &doc.scopes().var_scope(scope).bindings;
    // Front-first insertion: the later bind sits first.
    let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["y", "x"]);
    assert_eq!(doc.range(bindings[1].id), f.range("x"));
    assert_eq!(doc.range(bindings[0].id), f.range("y"));
}

#[test]
fn same_scope_shadowing_is_last_write_wins() {
    let mut f = Fixture::new(
        "local x = 1, x = 2; x\n\
         \u{20}     ^first ^second\n\
         \u{20}                   ^ref\n",
    );
    let doc = f.doc();

    let ref_node = f.node_at("ref");
    let NodeKind::VarRef { target: Some(var), .. } = doc.kind(ref_node) else {
        panic!("reference should resolve");
    };
    assert_eq!(doc.range(*var), f.range("second"));
}

#[test]
fn var_refs_link_back_and_forth() {
    let mut f = Fixture::new(
        "local x = 1; x + x\n\
         \u{20}     ^x     ^x.1^x.2\n",
    );
    let doc = f.doc();

    let var = f.node_at("x");
    let NodeKind::Var { references, .. } = doc.kind(var) else {
        panic!("expected var at binder mark");
    };
    let ranges: Vec<Range> = references.iter().map(|&r| doc.range(r)).collect();
    assert_eq!(ranges, vec![f.range("x.1"), f.range("x.2")]);

    for mark in ["x.1", "x.2"] {
        let node = f.node_at(mark);
        let NodeKind::VarRef { target, .. } = doc.kind(node) else {
            panic!("expected var ref at {mark}");
        };
        assert_eq!(*target, Some(var));
    }
}

#[test]
fn unresolved_references_stay_unlinked() {
    let mut f = Fixture::new(
        "local x = 1; y\n\
         \u{20}            ^ref\n",
    );
    let doc = f.doc();
    let node = f.node_at("ref");
    let NodeKind::VarRef { target, scope, .. } = doc.kind(node) else {
        panic!("expected var ref");
    };
    assert_eq!(*target, None);
    // The active scope was still recorded, and no enclosing scope binds the
    // name (the no-dangling invariant).
    let scope = scope.expect("scope recorded");
    assert!(doc.scopes().lookup(scope, "y").is_none());
    assert!(doc.scopes().lookup(scope, "x").is_some());
}

#[test]
fn fn_parameters_are_mutually_recursive() {
    let mut f = Fixture::new(
        "function(p1=p2, p2, p3=p1) p1 + p2 + p3\n\
         \u{20}        ^^p1\n\
         \u{20}           ^^p2.1\n\
         \u{20}               ^^p2\n\
         \u{20}                   ^^p3\n\
         \u{20}                      ^^p1.1\n\
         \u{20}                          ^^p1.2\n\
         \u{20}                               ^^p2.2\n\
         \u{20}                                    ^^p3.1\n",
    );
    let doc = f.doc();

    for (reference, binder) in [
        ("p2.1", "p2"),
        ("p1.1", "p1"),
        ("p1.2", "p1"),
        ("p2.2", "p2"),
        ("p3.1", "p3"),
    ] {
        let node = f.node_at(reference);
        let NodeKind::VarRef { target: Some(var), .. } = doc.kind(node) else {
            panic!("{reference} should resolve");
        };
        assert_eq!(doc.range(*var), f.range(binder), "{reference} -> {binder}");
    }
}

#[test]
fn object_fields_bind_into_the_field_scope() {
    let mut f = Fixture::new(
        "{\n\
         \u{20} f1: v1,\n\
         \u{20} ^^f1\n\
         \u{20} \"f2\":: v2,\n\
         \u{20} ^^^^f2\n\
         \u{20} local v1 = 3,\n\
         \u{20} local v2 = 4,\n\
         }\n",
    );
    let doc = f.doc();

    let object = doc.body();
    assert!(matches!(doc.kind(object), NodeKind::Object { .. }));
    let field_scope = doc.field_scope_of(object).expect("object field scope");

    let f1 = doc.scopes().lookup_field(field_scope, "f1").expect("f1");
    assert_eq!(doc.range(f1.key), f.range("f1"));
    assert!(matches!(doc.kind(f1.target), NodeKind::Field { .. }));

    let f2 = doc.scopes().lookup_field(field_scope, "f2").expect("f2");
    assert_eq!(doc.range(f2.key), f.range("f2"));

    // Object locals are bound in the object's variable scope.
    let var_scope = doc.var_scope_of(object).expect("object var scope");
    assert!(doc.scopes().lookup(var_scope, "v1").is_some());
    assert!(doc.scopes().lookup(var_scope, "v2").is_some());
}

#[test]
fn object_locals_are_visible_to_values_but_not_computed_keys() {
    let mut f = Fixture::new(
        "local v = 1;\n\
         \u{20}     ^outer\n\
         {\n\
         \u{20} local v = 2,\n\
         \u{20}       ^inner\n\
         \u{20} [v + 'k']: v,\n\
         \u{20} \u{20}^kv\n\
         \u{20}            ^value\n\
         }\n",
    );
    let doc = f.doc();

    // The `v` inside the computed key resolves to the outer local.
    let key_ref = f.node_at("kv");
    let NodeKind::VarRef { target: Some(var), .. } = doc.kind(key_ref) else {
        panic!("computed key reference should resolve");
    };
    assert_eq!(doc.range(*var), f.range("outer"));

    // The `v` in the field value resolves to the object local.
    let value_ref = f.node_at("value");
    let NodeKind::VarRef { target: Some(var), .. } = doc.kind(value_ref) else {
        panic!("value reference should resolve");
    };
    assert_eq!(doc.range(*var), f.range("inner"));
}

#[test]
fn for_spec_source_is_outside_the_iteration_scope() {
    // `i` in its own source does not resolve to the iteration variable.
    let mut f = Fixture::new(
        "local i = [0]; [i for i in i]\n\
         \u{20}     ^outer    ^use  ^i   ^src\n",
    );
    let doc = f.doc();

    let src = f.node_at("src");
    let NodeKind::VarRef { target: Some(var), .. } = doc.kind(src) else {
        panic!("source reference should resolve");
    };
    assert_eq!(doc.range(*var), f.range("outer"), "source sees the outer binding");

    let body_use = f.node_at("use");
    let NodeKind::VarRef { target: Some(var), .. } = doc.kind(body_use) else {
        panic!("body reference should resolve");
    };
    assert_eq!(doc.range(*var), f.range("i"), "body sees the iteration variable");
}

#[test]
fn comprehension_spec_chain_scopes_left_to_right() {
    let mut f = Fixture::new(
        "[x + y for x in [1] if x > 0 for y in [x]]\n\
         \u{20}^x.1      ^x          ^x.2            ^x.3\n",
    );
    let doc = f.doc();

    for mark in ["x.1", "x.2", "x.3"] {
        let node = f.node_at(mark);
        let NodeKind::VarRef { target: Some(var), .. } = doc.kind(node) else {
            panic!("{mark} should resolve");
        };
        assert_eq!(doc.range(*var), f.range("x"), "{mark} resolves to the for binder");
    }
}
