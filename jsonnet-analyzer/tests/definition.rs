//! Go-to-definition scenarios: variables, parameters, fields through
//! composition, conditionals, `self`/`super`/`$`, and imports.

mod support;

use support::{Fixture, Workspace};

#[test]
fn local_variable() {
    let mut f = Fixture::new(
        "local x = 1; x + x\n\
         \u{20}     ^x     ^x.1^x.2\n",
    );
    f.assert_definitions("x.1", &["x"]);
    f.assert_definitions("x.2", &["x"]);
}

#[test]
fn nested_local_shadowing() {
    let mut f = Fixture::new(
        "local x = 1; local x = 2; x\n\
         \u{20}     ^first       ^second\n\
         \u{20}                         ^ref\n",
    );
    f.assert_definitions("ref", &["second"]);
}

#[test]
fn function_parameters_resolve_in_any_order() {
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
    f.assert_definitions("p2.1", &["p2"]);
    f.assert_definitions("p1.1", &["p1"]);
    f.assert_definitions("p1.2", &["p1"]);
    f.assert_definitions("p2.2", &["p2"]);
    f.assert_definitions("p3.1", &["p3"]);
}

#[test]
fn list_comprehension_variables() {
    let mut f = Fixture::new(
        "[local v = 0; i + v for i in [2, 3]]\n\
         \u{20}      ^v     ^i.1^v.1  ^i\n",
    );
    f.assert_definitions("v.1", &["v"]);
    f.assert_definitions("i.1", &["i"]);
}

#[test]
fn object_comprehension_scoping() {
    let mut f = Fixture::new(
        "local v = 1;\n\
         \u{20}     ^outer\n\
         {\n\
         \u{20} local v = 2,\n\
         \u{20}       ^inner\n\
         \u{20} ['f' + i + v]: v,\n\
         \u{20}        ^i.1\n\
         \u{20}            ^v.key\n\
         \u{20}                ^v.val\n\
         \u{20} for i in [1, 2]\n\
         \u{20}     ^i\n\
         }\n",
    );
    f.assert_definitions("v.key", &["outer"]);
    f.assert_definitions("v.val", &["inner"]);
    f.assert_definitions("i.1", &["i"]);
}

#[test]
fn simple_field_access() {
    let mut f = Fixture::new(
        "local v = { f: 0 }; v.f\n\
         \u{20}     ^v    ^f      ^v.1\n\
         \u{20}                     ^f.1\n",
    );
    f.assert_definitions("v.1", &["v"]);
    f.assert_definitions("f.1", &["f"]);
}

#[test]
fn nested_field_access() {
    let mut f = Fixture::new(
        "local v = { f: { g: 0 } }; v.f.g\n\
         \u{20}     ^v    ^f   ^g        ^v.1\n\
         \u{20}                            ^f.1\n\
         \u{20}                              ^g.1\n",
    );
    f.assert_definitions("v.1", &["v"]);
    f.assert_definitions("f.1", &["f"]);
    f.assert_definitions("g.1", &["g"]);
}

#[test]
fn index_with_variable_key() {
    let mut f = Fixture::new(
        "local f = 'f'; local v = { f: 0 }; v[f]\n\
         \u{20}     ^fvar                ^key    ^v.1\n\
         \u{20}                    ^v              ^f.1\n",
    );
    f.assert_definitions("f.1", &["fvar"]);
    f.assert_definitions("v.1", &["v"]);
}

#[test]
fn dollar_resolves_to_the_outermost_object() {
    let mut f = Fixture::new(
        "{ f: 1, g: { h: $.i, i: 2 }, i: 3 }\n\
         \u{20}                 ^ref\n\
         \u{20}                    ^inner\n\
         \u{20}                            ^outer\n",
    );
    f.assert_definitions("ref", &["outer"]);
}

#[test]
fn both_branches_of_an_if_contribute() {
    let mut f = Fixture::new(
        "local v = if true then { f: 1 } else { f: 2 }; v.f\n\
         \u{20}                        ^f1           ^f2\n\
         \u{20}                                                ^ref\n",
    );
    f.assert_definitions("ref", &["f1", "f2"]);
}

#[test]
fn if_without_alternative() {
    let mut f = Fixture::new(
        "local v = if true then { f: 1 }; v.f\n\
         \u{20}                        ^f        ^ref\n",
    );
    f.assert_definitions("ref", &["f"]);
}

#[test]
fn conditional_variable_targets() {
    let mut f = Fixture::new(
        "local v1 = { f: 1 };\n\
         \u{20}            ^f1\n\
         local v2 = { f: 2 };\n\
         \u{20}            ^f2\n\
         local v3 = if true then v1 else v2;\n\
         v3.f\n\
         \u{20}  ^ref\n",
    );
    f.assert_definitions("ref", &["f1", "f2"]);
}

#[test]
fn object_object_composition() {
    let mut f = Fixture::new(
        "(\n\
         \u{20} { f: 1 }\n\
         \u{20}   ^f1\n\
         \u{20} { f: 2 }\n\
         \u{20}   ^f2\n\
         ).f\n\
         \u{20} ^ref\n",
    );
    // Both sides of the composition define `f`; both are answers.
    f.assert_definitions("ref", &["f1", "f2"]);
}

#[test]
fn variable_object_composition() {
    let mut f = Fixture::new(
        "local o = { f: 1 };\n\
         \u{20}           ^f1\n\
         (o + { f: 2 }).f\n\
         \u{20}      ^f2     ^ref\n",
    );
    f.assert_definitions("ref", &["f1", "f2"]);
}

#[test]
fn object_variable_composition() {
    let mut f = Fixture::new(
        "local o = { f: 1 };\n\
         \u{20}           ^f1\n\
         ({ f: 2 } + o).f\n\
         \u{20}  ^f2         ^ref\n",
    );
    f.assert_definitions("ref", &["f1", "f2"]);
}

#[test]
fn composition_chain_chases_the_defining_value() {
    let mut f = Fixture::new(
        "local o1 = { f: 1 };\n\
         local o2 = { f: 2 };\n\
         local o3 = { f: { g: 3 } };\n\
         \u{20}                 ^g\n\
         (o1 + o2 + o3).f.g\n\
         \u{20}                ^g.1\n",
    );
    f.assert_definitions("g.1", &["g"]);
}

#[test]
fn self_field_access() {
    let mut f = Fixture::new(
        "{ f1: 1, f2: self.f1 }\n\
         \u{20} ^^f1            ^^ref\n",
    );
    f.assert_definitions("ref", &["f1"]);
}

#[test]
fn super_after_literal_composition() {
    let mut f = Fixture::new(
        "{ f1: 1 } + { f1: 2, f2: super.f1 }\n\
         \u{20} ^^base                       ^^ref\n",
    );
    f.assert_definitions("ref", &["base"]);
}

#[test]
fn super_after_variable_composition() {
    let mut f = Fixture::new(
        "local o1 = { f1: 1 };\n\
         \u{20}            ^^f1\n\
         o1 + { f1: 2, f2: super.f1 }\n\
         \u{20}                       ^^ref\n",
    );
    f.assert_definitions("ref", &["f1"]);
}

#[test]
fn super_outside_any_composition_is_empty() {
    // The base of `o2` only exists where `o1 + o2` is composed; inside the
    // bind value there is nothing to resolve against.
    let mut f = Fixture::new(
        "local o1 = { f1: 1 };\n\
         local o2 = { f1: 2, f2: super.f1 };\n\
         \u{20}                             ^^ref\n\
         o1 + o2\n",
    );
    assert!(f.ws.definitions(support::MAIN, "ref").is_empty());
}

#[test]
fn named_argument_resolves_to_the_parameter() {
    let mut f = Fixture::new(
        "local f(p) = p + 1; f(p = 1)\n\
         \u{20}     ^f            ^f.1\n\
         \u{20}       ^p   ^p.body  ^p.arg\n",
    );
    f.assert_definitions("p.arg", &["p"]);
    f.assert_definitions("p.body", &["p"]);
    f.assert_definitions("f.1", &["f"]);
}

#[test]
fn named_argument_through_an_import() {
    let mut ws = Workspace::build(&[
        (
            "lib.jsonnet",
            "function(p) p\n\
             \u{20}        ^p\n",
        ),
        (
            "main.jsonnet",
            "local f = import 'lib.jsonnet'; f(p = 1)\n\
             \u{20}                                 ^p.arg\n",
        ),
    ]);
    ws.assert_definitions(("main.jsonnet", "p.arg"), &[("lib.jsonnet", "p")]);
}

#[test]
fn field_through_an_import() {
    let mut ws = Workspace::build(&[
        (
            "a.jsonnet",
            "{ f: 1 }\n\
             \u{20} ^f\n",
        ),
        (
            "b.jsonnet",
            "(import 'a.jsonnet').f\n\
             \u{20}                    ^ref\n",
        ),
    ]);
    ws.assert_definitions(("b.jsonnet", "ref"), &[("a.jsonnet", "f")]);
}

#[test]
fn import_cycles_terminate() {
    let mut ws = Workspace::build(&[
        ("a.jsonnet", "(import 'b.jsonnet').f\n"),
        ("b.jsonnet", "import 'a.jsonnet'\n"),
    ]);
    // No answer, but no hang either.
    let doc = ws.doc("a.jsonnet");
    let pos = jsonnet_analyzer::lsp_types::Position::new(0, 21);
    let defs =
        jsonnet_analyzer::providers::DefinitionProvider::new(&mut ws.loader).serve(&doc, pos);
    assert!(defs.is_empty());
}

#[test]
fn opaque_imports_are_not_followed() {
    // `importstr`/`importbin` importees are data, not documents.
    let mut ws = Workspace::build(&[
        ("a.jsonnet", "{ f: 1 }\n"),
        (
            "b.jsonnet",
            "(importstr 'a.jsonnet').f\n\
             \u{20}                       ^ref\n",
        ),
    ]);
    assert!(ws.definitions("b.jsonnet", "ref").is_empty());
}

#[test]
fn missing_import_degrades_to_empty() {
    let mut f = Fixture::new(
        "(import 'nowhere.jsonnet').f\n\
         \u{20}                          ^ref\n",
    );
    assert!(f.ws.definitions(support::MAIN, "ref").is_empty());
}

#[test]
fn variable_and_field_names_do_not_collide() {
    let mut f = Fixture::new(
        "local f = { f: 1 };\n\
         \u{20}     ^fvar ^fkey1\n\
         { f: f }.f.f\n\
         \u{20} ^fkey2\n\
         \u{20}    ^fref\n\
         \u{20}        ^acc1\n\
         \u{20}          ^acc2\n",
    );
    f.assert_definitions("fref", &["fvar"]);
    f.assert_definitions("acc1", &["fkey2"]);
    f.assert_definitions("acc2", &["fkey1"]);
}

#[test]
fn local_bodies_are_transparent_to_field_search() {
    let mut f = Fixture::new(
        "(local a = { f: 1 }; a).f\n\
         \u{20}            ^f         ^ref\n",
    );
    f.assert_definitions("ref", &["f"]);
}

#[test]
fn assert_bodies_are_transparent_to_field_search() {
    let mut f = Fixture::new(
        "(assert true; { g: 2 }).g\n\
         \u{20}               ^g      ^ref\n",
    );
    f.assert_definitions("ref", &["g"]);
}

#[test]
fn positions_off_any_reference_answer_nothing() {
    let mut f = Fixture::new(
        "local x = 1; x\n\
         \u{20}         ^num\n",
    );
    assert!(f.ws.definitions(support::MAIN, "num").is_empty());
}
