//! Lightweight providers: symbols, highlights, inlay hints, folding,
//! rename, document links, and import hover.

mod support;

use jsonnet_analyzer::lsp_types::{
    DocumentHighlightKind, DocumentSymbol, HoverContents, InlayHintLabel, MarkedString, SymbolKind,
};
use jsonnet_analyzer::providers::{
    DocumentHighlightProvider, DocumentLinkProvider, DocumentSymbolProvider, FoldingRangeProvider,
    HoverProvider, InlayHintProvider, RenameProvider,
};
use pretty_assertions::assert_eq;
use support::{Fixture, Workspace};

fn flat_names(symbols: &[DocumentSymbol]) -> Vec<(String, SymbolKind)> {
    symbols.iter().map(|s| (s.name.clone(), s.kind)).collect()
}

#[test]
fn document_symbols_nest_by_construct() {
    let mut f = Fixture::new(
        "local lib = import 'lib.jsonnet';\n\
         local mk(name) = { app: name };\n\
         mk('x')\n",
    );
    let doc = f.doc();
    let symbols = DocumentSymbolProvider::new().serve(&doc);

    assert_eq!(
        flat_names(&symbols),
        vec![
            ("lib".to_string(), SymbolKind::VARIABLE),
            ("mk".to_string(), SymbolKind::FUNCTION),
        ]
    );

    // `lib` holds the import's file symbol.
    let lib_children = symbols[0].children.as_deref().unwrap_or_default();
    assert_eq!(
        flat_names(lib_children),
        vec![("lib.jsonnet".to_string(), SymbolKind::FILE)]
    );

    // `mk` holds its parameter and the object's field.
    let mk_children = symbols[1].children.as_deref().unwrap_or_default();
    assert_eq!(
        flat_names(mk_children),
        vec![
            ("name".to_string(), SymbolKind::VARIABLE),
            ("app".to_string(), SymbolKind::FIELD),
        ]
    );
}

#[test]
fn for_spec_ids_become_variable_symbols() {
    let mut f = Fixture::new("[i for i in [1, 2]]\n");
    let doc = f.doc();
    let symbols = DocumentSymbolProvider::new().serve(&doc);
    assert_eq!(
        flat_names(&symbols),
        vec![("i".to_string(), SymbolKind::VARIABLE)]
    );
}

#[test]
fn highlights_mark_write_and_reads() {
    let mut f = Fixture::new(
        "local x = 1; x + x\n\
         \u{20}     ^x     ^x.1^x.2\n",
    );
    let doc = f.doc();

    // From the binder and from a reference alike.
    for mark in ["x", "x.1"] {
        let highlights = DocumentHighlightProvider::serve(&doc, f.start(mark));
        let kinds: Vec<_> = highlights.iter().map(|h| (h.range, h.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (f.range("x"), Some(DocumentHighlightKind::WRITE)),
                (f.range("x.1"), Some(DocumentHighlightKind::READ)),
                (f.range("x.2"), Some(DocumentHighlightKind::READ)),
            ],
            "highlights from {mark}"
        );
    }
}

#[test]
fn inlay_hints_arrow_references_and_count_binders() {
    let mut f = Fixture::new(
        "local x = 1; x + x\n\
         \u{20}     ^x     ^x.1^x.2\n",
    );
    let doc = f.doc();
    let hints = InlayHintProvider::new().serve(&doc);

    // One binder hint (with the reference count) and two reference hints.
    assert_eq!(hints.len(), 3);

    assert_eq!(hints[0].position, f.range("x").end);
    let InlayHintLabel::LabelParts(parts) = &hints[0].label else {
        panic!("binder hint uses label parts");
    };
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].value, "↓");
    assert_eq!(parts[1].value, "2");

    for (hint, mark) in hints[1..].iter().zip(["x.1", "x.2"]) {
        assert_eq!(hint.position, f.range(mark).end);
        assert!(matches!(&hint.label, InlayHintLabel::String(s) if s == "↑"));
    }
}

#[test]
fn inlay_hints_annotate_field_visibility() {
    let mut f = Fixture::new(
        "{ a:: 1, b+: 2, c: 3 }\n\
         \u{20} ^a     ^b\n",
    );
    let doc = f.doc();
    let hints = InlayHintProvider::new().serve(&doc);

    let labels: Vec<(u32, String)> = hints
        .iter()
        .filter_map(|h| match &h.label {
            InlayHintLabel::String(s) => Some((h.position.character, s.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            (f.range("a").end.character, "hidden".to_string()),
            (f.range("b").end.character, "inherited".to_string()),
        ]
    );
}

#[test]
fn folding_covers_multiline_containers_only() {
    let mut f = Fixture::new(
        "{\n\
         \u{20} arr: [\n\
         \u{20}   1,\n\
         \u{20} ],\n\
         \u{20} one: { x: 1 },\n\
         }\n",
    );
    let doc = f.doc();
    let folds = FoldingRangeProvider::serve(&doc);

    // The outer object and the multi-line array fold; the one-line object
    // does not.
    let spans: Vec<(u32, u32)> = folds.iter().map(|f| (f.start_line, f.end_line)).collect();
    assert_eq!(spans, vec![(0, 5), (1, 3)]);
}

#[test]
fn rename_rewrites_binder_and_references() {
    let mut f = Fixture::new(
        "local x = 1; x + x\n\
         \u{20}     ^x     ^x.1^x.2\n",
    );
    let doc = f.doc();

    let (range, placeholder) =
        RenameProvider::prepare(&doc, f.start("x.1")).expect("renameable position");
    assert_eq!(range, f.range("x.1"));
    assert_eq!(placeholder, "x");

    let edit = RenameProvider::serve(&doc, f.start("x"), "z").expect("rename succeeds");
    let changes = edit.changes.expect("changes map");
    let edits = &changes[&f.uri()];
    let targets: Vec<_> = edits.iter().map(|e| e.range).collect();
    assert_eq!(targets, vec![f.range("x"), f.range("x.1"), f.range("x.2")]);
    assert!(edits.iter().all(|e| e.new_text == "z"));
}

#[test]
fn rename_rejects_non_identifiers_and_non_variables() {
    let mut f = Fixture::new(
        "local x = 1; x\n\
         \u{20}     ^x  ^num\n",
    );
    let doc = f.doc();
    assert!(RenameProvider::serve(&doc, f.start("x"), "not an ident").is_none());
    assert!(RenameProvider::prepare(&doc, f.start("num")).is_none());
}

#[test]
fn document_links_target_resolved_imports() {
    let mut ws = Workspace::build(&[
        ("lib.jsonnet", "{ ok: true }\n"),
        (
            "main.jsonnet",
            "local lib = import 'lib.jsonnet';\n\
             \u{20}           \u{20}      ^^^^^^^^^^^^^path\n\
             local gone = import 'missing.jsonnet';\n\
             lib\n",
        ),
    ]);
    let doc = ws.doc("main.jsonnet");
    let links = DocumentLinkProvider::new(&ws.loader).serve(&doc);

    // Only the resolvable import produces a link.
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].range, ws.range("main.jsonnet", "path"));
    assert_eq!(links[0].target.as_ref(), Some(&ws.uri("lib.jsonnet")));
}

#[test]
fn hovering_an_import_path_shows_the_importee() {
    let mut ws = Workspace::build(&[
        ("lib.jsonnet", "{ ok: true }\n"),
        (
            "main.jsonnet",
            "import 'lib.jsonnet'\n\
             \u{20}      ^^^^^^^^^^^^^path\n",
        ),
    ]);
    let doc = ws.doc("main.jsonnet");
    let hover = HoverProvider::new(&ws.loader)
        .serve(&doc, ws.start("main.jsonnet", "path"))
        .expect("hover on import path");

    let HoverContents::Scalar(MarkedString::String(text)) = hover.contents else {
        panic!("plain string hover");
    };
    assert_eq!(text, ws.uri("lib.jsonnet").to_string());
    assert_eq!(hover.range, Some(ws.range("main.jsonnet", "path")));
}
