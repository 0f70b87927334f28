//! Test fixtures: marked Jsonnet sources over an in-memory workspace.
//!
//! Mark lines sit under the source line they annotate and consist of caret
//! runs followed by a name:
//!
//! ```text
//! local x = 1; x + x
//!       ^x     ^x.1
//!              (second mark line for the same source line is fine)
//! ```
//!
//! Every named mark becomes an LSP `Range` on the preceding source line;
//! the caret count is the range width. Fixtures parse, build, and
//! scope-resolve their documents through the real loader so provider tests
//! exercise the full pipeline.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use jsonnet_analyzer::ast::Document;
use jsonnet_analyzer::loader::{DocumentLoader, MemorySourceStore};
use jsonnet_analyzer::location::{compare_locations, uri_from_path};
use jsonnet_analyzer::lsp_types::{Location, Position, Range, Url};
use jsonnet_analyzer::providers::{DefinitionProvider, ReferencesProvider};
use jsonnet_analyzer::NodeId;

pub const WORKSPACE_ROOT: &str = "/ws";

/// Parsed marked source: the clean text plus named ranges.
pub struct MarkedSource {
    pub source: String,
    pub marks: HashMap<String, Range>,
}

fn is_mark_line(line: &str) -> bool {
    line.trim_start().starts_with('^')
}

fn mark_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Strip mark lines out of `text`, attaching each caret run to the last
/// source line above it.
pub fn parse_marked(text: &str) -> MarkedSource {
    let mut source_lines: Vec<String> = Vec::new();
    let mut marks = HashMap::new();

    for line in text.lines() {
        if !is_mark_line(line) {
            source_lines.push(line.to_string());
            continue;
        }
        assert!(
            !source_lines.is_empty(),
            "mark line appears before any source line: {line:?}"
        );
        let target_line = (source_lines.len() - 1) as u32;

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0usize;
        while i < chars.len() {
            if chars[i] != '^' {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && chars[i] == '^' {
                i += 1;
            }
            let width = i - start;
            let name_start = i;
            while i < chars.len() && mark_name_char(chars[i]) {
                i += 1;
            }
            let name: String = chars[name_start..i].iter().collect();
            assert!(!name.is_empty(), "caret run without a name in {line:?}");
            let range = Range::new(
                Position::new(target_line, start as u32),
                Position::new(target_line, (start + width) as u32),
            );
            let previous = marks.insert(name.clone(), range);
            assert!(previous.is_none(), "duplicate mark {name:?}");
        }
    }

    let mut source = source_lines.join("\n");
    if text.ends_with('\n') {
        source.push('\n');
    }
    MarkedSource { source, marks }
}

/// A workspace of marked documents behind an in-memory store.
pub struct Workspace {
    pub loader: DocumentLoader,
    uris: HashMap<String, Url>,
    marks: HashMap<String, HashMap<String, Range>>,
}

impl Workspace {
    /// Build from `(relative_path, marked_source)` pairs rooted at
    /// [`WORKSPACE_ROOT`].
    pub fn build(files: &[(&str, &str)]) -> Self {
        let root = PathBuf::from(WORKSPACE_ROOT);
        let mut store = MemorySourceStore::new();
        let mut uris = HashMap::new();
        let mut marks = HashMap::new();

        for (name, marked) in files {
            let parsed = parse_marked(marked);
            let path = root.join(name);
            let uri = uri_from_path(&path).expect("absolute fixture path");
            store.insert(path, parsed.source);
            uris.insert((*name).to_string(), uri);
            marks.insert((*name).to_string(), parsed.marks);
        }

        Self {
            loader: DocumentLoader::new(Box::new(store), root),
            uris,
            marks,
        }
    }

    pub fn uri(&self, name: &str) -> Url {
        self.uris
            .get(name)
            .unwrap_or_else(|| panic!("unknown fixture document {name:?}"))
            .clone()
    }

    pub fn doc(&mut self, name: &str) -> Arc<Document> {
        let uri = self.uri(name);
        self.loader
            .get(&uri)
            .unwrap_or_else(|| panic!("fixture document {name:?} failed to load"))
    }

    pub fn range(&self, name: &str, mark: &str) -> Range {
        *self
            .marks
            .get(name)
            .and_then(|m| m.get(mark))
            .unwrap_or_else(|| panic!("unknown mark {mark:?} in {name:?}"))
    }

    pub fn location(&self, name: &str, mark: &str) -> Location {
        Location::new(self.uri(name), self.range(name, mark))
    }

    pub fn start(&self, name: &str, mark: &str) -> Position {
        self.range(name, mark).start
    }

    pub fn node_at(&mut self, name: &str, mark: &str) -> NodeId {
        let range = self.range(name, mark);
        let doc = self.doc(name);
        doc.node_at(range)
            .unwrap_or_else(|| panic!("no node at mark {mark:?} in {name:?}"))
    }

    pub fn definitions(&mut self, name: &str, mark: &str) -> Vec<Location> {
        let doc = self.doc(name);
        let pos = self.start(name, mark);
        let mut locations = DefinitionProvider::new(&mut self.loader).serve(&doc, pos);
        locations.sort_by(compare_locations);
        locations
    }

    pub fn references(&mut self, name: &str, mark: &str) -> Vec<Location> {
        let doc = self.doc(name);
        let pos = self.start(name, mark);
        ReferencesProvider::new(&mut self.loader).serve(&doc, pos)
    }

    /// Definition query at `ref_mark` must yield exactly the locations of
    /// `def_marks` (as `(document, mark)` pairs).
    pub fn assert_definitions(&mut self, at: (&str, &str), expected: &[(&str, &str)]) {
        let mut want: Vec<Location> = expected
            .iter()
            .map(|(doc, mark)| self.location(doc, mark))
            .collect();
        want.sort_by(compare_locations);

        let got = self.definitions(at.0, at.1);
        pretty_assertions::assert_eq!(got, want, "definitions at {:?}", at);
    }

    /// References query at `def_mark` must yield exactly the locations of
    /// `ref_marks`.
    pub fn assert_references(&mut self, at: (&str, &str), expected: &[(&str, &str)]) {
        let mut want: Vec<Location> = expected
            .iter()
            .map(|(doc, mark)| self.location(doc, mark))
            .collect();
        want.sort_by(compare_locations);

        let got = self.references(at.0, at.1);
        pretty_assertions::assert_eq!(got, want, "references at {:?}", at);
    }
}

/// Single-document sugar: the file is `main.jsonnet` at the workspace root.
pub struct Fixture {
    pub ws: Workspace,
}

pub const MAIN: &str = "main.jsonnet";

impl Fixture {
    pub fn new(marked: &str) -> Self {
        Self {
            ws: Workspace::build(&[(MAIN, marked)]),
        }
    }

    pub fn doc(&mut self) -> Arc<Document> {
        self.ws.doc(MAIN)
    }

    pub fn uri(&self) -> Url {
        self.ws.uri(MAIN)
    }

    pub fn range(&self, mark: &str) -> Range {
        self.ws.range(MAIN, mark)
    }

    pub fn location(&self, mark: &str) -> Location {
        self.ws.location(MAIN, mark)
    }

    pub fn start(&self, mark: &str) -> Position {
        self.ws.start(MAIN, mark)
    }

    pub fn node_at(&mut self, mark: &str) -> NodeId {
        self.ws.node_at(MAIN, mark)
    }

    pub fn assert_definitions(&mut self, ref_mark: &str, def_marks: &[&str]) {
        let expected: Vec<(&str, &str)> = def_marks.iter().map(|m| (MAIN, *m)).collect();
        self.ws.assert_definitions((MAIN, ref_mark), &expected);
    }

    pub fn assert_references(&mut self, def_mark: &str, ref_marks: &[&str]) {
        let expected: Vec<(&str, &str)> = ref_marks.iter().map(|m| (MAIN, *m)).collect();
        self.ws.assert_references((MAIN, def_mark), &expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_ranges_attach_to_the_preceding_line() {
        let parsed = parse_marked("local x = 1; x\n      ^x     ^x.1\n");
        assert_eq!(parsed.source, "local x = 1; x\n");
        assert_eq!(
            parsed.marks["x"],
            Range::new(Position::new(0, 6), Position::new(0, 7))
        );
        assert_eq!(
            parsed.marks["x.1"],
            Range::new(Position::new(0, 13), Position::new(0, 14))
        );
    }

    #[test]
    fn wide_marks_span_their_caret_run() {
        let parsed = parse_marked("{ foo: 1 }\n  ^^^key\n");
        assert_eq!(
            parsed.marks["key"],
            Range::new(Position::new(0, 2), Position::new(0, 5))
        );
    }
}
