//! Find-references.
//!
//! Variables are answered from the resolver's reference lists. Fields are
//! workspace-wide: every file is pre-filtered with a `\b<name>\b` regex (a
//! correctness-preserving prune: a file without the token cannot contain a
//! reference), survivors are loaded and their field accesses checked
//! against the queried key. A slow path skips the prune for exhaustive
//! rescans.

use std::sync::Arc;

use lsp_types::{Location, Position};
use regex::Regex;
use tracing::debug;

use crate::ast::{AnalysisPhase, Document, NodeId, NodeKind};
use crate::location::{compare_locations, uri_from_path};
use crate::loader::DocumentLoader;
use crate::providers::definition::DefinitionProvider;

pub struct ReferencesProvider<'a> {
    loader: &'a mut DocumentLoader,
    /// When set, parse every workspace file instead of regex-pruning.
    exhaustive: bool,
}

impl<'a> ReferencesProvider<'a> {
    pub fn new(loader: &'a mut DocumentLoader) -> Self {
        Self {
            loader,
            exhaustive: false,
        }
    }

    pub fn exhaustive(loader: &'a mut DocumentLoader) -> Self {
        Self {
            loader,
            exhaustive: true,
        }
    }

    /// All references to the symbol at `pos`, sorted by `(uri, start)`.
    pub fn serve(&mut self, doc: &Arc<Document>, pos: Position) -> Vec<Location> {
        if doc.phase() != AnalysisPhase::ScopeResolved {
            return Vec::new();
        }
        let Some(node) = doc.node_at_position(pos) else {
            return Vec::new();
        };

        let mut refs = match doc.kind(node) {
            NodeKind::Var { references, .. } => {
                references.iter().map(|&r| doc.location(r)).collect()
            }
            NodeKind::VarRef {
                target: Some(var), ..
            } => match doc.kind(*var) {
                NodeKind::Var { references, .. } => {
                    references.iter().map(|&r| doc.location(r)).collect()
                }
                _ => Vec::new(),
            },
            // On a field key: either directly on the identifier, or on the
            // string form of a fixed key.
            NodeKind::FieldId { .. } | NodeKind::Str { .. } => match doc.parent(node) {
                Some(key) if matches!(doc.kind(key), NodeKind::FixedKey { .. }) => {
                    self.find_field_references(doc, key)
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        refs.sort_by(compare_locations);
        refs.dedup();
        refs
    }

    /// Workspace-wide search for accesses resolving to the given
    /// `FixedKey`.
    fn find_field_references(&mut self, key_doc: &Arc<Document>, key: NodeId) -> Vec<Location> {
        let Some(name) = key_doc.key_name(key).map(str::to_owned) else {
            return Vec::new();
        };
        let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(&name))) {
            Ok(pattern) => pattern,
            Err(_) => return Vec::new(),
        };

        let mut out = Vec::new();
        let mut scanned = 0usize;
        for path in self.loader.walk_workspace() {
            let Some(source) = self.loader.read_source(&path) else {
                continue;
            };
            if !self.exhaustive && !pattern.is_match(&source) {
                continue;
            }
            scanned += 1;

            let Some(uri) = uri_from_path(&path) else {
                continue;
            };
            let Some(doc) = self.loader.get(&uri) else {
                continue;
            };

            for access_field in collect_field_refs(&doc, &name) {
                let bindings =
                    DefinitionProvider::new(self.loader).find_field_binding(&doc, access_field);
                let hits_key = bindings
                    .iter()
                    .any(|(b_doc, b)| b_doc.uri() == key_doc.uri() && b.key == key);
                if hits_key {
                    out.push(doc.location(access_field));
                }
            }
        }
        debug!(field = %name, scanned, hits = out.len(), "field reference scan");
        out
    }
}

/// Every `FieldRef` of a `FieldAccess` in `doc` whose name matches.
fn collect_field_refs(doc: &Document, name: &str) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![doc.root()];
    while let Some(node) = stack.pop() {
        if let NodeKind::FieldAccess { field, .. } = doc.kind(node) {
            if doc.name_of(*field) == Some(name) {
                out.push(*field);
            }
        }
        stack.extend(doc.children(node));
    }
    out.sort();
    out
}
