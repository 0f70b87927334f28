//! Hover on import paths: shows where the import resolves to.

use lsp_types::{Hover, HoverContents, MarkedString, Position};

use crate::ast::{Document, NodeKind};
use crate::location::uri_from_path;
use crate::loader::DocumentLoader;

pub struct HoverProvider<'a> {
    loader: &'a DocumentLoader,
}

impl<'a> HoverProvider<'a> {
    pub fn new(loader: &'a DocumentLoader) -> Self {
        Self { loader }
    }

    pub fn serve(&self, doc: &Document, pos: Position) -> Option<Hover> {
        let node = doc.node_at_position(pos)?;

        // Accept the cursor on the path string or on the import keyword.
        let path = match doc.kind(node) {
            NodeKind::Import { path, .. } => *path,
            NodeKind::Str { .. } => {
                let parent = doc.parent(node)?;
                match doc.kind(parent) {
                    NodeKind::Import { .. } => node,
                    _ => return None,
                }
            }
            _ => return None,
        };

        let NodeKind::Str { raw } = doc.kind(path) else {
            return None;
        };
        let resolved = self.loader.resolve_import(doc.uri(), raw)?;
        let uri = uri_from_path(&resolved)?;

        Some(Hover {
            contents: HoverContents::Scalar(MarkedString::String(uri.to_string())),
            range: Some(doc.range(path)),
        })
    }
}
