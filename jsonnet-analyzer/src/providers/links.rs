//! Document links: every resolvable import path links to its importee.

use lsp_types::DocumentLink;

use crate::ast::{Document, NodeKind};
use crate::location::uri_from_path;
use crate::loader::DocumentLoader;

pub struct DocumentLinkProvider<'a> {
    loader: &'a DocumentLoader,
}

impl<'a> DocumentLinkProvider<'a> {
    pub fn new(loader: &'a DocumentLoader) -> Self {
        Self { loader }
    }

    pub fn serve(&self, doc: &Document) -> Vec<DocumentLink> {
        let mut out = Vec::new();
        let mut stack = vec![doc.root()];
        while let Some(node) = stack.pop() {
            if let NodeKind::Import { path, .. } = doc.kind(node) {
                if let NodeKind::Str { raw } = doc.kind(*path) {
                    let target = self
                        .loader
                        .resolve_import(doc.uri(), raw)
                        .and_then(|p| uri_from_path(&p));
                    if let Some(target) = target {
                        out.push(DocumentLink {
                            range: doc.range(*path),
                            target: Some(target),
                            tooltip: None,
                            data: None,
                        });
                    }
                }
            }
            stack.extend(doc.children(node));
        }
        out.sort_by_key(|l| l.range.start);
        out
    }
}
