//! Document highlights: the binding site of the variable under the cursor
//! (Write) plus every reference to it (Read).

use lsp_types::{DocumentHighlight, DocumentHighlightKind, Position};

use crate::ast::{AnalysisPhase, Document, NodeKind};

pub struct DocumentHighlightProvider;

impl DocumentHighlightProvider {
    pub fn serve(doc: &Document, pos: Position) -> Vec<DocumentHighlight> {
        if doc.phase() != AnalysisPhase::ScopeResolved {
            return Vec::new();
        }
        let Some(node) = doc.node_at_position(pos) else {
            return Vec::new();
        };

        let var = match doc.kind(node) {
            NodeKind::Var { .. } => Some(node),
            NodeKind::VarRef { target, .. } => *target,
            _ => None,
        };
        let Some(var) = var else {
            return Vec::new();
        };

        let mut highlights = vec![DocumentHighlight {
            range: doc.range(var),
            kind: Some(DocumentHighlightKind::WRITE),
        }];
        if let NodeKind::Var { references, .. } = doc.kind(var) {
            highlights.extend(references.iter().map(|&r| DocumentHighlight {
                range: doc.range(r),
                kind: Some(DocumentHighlightKind::READ),
            }));
        }
        highlights.sort_by_key(|h| h.range.start);
        highlights
    }
}
