//! Variable rename: prepare + single-file edit set. Field rename and
//! cross-document rename are out of scope.

use std::collections::HashMap;

use lsp_types::{Position, Range, TextEdit, WorkspaceEdit};

use crate::ast::{AnalysisPhase, Document, NodeId, NodeKind};

pub struct RenameProvider;

impl RenameProvider {
    /// The renameable range and placeholder at `pos`, when the cursor is on
    /// a variable binding or reference.
    pub fn prepare(doc: &Document, pos: Position) -> Option<(Range, String)> {
        if doc.phase() != AnalysisPhase::ScopeResolved {
            return None;
        }
        let node = doc.node_at_position(pos)?;
        match doc.kind(node) {
            NodeKind::Var { name, .. } | NodeKind::VarRef { name, .. } => {
                Some((doc.range(node), name.clone()))
            }
            _ => None,
        }
    }

    /// Edits replacing the binding site and every reference with
    /// `new_name`. `None` when the position is not a variable or the new
    /// name is not an identifier.
    pub fn serve(doc: &Document, pos: Position, new_name: &str) -> Option<WorkspaceEdit> {
        if doc.phase() != AnalysisPhase::ScopeResolved || !is_identifier(new_name) {
            return None;
        }
        let node = doc.node_at_position(pos)?;

        let var = match doc.kind(node) {
            NodeKind::Var { .. } => Some(node),
            NodeKind::VarRef { target, .. } => *target,
            _ => None,
        }?;

        let mut targets: Vec<NodeId> = vec![var];
        if let NodeKind::Var { references, .. } = doc.kind(var) {
            targets.extend(references);
        }

        let mut edits: Vec<TextEdit> = targets
            .into_iter()
            .map(|id| TextEdit {
                range: doc.range(id),
                new_text: new_name.to_string(),
            })
            .collect();
        edits.sort_by_key(|e| e.range.start);

        let changes = HashMap::from([(doc.uri().clone(), edits)]);
        Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
