//! Inlay hints.
//!
//! - an up-arrow after every resolved variable reference;
//! - a down-arrow plus reference count after every binding site (`local`
//!   binds, parameters, for-spec ids; the latter bind "downwards" into
//!   the comprehension body that textually precedes them);
//! - visibility/inheritance notes (`hidden`, `forced visible`,
//!   `inherited`) after field keys.

use lsp_types::{InlayHint, InlayHintLabel, InlayHintLabelPart, Range};

use crate::ast::visitor::{Next, Visitor};
use crate::ast::{AnalysisPhase, Document, NodeId, NodeKind, Visibility};

const REFERENCE_ICON: &str = "↑";
const DEFINITION_ICON: &str = "↓";

pub struct InlayHintProvider {
    hints: Vec<InlayHint>,
}

impl InlayHintProvider {
    pub fn new() -> Self {
        Self { hints: Vec::new() }
    }

    /// Hints for the whole document; the service trims to the requested
    /// range.
    pub fn serve(mut self, doc: &Document) -> Vec<InlayHint> {
        if doc.phase() != AnalysisPhase::ScopeResolved {
            return Vec::new();
        }
        self.visit(doc, doc.root());
        self.hints.sort_by_key(|h| h.position);
        self.hints
    }

    fn push(&mut self, hint: InlayHint) {
        self.hints.push(hint);
    }

    fn reference_hint(&mut self, range: Range) {
        self.push(plain_hint(range, InlayHintLabel::String(REFERENCE_ICON.into())));
    }

    fn binder_hint(&mut self, doc: &Document, var: NodeId) {
        let NodeKind::Var { references, .. } = doc.kind(var) else {
            return;
        };
        let label = InlayHintLabel::LabelParts(vec![
            label_part(DEFINITION_ICON.to_string()),
            label_part(references.len().to_string()),
        ]);
        self.push(plain_hint(doc.range(var), label));
    }
}

impl Default for InlayHintProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn label_part(value: String) -> InlayHintLabelPart {
    InlayHintLabelPart {
        value,
        tooltip: None,
        location: None,
        command: None,
    }
}

fn plain_hint(range: Range, label: InlayHintLabel) -> InlayHint {
    InlayHint {
        position: range.end,
        label,
        kind: None,
        text_edits: None,
        tooltip: None,
        padding_left: None,
        padding_right: None,
        data: None,
    }
}

impl Visitor for InlayHintProvider {
    fn visit_var_ref(&mut self, doc: &Document, id: NodeId) {
        if matches!(doc.kind(id), NodeKind::VarRef { target: Some(_), .. }) {
            self.reference_hint(doc.range(id));
        }
    }

    fn visit_bind(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Bind { id: var, value } = doc.kind(id) {
            let (var, value) = (*var, *value);
            self.binder_hint(doc, var);
            self.visit(doc, value);
        }
    }

    fn visit_param(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Param { id: var, default } = doc.kind(id) {
            let (var, default) = (*var, *default);
            self.binder_hint(doc, var);
            if let Some(default) = default {
                self.visit(doc, default);
            }
        }
    }

    fn visit_for_spec(&mut self, doc: &Document, id: NodeId, next: Next<'_, Self>) {
        if let NodeKind::ForSpec { id: var, source } = doc.kind(id) {
            let (var, source) = (*var, *source);
            self.binder_hint(doc, var);
            self.visit(doc, source);
        }
        next(self, doc);
    }

    fn visit_fixed_key(&mut self, doc: &Document, _object: NodeId, field: NodeId, key: NodeId) {
        let NodeKind::Field {
            visibility,
            inherited,
            ..
        } = doc.kind(field)
        else {
            return;
        };

        let mut notes: Vec<&str> = Vec::new();
        match visibility {
            Visibility::Hidden => notes.push("hidden"),
            Visibility::Forced => notes.push("forced visible"),
            Visibility::Default => {}
        }
        if *inherited {
            notes.push("inherited");
        }
        if notes.is_empty() {
            return;
        }

        let mut hint = plain_hint(doc.range(key), InlayHintLabel::String(notes.join(", ")));
        hint.padding_left = Some(true);
        hint.padding_right = Some(true);
        self.push(hint);
    }
}
