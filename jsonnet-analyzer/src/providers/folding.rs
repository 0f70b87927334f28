//! Folding ranges for every multi-line array, object, comprehension, and
//! function.

use lsp_types::{FoldingRange, Range};

use crate::ast::{Document, NodeKind};

pub struct FoldingRangeProvider;

impl FoldingRangeProvider {
    pub fn serve(doc: &Document) -> Vec<FoldingRange> {
        let mut out = Vec::new();
        let mut stack = vec![doc.root()];
        while let Some(node) = stack.pop() {
            if matches!(
                doc.kind(node),
                NodeKind::Array { .. }
                    | NodeKind::Object { .. }
                    | NodeKind::ObjComp { .. }
                    | NodeKind::ListComp { .. }
                    | NodeKind::Fn { .. }
            ) {
                if let Some(folding) = folding_range(doc.range(node)) {
                    out.push(folding);
                }
            }
            stack.extend(doc.children(node));
        }
        out.sort_by_key(|f| (f.start_line, f.start_character));
        out.dedup();
        out
    }
}

fn folding_range(range: Range) -> Option<FoldingRange> {
    if range.start.line == range.end.line {
        return None;
    }
    Some(FoldingRange {
        start_line: range.start.line,
        start_character: Some(range.start.character),
        end_line: range.end.line,
        end_character: Some(range.end.character),
        kind: None,
        collapsed_text: None,
    })
}
