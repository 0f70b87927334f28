//! Plain-text tree printers for the CLI: the Jsonnet AST, the raw
//! tree-sitter CST, and the resolved variable scope tree.

use lsp_types::Range;

use super::{Document, NodeId, NodeKind};
use crate::scope::ScopeId;

struct PrettyNode {
    text: String,
    children: Vec<PrettyNode>,
}

fn render(root: PrettyNode) -> String {
    fn grow(lines: &mut Vec<String>, nodes: &[PrettyNode], branches: &str) {
        for (i, node) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let fork = if last { "`-- " } else { "|-- " };
            let pad = if last { ".   " } else { "|   " };
            lines.push(format!("{branches}{fork}{}", node.text));
            grow(lines, &node.children, &format!("{branches}{pad}"));
        }
    }

    let mut lines = vec![root.text.clone()];
    grow(&mut lines, &root.children, "");
    lines.join("\n")
}

fn fmt_range(range: Range) -> String {
    format!(
        "{}:{}..{}:{}",
        range.start.line, range.start.character, range.end.line, range.end.character
    )
}

/// Escape and truncate potentially multi-line text for one-line display.
fn escape(s: &str, limit: usize) -> String {
    let escaped: String = s
        .chars()
        .take(limit)
        .map(|c| match c {
            '\n' => "\\n".to_string(),
            '\t' => "\\t".to_string(),
            '\r' => "\\r".to_string(),
            '"' => "\\\"".to_string(),
            c => c.to_string(),
        })
        .collect();
    let postfix = if s.chars().count() > limit {
        format!("[{} characters]", s.chars().count() - limit)
    } else {
        String::new()
    };
    format!("\"{escaped}{postfix}\"")
}

fn node_text(doc: &Document, id: NodeId) -> String {
    let kind = doc.kind(id);
    let range = fmt_range(doc.range(id));
    let payload = match kind {
        NodeKind::Document { .. } => return format!("Document [{}]", doc.uri()),
        NodeKind::Num { value } => Some(format!("{value}")),
        NodeKind::Str { raw } => Some(escape(raw, 50)),
        NodeKind::Bool { value } => Some(format!("{value}")),
        NodeKind::Var { name, references } => {
            Some(format!("{name} ({} refs)", references.len()))
        }
        NodeKind::VarRef { name, target, .. } => Some(if target.is_some() {
            name.clone()
        } else {
            format!("{name} (unresolved)")
        }),
        NodeKind::FieldId { name } | NodeKind::FieldRef { name } | NodeKind::ParamRef { name } => {
            Some(name.clone())
        }
        NodeKind::Binary { op, .. } => Some(format!("`{}`", op.as_str())),
        NodeKind::Unary { op, .. } => Some(format!("`{}`", op.as_str())),
        NodeKind::Field {
            visibility,
            inherited,
            ..
        } => {
            let mut text = visibility.as_str().to_string();
            if *inherited {
                text.insert(0, '+');
            }
            Some(format!("`{text}`"))
        }
        NodeKind::Import { kind, .. } => Some(
            match kind {
                super::ImportKind::Default => "import",
                super::ImportKind::Str => "importstr",
                super::ImportKind::Bin => "importbin",
            }
            .to_string(),
        ),
        NodeKind::Error { cst_kind } => Some(format!("<{cst_kind}>")),
        _ => None,
    };

    match payload {
        Some(payload) => format!("{} {} [{}]", kind.name(), payload, range),
        None => format!("{} [{}]", kind.name(), range),
    }
}

fn ast_node(doc: &Document, id: NodeId) -> PrettyNode {
    PrettyNode {
        text: node_text(doc, id),
        children: doc
            .children(id)
            .into_iter()
            .map(|child| ast_node(doc, child))
            .collect(),
    }
}

/// Render the lowered AST.
pub fn ast_tree(doc: &Document) -> String {
    render(ast_node(doc, doc.root()))
}

fn cst_node(node: tree_sitter::Node, source: &str, label: Option<&str>) -> PrettyNode {
    let range = format!(
        "{}:{}..{}:{}",
        node.start_position().row,
        node.start_position().column,
        node.end_position().row,
        node.end_position().column
    );
    let text = if node.is_named() {
        format!("{} [{}]", node.kind(), range)
    } else {
        let token = &source[node.byte_range()];
        format!("{} [{}]", escape(token, 50), range)
    };
    let text = match label {
        Some(label) => format!("{label}={text}"),
        None => text,
    };

    let mut children = Vec::new();
    let mut cursor = node.walk();
    for (i, child) in node.children(&mut cursor).enumerate() {
        let field = node.field_name_for_child(i as u32);
        children.push(cst_node(child, source, field));
    }
    PrettyNode { text, children }
}

/// Render the raw tree-sitter CST of `source`.
pub fn cst_tree(tree: &tree_sitter::Tree, source: &str) -> String {
    render(cst_node(tree.root_node(), source, None))
}

fn scope_node(doc: &Document, scope: ScopeId) -> PrettyNode {
    let data = doc.scopes().var_scope(scope);

    let owner = PrettyNode {
        text: format!("owner={}", node_text(doc, data.owner)),
        children: Vec::new(),
    };

    let bindings = PrettyNode {
        text: if data.bindings.is_empty() {
            "bindings=[]".to_string()
        } else {
            "bindings".to_string()
        },
        children: data
            .bindings
            .iter()
            .map(|b| PrettyNode {
                text: format!(
                    "\"{}\" <- {} @ {}",
                    b.name,
                    doc.kind(b.target).name(),
                    fmt_range(doc.range(b.target))
                ),
                children: Vec::new(),
            })
            .collect(),
    };

    let children = PrettyNode {
        text: if data.children.is_empty() {
            "children=[]".to_string()
        } else {
            "children".to_string()
        },
        children: data
            .children
            .iter()
            .map(|&child| scope_node(doc, child))
            .collect(),
    };

    PrettyNode {
        text: "Scope".to_string(),
        children: vec![owner, bindings, children],
    }
}

/// Render the resolved variable scope tree (empty output when the document
/// has not been resolved).
pub fn scope_tree(doc: &Document) -> String {
    match doc.var_scope_of(doc.root()) {
        Some(root) => render(scope_node(doc, root)),
        None => String::new(),
    }
}
