//! Nested document symbols.
//!
//! Binds become Variable or Function symbols (depending on the bound
//! value), parameters and for-spec ids become Variables, fixed field keys
//! become Fields, imports become File symbols. Nesting follows the
//! traversal via a breadcrumb stack.

use lsp_types::{DocumentSymbol, Range, SymbolKind};

use crate::ast::visitor::{Next, Visitor};
use crate::ast::{Document, NodeId, NodeKind};

pub struct DocumentSymbolProvider {
    /// `stack[0]` is a synthetic root; finished symbols attach to the top.
    stack: Vec<DocumentSymbol>,
}

#[allow(deprecated)] // `DocumentSymbol::deprecated` is required by the struct literal
fn symbol(name: String, kind: SymbolKind, range: Range, selection_range: Range) -> DocumentSymbol {
    DocumentSymbol {
        name,
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: None,
    }
}

impl DocumentSymbolProvider {
    pub fn new() -> Self {
        let dummy = Range::default();
        Self {
            stack: vec![symbol("__root__".into(), SymbolKind::MODULE, dummy, dummy)],
        }
    }

    pub fn serve(mut self, doc: &Document) -> Vec<DocumentSymbol> {
        self.visit(doc, doc.root());
        self.stack.swap_remove(0).children.unwrap_or_default()
    }

    fn add(&mut self, symbol: DocumentSymbol) {
        let parent = self.stack.last_mut().expect("root symbol always present");
        parent.children.get_or_insert_with(Vec::new).push(symbol);
    }

    /// Run `inner` with `symbol` as the current parent, then attach it.
    fn nest(&mut self, symbol: DocumentSymbol, doc: &Document, inner: impl FnOnce(&mut Self, &Document)) {
        self.stack.push(symbol);
        inner(self, doc);
        let finished = self.stack.pop().expect("pushed above");
        self.add(finished);
    }
}

impl Default for DocumentSymbolProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for DocumentSymbolProvider {
    fn visit_bind(&mut self, doc: &Document, id: NodeId) {
        let NodeKind::Bind { id: var, value } = doc.kind(id) else {
            return;
        };
        let (var, value) = (*var, *value);
        let Some(name) = doc.name_of(var).map(str::to_owned) else {
            return;
        };

        let kind = match doc.kind(value) {
            NodeKind::Fn { .. } => SymbolKind::FUNCTION,
            _ => SymbolKind::VARIABLE,
        };
        let sym = symbol(name, kind, doc.range(id), doc.range(var));
        self.nest(sym, doc, |v, d| v.visit(d, value));
    }

    fn visit_param(&mut self, doc: &Document, id: NodeId) {
        let NodeKind::Param { id: var, default } = doc.kind(id) else {
            return;
        };
        let (var, default) = (*var, *default);
        let Some(name) = doc.name_of(var).map(str::to_owned) else {
            return;
        };

        let sym = symbol(name, SymbolKind::VARIABLE, doc.range(id), doc.range(var));
        match default {
            Some(default) => self.nest(sym, doc, |v, d| v.visit(d, default)),
            None => self.add(sym),
        }
    }

    fn visit_fixed_key(&mut self, doc: &Document, _object: NodeId, field: NodeId, key: NodeId) {
        // The field value is visited from `visit_field_value`; here we only
        // open the symbol so nested values land under their key. To keep
        // the pairing simple the whole field subtree is handled right here
        // instead.
        let Some(name) = doc.key_name(key).map(str::to_owned) else {
            return;
        };
        let sym = symbol(name, SymbolKind::FIELD, doc.range(field), doc.range(key));
        let NodeKind::Field { value, .. } = doc.kind(field) else {
            self.add(sym);
            return;
        };
        let value = *value;
        self.nest(sym, doc, |v, d| v.visit(d, value));
    }

    fn visit_field_value(&mut self, doc: &Document, field: NodeId) {
        // Fixed-key field values were already walked under their symbol in
        // `visit_fixed_key`; only computed-key values remain.
        if let NodeKind::Field { key, value, .. } = doc.kind(field) {
            if matches!(doc.kind(*key), NodeKind::ComputedKey { .. }) {
                self.visit(doc, *value);
            }
        }
    }

    fn visit_for_spec(&mut self, doc: &Document, id: NodeId, next: Next<'_, Self>) {
        if let NodeKind::ForSpec { id: var, source } = doc.kind(id) {
            let (var, source) = (*var, *source);
            if let Some(name) = doc.name_of(var).map(str::to_owned) {
                self.add(symbol(
                    name,
                    SymbolKind::VARIABLE,
                    doc.range(id),
                    doc.range(var),
                ));
            }
            self.visit(doc, source);
        }
        next(self, doc);
    }

    fn visit_import(&mut self, doc: &Document, id: NodeId) {
        if let NodeKind::Import { path, .. } = doc.kind(id) {
            if let NodeKind::Str { raw } = doc.kind(*path) {
                self.add(symbol(
                    raw.clone(),
                    SymbolKind::FILE,
                    doc.range(id),
                    doc.range(*path),
                ));
            }
        }
    }
}
