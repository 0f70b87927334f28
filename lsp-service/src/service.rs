//! The synchronous workspace façade.
//!
//! One instance owns the document loader and answers every editor request;
//! the transport adapter serializes access to it. Each handler resolves the
//! document through the loader (loading lazily) and delegates to the
//! matching provider.

use std::path::PathBuf;
use std::sync::Arc;

use jsonnet_analyzer::ast::Document;
use jsonnet_analyzer::loader::{DocumentLoader, SourceStore};
use jsonnet_analyzer::location::{path_from_uri, range_contains};
use jsonnet_analyzer::providers::{
    DefinitionProvider, DocumentHighlightProvider, DocumentLinkProvider, DocumentSymbolProvider,
    FoldingRangeProvider, HoverProvider, InlayHintProvider, ReferencesProvider, RenameProvider,
};
use lsp_types::{
    DocumentHighlight, DocumentLink, DocumentSymbol, FoldingRange, Hover, InlayHint, Location,
    Position, Range, Url, WorkspaceEdit,
};
use tracing::info;

pub struct WorkspaceService {
    loader: DocumentLoader,
    root_known: bool,
    /// Search directories from configuration (env or initialize options);
    /// relative entries resolve against the workspace root.
    extra_search_dirs: Vec<PathBuf>,
}

impl WorkspaceService {
    /// A service rooted at the process working directory until
    /// `initialize`/`did_open` reveal the real workspace root.
    pub fn new(store: Box<dyn SourceStore>) -> Self {
        let fallback_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            loader: DocumentLoader::new(store, fallback_root),
            root_known: false,
            extra_search_dirs: Vec::new(),
        }
    }

    pub fn loader(&mut self) -> &mut DocumentLoader {
        &mut self.loader
    }

    /// Configure import search directories ahead of `initialize` (e.g. from
    /// the environment).
    pub fn set_search_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.extra_search_dirs = dirs;
        self.apply_search_dirs();
    }

    fn apply_search_dirs(&mut self) {
        if self.extra_search_dirs.is_empty() {
            return;
        }
        let root = self.loader.workspace_root().to_path_buf();
        let dirs = self
            .extra_search_dirs
            .iter()
            .map(|d| if d.is_absolute() { d.clone() } else { root.join(d) })
            .collect();
        self.loader.set_search_dirs(dirs);
    }

    /// Record the workspace root from the client's `rootUri`, when given.
    pub fn initialize(&mut self, root_uri: Option<Url>, search_dirs: Vec<PathBuf>) {
        if let Some(root) = root_uri.as_ref().and_then(path_from_uri) {
            info!(root = %root.display(), "workspace root from initialize");
            self.loader.set_workspace_root(root);
            self.root_known = true;
        }
        if !search_dirs.is_empty() {
            self.extra_search_dirs = search_dirs;
        }
        self.apply_search_dirs();
    }

    /// Open (or re-open) a document with client-provided text. The first
    /// opened document pins the workspace root when `initialize` did not.
    pub fn open_document(&mut self, uri: Url, text: String) {
        if !self.root_known {
            if let Some(parent) = path_from_uri(&uri).and_then(|p| p.parent().map(PathBuf::from)) {
                info!(root = %parent.display(), "workspace root from first document");
                self.loader.set_workspace_root(parent);
                self.root_known = true;
                self.apply_search_dirs();
            }
        }
        self.loader.load(uri, Some(text));
    }

    /// Full-text replacement on change: re-parse, re-resolve, swap the
    /// cache entry. Readers of the previous snapshot are unaffected.
    pub fn change_document(&mut self, uri: Url, text: String) {
        self.loader.load(uri, Some(text));
    }

    fn document(&mut self, uri: &Url) -> Option<Arc<Document>> {
        self.loader.get(uri)
    }

    pub fn definition(&mut self, uri: &Url, pos: Position) -> Vec<Location> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        DefinitionProvider::new(&mut self.loader).serve(&doc, pos)
    }

    pub fn references(&mut self, uri: &Url, pos: Position) -> Vec<Location> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        ReferencesProvider::new(&mut self.loader).serve(&doc, pos)
    }

    pub fn document_symbols(&mut self, uri: &Url) -> Vec<DocumentSymbol> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        DocumentSymbolProvider::new().serve(&doc)
    }

    pub fn document_highlights(&mut self, uri: &Url, pos: Position) -> Vec<DocumentHighlight> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        DocumentHighlightProvider::serve(&doc, pos)
    }

    pub fn inlay_hints(&mut self, uri: &Url, range: Range) -> Vec<InlayHint> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        InlayHintProvider::new()
            .serve(&doc)
            .into_iter()
            .filter(|hint| {
                range_contains(&range, &Range::new(hint.position, hint.position))
            })
            .collect()
    }

    pub fn folding_ranges(&mut self, uri: &Url) -> Vec<FoldingRange> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        FoldingRangeProvider::serve(&doc)
    }

    pub fn prepare_rename(&mut self, uri: &Url, pos: Position) -> Option<(Range, String)> {
        let doc = self.document(uri)?;
        RenameProvider::prepare(&doc, pos)
    }

    pub fn rename(&mut self, uri: &Url, pos: Position, new_name: &str) -> Option<WorkspaceEdit> {
        let doc = self.document(uri)?;
        RenameProvider::serve(&doc, pos, new_name)
    }

    pub fn document_links(&mut self, uri: &Url) -> Vec<DocumentLink> {
        let Some(doc) = self.document(uri) else {
            return Vec::new();
        };
        DocumentLinkProvider::new(&self.loader).serve(&doc)
    }

    pub fn hover(&mut self, uri: &Url, pos: Position) -> Option<Hover> {
        let doc = self.document(uri)?;
        HoverProvider::new(&self.loader).serve(&doc, pos)
    }
}
