//! tower-lsp adapter: maps protocol requests onto the synchronous
//! [`WorkspaceService`]. All analysis happens under one lock; handlers are
//! async only at the transport boundary and never await while holding it.

use std::path::PathBuf;
use std::sync::Mutex;

use lsp_types::{
    DidChangeTextDocumentParams, DidOpenTextDocumentParams, DocumentHighlight,
    DocumentHighlightParams, DocumentLink, DocumentLinkOptions, DocumentLinkParams,
    DocumentSymbolParams, DocumentSymbolResponse, FoldingRange, FoldingRangeParams,
    FoldingRangeProviderCapability, GotoDefinitionParams, GotoDefinitionResponse, Hover,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    InlayHint, InlayHintParams, Location, OneOf, PrepareRenameResponse, ReferenceParams,
    RenameOptions, RenameParams, ServerCapabilities, ServerInfo, TextDocumentPositionParams,
    TextDocumentSyncCapability, TextDocumentSyncKind, WorkDoneProgressOptions, WorkspaceEdit,
};
use tower_lsp::jsonrpc::Result;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::debug;

use crate::service::WorkspaceService;

pub struct Backend {
    client: Client,
    service: Mutex<WorkspaceService>,
}

impl Backend {
    pub fn new(client: Client, service: WorkspaceService) -> Self {
        Self {
            client,
            service: Mutex::new(service),
        }
    }

    fn with_service<T>(&self, f: impl FnOnce(&mut WorkspaceService) -> T) -> T {
        let mut service = self.service.lock().expect("service lock poisoned");
        f(&mut service)
    }
}

fn capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        inlay_hint_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        rename_provider: Some(OneOf::Right(RenameOptions {
            prepare_provider: Some(true),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        })),
        document_link_provider: Some(DocumentLinkOptions {
            resolve_provider: Some(false),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        ..ServerCapabilities::default()
    }
}

/// `initializationOptions`: `{ "searchPaths": ["vendor", "lib"] }`,
/// resolved against the workspace root by the loader.
fn search_dirs_from_options(options: Option<&serde_json::Value>) -> Vec<PathBuf> {
    options
        .and_then(|v| v.get("searchPaths"))
        .and_then(|v| v.as_array())
        .map(|paths| {
            paths
                .iter()
                .filter_map(|p| p.as_str())
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let search_dirs = search_dirs_from_options(params.initialization_options.as_ref());
        let root_uri = params.root_uri;

        self.with_service(|s| s.initialize(root_uri, search_dirs));

        Ok(InitializeResult {
            capabilities: capabilities(),
            server_info: Some(ServerInfo {
                name: "jsonnet-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(lsp_types::MessageType::INFO, "jsonnet-ls ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!(uri = %doc.uri, "didOpen");
        self.with_service(|s| s.open_document(doc.uri, doc.text));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the complete text.
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().last() {
            debug!(uri = %uri, "didChange");
            self.with_service(|s| s.change_document(uri, change.text));
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let pos = params.text_document_position_params;
        let locations =
            self.with_service(|s| s.definition(&pos.text_document.uri, pos.position));
        Ok(non_empty(locations).map(GotoDefinitionResponse::Array))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let pos = params.text_document_position;
        let locations =
            self.with_service(|s| s.references(&pos.text_document.uri, pos.position));
        Ok(non_empty(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let symbols = self.with_service(|s| s.document_symbols(&params.text_document.uri));
        Ok(non_empty(symbols).map(DocumentSymbolResponse::Nested))
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let pos = params.text_document_position_params;
        let highlights =
            self.with_service(|s| s.document_highlights(&pos.text_document.uri, pos.position));
        Ok(non_empty(highlights))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let hints =
            self.with_service(|s| s.inlay_hints(&params.text_document.uri, params.range));
        Ok(non_empty(hints))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let ranges = self.with_service(|s| s.folding_ranges(&params.text_document.uri));
        Ok(non_empty(ranges))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let prepared =
            self.with_service(|s| s.prepare_rename(&params.text_document.uri, params.position));
        Ok(prepared.map(|(range, placeholder)| PrepareRenameResponse::RangeWithPlaceholder {
            range,
            placeholder,
        }))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let pos = params.text_document_position;
        let edit = self.with_service(|s| {
            s.rename(&pos.text_document.uri, pos.position, &params.new_name)
        });
        Ok(edit)
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let links = self.with_service(|s| s.document_links(&params.text_document.uri));
        Ok(non_empty(links))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let pos = params.text_document_position_params;
        Ok(self.with_service(|s| s.hover(&pos.text_document.uri, pos.position)))
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Run the language service over stdio until the client disconnects.
pub async fn run_stdio(service: WorkspaceService) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (lsp, socket) = LspService::new(move |client| Backend::new(client, service));
    Server::new(stdin, stdout, socket).serve(lsp).await;
}
