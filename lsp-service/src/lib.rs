//! LSP surface for the Jsonnet analyzer: a synchronous [`WorkspaceService`]
//! façade plus the tower-lsp stdio adapter.

mod backend;
mod service;

pub use backend::{run_stdio, Backend};
pub use service::WorkspaceService;
