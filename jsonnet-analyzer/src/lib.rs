//! Semantic analysis for the Jsonnet configuration language.
//!
//! The pipeline: source text → tree-sitter CST ([`parse::parse_jsonnet`])
//! → arena AST ([`ast::Document`]) → scope resolution
//! ([`resolver::ScopeResolver`]) → cached per URI in a
//! [`loader::DocumentLoader`]. Providers under [`providers`] answer editor
//! queries (definition, references, symbols, highlights, inlay hints,
//! folding, rename, links, hover) by walking the resolved model.

pub mod ast;
pub mod errors;
pub mod location;
pub mod loader;
pub mod parse;
pub mod providers;
pub mod resolver;
pub mod scope;

pub use lsp_types;

pub use ast::{AnalysisPhase, Document, NodeId, NodeKind};
pub use errors::{Error, Result};
pub use loader::{DocumentLoader, FsSourceStore, MemorySourceStore, SourceStore};
pub use resolver::ScopeResolver;
