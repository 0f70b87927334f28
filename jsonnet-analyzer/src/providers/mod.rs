//! Query providers answering editor requests over resolved documents.
//!
//! Providers never fail: every analysis miss degrades to an empty result so
//! a half-broken buffer still answers what it can.

pub mod definition;
pub mod folding;
pub mod highlight;
pub mod hover;
pub mod inlay;
pub mod links;
pub mod references;
pub mod rename;
pub mod symbols;

pub use definition::DefinitionProvider;
pub use folding::FoldingRangeProvider;
pub use highlight::DocumentHighlightProvider;
pub use hover::HoverProvider;
pub use inlay::InlayHintProvider;
pub use links::DocumentLinkProvider;
pub use references::ReferencesProvider;
pub use rename::RenameProvider;
pub use symbols::DocumentSymbolProvider;
