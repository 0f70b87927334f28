//! Single entry point to the off-the-shelf Jsonnet grammar.
//!
//! Everything downstream of this module works on the CST shape produced by
//! `tree-sitter-jsonnet`; no other module talks to the parser directly.

use tree_sitter::{Parser, Tree};

use crate::errors::{Error, Result};

/// Parse Jsonnet source text into a tree-sitter CST.
///
/// Tree-sitter recovers from syntax errors on its own (`ERROR` nodes appear
/// inside the tree), so this only fails when the grammar cannot be loaded or
/// the parser gives up wholesale (timeout/cancellation, which we never set).
pub fn parse_jsonnet(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_jsonnet::LANGUAGE.into())
        .map_err(|_| Error::TreeSitterLanguage)?;
    parser.parse(source, None).ok_or(Error::TreeSitterParse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trivial_document() {
        let tree = parse_jsonnet("local x = 1; x").expect("grammar loads");
        assert_eq!(tree.root_node().kind(), "source_file");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn broken_source_still_yields_a_tree() {
        let tree = parse_jsonnet("local x = ; x +").expect("grammar loads");
        assert!(tree.root_node().has_error());
    }
}
