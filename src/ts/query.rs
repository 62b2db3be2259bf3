use crate::ts::errors::TreeSitterError;
use crate::ts::tree::{NodeIndex, ParseTree};
use ast_grep_language::{LanguageExt, SupportLang};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query, with captures resolved to arena nodes.
#[derive(Debug, Clone, Default)]
pub struct QueryMatch {
    /// capture_name -> captured nodes in document order
    pub captures: HashMap<String, Vec<NodeIndex>>,
}

/// Compiled tree-sitter query for one grammar.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a query in tree-sitter's S-expression syntax:
    ///
    /// ```text
    /// (function_item
    ///   name: (identifier) @func_name
    ///   body: (block) @body)
    /// ```
    pub fn new(language: SupportLang, query_str: &str) -> Result<Self, TreeSitterError> {
        let ts_lang = language.get_ts_language();
        let query = Query::new(&ts_lang, query_str).map_err(|e| TreeSitterError::InvalidQuery {
            message: e.to_string(),
        })?;
        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    /// All matches whose captures lie inside `within`.
    pub fn matches(&self, tree: &ParseTree, within: NodeIndex) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let root = tree.ts_tree().root_node();
        let mut matches = cursor.matches(&self.query, root, tree.text().as_bytes());

        let mut results = Vec::new();
        while let Some(m) = matches.next() {
            let mut result = QueryMatch::default();
            let mut inside = true;
            for capture in m.captures {
                let Some(index) = tree.from_ts_node(capture.node) else {
                    continue;
                };
                if !tree.is_ancestor_or_self(within, index) {
                    inside = false;
                    break;
                }
                let name = &self.capture_names[capture.index as usize];
                result.captures.entry(name.clone()).or_default().push(index);
            }
            if inside && !result.captures.is_empty() {
                results.push(result);
            }
        }
        results
    }

    /// Nodes bound to `capture` across all matches inside `within`, deduplicated
    /// and in document order.
    pub fn captures(
        &self,
        tree: &ParseTree,
        within: NodeIndex,
        capture: &str,
    ) -> Result<Vec<NodeIndex>, TreeSitterError> {
        if !self.capture_names.iter().any(|n| n == capture) {
            return Err(TreeSitterError::CaptureNotFound {
                name: capture.to_string(),
            });
        }
        let mut nodes: Vec<NodeIndex> = self
            .matches(tree, within)
            .into_iter()
            .filter_map(|mut m| m.captures.remove(capture))
            .flatten()
            .collect();
        nodes.sort_by_key(|&n| (tree.node(n).start, n));
        nodes.dedup();
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::LanguageParser;

    #[test]
    fn find_function_names() {
        let mut parser = LanguageParser::new(SupportLang::Rust).unwrap();
        let tree = parser
            .parse("fn helper() {}\n\nfn main() {\n    helper();\n}\n")
            .unwrap();
        let engine =
            QueryEngine::new(SupportLang::Rust, "(function_item name: (identifier) @name)")
                .unwrap();

        let names: Vec<_> = engine
            .captures(&tree, tree.root(), "name")
            .unwrap()
            .into_iter()
            .map(|n| tree.node_text(n).to_string())
            .collect();
        assert_eq!(names, vec!["helper", "main"]);
    }

    #[test]
    fn unknown_capture_is_an_error() {
        let mut parser = LanguageParser::new(SupportLang::Rust).unwrap();
        let tree = parser.parse("fn main() {}").unwrap();
        let engine = QueryEngine::new(SupportLang::Rust, "(identifier) @id").unwrap();

        let result = engine.captures(&tree, tree.root(), "missing");
        assert!(matches!(result, Err(TreeSitterError::CaptureNotFound { .. })));
    }

    #[test]
    fn invalid_query_is_rejected() {
        let result = QueryEngine::new(SupportLang::Rust, "(function_item");
        assert!(matches!(result, Err(TreeSitterError::InvalidQuery { .. })));
    }
}
