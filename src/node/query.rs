//! Structural queries scoped to a node: tree-sitter S-expression queries and
//! ast-grep metavariable patterns, with results returned as wrappers.

use crate::errors::{MorphError, Result};
use crate::node::navigation::token_descendants;
use crate::node::Node;
use crate::sg::{AstGrepError, PatternMatcher};
use crate::ts::{NodeIndex, ParseTree, QueryEngine};
use std::collections::HashMap;

/// A pattern match inside a node.
#[derive(Debug, Clone)]
pub struct PatternHit {
    pub node: Node,
    /// Metavariable name -> captured text.
    pub captures: HashMap<String, String>,
}

impl PatternHit {
    pub fn capture(&self, name: &str) -> Result<&str> {
        self.captures
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| {
                AstGrepError::MetavarNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }
}

fn node_for_span(
    tree: &ParseTree,
    within: NodeIndex,
    start: usize,
    end: usize,
    kind: &str,
) -> Option<NodeIndex> {
    std::iter::once(within)
        .chain(token_descendants(tree, within))
        .find(|&n| {
            let node = tree.node(n);
            node.start == start && node.end == end && node.kind == kind
        })
}

impl Node {
    /// Nodes captured as `@capture` by a tree-sitter query, restricted to
    /// this node's subtree.
    pub fn query(&self, query: &str, capture: &str) -> Result<Vec<Node>> {
        let language = self.language()?;
        let engine = QueryEngine::new(language, query)?;
        let indices = self.with_tree(|tree, index| engine.captures(tree, index, capture))??;
        self.wrap_all(&indices)
    }

    /// Every match of a query, as capture name -> nodes.
    pub fn query_matches(&self, query: &str) -> Result<Vec<HashMap<String, Vec<Node>>>> {
        let language = self.language()?;
        let engine = QueryEngine::new(language, query)?;
        let matches = self.with_tree(|tree, index| engine.matches(tree, index))?;
        matches
            .into_iter()
            .map(|m| {
                m.captures
                    .into_iter()
                    .map(|(name, nodes)| Ok((name, self.wrap_all(&nodes)?)))
                    .collect()
            })
            .collect()
    }

    /// Matches of an ast-grep pattern such as `$OBJ.clone()` inside this node.
    pub fn find_pattern(&self, pattern: &str) -> Result<Vec<PatternHit>> {
        let (text, language, start, end) = self.with_tree(|tree, index| {
            let node = tree.node(index);
            (tree.text().to_string(), tree.language(), node.start, node.end)
        })?;
        let matcher = PatternMatcher::new(&text, language);
        let found: Vec<_> = matcher
            .find_all(pattern)
            .into_iter()
            .filter(|m| m.byte_start >= start && m.byte_end <= end)
            .collect();

        let mut hits = Vec::with_capacity(found.len());
        for m in found {
            let index = self.with_tree(|tree, index| {
                node_for_span(tree, index, m.byte_start, m.byte_end, &m.kind)
            })?;
            let Some(index) = index else {
                return Err(MorphError::NotImplemented(format!(
                    "pattern match of kind `{}` at {}..{} has no node in the tree",
                    m.kind, m.byte_start, m.byte_end
                )));
            };
            hits.push(PatternHit {
                node: self.wrap(index)?,
                captures: m.captures,
            });
        }
        Ok(hits)
    }

    /// The single match of `pattern` inside this node.
    pub fn find_pattern_unique(&self, pattern: &str) -> Result<PatternHit> {
        let mut hits = self.find_pattern(pattern)?;
        match hits.len() {
            0 => Err(AstGrepError::NoMatch.into()),
            1 => Ok(hits.remove(0)),
            count => Err(AstGrepError::AmbiguousMatch { count }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::MorphError;
    use crate::sg::AstGrepError;
    use crate::Project;

    const SOURCE: &str = "fn a() { x.clone(); }\nfn b() { y.clone(); }\n";

    #[test]
    fn query_is_scoped_to_the_node() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", SOURCE).unwrap();
        let names = file
            .node()
            .query("(function_item name: (identifier) @name)", "name")
            .unwrap();
        assert_eq!(names.len(), 2);

        let second = file.node().descendants_of_kind("function_item").unwrap()[1].clone();
        let inner = second.query("(identifier) @id", "id").unwrap();
        let texts: Vec<_> = inner.iter().map(|n| n.text().unwrap()).collect();
        assert_eq!(texts, vec!["b", "y"]);
    }

    #[test]
    fn query_matches_group_captures() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", SOURCE).unwrap();
        let matches = file
            .node()
            .query_matches("(function_item name: (identifier) @name body: (block) @body)")
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["name"][0].text().unwrap(), "a");
        assert_eq!(matches[0]["body"][0].kind().unwrap(), "block");
    }

    #[test]
    fn patterns_map_to_wrappers() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", SOURCE).unwrap();
        let hits = file.node().find_pattern("$E.clone()").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].capture("E").unwrap(), "y");
        assert!(hits[1].capture("F").is_err());
        assert_eq!(hits[1].node.kind().unwrap(), "call_expression");

        let first = file.node().descendants_of_kind("function_item").unwrap()[0].clone();
        let hit = first.find_pattern_unique("$E.clone()").unwrap();
        assert_eq!(hit.node, hits[0].node);

        let err = file.node().find_pattern_unique("$E.clone()").unwrap_err();
        assert!(matches!(
            err,
            MorphError::Pattern(AstGrepError::AmbiguousMatch { count: 2 })
        ));
    }

    #[test]
    fn bad_queries_are_parse_errors() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", SOURCE).unwrap();
        let err = file.node().query("(function_item", "x").unwrap_err();
        assert!(matches!(err, MorphError::Parse(_)));
    }
}
