//! Parent, child, sibling, ancestor and descendant navigation.
//!
//! Plain methods return `Ok(None)` or an empty vector when nothing matches;
//! the `_or_err` forms turn that into [`MorphError::NotFound`].

use crate::errors::{MorphError, Result};
use crate::node::Node;
use crate::ts::{is_token_kind, NodeIndex, ParseTree, SYNTAX_LIST};

/// Named descendants in document order, with syntax lists flattened.
pub(crate) fn structural_descendants(tree: &ParseTree, index: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeIndex> = tree.structural_children(index).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(tree.structural_children(node).into_iter().rev());
    }
    out
}

/// Every descendant, tokens and syntax lists included, in document order.
pub(crate) fn token_descendants(tree: &ParseTree, index: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeIndex> = tree.children(index).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(tree.children(node).iter().rev().copied());
    }
    out
}

fn descendants_of_kind(tree: &ParseTree, index: NodeIndex, kind: &str) -> Vec<NodeIndex> {
    let needs_tokens = kind == SYNTAX_LIST || is_token_kind(tree.language(), kind);
    let candidates = if needs_tokens {
        token_descendants(tree, index)
    } else {
        structural_descendants(tree, index)
    };
    candidates
        .into_iter()
        .filter(|&n| tree.node(n).kind == kind)
        .collect()
}

/// The sibling list `index` belongs to and its position in it.
fn siblings(tree: &ParseTree, index: NodeIndex) -> Option<(Vec<NodeIndex>, usize)> {
    let node = tree.node(index);
    if node.named && !node.is_syntax_list() {
        let parent = tree.semantic_parent(index)?;
        let list = tree.structural_children(parent);
        let position = list.iter().position(|&n| n == index)?;
        return Some((list, position));
    }
    let parent = node.parent?;
    let list = tree.children(parent).to_vec();
    let position = list.iter().position(|&n| n == index)?;
    Some((list, position))
}

impl Node {
    fn nav(
        &self,
        f: impl FnOnce(&ParseTree, NodeIndex) -> Option<NodeIndex>,
    ) -> Result<Option<Node>> {
        let index = self.with_tree(f)?;
        self.wrap_opt(index)
    }

    fn nav_all(&self, f: impl FnOnce(&ParseTree, NodeIndex) -> Vec<NodeIndex>) -> Result<Vec<Node>> {
        let indices = self.with_tree(f)?;
        self.wrap_all(&indices)
    }

    fn first_matching(
        &self,
        candidates: Vec<Node>,
        mut predicate: impl FnMut(&Node) -> bool,
    ) -> Option<Node> {
        candidates.into_iter().find(|n| predicate(n))
    }

    // -- parents and ancestors

    /// Grammar parent; syntax lists are skipped.
    pub fn parent(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| tree.semantic_parent(index))
    }

    pub fn parent_or_err(&self) -> Result<Node> {
        self.parent()?
            .ok_or_else(|| MorphError::not_found("parent"))
    }

    pub fn parent_syntax_list(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| tree.parent_syntax_list(index))
    }

    pub fn parent_syntax_list_or_err(&self) -> Result<Node> {
        self.parent_syntax_list()?
            .ok_or_else(|| MorphError::not_found("parent syntax list"))
    }

    /// Ancestors from the parent up to the source file.
    pub fn ancestors(&self) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| {
            let mut out = Vec::new();
            let mut current = tree.semantic_parent(index);
            while let Some(parent) = current {
                out.push(parent);
                current = tree.semantic_parent(parent);
            }
            out
        })
    }

    pub fn first_ancestor(&self, predicate: impl FnMut(&Node) -> bool) -> Result<Option<Node>> {
        Ok(self.first_matching(self.ancestors()?, predicate))
    }

    pub fn first_ancestor_of_kind(&self, kind: &str) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let mut current = tree.semantic_parent(index);
            while let Some(parent) = current {
                if tree.node(parent).kind == kind {
                    return Some(parent);
                }
                current = tree.semantic_parent(parent);
            }
            None
        })
    }

    pub fn first_ancestor_of_kind_or_err(&self, kind: &str) -> Result<Node> {
        self.first_ancestor_of_kind(kind)?
            .ok_or_else(|| self.kind_not_found("ancestor", kind))
    }

    /// Climb while `predicate` holds for the parent; returns the last
    /// parent that satisfied it.
    pub fn parent_while(&self, mut predicate: impl FnMut(&Node) -> bool) -> Result<Option<Node>> {
        let mut found = None;
        let mut current = self.parent()?;
        while let Some(parent) = current {
            if !predicate(&parent) {
                break;
            }
            current = parent.parent()?;
            found = Some(parent);
        }
        Ok(found)
    }

    // -- children

    /// Every child, including tokens and syntax lists.
    pub fn children(&self) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| tree.children(index).to_vec())
    }

    /// Named children with syntax lists flattened away.
    pub fn structural_children(&self) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| tree.structural_children(index))
    }

    pub fn child_count(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.children(index).len())
    }

    pub fn child_at_index(&self, index: usize) -> Result<Option<Node>> {
        self.nav(|tree, node| tree.children(node).get(index).copied())
    }

    pub fn child_at_index_or_err(&self, index: usize) -> Result<Node> {
        let count = self.child_count()?;
        self.child_at_index(index)?.ok_or(MorphError::OutOfRange {
            what: "child index",
            pos: index,
            min: 0,
            max: count.saturating_sub(1),
        })
    }

    pub fn first_child(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| tree.children(index).first().copied())
    }

    pub fn first_child_or_err(&self) -> Result<Node> {
        self.first_child()?
            .ok_or_else(|| MorphError::not_found("first child"))
    }

    pub fn last_child(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| tree.children(index).last().copied())
    }

    pub fn last_child_or_err(&self) -> Result<Node> {
        self.last_child()?
            .ok_or_else(|| MorphError::not_found("last child"))
    }

    pub fn first_child_by(&self, predicate: impl FnMut(&Node) -> bool) -> Result<Option<Node>> {
        Ok(self.first_matching(self.children()?, predicate))
    }

    pub fn children_of_kind(&self, kind: &str) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| {
            let needs_tokens = kind == SYNTAX_LIST || is_token_kind(tree.language(), kind);
            let candidates = if needs_tokens {
                tree.children(index).to_vec()
            } else {
                tree.structural_children(index)
            };
            candidates
                .into_iter()
                .filter(|&n| tree.node(n).kind == kind)
                .collect()
        })
    }

    pub fn first_child_of_kind(&self, kind: &str) -> Result<Option<Node>> {
        Ok(self.children_of_kind(kind)?.into_iter().next())
    }

    pub fn first_child_of_kind_or_err(&self, kind: &str) -> Result<Node> {
        self.first_child_of_kind(kind)?
            .ok_or_else(|| self.kind_not_found("child", kind))
    }

    /// Child occupying the grammar field `field`.
    pub fn child_by_field(&self, field: &str) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let mut stack: Vec<NodeIndex> = tree.children(index).to_vec();
            stack.reverse();
            while let Some(child) = stack.pop() {
                let node = tree.node(child);
                if node.field == Some(field) {
                    return Some(child);
                }
                if node.is_syntax_list() {
                    stack.extend(tree.children(child).iter().rev().copied());
                }
            }
            None
        })
    }

    pub fn child_by_field_or_err(&self, field: &str) -> Result<Node> {
        self.child_by_field(field)?
            .ok_or_else(|| MorphError::not_found(format!("child in field `{field}`")))
    }

    /// The syntax list directly below this node, if any.
    pub fn child_syntax_list(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            tree.children(index)
                .iter()
                .copied()
                .find(|&c| tree.node(c).is_syntax_list())
        })
    }

    pub fn child_syntax_list_or_err(&self) -> Result<Node> {
        self.child_syntax_list()?
            .ok_or_else(|| MorphError::NotImplemented("expected a child syntax list".to_string()))
    }

    /// Position among the token-accurate children of the parent syntax list
    /// or parent.
    pub fn child_index(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.child_index(index))?
            .ok_or_else(|| MorphError::InvalidOperation("the source file has no child index".to_string()))
    }

    /// Token-level child whose full span contains `pos`.
    pub fn child_at_pos(&self, pos: usize) -> Result<Option<Node>> {
        self.nav(|tree, index| tree.child_at_pos(index, pos))
    }

    // -- siblings

    pub fn next_sibling(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let (list, position) = siblings(tree, index)?;
            list.get(position + 1).copied()
        })
    }

    pub fn next_sibling_or_err(&self) -> Result<Node> {
        self.next_sibling()?
            .ok_or_else(|| MorphError::not_found("next sibling"))
    }

    pub fn previous_sibling(&self) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let (list, position) = siblings(tree, index)?;
            position.checked_sub(1).and_then(|p| list.get(p).copied())
        })
    }

    pub fn previous_sibling_or_err(&self) -> Result<Node> {
        self.previous_sibling()?
            .ok_or_else(|| MorphError::not_found("previous sibling"))
    }

    pub fn next_siblings(&self) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| match siblings(tree, index) {
            Some((list, position)) => list[position + 1..].to_vec(),
            None => Vec::new(),
        })
    }

    /// Previous siblings, nearest first.
    pub fn previous_siblings(&self) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| match siblings(tree, index) {
            Some((list, position)) => list[..position].iter().rev().copied().collect(),
            None => Vec::new(),
        })
    }

    pub fn next_sibling_of_kind(&self, kind: &str) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let (list, position) = siblings(tree, index)?;
            list[position + 1..]
                .iter()
                .copied()
                .find(|&n| tree.node(n).kind == kind)
        })
    }

    pub fn next_sibling_of_kind_or_err(&self, kind: &str) -> Result<Node> {
        self.next_sibling_of_kind(kind)?
            .ok_or_else(|| self.kind_not_found("next sibling", kind))
    }

    pub fn previous_sibling_of_kind(&self, kind: &str) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let (list, position) = siblings(tree, index)?;
            list[..position]
                .iter()
                .rev()
                .copied()
                .find(|&n| tree.node(n).kind == kind)
        })
    }

    pub fn previous_sibling_of_kind_or_err(&self, kind: &str) -> Result<Node> {
        self.previous_sibling_of_kind(kind)?
            .ok_or_else(|| self.kind_not_found("previous sibling", kind))
    }

    // -- descendants

    /// Named descendants in document order.
    pub fn descendants(&self) -> Result<Vec<Node>> {
        self.nav_all(structural_descendants)
    }

    /// Descendants of `kind`. Token kinds use the token-accurate walk.
    pub fn descendants_of_kind(&self, kind: &str) -> Result<Vec<Node>> {
        self.nav_all(|tree, index| descendants_of_kind(tree, index, kind))
    }

    pub fn first_descendant_of_kind(&self, kind: &str) -> Result<Option<Node>> {
        self.nav(|tree, index| descendants_of_kind(tree, index, kind).into_iter().next())
    }

    pub fn first_descendant_of_kind_or_err(&self, kind: &str) -> Result<Node> {
        self.first_descendant_of_kind(kind)?
            .ok_or_else(|| self.kind_not_found("descendant", kind))
    }

    /// First descendant satisfying `predicate`, in document order. Stops
    /// wrapping as soon as a match is found.
    pub fn first_descendant(
        &self,
        mut predicate: impl FnMut(&Node) -> bool,
    ) -> Result<Option<Node>> {
        self.for_each_descendant(|node, _| predicate(node).then(|| node.clone()))
    }

    pub fn first_descendant_or_err(&self, predicate: impl FnMut(&Node) -> bool) -> Result<Node> {
        self.first_descendant(predicate)?
            .ok_or_else(|| MorphError::not_found("matching descendant"))
    }

    /// Deepest non-list node whose token span contains `pos`.
    pub fn descendant_at_pos(&self, pos: usize) -> Result<Option<Node>> {
        self.nav(|tree, index| {
            let node = tree.descendant_at_pos(pos)?;
            tree.is_ancestor_or_self(index, node).then_some(node)
        })
    }

    /// Node starting at `start` with token width `width`. Nodes wrapped on
    /// the way down are forgotten again; only the result is kept.
    pub fn descendant_at_start_with_width(&self, start: usize, width: usize) -> Result<Option<Node>> {
        let root = self.source_file()?.node().clone();
        self.project.run_scoped(|remember| {
            let mut found: Option<Node> = None;
            let mut next = Some(root);
            while let Some(current) = next {
                next = current.child_at_pos(start)?;
                if let Some(child) = &next {
                    if child.start()? == start && child.width()? == width {
                        found = Some(child.clone());
                    } else if found.is_some() {
                        break;
                    }
                }
            }
            if let Some(node) = &found {
                remember.remember(node)?;
            }
            Ok(found)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::MorphError;
    use crate::Project;

    #[test]
    fn parent_skips_syntax_lists() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 2;").unwrap();
        let stmts = file.node().structural_children().unwrap();
        assert_eq!(stmts.len(), 2);

        assert_eq!(stmts[0].parent().unwrap().unwrap(), *file.node());
        assert!(stmts[0].parent_syntax_list().unwrap().unwrap().is_syntax_list().unwrap());
        assert_eq!(stmts[1].child_index().unwrap(), 1);
    }

    #[test]
    fn siblings_are_structural() {
        let project = Project::new();
        let file = project
            .create_source_file("a.ts", "let a = 1;\nlet b = 2;\nlet c = 3;")
            .unwrap();
        let stmts = file.node().structural_children().unwrap();

        assert_eq!(stmts[0].next_sibling().unwrap().unwrap(), stmts[1]);
        assert_eq!(stmts[2].previous_siblings().unwrap(), vec![stmts[1].clone(), stmts[0].clone()]);
        assert!(stmts[2].next_sibling().unwrap().is_none());
        assert!(matches!(
            stmts[2].next_sibling_or_err(),
            Err(MorphError::NotFound { .. })
        ));
    }

    #[test]
    fn token_kinds_use_token_children() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", "fn f() { g(); h(); }").unwrap();
        let semis = file.node().descendants_of_kind(";").unwrap();
        assert_eq!(semis.len(), 2);

        let calls = file.node().descendants_of_kind("call_expression").unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].text().unwrap(), "h()");
    }

    #[test]
    fn fields_resolve_through_syntax_lists() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", "fn answer() -> u8 { 42 }").unwrap();
        let func = file.node().first_descendant_of_kind_or_err("function_item").unwrap();

        assert_eq!(func.child_by_field("name").unwrap().unwrap().text().unwrap(), "answer");
        assert_eq!(func.child_by_field_or_err("body").unwrap().kind().unwrap(), "block");
        assert!(func.child_by_field("nothing").unwrap().is_none());
    }

    #[test]
    fn ancestors_climb_to_the_source_file() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", "fn f() { g(); }").unwrap();
        let call = file.node().first_descendant_of_kind_or_err("call_expression").unwrap();
        let kinds: Vec<_> = call
            .ancestors()
            .unwrap()
            .iter()
            .map(|n| n.kind().unwrap())
            .collect();

        assert_eq!(kinds, vec!["expression_statement", "block", "function_item", "source_file"]);
        assert_eq!(
            call.first_ancestor_of_kind("function_item").unwrap().unwrap().kind().unwrap(),
            "function_item"
        );
    }

    #[test]
    fn start_with_width_only_keeps_the_result() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 22;").unwrap();
        let before = project.live_wrapper_count();

        let found = file
            .node()
            .descendant_at_start_with_width(19, 2)
            .unwrap()
            .unwrap();
        assert_eq!(found.text().unwrap(), "22");
        assert!(!found.was_forgotten());
        assert!(project.live_wrapper_count() > before);

        let missing = file.node().descendant_at_start_with_width(19, 5).unwrap();
        assert!(missing.is_none());
    }
}
