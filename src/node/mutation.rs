//! Mutation helpers built on [`apply_edit`](crate::manipulation::apply_edit).

use crate::errors::{MorphError, Result};
use crate::manipulation::{apply_edit, insertion, EditDescriptor};
use crate::node::text::line_start;
use crate::node::Node;
use crate::ts::{NodeIndex, ParseTree};

/// Smallest ancestor of `index` (starting at its arena parent) whose full
/// span contains `[from, to]`.
fn containing_ancestor(tree: &ParseTree, index: NodeIndex, from: usize, to: usize) -> NodeIndex {
    let mut current = tree.node(index).parent.unwrap_or(tree.root());
    loop {
        let node = tree.node(current);
        if node.pos <= from && to <= node.end {
            return current;
        }
        match node.parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

/// Span removed by [`Node::remove`].
fn removal_span(tree: &ParseTree, index: NodeIndex) -> (usize, usize) {
    let node = tree.node(index);
    let text = tree.text();
    let siblings = node.parent.map(|p| tree.children(p)).unwrap_or_default();
    let position = siblings.iter().position(|&s| s == index);

    if let Some(position) = position {
        let next = siblings.get(position + 1).map(|&s| tree.node(s));
        let previous = position
            .checked_sub(1)
            .and_then(|p| siblings.get(p))
            .map(|&s| tree.node(s));
        if let Some(comma) = next.filter(|n| n.kind == ",") {
            let to = siblings
                .get(position + 2)
                .map_or(comma.end, |&s| tree.node(s).start);
            return (node.start, to);
        }
        if let Some(comma) = previous.filter(|n| n.kind == ",") {
            return (comma.pos, node.end);
        }
    }

    let line = line_start(text, node.start);
    let rest = &text[node.end..];
    let line_end = rest.find('\n').map_or(text.len(), |i| node.end + i + 1);
    let starts_line = text[line..node.start].trim().is_empty();
    let ends_line = text[node.end..line_end].trim().is_empty();
    if starts_line && ends_line && (line > 0 || line_end < text.len()) {
        return (line, line_end);
    }
    (node.pos, node.end)
}

impl Node {
    /// Replace this node's text. Returns the node now at the same child
    /// index of the same parent.
    pub fn replace_with_text(&self, text: &str) -> Result<Node> {
        let (parent, child_index, start, width) = self.with_tree(|tree, index| {
            let node = tree.node(index);
            (
                node.parent,
                tree.child_index(index),
                node.start,
                node.width(),
            )
        })?;
        let (Some(parent), Some(child_index)) = (parent, child_index) else {
            let file = self.source_file()?;
            file.replace_text(start, start + width, text)?;
            return Ok(file.node().clone());
        };
        let parent = self.wrap(parent)?;
        apply_edit(EditDescriptor::replace(&parent, start, width, text))?;
        parent.child_at_index_or_err(child_index)
    }

    /// Remove the node from the text. Separating commas go with it, and a
    /// node alone on its line takes the line with it.
    pub fn remove(&self) -> Result<()> {
        let (container, from, to) = self.with_tree(|tree, index| {
            let (from, to) = removal_span(tree, index);
            (containing_ancestor(tree, index, from, to), from, to)
        })?;
        if self.is_source_file()? {
            return Err(MorphError::InvalidOperation(
                "cannot remove a source file's root node".to_string(),
            ));
        }
        let container = self.wrap(container)?;
        apply_edit(EditDescriptor::replace(&container, from, to - from, ""))?;
        self.forget();
        Ok(())
    }

    /// Insert whitespace before the node's first token.
    pub fn prepend_whitespace(&self, whitespace: &str) -> Result<()> {
        let start = self.start()?;
        self.insert_whitespace_at(start, whitespace)
    }

    /// Insert whitespace after the node's last token.
    pub fn append_whitespace(&self, whitespace: &str) -> Result<()> {
        let end = self.end()?;
        self.insert_whitespace_at(end, whitespace)
    }

    fn insert_whitespace_at(&self, pos: usize, whitespace: &str) -> Result<()> {
        if !whitespace.trim().is_empty() {
            return Err(MorphError::NonWhitespace {
                text: whitespace.to_string(),
            });
        }
        if whitespace.is_empty() {
            return Ok(());
        }
        let container = self.with_tree(|tree, index| containing_ancestor(tree, index, pos, pos))?;
        let container = self.wrap(container)?;
        apply_edit(EditDescriptor::insert(&container, pos, whitespace))?;
        Ok(())
    }

    /// Insert comma-separated items into this node's bracketed list.
    pub fn insert_list_items(&self, index: usize, items: &[&str]) -> Result<Vec<Node>> {
        insertion::insert_list_items(self, index, items)
    }

    pub fn add_list_items(&self, items: &[&str]) -> Result<Vec<Node>> {
        let count = self.child_syntax_list_or_err()?.structural_children()?.len();
        self.insert_list_items(count, items)
    }
}
