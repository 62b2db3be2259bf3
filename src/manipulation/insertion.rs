//! Whitespace policies for inserting into child lists.
//!
//! Statement lists (the file's top level or a braced block) reuse the
//! whitespace already separating their entries, falling back to a newline
//! and the list's indentation. Inline bracketed lists (arguments, array
//! elements, ...) separate entries with `", "`.

use crate::errors::{MorphError, Result};
use crate::manipulation::{apply_edit, EditDescriptor, InsertedRange};
use crate::node::text::line_indentation;
use crate::node::Node;

/// Planned edit: the node to edit, where, how much to replace, and the text.
struct Plan {
    parent: Node,
    pos: usize,
    replacing_len: usize,
    text: String,
}

impl Plan {
    fn apply(self) -> Result<InsertedRange> {
        apply_edit(EditDescriptor::replace(
            &self.parent,
            self.pos,
            self.replacing_len,
            self.text,
        ))
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(MorphError::OutOfRange {
            what: "insert index",
            pos: index,
            min: 0,
            max: len,
        });
    }
    Ok(())
}

/// Insert `statements` at `index` of a statement container: the source file
/// root or a node whose children are delimited by braces.
pub(crate) fn insert_statements(
    container: &Node,
    index: usize,
    statements: &[&str],
) -> Result<Vec<Node>> {
    if statements.is_empty() {
        return Ok(Vec::new());
    }
    let list = container.child_syntax_list_or_err()?;
    let existing = list.structural_children()?;
    check_index(index, existing.len())?;

    let settings = container.project().settings().manipulation;
    let newline = settings.newline.as_str();
    let is_root = container.is_source_file()?;
    let indentation = match existing.first() {
        Some(first) => first.indentation_text()?,
        None if is_root => String::new(),
        None => container.child_indentation_text()?,
    };
    let separator = match sibling_gap(&list, &existing, index)? {
        Some(gap) => gap,
        None => format!("{newline}{indentation}"),
    };
    let joined = statements.join(&separator);

    let plan = if index > 0 {
        let previous = &existing[index - 1];
        Plan {
            parent: list,
            pos: previous.end()?,
            replacing_len: 0,
            text: format!("{separator}{joined}"),
        }
    } else if let Some(first) = existing.first() {
        Plan {
            parent: list,
            pos: first.start()?,
            replacing_len: 0,
            text: format!("{joined}{separator}"),
        }
    } else if is_root {
        let text = container.full_text()?;
        let end = container.end()?;
        let lead = if text.is_empty() || text.ends_with('\n') {
            ""
        } else {
            newline
        };
        Plan {
            parent: container.clone(),
            pos: end,
            replacing_len: 0,
            text: format!("{lead}{joined}{newline}"),
        }
    } else {
        empty_block_plan(container, &list, &separator, &joined, newline)?
    };

    let inserted = plan.apply()?;
    Ok(inserted.named())
}

/// Whitespace between the existing statements around `index`, or the
/// nearest pair when inserting at either end. `None` with fewer than two
/// statements or when a comment sits in the gap.
fn sibling_gap(list: &Node, existing: &[Node], index: usize) -> Result<Option<String>> {
    if existing.len() < 2 {
        return Ok(None);
    }
    let right = index.clamp(1, existing.len() - 1);
    let (from, to) = (existing[right - 1].end()?, existing[right].start()?);
    let gap = list.with_tree(|tree, _| tree.text()[from..to].to_string())?;
    Ok(gap.chars().all(char::is_whitespace).then_some(gap))
}

/// Replace whatever whitespace sits between the braces of an empty block.
fn empty_block_plan(
    container: &Node,
    list: &Node,
    separator: &str,
    joined: &str,
    newline: &str,
) -> Result<Plan> {
    let children = container.children()?;
    let list_index = list.child_index()?;
    let (Some(open), Some(close)) = (
        list_index.checked_sub(1).and_then(|i| children.get(i)),
        children.get(list_index + 1),
    ) else {
        return Err(MorphError::NotImplemented(
            "expected brace tokens around an empty statement list".to_string(),
        ));
    };
    let from = open.end()?;
    let to = close.start()?;
    let closing_indent = container.with_tree(|tree, index| {
        line_indentation(tree.text(), tree.node(index).start).to_string()
    })?;
    Ok(Plan {
        parent: container.clone(),
        pos: from,
        replacing_len: to - from,
        text: format!("{separator}{joined}{newline}{closing_indent}"),
    })
}

/// Insert `items` at `index` of the node's bracketed list.
pub(crate) fn insert_list_items(node: &Node, index: usize, items: &[&str]) -> Result<Vec<Node>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let list = node.child_syntax_list_or_err()?;
    let existing = list.structural_children()?;
    check_index(index, existing.len())?;
    let joined = items.join(", ");

    let plan = if index > 0 {
        Plan {
            pos: existing[index - 1].end()?,
            text: format!(", {joined}"),
            parent: list,
            replacing_len: 0,
        }
    } else if let Some(first) = existing.first() {
        Plan {
            pos: first.start()?,
            text: format!("{joined}, "),
            parent: list,
            replacing_len: 0,
        }
    } else {
        Plan {
            pos: list.start()?,
            text: joined,
            parent: list,
            replacing_len: 0,
        }
    };
    let inserted = plan.apply()?;
    Ok(inserted.named())
}
