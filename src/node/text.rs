//! Span and text queries, trivia and comment ranges.

use crate::errors::{MorphError, Result};
use crate::node::Node;
use crate::project::FileId;
use crate::project::Project;
use crate::ts::{CommentKind, CommentSpan, NodeIndex, ParseTree};
use std::cell::Cell;
use std::rc::Rc;

/// A comment span bound to its source file. Forgotten together with the
/// wrapper that produced it.
#[derive(Clone)]
pub struct TextRange {
    project: Project,
    file: FileId,
    span: Rc<Cell<Option<(usize, usize)>>>,
    kind: CommentKind,
}

impl PartialEq for TextRange {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.span, &other.span)
    }
}

impl std::fmt::Debug for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span.get() {
            Some((pos, end)) => write!(f, "TextRange({:?} {pos}..{end})", self.kind),
            None => write!(f, "TextRange(forgotten)"),
        }
    }
}

impl TextRange {
    fn new(project: Project, file: FileId, comment: &CommentSpan) -> Self {
        Self {
            project,
            file,
            span: Rc::new(Cell::new(Some((comment.pos, comment.end)))),
            kind: comment.kind,
        }
    }

    fn span(&self) -> Result<(usize, usize)> {
        self.span
            .get()
            .ok_or(MorphError::NodeForgotten { text: None })
    }

    pub fn pos(&self) -> Result<usize> {
        Ok(self.span()?.0)
    }

    pub fn end(&self) -> Result<usize> {
        Ok(self.span()?.1)
    }

    pub fn width(&self) -> Result<usize> {
        let (pos, end) = self.span()?;
        Ok(end - pos)
    }

    pub fn kind(&self) -> CommentKind {
        self.kind
    }

    pub fn text(&self) -> Result<String> {
        let (pos, end) = self.span()?;
        let state = self.project.borrow();
        Ok(state.file(self.file)?.tree.text()[pos..end].to_string())
    }

    pub fn was_forgotten(&self) -> bool {
        self.span.get().is_none()
    }

    pub(crate) fn forget(&self) {
        self.span.set(None);
    }
}

/// Start of the line containing `pos`.
pub(crate) fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line containing `pos`.
pub(crate) fn line_indentation(text: &str, pos: usize) -> &str {
    let start = line_start(text, pos);
    let rest = &text[start..];
    let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..width]
}

fn leading_comments(tree: &ParseTree, index: NodeIndex) -> Vec<CommentSpan> {
    let node = tree.node(index);
    tree.comments_between(node.pos, node.start).copied().collect()
}

/// Comments after the node on the same line.
fn trailing_comments(tree: &ParseTree, index: NodeIndex) -> Vec<CommentSpan> {
    let node = tree.node(index);
    let text = tree.text();
    let mut out = Vec::new();
    let mut cursor = node.end;
    for comment in tree.comments().iter().filter(|c| c.pos >= node.end) {
        let gap = &text[cursor..comment.pos];
        if gap.contains('\n') || !gap.trim().is_empty() {
            break;
        }
        out.push(*comment);
        cursor = comment.end;
        if text[comment.pos..comment.end].contains('\n') {
            break;
        }
    }
    out
}

impl Node {
    /// Full start, including leading trivia.
    pub fn pos(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.node(index).pos)
    }

    /// Start of the first token.
    pub fn start(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.node(index).start)
    }

    pub fn end(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.node(index).end)
    }

    pub fn width(&self) -> Result<usize> {
        self.with_tree(|tree, index| tree.node(index).width())
    }

    pub fn full_width(&self) -> Result<usize> {
        self.with_tree(|tree, index| {
            let node = tree.node(index);
            node.end - node.pos
        })
    }

    pub fn leading_trivia_width(&self) -> Result<usize> {
        self.with_tree(|tree, index| {
            let node = tree.node(index);
            node.start - node.pos
        })
    }

    /// End of the trailing trivia on the node's last line: same-line
    /// comments and whitespace, excluding the newline.
    pub fn trailing_trivia_end(&self) -> Result<usize> {
        self.with_tree(|tree, index| {
            let end = trailing_comments(tree, index)
                .last()
                .map_or(tree.node(index).end, |c| c.end);
            let rest = &tree.text()[end..];
            end + (rest.len() - rest.trim_start_matches([' ', '\t']).len())
        })
    }

    pub fn text(&self) -> Result<String> {
        self.with_tree(|tree, index| tree.node_text(index).to_string())
    }

    /// Text including leading trivia.
    pub fn full_text(&self) -> Result<String> {
        self.with_tree(|tree, index| tree.full_text(index).to_string())
    }

    /// 1-based line of the node's start.
    pub fn start_line_number(&self) -> Result<usize> {
        self.with_tree(|tree, index| {
            let start = tree.node(index).start;
            tree.text()[..start].matches('\n').count() + 1
        })
    }

    pub fn end_line_number(&self) -> Result<usize> {
        self.with_tree(|tree, index| {
            let end = tree.node(index).end;
            tree.text()[..end].matches('\n').count() + 1
        })
    }

    /// Whitespace at the start of the line the node starts on.
    pub fn indentation_text(&self) -> Result<String> {
        self.with_tree(|tree, index| {
            line_indentation(tree.text(), tree.node(index).start).to_string()
        })
    }

    /// Indentation for children: the node's indentation plus one level.
    pub fn child_indentation_text(&self) -> Result<String> {
        let indentation = self.indentation_text()?;
        let level = self.project().borrow().settings.manipulation.indentation;
        Ok(format!("{indentation}{}", level.as_str()))
    }

    /// Comments in the leading trivia. Cached until the wrapper is forgotten
    /// or rebound.
    pub fn leading_comment_ranges(&self) -> Result<Vec<TextRange>> {
        self.comment_ranges(true)
    }

    /// Comments following the node on its last line.
    pub fn trailing_comment_ranges(&self) -> Result<Vec<TextRange>> {
        self.comment_ranges(false)
    }

    fn comment_ranges(&self, leading: bool) -> Result<Vec<TextRange>> {
        let key = self.key()?;
        {
            let data = self.cell().data.borrow();
            let cached = if leading {
                &data.comments.leading
            } else {
                &data.comments.trailing
            };
            if let Some(ranges) = cached {
                return Ok(ranges.clone());
            }
        }
        let comments = self.with_tree(|tree, index| {
            if tree.node(index).is_syntax_list() {
                Vec::new()
            } else if leading {
                leading_comments(tree, index)
            } else {
                trailing_comments(tree, index)
            }
        })?;
        let ranges: Vec<TextRange> = comments
            .iter()
            .map(|c| TextRange::new(self.project().clone(), key.file, c))
            .collect();
        let mut data = self.cell().data.borrow_mut();
        if leading {
            data.comments.leading = Some(ranges.clone());
        } else {
            data.comments.trailing = Some(ranges.clone());
        }
        Ok(ranges)
    }

    /// Outermost string-literal spans of the file, cached on the root.
    pub(crate) fn string_spans(&self) -> Result<Rc<Vec<(usize, usize)>>> {
        let root = self.source_file()?.node().clone();
        if let Some(spans) = &root.cell().data.borrow().string_spans {
            return Ok(spans.clone());
        }
        let spans = Rc::new(root.with_tree(|tree, _| tree.string_spans())?);
        root.cell().data.borrow_mut().string_spans = Some(spans.clone());
        Ok(spans)
    }
}
