//! Surgical multi-span transforms.
//!
//! The visitor runs over a node's structural subtree in post-order (children
//! are visited when it calls [`TransformControl::visit_children`]). Every
//! node it replaces becomes a text replacement; a replacement enclosing
//! earlier ones supersedes them. The replacements are spliced into the
//! original text and committed in one reparse, so untouched text, including
//! comments and formatting, is preserved byte for byte.

mod node;
mod printer;

pub use node::TransformNode;
pub use printer::{Printer, SourcePrinter};

use crate::config::QuoteKind;
use crate::edit::TextEdit;
use crate::errors::Result;
use crate::manipulation::{commit, RebindScope};
use crate::node::Node;
use crate::project::cache::NodeKey;
use crate::ts::{NodeIndex, ParseTree};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

struct Recorded {
    origin: NodeIndex,
    start: usize,
    end: usize,
    replacement: TransformNode,
    kind_changed: bool,
}

struct Context<'v> {
    tree: Rc<ParseTree>,
    quote: QuoteKind,
    visit: &'v dyn Fn(&mut TransformControl<'_>) -> TransformNode,
    recorded: RefCell<Vec<Recorded>>,
}

impl Context<'_> {
    fn visit(&self, node: TransformNode) -> TransformNode {
        let mut control = TransformControl {
            context: self,
            current: node,
            children_visited: false,
        };
        let result = (self.visit)(&mut control);
        if !result.same(&control.current) {
            self.record(&control.current, &result);
        }
        result
    }

    fn record(&self, old: &TransformNode, replacement: &TransformNode) {
        let Some(origin) = old.origin() else {
            return;
        };
        let node = self.tree.node(origin);
        let (start, end) = (node.start, node.end);
        let mut recorded = self.recorded.borrow_mut();
        while recorded.last().is_some_and(|last| last.start >= start) {
            recorded.pop();
        }
        recorded.push(Recorded {
            origin,
            start,
            end,
            replacement: replacement.clone(),
            kind_changed: replacement.kind() != node.kind,
        });
    }
}

/// Handed to the visitor for each node.
pub struct TransformControl<'c> {
    context: &'c Context<'c>,
    current: TransformNode,
    children_visited: bool,
}

impl TransformControl<'_> {
    /// The node being visited; after [`visit_children`](Self::visit_children)
    /// this is the updated node.
    pub fn current_node(&self) -> TransformNode {
        self.current.clone()
    }

    /// Visit the structural children in order. Returns the current node,
    /// replaced by an updated copy when any child was replaced.
    pub fn visit_children(&mut self) -> TransformNode {
        if self.children_visited {
            return self.current.clone();
        }
        self.children_visited = true;
        let Some(origin) = self.current.origin() else {
            return self.current.clone();
        };
        let tree = self.context.tree.clone();
        let mut replaced = Vec::new();
        for child in tree.structural_children(origin) {
            let original = TransformNode::original(tree.clone(), child);
            let result = self.context.visit(original.clone());
            if !result.same(&original) {
                replaced.push((child, result));
            }
        }
        if !replaced.is_empty() {
            self.current = TransformNode::updated(tree, origin, replaced);
        }
        self.current.clone()
    }

    pub fn language(&self) -> SupportLang {
        self.context.tree.language()
    }

    /// Structural children of the node being visited, as originals.
    pub fn children(&self) -> Vec<TransformNode> {
        let Some(origin) = self.current.origin() else {
            return Vec::new();
        };
        let tree = &self.context.tree;
        tree.structural_children(origin)
            .into_iter()
            .map(|child| TransformNode::original(tree.clone(), child))
            .collect()
    }

    /// A string literal node for `value`, quoted per the project settings
    /// where the grammar allows a choice.
    pub fn string_literal(&self, value: &str) -> TransformNode {
        let language = self.language();
        let (kind, quote) = match language {
            SupportLang::TypeScript | SupportLang::Tsx | SupportLang::JavaScript => {
                ("string", self.context.quote.as_char())
            }
            SupportLang::Python => ("string", self.context.quote.as_char()),
            SupportLang::Go => ("interpreted_string_literal", '"'),
            _ => ("string_literal", '"'),
        };
        let mut text = String::with_capacity(value.len() + 2);
        text.push(quote);
        for c in value.chars() {
            if c == quote || c == '\\' {
                text.push('\\');
            }
            text.push(c);
        }
        text.push(quote);
        TransformNode::synthetic(kind, text)
    }
}

impl Node {
    /// Transform this node's subtree with `visit`, printing synthetic nodes
    /// as their text. Returns the node now at this node's position.
    pub fn transform<F>(&self, visit: F) -> Result<Node>
    where
        F: Fn(&mut TransformControl<'_>) -> TransformNode,
    {
        self.transform_with_printer(&SourcePrinter, visit)
    }

    pub fn transform_with_printer<F>(&self, printer: &dyn Printer, visit: F) -> Result<Node>
    where
        F: Fn(&mut TransformControl<'_>) -> TransformNode,
    {
        let (tree, index, parent, child_index) = self.with_tree(|tree, index| {
            (
                Rc::new(tree.clone()),
                index,
                tree.node(index).parent,
                tree.child_index(index),
            )
        })?;
        let context = Context {
            tree: tree.clone(),
            quote: self.project().settings().manipulation.quote_kind,
            visit: &visit,
            recorded: RefCell::new(Vec::new()),
        };
        context.visit(TransformNode::original(tree.clone(), index));
        let recorded = context.recorded.into_inner();
        if recorded.is_empty() {
            return Ok(self.clone());
        }

        // Materialize the parent so it can be found again after the commit.
        let parent = parent.map(|p| self.wrap(p)).transpose()?;
        let file = self.file_id();
        {
            let mut state = self.project().borrow_mut();
            for r in &recorded {
                let key = NodeKey {
                    file,
                    index: r.origin,
                };
                if let Some(cell) = state.cache.get(key) {
                    if r.kind_changed {
                        state.forget(&cell);
                    } else {
                        state.forget_descendants(key);
                    }
                }
            }
        }

        let edits: Vec<TextEdit> = recorded
            .iter()
            .map(|r| TextEdit::new(r.start, r.end, r.replacement.print(printer)))
            .collect();
        debug!(replacements = edits.len(), "transform");
        commit(self.project(), file, edits, RebindScope::Containing)?;

        match (parent, child_index) {
            (Some(parent), Some(child_index)) => parent.child_at_index_or_err(child_index),
            _ => Ok(self.source_file()?.node().clone()),
        }
    }
}
