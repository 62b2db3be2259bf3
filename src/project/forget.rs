//! Forgetting wrappers without materializing untouched subtrees.

use crate::project::cache::{NodeCell, NodeKey};
use crate::project::{counter_parents, ProjectState};
use crate::ts::{NodeIndex, ParseTree};
use std::rc::Rc;
use tracing::trace;

impl ProjectState {
    /// Nearest materialized descendants of `key`. Unmaterialized nodes are
    /// walked through, never wrapped.
    pub(crate) fn live_children(&self, key: NodeKey) -> Vec<Rc<NodeCell>> {
        let Some(wrappers) = self.cache.file_wrappers(key.file) else {
            return Vec::new();
        };
        let Some(tree) = self.tree(key.file) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = tree.children(key.index).iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            match wrappers.get(&index) {
                Some(cell) => out.push(cell.clone()),
                None => stack.extend(tree.children(index).iter().rev().copied()),
            }
        }
        out
    }

    pub(crate) fn has_live_descendants(&self, key: NodeKey) -> bool {
        let (Some(wrappers), Some(tree)) = (self.cache.file_wrappers(key.file), self.tree(key.file))
        else {
            return false;
        };
        let mut stack: Vec<NodeIndex> = tree.children(key.index).to_vec();
        while let Some(index) = stack.pop() {
            if wrappers.contains_key(&index) {
                return true;
            }
            stack.extend_from_slice(tree.children(index));
        }
        false
    }

    /// Forget `cell` and every materialized descendant. No-op when already
    /// forgotten.
    pub(crate) fn forget(&mut self, cell: &Rc<NodeCell>) {
        let Some(key) = cell.key() else {
            return;
        };
        self.forget_descendants(key);
        self.forget_only_this(cell);
    }

    pub(crate) fn forget_descendants(&mut self, key: NodeKey) {
        for child in self.live_children(key) {
            self.forget(&child);
        }
    }

    /// Forget a single wrapper, leaving its descendants alone.
    pub(crate) fn forget_only_this(&mut self, cell: &Rc<NodeCell>) {
        let Some(key) = cell.key() else {
            return;
        };
        let snapshot = match self.tree(key.file) {
            Some(tree) => {
                for parent in counter_parents(tree, key.index).into_iter().flatten() {
                    let parent_key = NodeKey {
                        file: key.file,
                        index: parent,
                    };
                    if let Some(parent) = self.cache.get(parent_key) {
                        let mut data = parent.data.borrow_mut();
                        data.live_children = data.live_children.saturating_sub(1);
                    }
                }
                Some(snapshot_text(
                    tree,
                    key.index,
                    self.settings.manipulation.forgotten_text_len,
                ))
            }
            None => None,
        };
        cell.detach(snapshot);
        self.cache.remove(key);
        trace!(id = cell.id.get(), "wrapper forgotten");
    }

    /// Recompute every live-child counter of `file` from the cache.
    pub(crate) fn recount(&mut self, file: crate::project::FileId) {
        let (Some(wrappers), Some(tree)) = (self.cache.file_wrappers(file), self.tree(file)) else {
            return;
        };
        for cell in wrappers.values() {
            cell.data.borrow_mut().live_children = 0;
        }
        for &index in wrappers.keys() {
            for parent in counter_parents(tree, index).into_iter().flatten() {
                if let Some(cell) = wrappers.get(&parent) {
                    cell.data.borrow_mut().live_children += 1;
                }
            }
        }
    }
}

/// Trimmed excerpt of a node's text, cut to `max` characters.
pub(crate) fn snapshot_text(tree: &ParseTree, index: NodeIndex, max: usize) -> String {
    let text = tree.node_text(index).trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
