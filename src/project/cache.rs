//! Wrapper node cache: at most one wrapper per live parse node.

use crate::node::TextRange;
use crate::project::FileId;
use crate::ts::NodeIndex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Stable identity of a wrapper. Ids are never reused, so a forgotten
/// wrapper can never alias a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId(u64);

impl WrapperId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Address of a parse node in the current tree of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    pub(crate) file: FileId,
    pub(crate) index: NodeIndex,
}

/// Comment ranges computed on first request.
#[derive(Clone, Default)]
pub(crate) struct CachedComments {
    pub(crate) leading: Option<Vec<TextRange>>,
    pub(crate) trailing: Option<Vec<TextRange>>,
}

pub(crate) struct WrapperData {
    /// `None` once forgotten.
    pub(crate) key: Option<NodeKey>,
    pub(crate) file: FileId,
    pub(crate) live_children: usize,
    pub(crate) forgotten_text: Option<String>,
    pub(crate) comments: CachedComments,
    pub(crate) string_spans: Option<Rc<Vec<(usize, usize)>>>,
}

/// Shared state behind every handle to one wrapper.
pub(crate) struct NodeCell {
    pub(crate) id: WrapperId,
    pub(crate) data: RefCell<WrapperData>,
}

impl NodeCell {
    pub(crate) fn key(&self) -> Option<NodeKey> {
        self.data.borrow().key
    }

    pub(crate) fn is_forgotten(&self) -> bool {
        self.key().is_none()
    }

    pub(crate) fn file(&self) -> FileId {
        self.data.borrow().file
    }

    /// Drop derived state that depends on the current text.
    pub(crate) fn clear_derived(&self) {
        let comments = {
            let mut data = self.data.borrow_mut();
            data.string_spans = None;
            std::mem::take(&mut data.comments)
        };
        for range in comments
            .leading
            .into_iter()
            .flatten()
            .chain(comments.trailing.into_iter().flatten())
        {
            range.forget();
        }
    }

    /// Detach from the tree for good.
    pub(crate) fn detach(&self, snapshot: Option<String>) {
        self.clear_derived();
        let mut data = self.data.borrow_mut();
        data.key = None;
        data.live_children = 0;
        data.forgotten_text = snapshot;
    }

    pub(crate) fn rebind(&self, index: NodeIndex) {
        self.clear_derived();
        let mut data = self.data.borrow_mut();
        if let Some(key) = data.key.as_mut() {
            key.index = index;
        }
    }
}

#[derive(Default)]
pub(crate) struct WrapperCache {
    by_file: HashMap<FileId, HashMap<NodeIndex, Rc<NodeCell>>>,
    next_id: u64,
}

impl WrapperCache {
    pub(crate) fn get(&self, key: NodeKey) -> Option<Rc<NodeCell>> {
        self.by_file.get(&key.file)?.get(&key.index).cloned()
    }

    pub(crate) fn has_wrapper(&self, key: NodeKey) -> bool {
        self.by_file
            .get(&key.file)
            .is_some_and(|m| m.contains_key(&key.index))
    }

    pub(crate) fn new_cell(&mut self, key: NodeKey, live_children: usize) -> Rc<NodeCell> {
        self.next_id += 1;
        let cell = Rc::new(NodeCell {
            id: WrapperId(self.next_id),
            data: RefCell::new(WrapperData {
                key: Some(key),
                file: key.file,
                live_children,
                forgotten_text: None,
                comments: CachedComments::default(),
                string_spans: None,
            }),
        });
        self.by_file
            .entry(key.file)
            .or_default()
            .insert(key.index, cell.clone());
        cell
    }

    pub(crate) fn remove(&mut self, key: NodeKey) -> Option<Rc<NodeCell>> {
        self.by_file.get_mut(&key.file)?.remove(&key.index)
    }

    /// Every live wrapper of `file`, keyed by node index.
    pub(crate) fn file_wrappers(&self, file: FileId) -> Option<&HashMap<NodeIndex, Rc<NodeCell>>> {
        self.by_file.get(&file)
    }

    pub(crate) fn take_file(&mut self, file: FileId) -> HashMap<NodeIndex, Rc<NodeCell>> {
        self.by_file.remove(&file).unwrap_or_default()
    }

    pub(crate) fn put_file(&mut self, file: FileId, wrappers: HashMap<NodeIndex, Rc<NodeCell>>) {
        self.by_file.insert(file, wrappers);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_file.values().map(HashMap::len).sum()
    }
}
