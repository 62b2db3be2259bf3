//! Arena representation of a parsed source file.
//!
//! tree-sitter nodes borrow their `Tree`, which makes them unsuitable as
//! long-lived cache keys. After every parse the tree is flattened into a
//! vector of [`ParseNode`]s addressed by [`NodeIndex`]; parents are stored as
//! indices so there are no ownership cycles.
//!
//! Two adjustments are made while flattening:
//!
//! - comments and other grammar "extras" become trivia: they are not
//!   children of any node and are kept in a side table instead;
//! - bracket-delimited child lists, and the top-level children of the root,
//!   are grouped under a synthetic [`SYNTAX_LIST`] node.

use ast_grep_language::{LanguageExt, SupportLang};
use std::collections::HashMap;

/// Kind of the synthetic node grouping a child list.
pub const SYNTAX_LIST: &str = "syntax_list";

const OPENERS: &[(&str, &str)] = &[("{", "}"), ("(", ")"), ("[", "]"), ("<", ">")];

/// Index of a node inside one [`ParseTree`]. Only meaningful for the tree
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct ParseNode {
    /// Grammar kind, or [`SYNTAX_LIST`].
    pub kind: &'static str,
    pub named: bool,
    /// Full start, including leading trivia.
    pub pos: usize,
    /// Start of the first token.
    pub start: usize,
    pub end: usize,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// Field name this node occupies in its grammar parent.
    pub field: Option<&'static str>,
    pub is_error: bool,
    pub is_missing: bool,
}

impl ParseNode {
    pub fn is_syntax_list(&self) -> bool {
        self.kind == SYNTAX_LIST
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    SingleLine,
    MultiLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSpan {
    pub pos: usize,
    pub end: usize,
    pub kind: CommentKind,
}

/// Immutable parse result for one version of a source file's text.
#[derive(Debug, Clone)]
pub struct ParseTree {
    language: SupportLang,
    text: String,
    nodes: Vec<ParseNode>,
    comments: Vec<CommentSpan>,
    ts_ids: HashMap<usize, NodeIndex>,
    tree: tree_sitter::Tree,
}

impl ParseTree {
    pub(crate) fn build(language: SupportLang, text: String, tree: tree_sitter::Tree) -> Self {
        let mut builder = Builder {
            text: &text,
            nodes: Vec::new(),
            comments: Vec::new(),
            ts_ids: HashMap::new(),
        };
        builder.build_root(tree.root_node());
        let Builder {
            nodes,
            mut comments,
            ts_ids,
            ..
        } = builder;
        comments.sort_by_key(|c| c.pos);

        Self {
            language,
            text,
            nodes,
            comments,
            ts_ids,
            tree,
        }
    }

    pub fn language(&self) -> SupportLang {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &ParseNode {
        &self.nodes[index.index()]
    }

    pub fn get(&self, index: NodeIndex) -> Option<&ParseNode> {
        self.nodes.get(index.index())
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.node(index).children
    }

    /// Named children with syntax lists flattened away.
    pub fn structural_children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.push_structural(index, &mut out);
        out
    }

    fn push_structural(&self, index: NodeIndex, out: &mut Vec<NodeIndex>) {
        for &child in self.children(index) {
            let node = self.node(child);
            if node.is_syntax_list() {
                self.push_structural(child, out);
            } else if node.named {
                out.push(child);
            }
        }
    }

    /// Parent in the grammar sense: syntax lists are skipped unless `index`
    /// is itself a syntax list.
    pub fn semantic_parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        let parent = self.node(index).parent?;
        if self.node(parent).is_syntax_list() && !self.node(index).is_syntax_list() {
            return self.node(parent).parent;
        }
        Some(parent)
    }

    pub fn parent_syntax_list(&self, index: NodeIndex) -> Option<NodeIndex> {
        let parent = self.node(index).parent?;
        self.node(parent).is_syntax_list().then_some(parent)
    }

    pub fn child_index(&self, index: NodeIndex) -> Option<usize> {
        let parent = self.node(index).parent?;
        self.children(parent).iter().position(|&c| c == index)
    }

    pub fn depth(&self, index: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = self.node(index).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// True if `ancestor` is `index` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeIndex, index: NodeIndex) -> bool {
        let mut current = Some(index);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    pub fn node_text(&self, index: NodeIndex) -> &str {
        let node = self.node(index);
        &self.text[node.start..node.end]
    }

    pub fn full_text(&self, index: NodeIndex) -> &str {
        let node = self.node(index);
        &self.text[node.pos..node.end]
    }

    /// Token-level child containing `pos` in its full span.
    pub fn child_at_pos(&self, index: NodeIndex, pos: usize) -> Option<NodeIndex> {
        let node = self.node(index);
        if pos < node.pos || pos >= node.end {
            return None;
        }
        self.children(index)
            .iter()
            .copied()
            .find(|&c| pos >= self.node(c).pos && pos < self.node(c).end)
    }

    /// Deepest node whose token span contains `pos`, ignoring syntax lists.
    pub fn descendant_at_pos(&self, pos: usize) -> Option<NodeIndex> {
        if pos >= self.text.len() {
            return None;
        }
        let mut current = self.root();
        let mut found = None;
        loop {
            let next = self.children(current).iter().copied().find(|&c| {
                let child = self.node(c);
                child.start <= pos && pos < child.end
            });
            match next {
                Some(child) => {
                    if !self.node(child).is_syntax_list() {
                        found = Some(child);
                    }
                    current = child;
                }
                None => break,
            }
        }
        found
    }

    pub fn comments(&self) -> &[CommentSpan] {
        &self.comments
    }

    /// Comments lying entirely inside `[from, to)`.
    pub fn comments_between(&self, from: usize, to: usize) -> impl Iterator<Item = &CommentSpan> {
        self.comments
            .iter()
            .skip_while(move |c| c.pos < from)
            .take_while(move |c| c.end <= to)
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.is_error || n.is_missing)
    }

    /// Spans of ERROR and MISSING nodes.
    pub fn error_spans(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .filter(|n| n.is_error || n.is_missing)
            .map(|n| (n.start, n.end))
            .collect()
    }

    /// The tree-sitter tree this arena was flattened from.
    pub fn ts_tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    pub fn from_ts_node(&self, node: tree_sitter::Node<'_>) -> Option<NodeIndex> {
        self.ts_ids.get(&node.id()).copied()
    }

    /// Outermost string-literal spans, sorted by start.
    pub fn string_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(index) = stack.pop() {
            let node = self.node(index);
            if node.named && is_string_kind(node.kind) {
                spans.push((node.start, node.end));
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        spans.sort_unstable();
        spans
    }
}

fn is_string_kind(kind: &str) -> bool {
    kind.contains("string")
        && !kind.contains("fragment")
        && !kind.contains("content")
        && !kind.ends_with("_start")
        && !kind.ends_with("_end")
}

/// True if `kind` is only ever an anonymous token in `language`.
pub fn is_token_kind(language: SupportLang, kind: &str) -> bool {
    if kind == SYNTAX_LIST {
        return false;
    }
    let ts_lang = language.get_ts_language();
    ts_lang.id_for_node_kind(kind, true) == 0
}

/// True if the grammar knows `kind` (named or anonymous).
pub fn is_known_kind(language: SupportLang, kind: &str) -> bool {
    if kind == SYNTAX_LIST {
        return true;
    }
    let ts_lang = language.get_ts_language();
    ts_lang.id_for_node_kind(kind, true) != 0 || ts_lang.id_for_node_kind(kind, false) != 0
}

/// All named kinds of the grammar.
pub fn named_kinds(language: SupportLang) -> Vec<&'static str> {
    let ts_lang = language.get_ts_language();
    (0..ts_lang.node_kind_count())
        .filter_map(|id| {
            let id = id as u16;
            if ts_lang.node_kind_is_named(id) {
                ts_lang.node_kind_for_id(id)
            } else {
                None
            }
        })
        .collect()
}

struct Builder<'t> {
    text: &'t str,
    nodes: Vec<ParseNode>,
    comments: Vec<CommentSpan>,
    ts_ids: HashMap<usize, NodeIndex>,
}

impl<'t> Builder<'t> {
    fn push(&mut self, node: ParseNode) -> NodeIndex {
        let index = NodeIndex::new(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.index()].children.push(index);
        }
        self.nodes.push(node);
        index
    }

    fn push_list(&mut self, parent: NodeIndex, pos: usize) -> NodeIndex {
        self.push(ParseNode {
            kind: SYNTAX_LIST,
            named: false,
            pos,
            start: pos,
            end: pos,
            parent: Some(parent),
            children: Vec::new(),
            field: None,
            is_error: false,
            is_missing: false,
        })
    }

    fn finish_list(&mut self, list: NodeIndex) {
        let first = self.nodes[list.index()].children.first().copied();
        let last = self.nodes[list.index()].children.last().copied();
        if let (Some(first), Some(last)) = (first, last) {
            let start = self.nodes[first.index()].start;
            let end = self.nodes[last.index()].end;
            let node = &mut self.nodes[list.index()];
            node.start = start;
            node.end = end;
        }
    }

    fn build_root(&mut self, root: tree_sitter::Node<'_>) {
        let len = self.text.len();
        let index = self.push(ParseNode {
            kind: root.kind(),
            named: true,
            pos: 0,
            start: len,
            end: len,
            parent: None,
            children: Vec::new(),
            field: None,
            is_error: root.is_error(),
            is_missing: root.is_missing(),
        });
        self.ts_ids.insert(root.id(), index);

        let children = self.collect_children(root);
        let list = self.push_list(index, 0);
        let mut pos = 0;
        for (child, field) in children {
            let built = self.build_node(child, field, list, pos);
            pos = self.nodes[built.index()].end;
        }
        self.finish_list(list);

        let list_node = &self.nodes[list.index()];
        if !list_node.children.is_empty() {
            self.nodes[index.index()].start = list_node.start;
        }
    }

    fn build_node(
        &mut self,
        node: tree_sitter::Node<'_>,
        field: Option<&'static str>,
        parent: NodeIndex,
        pos: usize,
    ) -> NodeIndex {
        let index = self.push(ParseNode {
            kind: node.kind(),
            named: node.is_named(),
            pos: pos.min(node.start_byte()),
            start: node.start_byte(),
            end: node.end_byte(),
            parent: Some(parent),
            children: Vec::new(),
            field,
            is_error: node.is_error(),
            is_missing: node.is_missing(),
        });
        self.ts_ids.insert(node.id(), index);

        let children = self.collect_children(node);
        if children.is_empty() {
            return index;
        }

        let mut cursor = self.nodes[index.index()].pos;
        match list_bounds(&children) {
            Some(close) => {
                let (open, _) = children[0];
                let open_index = self.build_node(open, children[0].1, index, cursor);
                cursor = self.nodes[open_index.index()].end;

                let list = self.push_list(index, cursor);
                for &(child, field) in &children[1..close] {
                    let built = self.build_node(child, field, list, cursor);
                    cursor = self.nodes[built.index()].end;
                }
                self.finish_list(list);

                let (close_node, close_field) = children[close];
                self.build_node(close_node, close_field, index, cursor);
            }
            None => {
                for (child, field) in children {
                    let built = self.build_node(child, field, index, cursor);
                    cursor = self.nodes[built.index()].end;
                }
            }
        }
        index
    }

    /// Non-extra children with their field names; comments go to the side table.
    fn collect_children<'n>(
        &mut self,
        node: tree_sitter::Node<'n>,
    ) -> Vec<(tree_sitter::Node<'n>, Option<&'static str>)> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return out;
        }
        loop {
            let child = cursor.node();
            if child.is_extra() {
                if child.kind().contains("comment") {
                    let text = &self.text[child.start_byte()..child.end_byte()];
                    let kind = if text.starts_with("/*") || child.kind().contains("block") {
                        CommentKind::MultiLine
                    } else {
                        CommentKind::SingleLine
                    };
                    self.comments.push(CommentSpan {
                        pos: child.start_byte(),
                        end: child.end_byte(),
                        kind,
                    });
                }
            } else {
                out.push((child, cursor.field_name()));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        out
    }
}

/// If the children are wrapped in a bracket pair, the index of the closing
/// bracket. The opening bracket is always the first child.
fn list_bounds(children: &[(tree_sitter::Node<'_>, Option<&'static str>)]) -> Option<usize> {
    if children.len() < 2 {
        return None;
    }
    let (first, _) = children[0];
    let (last, _) = children[children.len() - 1];
    if first.is_named() || last.is_named() {
        return None;
    }
    OPENERS
        .iter()
        .any(|(open, close)| first.kind() == *open && last.kind() == *close)
        .then_some(children.len() - 1)
}
