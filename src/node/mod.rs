//! The public wrapper over a parse node.
//!
//! A [`Node`] is a handle: clones share one wrapper cell, and two handles
//! compare equal exactly when they share it. Every node-dependent call
//! returns [`MorphError::NodeForgotten`] once the wrapper was forgotten.

mod mutation;
pub(crate) mod navigation;
mod query;
pub(crate) mod text;
mod traversal;

pub use query::PatternHit;
pub use text::TextRange;
pub use traversal::TraversalControl;

use crate::ast::SourceFile;
use crate::errors::{MorphError, Result};
use crate::project::cache::{NodeCell, NodeKey};
use crate::project::{FileId, Project, WrapperId};
use crate::ts::{is_known_kind, named_kinds, NodeIndex, ParseTree};
use ast_grep_language::SupportLang;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Clone)]
pub struct Node {
    project: Project,
    cell: Rc<NodeCell>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.id.hash(state);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.cell.id.get();
        let described = self.with_tree(|tree, index| {
            let node = tree.node(index);
            (node.kind, node.start, node.end)
        });
        match described {
            Ok((kind, start, end)) => write!(f, "Node(#{id} {kind} {start}..{end})"),
            Err(_) => write!(f, "Node(#{id} forgotten)"),
        }
    }
}

impl Node {
    pub(crate) fn from_cell(project: Project, cell: Rc<NodeCell>) -> Self {
        Self { project, cell }
    }

    pub(crate) fn cell(&self) -> &Rc<NodeCell> {
        &self.cell
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn id(&self) -> WrapperId {
        self.cell.id
    }

    pub(crate) fn file_id(&self) -> FileId {
        self.cell.file()
    }

    pub fn was_forgotten(&self) -> bool {
        self.cell.is_forgotten()
    }

    pub(crate) fn key(&self) -> Result<NodeKey> {
        self.cell.key().ok_or_else(|| MorphError::NodeForgotten {
            text: self.cell.data.borrow().forgotten_text.clone(),
        })
    }

    pub(crate) fn index(&self) -> Result<NodeIndex> {
        Ok(self.key()?.index)
    }

    /// Run `f` against the current tree. `f` must not touch the project.
    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&ParseTree, NodeIndex) -> R) -> Result<R> {
        let key = self.key()?;
        let state = self
            .project
            .try_borrow()
            .ok_or_else(|| MorphError::InvalidOperation("project is busy".to_string()))?;
        let file = state.file(key.file)?;
        Ok(f(&file.tree, key.index))
    }

    pub(crate) fn wrap(&self, index: NodeIndex) -> Result<Node> {
        self.project.wrap(self.file_id(), index)
    }

    pub(crate) fn wrap_opt(&self, index: Option<NodeIndex>) -> Result<Option<Node>> {
        index.map(|i| self.wrap(i)).transpose()
    }

    pub(crate) fn wrap_all(&self, indices: &[NodeIndex]) -> Result<Vec<Node>> {
        self.project.wrap_all(self.file_id(), indices)
    }

    pub fn kind(&self) -> Result<&'static str> {
        self.with_tree(|tree, index| tree.node(index).kind)
    }

    pub fn is_kind(&self, kind: &str) -> Result<bool> {
        Ok(self.kind()? == kind)
    }

    pub fn is_named(&self) -> Result<bool> {
        self.with_tree(|tree, index| tree.node(index).named)
    }

    pub fn is_syntax_list(&self) -> Result<bool> {
        self.with_tree(|tree, index| tree.node(index).is_syntax_list())
    }

    /// True for the root of a source file.
    pub fn is_source_file(&self) -> Result<bool> {
        self.with_tree(|tree, index| index == tree.root())
    }

    /// Field name this node occupies in its parent, e.g. `name` or `body`.
    pub fn field_name(&self) -> Result<Option<&'static str>> {
        self.with_tree(|tree, index| tree.node(index).field)
    }

    pub fn has_errors(&self) -> Result<bool> {
        self.with_tree(|tree, index| {
            let node = tree.node(index);
            tree.error_spans()
                .iter()
                .any(|&(start, end)| start >= node.pos && end <= node.end)
        })
    }

    pub fn language(&self) -> Result<SupportLang> {
        self.with_tree(|tree, _| tree.language())
    }

    pub fn source_file(&self) -> Result<SourceFile> {
        self.key()?;
        let root = self.project.wrap(self.file_id(), NodeIndex::new(0))?;
        Ok(SourceFile::from_node(root))
    }

    /// Number of materialized wrappers whose parent or parent syntax list is
    /// this wrapper.
    pub fn live_child_wrapper_count(&self) -> usize {
        self.cell.data.borrow().live_children
    }

    /// Forget this wrapper and every materialized descendant.
    pub fn forget(&self) {
        if let Some(mut state) = self.project.try_borrow_mut() {
            state.forget(&self.cell);
        }
    }

    /// Forget every materialized descendant, keeping this wrapper.
    pub fn forget_descendants(&self) -> Result<()> {
        let key = self.key()?;
        self.project.borrow_mut().forget_descendants(key);
        Ok(())
    }

    /// Not-found error for a kind, with a suggestion when the grammar does
    /// not know the name.
    pub(crate) fn kind_not_found(&self, what: &str, kind: &str) -> MorphError {
        let suggestion = self.language().ok().and_then(|lang| {
            if is_known_kind(lang, kind) {
                return None;
            }
            named_kinds(lang)
                .into_iter()
                .map(|k| (strsim::jaro_winkler(kind, k), k))
                .filter(|(score, _)| *score > 0.8)
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, k)| k.to_string())
        });
        MorphError::NotFound {
            what: format!("{what} of kind `{kind}`"),
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::MorphError;
    use crate::Project;

    #[test]
    fn navigation_returns_the_same_wrapper() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let first = file.node().first_child().unwrap().unwrap();
        let again = file.node().first_child().unwrap().unwrap();
        assert_eq!(first, again);
        assert_eq!(first.id(), again.id());
    }

    #[test]
    fn forgotten_nodes_report_their_text() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let decl = file
            .node()
            .first_descendant_of_kind("lexical_declaration")
            .unwrap()
            .unwrap();
        decl.forget();

        match decl.kind() {
            Err(MorphError::NodeForgotten { text }) => assert_eq!(text.as_deref(), Some("let a = 1;")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(format!("{decl:?}").contains("forgotten"));
    }

    #[test]
    fn unknown_kind_gets_a_suggestion() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", "fn a() {}").unwrap();
        let err = file
            .node()
            .first_descendant_of_kind_or_err("function_iten")
            .unwrap_err();
        match err {
            MorphError::NotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("function_item"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
