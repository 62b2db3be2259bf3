//! Project context: source files, their parse trees and the wrapper cache.
//!
//! A [`Project`] is a cheap, clonable handle. Every [`Node`] carries one, so
//! wrappers always reach the cache and the remember-scope listeners through
//! an explicit context rather than global state.

pub(crate) mod cache;
pub(crate) mod forget;
pub(crate) mod scope;

pub use cache::WrapperId;
pub use scope::Remember;

use crate::ast::SourceFile;
use crate::config::{self, ProjectSettings};
use crate::errors::{MorphError, Result};
use crate::node::Node;
use crate::pool;
use crate::ts::{language_for_path, NodeIndex, ParseTree};
use ast_grep_language::SupportLang;
use cache::{NodeCell, NodeKey, WrapperCache};
use scope::{ScopeId, ScopeStack};
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace};

/// Identifies a source file within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    #[cfg(test)]
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }
}

pub(crate) struct FileState {
    pub(crate) path: PathBuf,
    pub(crate) tree: ParseTree,
}

pub(crate) struct ProjectState {
    pub(crate) settings: ProjectSettings,
    files: Vec<Option<FileState>>,
    pub(crate) cache: WrapperCache,
    pub(crate) scopes: ScopeStack,
}

impl ProjectState {
    pub(crate) fn file(&self, id: FileId) -> Result<&FileState> {
        self.files
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| MorphError::UnknownFile(format!("#{}", id.0)))
    }

    pub(crate) fn file_mut(&mut self, id: FileId) -> Result<&mut FileState> {
        self.files
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| MorphError::UnknownFile(format!("#{}", id.0)))
    }

    pub(crate) fn tree(&self, id: FileId) -> Option<&ParseTree> {
        self.file(id).ok().map(|f| &f.tree)
    }

    /// Return the wrapper for `key`, creating and announcing it on a miss.
    pub(crate) fn get_or_create(&mut self, key: NodeKey) -> Result<Rc<NodeCell>> {
        if let Some(cell) = self.cache.get(key) {
            return Ok(cell);
        }
        let tree = &self.file(key.file)?.tree;
        let live = count_live_children(tree, &self.cache, key);
        let parents = counter_parents(tree, key.index);

        for parent in parents.into_iter().flatten() {
            if let Some(cell) = self.cache.get(NodeKey {
                file: key.file,
                index: parent,
            }) {
                cell.data.borrow_mut().live_children += 1;
            }
        }
        let cell = self.cache.new_cell(key, live);
        self.scopes.record(&cell);
        trace!(id = cell.id.get(), index = key.index.index(), "wrapper created");
        Ok(cell)
    }
}

/// The wrappers whose live-child counter includes `index`: the semantic
/// parent and, if distinct, the parent syntax list.
pub(crate) fn counter_parents(tree: &ParseTree, index: NodeIndex) -> [Option<NodeIndex>; 2] {
    let semantic = tree.semantic_parent(index);
    let list = tree.parent_syntax_list(index).filter(|&l| Some(l) != semantic);
    [semantic, list]
}

fn count_live_children(tree: &ParseTree, cache: &WrapperCache, key: NodeKey) -> usize {
    let live = |index: NodeIndex| {
        cache.has_wrapper(NodeKey {
            file: key.file,
            index,
        })
    };
    let is_list = tree.node(key.index).is_syntax_list();
    let mut count = 0;
    for &child in tree.children(key.index) {
        if live(child) {
            count += 1;
        }
        if !is_list && tree.node(child).is_syntax_list() {
            count += tree.children(child).iter().filter(|&&c| live(c)).count();
        }
    }
    count
}

/// Handle to a project. Clones share state.
#[derive(Clone)]
pub struct Project {
    state: Rc<RefCell<ProjectState>>,
    /// Scopes that ended while the state was borrowed; closed on the next
    /// mutable borrow.
    closing: Rc<RefCell<Vec<ScopeId>>>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Project")
                .field("files", &state.files.iter().flatten().count())
                .field("wrappers", &state.cache.len())
                .finish(),
            Err(_) => f.write_str("Project { .. }"),
        }
    }
}

impl Project {
    pub fn new() -> Self {
        Self::with_settings(ProjectSettings::default())
    }

    pub fn with_settings(settings: ProjectSettings) -> Self {
        Self {
            state: Rc::new(RefCell::new(ProjectState {
                settings,
                files: Vec::new(),
                cache: WrapperCache::default(),
                scopes: ScopeStack::default(),
            })),
            closing: Rc::default(),
        }
    }

    /// Create a project from a TOML settings file.
    pub fn from_settings_path(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::load_from_path(path)?;
        Ok(Self::with_settings(settings))
    }

    pub fn settings(&self) -> ProjectSettings {
        self.state.borrow().settings.clone()
    }

    pub(crate) fn borrow(&self) -> Ref<'_, ProjectState> {
        self.state.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, ProjectState> {
        let mut state = self.state.borrow_mut();
        Self::close_deferred(&self.closing, &mut state);
        state
    }

    pub(crate) fn defer_close(&self, scope: ScopeId) {
        self.closing.borrow_mut().push(scope);
    }

    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, ProjectState>> {
        self.state.try_borrow().ok()
    }

    pub(crate) fn try_borrow_mut(&self) -> Option<RefMut<'_, ProjectState>> {
        let mut state = self.state.try_borrow_mut().ok()?;
        Self::close_deferred(&self.closing, &mut state);
        Some(state)
    }

    fn close_deferred(closing: &RefCell<Vec<ScopeId>>, state: &mut ProjectState) {
        let closing = std::mem::take(&mut *closing.borrow_mut());
        for scope in closing {
            state.close_scope(scope);
        }
    }

    pub(crate) fn same(&self, other: &Project) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Add a file, picking the grammar from its extension or the project's
    /// default language.
    pub fn create_source_file(
        &self,
        path: impl AsRef<Path>,
        text: impl Into<String>,
    ) -> Result<SourceFile> {
        let path = path.as_ref();
        let language = language_for_path(path)
            .or_else(|| {
                self.borrow()
                    .settings
                    .language
                    .map(|name| name.support_lang())
            })
            .ok_or_else(|| {
                MorphError::InvalidOperation(format!(
                    "no grammar for {}; set `language` in the project settings",
                    path.display()
                ))
            })?;
        self.create_source_file_with_language(path, text, language)
    }

    pub fn create_source_file_with_language(
        &self,
        path: impl AsRef<Path>,
        text: impl Into<String>,
        language: SupportLang,
    ) -> Result<SourceFile> {
        let path = path.as_ref().to_path_buf();
        if self.source_file(&path).is_some() {
            return Err(MorphError::InvalidOperation(format!(
                "a source file already exists at {}",
                path.display()
            )));
        }
        let text = text.into();
        let tree = pool::with_parser(language, |parser| parser.parse(&text))??;

        let id = {
            let mut state = self.borrow_mut();
            let id = FileId(state.files.len() as u32);
            state.files.push(Some(FileState {
                path: path.clone(),
                tree,
            }));
            id
        };
        debug!(path = %path.display(), language = ?language, "source file created");
        let root = self.wrap(id, NodeIndex::new(0))?;
        Ok(SourceFile::from_node(root))
    }

    pub fn source_file(&self, path: impl AsRef<Path>) -> Option<SourceFile> {
        let path = path.as_ref();
        let id = {
            let state = self.borrow();
            let index = state
                .files
                .iter()
                .position(|f| f.as_ref().is_some_and(|f| f.path == path))?;
            FileId(index as u32)
        };
        self.wrap(id, NodeIndex::new(0)).ok().map(SourceFile::from_node)
    }

    pub fn source_files(&self) -> Vec<SourceFile> {
        let ids: Vec<FileId> = {
            let state = self.borrow();
            state
                .files
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_some())
                .map(|(i, _)| FileId(i as u32))
                .collect()
        };
        ids.into_iter()
            .filter_map(|id| self.wrap(id, NodeIndex::new(0)).ok())
            .map(SourceFile::from_node)
            .collect()
    }

    /// Remove a file from the project, forgetting every wrapper in it.
    pub fn remove_source_file(&self, file: &SourceFile) -> Result<()> {
        let id = file.node().file_id();
        let mut state = self.borrow_mut();
        state.file(id)?;
        let wrappers = state.cache.take_file(id);
        let count = wrappers.len();
        for cell in wrappers.into_values() {
            cell.detach(None);
        }
        state.files[id.0 as usize] = None;
        debug!(file = id.0, forgotten = count, "source file removed");
        Ok(())
    }

    /// Number of live wrappers across all files.
    pub fn live_wrapper_count(&self) -> usize {
        self.borrow().cache.len()
    }

    pub(crate) fn wrap(&self, file: FileId, index: NodeIndex) -> Result<Node> {
        let cell = self.borrow_mut().get_or_create(NodeKey { file, index })?;
        Ok(Node::from_cell(self.clone(), cell))
    }

    pub(crate) fn wrap_all(&self, file: FileId, indices: &[NodeIndex]) -> Result<Vec<Node>> {
        indices.iter().map(|&i| self.wrap(file, i)).collect()
    }

    pub(crate) fn path_of(&self, file: FileId) -> Result<PathBuf> {
        Ok(self.borrow().file(file)?.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_comes_from_extension() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        assert_eq!(file.node().language().unwrap(), SupportLang::TypeScript);
    }

    #[test]
    fn unknown_extension_needs_default_language() {
        let project = Project::new();
        let err = project.create_source_file("notes.txt", "x").unwrap_err();
        assert!(matches!(err, MorphError::InvalidOperation(_)));

        let settings = config::load_from_str("language = \"python\"").unwrap();
        let project = Project::with_settings(settings);
        let file = project.create_source_file("script", "x = 1\n").unwrap();
        assert_eq!(file.node().language().unwrap(), SupportLang::Python);
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let project = Project::new();
        project.create_source_file("a.rs", "fn a() {}").unwrap();
        assert!(project.create_source_file("a.rs", "fn b() {}").is_err());
        assert_eq!(project.source_files().len(), 1);
    }

    #[test]
    fn source_file_lookup_returns_same_wrapper() {
        let project = Project::new();
        let created = project.create_source_file("a.rs", "fn a() {}").unwrap();
        let found = project.source_file("a.rs").unwrap();
        assert_eq!(created.node(), found.node());
    }

    #[test]
    fn removing_a_file_forgets_its_wrappers() {
        let project = Project::new();
        let file = project.create_source_file("a.rs", "fn a() {}").unwrap();
        let func = file.node().first_descendant_of_kind("function_item").unwrap().unwrap();

        project.remove_source_file(&file).unwrap();
        assert!(func.was_forgotten());
        assert!(file.node().was_forgotten());
        assert_eq!(project.live_wrapper_count(), 0);
        assert!(project.source_file("a.rs").is_none());
    }
}
