//! Remember scopes: wrappers created inside a scope are forgotten when it
//! closes unless they were remembered.

use crate::errors::{MorphError, Result};
use crate::node::Node;
use crate::project::cache::{NodeCell, NodeKey, WrapperId};
use crate::project::{counter_parents, Project, ProjectState};
use std::collections::HashSet;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeId(u64);

struct Frame {
    id: ScopeId,
    created: Vec<Rc<NodeCell>>,
    pending: HashSet<WrapperId>,
}

/// Listener list notified by the cache on every creation.
#[derive(Default)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
    next: u64,
}

impl ScopeStack {
    fn push(&mut self) -> ScopeId {
        self.next += 1;
        let id = ScopeId(self.next);
        self.frames.push(Frame {
            id,
            created: Vec::new(),
            pending: HashSet::new(),
        });
        id
    }

    /// Every active frame records the creation.
    pub(crate) fn record(&mut self, cell: &Rc<NodeCell>) {
        for frame in &mut self.frames {
            frame.created.push(cell.clone());
            frame.pending.insert(cell.id);
        }
    }

    /// Withdraw a wrapper from every pending set. Returns whether any frame
    /// still had it pending.
    fn withdraw(&mut self, id: WrapperId) -> bool {
        let mut found = false;
        for frame in &mut self.frames {
            found |= frame.pending.remove(&id);
        }
        found
    }

    fn pop(&mut self, id: ScopeId) -> Option<Frame> {
        let position = self.frames.iter().rposition(|f| f.id == id)?;
        Some(self.frames.remove(position))
    }

    fn is_active(&self, id: ScopeId) -> bool {
        self.frames.iter().any(|f| f.id == id)
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl ProjectState {
    /// Mark `cell` as retained, along with each ancestor wrapper that was
    /// itself still pending.
    fn remember_chain(&mut self, cell: &Rc<NodeCell>) {
        let mut current = vec![cell.clone()];
        while let Some(cell) = current.pop() {
            if !self.scopes.withdraw(cell.id) {
                continue;
            }
            let Some(key) = cell.key() else {
                continue;
            };
            let Some(tree) = self.tree(key.file) else {
                continue;
            };
            for parent in counter_parents(tree, key.index).into_iter().flatten() {
                if let Some(parent) = self.cache.get(NodeKey {
                    file: key.file,
                    index: parent,
                }) {
                    current.push(parent);
                }
            }
        }
    }

    /// Pop the scope's frame and forget its pending wrappers.
    pub(crate) fn close_scope(&mut self, id: ScopeId) {
        let Some(frame) = self.scopes.pop(id) else {
            return;
        };
        let (forgotten, retained) = self.close_frame(frame);
        debug!(forgotten, retained, "remember scope closed");
    }

    fn close_frame(&mut self, frame: Frame) -> (usize, usize) {
        let mut pending: Vec<(usize, Rc<NodeCell>)> = frame
            .created
            .into_iter()
            .filter(|cell| frame.pending.contains(&cell.id))
            .filter_map(|cell| {
                let key = cell.key()?;
                let tree = self.tree(key.file)?;
                tree.node(key.index).parent?;
                Some((tree.depth(key.index), cell))
            })
            .collect();
        pending.sort_by(|a, b| b.0.cmp(&a.0));

        let mut forgotten = 0;
        let mut retained = 0;
        for (_, cell) in pending {
            let Some(key) = cell.key() else {
                continue;
            };
            if self.has_live_descendants(key) {
                retained += 1;
                continue;
            }
            self.forget_only_this(&cell);
            forgotten += 1;
        }
        (forgotten, retained)
    }
}

/// Closes its scope when dropped, so cleanup also runs on panic and when an
/// async body is cancelled.
struct ScopeGuard {
    remember: Remember,
}

impl ScopeGuard {
    fn open(project: &Project) -> Self {
        let scope = {
            let mut state = project.borrow_mut();
            let id = state.scopes.push();
            debug!(depth = state.scopes.depth(), "remember scope opened");
            id
        };
        Self {
            remember: Remember {
                project: project.clone(),
                scope,
            },
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let project = &self.remember.project;
        match project.try_borrow_mut() {
            Some(mut state) => state.close_scope(self.remember.scope),
            None => {
                warn!("project busy while closing a remember scope; closing it on next use");
                project.defer_close(self.remember.scope);
            }
        }
    }
}

/// Passed to the body of a scoped block; keeps wrappers alive past the end
/// of the scope.
#[derive(Clone)]
pub struct Remember {
    project: Project,
    scope: ScopeId,
}

impl Remember {
    pub fn remember(&self, node: &Node) -> Result<()> {
        if node.was_forgotten() {
            return Err(MorphError::RememberForgotten);
        }
        if !node.project().same(&self.project) {
            return Err(MorphError::InvalidOperation(
                "cannot remember a node from another project".to_string(),
            ));
        }
        let mut state = self.project.borrow_mut();
        if !state.scopes.is_active(self.scope) {
            return Err(MorphError::InvalidOperation(
                "cannot remember through a scope that has already closed".to_string(),
            ));
        }
        state.remember_chain(node.cell());
        Ok(())
    }

    pub fn remember_all<'a>(&self, nodes: impl IntoIterator<Item = &'a Node>) -> Result<()> {
        for node in nodes {
            self.remember(node)?;
        }
        Ok(())
    }
}

impl Project {
    /// Run `body` in a remember scope. Wrappers created while it runs are
    /// forgotten afterwards unless passed to [`Remember::remember`].
    pub fn run_scoped<T>(&self, body: impl FnOnce(&Remember) -> T) -> T {
        let guard = ScopeGuard::open(self);
        body(&guard.remember)
    }

    /// Async form of [`Project::run_scoped`]. Cleanup happens once the
    /// future settles, or when it is dropped unfinished.
    pub async fn run_scoped_async<T, F, Fut>(&self, body: F) -> T
    where
        F: FnOnce(Remember) -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = ScopeGuard::open(self);
        let output = body(guard.remember.clone()).await;
        drop(guard);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeGuard;
    use crate::Project;

    #[test]
    fn unremembered_wrappers_are_forgotten() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let decl = project.run_scoped(|_| {
            file.node()
                .first_descendant_of_kind("lexical_declaration")
                .unwrap()
                .unwrap()
        });
        assert!(decl.was_forgotten());
        assert!(!file.node().was_forgotten());
    }

    #[test]
    fn remembered_wrappers_survive() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let decl = project.run_scoped(|remember| {
            let decl = file
                .node()
                .first_descendant_of_kind("lexical_declaration")
                .unwrap()
                .unwrap();
            remember.remember(&decl).unwrap();
            decl
        });
        assert!(!decl.was_forgotten());
    }

    #[test]
    fn wrappers_created_before_the_scope_are_kept() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let decl = file
            .node()
            .first_descendant_of_kind("lexical_declaration")
            .unwrap()
            .unwrap();
        project.run_scoped(|_| {
            decl.structural_children().unwrap();
        });
        assert!(!decl.was_forgotten());
    }

    #[test]
    fn scope_ending_while_busy_closes_on_next_use() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let guard = ScopeGuard::open(&project);
        let decl = file
            .node()
            .first_descendant_of_kind("lexical_declaration")
            .unwrap()
            .unwrap();
        {
            let _busy = project.borrow();
            drop(guard);
        }
        assert!(!decl.was_forgotten());

        assert_eq!(project.borrow_mut().scopes.depth(), 0);
        assert!(decl.was_forgotten());
        assert!(!file.node().was_forgotten());
    }
}
