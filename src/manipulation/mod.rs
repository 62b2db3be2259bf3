//! Text-range manipulation: splice the text, reparse the whole file, then
//! reconcile the wrappers that were alive before the edit.
//!
//! Every mutation in the crate ends in [`commit`], so wrappers observe the
//! same rebinding rules whether they were edited through [`apply_edit`], a
//! [`Node`] helper or a transform.

pub(crate) mod insertion;
pub(crate) mod reconcile;

use crate::edit::TextEdit;
use crate::errors::{MorphError, Result};
use crate::node::Node;
use crate::pool;
use crate::project::forget::snapshot_text;
use crate::project::{FileId, Project, ProjectState};
use crate::ts::{NodeIndex, ParseTree};
use reconcile::{regions_of, Reconciler, Region};
use std::collections::HashMap;
use tracing::{debug, trace};

pub(crate) use reconcile::RebindScope;

/// One logical text change relative to a parent node.
#[derive(Debug, Clone)]
pub struct EditDescriptor {
    pub parent: Node,
    pub insert_pos: usize,
    pub new_text: String,
    /// Bytes replaced starting at `insert_pos`; zero for a pure insertion.
    pub replacing_len: usize,
}

impl EditDescriptor {
    pub fn insert(parent: &Node, insert_pos: usize, new_text: impl Into<String>) -> Self {
        Self {
            parent: parent.clone(),
            insert_pos,
            new_text: new_text.into(),
            replacing_len: 0,
        }
    }

    pub fn replace(
        parent: &Node,
        insert_pos: usize,
        replacing_len: usize,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.clone(),
            insert_pos,
            new_text: new_text.into(),
            replacing_len,
        }
    }
}

/// Where new content landed after an edit.
#[derive(Debug, Clone)]
pub struct InsertedRange {
    /// The edited parent, rebound to the new tree.
    pub parent: Node,
    /// Index among the parent's children where the new content begins.
    pub index: usize,
    /// The parent's children lying entirely inside the inserted text.
    pub nodes: Vec<Node>,
}

impl InsertedRange {
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Inserted named nodes; an inserted syntax list contributes its
    /// structural children.
    pub fn named(&self) -> Vec<Node> {
        let mut out = Vec::new();
        for node in &self.nodes {
            if node.is_syntax_list().unwrap_or(false) {
                out.extend(node.structural_children().unwrap_or_default());
            } else if node.is_named().unwrap_or(false) {
                out.push(node.clone());
            }
        }
        out
    }
}

/// Splice `descriptor.new_text` into the parent's span and reparse.
pub fn apply_edit(descriptor: EditDescriptor) -> Result<InsertedRange> {
    let EditDescriptor {
        parent,
        insert_pos,
        new_text,
        replacing_len,
    } = descriptor;

    let (pos, end) = parent.with_tree(|tree, index| {
        let node = tree.node(index);
        (node.pos, node.end)
    })?;
    if insert_pos < pos || insert_pos > end {
        return Err(MorphError::OutOfRange {
            what: "insert position",
            pos: insert_pos,
            min: pos,
            max: end,
        });
    }
    if replacing_len > end - insert_pos {
        return Err(MorphError::OutOfRange {
            what: "replaced length",
            pos: replacing_len,
            min: 0,
            max: end - insert_pos,
        });
    }

    let inserted_len = new_text.len();
    let edit = TextEdit::new(insert_pos, insert_pos + replacing_len, new_text);
    commit(
        parent.project(),
        parent.file_id(),
        vec![edit],
        RebindScope::Ancestors(parent.index()?),
    )?;

    if parent.was_forgotten() {
        return Err(MorphError::NotImplemented(
            "the edited parent has no counterpart in the reparsed tree".to_string(),
        ));
    }
    let (index, inside) = parent.with_tree(|tree, index| {
        inserted_children(tree, index, insert_pos, insert_pos + inserted_len)
    })?;
    let nodes = parent.wrap_all(&inside)?;
    Ok(InsertedRange {
        parent,
        index,
        nodes,
    })
}

fn inserted_children(
    tree: &ParseTree,
    parent: NodeIndex,
    from: usize,
    to: usize,
) -> (usize, Vec<NodeIndex>) {
    let children = tree.children(parent);
    let inside: Vec<NodeIndex> = children
        .iter()
        .copied()
        .filter(|&c| {
            let node = tree.node(c);
            node.start >= from && node.end <= to && node.end > node.start
        })
        .collect();
    let index = match inside.first() {
        Some(first) => children.iter().position(|c| c == first).unwrap_or(0),
        None => children
            .iter()
            .take_while(|&&c| tree.node(c).end <= from)
            .count(),
    };
    (index, inside)
}

/// Apply `edits` to the file's text, reparse it and reconcile wrappers.
pub(crate) fn commit(
    project: &Project,
    file: FileId,
    edits: Vec<TextEdit>,
    scope: RebindScope,
) -> Result<()> {
    let (new_text, language) = {
        let state = project.borrow();
        let tree = &state.file(file)?.tree;
        (TextEdit::apply_batch(tree.text(), &edits)?, tree.language())
    };
    let new_tree = pool::with_parser(language, |parser| parser.parse(&new_text))??;
    if new_tree.has_errors() {
        trace!(errors = new_tree.error_spans().len(), "reparsed text has syntax errors");
    }
    let regions = regions_of(&edits);
    project.borrow_mut().replace_tree(file, new_tree, &regions, scope)
}

impl ProjectState {
    fn replace_tree(
        &mut self,
        file: FileId,
        new_tree: ParseTree,
        regions: &[Region],
        scope: RebindScope,
    ) -> Result<()> {
        let snapshot_len = self.settings.manipulation.forgotten_text_len;
        let text_len = new_tree.text().len();
        let old_tree = std::mem::replace(&mut self.file_mut(file)?.tree, new_tree);
        let wrappers = self.cache.take_file(file);

        let matches = {
            let new_tree = &self.file(file)?.tree;
            Reconciler::new(&old_tree, new_tree, regions, scope, wrappers.keys().copied()).run()
        };

        let mut rebound = HashMap::with_capacity(wrappers.len());
        let mut forgotten = 0;
        for (index, cell) in wrappers {
            match matches.get(&index) {
                Some(&new_index) => {
                    cell.rebind(new_index);
                    rebound.insert(new_index, cell);
                }
                None => {
                    cell.detach(Some(snapshot_text(&old_tree, index, snapshot_len)));
                    trace!(id = cell.id.get(), "wrapper forgotten by reparse");
                    forgotten += 1;
                }
            }
        }
        let rebound_count = rebound.len();
        self.cache.put_file(file, rebound);
        self.recount(file);
        debug!(
            file = ?file,
            text_len,
            regions = regions.len(),
            rebound = rebound_count,
            forgotten,
            "commit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Project;

    #[test]
    fn out_of_range_positions_are_rejected() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 2;").unwrap();
        let first = file.node().structural_children().unwrap()[0].clone();

        let err = apply_edit(EditDescriptor::insert(&first, 15, "x")).unwrap_err();
        assert!(matches!(err, MorphError::OutOfRange { min: 0, max: 10, .. }));

        let err = apply_edit(EditDescriptor::replace(&first, 8, 5, "x")).unwrap_err();
        assert!(matches!(err, MorphError::OutOfRange { max: 2, .. }));
        assert_eq!(file.full_text().unwrap(), "let a = 1;\nlet b = 2;");
    }

    #[test]
    fn wrappers_outside_the_edit_are_rebound() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 2;").unwrap();
        let stmts = file.node().structural_children().unwrap();
        let list = stmts[0].parent_syntax_list().unwrap().unwrap();

        let inserted = apply_edit(EditDescriptor::insert(&list, 0, "let z = 0;\n")).unwrap();
        assert_eq!(inserted.index, 0);
        assert_eq!(inserted.nodes.len(), 1);
        assert_eq!(inserted.nodes[0].text().unwrap(), "let z = 0;");

        assert!(!stmts[0].was_forgotten());
        assert_eq!(stmts[1].text().unwrap(), "let b = 2;");
        assert_eq!(stmts[1].start().unwrap(), 22);
        assert_eq!(list.live_child_wrapper_count(), 3);
    }

    #[test]
    fn replaced_nodes_are_forgotten() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
        let number = file.node().first_descendant_of_kind_or_err("number").unwrap();
        let decl = file.node().first_descendant_of_kind_or_err("lexical_declaration").unwrap();
        let declarator = number.parent_or_err().unwrap();

        apply_edit(EditDescriptor::replace(&declarator, 8, 1, "42")).unwrap();
        assert!(number.was_forgotten());
        assert!(!declarator.was_forgotten());
        assert!(!decl.was_forgotten());
        assert_eq!(decl.text().unwrap(), "let a = 42;");
    }

    #[test]
    fn removal_reports_the_insertion_index() {
        let project = Project::new();
        let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 2;").unwrap();
        let list = file.node().child_syntax_list_or_err().unwrap();

        let result = apply_edit(EditDescriptor::replace(&list, 10, 11, "")).unwrap();
        assert!(result.nodes.is_empty());
        assert_eq!(result.index, 1);
        assert_eq!(file.full_text().unwrap(), "let a = 1;");
    }
}
