//! Wrapper identity, forgetting and remember scopes.

use futures::executor::block_on;
use syntax_morph::{ErrorKind, MorphError, Project, Statemented};

const SOURCE: &str = "function f() {\n  let a = 1;\n}\nlet b = 2;\nlet c = 3;\n";

#[test]
fn same_node_same_wrapper() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();

    let first = file.statements().unwrap()[1].clone();
    let again = file.node().first_descendant_of_kind("lexical_declaration").unwrap().unwrap();
    // Pre-order: the declaration inside `f` comes first.
    assert_ne!(first, again);
    assert_eq!(first, file.statements().unwrap()[1]);
    assert_eq!(first.id(), file.statements().unwrap()[1].id());
}

#[test]
fn wrappers_survive_unrelated_edits() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();

    file.insert_text(0, "let z = 0;\n").unwrap();

    assert!(!b.was_forgotten());
    assert_eq!(b.text().unwrap(), "let b = 2;");
    assert_eq!(file.statements().unwrap()[2], b);
}

#[test]
fn forget_cascades_and_decrements_parent_once() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let func = file
        .node()
        .first_descendant_of_kind_or_err("function_declaration")
        .unwrap();
    let body = func.child_by_field_or_err("body").unwrap();
    let inner = body.first_descendant_of_kind_or_err("lexical_declaration").unwrap();
    let number = inner.first_descendant_of_kind_or_err("number").unwrap();

    let before = func.live_child_wrapper_count();
    body.forget();

    assert!(body.was_forgotten());
    assert!(inner.was_forgotten());
    assert!(number.was_forgotten());
    assert!(!func.was_forgotten());
    assert_eq!(func.live_child_wrapper_count(), before - 1);
}

#[test]
fn forget_is_idempotent() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();
    let count = project.live_wrapper_count();

    b.forget();
    b.forget();

    assert_eq!(project.live_wrapper_count(), count - 1);
    let err = b.text().unwrap_err();
    assert!(matches!(err, MorphError::NodeForgotten { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert!(err.to_string().contains("let b = 2;"));
}

#[test]
fn forget_descendants_keeps_the_node() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let c = file.statements().unwrap()[2].clone();
    let number = c.first_descendant_of_kind_or_err("number").unwrap();

    c.forget_descendants().unwrap();

    assert!(number.was_forgotten());
    assert!(!c.was_forgotten());
    assert_eq!(c.live_child_wrapper_count(), 0);
}

#[test]
fn scope_forgets_unremembered_wrappers() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let root = file.node().clone();

    let (kept, dropped) = project.run_scoped(|scope| {
        let statements = file.statements().unwrap();
        scope.remember(&statements[1]).unwrap();
        (statements[1].clone(), statements[2].clone())
    });

    assert!(!kept.was_forgotten());
    assert!(dropped.was_forgotten());
    assert!(!root.was_forgotten());
    assert_eq!(kept.text().unwrap(), "let b = 2;");
}

#[test]
fn wrappers_from_before_the_scope_are_untouched() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();

    project.run_scoped(|_| {
        let again = file.statements().unwrap()[1].clone();
        assert_eq!(again, b);
    });

    assert!(!b.was_forgotten());
}

#[test]
fn remembering_keeps_pending_ancestors() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();

    let (body, number) = project.run_scoped(|scope| {
        let func = file
            .node()
            .first_descendant_of_kind_or_err("function_declaration")
            .unwrap();
        let body = func.child_by_field_or_err("body").unwrap();
        let number = body.first_descendant_of_kind_or_err("number").unwrap();
        scope.remember(&number).unwrap();
        (body, number)
    });

    assert!(!number.was_forgotten());
    assert_eq!(number.parent_or_err().unwrap().kind().unwrap(), "variable_declarator");
    assert!(!body.was_forgotten());
}

#[test]
fn nested_scopes_close_independently() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();

    let (outer_node, c, inner_dropped, inner_kept) = project.run_scoped(|_| {
        let outer_node = file.statements().unwrap()[1].clone();
        let c = file.statements().unwrap()[2].clone();
        let (dropped, kept) = project.run_scoped(|inner| {
            let number = c.first_descendant_of_kind_or_err("number").unwrap();
            inner.remember(&number).unwrap();
            let identifier = outer_node.first_descendant_of_kind_or_err("identifier").unwrap();
            (identifier, number)
        });
        assert!(dropped.was_forgotten());
        assert!(!outer_node.was_forgotten());
        (outer_node, c, dropped, kept)
    });

    assert!(outer_node.was_forgotten());
    assert!(inner_dropped.was_forgotten());
    assert!(!inner_kept.was_forgotten());
    // Created by the outer scope and never remembered, but its descendant was.
    assert!(!c.was_forgotten());
    assert_eq!(c.first_descendant_of_kind("number").unwrap(), Some(inner_kept.clone()));
}

#[test]
fn remember_handles_expire_with_their_scope() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();

    let stale = project.run_scoped(|remember| remember.clone());
    let (b, result) = project.run_scoped(|_| {
        let b = file.statements().unwrap()[1].clone();
        let result = stale.remember(&b);
        (b, result)
    });

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert!(b.was_forgotten());
}

#[test]
fn remembering_a_forgotten_node_fails() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();
    b.forget();

    let result = project.run_scoped(|scope| scope.remember(&b));
    assert!(matches!(result, Err(MorphError::RememberForgotten)));
}

#[test]
fn remembering_across_projects_fails() {
    let project = Project::new();
    let other = Project::new();
    let file = other.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();

    let result = project.run_scoped(|scope| scope.remember(&b));
    assert!(matches!(result, Err(MorphError::InvalidOperation(_))));
}

#[test]
fn async_scope_cleans_up_after_completion() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let scoped_file = file.clone();

    let (kept, dropped) = block_on(project.run_scoped_async(move |scope| async move {
        let statements = scoped_file.statements().unwrap();
        futures::future::ready(()).await;
        scope.remember(&statements[2]).unwrap();
        (statements[2].clone(), statements[1].clone())
    }));

    assert!(!kept.was_forgotten());
    assert!(dropped.was_forgotten());
}

#[test]
fn removing_a_file_forgets_its_wrappers() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", SOURCE).unwrap();
    let b = file.statements().unwrap()[1].clone();

    project.remove_source_file(&file).unwrap();

    assert!(b.was_forgotten());
    assert!(file.node().was_forgotten());
    assert!(project.source_file("a.ts").is_none());
    assert_eq!(project.live_wrapper_count(), 0);
}
