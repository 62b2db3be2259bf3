//! Callback traversal with stop, skip and up.

use syntax_morph::Project;

const SOURCE: &str = r#"
fn first(a: u32) -> u32 {
    let doubled = a * 2;
    doubled + 1
}

fn second() {
    first(1);
    first(2);
}
"#;

#[test]
fn stop_on_third_visit() {
    let project = Project::new();
    let file = project.create_source_file("lib.rs", SOURCE).unwrap();
    let mut visited = 0;

    file.node()
        .for_each_descendant(|_, control| {
            visited += 1;
            if visited == 3 {
                control.stop();
            }
            None::<()>
        })
        .unwrap();

    assert_eq!(visited, 3);
    assert!(file.node().descendants().unwrap().len() > 3);
}

#[test]
fn skip_prunes_function_bodies() {
    let project = Project::new();
    let file = project.create_source_file("lib.rs", SOURCE).unwrap();
    let mut kinds = Vec::new();

    file.node()
        .for_each_descendant(|node, control| {
            let kind = node.kind().unwrap();
            kinds.push(kind);
            if kind == "block" {
                control.skip();
            }
            None::<()>
        })
        .unwrap();

    assert_eq!(kinds.iter().filter(|k| **k == "block").count(), 2);
    assert!(!kinds.contains(&"let_declaration"));
    assert!(!kinds.contains(&"call_expression"));
}

#[test]
fn found_value_ends_the_walk() {
    let project = Project::new();
    let file = project.create_source_file("lib.rs", SOURCE).unwrap();

    let call = file
        .node()
        .for_each_descendant(|node, _| {
            (node.kind().ok()? == "call_expression").then(|| node.clone())
        })
        .unwrap()
        .unwrap();

    assert_eq!(call.text().unwrap(), "first(1)");
}

#[test]
fn edits_during_a_walk_skip_forgotten_nodes() {
    let project = Project::new();
    let file = project.create_source_file("lib.rs", SOURCE).unwrap();
    let mut calls = Vec::new();

    file.node()
        .for_each_descendant(|node, control| {
            if node.kind().unwrap() == "call_expression" {
                calls.push(node.text().unwrap());
                if calls.len() == 1 {
                    // Removes the sibling statement the walk has not reached yet.
                    let statement = node.parent_or_err().unwrap();
                    statement.next_sibling_or_err().unwrap().remove().unwrap();
                }
                control.skip();
            }
            None::<()>
        })
        .unwrap();

    assert_eq!(calls, vec!["first(1)"]);
    assert!(!file.full_text().unwrap().contains("first(2)"));
}
