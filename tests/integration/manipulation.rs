//! Text-range manipulation: splices, reparses and the wrappers that outlive
//! them.

use proptest::prelude::*;
use syntax_morph::{
    apply_edit, AstNode, Block, EditDescriptor, ErrorKind, MorphError, Project, Statemented,
};

#[test]
fn import_inserted_between_imports() {
    let project = Project::new();
    let file = project
        .create_source_file("main.ts", "import \"./file1\"; import \"./file3\";")
        .unwrap();
    let first = file.statements().unwrap()[0].clone();
    let third = file.statements().unwrap()[1].clone();

    let inserted = file.insert_statements(1, &["import \"./file2\";"]).unwrap();

    assert_eq!(
        file.full_text().unwrap(),
        "import \"./file1\"; import \"./file2\"; import \"./file3\";"
    );
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].text().unwrap(), "import \"./file2\";");
    let statements = file.statements().unwrap();
    assert_eq!(statements[0], first);
    assert_eq!(statements[1], inserted[0]);
    assert_eq!(statements[2], third);
}

#[test]
fn edit_descriptor_reports_the_inserted_range() {
    let project = Project::new();
    let file = project
        .create_source_file("main.ts", "import \"./file1\"; import \"./file3\";")
        .unwrap();
    let list = file.node().child_syntax_list_or_err().unwrap();

    let inserted = apply_edit(EditDescriptor::insert(&list, 18, "import \"./file2\"; ")).unwrap();

    assert_eq!(inserted.index, 1);
    assert_eq!(inserted.first().unwrap().text().unwrap(), "import \"./file2\";");
    assert_eq!(inserted.parent, list);
}

#[test]
fn statements_inserted_at_an_index() {
    let project = Project::new();
    let file = project
        .create_source_file("a.ts", "let a = 1;\nlet d = 4;")
        .unwrap();
    let d = file.statements().unwrap()[1].clone();

    let inserted = file.insert_statements(1, &["let b = 2;", "let c = 3;"]).unwrap();

    assert_eq!(
        file.full_text().unwrap(),
        "let a = 1;\nlet b = 2;\nlet c = 3;\nlet d = 4;"
    );
    let texts: Vec<_> = inserted.iter().map(|n| n.text().unwrap()).collect();
    assert_eq!(texts, vec!["let b = 2;", "let c = 3;"]);
    assert_eq!(d.child_index().unwrap(), 3);
}

#[test]
fn statements_follow_block_indentation() {
    let project = Project::new();
    let file = project
        .create_source_file("a.ts", "function f() {\n    a();\n}\n")
        .unwrap();
    let body = file
        .node()
        .first_descendant_of_kind_or_err("statement_block")
        .unwrap();
    let block = Block::cast(body).unwrap();

    block.insert_statements(0, &["b();"]).unwrap();
    assert_eq!(file.full_text().unwrap(), "function f() {\n    b();\n    a();\n}\n");
}

#[test]
fn statement_index_is_checked() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
    let err = file.insert_statements(3, &["let b = 2;"]).unwrap_err();
    assert!(matches!(err, MorphError::OutOfRange { pos: 3, max: 1, .. }));
    assert_eq!(file.full_text().unwrap(), "let a = 1;");
}

#[test]
fn replace_with_text_returns_the_new_node() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "let a = 1;\nlet b = 2;").unwrap();
    let b = file.statements().unwrap()[1].clone();
    let number = file.statements().unwrap()[0]
        .first_descendant_of_kind_or_err("number")
        .unwrap();

    let replaced = number.replace_with_text("\"one\"").unwrap();

    assert_eq!(replaced.kind().unwrap(), "string");
    assert_eq!(replaced.text().unwrap(), "\"one\"");
    assert!(number.was_forgotten());
    assert_eq!(b.text().unwrap(), "let b = 2;");
    assert_eq!(file.full_text().unwrap(), "let a = \"one\";\nlet b = 2;");
}

#[test]
fn list_items_keep_their_commas_right() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "let xs = [1, 2, 3];").unwrap();
    let array = file.node().first_descendant_of_kind_or_err("array").unwrap();
    let two = array.structural_children().unwrap()[1].clone();

    two.remove().unwrap();
    assert_eq!(file.full_text().unwrap(), "let xs = [1, 3];");
    assert!(two.was_forgotten());

    let added = array.add_list_items(&["4"]).unwrap();
    assert_eq!(added[0].text().unwrap(), "4");
    assert_eq!(file.full_text().unwrap(), "let xs = [1, 3, 4];");
}

#[test]
fn whitespace_helpers_reject_text() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
    let decl = file.statements().unwrap()[0].clone();

    let err = decl.prepend_whitespace("x").unwrap_err();
    assert!(matches!(err, MorphError::NonWhitespace { .. }));

    decl.prepend_whitespace("\n").unwrap();
    assert_eq!(file.full_text().unwrap(), "\nlet a = 1;");
    assert_eq!(decl.start().unwrap(), 1);
}

#[test]
fn removing_the_root_is_invalid() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "let a = 1;").unwrap();
    let err = file.node().remove().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

fn statement(name: &str) -> String {
    format!("let v_{name} = 1;")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn inserted_statements_land_in_order(
        names in prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..5),
        new_name in "[a-z][a-z0-9]{0,5}",
        index in 0usize..5,
    ) {
        let index = index.min(names.len());
        let mut lines: Vec<String> = names.iter().map(|n| statement(n)).collect();

        let project = Project::new();
        let file = project.create_source_file("a.ts", lines.join("\n")).unwrap();
        let before = file.statements().unwrap();

        let new_statement = statement(&new_name);
        let inserted = file.insert_statements(index, &[new_statement.as_str()]).unwrap();
        lines.insert(index, new_statement.clone());

        prop_assert_eq!(file.full_text().unwrap(), lines.join("\n"));
        prop_assert_eq!(inserted.len(), 1);
        prop_assert_eq!(inserted[0].text().unwrap(), new_statement);
        for (i, node) in before.iter().enumerate() {
            prop_assert!(!node.was_forgotten());
            prop_assert_eq!(node.text().unwrap(), statement(&names[i]));
        }
    }
}
