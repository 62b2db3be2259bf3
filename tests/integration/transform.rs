//! Multi-span transforms over whole files.

use std::cell::RefCell;
use syntax_morph::{Project, Statemented, TransformNode};

#[test]
fn numeric_literal_becomes_string() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "const num1 = 1;").unwrap();
    let statement = file.statements().unwrap()[0].clone();
    let literal = statement.first_descendant_of_kind_or_err("number").unwrap();

    file.node()
        .transform(|ctl| {
            let node = ctl.visit_children();
            if node.kind() == "number" {
                return ctl.string_literal(&node.original_text());
            }
            node
        })
        .unwrap();

    assert_eq!(file.full_text().unwrap(), "const num1 = \"1\";");
    assert!(!statement.was_forgotten());
    assert_eq!(statement.text().unwrap(), "const num1 = \"1\";");
    assert!(literal.was_forgotten());
}

#[test]
fn untouched_text_is_preserved() {
    let project = Project::new();
    let source = "// header\nfoo(1);   // one\n\n/* two */ foo(2);\n";
    let file = project.create_source_file("a.ts", source).unwrap();

    file.node()
        .transform(|ctl| {
            let node = ctl.visit_children();
            if node.kind() == "identifier" && node.original_text() == "foo" {
                return TransformNode::synthetic("identifier", "bar");
            }
            node
        })
        .unwrap();

    assert_eq!(
        file.full_text().unwrap(),
        "// header\nbar(1);   // one\n\n/* two */ bar(2);\n"
    );
}

#[test]
fn transform_of_a_subtree_returns_its_replacement() {
    let project = Project::new();
    let file = project
        .create_source_file("a.ts", "let a = 1;\nlet b = 2;\nlet c = 3;")
        .unwrap();
    let statements = file.statements().unwrap();
    let (a, b, c) = (
        statements[0].clone(),
        statements[1].clone(),
        statements[2].clone(),
    );

    let result = b
        .transform(|ctl| {
            let node = ctl.visit_children();
            if node.kind() == "lexical_declaration" {
                return TransformNode::synthetic("expression_statement", "b();");
            }
            node
        })
        .unwrap();

    assert_eq!(file.full_text().unwrap(), "let a = 1;\nb();\nlet c = 3;");
    assert_eq!(result.kind().unwrap(), "expression_statement");
    assert!(b.was_forgotten());
    assert!(!a.was_forgotten());
    assert_eq!(c.text().unwrap(), "let c = 3;");
}

#[test]
fn visitor_sees_updated_children() {
    let project = Project::new();
    let file = project.create_source_file("a.ts", "f(1, 2);").unwrap();
    let seen = RefCell::new(Vec::new());

    file.node()
        .transform(|ctl| {
            let node = ctl.visit_children();
            if node.is_updated() {
                seen.borrow_mut().push(node.kind().to_string());
            }
            if node.kind() == "number" && node.original_text() == "2" {
                return TransformNode::synthetic("number", "3");
            }
            node
        })
        .unwrap();

    assert_eq!(file.full_text().unwrap(), "f(1, 3);");
    assert_eq!(
        seen.into_inner(),
        vec!["arguments", "call_expression", "expression_statement", "program"]
    );
}
