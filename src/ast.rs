//! Typed views over [`Node`].
//!
//! Grammars name their kinds differently (`function_item` in Rust,
//! `function_declaration` in TypeScript), so each view lists the kinds it
//! accepts and capability traits resolve their parts through grammar field
//! names rather than positions.

use crate::edit::TextEdit;
use crate::errors::{MorphError, Result};
use crate::manipulation::{apply_edit, commit, insertion, EditDescriptor, RebindScope};
use crate::node::text::line_start;
use crate::node::Node;
use crate::config::IndentationText;
use ast_grep_language::SupportLang;
use std::path::PathBuf;

pub trait AstNode: Sized {
    fn can_cast(kind: &str) -> bool;

    fn cast(node: Node) -> Option<Self>;

    fn syntax(&self) -> &Node;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, [$($kind:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(Node);

        impl AstNode for $name {
            fn can_cast(kind: &str) -> bool {
                matches!(kind, $($kind)|+)
            }

            fn cast(node: Node) -> Option<Self> {
                let kind = node.kind().ok()?;
                Self::can_cast(kind).then(|| Self(node))
            }

            fn syntax(&self) -> &Node {
                &self.0
            }
        }
    };
}

ast_node!(
    /// A braced statement block.
    Block,
    ["block", "statement_block", "compound_statement"]
);

ast_node!(
    FunctionDecl,
    [
        "function_item",
        "function_declaration",
        "function_definition",
        "method_declaration",
        "method_definition",
    ]
);

ast_node!(
    ClassDecl,
    [
        "class_declaration",
        "class_definition",
        "struct_item",
        "impl_item",
    ]
);

/// Nodes with a `name` field.
pub trait HasName: AstNode {
    fn name_node(&self) -> Result<Option<Node>> {
        self.syntax().child_by_field("name")
    }

    fn name(&self) -> Result<String> {
        match self.name_node()? {
            Some(node) => node.text(),
            None => Err(MorphError::not_found("name")),
        }
    }

    /// Replace the name's text. Returns the new name node.
    fn rename(&self, name: &str) -> Result<Node> {
        let node = self
            .name_node()?
            .ok_or_else(|| MorphError::not_found("name"))?;
        node.replace_with_text(name)
    }
}

/// Nodes with a `body` field.
pub trait HasBody: AstNode {
    fn body(&self) -> Result<Option<Node>> {
        self.syntax().child_by_field("body")
    }

    fn body_or_err(&self) -> Result<Node> {
        self.body()?.ok_or_else(|| MorphError::not_found("body"))
    }
}

/// Containers of statements: a source file or a block.
pub trait Statemented: AstNode {
    fn statements(&self) -> Result<Vec<Node>> {
        match self.syntax().child_syntax_list()? {
            Some(list) => list.structural_children(),
            None => self.syntax().structural_children(),
        }
    }

    /// Insert statements at `index`, separated the way the existing ones
    /// are. Returns the inserted statements.
    fn insert_statements(&self, index: usize, statements: &[&str]) -> Result<Vec<Node>> {
        insertion::insert_statements(self.syntax(), index, statements)
    }

    fn add_statements(&self, statements: &[&str]) -> Result<Vec<Node>> {
        let count = self.statements()?.len();
        self.insert_statements(count, statements)
    }

    fn remove_statement(&self, index: usize) -> Result<()> {
        let statements = self.statements()?;
        let count = statements.len();
        let statement = statements.into_iter().nth(index).ok_or(MorphError::OutOfRange {
            what: "statement index",
            pos: index,
            min: 0,
            max: count.saturating_sub(1),
        })?;
        statement.remove()
    }
}

impl HasName for FunctionDecl {}
impl HasBody for FunctionDecl {}
impl HasName for ClassDecl {}
impl HasBody for ClassDecl {}
impl Statemented for Block {}

/// Root of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile(Node);

impl AstNode for SourceFile {
    fn can_cast(_kind: &str) -> bool {
        true
    }

    fn cast(node: Node) -> Option<Self> {
        node.is_source_file().ok()?.then(|| Self(node))
    }

    fn syntax(&self) -> &Node {
        &self.0
    }
}

impl Statemented for SourceFile {}

impl SourceFile {
    pub(crate) fn from_node(node: Node) -> Self {
        Self(node)
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn path(&self) -> Result<PathBuf> {
        self.0.key()?;
        self.0.project().path_of(self.0.file_id())
    }

    pub fn language(&self) -> Result<SupportLang> {
        self.0.language()
    }

    pub fn full_text(&self) -> Result<String> {
        self.0.with_tree(|tree, _| tree.text().to_string())
    }

    pub fn text_len(&self) -> Result<usize> {
        self.0.with_tree(|tree, _| tree.text().len())
    }

    pub fn functions(&self) -> Result<Vec<FunctionDecl>> {
        Ok(self
            .0
            .descendants()?
            .into_iter()
            .filter_map(FunctionDecl::cast)
            .collect())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        let len = self.text_len()?;
        if end > len {
            return Err(MorphError::OutOfRange {
                what: "end position",
                pos: end,
                min: start,
                max: len,
            });
        }
        if start > end {
            return Err(MorphError::OutOfRange {
                what: "start position",
                pos: start,
                min: 0,
                max: end,
            });
        }
        let split = self.0.with_tree(|tree, _| {
            [start, end]
                .into_iter()
                .find(|&pos| !tree.text().is_char_boundary(pos))
        })?;
        if let Some(pos) = split {
            return Err(MorphError::InvalidOperation(format!(
                "position {pos} is inside a multi-byte character"
            )));
        }
        Ok(())
    }

    pub fn insert_text(&self, pos: usize, text: &str) -> Result<()> {
        self.replace_text(pos, pos, text)
    }

    /// Replace `[start, end)` of the file's text. Wrappers whose tokens
    /// overlap the range are forgotten; the rest are rebound.
    pub fn replace_text(&self, start: usize, end: usize, text: &str) -> Result<()> {
        self.check_range(start, end)?;
        apply_edit(EditDescriptor::replace(&self.0, start, end - start, text))?;
        Ok(())
    }

    pub fn remove_text(&self, start: usize, end: usize) -> Result<()> {
        self.replace_text(start, end, "")
    }

    /// Indent every non-blank line touching `[start, end]` by `times`
    /// levels. Lines that begin inside a string literal are left alone.
    pub fn indent(&self, start: usize, end: usize, times: usize) -> Result<()> {
        let unit = self.indentation_unit();
        self.edit_lines(start, end, |line| {
            (!line.trim().is_empty()).then(|| (0, unit.as_str().repeat(times)))
        })
    }

    /// Remove up to `times` indentation levels from every line touching
    /// `[start, end]`. A level is a tab or one unit of spaces.
    pub fn unindent(&self, start: usize, end: usize, times: usize) -> Result<()> {
        let width = match self.indentation_unit() {
            IndentationText::Tab => 4,
            unit => unit.as_str().len(),
        };
        self.edit_lines(start, end, |line| {
            let mut removed = 0;
            for _ in 0..times {
                let rest = &line[removed..];
                if rest.starts_with('\t') {
                    removed += 1;
                } else {
                    let spaces = rest.len() - rest.trim_start_matches(' ').len();
                    if spaces == 0 {
                        break;
                    }
                    removed += spaces.min(width);
                }
            }
            (removed > 0).then(|| (removed, String::new()))
        })
    }

    fn indentation_unit(&self) -> IndentationText {
        self.0.project().settings().manipulation.indentation
    }

    /// Build one edit per line from `f(line) -> (replaced prefix len, text)`.
    fn edit_lines(
        &self,
        start: usize,
        end: usize,
        mut f: impl FnMut(&str) -> Option<(usize, String)>,
    ) -> Result<()> {
        self.check_range(start, end)?;
        let text = self.full_text()?;
        let strings = self.0.string_spans()?;

        let mut edits = Vec::new();
        let mut line = line_start(&text, start);
        loop {
            let line_end = text[line..].find('\n').map_or(text.len(), |i| line + i);
            let in_string = strings.iter().any(|&(s, e)| s < line && line < e);
            if !in_string {
                if let Some((replaced, new_text)) = f(&text[line..line_end]) {
                    edits.push(TextEdit::new(line, line + replaced, new_text));
                }
            }
            if line_end >= text.len() || line_end >= end {
                break;
            }
            line = line_end + 1;
        }
        if edits.is_empty() {
            return Ok(());
        }
        commit(
            self.0.project(),
            self.0.file_id(),
            edits,
            RebindScope::Containing,
        )
    }
}
