use crate::transform::printer::Printer;
use crate::ts::{NodeIndex, ParseTree};
use std::rc::Rc;

enum Repr {
    /// A node of the tree being transformed, untouched.
    Original { index: NodeIndex },
    /// An original node with some structural children replaced.
    Updated {
        index: NodeIndex,
        children: Vec<(NodeIndex, TransformNode)>,
    },
    /// A node built by the visitor.
    Synthetic { kind: String, text: String },
}

struct Inner {
    tree: Option<Rc<ParseTree>>,
    repr: Repr,
}

/// A node seen or produced during a transform. Clones share identity, which
/// is how the engine tells "returned unchanged" from "replaced".
#[derive(Clone)]
pub struct TransformNode(Rc<Inner>);

impl std::fmt::Debug for TransformNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.repr {
            Repr::Original { index } => write!(f, "Original({} #{})", self.kind(), index.index()),
            Repr::Updated { index, children } => write!(
                f,
                "Updated({} #{}, {} replaced)",
                self.kind(),
                index.index(),
                children.len()
            ),
            Repr::Synthetic { kind, text } => write!(f, "Synthetic({kind} {text:?})"),
        }
    }
}

impl TransformNode {
    pub(crate) fn original(tree: Rc<ParseTree>, index: NodeIndex) -> Self {
        Self(Rc::new(Inner {
            tree: Some(tree),
            repr: Repr::Original { index },
        }))
    }

    pub(crate) fn updated(
        tree: Rc<ParseTree>,
        index: NodeIndex,
        children: Vec<(NodeIndex, TransformNode)>,
    ) -> Self {
        Self(Rc::new(Inner {
            tree: Some(tree),
            repr: Repr::Updated { index, children },
        }))
    }

    /// A new node of `kind` whose source text is `text`.
    pub fn synthetic(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self(Rc::new(Inner {
            tree: None,
            repr: Repr::Synthetic {
                kind: kind.into(),
                text: text.into(),
            },
        }))
    }

    pub fn same(&self, other: &TransformNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The tree node this one stands for, unless synthetic.
    pub(crate) fn origin(&self) -> Option<NodeIndex> {
        match self.0.repr {
            Repr::Original { index } | Repr::Updated { index, .. } => Some(index),
            Repr::Synthetic { .. } => None,
        }
    }

    pub(crate) fn tree(&self) -> Option<&Rc<ParseTree>> {
        self.0.tree.as_ref()
    }

    pub fn kind(&self) -> &str {
        match (&self.0.repr, &self.0.tree) {
            (Repr::Synthetic { kind, .. }, _) => kind,
            (Repr::Original { index } | Repr::Updated { index, .. }, Some(tree)) => {
                tree.node(*index).kind
            }
            _ => "",
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.0.repr, Repr::Synthetic { .. })
    }

    pub fn is_updated(&self) -> bool {
        matches!(self.0.repr, Repr::Updated { .. })
    }

    /// Text before any replacement, or the synthetic text.
    pub fn original_text(&self) -> String {
        match (&self.0.repr, &self.0.tree) {
            (Repr::Synthetic { text, .. }, _) => text.clone(),
            (Repr::Original { index } | Repr::Updated { index, .. }, Some(tree)) => {
                tree.node_text(*index).to_string()
            }
            _ => String::new(),
        }
    }

    /// Render with `printer` handling synthetic nodes; original text is
    /// copied around replaced children.
    pub fn print(&self, printer: &dyn Printer) -> String {
        match (&self.0.repr, &self.0.tree) {
            (Repr::Synthetic { kind, text }, _) => printer.print(kind, text),
            (Repr::Original { index }, Some(tree)) => tree.node_text(*index).to_string(),
            (Repr::Updated { index, children }, Some(tree)) => {
                let node = tree.node(*index);
                let text = tree.text();
                let mut out = String::new();
                let mut cursor = node.start;
                for (child, replacement) in children {
                    let child = tree.node(*child);
                    out.push_str(&text[cursor..child.start]);
                    out.push_str(&replacement.print(printer));
                    cursor = child.end;
                }
                out.push_str(&text[cursor..node.end]);
                out
            }
            _ => String::new(),
        }
    }
}
