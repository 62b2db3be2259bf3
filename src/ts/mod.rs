//! Parser collaborator: tree-sitter grammars flattened into arena trees.
//!
//! Nothing outside this module touches tree-sitter nodes directly; the rest of
//! the crate works with [`ParseTree`] and [`NodeIndex`].

pub mod errors;
pub mod parser;
pub mod query;
pub mod tree;

pub use errors::TreeSitterError;
pub use parser::{language_for_path, LanguageParser};
pub use query::{QueryEngine, QueryMatch};
pub use tree::{
    is_known_kind, is_token_kind, named_kinds, CommentKind, CommentSpan, NodeIndex, ParseNode,
    ParseTree, SYNTAX_LIST,
};
