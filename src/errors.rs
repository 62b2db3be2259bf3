use crate::config::ConfigError;
use crate::edit::EditError;
use crate::sg::AstGrepError;
use crate::ts::TreeSitterError;
use thiserror::Error;

/// Broad classification of a [`MorphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The call is not valid in the current state (removed node, bad range, ...).
    InvalidOperation,
    /// The tree had a shape the operation does not know how to handle.
    NotImplemented,
    /// A required node does not exist.
    NotFound,
    /// The parser collaborator failed.
    Parse,
    Config,
}

#[derive(Error, Debug)]
pub enum MorphError {
    #[error("attempted to get information from a node that was removed or forgotten{}", forgotten_suffix(.text))]
    NodeForgotten { text: Option<String> },

    #[error("cannot remember a node that was removed or forgotten")]
    RememberForgotten,

    #[error("{what} {pos} is outside the range [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        pos: usize,
        min: usize,
        max: usize,
    },

    #[error("cannot insert non-whitespace text {text:?} where only whitespace is allowed")]
    NonWhitespace { text: String },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("{what} not found{}", suggestion_suffix(.suggestion))]
    NotFound {
        what: String,
        suggestion: Option<String>,
    },

    #[error("unknown source file {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Parse(#[from] TreeSitterError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Pattern(#[from] AstGrepError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn forgotten_suffix(text: &Option<String>) -> String {
    match text {
        Some(text) => format!("\n\nNode text: {text}"),
        None => String::new(),
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(kind) => format!(" (did you mean `{kind}`?)"),
        None => String::new(),
    }
}

impl MorphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorphError::NodeForgotten { .. }
            | MorphError::RememberForgotten
            | MorphError::OutOfRange { .. }
            | MorphError::NonWhitespace { .. }
            | MorphError::InvalidOperation(_)
            | MorphError::UnknownFile(_)
            | MorphError::Edit(_) => ErrorKind::InvalidOperation,
            MorphError::NotImplemented(_) => ErrorKind::NotImplemented,
            MorphError::NotFound { .. } => ErrorKind::NotFound,
            MorphError::Parse(_) | MorphError::Pattern(_) => ErrorKind::Parse,
            MorphError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        MorphError::NotFound {
            what: what.into(),
            suggestion: None,
        }
    }
}

pub type Result<T, E = MorphError> = std::result::Result<T, E>;
