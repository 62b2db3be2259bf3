use thiserror::Error;

/// Failures of metavariable pattern lookups.
#[derive(Error, Debug)]
pub enum AstGrepError {
    #[error("pattern matched {count} nodes where exactly one was expected")]
    AmbiguousMatch { count: usize },

    #[error("pattern matched no nodes")]
    NoMatch,

    #[error("match has no metavariable `${name}`")]
    MetavarNotFound { name: String },
}
