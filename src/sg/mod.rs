//! ast-grep integration for metavariable patterns.
//!
//! Patterns use ast-grep's syntax (`$NAME`, `$$$BODY`, `$_`). Matches are
//! reported as byte spans plus kinds; the node layer maps them back onto
//! wrappers of the current parse tree.

pub mod errors;
pub mod matcher;

pub use errors::AstGrepError;
pub use matcher::{PatternMatch, PatternMatcher};
