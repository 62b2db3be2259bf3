//! Syntax Morph: long-lived node handles over tree-sitter parse trees
//!
//! Parse trees are immutable; every edit produces a new one. This crate keeps
//! stable [`Node`] handles across those edits. Each parse node gets at most
//! one wrapper, and after a commit the wrappers are rebound to the equivalent
//! nodes of the new tree or forgotten.
//!
//! # Architecture
//!
//! All manipulation compiles down to byte-span replacements ([`TextEdit`])
//! applied to the file text, followed by a full reparse and a reconciliation
//! pass. Intelligence lives in producing the spans (statement insertion,
//! list items, removal, transforms), not in the commit.
//!
//! # Lifecycle
//!
//! - Wrappers are created lazily on navigation and cached per parse node.
//! - [`Node::forget`] and [`Node::forget_descendants`] release them early.
//! - [`Project::run_scoped`] forgets everything created inside the block
//!   that was not [`Remember::remember`]ed.
//!
//! # Example
//!
//! ```no_run
//! use syntax_morph::{Project, Statemented};
//!
//! let project = Project::new();
//! let file = project.create_source_file("main.ts", "const a = 1;\n")?;
//! let decl = file.statements()?.remove(0);
//! file.insert_statements(0, &["import \"./setup\";"])?;
//! assert_eq!(decl.text()?, "const a = 1;");
//! # Ok::<(), syntax_morph::MorphError>(())
//! ```

pub mod ast;
pub mod config;
pub mod edit;
pub mod errors;
pub mod manipulation;
pub mod node;
pub mod pool;
pub mod project;
pub mod sg;
pub mod transform;
pub mod ts;

// Re-exports
pub use ast::{AstNode, Block, ClassDecl, FunctionDecl, HasBody, HasName, SourceFile, Statemented};
pub use config::{load_from_path, load_from_str, ConfigError, ProjectSettings};
pub use edit::{EditError, TextEdit};
pub use errors::{ErrorKind, MorphError, Result};
pub use manipulation::{apply_edit, EditDescriptor, InsertedRange};
pub use node::{Node, PatternHit, TextRange, TraversalControl};
pub use project::{Project, Remember, WrapperId};
pub use sg::{AstGrepError, PatternMatcher};
pub use transform::{Printer, SourcePrinter, TransformControl, TransformNode};
pub use ts::{LanguageParser, QueryEngine, TreeSitterError};
