//! Cross-module behavior of the node wrappers: lifecycle, manipulation,
//! transforms and traversal over real grammars.

mod lifecycle;
mod manipulation;
mod transform;
mod traversal;
