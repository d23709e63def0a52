//! Call-tree construction.
//!
//! Two halves, cleanly separated:
//! - [`classify`] decides what kind of callee a call expression names,
//!   combining AST shape with the type oracle
//! - [`TreeBuilder`] drives the depth-bounded, visited-aware traversal
//!   from an entry function, resolving classified calls against the
//!   registry and fabricating placeholders for everything else
//!
//! Unresolved calls are a first-class output, never an error.

mod builder;
mod classify;

pub use builder::TreeBuilder;
pub use classify::{classify, CallClass};
