//! Go source extraction with tree-sitter.
//!
//! This subsystem turns one `.go` file into a syntax summary the rest of
//! the analyzer works from:
//! - package clause and imports
//! - every function and method declaration, with receiver, parameter and
//!   local-variable types, and the leading documentation comment
//! - every call expression inside each declaration body, with its shape
//!   (bare identifier, selector chain, literal receiver) and any comment
//!   groups attached to the call site
//!
//! Call-tree construction never touches tree-sitter nodes; it runs over
//! this summary, so parsed trees can be dropped as soon as a file is
//! extracted.

mod ast;
mod parser;

pub use ast::{CallSite, CallTarget, FuncDecl, GoFile, Import, Receiver, TypeRef, VarBinding};
pub use parser::GoParser;
