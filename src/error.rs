//! Error taxonomy for flowmap.
//!
//! Structural errors (`NotAProject`, `UnknownPackage`, `UnknownFunction`)
//! surface to the caller of the query interface. Per-file parse problems are
//! not errors at all - they are recorded as loader warnings and the affected
//! package stays analyzable. Unresolved calls and depth caps are represented
//! as tree shape, never as errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowmapError {
    #[error("not a Go project: {0}")]
    NotAProject(PathBuf),

    #[error("loader failure: {0}")]
    Loader(String),

    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("not a Go source file: {0}")]
    NotGoSource(PathBuf),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowmapError>;
