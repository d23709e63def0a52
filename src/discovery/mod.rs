//! Source file discovery for Go projects.

mod files;

pub use files::find_go_files;
