//! Core data model for flowmap.
//!
//! The central entity is [`FunctionNode`] - one node of a rendered call
//! tree. The same wire shape covers three kinds of node:
//! - registered nodes, created from declarations during ingestion
//! - placeholder nodes, fabricated at call sites whose callee has no
//!   matching declaration
//! - recursive-leaf copies, shallow copies emitted to terminate a cycle
//!   or a depth-exceeding branch (same identity, call-site line, no
//!   children)
//!
//! Wire format: fields are emitted in declaration order and `children` is
//! always present, so serialized trees round-trip without loss.

use serde::{Deserialize, Serialize};

/// One node of a function call tree.
///
/// For methods, `name` is `ReceiverType.Method` with no pointer marker -
/// pointer and value receivers collapse to the same node because callers
/// cannot distinguish them at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    /// Display name: `Foo` for functions, `T.Method` for methods.
    pub name: String,
    /// Import path of the package that owns the declaration. Placeholders
    /// fall back to the caller's package when the callee package cannot be
    /// determined.
    pub package: String,
    /// Source file of the declaration, or the call site for placeholders.
    pub file: String,
    /// 1-indexed line of the declaration, or the call site for placeholders
    /// and recursive-leaf copies.
    pub line: u32,
    /// Documentation comment attached to the declaration, or the comment
    /// groups attached to the call site for placeholders.
    pub doc: String,
    /// True when `package` does not start with the project's module prefix.
    #[serde(rename = "isExternal")]
    pub is_external: bool,
    /// True once the builder has fully expanded this node's callees.
    #[serde(rename = "isAnalysed")]
    pub is_analysed: bool,
    /// Direct callees in first-encounter order, deduplicated on
    /// `(name, package)`.
    pub children: Vec<FunctionNode>,
}

impl FunctionNode {
    /// Fully-qualified registry key: `package + "." + name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Depth of this subtree: 0 for a leaf, 1 + max child depth otherwise.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Validation report for a candidate Go project.
///
/// `module_name` is the module prefix used to distinguish internal from
/// external packages during call-tree construction. A directory without a
/// `go.mod` but with `.go` files below it is reported as a pre-modules
/// project with an empty module name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub is_go_project: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub go_version: String,
    pub go_files: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
    pub has_tests: bool,
    pub dependencies: usize,
}

/// One entry of a display directory tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryInfo {
    pub name: String,
    /// Path relative to the listing root.
    pub path: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryInfo>,
}
