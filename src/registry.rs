//! Function registry and node arena.
//!
//! Every function and method declaration in the loaded packages gets one
//! registered node, keyed by its fully-qualified name
//! `package + "." + displayName`. Registered nodes live in an arena and
//! reference each other by index; placeholder nodes fabricated at call
//! sites live outside the arena, owned by their parent's child list, so
//! the two can never be confused.
//!
//! The output of a query is strictly a tree (the internal graph unrolled):
//! a child is either a registered subtree, an owned placeholder, or a
//! recursive-leaf copy - the shallow copy emitted to terminate a cycle or
//! a depth-exceeding branch.

use std::collections::HashMap;

use tracing::debug;

use crate::loader::PackageSet;
use crate::types::FunctionNode;

/// Index of a registered node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node created from a declaration during ingestion.
#[derive(Debug)]
pub struct RegisteredNode {
    pub name: String,
    pub package: String,
    pub file: String,
    pub line: u32,
    pub doc: String,
    pub is_external: bool,
    pub is_analysed: bool,
    pub children: Vec<Child>,
}

impl RegisteredNode {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

/// A node fabricated at a call site whose callee has no registered
/// declaration.
#[derive(Debug)]
pub struct PlaceholderNode {
    pub name: String,
    pub package: String,
    pub file: String,
    pub line: u32,
    pub doc: String,
    pub is_external: bool,
}

/// One entry of a registered node's child list.
#[derive(Debug)]
pub enum Child {
    /// A registered callee, expanded in place.
    Registered(NodeId),
    /// A recursive-leaf copy: same identity as `target`, `line` is the
    /// call site, no children.
    Leaf { target: NodeId, line: u32 },
    /// An owned placeholder.
    Placeholder(PlaceholderNode),
}

/// The analyzer's shared registry: arena plus fully-qualified-name index.
#[derive(Debug, Default)]
pub struct Registry {
    arena: Vec<RegisteredNode>,
    index: HashMap<String, NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration of the loaded packages. Runs once at
    /// ingestion; keys are unique, later duplicates are dropped.
    pub fn populate(&mut self, pkgs: &PackageSet) {
        for pkg in pkgs.sorted() {
            let is_external = !pkg.path.starts_with(&pkgs.module);
            for file in &pkg.files {
                for decl in &file.functions {
                    let name = decl.display_name();
                    let key = format!("{}.{}", pkg.path, name);
                    if self.index.contains_key(&key) {
                        debug!(%key, "duplicate declaration, keeping the first");
                        continue;
                    }
                    let id = NodeId(self.arena.len());
                    self.arena.push(RegisteredNode {
                        name,
                        package: pkg.path.clone(),
                        file: file.path.clone(),
                        line: decl.line,
                        doc: decl.doc.clone(),
                        is_external,
                        is_analysed: false,
                        children: Vec::new(),
                    });
                    self.index.insert(key, id);
                }
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn node(&self, id: NodeId) -> &RegisteredNode {
        &self.arena[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut RegisteredNode {
        &mut self.arena[id.0]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// The `(name, package)` identity a child entry occupies in its
    /// parent's dedup space.
    pub fn child_identity<'a>(&'a self, child: &'a Child) -> (&'a str, &'a str) {
        match child {
            Child::Registered(id) | Child::Leaf { target: id, .. } => {
                let node = self.node(*id);
                (&node.name, &node.package)
            }
            Child::Placeholder(p) => (&p.name, &p.package),
        }
    }

    /// Render a registered node and its populated subtree to the wire
    /// shape. Registered children render recursively; leaf copies render
    /// shallow with the call-site line; placeholders render as leaves.
    pub fn render(&self, id: NodeId) -> FunctionNode {
        let node = self.node(id);
        FunctionNode {
            name: node.name.clone(),
            package: node.package.clone(),
            file: node.file.clone(),
            line: node.line,
            doc: node.doc.clone(),
            is_external: node.is_external,
            is_analysed: node.is_analysed,
            children: node
                .children
                .iter()
                .map(|child| match child {
                    Child::Registered(cid) => self.render(*cid),
                    Child::Leaf { target, line } => {
                        let t = self.node(*target);
                        FunctionNode {
                            name: t.name.clone(),
                            package: t.package.clone(),
                            file: t.file.clone(),
                            line: *line,
                            doc: t.doc.clone(),
                            is_external: t.is_external,
                            is_analysed: t.is_analysed,
                            children: Vec::new(),
                        }
                    }
                    Child::Placeholder(p) => FunctionNode {
                        name: p.name.clone(),
                        package: p.package.clone(),
                        file: p.file.clone(),
                        line: p.line,
                        doc: p.doc.clone(),
                        is_external: p.is_external,
                        is_analysed: false,
                        children: Vec::new(),
                    },
                })
                .collect(),
        }
    }
}
