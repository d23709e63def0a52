//! Depth-bounded call-tree expansion.
//!
//! Traversal per query, for a node `n` at depth `d`:
//! - a callee that is already in the per-query visited set, or that would
//!   land beyond the depth bound, is linked as a recursive-leaf copy
//!   (same identity, call-site line, no children)
//! - a registered callee is linked in place and expanded recursively
//! - anything unresolvable becomes a placeholder owned by `n`
//!
//! Children are deduplicated on `(name, package)` and kept in
//! first-encounter order. A node is marked analysed once its callees have
//! been expanded; later queries reuse the children as-is, so repeated
//! queries are cheap and structurally stable.

use std::collections::HashSet;

use crate::config::Config;
use crate::loader::PackageSet;
use crate::oracle::ScopeOracle;
use crate::registry::{Child, NodeId, PlaceholderNode, Registry};

use super::classify::{classify, CallClass};

pub struct TreeBuilder<'a> {
    pkgs: &'a PackageSet,
    config: &'a Config,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(pkgs: &'a PackageSet, config: &'a Config) -> Self {
        Self { pkgs, config }
    }

    /// Expand the subtree rooted at `root`, respecting the depth bound and
    /// memoized nodes.
    pub fn expand(&self, registry: &mut Registry, root: NodeId) {
        let mut visited = HashSet::new();
        self.expand_node(registry, root, 0, &mut visited);
    }

    fn expand_node(
        &self,
        registry: &mut Registry,
        id: NodeId,
        depth: usize,
        visited: &mut HashSet<String>,
    ) {
        visited.insert(registry.node(id).qualified_name());
        if registry.node(id).is_analysed {
            return;
        }

        let (package, file, line) = {
            let node = registry.node(id);
            (node.package.clone(), node.file.clone(), node.line)
        };
        let Some(pkg) = self.pkgs.get(&package) else {
            return;
        };
        // No declaration at the recorded location: leave the node a leaf.
        let Some((gofile, decl)) = pkg.find_decl(&file, line) else {
            return;
        };

        let oracle = ScopeOracle::new(gofile, decl, self.config);

        for call in &decl.calls {
            let class = classify(call, &oracle, gofile, &package, self.config);
            match class {
                CallClass::Builtin | CallClass::Ignored => {}
                CallClass::SamePackage { name } => {
                    let key = format!("{package}.{name}");
                    self.link(
                        registry, id, depth, visited, &key, name,
                        package.clone(), &file, call.line, &call.doc,
                    );
                }
                CallClass::Method {
                    package: owner,
                    type_name,
                    method,
                } => {
                    let name = format!("{type_name}.{method}");
                    let key = format!("{owner}.{name}");
                    self.link(
                        registry, id, depth, visited, &key, name, owner, &file,
                        call.line, &call.doc,
                    );
                }
                CallClass::Imported {
                    package: owner,
                    name,
                } => {
                    let key = format!("{owner}.{name}");
                    self.link(
                        registry, id, depth, visited, &key, name, owner, &file,
                        call.line, &call.doc,
                    );
                }
                CallClass::Unresolved { name } => {
                    self.place(
                        registry, id, name, package.clone(), &file, call.line,
                        &call.doc,
                    );
                }
            }
        }

        registry.node_mut(id).is_analysed = true;
    }

    /// Link a classified callee under `parent`: the registered node when
    /// the key resolves (as subtree or recursive leaf), a placeholder
    /// otherwise.
    #[allow(clippy::too_many_arguments)]
    fn link(
        &self,
        registry: &mut Registry,
        parent: NodeId,
        depth: usize,
        visited: &mut HashSet<String>,
        key: &str,
        name: String,
        package: String,
        call_file: &str,
        call_line: u32,
        call_doc: &str,
    ) {
        match registry.lookup(key) {
            Some(target) => {
                let target_node = registry.node(target);
                let identity = (target_node.name.clone(), target_node.package.clone());
                if self.has_child(registry, parent, &identity) {
                    return;
                }
                if visited.contains(key) || depth + 1 > self.config.max_depth {
                    registry
                        .node_mut(parent)
                        .children
                        .push(Child::Leaf { target, line: call_line });
                } else {
                    registry
                        .node_mut(parent)
                        .children
                        .push(Child::Registered(target));
                    self.expand_node(registry, target, depth + 1, visited);
                }
            }
            None => self.place(registry, parent, name, package, call_file, call_line, call_doc),
        }
    }

    /// Fabricate a placeholder child, owned by its parent only.
    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        registry: &mut Registry,
        parent: NodeId,
        name: String,
        package: String,
        call_file: &str,
        call_line: u32,
        call_doc: &str,
    ) {
        let identity = (name.clone(), package.clone());
        if self.has_child(registry, parent, &identity) {
            return;
        }
        let is_external = !package.starts_with(&self.pkgs.module);
        registry
            .node_mut(parent)
            .children
            .push(Child::Placeholder(PlaceholderNode {
                name,
                package,
                file: call_file.to_string(),
                line: call_line,
                doc: call_doc.to_string(),
                is_external,
            }));
    }

    fn has_child(&self, registry: &Registry, parent: NodeId, identity: &(String, String)) -> bool {
        registry.node(parent).children.iter().any(|child| {
            let (name, package) = registry.child_identity(child);
            name == identity.0 && package == identity.1
        })
    }
}
