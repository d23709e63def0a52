//! Batched package loading.
//!
//! Loads every package under the project root in one pass: discovery finds
//! the source files, extraction parses each one, and the loader groups the
//! summaries into packages by directory. Each package's import path is the
//! module prefix plus its directory relative to the root, which is also how
//! a filesystem path from a query is translated back to a package identity.
//!
//! Individual files with syntax errors are retained and analyzed
//! best-effort; a package carrying errors is reported once through
//! `tracing`. Only a wholesale failure (unreadable root, nothing to load)
//! is fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::warn;

use crate::discovery::find_go_files;
use crate::error::{FlowmapError, Result};
use crate::extraction::{FuncDecl, GoFile, GoParser};

/// One loaded package: the extracted summaries of every file in one
/// directory.
#[derive(Debug)]
pub struct Package {
    /// Import path: module prefix + relative directory.
    pub path: String,
    /// Name from the package clause.
    pub name: String,
    /// Absolute directory.
    pub dir: PathBuf,
    pub files: Vec<GoFile>,
    /// Per-file load problems, kept as warnings.
    pub errors: Vec<String>,
}

impl Package {
    /// Locate a declaration by its recorded source location.
    pub fn find_decl(&self, file: &str, line: u32) -> Option<(&GoFile, &FuncDecl)> {
        let gofile = self.files.iter().find(|f| f.path == file)?;
        let decl = gofile.functions.iter().find(|d| d.line == line)?;
        Some((gofile, decl))
    }
}

/// Every package loaded from a project root.
#[derive(Debug)]
pub struct PackageSet {
    /// Module prefix the import paths were derived from.
    pub module: String,
    packages: HashMap<String, Package>,
    path_to_package: HashMap<PathBuf, String>,
    imports: DiGraph<String, ()>,
    import_index: HashMap<String, NodeIndex>,
}

impl PackageSet {
    /// Load every package under `root`. `module` is the module prefix from
    /// the validator (empty for pre-modules projects).
    pub fn load(root: &Path, module: &str) -> Result<Self> {
        let files = find_go_files(root)?;
        if files.is_empty() {
            return Err(FlowmapError::Loader(format!(
                "no Go source files under {}",
                root.display()
            )));
        }

        let mut parser = GoParser::new()?;
        let mut packages: HashMap<String, Package> = HashMap::new();
        let mut path_to_package = HashMap::new();

        for file in &files {
            let dir = file.parent().unwrap_or(root).to_path_buf();
            let rel = dir.strip_prefix(root).unwrap_or(Path::new(""));

            let parsed = match parser.parse_file(file) {
                Ok(parsed) => parsed,
                Err(e) => {
                    // Group the failure under the package it would have
                    // belonged to, keyed by a provisional import path.
                    let path = import_path(module, rel, "");
                    let pkg = packages.entry(path.clone()).or_insert_with(|| Package {
                        path,
                        name: String::new(),
                        dir: dir.clone(),
                        files: Vec::new(),
                        errors: Vec::new(),
                    });
                    pkg.errors.push(format!("{}: {}", file.display(), e));
                    continue;
                }
            };

            let path = import_path(module, rel, &parsed.package_name);
            let pkg = packages.entry(path.clone()).or_insert_with(|| Package {
                path: path.clone(),
                name: parsed.package_name.clone(),
                dir: dir.clone(),
                files: Vec::new(),
                errors: Vec::new(),
            });
            // External test packages (`foo_test`) share the directory; the
            // package keeps the non-test name when both are present.
            if pkg.name.is_empty() || (pkg.name.ends_with("_test") && !parsed.package_name.ends_with("_test")) {
                pkg.name = parsed.package_name.clone();
            }
            if parsed.has_errors {
                pkg.errors
                    .push(format!("{}: syntax errors, analyzed best-effort", parsed.path));
            }
            pkg.files.push(parsed);
            path_to_package.insert(dir, path);
        }

        if packages.values().all(|p| p.files.is_empty()) {
            return Err(FlowmapError::Loader(format!(
                "no package under {} could be parsed",
                root.display()
            )));
        }

        for pkg in packages.values() {
            if !pkg.errors.is_empty() {
                warn!(
                    package = %pkg.path,
                    problems = pkg.errors.len(),
                    "package loaded with parse problems"
                );
            }
        }

        let (imports, import_index) = build_import_graph(&packages);

        Ok(Self {
            module: module.to_string(),
            packages,
            path_to_package,
            imports,
            import_index,
        })
    }

    pub fn get(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Translate an absolute directory to its package import path.
    pub fn package_for_dir(&self, dir: &Path) -> Option<&str> {
        self.path_to_package.get(dir).map(|s| s.as_str())
    }

    /// Loaded packages in deterministic (path) order.
    pub fn sorted(&self) -> Vec<&Package> {
        let mut pkgs: Vec<&Package> = self.packages.values().collect();
        pkgs.sort_by(|a, b| a.path.cmp(&b.path));
        pkgs
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// The package import graph: loaded packages plus everything they
    /// import, edges pointing from importer to imported.
    pub fn import_graph(&self) -> &DiGraph<String, ()> {
        &self.imports
    }

    /// Import paths a loaded package depends on directly.
    pub fn imports_of(&self, path: &str) -> Vec<&str> {
        let Some(&idx) = self.import_index.get(path) else {
            return vec![];
        };
        let mut deps: Vec<&str> = self
            .imports
            .neighbors(idx)
            .filter_map(|n| self.imports.node_weight(n))
            .map(|s| s.as_str())
            .collect();
        deps.sort_unstable();
        deps
    }
}

/// Derive a package import path from the module prefix and the package's
/// directory relative to the root.
fn import_path(module: &str, rel: &Path, pkg_name: &str) -> String {
    let rel = rel.to_string_lossy().replace('\\', "/");
    match (module.is_empty(), rel.is_empty()) {
        (false, false) => format!("{}/{}", module, rel),
        (false, true) => module.to_string(),
        (true, false) => rel,
        (true, true) => pkg_name.to_string(),
    }
}

fn build_import_graph(
    packages: &HashMap<String, Package>,
) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    let node = |graph: &mut DiGraph<String, ()>, index: &mut HashMap<String, NodeIndex>, path: &str| {
        if let Some(&idx) = index.get(path) {
            idx
        } else {
            let idx = graph.add_node(path.to_string());
            index.insert(path.to_string(), idx);
            idx
        }
    };

    let mut paths: Vec<&String> = packages.keys().collect();
    paths.sort();
    for path in paths {
        let pkg = &packages[path];
        let from = node(&mut graph, &mut index, &pkg.path);
        let mut seen = std::collections::HashSet::new();
        for file in &pkg.files {
            for imp in &file.imports {
                if seen.insert(imp.path.as_str()) {
                    let to = node(&mut graph, &mut index, &imp.path);
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    (graph, index)
}
