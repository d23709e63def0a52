//! The analyzer facade.
//!
//! Ties the pipeline together: validate the project, load every package,
//! register every declaration - once, at ingestion - then answer queries.
//! Ingestion state (`packages`, the registry key space) is immutable
//! afterwards; query-time mutation is confined to node children and
//! analysed flags inside the registry, which sits behind a single mutex.
//! Queries for disjoint entry points can run from any number of threads;
//! the memoized analysed flags keep contention low.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::calltree::TreeBuilder;
use crate::config::Config;
use crate::error::{FlowmapError, Result};
use crate::extraction::GoParser;
use crate::listing;
use crate::loader::PackageSet;
use crate::project;
use crate::registry::Registry;
use crate::types::{DirectoryInfo, FunctionNode, ProjectInfo};

pub struct Analyzer {
    root: PathBuf,
    info: ProjectInfo,
    config: Config,
    packages: PackageSet,
    registry: Mutex<Registry>,
}

impl Analyzer {
    /// Ingest a repository with configuration from its `flowmap.toml` (or
    /// defaults).
    pub fn ingest(root: &Path) -> Result<Self> {
        let config = Config::load(root);
        Self::ingest_with_config(root, config)
    }

    /// Ingest a repository: validate, load packages, populate the registry.
    pub fn ingest_with_config(root: &Path, config: Config) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| FlowmapError::NotAProject(root.to_path_buf()))?;

        let info = project::validate(&root);
        if !info.is_go_project {
            return Err(FlowmapError::NotAProject(root));
        }

        let packages = PackageSet::load(&root, &info.module_name)?;
        let mut registry = Registry::new();
        registry.populate(&packages);

        Ok(Self {
            root,
            info,
            config,
            packages,
            registry: Mutex::new(registry),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_info(&self) -> &ProjectInfo {
        &self.info
    }

    pub fn module_name(&self) -> &str {
        &self.info.module_name
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn registered_functions(&self) -> usize {
        self.lock_registry().len()
    }

    /// Direct imports of a loaded package, from the import graph.
    pub fn package_imports(&self, package: &str) -> Vec<String> {
        self.packages
            .imports_of(package)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Function and method display names of a single source file, receiver
    /// form preserved for the UI: `(*T).m` / `(T).m`.
    pub fn list_functions(&self, file: &Path) -> Result<Vec<String>> {
        let file = self.absolute(file);
        if file.extension().and_then(|e| e.to_str()) != Some("go") {
            return Err(FlowmapError::NotGoSource(file));
        }
        let mut parser = GoParser::new()?;
        let parsed = parser.parse_file(&file)?;
        Ok(parsed.functions.iter().map(|f| f.ui_name()).collect())
    }

    /// Build the call tree rooted at `function`, declared in the package
    /// that owns `path`. `path` is reduced to its containing directory and
    /// translated through the loaded package set.
    pub fn build_call_tree(&self, path: &Path, function: &str) -> Result<FunctionNode> {
        let abs = self.absolute(path);
        let dir = if abs.is_dir() {
            abs.clone()
        } else {
            abs.parent().unwrap_or(&abs).to_path_buf()
        };

        let pkg_path = self
            .packages
            .package_for_dir(&dir)
            .ok_or_else(|| FlowmapError::UnknownPackage(dir.display().to_string()))?;

        let key = format!("{pkg_path}.{function}");
        let mut registry = self.lock_registry();
        let root = registry
            .lookup(&key)
            .ok_or(FlowmapError::UnknownFunction(key))?;

        TreeBuilder::new(&self.packages, &self.config).expand(&mut registry, root);
        Ok(registry.render(root))
    }

    /// Display directory tree of the project root.
    pub fn tree_structure(&self, max_depth: Option<usize>) -> DirectoryInfo {
        listing::tree_structure(&self.root, max_depth, &self.config)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        joined.canonicalize().unwrap_or(joined)
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        // Mutations are monotonic additions; a poisoned lock still holds a
        // usable registry.
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const A_GO: &str = r#"package a

import (
	"fmt"
	"example.com/proj/b"
)

// Foo is the entry point.
func Foo() {
	Bar()
	b.Baz()
	fmt.Println("x")
}

func Bar() {}

func Recurse() {
	Recurse()
}

func Mutual1() {
	Mutual2()
}

func Mutual2() {
	Mutual1()
}

func Twice() {
	Bar()
	Bar()
}

func Unknown() {
	// fallback path
	x.Unknown()
}

type T struct{}

func (t *T) Do() {}

func CallDo() {
	(&T{}).Do()
}
"#;

    const CHAIN_GO: &str = r#"package a

func Chain1() {
	Chain2()
}

func Chain2() {
	Chain3()
}

func Chain3() {
	Chain4()
}

func Chain4() {
	Chain5()
}

func Chain5() {}
"#;

    const DIAMOND_GO: &str = r#"package a

func D1() {
	D2()
	D3()
}

func D2() {
	D4()
}

func D3() {
	D4()
}

func D4() {}
"#;

    const B_GO: &str = r#"package b

// Baz answers from afar.
func Baz() {}
"#;

    fn fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("a")).unwrap();
        fs::create_dir_all(dir.join("b")).unwrap();
        fs::write(dir.join("go.mod"), "module example.com/proj\n\ngo 1.22\n").unwrap();
        fs::write(dir.join("a/a.go"), A_GO).unwrap();
        fs::write(dir.join("a/chain.go"), CHAIN_GO).unwrap();
        fs::write(dir.join("a/diamond.go"), DIAMOND_GO).unwrap();
        fs::write(dir.join("b/b.go"), B_GO).unwrap();
        dir
    }

    #[test]
    fn test_ingest_non_project() {
        let dir = std::env::temp_dir().join("flowmap_test_an_nonproject");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("readme.txt"), "nope").unwrap();

        let result = Analyzer::ingest(&dir);
        assert!(matches!(result, Err(FlowmapError::NotAProject(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_internal_and_cross_package_calls() {
        let dir = fixture("flowmap_test_an_cross");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Foo").unwrap();
        assert_eq!(tree.name, "Foo");
        assert_eq!(tree.package, "example.com/proj/a");
        assert_eq!(tree.doc, "Foo is the entry point.");
        assert!(!tree.is_external);
        assert!(tree.is_analysed);

        // fmt is on the ignore list, so only Bar and Baz remain.
        let names: Vec<(&str, &str)> = tree
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.package.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Bar", "example.com/proj/a"),
                ("Baz", "example.com/proj/b"),
            ]
        );
        assert!(tree.children.iter().all(|c| !c.is_external));
        // Cross-package callee carries its own declaration info.
        assert_eq!(tree.children[1].doc, "Baz answers from afar.");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_self_recursion_yields_leaf_copy() {
        let dir = fixture("flowmap_test_an_recurse");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Recurse").unwrap();
        assert!(tree.is_analysed);
        assert_eq!(tree.children.len(), 1);

        let copy = &tree.children[0];
        assert_eq!(copy.name, "Recurse");
        assert_eq!(copy.package, tree.package);
        assert_eq!(copy.file, tree.file);
        // Call-site line, not the declaration line.
        assert_eq!(copy.line, 18);
        assert!(copy.children.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_mutual_recursion() {
        let dir = fixture("flowmap_test_an_mutual");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Mutual1").unwrap();
        assert_eq!(tree.children.len(), 1);
        let m2 = &tree.children[0];
        assert_eq!(m2.name, "Mutual2");
        assert_eq!(m2.children.len(), 1);
        // Back-edge renders as a leaf copy at the call site.
        let back = &m2.children[0];
        assert_eq!(back.name, "Mutual1");
        assert_eq!(back.line, 26);
        assert!(back.children.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_depth_bound_caps_chain() {
        let dir = fixture("flowmap_test_an_chain");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Chain1").unwrap();
        let c2 = &tree.children[0];
        let c3 = &c2.children[0];
        let c4 = &c3.children[0];
        assert_eq!(c4.name, "Chain4");
        assert!(c4.is_analysed);

        // Chain5 appears only as a leaf reference off Chain4.
        assert_eq!(c4.children.len(), 1);
        let c5 = &c4.children[0];
        assert_eq!(c5.name, "Chain5");
        assert_eq!(c5.line, 16);
        assert!(c5.children.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_diamond_second_encounter_is_leaf() {
        let dir = fixture("flowmap_test_an_diamond");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "D1").unwrap();
        let d2 = &tree.children[0];
        let d3 = &tree.children[1];
        assert_eq!(d2.children[0].name, "D4");
        assert!(d2.children[0].is_analysed);

        let d4_again = &d3.children[0];
        assert_eq!(d4_again.name, "D4");
        assert_eq!(d4_again.line, 13);
        assert!(d4_again.children.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_duplicate_call_sites_coalesce() {
        let dir = fixture("flowmap_test_an_dedup");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Twice").unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "Bar");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unresolved_selector_placeholder() {
        let dir = fixture("flowmap_test_an_unresolved");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Unknown").unwrap();
        assert_eq!(tree.children.len(), 1);

        let ph = &tree.children[0];
        assert_eq!(ph.name, "x.Unknown");
        // Package attribution falls to the caller's package.
        assert_eq!(ph.package, "example.com/proj/a");
        assert!(!ph.is_external);
        assert!(!ph.is_analysed);
        assert!(ph.children.is_empty());
        // The comment group at the call site travels with the placeholder.
        assert_eq!(ph.doc, "fallback path");
        assert!(ph.file.ends_with("a.go"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_pointer_receiver_collapses_in_registry() {
        let dir = fixture("flowmap_test_an_pointer");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        // Declared with pointer receiver, queried without the marker.
        let tree = analyzer.build_call_tree(&dir.join("a"), "T.Do").unwrap();
        assert_eq!(tree.name, "T.Do");

        // And the literal-receiver caller resolves to the registered node.
        let caller = analyzer.build_call_tree(&dir.join("a"), "CallDo").unwrap();
        assert_eq!(caller.children.len(), 1);
        assert_eq!(caller.children[0].name, "T.Do");
        assert_eq!(caller.children[0].package, "example.com/proj/a");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_function_and_package_errors() {
        let dir = fixture("flowmap_test_an_errors");
        let analyzer = Analyzer::ingest(&dir).unwrap();
        let before = analyzer.registered_functions();

        let missing = analyzer.build_call_tree(&dir.join("a"), "Nope");
        assert!(matches!(missing, Err(FlowmapError::UnknownFunction(_))));
        // No registry mutation on a failed query.
        assert_eq!(analyzer.registered_functions(), before);

        let missing_pkg = analyzer.build_call_tree(&dir.join("zzz"), "Foo");
        assert!(matches!(missing_pkg, Err(FlowmapError::UnknownPackage(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_query_accepts_file_path() {
        let dir = fixture("flowmap_test_an_filepath");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer
            .build_call_tree(&dir.join("a/a.go"), "Foo")
            .unwrap();
        assert_eq!(tree.package, "example.com/proj/a");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_repeat_query_is_structurally_stable() {
        let dir = fixture("flowmap_test_an_repeat");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let first = analyzer.build_call_tree(&dir.join("a"), "Foo").unwrap();
        let second = analyzer.build_call_tree(&dir.join("a"), "Foo").unwrap();
        assert_eq!(first, second);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_wire_round_trip_of_built_tree() {
        let dir = fixture("flowmap_test_an_roundtrip");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.build_call_tree(&dir.join("a"), "Chain1").unwrap();
        let json = serde_json::to_string_pretty(&tree).unwrap();
        let back: FunctionNode = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, back);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_list_functions_disambiguates_receivers() {
        let dir = fixture("flowmap_test_an_list");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let names = analyzer.list_functions(&dir.join("a/a.go")).unwrap();
        assert!(names.contains(&"Foo".to_string()));
        assert!(names.contains(&"(*T).Do".to_string()));

        let err = analyzer.list_functions(&dir.join("go.mod"));
        assert!(matches!(err, Err(FlowmapError::NotGoSource(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_project_info_and_imports() {
        let dir = fixture("flowmap_test_an_info");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let info = analyzer.project_info();
        assert!(info.is_go_project);
        assert_eq!(info.module_name, "example.com/proj");
        assert_eq!(info.go_version, "1.22");
        assert_eq!(info.go_files, 4);
        assert_eq!(info.packages, vec!["a".to_string(), "b".to_string()]);

        let deps = analyzer.package_imports("example.com/proj/a");
        assert_eq!(deps, vec!["example.com/proj/b".to_string(), "fmt".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_concurrent_queries() {
        let dir = fixture("flowmap_test_an_threads");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = ["Chain1", "Mutual1", "Foo", "D1"]
                .into_iter()
                .map(|entry| {
                    let analyzer = &analyzer;
                    let a_dir = dir.join("a");
                    scope.spawn(move || analyzer.build_call_tree(&a_dir, entry).unwrap())
                })
                .collect();
            for handle in handles {
                let tree = handle.join().unwrap();
                assert!(tree.is_analysed);
            }
        });

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_tree_structure_listing() {
        let dir = fixture("flowmap_test_an_tree");
        let analyzer = Analyzer::ingest(&dir).unwrap();

        let tree = analyzer.tree_structure(Some(1));
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "go.mod"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
