//! Go project validation.
//!
//! Decides whether a path is a Go project and extracts the module prefix
//! from `go.mod`. The module prefix is the sole discriminator between
//! "internal" (expand into) and "external" (render as leaf) packages during
//! call-tree construction. Validation never fails - a non-project yields
//! `is_go_project = false`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::discovery::find_go_files;
use crate::types::ProjectInfo;

/// Match the module directive: `module example.com/proj`
static MODULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*module\s+(\S+)").expect("invalid module regex"));

/// Match the go version directive: `go 1.22` or `go 1.22.3`
static GO_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*go\s+(\d+\.\d+(?:\.\d+)?)").expect("invalid go version regex"));

/// Match the package clause of a source file: `package foo`
static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^package\s+(\w+)").expect("invalid package regex"));

/// Validate a directory as a Go project.
///
/// Looks for `go.mod` at the root and parses its module, go-version, and
/// require directives. Without `go.mod`, falls back to a recursive scan: any
/// `.go` file below the root (vendored subtrees excluded) marks the path as
/// a pre-modules project with an empty module name.
pub fn validate(root: &Path) -> ProjectInfo {
    let mut info = ProjectInfo::default();

    let go_mod = root.join("go.mod");
    if let Ok(content) = std::fs::read_to_string(&go_mod) {
        info.is_go_project = true;
        if let Some(cap) = MODULE_RE.captures(&content) {
            info.module_name = cap[1].to_string();
        }
        if let Some(cap) = GO_VERSION_RE.captures(&content) {
            info.go_version = cap[1].to_string();
        }
        info.dependencies = count_requires(&content);
    }

    // Census of source files; with no go.mod this doubles as the fallback
    // project check.
    let files = find_go_files(root).unwrap_or_default();
    if !files.is_empty() {
        info.is_go_project = true;
    }
    info.go_files = files.len();

    let mut packages: Vec<String> = Vec::new();
    for file in &files {
        if file
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_test.go"))
        {
            info.has_tests = true;
        }
        if let Ok(content) = std::fs::read_to_string(file) {
            if let Some(cap) = PACKAGE_RE.captures(&content) {
                let name = cap[1].to_string();
                if !packages.contains(&name) {
                    packages.push(name);
                }
            }
        }
    }
    packages.sort();
    info.packages = packages;

    info
}

/// Count dependency declarations in go.mod content.
///
/// Handles both single-line requires (`require x v1.0.0`) and require
/// blocks, where each non-comment line inside the block is one dependency.
fn count_requires(content: &str) -> usize {
    let mut count = 0;
    let mut in_block = false;
    for line in content.lines() {
        let line = line.trim();
        if in_block {
            if line == ")" {
                in_block = false;
            } else if !line.is_empty() && !line.starts_with("//") {
                count += 1;
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
            } else if !rest.is_empty() {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_validate_module_project() {
        let dir = scratch("flowmap_test_validate_mod");
        fs::write(
            dir.join("go.mod"),
            "module example.com/proj\n\ngo 1.22\n\nrequire (\n\tgithub.com/a/b v1.0.0\n\tgithub.com/c/d v0.2.1 // indirect\n)\n",
        )
        .unwrap();
        fs::write(dir.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        fs::write(
            dir.join("main_test.go"),
            "package main\n\nfunc TestMain() {}\n",
        )
        .unwrap();

        let info = validate(&dir);
        assert!(info.is_go_project);
        assert_eq!(info.module_name, "example.com/proj");
        assert_eq!(info.go_version, "1.22");
        assert_eq!(info.dependencies, 2);
        assert_eq!(info.go_files, 2);
        assert!(info.has_tests);
        assert_eq!(info.packages, vec!["main".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_pre_modules_project() {
        let dir = scratch("flowmap_test_validate_premod");
        fs::write(dir.join("util.go"), "package util\n\nfunc Helper() {}\n").unwrap();

        let info = validate(&dir);
        assert!(info.is_go_project);
        assert!(info.module_name.is_empty());
        assert_eq!(info.go_files, 1);
        assert!(!info.has_tests);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_non_project() {
        let dir = scratch("flowmap_test_validate_none");
        fs::write(dir.join("readme.txt"), "nothing to see").unwrap();

        let info = validate(&dir);
        assert!(!info.is_go_project);
        assert_eq!(info.go_files, 0);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_count_requires_single_line() {
        let content = "module m\n\nrequire github.com/a/b v1.2.3\n";
        assert_eq!(count_requires(content), 1);
    }

    #[test]
    fn test_count_requires_mixed() {
        let content =
            "module m\nrequire github.com/a/b v1.0.0\nrequire (\n\tx.com/y v0.1.0\n\t// comment\n\tz.com/w v2.0.0\n)\n";
        assert_eq!(count_requires(content), 3);
    }
}
