//! Display directory tree.
//!
//! Builds the [`DirectoryInfo`] tree a UI renders next to analysis
//! results. Entries matching the configured exclude patterns (dot
//! directories, vendored dependencies, build artifacts, `*suffix` globs)
//! are hidden; a depth cap of `None` means unlimited.

use std::path::Path;

use glob_match::glob_match;

use crate::config::Config;
use crate::types::DirectoryInfo;

/// Build the display tree rooted at `root`, at most `max_depth` levels of
/// children deep.
pub fn tree_structure(root: &Path, max_depth: Option<usize>, config: &Config) -> DirectoryInfo {
    let excludes = config.effective_excludes();
    build(root, root, max_depth, 0, &excludes)
}

fn build(
    base: &Path,
    current: &Path,
    max_depth: Option<usize>,
    depth: usize,
    excludes: &[&str],
) -> DirectoryInfo {
    let name = current
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| current.display().to_string());
    let rel = current
        .strip_prefix(base)
        .unwrap_or(current)
        .to_string_lossy()
        .replace('\\', "/");

    let is_dir = current.is_dir();
    let mut info = DirectoryInfo {
        name,
        path: rel,
        is_dir,
        children: Vec::new(),
    };

    if !is_dir || max_depth.is_some_and(|max| depth >= max) {
        return info;
    }

    let Ok(entries) = std::fs::read_dir(current) else {
        return info;
    };
    let mut names: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    for child_name in names {
        if should_ignore(&child_name, excludes) {
            continue;
        }
        let child_path = current.join(&child_name);
        info.children
            .push(build(base, &child_path, max_depth, depth + 1, excludes));
    }

    info
}

fn should_ignore(name: &str, patterns: &[&str]) -> bool {
    patterns
        .iter()
        .any(|pattern| *pattern == name || glob_match(pattern, name))
}
