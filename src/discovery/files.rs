//! Git-aware discovery of Go source files.
//!
//! Walks the project root with the `ignore` crate, so `.gitignore` rules
//! apply automatically. Directories whose path contains a vendored
//! dependency segment (`vendor/`) or version-control metadata (`.git/`)
//! are skipped regardless of gitignore state. Results are sorted so the
//! same tree always loads in the same order.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{FlowmapError, Result};

/// Path segments that are never traversed.
const SKIPPED_SEGMENTS: &[&str] = &["vendor", ".git"];

/// Find every `.go` file under `root`.
///
/// Returns absolute, sorted paths. A missing root is an error; an empty
/// project is an empty result, not an error.
pub fn find_go_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(FlowmapError::Loader(format!(
            "path does not exist: {}",
            root.display()
        )));
    }

    // threads(0) = auto-detect; the walker filters directories so skipped
    // subtrees are never descended into.
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.path().is_dir() && SKIPPED_SEGMENTS.contains(&name.as_ref()))
        })
        .threads(0)
        .build_parallel();

    let files = std::sync::Mutex::new(Vec::new());

    walker.run(|| {
        Box::new(|entry_result| {
            if let Ok(entry) = entry_result {
                let path = entry.path();
                if path.is_file() && is_go_source(path) && !in_skipped_segment(path) {
                    if let Ok(mut files) = files.lock() {
                        files.push(path.to_path_buf());
                    }
                }
            }
            // Unreadable entries (permissions, broken symlinks) are skipped
            ignore::WalkState::Continue
        })
    });

    let mut files = files
        .into_inner()
        .map_err(|_| FlowmapError::Loader("file discovery poisoned".to_string()))?;

    // Sort for reproducibility: registration order and duplicate-key
    // handling must not depend on walk scheduling.
    files.sort();

    Ok(files)
}

fn is_go_source(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("go")
}

fn in_skipped_segment(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => SKIPPED_SEGMENTS
            .contains(&name.to_string_lossy().as_ref()),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovery_filters_and_sorts() -> Result<()> {
        let dir = std::env::temp_dir().join("flowmap_test_discovery");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("b"))?;
        fs::create_dir_all(dir.join("vendor/dep"))?;
        fs::create_dir_all(dir.join(".git"))?;

        fs::write(dir.join("main.go"), "package main\n")?;
        fs::write(dir.join("b/b.go"), "package b\n")?;
        fs::write(dir.join("notes.md"), "not source\n")?;
        fs::write(dir.join("vendor/dep/dep.go"), "package dep\n")?;
        fs::write(dir.join(".git/hook.go"), "package hook\n")?;

        let files = find_go_files(&dir)?;
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                f.strip_prefix(&dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(names, vec!["b/b.go".to_string(), "main.go".to_string()]);

        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_nonexistent_root() {
        let result = find_go_files(Path::new("/nonexistent/path/xyz"));
        assert!(result.is_err());
    }

    #[test]
    fn test_single_file_input() -> Result<()> {
        let dir = std::env::temp_dir().join("flowmap_test_discovery_single");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir)?;
        let file = dir.join("only.go");
        fs::write(&file, "package only\n")?;

        let files = find_go_files(&file)?;
        assert_eq!(files, vec![file]);

        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
