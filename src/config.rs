//! Configuration loading from flowmap.toml.
//!
//! Everything tunable about analysis lives here:
//! - `max-depth`: the call-tree expansion bound (default 3)
//! - `ignore` / `extend-ignore`: selector roots dropped during call
//!   classification (standard-library noise suppression)
//! - `exclude` / `extend-exclude`: names hidden from the display
//!   directory tree
//!
//! Defaults are defined in code; a standalone `flowmap.toml` at the
//! project root overrides them:
//!
//! ```toml
//! max-depth = 4
//! extend-ignore = ["zap", "logrus"]
//! extend-exclude = ["*.gen.go"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

/// Default call-tree expansion depth. Beyond this, callees appear only as
/// leaf references.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Selector roots dropped during call classification.
///
/// Widely-used standard-library package identifiers plus builtin tokens
/// that show up as selector roots. Nearly every Go function transitively
/// reaches formatting, error construction, or logging; dropping these keeps
/// rendered trees tractable. Replaceable via `ignore` in flowmap.toml.
pub const DEFAULT_IGNORE: &[&str] = &[
    "fmt", "errors", "strings", "strconv", "sort", "log", "os", "io",
    "time", "bytes", "context", "sync", "math", "filepath", "path",
    "regexp", "len", "append", "make", "new", "map", "error",
];

/// Go builtin identifiers and primitive type names. Bare calls to these
/// (including conversions like `string(b)`) are never callees.
pub const BUILTIN_IDENTS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag",
    "len", "make", "max", "min", "new", "panic", "print", "println", "real",
    "recover", "bool", "byte", "rune", "string", "error", "any", "uintptr",
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "float32", "float64", "complex64", "complex128",
];

/// Names hidden from the display directory tree. Exact names or `*suffix`
/// style globs.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".DS_Store",
    ".vscode",
    ".idea",
    ".github",
    ".gitlab",
    ".gitignore",
    ".gitattributes",
    ".cache",
    ".env",
    "node_modules",
    "vendor",
    "bin",
    "build",
    "dist",
    "coverage",
    "Thumbs.db",
    "*.tmp",
    "*.swp",
    "*.swo",
    "*.log",
    "*.o",
    "*.out",
    "*.so",
    "*.dll",
    "*.exe",
];

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display), if loaded from disk.
    pub source: Option<String>,

    /// Maximum call-tree expansion depth.
    pub max_depth: usize,

    /// Selector roots to drop. Replaces defaults if non-empty.
    pub ignore: Vec<String>,

    /// Additional selector roots to drop (extends defaults).
    pub extend_ignore: Vec<String>,

    /// Directory-listing exclude patterns. Replaces defaults if non-empty.
    pub exclude: Vec<String>,

    /// Additional listing exclude patterns (extends defaults).
    pub extend_exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            max_depth: DEFAULT_MAX_DEPTH,
            ignore: Vec::new(),
            extend_ignore: Vec::new(),
            exclude: Vec::new(),
            extend_exclude: Vec::new(),
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    max_depth: Option<usize>,
    ignore: Option<Vec<String>>,
    extend_ignore: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extend_exclude: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from `flowmap.toml` in the given directory, or
    /// defaults if absent or unparseable.
    pub fn load(directory: &Path) -> Self {
        let path = directory.join("flowmap.toml");
        if path.exists() {
            if let Some(config) = Self::load_toml(&path) {
                return config;
            }
        }
        Self::default()
    }

    fn load_toml(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let raw: RawConfig = toml::from_str(&content).ok()?;
        Some(Self {
            source: Some(path.display().to_string()),
            max_depth: raw.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            ignore: raw.ignore.unwrap_or_default(),
            extend_ignore: raw.extend_ignore.unwrap_or_default(),
            exclude: raw.exclude.unwrap_or_default(),
            extend_exclude: raw.extend_exclude.unwrap_or_default(),
        })
    }

    /// Effective ignore set (defaults + extend-ignore, or custom ignore).
    pub fn effective_ignore(&self) -> HashSet<&str> {
        let mut set: HashSet<&str> = if self.ignore.is_empty() {
            DEFAULT_IGNORE.iter().copied().collect()
        } else {
            self.ignore.iter().map(|s| s.as_str()).collect()
        };
        set.extend(self.extend_ignore.iter().map(|s| s.as_str()));
        set
    }

    /// Whether a selector root identifier is on the ignore list.
    pub fn is_ignored_root(&self, ident: &str) -> bool {
        self.effective_ignore().contains(ident)
    }

    /// Whether an identifier is a Go builtin or primitive type name.
    pub fn is_builtin(&self, ident: &str) -> bool {
        BUILTIN_IDENTS.contains(&ident)
    }

    /// Effective listing excludes (defaults + extend-exclude, or custom).
    pub fn effective_excludes(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = if self.exclude.is_empty() {
            DEFAULT_EXCLUDES.to_vec()
        } else {
            self.exclude.iter().map(|s| s.as_str()).collect()
        };
        patterns.extend(self.extend_exclude.iter().map(|s| s.as_str()));
        patterns
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();
        match &self.source {
            Some(source) => lines.push(format!("   Config: {}", source)),
            None => lines.push("   Config: (defaults)".to_string()),
        }
        lines.push(format!("   Max depth: {}", self.max_depth));
        let ignore = self.effective_ignore();
        lines.push(format!("   Ignore list: {} identifiers", ignore.len()));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ignore_list() {
        let config = Config::default();
        assert!(config.is_ignored_root("fmt"));
        assert!(config.is_ignored_root("errors"));
        assert!(config.is_ignored_root("len"));
        assert!(!config.is_ignored_root("httpkit"));
    }

    #[test]
    fn test_extend_ignore() {
        let config = Config {
            extend_ignore: vec!["zap".to_string()],
            ..Default::default()
        };
        // Defaults survive
        assert!(config.is_ignored_root("fmt"));
        // Plus the extension
        assert!(config.is_ignored_root("zap"));
    }

    #[test]
    fn test_replace_ignore() {
        let config = Config {
            ignore: vec!["onlyme".to_string()],
            ..Default::default()
        };
        assert!(config.is_ignored_root("onlyme"));
        assert!(!config.is_ignored_root("fmt"));
    }

    #[test]
    fn test_builtins() {
        let config = Config::default();
        assert!(config.is_builtin("append"));
        assert!(config.is_builtin("string"));
        assert!(config.is_builtin("recover"));
        assert!(!config.is_builtin("Println"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/dir"));
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_load_toml() {
        let dir = std::env::temp_dir().join("flowmap_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("flowmap.toml"),
            "max-depth = 5\nextend-ignore = [\"zap\"]\n",
        )
        .unwrap();

        let config = Config::load(&dir);
        assert_eq!(config.max_depth, 5);
        assert!(config.is_ignored_root("zap"));
        assert!(config.is_ignored_root("fmt"));
        assert!(config.source.is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
