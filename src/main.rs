//! flowmap CLI - call-flow cartography for Go repositories.
//!
//! Subcommands:
//! - `info`: validate a repository and print its module report
//! - `functions`: list the functions and methods of one source file
//! - `tree`: print the display directory tree
//! - `flow`: build the call tree from an entry function
//!
//! All subcommands take `--json` for wire-format output; the default is a
//! colored, human-readable rendering.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use flowmap::types::{DirectoryInfo, FunctionNode};
use flowmap::{Analyzer, Config};

#[derive(Parser)]
#[command(name = "flowmap")]
#[command(version)]
#[command(about = "Call-flow cartography for Go repositories")]
struct Cli {
    /// Emit wire-format JSON instead of the human-readable rendering
    #[arg(long, global = true)]
    json: bool,

    /// Show progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a repository and print its module report
    Info {
        /// Project root directory
        root: PathBuf,
    },

    /// List function and method names of one source file
    Functions {
        /// Project root directory
        root: PathBuf,
        /// Source file, absolute or relative to the root
        file: PathBuf,
    },

    /// Print the display directory tree
    Tree {
        /// Project root directory
        root: PathBuf,
        /// Maximum tree depth (unlimited when omitted)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Build the call tree from an entry function
    Flow {
        /// Project root directory
        root: PathBuf,
        /// File or directory owning the entry function
        file: PathBuf,
        /// Entry function name (`Foo` or `T.Method`)
        function: String,
        /// Maximum expansion depth (overrides flowmap.toml)
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Info { root } => {
            let info = flowmap::project::validate(&root.canonicalize().unwrap_or(root.clone()));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else if !info.is_go_project {
                println!("{}: not a Go project", root.display());
            } else {
                println!("module:       {}", or_dash(&info.module_name));
                println!("go version:   {}", or_dash(&info.go_version));
                println!("go files:     {}", info.go_files);
                println!("packages:     {}", info.packages.join(", "));
                println!("dependencies: {}", info.dependencies);
                println!("has tests:    {}", info.has_tests);
            }
        }

        Commands::Functions { root, file } => {
            let analyzer = ingest(root, Config::load(root), cli.verbose)?;
            let names = analyzer.list_functions(file)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }

        Commands::Tree { root, depth } => {
            let analyzer = ingest(root, Config::load(root), cli.verbose)?;
            let tree = analyzer.tree_structure(*depth);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                let mut out = String::new();
                render_directory(&tree, 0, &mut out);
                print!("{out}");
            }
        }

        Commands::Flow {
            root,
            file,
            function,
            depth,
        } => {
            let mut config = Config::load(root);
            if let Some(depth) = depth {
                config.max_depth = *depth;
            }
            let analyzer = ingest(root, config, cli.verbose)?;
            let tree = analyzer.build_call_tree(file, function)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                let mut out = String::new();
                render_flow(&tree, 0, !cli.no_color, &mut out);
                print!("{out}");
            }
        }
    }

    Ok(())
}

fn ingest(root: &PathBuf, config: Config, verbose: bool) -> Result<Analyzer> {
    let start = std::time::Instant::now();
    if verbose {
        eprintln!("📂 Ingesting: {}", root.display());
        eprintln!("{}", config.display_summary());
    }
    let analyzer = Analyzer::ingest_with_config(root, config)?;
    if verbose {
        eprintln!(
            "✓ Loaded {} packages, {} functions ({:.2?})",
            analyzer.package_count(),
            analyzer.registered_functions(),
            start.elapsed()
        );
    }
    Ok(analyzer)
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Indented call-tree rendering: name, package, location; placeholders
/// (never analysed, no children) render dim, external callees yellow.
fn render_flow(node: &FunctionNode, depth: usize, color: bool, out: &mut String) {
    let indent = "  ".repeat(depth);
    let location = short_location(&node.file, node.line);

    let name = if !color {
        node.name.clone()
    } else if node.is_external {
        node.name.yellow().to_string()
    } else if node.is_analysed || !node.children.is_empty() {
        node.name.green().bold().to_string()
    } else {
        node.name.dimmed().to_string()
    };

    let meta = format!("[{}] {}", node.package, location);
    let meta = if color { meta.dimmed().to_string() } else { meta };
    out.push_str(&format!("{indent}{name}  {meta}\n"));

    for child in &node.children {
        render_flow(child, depth + 1, color, out);
    }
}

fn short_location(file: &str, line: u32) -> String {
    let base = file.rsplit('/').next().unwrap_or(file);
    format!("{base}:{line}")
}

fn render_directory(node: &DirectoryInfo, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let marker = if node.is_dir { "/" } else { "" };
    out.push_str(&format!("{indent}{}{marker}\n", node.name));
    for child in &node.children {
        render_directory(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_flow() {
        let cli = Cli::parse_from([
            "flowmap", "flow", "/repo", "a/a.go", "Foo", "--depth", "5", "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Flow {
                function, depth, ..
            } => {
                assert_eq!(function, "Foo");
                assert_eq!(depth, Some(5));
            }
            _ => panic!("expected flow subcommand"),
        }
    }

    #[test]
    fn test_cli_parse_tree_defaults() {
        let cli = Cli::parse_from(["flowmap", "tree", "/repo"]);
        assert!(!cli.json);
        match cli.command {
            Commands::Tree { depth, .. } => assert_eq!(depth, None),
            _ => panic!("expected tree subcommand"),
        }
    }

    #[test]
    fn test_render_flow_plain() {
        let node = FunctionNode {
            name: "Foo".into(),
            package: "example.com/proj/a".into(),
            file: "/repo/a/a.go".into(),
            line: 9,
            doc: String::new(),
            is_external: false,
            is_analysed: true,
            children: vec![FunctionNode {
                name: "Bar".into(),
                package: "example.com/proj/a".into(),
                file: "/repo/a/a.go".into(),
                line: 15,
                doc: String::new(),
                is_external: false,
                is_analysed: true,
                children: vec![],
            }],
        };

        let mut out = String::new();
        render_flow(&node, 0, false, &mut out);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("Foo"));
        assert!(lines[0].contains("a.go:9"));
        assert!(lines[1].starts_with("  "));
        assert!(lines[1].contains("Bar"));
    }

    #[test]
    fn test_short_location() {
        assert_eq!(short_location("/repo/a/a.go", 12), "a.go:12");
        assert_eq!(short_location("a.go", 3), "a.go:3");
    }
}
