//! Call-expression classification.
//!
//! Each call site is sorted into one of six cases:
//! 1. builtin - dropped
//! 2. direct same-package call - bare identifier
//! 3. method call with a receiver the oracle can type
//! 4. qualified call into an imported package
//! 5. method call through a typed variable (oracle fallback)
//! 6. unresolved selector - placeholder, callee identity unknown
//!
//! The ignore list is consulted against the selector root before
//! resolution; that is noise suppression, not a semantic rule. Deep
//! selector chains (`a.b.c.Sel`) collapse to their innermost identifier
//! for receiver lookup and fall back to an unresolved placeholder named
//! with the full chain.

use crate::config::Config;
use crate::extraction::{CallSite, CallTarget, GoFile, TypeRef};
use crate::oracle::{Object, TypeOracle};

/// The classified identity of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallClass {
    /// Language builtin; emits no child.
    Builtin,
    /// Selector root on the ignore list; emits no child.
    Ignored,
    /// Bare identifier, resolved within the caller's package.
    SamePackage { name: String },
    /// Method on a receiver of named type `type_name` owned by `package`.
    Method {
        package: String,
        type_name: String,
        method: String,
    },
    /// Qualified call into an imported package.
    Imported { package: String, name: String },
    /// Callee identity unknown; `name` is the callee as written.
    Unresolved { name: String },
}

/// Classify a call site against the oracle and the caller's file context.
pub fn classify(
    call: &CallSite,
    oracle: &dyn TypeOracle,
    file: &GoFile,
    current_pkg: &str,
    config: &Config,
) -> CallClass {
    match &call.target {
        CallTarget::Ident(name) => match oracle.use_of(name, call.line) {
            Some(Object::Builtin) => CallClass::Builtin,
            _ => CallClass::SamePackage { name: name.clone() },
        },

        CallTarget::Selector { chain, method } => {
            let root = chain[0].as_str();
            if config.is_ignored_root(root) {
                return CallClass::Ignored;
            }

            if chain.len() == 1 {
                match oracle.use_of(root, call.line) {
                    Some(Object::Var(ty)) => method_class(ty, method, file, current_pkg),
                    Some(Object::Package(path)) => CallClass::Imported {
                        package: path.to_string(),
                        name: method.clone(),
                    },
                    _ => CallClass::Unresolved {
                        name: format!("{root}.{method}"),
                    },
                }
            } else {
                // Deep chain: receiver lookup on the innermost identifier,
                // full chain as the fallback identity.
                match oracle.type_of(root, call.line) {
                    Some(ty) => method_class(ty, method, file, current_pkg),
                    None => CallClass::Unresolved {
                        name: format!("{}.{}", chain.join("."), method),
                    },
                }
            }
        }

        CallTarget::LiteralReceiver { ty, method } => {
            method_class(ty, method, file, current_pkg)
        }

        CallTarget::Opaque { text } => CallClass::Unresolved { name: text.clone() },
    }
}

/// Build the method case for a receiver type, attributing the type to its
/// owning package: the caller's package for unqualified types, the import
/// path for qualified ones.
fn method_class(ty: &TypeRef, method: &str, file: &GoFile, current_pkg: &str) -> CallClass {
    let package = match &ty.qualifier {
        None => current_pkg.to_string(),
        Some(q) => file
            .import_path_for(q)
            .map(str::to_string)
            .unwrap_or_else(|| current_pkg.to_string()),
    };
    CallClass::Method {
        package,
        type_name: ty.name.clone(),
        method: method.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::GoParser;
    use crate::oracle::ScopeOracle;
    use std::path::Path;

    const PKG: &str = "example.com/proj/a";

    fn fixture() -> GoFile {
        let mut parser = GoParser::new().unwrap();
        parser
            .parse_source(
                r#"package a

import (
	"fmt"
	"example.com/proj/b"
)

func Foo(conn b.Conn) {
	Bar()
	len(x)
	fmt.Println("x")
	b.Baz()
	conn.Close()
	t := T{}
	t.Do()
	x.Unknown()
	s.cfg.reload.Apply()
	(&T{}).Do()
}
"#,
                Path::new("/proj/a/a.go"),
            )
            .unwrap()
    }

    fn classes(file: &GoFile) -> Vec<CallClass> {
        let config = Config::default();
        let func = &file.functions[0];
        let oracle = ScopeOracle::new(file, func, &config);
        func.calls
            .iter()
            .map(|c| classify(c, &oracle, file, PKG, &config))
            .collect()
    }

    #[test]
    fn test_six_cases() {
        let file = fixture();
        let got = classes(&file);

        assert_eq!(
            got[0],
            CallClass::SamePackage { name: "Bar".into() }
        );
        assert_eq!(got[1], CallClass::Builtin);
        assert_eq!(got[2], CallClass::Ignored);
        assert_eq!(
            got[3],
            CallClass::Imported {
                package: "example.com/proj/b".into(),
                name: "Baz".into()
            }
        );
        // Parameter typed through an imported package
        assert_eq!(
            got[4],
            CallClass::Method {
                package: "example.com/proj/b".into(),
                type_name: "Conn".into(),
                method: "Close".into()
            }
        );
        // Local short declaration
        assert_eq!(
            got[5],
            CallClass::Method {
                package: PKG.into(),
                type_name: "T".into(),
                method: "Do".into()
            }
        );
        // Untyped variable
        assert_eq!(
            got[6],
            CallClass::Unresolved {
                name: "x.Unknown".into()
            }
        );
        // Deep chain with unresolvable root
        assert_eq!(
            got[7],
            CallClass::Unresolved {
                name: "s.cfg.reload.Apply".into()
            }
        );
        // Composite literal receiver
        assert_eq!(
            got[8],
            CallClass::Method {
                package: PKG.into(),
                type_name: "T".into(),
                method: "Do".into()
            }
        );
    }

    #[test]
    fn test_ignore_list_beats_resolution() {
        let mut parser = GoParser::new().unwrap();
        let file = parser
            .parse_source(
                "package a\n\nfunc Foo() {\n\tsort.Slice(xs, nil)\n}\n",
                Path::new("/proj/a/a.go"),
            )
            .unwrap();
        let got = classes(&file);
        assert_eq!(got[0], CallClass::Ignored);
    }
}
