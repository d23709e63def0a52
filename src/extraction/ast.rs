//! Extracted syntax summary of a single Go source file.

/// A named Go type as written at a use site: optionally qualified by a
/// package identifier (`pkg.T`), pointer indirection already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Local package qualifier (`pkg` in `pkg.T`), `None` for same-package
    /// types.
    pub qualifier: Option<String>,
    /// The named type itself, generics and pointers stripped: `T`.
    pub name: String,
}

impl TypeRef {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

/// One import of the enclosing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit import alias, if any.
    pub alias: Option<String>,
    /// Quoted path with quotes stripped: `example.com/proj/b`.
    pub path: String,
}

impl Import {
    /// The identifier this import is referenced by in source: the alias if
    /// present, otherwise the last path segment.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A variable with a syntactically known type: a parameter, a `var x T`
/// declaration, or a short variable declaration initialized from a
/// composite literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBinding {
    pub name: String,
    pub ty: TypeRef,
    /// Line of the binding; shadowing resolves to the nearest binding at or
    /// before the use site.
    pub line: u32,
}

/// Method receiver of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// Base type name, pointer marker stripped.
    pub type_name: String,
    /// Whether the receiver was declared as `*T`.
    pub pointer: bool,
    /// Receiver variable name (`s` in `func (s *Server) ...`), if named.
    pub var: Option<String>,
}

/// Shape of a call expression's callee, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// `Foo()` - a bare identifier.
    Ident(String),
    /// `x.Sel()`, `pkg.Sel()`, `a.b.c.Sel()` - a selector whose operand is
    /// an identifier chain. `chain` holds the operand segments in source
    /// order, `method` the selected field.
    Selector { chain: Vec<String>, method: String },
    /// `T{}.Do()`, `(&T{}).Do()` - a method call on a composite literal;
    /// the receiver type is known syntactically.
    LiteralReceiver { ty: TypeRef, method: String },
    /// Any other callee shape (`foo().Bar()`, index expressions through
    /// collections). `text` is the callee expression as written, collapsed
    /// to one line, so the placeholder still names what was called.
    Opaque { text: String },
}

/// One call expression inside a declaration body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub target: CallTarget,
    /// 1-indexed line of the call expression.
    pub line: u32,
    /// Comment groups attached to the call site (leading group, then the
    /// trailing same-line comment), joined with ` - `. Empty when none.
    pub doc: String,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Declared identifier, without receiver.
    pub name: String,
    pub receiver: Option<Receiver>,
    /// 1-indexed line of the declaration.
    pub line: u32,
    /// Leading documentation comment, markers stripped, whitespace trimmed.
    pub doc: String,
    pub params: Vec<VarBinding>,
    /// Local bindings with syntactically known types, in declaration order.
    pub locals: Vec<VarBinding>,
    /// Call sites in source order.
    pub calls: Vec<CallSite>,
}

impl FuncDecl {
    /// Registry display name: `T.m` for methods (pointer marker not
    /// retained), the bare identifier for functions.
    pub fn display_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("{}.{}", recv.type_name, self.name),
            None => self.name.clone(),
        }
    }

    /// Single-file listing name, receiver form preserved for the UI:
    /// `(*T).m` for pointer receivers, `(T).m` for value receivers.
    pub fn ui_name(&self) -> String {
        match &self.receiver {
            Some(recv) if recv.pointer => format!("(*{}).{}", recv.type_name, self.name),
            Some(recv) => format!("({}).{}", recv.type_name, self.name),
            None => self.name.clone(),
        }
    }
}

/// Extracted summary of one Go source file.
#[derive(Debug, Clone, Default)]
pub struct GoFile {
    /// Absolute path.
    pub path: String,
    /// Name from the package clause.
    pub package_name: String,
    pub imports: Vec<Import>,
    /// Package-level bindings with explicit types.
    pub scope: Vec<VarBinding>,
    pub functions: Vec<FuncDecl>,
    /// True when tree-sitter reported syntax errors; the file is still
    /// analyzed best-effort.
    pub has_errors: bool,
}

impl GoFile {
    /// Resolve a local package identifier to its import path.
    pub fn import_path_for(&self, local: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|imp| imp.local_name() == local)
            .map(|imp| imp.path.as_str())
    }
}
