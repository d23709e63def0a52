//! Tree-sitter based extraction of Go syntax summaries.
//!
//! Walks the tree-sitter AST manually rather than through `.scm` queries:
//! the extraction needs nested structure (parameters of a declaration,
//! locals inside its body, the shape of each callee expression) that is
//! awkward to express as flat query captures.
//!
//! Line numbers are 1-indexed throughout, matching `tree_sitter`'s
//! `start_position().row + 1`.

use std::path::Path;

use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser as TsParser};

use crate::error::{FlowmapError, Result};

use super::ast::{CallSite, CallTarget, FuncDecl, GoFile, Import, Receiver, TypeRef, VarBinding};

static GO: Lazy<Language> = Lazy::new(|| tree_sitter_go::LANGUAGE.into());

/// Longest callee text kept for opaque call targets.
const OPAQUE_TEXT_LIMIT: usize = 80;

/// Parser for Go source files. Holds the tree-sitter parser state; one
/// instance parses any number of files sequentially.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&GO)
            .map_err(|e| FlowmapError::Parse(format!("failed to load Go grammar: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse a file from disk.
    pub fn parse_file(&mut self, path: &Path) -> Result<GoFile> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source, path)
    }

    /// Parse Go source text into its syntax summary.
    pub fn parse_source(&mut self, source: &str, path: &Path) -> Result<GoFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FlowmapError::Parse(format!("tree-sitter gave up on {}", path.display())))?;
        let root = tree.root_node();

        let mut comments = Vec::new();
        collect_comments(root, source, &mut comments);
        let ex = Extractor { src: source, comments };

        let mut file = GoFile {
            path: path.display().to_string(),
            has_errors: root.has_error(),
            ..Default::default()
        };

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(ident) = find_kind(child, "package_identifier") {
                        file.package_name = ex.text(ident).to_string();
                    }
                }
                "import_declaration" => ex.collect_imports(child, &mut file.imports),
                "function_declaration" => {
                    if let Some(decl) = ex.function_decl(child, None) {
                        file.functions.push(decl);
                    }
                }
                "method_declaration" => {
                    let receiver = child
                        .child_by_field_name("receiver")
                        .and_then(|r| ex.receiver(r));
                    if let Some(decl) = ex.function_decl(child, receiver) {
                        file.functions.push(decl);
                    }
                }
                "var_declaration" => ex.collect_var_bindings(child, &mut file.scope),
                _ => {}
            }
        }

        Ok(file)
    }
}

/// One comment node, markers stripped.
struct Comment {
    start_line: u32,
    end_line: u32,
    text: String,
}

struct Extractor<'s> {
    src: &'s str,
    comments: Vec<Comment>,
}

impl<'s> Extractor<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// The contiguous comment group ending exactly at `line`, top-down,
    /// joined with newlines. This is the doc comment of a declaration on
    /// `line + 1`, or the leading comment group of a call site.
    fn group_ending_at(&self, line: u32) -> Option<String> {
        let end = self
            .comments
            .iter()
            .rposition(|c| c.end_line == line)?;
        let mut start = end;
        while start > 0 && self.comments[start - 1].end_line + 1 == self.comments[start].start_line
        {
            start -= 1;
        }
        let joined = self.comments[start..=end]
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// A trailing comment sharing `line` with code.
    fn trailing_at(&self, line: u32) -> Option<String> {
        self.comments
            .iter()
            .find(|c| c.start_line == line)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Comment groups attached to a call site: the leading group ending on
    /// the previous line, then the trailing same-line comment, joined with
    /// ` - `.
    fn call_doc(&self, line: u32) -> String {
        let mut groups = Vec::new();
        if line > 1 {
            if let Some(leading) = self.group_ending_at(line - 1) {
                groups.push(leading);
            }
        }
        if let Some(trailing) = self.trailing_at(line) {
            groups.push(trailing);
        }
        groups.join(" - ")
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    fn collect_imports(&self, node: Node, out: &mut Vec<Import>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(imp) = self.import_spec(child) {
                        out.push(imp);
                    }
                }
                "import_spec_list" => self.collect_imports(child, out),
                _ => {}
            }
        }
    }

    fn import_spec(&self, node: Node) -> Option<Import> {
        let path_node = node.child_by_field_name("path")?;
        let path = self
            .text(path_node)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        let alias = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());
        Some(Import { alias, path })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn function_decl(&self, node: Node, receiver: Option<Receiver>) -> Option<FuncDecl> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let line = line_of(node);
        let doc = if line > 1 {
            self.group_ending_at(line - 1).unwrap_or_default()
        } else {
            String::new()
        };

        let mut decl = FuncDecl {
            name,
            receiver,
            line,
            doc,
            params: Vec::new(),
            locals: Vec::new(),
            calls: Vec::new(),
        };

        if let Some(params) = node.child_by_field_name("parameters") {
            self.collect_params(params, &mut decl.params);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_body(body, &mut decl);
        }

        Some(decl)
    }

    fn receiver(&self, list: Node) -> Option<Receiver> {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if param.kind() != "parameter_declaration" {
                continue;
            }
            let ty_node = param.child_by_field_name("type")?;
            let pointer = ty_node.kind() == "pointer_type";
            let base = type_ref(ty_node, self.src)?;
            let var = param
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string());
            return Some(Receiver {
                type_name: base.name,
                pointer,
                var,
            });
        }
        None
    }

    fn collect_params(&self, list: Node, out: &mut Vec<VarBinding>) {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let ty_node = match param.child_by_field_name("type") {
                Some(n) => n,
                None => continue,
            };
            let ty = match type_ref(ty_node, self.src) {
                Some(t) => t,
                None => continue,
            };
            let line = line_of(param);
            let mut inner = param.walk();
            for child in param.named_children(&mut inner) {
                if child.kind() == "identifier" && child.start_byte() < ty_node.start_byte() {
                    out.push(VarBinding {
                        name: self.text(child).to_string(),
                        ty: ty.clone(),
                        line,
                    });
                }
            }
        }
    }

    /// Bindings from a `var` declaration: explicit types, or composite
    /// literal initializers (`var x = T{}`).
    fn collect_var_bindings(&self, node: Node, out: &mut Vec<VarBinding>) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            if spec.kind() != "var_spec" {
                continue;
            }
            let line = line_of(spec);
            if let Some(ty) = spec
                .child_by_field_name("type")
                .and_then(|t| type_ref(t, self.src))
            {
                let mut inner = spec.walk();
                for child in spec.named_children(&mut inner) {
                    if child.kind() == "identifier" {
                        out.push(VarBinding {
                            name: self.text(child).to_string(),
                            ty: ty.clone(),
                            line,
                        });
                    }
                }
            } else if let Some(value) = spec.child_by_field_name("value") {
                self.zip_initializers(spec, value, line, out);
            }
        }
    }

    /// Pair names with initializer expressions and keep the pairs whose
    /// initializer is a composite literal (`x := T{}`, `x := &pkg.T{...}`).
    fn zip_initializers(&self, names: Node, values: Node, line: u32, out: &mut Vec<VarBinding>) {
        let mut name_cursor = names.walk();
        let idents: Vec<Node> = names
            .named_children(&mut name_cursor)
            .filter(|n| n.kind() == "identifier")
            .collect();
        let mut value_cursor = values.walk();
        let exprs: Vec<Node> = values.named_children(&mut value_cursor).collect();

        for (ident, expr) in idents.iter().zip(exprs.iter()) {
            if let Some(ty) = literal_type(*expr, self.src) {
                out.push(VarBinding {
                    name: self.text(*ident).to_string(),
                    ty,
                    line,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    fn collect_body(&self, node: Node, decl: &mut FuncDecl) {
        match node.kind() {
            "call_expression" => self.record_call(node, decl),
            "short_var_declaration" => {
                if let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) {
                    self.zip_initializers(left, right, line_of(node), &mut decl.locals);
                }
            }
            "var_declaration" => self.collect_var_bindings(node, &mut decl.locals),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.collect_body(child, decl);
        }
    }

    fn record_call(&self, node: Node, decl: &mut FuncDecl) {
        let fun = match node.child_by_field_name("function") {
            Some(f) => f,
            None => return,
        };
        let target = match self.call_target(fun) {
            Some(t) => t,
            None => return,
        };
        let line = line_of(node);
        decl.calls.push(CallSite {
            target,
            line,
            doc: self.call_doc(line),
        });
    }

    fn call_target(&self, fun: Node) -> Option<CallTarget> {
        match fun.kind() {
            "identifier" => Some(CallTarget::Ident(self.text(fun).to_string())),
            "selector_expression" => {
                let method = self.text(fun.child_by_field_name("field")?).to_string();
                let operand = fun.child_by_field_name("operand")?;
                if let Some(chain) = ident_chain(operand, self.src) {
                    Some(CallTarget::Selector { chain, method })
                } else if let Some(ty) = literal_type(operand, self.src) {
                    Some(CallTarget::LiteralReceiver { ty, method })
                } else {
                    Some(CallTarget::Opaque {
                        text: collapse(self.text(fun)),
                    })
                }
            }
            "parenthesized_expression" => self.call_target(fun.named_child(0)?),
            // Immediately-invoked literals have no callee identity; their
            // body calls are collected by the surrounding walk.
            "func_literal" => None,
            _ => Some(CallTarget::Opaque {
                text: collapse(self.text(fun)),
            }),
        }
    }
}

// ----------------------------------------------------------------------
// Free helpers
// ----------------------------------------------------------------------

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn find_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let result = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    result
}

/// Resolve a type expression to its named base type, stripping pointers,
/// generics, and parentheses. Slices, maps, funcs, and anonymous types have
/// no method-bearing name and yield `None`.
fn type_ref(node: Node, src: &str) -> Option<TypeRef> {
    match node.kind() {
        "type_identifier" => Some(TypeRef::local(node.utf8_text(src.as_bytes()).unwrap_or(""))),
        "qualified_type" => {
            let package = node.child_by_field_name("package")?;
            let name = node.child_by_field_name("name")?;
            Some(TypeRef::qualified(
                package.utf8_text(src.as_bytes()).unwrap_or(""),
                name.utf8_text(src.as_bytes()).unwrap_or(""),
            ))
        }
        "pointer_type" | "parenthesized_type" => type_ref(node.named_child(0)?, src),
        "generic_type" => type_ref(node.child_by_field_name("type")?, src),
        _ => None,
    }
}

/// An operand made purely of identifiers: `x`, `a.b`, `a.b.c`.
fn ident_chain(node: Node, src: &str) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(vec![node.utf8_text(src.as_bytes()).unwrap_or("").to_string()]),
        "selector_expression" => {
            let mut chain = ident_chain(node.child_by_field_name("operand")?, src)?;
            let field = node.child_by_field_name("field")?;
            chain.push(field.utf8_text(src.as_bytes()).unwrap_or("").to_string());
            Some(chain)
        }
        _ => None,
    }
}

/// The named type of a composite literal receiver: `T{}`, `&T{}`,
/// `(&pkg.T{...})`.
fn literal_type(node: Node, src: &str) -> Option<TypeRef> {
    match node.kind() {
        "composite_literal" => type_ref(node.child_by_field_name("type")?, src),
        "parenthesized_expression" => literal_type(node.named_child(0)?, src),
        "unary_expression" => literal_type(node.child_by_field_name("operand")?, src),
        _ => None,
    }
}

fn collapse(text: &str) -> String {
    let one_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    one_line.chars().take(OPAQUE_TEXT_LIMIT).collect()
}

fn collect_comments(node: Node, src: &str, out: &mut Vec<Comment>) {
    if node.kind() == "comment" {
        let raw = node.utf8_text(src.as_bytes()).unwrap_or("");
        out.push(Comment {
            start_line: line_of(node),
            end_line: node.end_position().row as u32 + 1,
            text: comment_text(raw),
        });
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_comments(child, src, out);
    }
}

/// Strip comment markers the way Go doc text does.
fn comment_text(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("//") {
        return rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string();
    }
    let body = raw
        .strip_prefix("/*")
        .and_then(|r| r.strip_suffix("*/"))
        .unwrap_or(raw);
    body.lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
