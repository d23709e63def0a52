//! Type resolution oracle.
//!
//! The call classifier never inspects syntax directly; it asks an oracle
//! what an identifier means at a given line. The trait keeps the backend
//! swappable - [`ScopeOracle`] answers from the extracted file summary, a
//! richer backend could answer from external tooling.
//!
//! Lookup order mirrors Go scoping: function-local bindings shadow the
//! parameters and receiver, which shadow imports, which shadow
//! package-level bindings, which shadow builtins. Among local bindings the
//! nearest one declared at or before the use site wins, so shadowed
//! identifiers resolve to the innermost declaration.

use crate::config::Config;
use crate::extraction::{FuncDecl, GoFile, TypeRef, VarBinding};

/// What an identifier resolves to at a use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object<'a> {
    /// A language builtin (or primitive type used as a conversion).
    Builtin,
    /// An imported package, by import path.
    Package(&'a str),
    /// A variable with a syntactically known named type.
    Var(&'a TypeRef),
}

/// Resolved-type lookup for identifier uses.
pub trait TypeOracle {
    /// The declared object behind an identifier use, if known.
    fn use_of(&self, ident: &str, at_line: u32) -> Option<Object<'_>>;

    /// The named type of a variable at a use site, if known.
    fn type_of(&self, ident: &str, at_line: u32) -> Option<&TypeRef> {
        match self.use_of(ident, at_line) {
            Some(Object::Var(ty)) => Some(ty),
            _ => None,
        }
    }
}

/// Scope-based oracle over one declaration in one file.
pub struct ScopeOracle<'a> {
    file: &'a GoFile,
    func: &'a FuncDecl,
    config: &'a Config,
    /// Materialized receiver binding (`s` in `func (s *Server) ...`).
    receiver: Option<(String, TypeRef)>,
}

impl<'a> ScopeOracle<'a> {
    pub fn new(file: &'a GoFile, func: &'a FuncDecl, config: &'a Config) -> Self {
        let receiver = func.receiver.as_ref().and_then(|recv| {
            recv.var
                .as_ref()
                .map(|var| (var.clone(), TypeRef::local(recv.type_name.clone())))
        });
        Self {
            file,
            func,
            config,
            receiver,
        }
    }

    /// Nearest binding in a list declared at or before `at_line`.
    fn nearest<'b>(bindings: &'b [VarBinding], ident: &str, at_line: u32) -> Option<&'b TypeRef> {
        bindings
            .iter()
            .filter(|b| b.name == ident && b.line <= at_line)
            .max_by_key(|b| b.line)
            .map(|b| &b.ty)
    }
}

impl TypeOracle for ScopeOracle<'_> {
    fn use_of(&self, ident: &str, at_line: u32) -> Option<Object<'_>> {
        if let Some(ty) = Self::nearest(&self.func.locals, ident, at_line) {
            return Some(Object::Var(ty));
        }
        if let Some(ty) = Self::nearest(&self.func.params, ident, u32::MAX) {
            return Some(Object::Var(ty));
        }
        if let Some((var, ty)) = &self.receiver {
            if var == ident {
                return Some(Object::Var(ty));
            }
        }
        if let Some(path) = self.file.import_path_for(ident) {
            return Some(Object::Package(path));
        }
        if let Some(ty) = Self::nearest(&self.file.scope, ident, u32::MAX) {
            return Some(Object::Var(ty));
        }
        if self.config.is_builtin(ident) {
            return Some(Object::Builtin);
        }
        None
    }
}
