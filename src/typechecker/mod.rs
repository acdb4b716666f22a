pub mod class_;
pub mod expression;
pub mod function;

#[cfg(test)]
pub mod test;

use rustc_hash::FxHashMap;

use std::fmt;
use std::rc::Rc;

use crate::ast::{DataType, Expr, Span, TypeAnnot};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::{t_bool, t_error, t_float, t_int, t_nil, t_string};

/// Parameter types in declaration order plus the return type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub params: Vec<DataType>,
    pub return_type: DataType,
}

#[derive(Debug, Clone, Default)]
pub struct ClassTy {
    pub name: String,
    pub fields: FxHashMap<String, DataType>,
    pub methods: FxHashMap<String, FunctionSig>,
}

/// One lexical scope: three independent symbol tables.
///
/// A name sits in at most one of them. At run time the three kinds share a
/// single binding per frame, so declaring a name replaces whatever that
/// scope bound it to before.
#[derive(Debug, Default)]
pub struct Scope {
    pub variables: FxHashMap<String, DataType>,
    pub functions: FxHashMap<String, FunctionSig>,
    pub classes: FxHashMap<String, Rc<ClassTy>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
        })
    }
}

impl Scope {
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        if self.variables.contains_key(name) {
            Some(SymbolKind::Variable)
        } else if self.functions.contains_key(name) {
            Some(SymbolKind::Function)
        } else if self.classes.contains_key(name) {
            Some(SymbolKind::Class)
        } else {
            None
        }
    }

    fn unbind(&mut self, name: &str) {
        self.variables.remove(name);
        self.functions.remove(name);
        self.classes.remove(name);
    }
}

#[derive(Debug)]
pub struct TypeEnv {
    scopes: Vec<Scope>,
    /// Declared return type of each function body being checked.
    return_types: Vec<DataType>,
    errors: Vec<Diagnostic>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![Scope::default()],
            return_types: vec![],
            errors: vec![],
        }
    }

    /// Checks the whole program in one pass and returns the type of each
    /// top-level expression. Every fault is recorded; checking never stops
    /// early.
    #[tracing::instrument(level = "debug", skip_all, fields(count = program.len()))]
    pub fn check_program(&mut self, program: &[Expr]) -> Vec<DataType> {
        let types = program.iter().map(|expr| self.check_expr(expr)).collect();
        tracing::debug!(errors = self.errors.len(), "type check finished");
        types
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.errors
    }

    /// Records a fault and hands back the sentinel type for the node.
    pub(crate) fn error(&mut self, span: &Span, message: impl Into<String>) -> DataType {
        self.errors.push(Diagnostic::new(
            DiagnosticKind::Type,
            span.line,
            span.range.clone(),
            message,
        ));
        t_error!()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        // the global scope is never popped
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn innermost(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn insert_var(&mut self, var: String, ty: DataType) {
        let scope = self.innermost();
        scope.unbind(&var);
        scope.variables.insert(var, ty);
    }

    pub fn get_var(&self, var: &str) -> Option<DataType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(var).cloned())
    }

    pub fn insert_function(&mut self, name: String, sig: FunctionSig) {
        let scope = self.innermost();
        scope.unbind(&name);
        scope.functions.insert(name, sig);
    }

    pub fn get_function(&self, name: &str) -> Option<FunctionSig> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.functions.get(name).cloned())
    }

    /// Registers a class `depth` scopes out from the innermost one.
    pub(crate) fn insert_class_at(&mut self, depth: usize, class: Rc<ClassTy>) {
        let index = self.scopes.len().saturating_sub(1 + depth);
        let scope = &mut self.scopes[index];
        scope.unbind(&class.name);
        scope.classes.insert(class.name.clone(), class);
    }

    /// Kind of the nearest binding of `name`, searching the way the
    /// evaluator does: the innermost scope that binds it as anything wins.
    pub fn resolve(&self, name: &str) -> Option<SymbolKind> {
        self.scopes.iter().rev().find_map(|scope| scope.kind_of(name))
    }

    /// Reports a use of `name` as `expected` when a nearer binding of
    /// another kind hides it. Unbound names pass; callers report those.
    pub(crate) fn expect_kind(&mut self, name: &str, expected: SymbolKind, span: &Span) -> bool {
        match self.resolve(name) {
            Some(found) if found != expected => {
                self.error(span, format!("'{}' is a {}, not a {}", name, found, expected));
                false
            }
            _ => true,
        }
    }

    /// Reports a declaration that would replace a binding of another kind
    /// in the innermost scope.
    pub(crate) fn check_redeclaration(&mut self, name: &str, kind: SymbolKind, span: &Span) {
        if let Some(existing) = self.innermost().kind_of(name).filter(|k| *k != kind) {
            self.error(
                span,
                format!("'{}' is already declared as a {} in this scope", name, existing),
            );
        }
    }

    pub fn get_class(&self, name: &str) -> Option<Rc<ClassTy>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.classes.get(name).cloned())
    }

    pub fn type_annot_to_type(&mut self, annot: &TypeAnnot, span: &Span) -> DataType {
        match annot {
            TypeAnnot::Bool => t_bool!(),
            TypeAnnot::Int => t_int!(),
            TypeAnnot::Float => t_float!(),
            TypeAnnot::String => t_string!(),
            TypeAnnot::Nil => t_nil!(),
            TypeAnnot::Named(name) => match self.get_class(name) {
                Some(_) => DataType::custom(name.clone()),
                None => self.error(span, format!("unknown type '{}'", name)),
            },
        }
    }
}

/// Type-checks a parsed program. On success yields the type of each
/// top-level expression, otherwise every diagnostic found.
pub fn check(program: &[Expr]) -> Result<Vec<DataType>, Vec<Diagnostic>> {
    let mut env = TypeEnv::new();
    let types = env.check_program(program);
    if env.errors.is_empty() {
        Ok(types)
    } else {
        Err(env.errors)
    }
}
