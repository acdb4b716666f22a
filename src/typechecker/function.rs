use crate::ast::{DataType, Expr, FunctionDecl, Span};
use crate::{t_error, t_nil};
use crate::typechecker::{FunctionSig, SymbolKind, TypeEnv};

use std::rc::Rc;

impl TypeEnv {
    pub fn check_function_declaration(&mut self, decl: &Rc<FunctionDecl>) {
        let sig = self.function_signature(decl);

        // The signature goes in before the body so recursive calls resolve
        self.check_redeclaration(&decl.name, SymbolKind::Function, &decl.span);
        self.insert_function(decl.name.clone(), sig.clone());

        self.check_function_body(decl, &sig);
    }

    /// Converts the annotations of a declaration. A missing return type
    /// means the function is a procedure returning nil.
    pub(crate) fn function_signature(&mut self, decl: &FunctionDecl) -> FunctionSig {
        let params = decl
            .params
            .iter()
            .map(|param| self.type_annot_to_type(&param.annot, &param.span))
            .collect();
        let return_type = match &decl.return_type {
            Some(annot) => self.type_annot_to_type(annot, &decl.span),
            None => t_nil!(),
        };
        FunctionSig {
            params,
            return_type,
        }
    }

    pub(crate) fn check_function_body(&mut self, decl: &FunctionDecl, sig: &FunctionSig) {
        self.push_scope();
        for (index, (param, ty)) in decl.params.iter().zip(&sig.params).enumerate() {
            if decl.params[..index].iter().any(|p| p.name == param.name) {
                self.error(
                    &param.span,
                    format!(
                        "duplicate parameter '{}' in function '{}'",
                        param.name, decl.name
                    ),
                );
            }
            self.insert_var(param.name.clone(), ty.clone());
        }

        self.return_types.push(sig.return_type.clone());
        for expr in &decl.body {
            self.check_expr(expr);
        }
        self.return_types.pop();
        self.pop_scope();
    }

    pub fn check_call(&mut self, callee: &str, args: &[Expr], span: &Span) -> DataType {
        // arguments are checked even when the callee is unknown
        let arg_types: Vec<DataType> = args.iter().map(|arg| self.check_expr(arg)).collect();
        if !self.expect_kind(callee, SymbolKind::Function, span) {
            return t_error!();
        }
        match self.get_function(callee) {
            Some(sig) => self.check_arguments(callee, &sig, &arg_types, span),
            None => self.error(span, format!("undefined function '{}'", callee)),
        }
    }

    /// Arity first, then each argument positionally. The call has the
    /// declared return type whether or not the arguments fit.
    pub(crate) fn check_arguments(
        &mut self,
        name: &str,
        sig: &FunctionSig,
        arg_types: &[DataType],
        span: &Span,
    ) -> DataType {
        if sig.params.len() != arg_types.len() {
            self.error(
                span,
                format!(
                    "'{}' expects {} arguments, found {}",
                    name,
                    sig.params.len(),
                    arg_types.len()
                ),
            );
            return sig.return_type.clone();
        }

        for (index, (param, arg)) in sig.params.iter().zip(arg_types).enumerate() {
            if param.is_error() || arg.is_error() || param.accepts(arg) {
                continue;
            }
            self.error(
                span,
                format!(
                    "argument {} of '{}' must be {}, found {}",
                    index + 1,
                    name,
                    param,
                    arg
                ),
            );
        }
        sig.return_type.clone()
    }
}
