use crate::ast::{
    BinOp, DataType, Expr, ExprKind, Literal, Span, TypeKind, UnOp, VariableDecl,
};
use crate::stdlib::{self, Host};
use crate::typechecker::{ClassTy, FunctionSig, SymbolKind, TypeEnv};
use crate::{t_bool, t_error, t_float, t_int, t_nil, t_string};

use std::rc::Rc;

impl TypeEnv {
    /// Total over the node set: every node gets a type, `<error>` for nodes
    /// that failed their own check.
    pub fn check_expr(&mut self, expr: &Expr) -> DataType {
        let span = &expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => match literal {
                Literal::Bool(_) => t_bool!(),
                Literal::Int(_) => t_int!(),
                Literal::Float(_) => t_float!(),
                Literal::String(_) => t_string!(),
                Literal::Nil => t_nil!(),
            },
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                self.check_unary(*op, ty, span)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                self.check_binary(*op, left, right, span)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                if left.is_error() || right.is_error() {
                    return t_error!();
                }
                if left.kind != TypeKind::Bool || right.kind != TypeKind::Bool {
                    return self.error(
                        span,
                        format!(
                            "'{}' expects bool operands, found {} and {}",
                            op, left, right
                        ),
                    );
                }
                t_bool!()
            }

            ExprKind::VarDeclare(decl) => {
                self.check_var_declaration(decl, span);
                t_nil!()
            }
            ExprKind::VarGet(name) => {
                if !self.expect_kind(name, SymbolKind::Variable, span) {
                    return t_error!();
                }
                match self.get_var(name) {
                    Some(ty) => ty,
                    None => self.error(span, format!("undefined variable '{}'", name)),
                }
            }
            ExprKind::VarSet { name, value } => {
                let value_ty = self.check_expr(value);
                if !self.expect_kind(name, SymbolKind::Variable, span) {
                    return t_error!();
                }
                let Some(var_ty) = self.get_var(name) else {
                    return self.error(span, format!("undefined variable '{}'", name));
                };
                if !value_ty.is_error() && !var_ty.is_error() && value_ty != var_ty {
                    self.error(
                        span,
                        format!(
                            "cannot assign a value of type {} to '{}' of type {}",
                            value_ty, name, var_ty
                        ),
                    );
                }
                var_ty
            }

            ExprKind::FunctionDeclare(decl) => {
                self.check_function_declaration(decl);
                t_nil!()
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::Return(value) => {
                let value_ty = match value {
                    Some(value) => self.check_expr(value),
                    None => t_nil!(),
                };
                match self.return_types.last().cloned() {
                    None => {
                        self.error(span, "cannot return from top-level code");
                    }
                    Some(expected) => {
                        if !value_ty.is_error() && !expected.is_error() && value_ty != expected {
                            self.error(
                                span,
                                format!(
                                    "function must return a value of type {}, found {}",
                                    expected, value_ty
                                ),
                            );
                        }
                    }
                }
                t_nil!()
            }

            ExprKind::Block(exprs) => {
                self.push_scope();
                for expr in exprs {
                    self.check_expr(expr);
                }
                self.pop_scope();
                t_nil!()
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition, "if");
                self.check_expr(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_expr(else_branch);
                }
                t_nil!()
            }
            ExprKind::While { condition, body } => {
                self.check_condition(condition, "while");
                self.check_expr(body);
                t_nil!()
            }
            ExprKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                self.push_scope();
                if let Some(initializer) = initializer {
                    self.check_expr(initializer);
                }
                if let Some(condition) = condition {
                    self.check_condition(condition, "for");
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.check_expr(body);
                self.pop_scope();
                t_nil!()
            }

            ExprKind::ClassDeclare(decl) => {
                self.check_class_declaration(decl);
                t_nil!()
            }
            ExprKind::New(class) => {
                if !self.expect_kind(class, SymbolKind::Class, span) {
                    return t_error!();
                }
                match self.get_class(class) {
                    Some(_) => DataType::custom(class.clone()),
                    None => self.error(span, format!("undefined class '{}'", class)),
                }
            }
            ExprKind::FieldGet { object, field } => {
                let Some(class) = self.instance_class(object, span) else {
                    return t_error!();
                };
                match class.fields.get(field) {
                    Some(ty) => ty.clone(),
                    None => self.error(
                        span,
                        format!("class '{}' has no field '{}'", class.name, field),
                    ),
                }
            }
            ExprKind::FieldSet {
                object,
                field,
                value,
            } => {
                let value_ty = self.check_expr(value);
                let Some(class) = self.instance_class(object, span) else {
                    return t_error!();
                };
                let Some(field_ty) = class.fields.get(field).cloned() else {
                    return self.error(
                        span,
                        format!("class '{}' has no field '{}'", class.name, field),
                    );
                };
                if !value_ty.is_error() && !field_ty.is_error() && value_ty != field_ty {
                    self.error(
                        span,
                        format!(
                            "cannot assign a value of type {} to field '{}' of type {}",
                            value_ty, field, field_ty
                        ),
                    );
                }
                field_ty
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                let arg_types: Vec<DataType> =
                    args.iter().map(|arg| self.check_expr(arg)).collect();
                let Some(class) = self.instance_class(object, span) else {
                    return t_error!();
                };
                let Some(sig) = class.methods.get(method).cloned() else {
                    return self.error(
                        span,
                        format!("class '{}' has no method '{}'", class.name, method),
                    );
                };
                let name = format!("{}.{}", object, method);
                self.check_arguments(&name, &sig, &arg_types, span)
            }

            ExprKind::Import(library) => {
                match stdlib::load(library, &Host::detached()) {
                    Some(natives) => {
                        for native in natives {
                            tracing::debug!(
                                library = %library,
                                name = native.name(),
                                "registering native signature"
                            );
                            self.check_redeclaration(native.name(), SymbolKind::Function, span);
                            self.insert_function(
                                native.name().to_string(),
                                FunctionSig {
                                    params: native.params(),
                                    return_type: native.return_type(),
                                },
                            );
                        }
                    }
                    None => {
                        self.error(span, format!("unknown library '{}'", library));
                    }
                }
                t_nil!()
            }
        }
    }

    /// A declaration must be initialized with a value of exactly the
    /// declared type. The name is bound even when the check fails.
    pub(crate) fn check_var_declaration(&mut self, decl: &VariableDecl, span: &Span) -> DataType {
        let declared = self.type_annot_to_type(&decl.annot, span);
        match &decl.initializer {
            None => {
                self.error(
                    span,
                    format!("variable '{}' must be initialized", decl.name),
                );
            }
            Some(initializer) => {
                let actual = self.check_expr(initializer);
                if !actual.is_error() && !declared.is_error() && actual != declared {
                    self.error(
                        span,
                        format!(
                            "cannot initialize '{}' of type {} with a value of type {}",
                            decl.name, declared, actual
                        ),
                    );
                }
            }
        }
        self.check_redeclaration(&decl.name, SymbolKind::Variable, span);
        self.insert_var(decl.name.clone(), declared.clone());
        declared
    }

    fn check_condition(&mut self, condition: &Expr, construct: &str) {
        let ty = self.check_expr(condition);
        if !ty.is_error() && ty.kind != TypeKind::Bool {
            self.error(
                &condition.span,
                format!("'{}' condition must be bool, found {}", construct, ty),
            );
        }
    }

    fn check_unary(&mut self, op: UnOp, ty: DataType, span: &Span) -> DataType {
        if ty.is_error() {
            return ty;
        }
        match op {
            UnOp::Minus if ty.is_numeric() => ty,
            UnOp::Minus => self.error(span, format!("unary '-' expects int or float, found {}", ty)),
            UnOp::Not if ty.kind == TypeKind::Bool => ty,
            UnOp::Not => self.error(span, format!("unary '!' expects bool, found {}", ty)),
        }
    }

    fn check_binary(&mut self, op: BinOp, left: DataType, right: DataType, span: &Span) -> DataType {
        if left.is_error() || right.is_error() {
            return t_error!();
        }
        if left != right {
            return self.error(
                span,
                format!(
                    "operands of '{}' must have the same type, found {} and {}",
                    op, left, right
                ),
            );
        }

        if op.is_equality() {
            return t_bool!();
        }

        if op.is_arithmetic() {
            return match left.kind {
                TypeKind::Int | TypeKind::Float => left,
                TypeKind::String if op == BinOp::Add => left,
                TypeKind::String => {
                    self.error(span, format!("strings only support '+', found '{}'", op))
                }
                _ => self.error(
                    span,
                    format!("operator '{}' cannot be applied to {}", op, left),
                ),
            };
        }

        // relational
        if left.is_numeric() {
            t_bool!()
        } else {
            self.error(
                span,
                format!("operator '{}' cannot be applied to {}", op, left),
            )
        }
    }

    /// Resolves the class of the instance held in variable `object`.
    fn instance_class(&mut self, object: &str, span: &Span) -> Option<Rc<ClassTy>> {
        if !self.expect_kind(object, SymbolKind::Variable, span) {
            return None;
        }
        let Some(ty) = self.get_var(object) else {
            self.error(span, format!("undefined variable '{}'", object));
            return None;
        };
        if ty.is_error() {
            return None;
        }
        match (&ty.kind, &ty.name) {
            (TypeKind::Custom, Some(name)) => match self.get_class(name) {
                Some(class) => Some(class),
                None => {
                    self.error(span, format!("undefined class '{}'", name));
                    None
                }
            },
            _ => {
                self.error(
                    span,
                    format!("'{}' is not a class instance, found {}", object, ty),
                );
                None
            }
        }
    }
}
