pub mod class_;
pub mod environment;
pub mod function;
pub mod operators;
pub mod stack;
pub mod value;


pub use environment::{EnvGuard, EnvId, Environments};
pub use value::{ClassValue, FunctionValue, Value};

use thiserror::Error;

use crate::ast::{Expr, ExprKind, Literal, LogicOp, Span};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::stdlib::{self, Host};

/// A fault raised while evaluating, located at the node that failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub span: Span,
    pub message: String,
}

impl RuntimeError {
    pub fn new(span: &Span, message: impl Into<String>) -> Self {
        RuntimeError {
            span: span.clone(),
            message: message.into(),
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::Runtime,
            self.span.line,
            self.span.range,
            self.message,
        )
    }
}

pub type EvalResult = Result<Value, RuntimeError>;

/// Tree-walking evaluator. One instance runs one program.
#[derive(Debug)]
pub struct Interpreter {
    envs: Environments,
    current: EnvId,
    host: Host,
    config: Config,
    /// Script calls currently in progress.
    depth: usize,
}

impl Interpreter {
    pub fn new(host: Host, config: Config) -> Self {
        let envs = Environments::new();
        let current = envs.global();
        Interpreter {
            envs,
            current,
            host,
            config,
            depth: 0,
        }
    }

    pub fn environments(&self) -> &Environments {
        &self.envs
    }

    /// Looks a name up from the global frame.
    pub fn global_value(&self, name: &str) -> Option<&Value> {
        self.envs.get(self.envs.global(), name)
    }

    /// Evaluates the top-level expressions in order and yields the value of
    /// the last one. A top-level `return` stops the program with its value.
    #[tracing::instrument(level = "debug", skip_all, fields(count = program.len()))]
    pub fn run_program(&mut self, program: &[Expr]) -> EvalResult {
        let global = self.envs.global();
        let mut last = Value::Nil;
        for expr in program {
            last = self.eval(expr)?;
            if self.envs.return_pending(global) {
                tracing::debug!("top-level return");
                break;
            }
        }
        Ok(self.envs.take_return(global).unwrap_or(last))
    }

    pub fn eval(&mut self, expr: &Expr) -> EvalResult {
        stack::ensure_sufficient_stack(|| self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        let span = &expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(x) => Value::Float(*x),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Nil => Value::Nil,
            }),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                operators::evaluate_unary(*op, &value).map_err(|m| RuntimeError::new(span, m))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                operators::evaluate_binary(*op, &left, &right)
                    .map_err(|m| RuntimeError::new(span, m))
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval_bool(left, &op.to_string())?;
                match (op, left) {
                    (LogicOp::And, false) => Ok(Value::Bool(false)),
                    (LogicOp::Or, true) => Ok(Value::Bool(true)),
                    _ => Ok(Value::Bool(self.eval_bool(right, &op.to_string())?)),
                }
            }

            ExprKind::VarDeclare(decl) => {
                let value = match &decl.initializer {
                    Some(initializer) => self.eval(initializer)?,
                    None => Value::Nil,
                };
                self.envs.define(self.current, decl.name.clone(), value);
                Ok(Value::Nil)
            }
            ExprKind::VarGet(name) => self
                .envs
                .get(self.current, name)
                .cloned()
                .ok_or_else(|| RuntimeError::new(span, format!("undefined variable '{}'", name))),
            ExprKind::VarSet { name, value } => {
                let value = self.eval(value)?;
                if !self.envs.assign(self.current, name, value.clone()) {
                    return Err(RuntimeError::new(
                        span,
                        format!("undefined variable '{}'", name),
                    ));
                }
                Ok(value)
            }

            ExprKind::FunctionDeclare(decl) => {
                let function = FunctionValue {
                    decl: decl.clone(),
                    closure: self.envs.capture(self.current),
                };
                self.envs
                    .define(self.current, decl.name.clone(), Value::Function(function));
                Ok(Value::Nil)
            }
            ExprKind::Call { callee, args } => {
                let Some(callee_value) = self.envs.get(self.current, callee).cloned() else {
                    return Err(RuntimeError::new(
                        span,
                        format!("undefined function '{}'", callee),
                    ));
                };
                let args = self.eval_arguments(args)?;
                self.call_value(callee, callee_value, args, span)
            }
            ExprKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value)?,
                    None => Value::Nil,
                };
                self.envs.set_return(self.current, value);
                Ok(Value::Nil)
            }

            ExprKind::Block(exprs) => {
                let frame = self.envs.push(self.current, false);
                let result = self.with_current(frame, |this| this.eval_sequence(exprs));
                self.envs.release(frame);
                result.map(|_| Value::Nil)
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(condition, "if")? {
                    self.eval(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch)?;
                }
                Ok(Value::Nil)
            }
            ExprKind::While { condition, body } => {
                while self.eval_condition(condition, "while")? {
                    self.eval(body)?;
                    if self.envs.return_pending(self.current) {
                        break;
                    }
                }
                Ok(Value::Nil)
            }
            ExprKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                let frame = self.envs.push(self.current, false);
                let result = self.with_current(frame, |this| {
                    if let Some(initializer) = initializer {
                        this.eval(initializer)?;
                    }
                    loop {
                        if let Some(condition) = condition {
                            if !this.eval_condition(condition, "for")? {
                                break;
                            }
                        }
                        this.eval(body)?;
                        if this.envs.return_pending(this.current) {
                            break;
                        }
                        if let Some(update) = update {
                            this.eval(update)?;
                        }
                    }
                    Ok(())
                });
                self.envs.release(frame);
                result.map(|_| Value::Nil)
            }

            ExprKind::ClassDeclare(decl) => self.declare_class(decl),
            ExprKind::New(name) => {
                // held until the instance guards the declaring frame itself
                let value = self.envs.get(self.current, name).cloned();
                match &value {
                    Some(Value::Class { class, .. }) => self.instantiate(class),
                    Some(other) => Err(RuntimeError::new(
                        span,
                        format!("'{}' is not a class, found {}", name, other.type_name()),
                    )),
                    None => Err(RuntimeError::new(
                        span,
                        format!("undefined class '{}'", name),
                    )),
                }
            }
            ExprKind::FieldGet { object, field } => {
                let (class, env) = self.instance(object, span)?;
                self.envs.get_local(env.id(), field).cloned().ok_or_else(|| {
                    RuntimeError::new(
                        span,
                        format!("class '{}' has no field '{}'", class.decl.name, field),
                    )
                })
            }
            ExprKind::FieldSet {
                object,
                field,
                value,
            } => {
                let value = self.eval(value)?;
                let (class, env) = self.instance(object, span)?;
                if self.envs.get_local(env.id(), field).is_none() {
                    return Err(RuntimeError::new(
                        span,
                        format!("class '{}' has no field '{}'", class.decl.name, field),
                    ));
                }
                self.envs.define(env.id(), field.clone(), value.clone());
                Ok(value)
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                // `env` keeps the instance frame alive for the whole call
                let (class, env) = self.instance(object, span)?;
                let args = self.eval_arguments(args)?;
                match self.envs.get_local(env.id(), method).cloned() {
                    Some(Value::Function(function)) => self.call_function(&function, args, span),
                    _ => Err(RuntimeError::new(
                        span,
                        format!("class '{}' has no method '{}'", class.decl.name, method),
                    )),
                }
            }

            ExprKind::Import(library) => {
                let Some(natives) = stdlib::load(library, &self.host) else {
                    return Err(RuntimeError::new(
                        span,
                        format!("unknown library '{}'", library),
                    ));
                };
                tracing::debug!(library = %library, count = natives.len(), "import");
                for native in natives {
                    self.envs
                        .define(self.current, native.name(), Value::Native(native));
                }
                Ok(Value::Nil)
            }
        }
    }

    /// Evaluates in order, stopping early once a `return` is pending.
    fn eval_sequence(&mut self, exprs: &[Expr]) -> EvalResult {
        let mut last = Value::Nil;
        for expr in exprs {
            last = self.eval(expr)?;
            if self.envs.return_pending(self.current) {
                break;
            }
        }
        Ok(last)
    }

    fn eval_arguments(&mut self, args: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn eval_condition(&mut self, condition: &Expr, construct: &str) -> Result<bool, RuntimeError> {
        match self.eval(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(
                &condition.span,
                format!(
                    "'{}' condition must be bool, found {}",
                    construct,
                    other.type_name()
                ),
            )),
        }
    }

    fn eval_bool(&mut self, operand: &Expr, op: &str) -> Result<bool, RuntimeError> {
        match self.eval(operand)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(
                &operand.span,
                format!("'{}' expects bool operands, found {}", op, other.type_name()),
            )),
        }
    }

    /// Runs `f` with `frame` as the current frame, restoring the previous
    /// one afterwards even on error.
    fn with_current<T>(
        &mut self,
        frame: EnvId,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let previous = std::mem::replace(&mut self.current, frame);
        let result = f(self);
        self.current = previous;
        result
    }
}
