use crate::ast::Span;
use crate::interpreter::{EvalResult, FunctionValue, Interpreter, RuntimeError, Value};

impl Interpreter {
    /// Invokes whatever `name` resolved to.
    pub(crate) fn call_value(
        &mut self,
        name: &str,
        callee: Value,
        args: Vec<Value>,
        span: &Span,
    ) -> EvalResult {
        match callee {
            Value::Function(function) => self.call_function(&function, args, span),
            Value::Native(native) => {
                if args.len() != native.arity() {
                    return Err(arity_error(name, native.arity(), args.len(), span));
                }
                tracing::debug!(native = native.name(), "call native");
                native
                    .call(args)
                    .map_err(|e| RuntimeError::new(span, format!("'{}' failed: {}", name, e)))
            }
            Value::Class { class, .. } => Err(RuntimeError::new(
                span,
                format!(
                    "class '{}' is instantiated with 'new {}()', not called",
                    class.decl.name, class.decl.name
                ),
            )),
            other => Err(RuntimeError::new(
                span,
                format!("'{}' is not callable, found {}", name, other.type_name()),
            )),
        }
    }

    /// Runs the body in a fresh boundary frame whose parent is the closure,
    /// so free names resolve where the function was declared.
    pub fn call_function(
        &mut self,
        function: &FunctionValue,
        args: Vec<Value>,
        span: &Span,
    ) -> EvalResult {
        let decl = &function.decl;
        if args.len() != decl.params.len() {
            return Err(arity_error(&decl.name, decl.params.len(), args.len(), span));
        }
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(
                span,
                format!(
                    "stack overflow: more than {} nested calls",
                    self.config.max_call_depth
                ),
            ));
        }

        tracing::debug!(function = %decl.name, depth = self.depth, "call");
        let frame = self.envs.push(function.closure.id(), true);
        for (param, arg) in decl.params.iter().zip(args) {
            self.envs.define(frame, param.name.clone(), arg);
        }

        self.depth += 1;
        let result = self.with_current(frame, |this| {
            this.eval_sequence(&decl.body)?;
            Ok(this.envs.take_return(frame).unwrap_or(Value::Nil))
        });
        self.depth -= 1;
        self.envs.release(frame);
        result
    }
}

fn arity_error(name: &str, expected: usize, found: usize, span: &Span) -> RuntimeError {
    RuntimeError::new(
        span,
        format!("'{}' expects {} arguments, found {}", name, expected, found),
    )
}
