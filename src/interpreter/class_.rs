use std::rc::Rc;

use crate::ast::{ClassDecl, Span};
use crate::interpreter::{
    ClassValue, EnvGuard, EnvId, EvalResult, FunctionValue, Interpreter, RuntimeError, Value,
};

impl Interpreter {
    pub(crate) fn declare_class(&mut self, decl: &Rc<ClassDecl>) -> EvalResult {
        let base = match &decl.base {
            None => None,
            Some((name, span)) => match self.envs.get(self.current, name) {
                Some(Value::Class { class, .. }) => Some(class.clone()),
                Some(other) => {
                    return Err(RuntimeError::new(
                        span,
                        format!("'{}' is not a class, found {}", name, other.type_name()),
                    ));
                }
                None => {
                    return Err(RuntimeError::new(
                        span,
                        format!("undefined base class '{}'", name),
                    ));
                }
            },
        };

        let class = ClassValue {
            decl: decl.clone(),
            closure: self.current,
            base,
        };
        let value = Value::Class {
            class: Rc::new(class),
            closure: self.envs.capture(self.current),
        };
        self.envs.define(self.current, decl.name.clone(), value);
        Ok(Value::Nil)
    }

    /// Builds the instance frame: base members first, then the class's own,
    /// so a derived field or method replaces the inherited one.
    pub(crate) fn instantiate(&mut self, class: &Rc<ClassValue>) -> EvalResult {
        tracing::debug!(class = %class.decl.name, "instantiate");
        let env = self.envs.push(class.closure, false);
        let guard = self.envs.capture(env);
        let result = self.with_current(env, |this| this.init_members(class, env));
        // from here on only the instance value holds the frame
        self.envs.release(env);
        result?;
        Ok(Value::Instance {
            class: class.clone(),
            env: guard,
        })
    }

    fn init_members(&mut self, class: &ClassValue, env: EnvId) -> Result<(), RuntimeError> {
        if let Some(base) = &class.base {
            self.init_members(base, env)?;
        }
        for field in &class.decl.fields {
            let value = match &field.decl.initializer {
                Some(initializer) => self.eval(initializer)?,
                None => Value::Nil,
            };
            self.envs.define(env, field.decl.name.clone(), value);
        }
        for method in &class.decl.methods {
            let function = FunctionValue {
                decl: method.clone(),
                closure: self.envs.capture(env),
            };
            self.envs
                .define(env, method.name.clone(), Value::Function(function));
        }
        Ok(())
    }

    /// Resolves `object` to the class of the instance it holds and a guard
    /// on the instance frame.
    pub(crate) fn instance(
        &self,
        object: &str,
        span: &Span,
    ) -> Result<(Rc<ClassValue>, Rc<EnvGuard>), RuntimeError> {
        match self.envs.get(self.current, object) {
            Some(Value::Instance { class, env }) => Ok((class.clone(), env.clone())),
            Some(other) => Err(RuntimeError::new(
                span,
                format!(
                    "'{}' is not a class instance, found {}",
                    object,
                    other.type_name()
                ),
            )),
            None => Err(RuntimeError::new(
                span,
                format!("undefined variable '{}'", object),
            )),
        }
    }
}
