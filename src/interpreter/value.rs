use std::fmt;
use std::rc::Rc;

use crate::ast::render::format_float;
use crate::ast::{ClassDecl, FunctionDecl};
use crate::interpreter::{EnvGuard, EnvId};
use crate::stdlib::NativeFunction;

/// A declared function paired with the frame it was declared in.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<EnvGuard>,
}

/// Shared by the class value and every instance. The declaring frame is
/// kept alive by whichever of those holds a guard on it.
#[derive(Debug)]
pub struct ClassValue {
    pub decl: Rc<ClassDecl>,
    pub closure: EnvId,
    pub base: Option<Rc<ClassValue>>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Nil,
    Function(FunctionValue),
    Class {
        class: Rc<ClassValue>,
        closure: Rc<EnvGuard>,
    },
    /// Copies share `env`, the frame holding the fields and methods.
    Instance {
        class: Rc<ClassValue>,
        env: Rc<EnvGuard>,
    },
    Native(Box<dyn NativeFunction>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Nil => "nil",
            Value::Function(_) => "function",
            Value::Class { .. } => "class",
            Value::Instance { .. } => "instance",
            Value::Native(_) => "native function",
        }
    }

    /// The frame guard this value holds, if any.
    pub(crate) fn guard(&self) -> Option<&Rc<EnvGuard>> {
        match self {
            Value::Function(function) => Some(&function.closure),
            Value::Class { closure, .. } => Some(closure),
            Value::Instance { env, .. } => Some(env),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Exact structural equality. The language's `==` goes through
    /// `operators::evaluate_binary` instead, which compares floats with a
    /// tolerance.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => {
                Rc::ptr_eq(&a.decl, &b.decl) && a.closure.id() == b.closure.id()
            }
            (Value::Class { class: a, .. }, Value::Class { class: b, .. }) => Rc::ptr_eq(a, b),
            (Value::Instance { env: a, .. }, Value::Instance { env: b, .. }) => a.id() == b.id(),
            (Value::Native(a), Value::Native(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => f.write_str(s),
            Value::Nil => f.write_str("nil"),
            Value::Function(function) => write!(f, "<fn {}>", function.decl.name),
            Value::Class { class, .. } => write!(f, "<class {}>", class.decl.name),
            Value::Instance { class, .. } => write!(f, "<{} instance>", class.decl.name),
            Value::Native(native) => write!(f, "<native fn {}>", native.name()),
        }
    }
}
