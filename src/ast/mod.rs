pub mod render;

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Location of the token a node is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    VarDeclare(VariableDecl),
    VarGet(String),
    VarSet {
        name: String,
        value: Box<Expr>,
    },

    FunctionDeclare(Rc<FunctionDecl>),
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Return(Option<Box<Expr>>),

    Block(Vec<Expr>),
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    For {
        initializer: Option<Box<Expr>>,
        condition: Option<Box<Expr>>,
        update: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },

    ClassDeclare(Rc<ClassDecl>),
    New(String),
    FieldGet {
        object: String,
        field: String,
    },
    FieldSet {
        object: String,
        field: String,
        value: Box<Expr>,
    },
    MethodCall {
        object: String,
        method: String,
        args: Vec<Expr>,
    },

    Import(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::NotEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnot {
    Bool,
    Int,
    Float,
    String,
    Nil,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annot: TypeAnnot,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub annot: TypeAnnot,
    pub initializer: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    /// `None` for procedures (`name :: () { ... }`), which return nil.
    pub return_type: Option<TypeAnnot>,
    pub body: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub decl: VariableDecl,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub base: Option<(String, Span)>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Bool,
    Int,
    Float,
    String,
    Nil,
    Custom,
    /// Matches any argument. Only native signatures use it.
    Any,
    Error,
}

/// Static type of an expression. `name` is only set for `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    pub kind: TypeKind,
    pub name: Option<String>,
}

impl DataType {
    pub fn new(kind: TypeKind) -> Self {
        DataType { kind, name: None }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        DataType {
            kind: TypeKind::Custom,
            name: Some(name.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == TypeKind::Error
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TypeKind::Int | TypeKind::Float)
    }

    /// Whether a value of type `other` may be passed where `self` is expected.
    pub fn accepts(&self, other: &DataType) -> bool {
        self.kind == TypeKind::Any || self == other
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Bool => f.write_str("bool"),
            TypeKind::Int => f.write_str("int"),
            TypeKind::Float => f.write_str("float"),
            TypeKind::String => f.write_str("string"),
            TypeKind::Nil => f.write_str("nil"),
            TypeKind::Custom => f.write_str(self.name.as_deref().unwrap_or("<class>")),
            TypeKind::Any => f.write_str("any"),
            TypeKind::Error => f.write_str("<error>"),
        }
    }
}

#[macro_export]
macro_rules! t_bool {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Bool)
    };
}

#[macro_export]
macro_rules! t_int {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Int)
    };
}

#[macro_export]
macro_rules! t_float {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Float)
    };
}

#[macro_export]
macro_rules! t_string {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::String)
    };
}

#[macro_export]
macro_rules! t_nil {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Nil)
    };
}

#[macro_export]
macro_rules! t_any {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Any)
    };
}

#[macro_export]
macro_rules! t_error {
    () => {
        $crate::ast::DataType::new($crate::ast::TypeKind::Error)
    };
}
