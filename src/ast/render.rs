//! Render-to-text traversal. The output is valid source: every binary,
//! logical and unary node is fully parenthesized, so re-parsing it yields
//! the same operator nesting regardless of the original layout. Operands
//! that only parse at statement level, or that end in an open trailing
//! expression, get a second pair of parentheses.

use std::fmt::{self, Display, Write};

use super::{
    BinOp, ClassDecl, Expr, ExprKind, FunctionDecl, Literal, LogicOp, TypeAnnot, UnOp,
    VariableDecl,
};

/// Formats a float so that it always reads back as a float literal.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Renders a whole program, one top-level expression per line.
pub fn render_program(program: &[Expr]) -> String {
    program
        .iter()
        .map(|expr| expr.to_string())
        .collect::<Vec<_>>()
        .join(";\n")
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
        })
    }
}

impl Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        })
    }
}

impl Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnOp::Minus => "-",
            UnOp::Not => "!",
        })
    }
}

impl Display for TypeAnnot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnot::Bool => f.write_str("bool"),
            TypeAnnot::Int => f.write_str("int"),
            TypeAnnot::Float => f.write_str("float"),
            TypeAnnot::String => f.write_str("string"),
            TypeAnnot::Nil => f.write_str("nil"),
            TypeAnnot::Named(name) => f.write_str(name),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => f.write_str(&format_float(*x)),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Nil => f.write_str("nil"),
        }
    }
}

/// An operator's child, parenthesized when it would not re-parse in place.
struct Operand<'a>(&'a Expr);

impl Operand<'_> {
    fn needs_parens(&self) -> bool {
        matches!(
            self.0.kind,
            ExprKind::VarDeclare(_)
                | ExprKind::VarSet { .. }
                | ExprKind::FieldSet { .. }
                | ExprKind::FunctionDeclare(_)
                | ExprKind::Return(_)
                | ExprKind::If { .. }
                | ExprKind::While { .. }
                | ExprKind::For { .. }
        )
    }
}

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_parens() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Whether `expr` ends in an `if` with no `else`, which would take an
/// `else` written after it.
fn ends_in_open_if(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::If {
            else_branch: None, ..
        } => true,
        ExprKind::If {
            else_branch: Some(tail),
            ..
        } => ends_in_open_if(tail),
        ExprKind::While { body, .. } | ExprKind::For { body, .. } => ends_in_open_if(body),
        ExprKind::VarSet { value, .. } | ExprKind::FieldSet { value, .. } => {
            ends_in_open_if(value)
        }
        ExprKind::Return(Some(value)) => ends_in_open_if(value),
        ExprKind::VarDeclare(decl) => decl.initializer.as_deref().is_some_and(ends_in_open_if),
        _ => false,
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    if exprs.is_empty() {
        return f.write_str("{ }");
    }
    f.write_str("{ ")?;
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str("; ")?;
        }
        write!(f, "{}", expr)?;
    }
    f.write_str(" }")
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}

impl Display for VariableDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.annot)?;
        if let Some(initializer) = &self.initializer {
            write!(f, " = {}", initializer)?;
        }
        Ok(())
    }
}

impl Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.annot))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} :: ({})", self.name, params)?;
        if let Some(return_type) = &self.return_type {
            write!(f, " -> {}", return_type)?;
        }
        f.write_char(' ')?;
        write_sequence(f, &self.body)
    }
}

impl Display for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.name)?;
        if let Some((base, _)) = &self.base {
            write!(f, " : {}", base)?;
        }
        let members = self
            .fields
            .iter()
            .map(|field| field.decl.to_string())
            .chain(self.methods.iter().map(|method| method.to_string()))
            .collect::<Vec<_>>();
        if members.is_empty() {
            f.write_str(" { }")
        } else {
            write!(f, " {{ {} }}", members.join("; "))
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(literal) => write!(f, "{}", literal),
            ExprKind::Unary { op, operand } => write!(f, "({}{})", op, Operand(operand)),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", Operand(left), op, Operand(right))
            }
            ExprKind::Logical { op, left, right } => {
                write!(f, "({} {} {})", Operand(left), op, Operand(right))
            }
            ExprKind::VarDeclare(decl) => write!(f, "{}", decl),
            ExprKind::VarGet(name) => f.write_str(name),
            ExprKind::VarSet { name, value } => write!(f, "{} = {}", name, value),
            ExprKind::FunctionDeclare(decl) => write!(f, "{}", decl),
            ExprKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                f.write_char(')')
            }
            ExprKind::Return(None) => f.write_str("return"),
            ExprKind::Return(Some(value)) => write!(f, "return {}", value),
            ExprKind::Block(exprs) => write_sequence(f, exprs),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if {} ", condition)?;
                match else_branch {
                    Some(else_branch) if ends_in_open_if(then_branch) => {
                        write!(f, "({}) else {}", then_branch, else_branch)
                    }
                    Some(else_branch) => write!(f, "{} else {}", then_branch, else_branch),
                    None => write!(f, "{}", then_branch),
                }
            }
            ExprKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                f.write_str("for ")?;
                if let Some(initializer) = initializer {
                    write!(f, "{}", initializer)?;
                }
                f.write_str(", ")?;
                if let Some(condition) = condition {
                    write!(f, "{}", condition)?;
                }
                f.write_str(", ")?;
                if let Some(update) = update {
                    write!(f, "{} ", update)?;
                }
                write!(f, "{}", body)
            }
            ExprKind::While { condition, body } => write!(f, "while {} {}", condition, body),
            ExprKind::ClassDeclare(decl) => write!(f, "{}", decl),
            ExprKind::New(class) => write!(f, "new {}()", class),
            ExprKind::FieldGet { object, field } => write!(f, "{}.{}", object, field),
            ExprKind::FieldSet {
                object,
                field,
                value,
            } => write!(f, "{}.{} = {}", object, field, value),
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                write!(f, "{}.{}(", object, method)?;
                write_list(f, args)?;
                f.write_char(')')
            }
            ExprKind::Import(library) => write!(f, "import {}", library),
        }
    }
}
