//! Operator semantics, dispatched on the runtime kind of the operands.
//!
//! Checked programs only ever reach the same-kind arms. Without a prior type
//! check, int and float mix by promoting to float, `==` between different
//! kinds is false, and every other combination is an error.

use crate::ast::{BinOp, UnOp};
use crate::interpreter::Value;

/// Tolerance for float `==`, `!=`, `<=` and `>=`.
pub const FLOAT_EPSILON: f64 = 0.01;

pub type OpResult = Result<Value, String>;

fn checked_int(result: Option<i64>, op_name: &str) -> OpResult {
    result
        .map(Value::Int)
        .ok_or_else(|| format!("integer overflow in {}", op_name))
}

pub fn evaluate_binary(op: BinOp, left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(op, *a, *b),
        (Value::Int(a), Value::Float(b)) => eval_float_binary(op, *a as f64, *b),
        (Value::Float(a), Value::Int(b)) => eval_float_binary(op, *a, *b as f64),
        (Value::String(a), Value::String(b)) => eval_string_binary(op, a, b),
        _ => match op {
            BinOp::Eq => Ok(Value::Bool(left == right)),
            BinOp::NotEq => Ok(Value::Bool(left != right)),
            _ => Err(format!(
                "operator '{}' cannot be applied to {} and {}",
                op,
                left.type_name(),
                right.type_name()
            )),
        },
    }
}

fn eval_int_binary(op: BinOp, a: i64, b: i64) -> OpResult {
    match op {
        BinOp::Add => checked_int(a.checked_add(b), "addition"),
        BinOp::Sub => checked_int(a.checked_sub(b), "subtraction"),
        BinOp::Mul => checked_int(a.checked_mul(b), "multiplication"),
        BinOp::Div if b == 0 => Err("division by zero".to_string()),
        BinOp::Div => checked_int(a.checked_div(b), "division"),
        BinOp::Mod if b == 0 => Err("remainder by zero".to_string()),
        BinOp::Mod => checked_int(a.checked_rem(b), "remainder"),
        BinOp::Eq => Ok(Value::Bool(a == b)),
        BinOp::NotEq => Ok(Value::Bool(a != b)),
        BinOp::Less => Ok(Value::Bool(a < b)),
        BinOp::LessEq => Ok(Value::Bool(a <= b)),
        BinOp::Greater => Ok(Value::Bool(a > b)),
        BinOp::GreaterEq => Ok(Value::Bool(a >= b)),
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < FLOAT_EPSILON
}

fn eval_float_binary(op: BinOp, a: f64, b: f64) -> OpResult {
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div if b == 0.0 => Err("division by zero".to_string()),
        BinOp::Div => Ok(Value::Float(a / b)),
        BinOp::Mod if b == 0.0 => Err("remainder by zero".to_string()),
        BinOp::Mod => Ok(Value::Float(a % b)),
        BinOp::Eq => Ok(Value::Bool(float_eq(a, b))),
        BinOp::NotEq => Ok(Value::Bool(!float_eq(a, b))),
        BinOp::Less => Ok(Value::Bool(a < b)),
        BinOp::LessEq => Ok(Value::Bool(a < b || float_eq(a, b))),
        BinOp::Greater => Ok(Value::Bool(a > b)),
        BinOp::GreaterEq => Ok(Value::Bool(a > b || float_eq(a, b))),
    }
}

fn eval_string_binary(op: BinOp, a: &str, b: &str) -> OpResult {
    match op {
        BinOp::Add => Ok(Value::String(format!("{}{}", a, b))),
        BinOp::Eq => Ok(Value::Bool(a == b)),
        BinOp::NotEq => Ok(Value::Bool(a != b)),
        _ => Err(format!("strings only support '+', found '{}'", op)),
    }
}

pub fn evaluate_unary(op: UnOp, operand: &Value) -> OpResult {
    match (op, operand) {
        (UnOp::Minus, Value::Int(i)) => checked_int(i.checked_neg(), "negation"),
        (UnOp::Minus, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(format!(
            "unary '{}' cannot be applied to {}",
            op,
            operand.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_float_tolerance() {
        let sum = evaluate_binary(BinOp::Add, &Value::Float(0.1), &Value::Float(0.2)).unwrap();
        assert_eq!(
            evaluate_binary(BinOp::Eq, &sum, &Value::Float(0.3)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluate_binary(BinOp::NotEq, &Value::Float(1.0), &Value::Float(1.005)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            evaluate_binary(BinOp::LessEq, &Value::Float(1.005), &Value::Float(1.0)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluate_binary(BinOp::GreaterEq, &Value::Float(0.995), &Value::Float(1.0)),
            Ok(Value::Bool(true))
        );
        // strict orderings have no tolerance
        assert_eq!(
            evaluate_binary(BinOp::Less, &Value::Float(1.005), &Value::Float(1.0)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            evaluate_binary(BinOp::Eq, &Value::Float(1.0), &Value::Float(1.5)),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_int_arithmetic_is_checked() {
        assert_eq!(
            evaluate_binary(BinOp::Div, &Value::Int(7), &Value::Int(2)),
            Ok(Value::Int(3))
        );
        assert_eq!(
            evaluate_binary(BinOp::Mod, &Value::Int(7), &Value::Int(4)),
            Ok(Value::Int(3))
        );
        assert_eq!(
            evaluate_binary(BinOp::Div, &Value::Int(1), &Value::Int(0)),
            Err("division by zero".to_string())
        );
        assert_eq!(
            evaluate_binary(BinOp::Mod, &Value::Int(1), &Value::Int(0)),
            Err("remainder by zero".to_string())
        );
        assert_eq!(
            evaluate_binary(BinOp::Add, &Value::Int(i64::MAX), &Value::Int(1)),
            Err("integer overflow in addition".to_string())
        );
        assert!(evaluate_unary(UnOp::Minus, &Value::Int(i64::MIN)).is_err());
    }

    #[test]
    fn test_mixed_numbers_promote() {
        assert_eq!(
            evaluate_binary(BinOp::Add, &Value::Int(1), &Value::Float(0.5)),
            Ok(Value::Float(1.5))
        );
        assert_eq!(
            evaluate_binary(BinOp::Less, &Value::Float(0.5), &Value::Int(1)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            evaluate_binary(
                BinOp::Add,
                &Value::String("brook".to_string()),
                &Value::String("!".to_string())
            ),
            Ok(Value::String("brook!".to_string()))
        );
        assert!(
            evaluate_binary(
                BinOp::Mul,
                &Value::String("a".to_string()),
                &Value::String("b".to_string())
            )
            .is_err()
        );
    }

    #[test]
    fn test_mismatched_kinds() {
        assert_eq!(
            evaluate_binary(BinOp::Eq, &Value::Int(1), &Value::String("1".to_string())),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            evaluate_binary(BinOp::Eq, &Value::Nil, &Value::Nil),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluate_binary(BinOp::Sub, &Value::Bool(true), &Value::Int(1)),
            Err("operator '-' cannot be applied to bool and int".to_string())
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(evaluate_unary(UnOp::Not, &Value::Bool(false)), Ok(Value::Bool(true)));
        assert_eq!(evaluate_unary(UnOp::Minus, &Value::Float(2.5)), Ok(Value::Float(-2.5)));
        assert_eq!(
            evaluate_unary(UnOp::Not, &Value::Int(1)),
            Err("unary '!' cannot be applied to int".to_string())
        );
    }
}
