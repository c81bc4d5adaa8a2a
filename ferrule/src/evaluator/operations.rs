//! Operator semantics over runtime values
//!
//! Errors are returned as plain messages; the caller attaches the span and
//! rule name.

use crate::semantic::{ArithmeticOperation, ComparisonOperator};
use crate::value::{float_fits_i64, Value};
use std::cmp::Ordering;

/// Perform an arithmetic operation.
///
/// - Integer op Integer = Integer (checked, `/` truncates toward zero)
/// - Integer op Float, Float op Float = Float
/// - `%` needs whole-valued operands and yields an Integer
/// - `+` with a string on either side concatenates display forms
///
/// ```text
/// 2.5 + 3      = 5.5
/// 7 / 2        = 3
/// 7.0 / 2      = 3.5
/// 8 % 3        = 2
/// "n=" + 4     = "n=4"
/// ```
pub fn arithmetic_operation(
    left: &Value,
    op: ArithmeticOperation,
    right: &Value,
) -> Result<Value, String> {
    if op == ArithmeticOperation::Add
        && (matches!(left, Value::Text(_)) || matches!(right, Value::Text(_)))
    {
        return Ok(Value::Text(format!("{}{}", left, right)));
    }

    if !left.is_numeric() || !right.is_numeric() {
        return Err(format!(
            "cannot apply {} ({}) to {} and {}",
            op.name(),
            op.symbol(),
            left.type_name(),
            right.type_name()
        ));
    }

    if op == ArithmeticOperation::Modulo {
        return modulo(left, right);
    }

    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => integer_arithmetic(*l, op, *r),
        _ => {
            // Both numeric, so as_f64 cannot fail
            let l = left.as_f64().unwrap_or(f64::NAN);
            let r = right.as_f64().unwrap_or(f64::NAN);
            float_arithmetic(l, op, r)
        }
    }
}

fn integer_arithmetic(l: i64, op: ArithmeticOperation, r: i64) -> Result<Value, String> {
    let result = match op {
        ArithmeticOperation::Add => l.checked_add(r),
        ArithmeticOperation::Subtract => l.checked_sub(r),
        ArithmeticOperation::Multiply => l.checked_mul(r),
        ArithmeticOperation::Divide => {
            if r == 0 {
                return Err("division by zero".to_string());
            }
            l.checked_div(r)
        }
        ArithmeticOperation::Modulo => {
            if r == 0 {
                return Err("modulo by zero".to_string());
            }
            l.checked_rem(r)
        }
    };
    result.map(Value::Integer).ok_or_else(|| {
        format!(
            "integer overflow in {}: {} {} {}",
            op.name(),
            l,
            op.symbol(),
            r
        )
    })
}

fn float_arithmetic(l: f64, op: ArithmeticOperation, r: f64) -> Result<Value, String> {
    let result = match op {
        ArithmeticOperation::Add => l + r,
        ArithmeticOperation::Subtract => l - r,
        ArithmeticOperation::Multiply => l * r,
        ArithmeticOperation::Divide => {
            if r == 0.0 {
                return Err("division by zero".to_string());
            }
            l / r
        }
        ArithmeticOperation::Modulo => {
            if r == 0.0 {
                return Err("modulo by zero".to_string());
            }
            l % r
        }
    };
    if !result.is_finite() {
        return Err(format!(
            "{} produced a non-finite result: {} {} {}",
            op.name(),
            l,
            op.symbol(),
            r
        ));
    }
    Ok(Value::Float(result))
}

fn modulo(left: &Value, right: &Value) -> Result<Value, String> {
    let whole = |value: &Value| match value {
        Value::Integer(n) => Some(*n),
        Value::Float(n) if n.fract() == 0.0 && float_fits_i64(*n) => Some(*n as i64),
        _ => None,
    };
    match (whole(left), whole(right)) {
        (Some(l), Some(r)) => integer_arithmetic(l, ArithmeticOperation::Modulo, r),
        _ => Err(format!(
            "modulo requires whole-valued operands, found {} % {}",
            left, right
        )),
    }
}

/// Perform a comparison.
///
/// Numbers compare across Integer/Float, strings compare lexicographically,
/// booleans support `==`/`!=` only, and anything may be compared for
/// equality with `nil`.
pub fn comparison_operation(
    left: &Value,
    op: ComparisonOperator,
    right: &Value,
) -> Result<Value, String> {
    if matches!(left, Value::Nil) || matches!(right, Value::Nil) {
        if !op.is_equality() {
            return Err(format!(
                "cannot order {} and {} with {}",
                left.type_name(),
                right.type_name(),
                op.symbol()
            ));
        }
        let both_nil = matches!((left, right), (Value::Nil, Value::Nil));
        return Ok(Value::Boolean(match op {
            ComparisonOperator::Equal => both_nil,
            _ => !both_nil,
        }));
    }

    let ordering = match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            let l = l.as_f64().unwrap_or(f64::NAN);
            let r = r.as_f64().unwrap_or(f64::NAN);
            l.partial_cmp(&r)
                .ok_or_else(|| format!("cannot compare {} and {}", l, r))?
        }
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Boolean(l), Value::Boolean(r)) if op.is_equality() => l.cmp(r),
        (Value::Boolean(_), Value::Boolean(_)) => {
            return Err(format!("cannot order booleans with {}", op.symbol()));
        }
        _ => {
            return Err(format!(
                "cannot compare {} with {} using {}",
                left.type_name(),
                right.type_name(),
                op.symbol()
            ));
        }
    };

    let result = match op {
        ComparisonOperator::Equal => ordering == Ordering::Equal,
        ComparisonOperator::NotEqual => ordering != Ordering::Equal,
        ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
        ComparisonOperator::LessThan => ordering == Ordering::Less,
        ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
    };
    Ok(Value::Boolean(result))
}

pub fn negate(value: &Value) -> Result<Value, String> {
    match value {
        Value::Integer(n) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| format!("integer overflow negating {}", n)),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(format!("cannot negate {}", other.type_name())),
    }
}

pub fn not(value: &Value) -> Result<Value, String> {
    match value {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(format!("'!' requires a boolean, found {}", other.type_name())),
    }
}
