use std::cmp::Ordering;

use crate::types::ast::{BinaryOp, UnaryOp};
use crate::types::span::Span;
use crate::{Error, Result, Value};

/// The maximum number of integers in a range that is used as a value.
const MAX_RANGE_LEN: i128 = 1 << 20;

pub fn unary(op: UnaryOp, value: Value, span: Span) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Integer(n)) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| Error::render("integer overflow", span)),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Neg, value) => Err(Error::render(
            format!("cannot negate {}", value.human()),
            span,
        )),
    }
}

/// Applies a binary operator to two evaluated operands.
///
/// `and` and `or` short circuit, so they are handled by the renderer.
pub fn binary(op: BinaryOp, lhs: Value, rhs: Value, span: Span) -> Result<Value> {
    let err = |lhs: &Value, rhs: &Value| {
        Error::render(
            format!(
                "unsupported operand types for `{}`: {} and {}",
                op.human(),
                lhs.human(),
                rhs.human()
            ),
            span,
        )
    };
    let overflow = || Error::render("integer overflow", span);

    let value = match (op, lhs, rhs) {
        (BinaryOp::Eq, lhs, rhs) => Value::Bool(lhs == rhs),
        (BinaryOp::Ne, lhs, rhs) => Value::Bool(lhs != rhs),

        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, lhs, rhs) => {
            let ord = compare(&lhs, &rhs).ok_or_else(|| {
                Error::render(
                    format!("cannot compare {} with {}", lhs.human(), rhs.human()),
                    span,
                )
            })?;
            Value::Bool(match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }

        (BinaryOp::Range, Value::Integer(a), Value::Integer(b)) => range(a, b, span)?,

        (BinaryOp::Add, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_add(b).ok_or_else(overflow)?)
        }
        (BinaryOp::Sub, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_sub(b).ok_or_else(overflow)?)
        }
        (BinaryOp::Mul, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_mul(b).ok_or_else(overflow)?)
        }
        (BinaryOp::Div | BinaryOp::Rem, Value::Integer(_), Value::Integer(0)) => {
            return Err(Error::render("division by zero", span));
        }
        (BinaryOp::Div, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(floor_div(a, b).ok_or_else(overflow)?)
        }
        (BinaryOp::Rem, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(floor_rem(a, b).ok_or_else(overflow)?)
        }

        (BinaryOp::Add, Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Value::String(a)
        }
        (BinaryOp::Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Value::List(a)
        }

        (
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem,
            lhs,
            rhs,
        ) => match (as_float(&lhs), as_float(&rhs)) {
            (Some(a), Some(b)) => Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a - b * (a / b).floor(),
            }),
            _ => return Err(err(&lhs, &rhs)),
        },

        (_, lhs, rhs) => return Err(err(&lhs, &rhs)),
    };
    Ok(value)
}

/// Collects the inclusive range `a..b` into a list.
pub fn range(a: i64, b: i64, span: Span) -> Result<Value> {
    if i128::from(b) - i128::from(a) >= MAX_RANGE_LEN {
        return Err(Error::render("range too large", span));
    }
    Ok(Value::List((a..=b).map(Value::Integer).collect()))
}

/// Looks up `value[index]`.
///
/// Negative list indexes count from the end, an index that is out of range or
/// a missing map key evaluates to `nil`.
pub fn index(value: &Value, index: &Value, span: Span) -> Result<Value> {
    match (value, index) {
        (Value::List(list), Value::Integer(i)) => {
            Ok(resolve(*i, list.len())
                .and_then(|i| list.get(i))
                .cloned()
                .unwrap_or_default())
        }
        (Value::String(s), Value::Integer(i)) => {
            let n = s.chars().count();
            Ok(resolve(*i, n)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default())
        }
        (Value::Map(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or_default()),
        (value, index) => Err(Error::render(
            format!("cannot index into {} with {}", value.human(), index.human()),
            span,
        )),
    }
}

fn resolve(i: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { len + i } else { i };
    usize::try_from(i).ok().filter(|_| i < len)
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (lhs, rhs) => as_float(lhs)?.partial_cmp(&as_float(rhs)?),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

/// Integer division rounding towards negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// The remainder of a floor division, it has the same sign as the divisor.
fn floor_rem(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::from(0..1)
    }

    fn bin(op: BinaryOp, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Value> {
        binary(op, lhs.into(), rhs.into(), span())
    }

    #[test]
    fn binary_integer_arithmetic() {
        assert_eq!(bin(BinaryOp::Add, 1, 2).unwrap(), Value::Integer(3));
        assert_eq!(bin(BinaryOp::Sub, 1, 2).unwrap(), Value::Integer(-1));
        assert_eq!(bin(BinaryOp::Mul, 4, 3).unwrap(), Value::Integer(12));
        assert_eq!(bin(BinaryOp::Div, 7, 2).unwrap(), Value::Integer(3));
        assert_eq!(bin(BinaryOp::Div, -7, 2).unwrap(), Value::Integer(-4));
        assert_eq!(bin(BinaryOp::Rem, -7, 2).unwrap(), Value::Integer(1));
        assert_eq!(bin(BinaryOp::Rem, 7, -2).unwrap(), Value::Integer(-1));
    }

    #[test]
    fn binary_mixed_arithmetic() {
        assert_eq!(bin(BinaryOp::Add, 1, 0.5).unwrap(), Value::Float(1.5));
        assert_eq!(bin(BinaryOp::Div, 1.0, 4).unwrap(), Value::Float(0.25));
    }

    #[test]
    fn binary_concat() {
        assert_eq!(bin(BinaryOp::Add, "a", "b").unwrap(), Value::from("ab"));
        assert_eq!(
            binary(
                BinaryOp::Add,
                Value::List(vec![Value::from(1)]),
                Value::List(vec![Value::from(2)]),
                span()
            )
            .unwrap(),
            Value::List(vec![Value::from(1), Value::from(2)])
        );
    }

    #[test]
    fn binary_compare() {
        assert_eq!(bin(BinaryOp::Lt, 1, 1.5).unwrap(), Value::Bool(true));
        assert_eq!(bin(BinaryOp::Ge, "b", "a").unwrap(), Value::Bool(true));
        assert_eq!(bin(BinaryOp::Eq, 1, 1.0).unwrap(), Value::Bool(true));
        assert_eq!(bin(BinaryOp::Ne, "1", 1).unwrap(), Value::Bool(true));
    }

    #[test]
    fn binary_range_is_inclusive() {
        assert_eq!(
            bin(BinaryOp::Range, 1, 3).unwrap(),
            Value::List(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
        assert_eq!(bin(BinaryOp::Range, 3, 1).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn binary_err_range_too_large() {
        let err = bin(BinaryOp::Range, 0, i64::MAX).unwrap_err();
        assert_eq!(err.message(), "range too large");
        let err = bin(BinaryOp::Range, i64::MIN, i64::MAX).unwrap_err();
        assert_eq!(err.message(), "range too large");
        let list = bin(BinaryOp::Range, 1, 1 << 20).unwrap();
        assert!(matches!(list, Value::List(list) if list.len() == 1 << 20));
    }

    #[test]
    fn binary_err_division_by_zero() {
        let err = bin(BinaryOp::Rem, 1, 0).unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }

    #[test]
    fn binary_err_overflow() {
        let err = bin(BinaryOp::Mul, i64::MAX, 2).unwrap_err();
        assert_eq!(err.message(), "integer overflow");
        let err = bin(BinaryOp::Div, i64::MIN, -1).unwrap_err();
        assert_eq!(err.message(), "integer overflow");
    }

    #[test]
    fn binary_err_unsupported() {
        let err = bin(BinaryOp::Sub, "a", 1).unwrap_err();
        assert_eq!(
            err.message(),
            "unsupported operand types for `-`: string and integer"
        );
        let err = bin(BinaryOp::Lt, "a", 1).unwrap_err();
        assert_eq!(err.message(), "cannot compare string with integer");
    }

    #[test]
    fn unary_ops() {
        assert_eq!(
            unary(UnaryOp::Not, Value::None, span()).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            unary(UnaryOp::Not, Value::from(0), span()).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            unary(UnaryOp::Neg, Value::from(2), span()).unwrap(),
            Value::Integer(-2)
        );
        assert!(unary(UnaryOp::Neg, Value::from("x"), span()).is_err());
    }

    #[test]
    fn index_list_and_string() {
        let list = Value::List(vec![Value::from(1), Value::from(2)]);
        assert_eq!(index(&list, &Value::from(-1), span()).unwrap(), Value::from(2));
        assert_eq!(index(&list, &Value::from(2), span()).unwrap(), Value::None);
        assert_eq!(index(&list, &Value::from(-3), span()).unwrap(), Value::None);
        let s = Value::from("héllo");
        assert_eq!(index(&s, &Value::from(1), span()).unwrap(), Value::from("é"));
    }

    #[test]
    fn index_err_bad_key() {
        let list = Value::List(vec![]);
        let err = index(&list, &Value::from("a"), span()).unwrap_err();
        assert_eq!(err.message(), "cannot index into list with string");
    }
}
