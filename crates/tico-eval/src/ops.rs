//! Binary operator semantics: host overloads first, then native rules.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use tico_types::ast::BinOp;

use crate::config::Semantics;
use crate::error::{EvalError, EvalResult};
use crate::value::{Overload, Value};

/// Apply `op` to two evaluated operands.
pub(crate) fn apply(op: BinOp, lhs: Value, rhs: Value, semantics: &Semantics) -> EvalResult<Value> {
    let (hook, negate) = overload_for(op, semantics);
    if let Some(result) = overloaded(hook, &lhs, &rhs)? {
        return Ok(if negate {
            Value::Bool(!result.is_truthy())
        } else {
            result
        });
    }
    native(op, &lhs, &rhs)
}

/// The hook consulted for `op`, and whether its result is negated.
fn overload_for(op: BinOp, semantics: &Semantics) -> (Overload, bool) {
    match op {
        BinOp::Add => (Overload::Add, false),
        BinOp::Sub => (Overload::Sub, false),
        BinOp::Mul => (Overload::Mult, false),
        BinOp::Pow => (Overload::Pow, false),
        BinOp::Div => (Overload::Div, false),
        BinOp::FloorDiv => (Overload::Fdiv, false),
        BinOp::Mod | BinOp::UnsignedMod => (Overload::Mod, false),
        BinOp::Greater => (Overload::Greater, false),
        BinOp::Less => (Overload::Lesser, false),
        BinOp::GreaterEq => (Overload::Lesser, true),
        BinOp::LessEq => (Overload::Greater, true),
        BinOp::Eq => (Overload::Equals, false),
        BinOp::NotEq => (Overload::Equals, true),
        BinOp::And => (Overload::And, semantics.negate_logical_overloads),
        BinOp::Or => (Overload::Or, semantics.negate_logical_overloads),
    }
}

/// Ask the left host operand, then the right one.
fn overloaded(hook: Overload, lhs: &Value, rhs: &Value) -> EvalResult<Option<Value>> {
    for side in [lhs, rhs] {
        let Value::Host(object) = side else {
            continue;
        };
        if let Some(result) = object.binary_op(hook, lhs, rhs) {
            return result.map(Some).map_err(|message| EvalError::Native {
                name: hook.name().to_string(),
                message,
            });
        }
    }
    Ok(None)
}

// ══════════════════════════════════════════════════════════════════════════════
// Native semantics
// ══════════════════════════════════════════════════════════════════════════════

fn native(op: BinOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    Ok(match op {
        BinOp::Add => return add(lhs, rhs),
        BinOp::Sub
        | BinOp::Mul
        | BinOp::Div
        | BinOp::Mod
        | BinOp::Pow
        | BinOp::FloorDiv
        | BinOp::UnsignedMod => return arith(op, lhs, rhs),
        BinOp::Greater => Value::Bool(compare(op, lhs, rhs)? == Some(Ordering::Greater)),
        BinOp::Less => Value::Bool(compare(op, lhs, rhs)? == Some(Ordering::Less)),
        BinOp::GreaterEq => Value::Bool(matches!(
            compare(op, lhs, rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinOp::LessEq => Value::Bool(matches!(
            compare(op, lhs, rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinOp::Eq => Value::Bool(lhs == rhs),
        BinOp::NotEq => Value::Bool(lhs != rhs),
        BinOp::And => Value::Bool(lhs.is_truthy() && rhs.is_truthy()),
        BinOp::Or => Value::Bool(lhs.is_truthy() || rhs.is_truthy()),
    })
}

fn mismatch(op: BinOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "cannot apply '{op}' to {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ))
}

/// `+` concatenates as soon as either side is a string.
fn add(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
        return Ok(Value::String(format!("{lhs}{rhs}")));
    }
    arith(BinOp::Add, lhs, rhs)
}

fn arith(op: BinOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(float_arith(op, *a, *b))),
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arith(op, a, b).map(Value::BigInt),
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

fn float_arith(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow => a.powf(b),
        BinOp::FloorDiv => (a / b).floor(),
        BinOp::UnsignedMod => ((a % b) + b) % b,
        _ => unreachable!("'{op}' is not arithmetic"),
    }
}

fn bigint_arith(op: BinOp, a: &BigInt, b: &BigInt) -> EvalResult<BigInt> {
    let divides = matches!(
        op,
        BinOp::Div | BinOp::Mod | BinOp::FloorDiv | BinOp::UnsignedMod
    );
    if divides && b.is_zero() {
        return Err(EvalError::ArithmeticTrap("division by zero".into()));
    }

    Ok(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow => bigint_pow(a, b)?,
        BinOp::FloorDiv => {
            let quotient = a / b;
            let inexact = !(a % b).is_zero();
            if inexact && a.is_negative() != b.is_negative() {
                quotient - 1
            } else {
                quotient
            }
        }
        BinOp::UnsignedMod => ((a % b) + b) % b,
        _ => unreachable!("'{op}' is not arithmetic"),
    })
}

/// Largest big-integer power result, in bits. A power is one uninterruptible
/// step, so its cost has to stay bounded.
const MAX_POW_BITS: u64 = 1 << 20;

fn bigint_pow(base: &BigInt, exponent: &BigInt) -> EvalResult<BigInt> {
    if exponent.is_negative() {
        return Err(EvalError::ArithmeticTrap("negative exponent".into()));
    }
    if base.is_zero() || base.abs().is_one() {
        let odd = !(exponent % 2u32).is_zero();
        return Ok(match (base.is_zero(), exponent.is_zero()) {
            (_, true) => BigInt::one(),
            (true, false) => BigInt::zero(),
            _ if base.is_negative() && odd => -BigInt::one(),
            _ => BigInt::one(),
        });
    }
    let too_large = || EvalError::ArithmeticTrap("power result too large".into());
    let exponent = exponent.to_u64().ok_or_else(too_large)?;
    if base.bits().saturating_mul(exponent) > MAX_POW_BITS {
        return Err(too_large());
    }
    let exponent = u32::try_from(exponent).map_err(|_| too_large())?;
    Ok(base.pow(exponent))
}

/// Order two values. `None` when unordered (NaN involved).
fn compare(op: BinOp, lhs: &Value, rhs: &Value) -> EvalResult<Option<Ordering>> {
    Ok(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::BigInt(b)) => b.to_f64().and_then(|b| a.partial_cmp(&b)),
        (Value::BigInt(a), Value::Number(b)) => a.to_f64().and_then(|a| a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => return Err(mismatch(op, lhs, rhs)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(op: BinOp, a: f64, b: f64) -> Value {
        apply(op, Value::Number(a), Value::Number(b), &Semantics::default()).unwrap()
    }

    fn big(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
        apply(
            op,
            Value::BigInt(BigInt::from(a)),
            Value::BigInt(BigInt::from(b)),
            &Semantics::default(),
        )
    }

    #[test]
    fn number_arithmetic() {
        assert_eq!(num(BinOp::Add, 3.0, 5.0), Value::Number(8.0));
        assert_eq!(num(BinOp::Pow, 32.0, 2.0), Value::Number(1024.0));
        assert_eq!(num(BinOp::FloorDiv, -7.0, 2.0), Value::Number(-4.0));
        assert_eq!(num(BinOp::UnsignedMod, -35.0, 3.0), Value::Number(1.0));
        assert_eq!(num(BinOp::Mod, -35.0, 3.0), Value::Number(-2.0));
        assert_eq!(num(BinOp::Div, 1.0, 0.0), Value::Number(f64::INFINITY));
    }

    #[test]
    fn bigint_floor_division_rounds_down() {
        assert_eq!(big(BinOp::FloorDiv, -7, 2), Ok(Value::BigInt(BigInt::from(-4))));
        assert_eq!(big(BinOp::FloorDiv, 7, 2), Ok(Value::BigInt(BigInt::from(3))));
        assert_eq!(big(BinOp::Div, -7, 2), Ok(Value::BigInt(BigInt::from(-3))));
        assert_eq!(big(BinOp::UnsignedMod, -35, 3), Ok(Value::BigInt(BigInt::from(1))));
    }

    #[test]
    fn bigint_traps() {
        assert!(matches!(big(BinOp::Div, 1, 0), Err(EvalError::ArithmeticTrap(_))));
        assert!(matches!(big(BinOp::Mod, 1, 0), Err(EvalError::ArithmeticTrap(_))));
        assert!(matches!(big(BinOp::Pow, 2, -1), Err(EvalError::ArithmeticTrap(_))));
        assert_eq!(big(BinOp::Pow, 2, 64).unwrap().to_string(), "18446744073709551616");
    }

    #[test]
    fn bigint_power_size_is_capped() {
        assert!(matches!(
            big(BinOp::Pow, 2, 4_000_000_000),
            Err(EvalError::ArithmeticTrap(_))
        ));
        assert!(matches!(
            big(BinOp::Pow, 10, 1 << 40),
            Err(EvalError::ArithmeticTrap(_))
        ));
        // 2 has two bits, so 2 ** 2^19 sits exactly on the cap.
        let at_cap = big(BinOp::Pow, 2, 1 << 19).unwrap();
        assert!(matches!(at_cap, Value::BigInt(n) if n.bits() == (1 << 19) + 1));
    }

    #[test]
    fn bigint_power_of_unit_bases_ignores_the_cap() {
        assert_eq!(big(BinOp::Pow, 1, 4_000_000_000), Ok(Value::BigInt(BigInt::from(1))));
        assert_eq!(big(BinOp::Pow, -1, 4_000_000_001), Ok(Value::BigInt(BigInt::from(-1))));
        assert_eq!(big(BinOp::Pow, -1, 4_000_000_000), Ok(Value::BigInt(BigInt::from(1))));
        assert_eq!(big(BinOp::Pow, 0, 4_000_000_000), Ok(Value::BigInt(BigInt::from(0))));
        assert_eq!(big(BinOp::Pow, 0, 0), Ok(Value::BigInt(BigInt::from(1))));
    }

    #[test]
    fn mixed_number_and_bigint() {
        let semantics = Semantics::default();
        let mixed = apply(
            BinOp::Add,
            Value::Number(1.0),
            Value::BigInt(BigInt::from(1)),
            &semantics,
        );
        assert!(matches!(mixed, Err(EvalError::TypeMismatch(_))));
        let ordered = apply(
            BinOp::Less,
            Value::Number(1.5),
            Value::BigInt(BigInt::from(2)),
            &semantics,
        );
        assert_eq!(ordered, Ok(Value::Bool(true)));
    }

    #[test]
    fn comparisons_with_nan_are_false() {
        assert_eq!(num(BinOp::Less, f64::NAN, 1.0), Value::Bool(false));
        assert_eq!(num(BinOp::GreaterEq, f64::NAN, 1.0), Value::Bool(false));
    }
}
