//! Runtime values and the host object capability.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use tico_types::ast::Literal;

// ══════════════════════════════════════════════════════════════════════════════
// Value
// ══════════════════════════════════════════════════════════════════════════════

/// A Tico runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    /// A value owned by the embedding application.
    Host(Rc<dyn HostObject>),
}

impl Value {
    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Rc::new(object))
    }

    /// `undefined`, `null`, `false`, `0`, `NaN`, `0n` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::Host(_) => true,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Host(object) => object.type_name(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast a host value to its concrete type.
    pub fn downcast_host<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Host(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::BigInt(n) => Value::BigInt(n.clone()),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
            Literal::Undefined => Value::Undefined,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

/// Strict structural equality. Numbers and big integers compare by numeric
/// value; host values compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Number(a), Value::BigInt(b)) | (Value::BigInt(b), Value::Number(a)) => {
                b.to_f64().is_some_and(|b| b == *a)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Host(object) => write!(f, "{object}"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n == 0.0 {
        f.write_str("0")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{n}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Host objects
// ══════════════════════════════════════════════════════════════════════════════

/// Operator hooks a host object may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overload {
    Add,
    Sub,
    Mult,
    Pow,
    Div,
    Fdiv,
    Mod,
    Greater,
    Lesser,
    Equals,
    And,
    Or,
}

impl Overload {
    pub fn name(self) -> &'static str {
        match self {
            Overload::Add => "add",
            Overload::Sub => "sub",
            Overload::Mult => "mult",
            Overload::Pow => "pow",
            Overload::Div => "div",
            Overload::Fdiv => "fdiv",
            Overload::Mod => "mod",
            Overload::Greater => "greater",
            Overload::Lesser => "lesser",
            Overload::Equals => "equals",
            Overload::And => "and",
            Overload::Or => "or",
        }
    }
}

impl fmt::Display for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value type supplied by the embedding application.
///
/// When either operand of a binary operator is a host object, its
/// [`binary_op`](HostObject::binary_op) hook is consulted before the native
/// semantics; the left operand is asked first. Returning `None` declines.
pub trait HostObject: fmt::Debug + fmt::Display {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &str {
        "object"
    }

    /// `lhs` and `rhs` are always in source order, whichever side `self` is.
    fn binary_op(&self, op: Overload, lhs: &Value, rhs: &Value) -> Option<Result<Value, String>> {
        let _ = (op, lhs, rhs);
        None
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Native functions
// ══════════════════════════════════════════════════════════════════════════════

/// A host callback callable from scripts.
#[derive(Clone)]
pub struct NativeFn(Rc<dyn Fn(Vec<Value>) -> Result<Value, String>>);

impl NativeFn {
    pub fn new(f: impl Fn(Vec<Value>) -> Result<Value, String> + 'static) -> Self {
        NativeFn(Rc::new(f))
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        for falsy in [
            Value::Undefined,
            Value::Null,
            Value::Bool(false),
            Value::Number(0.0),
            Value::Number(f64::NAN),
            Value::BigInt(BigInt::from(0)),
            Value::from(""),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?} should be falsy");
        }
        assert!(Value::from("0").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn number_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn numeric_equality_across_kinds() {
        assert_eq!(Value::Number(5.0), Value::BigInt(BigInt::from(5)));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from("1"), Value::Number(1.0));
    }
}
