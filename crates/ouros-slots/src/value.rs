//! Boxed attribute values.
//!
//! A [`Value`] is what Object-kind slots hold and what every typed read boxes into.

use std::{fmt, rc::Rc};

use strum::{Display, IntoStaticStr};

use crate::heap::HeapId;

/// Runtime value stored in, and loaded from, object attribute slots.
///
/// Small immediate values (`None`, `Bool`, `Int`, `Float`) are carried inline. Strings are
/// shared through `Rc` so that boxing a value into an object slot never copies its contents,
/// and references to other objects are arena indices into the [`Heap`](crate::Heap).
///
/// NOTE: it's important to keep this size small, every object-kind slot holds one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Reference to another object living on the heap.
    Ref(HeapId),
}

/// Python-level type of a [`Value`], used for error messages and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Type {
    #[strum(serialize = "NoneType")]
    NoneType,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "str")]
    Str,
    #[strum(serialize = "object")]
    Object,
}

impl Value {
    /// Returns the Python type of this value.
    #[must_use]
    pub fn py_type(&self) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::Ref(_) => Type::Object,
        }
    }

    /// Returns the integer payload when this value is exactly an `int`.
    ///
    /// `bool` is not accepted: an int-kind slot must reject booleans so that
    /// reading the attribute back yields a `bool`, not a `1`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<HeapId> for Value {
    fn from(id: HeapId) -> Self {
        Self::Ref(id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => {
                // repr-style floats always carry a decimal point
                if v.is_finite() && v.fract() == 0.0 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Ref(id) => write!(f, "<object at {:#x}>", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_is_not_an_int() {
        assert_eq!(Value::Bool(true).as_int(), None);
        assert_eq!(Value::Int(1).as_int(), Some(1));
        assert_eq!(Value::Bool(true).py_type(), Type::Bool);
    }

    #[test]
    fn display_matches_python_repr() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(3.14).to_string(), "3.14");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::from("text").to_string(), "'text'");
        assert_eq!(Type::NoneType.to_string(), "NoneType");
    }
}
