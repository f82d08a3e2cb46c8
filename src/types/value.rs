//! Scalar values stored in game variables

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar value held by a game variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Comparison operators for conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

/// Operations for variable modification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Value {
    /// Numeric view of the value. Strings that parse as numbers count;
    /// booleans do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.parse().ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Compare two values. Numeric comparison when both sides are numeric,
    /// otherwise equality over the display form. Ordered comparison of
    /// non-numeric values has no sensible answer and yields false.
    pub fn compare(&self, op: Comparator, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match op {
                Comparator::Equal => (a - b).abs() < f64::EPSILON,
                Comparator::NotEqual => (a - b).abs() >= f64::EPSILON,
                Comparator::Less => a < b,
                Comparator::LessOrEqual => a <= b,
                Comparator::Greater => a > b,
                Comparator::GreaterOrEqual => a >= b,
            };
        }

        match op {
            Comparator::Equal => self.to_string() == other.to_string(),
            Comparator::NotEqual => self.to_string() != other.to_string(),
            _ => false,
        }
    }

    /// Apply an arithmetic operation, returning the new value.
    /// Results that land on a whole number collapse back to `Int`.
    pub fn apply(&self, op: Operation, rhs: &Value) -> Result<Value, String> {
        let a = self
            .as_number()
            .ok_or_else(|| format!("cannot use {self} as a number"))?;
        let b = rhs
            .as_number()
            .ok_or_else(|| format!("cannot use {rhs} as a number"))?;

        let result = match op {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide => {
                if b == 0.0 {
                    return Err("division by zero".to_string());
                }
                a / b
            }
        };

        if result.fract() == 0.0 {
            Ok(Value::Int(result as i64))
        } else {
            Ok(Value::Float(result))
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison_crosses_int_and_float() {
        assert!(Value::Int(3).compare(Comparator::Equal, &Value::Float(3.0)));
        assert!(Value::Int(2).compare(Comparator::Less, &Value::Int(5)));
        assert!(Value::Str("10".into()).compare(Comparator::GreaterOrEqual, &Value::Int(10)));
    }

    #[test]
    fn ordered_comparison_of_strings_is_false() {
        let a = Value::Str("apple".into());
        let b = Value::Str("banana".into());
        assert!(!a.compare(Comparator::Less, &b));
        assert!(a.compare(Comparator::NotEqual, &b));
    }

    #[test]
    fn apply_collapses_whole_results_to_int() {
        let v = Value::Int(7).apply(Operation::Add, &Value::Float(3.0)).unwrap();
        assert_eq!(v, Value::Int(10));
        let v = Value::Int(7).apply(Operation::Divide, &Value::Int(2)).unwrap();
        assert_eq!(v, Value::Float(3.5));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        assert!(Value::Int(1).apply(Operation::Divide, &Value::Int(0)).is_err());
    }
}
