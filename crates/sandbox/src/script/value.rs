//! Runtime values.
//!
//! Strings and lists are immutable and reference-counted, so binding the same
//! value to several names never copies it.

use std::cmp::Ordering;
use std::rc::Rc;

use super::builtins::Builtin;
use crate::fault::EvalFault;

/// Longest string a single operation may produce, in bytes.
pub const MAX_STR_LEN: usize = 16 * 1024 * 1024;
/// Longest list a single operation may produce.
pub const MAX_LIST_LEN: usize = 1024 * 1024;
/// Deepest list nesting a value may reach.
pub const MAX_LIST_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<ListValue>),
    Builtin(Builtin),
    /// An exception class such as `ValueError`.
    Class(&'static str),
    /// An exception instance, e.g. `ValueError('boom')`.
    Exception {
        kind: &'static str,
        message: Rc<str>,
    },
}

#[derive(Debug)]
pub struct ListValue {
    items: Vec<Value>,
    depth: usize,
}

impl ListValue {
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// Build a list, enforcing the length and nesting caps.
    pub fn list(items: Vec<Value>) -> Result<Self, EvalFault> {
        if items.len() > MAX_LIST_LEN {
            return Err(EvalFault::memory(format!(
                "list of {} items exceeds the {} item limit",
                items.len(),
                MAX_LIST_LEN
            )));
        }
        let depth = 1 + items
            .iter()
            .map(|item| match item {
                Value::List(inner) => inner.depth,
                _ => 0,
            })
            .max()
            .unwrap_or(0);
        if depth > MAX_LIST_DEPTH {
            return Err(EvalFault::recursion(format!(
                "lists nested deeper than {} levels",
                MAX_LIST_DEPTH
            )));
        }
        Ok(Self::List(Rc::new(ListValue { items, depth })))
    }

    /// Build a string, enforcing the length cap.
    pub fn checked_str(s: String) -> Result<Self, EvalFault> {
        if s.len() > MAX_STR_LEN {
            return Err(EvalFault::memory(format!(
                "string of {} bytes exceeds the {} byte limit",
                s.len(),
                MAX_STR_LEN
            )));
        }
        Ok(Self::Str(s.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Builtin(_) => "builtin_function_or_method",
            Self::Class(_) => "type",
            Self::Exception { kind, .. } => *kind,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(list) => !list.items.is_empty(),
            Self::Builtin(_) | Self::Class(_) | Self::Exception { .. } => true,
        }
    }

    /// Numeric view used by arithmetic; booleans count as integers.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Text produced by `str(value)`.
    pub fn to_display(&self) -> Result<String, EvalFault> {
        match self {
            Self::Str(s) => Ok(s.to_string()),
            Self::Exception { message, .. } => Ok(message.to_string()),
            other => other.repr(),
        }
    }

    /// Text produced by `repr(value)`.
    pub fn repr(&self) -> Result<String, EvalFault> {
        let mut out = String::new();
        self.write_repr(&mut out)?;
        Ok(out)
    }

    fn write_repr(&self, out: &mut String) -> Result<(), EvalFault> {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Float(f) => out.push_str(&format_float(*f)),
            Self::Str(s) => push_quoted(out, s),
            Self::List(list) => {
                out.push('[');
                for (i, item) in list.items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out)?;
                }
                out.push(']');
            }
            Self::Builtin(builtin) => {
                out.push_str(&format!("<built-in function {}>", builtin.name()))
            }
            Self::Class(name) => out.push_str(&format!("<class '{}'>", name)),
            Self::Exception { kind, message } => {
                out.push_str(kind);
                out.push('(');
                if !message.is_empty() {
                    push_quoted(out, message);
                }
                out.push(')');
            }
        }
        if out.len() > MAX_STR_LEN {
            return Err(EvalFault::memory(format!(
                "representation exceeds the {} byte limit",
                MAX_STR_LEN
            )));
        }
        Ok(())
    }

    /// Equality as `==` sees it; numbers compare across int/float/bool.
    pub fn equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.as_f64() == b.as_f64() && (a.is_float() || b.is_float() || a == b);
        }
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.items.len() == b.items.len()
                    && a.items.iter().zip(b.items.iter()).all(|(x, y)| x.equals(y))
            }
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a == b,
            (
                Self::Exception { kind: ka, message: ma },
                Self::Exception { kind: kb, message: mb },
            ) => ka == kb && ma == mb,
            _ => false,
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `min` and `max`.
    ///
    /// `Ok(None)` means the values are unordered (a NaN is involved).
    pub fn compare(&self, other: &Value, symbol: &str) -> Result<Option<Ordering>, EvalFault> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
                _ => a.as_f64().partial_cmp(&b.as_f64()),
            });
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(Some(a.cmp(b))),
            (Self::List(a), Self::List(b)) => {
                for (x, y) in a.items.iter().zip(b.items.iter()) {
                    if !x.equals(y) {
                        return x.compare(y, symbol);
                    }
                }
                Ok(Some(a.items.len().cmp(&b.items.len())))
            }
            _ => Err(EvalFault::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

/// Numeric operand after bool/int/float coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }
}

pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if f != 0.0 && (f.abs() >= 1e16 || f.abs() < 1e-4) {
        // Exponent form, with an explicit sign like `1e+20`.
        let formatted = format!("{:e}", f);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_numeric_equality_crosses_types() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(Value::Bool(true).equals(&Value::Int(1)));
        assert!(!Value::Int(1).equals(&Value::str("1")));
    }

    #[test]
    fn test_list_nesting_cap() {
        let mut value = Value::list(vec![]).unwrap();
        for _ in 1..MAX_LIST_DEPTH {
            value = Value::list(vec![value]).unwrap();
        }
        let err = Value::list(vec![value]).unwrap_err();
        assert_eq!(err.kind, "RecursionError");
    }

    #[test]
    fn test_repr_of_list() {
        let list = Value::list(vec![Value::Int(1), Value::str("a"), Value::None]).unwrap();
        assert_eq!(list.repr().unwrap(), "[1, 'a', None]");
        assert_eq!(list.to_display().unwrap(), "[1, 'a', None]");
    }
}
