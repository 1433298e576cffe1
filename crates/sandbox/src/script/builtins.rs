//! Builtin functions and exception classes.
//!
//! These form the read-only global namespace shared by every evaluation.
//! They hold no state, so sharing them never leaks bindings between calls.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::IntErrorKind;

use super::value::{Number, Value};
use crate::fault::EvalFault;

/// Exception classes a payload may raise or instantiate.
pub const EXCEPTION_CLASSES: &[&str] = &[
    "Exception",
    "ValueError",
    "TypeError",
    "RuntimeError",
    "KeyError",
    "IndexError",
    "ZeroDivisionError",
    "AssertionError",
    "NameError",
    "OverflowError",
    "MemoryError",
    "RecursionError",
    "NotImplementedError",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Str,
    Repr,
    Int,
    Float,
    Bool,
    Abs,
    Min,
    Max,
    Print,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin::Len,
    Builtin::Str,
    Builtin::Repr,
    Builtin::Int,
    Builtin::Float,
    Builtin::Bool,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Print,
];

/// Entry of the global namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Global {
    Builtin(Builtin),
    Class(&'static str),
}

impl Global {
    pub fn to_value(self) -> Value {
        match self {
            Self::Builtin(builtin) => Value::Builtin(builtin),
            Self::Class(name) => Value::Class(name),
        }
    }
}

/// Build the global namespace.
pub fn globals() -> HashMap<&'static str, Global> {
    let mut table = HashMap::new();
    for builtin in BUILTINS {
        table.insert(builtin.name(), Global::Builtin(*builtin));
    }
    for class in EXCEPTION_CLASSES {
        table.insert(*class, Global::Class(class));
    }
    table
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Str => "str",
            Self::Repr => "repr",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Print => "print",
        }
    }

    /// Apply the builtin. `print` hands each line to `stdout`.
    pub fn call(self, args: &[Value], stdout: &mut dyn FnMut(&str)) -> Result<Value, EvalFault> {
        match self {
            Self::Len => match self.single(args)? {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(list) => Ok(Value::Int(list.items().len() as i64)),
                other => Err(EvalFault::type_error(format!(
                    "object of type '{}' has no len()",
                    other.type_name()
                ))),
            },
            Self::Str => match args {
                [] => Ok(Value::str("")),
                _ => Value::checked_str(self.single(args)?.to_display()?),
            },
            Self::Repr => Value::checked_str(self.single(args)?.repr()?),
            Self::Int => match args {
                [] => Ok(Value::Int(0)),
                _ => to_int(self.single(args)?),
            },
            Self::Float => match args {
                [] => Ok(Value::Float(0.0)),
                _ => to_float(self.single(args)?),
            },
            Self::Bool => match args {
                [] => Ok(Value::Bool(false)),
                _ => Ok(Value::Bool(self.single(args)?.is_truthy())),
            },
            Self::Abs => match self.single(args)?.as_number() {
                Some(Number::Int(i)) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| EvalFault::overflow("integer result too large")),
                Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
                None => Err(EvalFault::type_error(format!(
                    "bad operand type for abs(): '{}'",
                    args[0].type_name()
                ))),
            },
            Self::Min => self.extreme(args, Ordering::Less),
            Self::Max => self.extreme(args, Ordering::Greater),
            Self::Print => {
                let parts = args
                    .iter()
                    .map(Value::to_display)
                    .collect::<Result<Vec<_>, _>>()?;
                stdout(&parts.join(" "));
                Ok(Value::None)
            }
        }
    }

    fn single(self, args: &[Value]) -> Result<&Value, EvalFault> {
        match args {
            [value] => Ok(value),
            _ => Err(EvalFault::type_error(format!(
                "{}() takes exactly one argument ({} given)",
                self.name(),
                args.len()
            ))),
        }
    }

    /// `min`/`max` over either the arguments or a single list argument.
    fn extreme(self, args: &[Value], wanted: Ordering) -> Result<Value, EvalFault> {
        let items: &[Value] = match args {
            [] => {
                return Err(EvalFault::type_error(format!(
                    "{} expected at least 1 argument, got 0",
                    self.name()
                )))
            }
            [Value::List(list)] => list.items(),
            [other] => {
                return Err(EvalFault::type_error(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
            many => many,
        };
        let symbol = if wanted == Ordering::Less { "<" } else { ">" };
        let mut best = items.first().ok_or_else(|| {
            EvalFault::value_error(format!("{}() arg is an empty sequence", self.name()))
        })?;
        for item in &items[1..] {
            if item.compare(best, symbol)? == Some(wanted) {
                best = item;
            }
        }
        Ok(best.clone())
    }
}

fn to_int(value: &Value) -> Result<Value, EvalFault> {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().map(Value::Int).map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    EvalFault::overflow("int too large to convert")
                }
                _ => EvalFault::value_error(format!(
                    "invalid literal for int() with base 10: '{}'",
                    trimmed
                )),
            })
        }
        other => match other.as_number() {
            Some(Number::Int(i)) => Ok(Value::Int(i)),
            Some(Number::Float(f)) if f.is_nan() => {
                Err(EvalFault::value_error("cannot convert float NaN to integer"))
            }
            Some(Number::Float(f)) if f.is_infinite() => Err(EvalFault::overflow(
                "cannot convert float infinity to integer",
            )),
            Some(Number::Float(f)) => {
                let truncated = f.trunc();
                // i64::MAX is not representable; 2^63 is the first float out of range.
                if truncated >= -9.223_372_036_854_775_808e18 && truncated < 9.223_372_036_854_775_808e18 {
                    Ok(Value::Int(truncated as i64))
                } else {
                    Err(EvalFault::overflow("int too large to convert"))
                }
            }
            None => Err(EvalFault::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn to_float(value: &Value) -> Result<Value, EvalFault> {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim();
            trimmed.parse::<f64>().map(Value::Float).map_err(|_| {
                EvalFault::value_error(format!("could not convert string to float: '{}'", trimmed))
            })
        }
        other => other
            .as_number()
            .map(|n| Value::Float(n.as_f64()))
            .ok_or_else(|| {
                EvalFault::type_error(format!(
                    "float() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))
            }),
    }
}
