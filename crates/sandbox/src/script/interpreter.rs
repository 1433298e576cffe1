//! Tree-walking evaluator.
//!
//! An [`Interpreter`] owns one scope and lives for exactly one payload. The
//! global namespace is borrowed read-only, so nothing a payload binds can be
//! observed by the next one.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use super::ast::{BinaryOp, CompareOp, Expr, Stmt, UnaryOp};
use super::builtins::Global;
use super::value::{Number, Value, MAX_LIST_LEN, MAX_STR_LEN};
use crate::fault::EvalFault;

/// Longest printed line kept in the debug log.
const PRINT_LOG_LIMIT: usize = 512;

pub struct Interpreter<'g> {
    globals: &'g HashMap<&'static str, Global>,
    scope: HashMap<String, Value>,
    printed: usize,
}

impl<'g> Interpreter<'g> {
    pub fn new(globals: &'g HashMap<&'static str, Global>) -> Self {
        Self {
            globals,
            scope: HashMap::new(),
            printed: 0,
        }
    }

    /// Number of lines written by `print`.
    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scope
            .get(name)
            .cloned()
            .or_else(|| self.globals.get(name).map(|g| g.to_value()))
    }

    pub fn run(&mut self, program: &[Stmt]) -> Result<(), EvalFault> {
        for stmt in program {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), EvalFault> {
        match stmt {
            Stmt::Assign { name, value } => {
                let value = self.eval(value)?;
                self.scope.insert(name.clone(), value);
            }
            Stmt::AugAssign { name, op, value } => {
                let current = self
                    .lookup(name)
                    .ok_or_else(|| EvalFault::name_error(name))?;
                let operand = self.eval(value)?;
                let updated = binary(*op, &current, &operand)?;
                self.scope.insert(name.clone(), updated);
            }
            Stmt::Delete(names) => {
                for name in names {
                    if self.scope.remove(name).is_none() {
                        return Err(EvalFault::name_error(name));
                    }
                }
            }
            Stmt::Pass => {}
            Stmt::Assert { test, message } => {
                if !self.eval(test)?.is_truthy() {
                    let message = match message {
                        Some(expr) => self.eval(expr)?.to_display()?,
                        None => String::new(),
                    };
                    return Err(EvalFault::new("AssertionError", message));
                }
            }
            Stmt::Raise(None) => {
                return Err(EvalFault::runtime("No active exception to reraise"));
            }
            Stmt::Raise(Some(expr)) => {
                return Err(match self.eval(expr)? {
                    Value::Exception { kind, message } => EvalFault::new(kind, message.to_string()),
                    Value::Class(kind) => EvalFault::new(kind, ""),
                    _ => EvalFault::type_error("exceptions must derive from BaseException"),
                });
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalFault> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::str(s.as_str())),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::list(values)
            }
            Expr::Name(name) => self.lookup(name).ok_or_else(|| EvalFault::name_error(name)),
            Expr::Unary { op, operand } => unary(*op, &self.eval(operand)?),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Compare { left, links } => {
                let mut current = self.eval(left)?;
                for (op, right) in links {
                    let right = self.eval(right)?;
                    if !compare(*op, &current, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    current = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.is_truthy())),
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, &args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                subscript(&target, &index)
            }
        }
    }

    fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Value, EvalFault> {
        match callee {
            Value::Builtin(builtin) => {
                let printed = &mut self.printed;
                builtin.call(args, &mut |line| {
                    *printed += 1;
                    let shown: String = line.chars().take(PRINT_LOG_LIMIT).collect();
                    tracing::debug!(line = %shown, "Payload output");
                })
            }
            Value::Class(kind) => {
                let message = match args {
                    [] => String::new(),
                    [single] => single.to_display()?,
                    many => Value::list(many.to_vec())?.repr()?,
                };
                Ok(Value::Exception {
                    kind: *kind,
                    message: Rc::from(message),
                })
            }
            other => Err(EvalFault::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }
}

fn unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalFault> {
    match (op, operand.as_number()) {
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Neg, Some(Number::Int(i))) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalFault::overflow("integer negation overflowed")),
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (_, None) => Err(EvalFault::type_error(format!(
            "bad operand type for unary {}: '{}'",
            op.symbol(),
            operand.type_name()
        ))),
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> EvalFault {
    EvalFault::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn int_overflow() -> EvalFault {
    EvalFault::overflow("integer result too large")
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalFault> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            if a.len() + b.len() > MAX_STR_LEN {
                return Err(EvalFault::memory("string concatenation exceeds the size limit"));
            }
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::str(joined))
        }
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut items = a.items().to_vec();
            items.extend_from_slice(b.items());
            Value::list(items)
        }
        (Value::Str(_) | Value::List(_), _) if op == BinaryOp::Mul => repeat(left, right),
        (_, Value::Str(_) | Value::List(_)) if op == BinaryOp::Mul => repeat(right, left),
        _ => match (left.as_number(), right.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => int_arith(op, a, b),
            (Some(a), Some(b)) => float_arith(op, a.as_f64(), b.as_f64()),
            _ => Err(unsupported(op, left, right)),
        },
    }
}

/// `sequence * count`.
fn repeat(sequence: &Value, count: &Value) -> Result<Value, EvalFault> {
    let times = match count {
        Value::Int(n) => (*n).max(0) as usize,
        Value::Bool(b) => usize::from(*b),
        other => {
            return Err(EvalFault::type_error(format!(
                "can't multiply sequence by non-int of type '{}'",
                other.type_name()
            )))
        }
    };
    match sequence {
        Value::Str(s) => {
            if s.len().saturating_mul(times) > MAX_STR_LEN {
                return Err(EvalFault::memory("string repetition exceeds the size limit"));
            }
            Ok(Value::str(s.repeat(times)))
        }
        Value::List(list) => {
            if list.items().len().saturating_mul(times) > MAX_LIST_LEN {
                return Err(EvalFault::memory("list repetition exceeds the size limit"));
            }
            let mut items = Vec::with_capacity(list.items().len() * times);
            for _ in 0..times {
                items.extend_from_slice(list.items());
            }
            Value::list(items)
        }
        other => Err(EvalFault::type_error(format!(
            "can't multiply sequence of type '{}'",
            other.type_name()
        ))),
    }
}

fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalFault> {
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(int_overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(int_overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(int_overflow)?,
        BinaryOp::Div => return float_arith(op, a as f64, b as f64),
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalFault::zero_division(if op == BinaryOp::Mod {
                    "integer modulo by zero"
                } else {
                    "integer division or modulo by zero"
                }));
            }
            // `i64::MIN % -1` is 0 even though the quotient overflows.
            if op == BinaryOp::Mod && b == -1 {
                return Ok(Value::Int(0));
            }
            let quotient = a.checked_div(b).ok_or_else(int_overflow)?;
            let remainder = a - quotient * b;
            // Round toward negative infinity.
            let floored = remainder != 0 && ((remainder < 0) != (b < 0));
            if op == BinaryOp::FloorDiv {
                if floored {
                    quotient - 1
                } else {
                    quotient
                }
            } else if floored {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(EvalFault::zero_division(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exponent = u32::try_from(b).map_err(|_| int_overflow())?;
            a.checked_pow(exponent).ok_or_else(int_overflow)?
        }
    };
    Ok(Value::Int(value))
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalFault> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalFault::zero_division("division by zero"));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalFault::zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalFault::zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalFault::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EvalFault::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(EvalFault::overflow("numerical result out of range"));
            }
            result
        }
    };
    Ok(Value::Float(value))
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalFault> {
    let ordering = match op {
        CompareOp::Eq => return Ok(left.equals(right)),
        CompareOp::Ne => return Ok(!left.equals(right)),
        CompareOp::In => return contains(right, left),
        _ => left.compare(right, op.symbol())?,
    };
    Ok(match (op, ordering) {
        (_, None) => false,
        (CompareOp::Lt, Some(o)) => o == Ordering::Less,
        (CompareOp::Le, Some(o)) => o != Ordering::Greater,
        (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
        (_, Some(o)) => o != Ordering::Less,
    })
}

fn contains(container: &Value, needle: &Value) -> Result<bool, EvalFault> {
    match (container, needle) {
        (Value::Str(haystack), Value::Str(fragment)) => Ok(haystack.contains(&**fragment)),
        (Value::Str(_), other) => Err(EvalFault::type_error(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::List(list), _) => Ok(list.items().iter().any(|item| item.equals(needle))),
        (other, _) => Err(EvalFault::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalFault> {
    let position = match index {
        Value::Int(i) => *i,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(EvalFault::type_error(format!(
                "{} indices must be integers, not {}",
                target.type_name(),
                other.type_name()
            )))
        }
    };
    let resolve = |len: usize, what: &str| -> Result<usize, EvalFault> {
        let len = len as i64;
        let resolved = if position < 0 { position + len } else { position };
        if (0..len).contains(&resolved) {
            Ok(resolved as usize)
        } else {
            Err(EvalFault::index_error(format!("{} index out of range", what)))
        }
    };
    match target {
        Value::Str(s) => {
            let at = resolve(s.chars().count(), "string")?;
            let c = s.chars().nth(at).map(String::from).unwrap_or_default();
            Ok(Value::str(c))
        }
        Value::List(list) => Ok(list.items()[resolve(list.items().len(), "list")?].clone()),
        other => Err(EvalFault::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}
