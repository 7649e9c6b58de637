//! Numeric backend seam.
//!
//! All `+ - * /` arithmetic in a running program is routed through
//! [`Backend::evaluate`], so host numeric types (tensors) can define their
//! own arithmetic.  The backend may also hold variables of its own, which the
//! interpreter consults after its scope stack.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }

    pub fn apply_f64(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

pub trait Backend {
    fn enter_scope(&mut self);

    fn exit_scope(&mut self);

    fn get(&self, name: &str) -> Option<Value>;

    fn set(&mut self, name: &str, value: Value);

    fn evaluate(&mut self, op: ArithOp, left: &Value, right: &Value) -> Result<Value, String>;

    fn set_grad_enabled(&mut self, enabled: bool);

    fn grad_enabled(&self) -> bool;
}

/// Default backend: plain numbers, sequence concatenation/repetition, and
/// delegation to host objects for everything else.
#[derive(Debug)]
pub struct StandardBackend {
    scopes: Vec<HashMap<String, Value>>,
    grad_enabled: bool,
}

impl Default for StandardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardBackend {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            grad_enabled: true,
        }
    }
}

impl Backend for StandardBackend {
    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    /// Overwrite the nearest scope holding `name`, else bind it innermost.
    fn set(&mut self, name: &str, value: Value) {
        let holder: Option<&mut HashMap<String, Value>> = match self
            .scopes
            .iter()
            .rposition(|scope| scope.contains_key(name))
        {
            Some(pos) => self.scopes.get_mut(pos),
            None => self.scopes.last_mut(),
        };

        if let Some(scope) = holder {
            scope.insert(name.to_owned(), value);
        }
    }

    fn evaluate(&mut self, op: ArithOp, left: &Value, right: &Value) -> Result<Value, String> {
        debug!("evaluate {} {} {}", left.repr(), op, right.repr());

        arithmetic(op, left, right)
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }
}

fn unsupported(op: ArithOp, left: &Value, right: &Value) -> String {
    format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    )
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_))
}

const TOO_LARGE: &str = "repetition result too large";

/// Element count of `len` items repeated `count` times.
fn repetition_len(len: usize, count: i64) -> Result<usize, String> {
    len.checked_mul(count.max(0) as usize)
        .ok_or_else(|| TOO_LARGE.to_owned())
}

fn repeat<T: Clone>(items: &[T], count: i64) -> Result<Vec<T>, String> {
    let total: usize = repetition_len(items.len(), count)?;
    let mut out: Vec<T> = Vec::new();

    if total == 0 {
        return Ok(out);
    }

    out.try_reserve_exact(total)
        .map_err(|_| TOO_LARGE.to_owned())?;

    for _ in 0..count {
        out.extend_from_slice(items);
    }

    Ok(out)
}

fn repeat_str(s: &str, count: i64) -> Result<String, String> {
    let total: usize = repetition_len(s.len(), count)?;
    let mut out: String = String::new();

    if total == 0 {
        return Ok(out);
    }

    out.try_reserve_exact(total)
        .map_err(|_| TOO_LARGE.to_owned())?;

    for _ in 0..count {
        out.push_str(s);
    }

    Ok(out)
}

/// Arithmetic shared by every backend that does not override it.
pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Result<Value, String> {
    match (op, left, right) {
        (_, Value::Host(h), other) => h.binary_op(op, other, false),
        (_, other, Value::Host(h)) => h.binary_op(op, other, true),

        (ArithOp::Div, _, _) if is_number(left) && is_number(right) => {
            match (left.as_f64(), right.as_f64()) {
                (Some(_), Some(b)) if b == 0.0 => Err("division by zero".to_owned()),
                (Some(a), Some(b)) => Ok(Value::Float(a / b)),
                _ => Err(unsupported(op, left, right)),
            }
        }

        (_, Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            let (a, b) = (left.as_int().unwrap_or(0), right.as_int().unwrap_or(0));
            let result: Option<i64> = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Sub => a.checked_sub(b),
                ArithOp::Mul => a.checked_mul(b),
                ArithOp::Div => None,
            };

            result
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned())
        }

        (_, _, _) if is_number(left) && is_number(right) => {
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => Ok(Value::Float(op.apply_f64(a, b))),
                _ => Err(unsupported(op, left, right)),
            }
        }

        (ArithOp::Add, Value::Str(a), Value::Str(b)) => {
            Ok(Value::str(&format!("{}{}", a, b)))
        }
        (ArithOp::Add, Value::List(a), Value::List(b)) => {
            let mut items: Vec<Value> = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());

            Ok(Value::list(items))
        }
        (ArithOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }

        (ArithOp::Mul, Value::Str(s), Value::Int(n))
        | (ArithOp::Mul, Value::Int(n), Value::Str(s)) => {
            repeat_str(s, *n).map(|s: String| Value::str(&s))
        }
        (ArithOp::Mul, Value::List(items), Value::Int(n))
        | (ArithOp::Mul, Value::Int(n), Value::List(items)) => {
            repeat(items.borrow().as_slice(), *n).map(Value::list)
        }
        (ArithOp::Mul, Value::Tuple(items), Value::Int(n))
        | (ArithOp::Mul, Value::Int(n), Value::Tuple(items)) => {
            repeat(&items[..], *n).map(Value::tuple)
        }

        _ => Err(unsupported(op, left, right)),
    }
}
