//! Builtin functions bound in the global frame, plus the small method sets of
//! the built-in container types.

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;

use log::debug;

use crate::backend::{ArithOp, Backend};
use crate::host::tensor::{self, Tensor};
use crate::host::{bind_native, exact_args, integer, nn, no_kwargs, required};
use crate::value::{
    compare_values, values_equal, DictKey, HostObject, Kwargs, RangeValue, Value,
};

/// Every builtin, in the order it is bound.
pub fn globals() -> Vec<(&'static str, Value)> {
    vec![
        ("len", Value::native("len", len)),
        ("range", Value::native("range", range)),
        ("min", Value::native("min", |b, a, k| extreme("min", Ordering::Less, b, a, k))),
        ("max", Value::native("max", |b, a, k| extreme("max", Ordering::Greater, b, a, k))),
        ("sum", Value::native("sum", sum)),
        ("str", Value::native("str", to_str)),
        ("tensor", Value::native("tensor", tensor::construct)),
        ("matmul", Value::native("matmul", tensor::matmul)),
        ("no_grad", Value::host(NoGrad::default())),
        ("is_grad_enabled", Value::native("is_grad_enabled", is_grad_enabled)),
        ("Dense", Value::native("Dense", nn::dense)),
        ("ReLU", Value::native("ReLU", nn::relu)),
        ("Sigmoid", Value::native("Sigmoid", nn::sigmoid)),
        ("Flatten", Value::native("Flatten", nn::flatten)),
        ("Sequential", Value::native("Sequential", nn::sequential)),
        ("MSELoss", Value::native("MSELoss", nn::mse_loss)),
        ("CrossEntropyLoss", Value::native("CrossEntropyLoss", nn::cross_entropy_loss)),
        ("SGD", Value::native("SGD", nn::sgd)),
        ("Adam", Value::native("Adam", nn::adam)),
    ]
}

/// Elements of a value a `for` loop may iterate: lists, tuples, strings
/// (one-character strings) and ranges.
pub fn iterable_items(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::List(items) => Some(items.borrow().clone()),
        Value::Tuple(items) => Some(items.to_vec()),
        Value::Str(s) => Some(s.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()),
        Value::Range(r) => Some(r.iter().map(Value::Int).collect()),
        _ => None,
    }
}

fn collection_items(name: &str, value: &Value) -> Result<Vec<Value>, String> {
    if let Value::Dict(dict) = value {
        return Ok(dict.borrow().iter().map(|(k, _)| k.to_value()).collect());
    }

    iterable_items(value)
        .ok_or_else(|| format!("{}() argument '{}' object is not iterable", name, value.type_name()))
}

fn len(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    no_kwargs("len", &kwargs)?;
    exact_args("len", &args, 1)?;

    let n: usize = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(dict) => dict.borrow().len(),
        Value::Range(r) => r.len(),
        other => match Tensor::from_host(other) {
            Some(t) => t.len(),
            None => return Err(format!("object of type '{}' has no len()", other.type_name())),
        },
    };

    Ok(Value::Int(n as i64))
}

fn range(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    no_kwargs("range", &kwargs)?;

    let ints: Vec<i64> = args
        .iter()
        .map(|a| integer("range", a))
        .collect::<Result<_, _>>()?;

    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(format!(
                "range expected 1 to 3 arguments, got {}",
                ints.len()
            ))
        }
    };

    if step == 0 {
        return Err("range() arg 3 must not be zero".to_owned());
    }

    Ok(Value::Range(RangeValue { start, stop, step }))
}

fn extreme(
    name: &str,
    wanted: Ordering,
    _: &mut dyn Backend,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<Value, String> {
    no_kwargs(name, &kwargs)?;

    let candidates: Vec<Value> = match args.len() {
        0 => return Err(format!("{} expected at least 1 argument, got 0", name)),
        1 => collection_items(name, &args[0])?,
        _ => args,
    };

    let mut iter = candidates.into_iter();
    let mut best: Value = iter
        .next()
        .ok_or_else(|| format!("{}() arg is an empty sequence", name))?;

    for candidate in iter {
        match compare_values(&candidate, &best) {
            Some(ordering) if ordering == wanted => best = candidate,
            Some(_) => {}
            None => {
                return Err(format!(
                    "'<' not supported between instances of '{}' and '{}'",
                    candidate.type_name(),
                    best.type_name()
                ))
            }
        }
    }

    Ok(best)
}

fn sum(backend: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    let mut slots = bind_native("sum", &["iterable", "start"], args, kwargs)?.into_iter();
    let iterable: Value = required("sum", "iterable", slots.next().flatten())?;
    let start: Value = slots.next().flatten().unwrap_or(Value::Int(0));

    collection_items("sum", &iterable)?
        .iter()
        .try_fold(start, |total, item| backend.evaluate(ArithOp::Add, &total, item))
}

fn to_str(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    no_kwargs("str", &kwargs)?;
    exact_args("str", &args, 1)?;

    Ok(Value::str(&args[0].to_string()))
}

fn is_grad_enabled(
    backend: &mut dyn Backend,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<Value, String> {
    no_kwargs("is_grad_enabled", &kwargs)?;
    exact_args("is_grad_enabled", &args, 0)?;

    Ok(Value::Bool(backend.grad_enabled()))
}

/// Context manager that disables gradient tracking for the duration of a
/// `with` block.  Nested blocks restore the state they found.
#[derive(Debug, Default)]
pub struct NoGrad {
    saved: RefCell<Vec<bool>>,
}

impl HostObject for NoGrad {
    fn type_name(&self) -> &str {
        "no_grad"
    }

    fn call(&self, _: &mut dyn Backend, _: Vec<Value>, _: Kwargs) -> Result<Value, String> {
        Err("'no_grad' must be used in a 'with' statement, not called as a function.".to_owned())
    }

    fn is_context_manager(&self) -> bool {
        true
    }

    fn enter(&self, backend: &mut dyn Backend) -> Result<(), String> {
        self.saved.borrow_mut().push(backend.grad_enabled());
        backend.set_grad_enabled(false);

        debug!("Gradient tracking disabled");

        Ok(())
    }

    fn exit(&self, backend: &mut dyn Backend) -> Result<(), String> {
        let previous: bool = self.saved.borrow_mut().pop().unwrap_or(true);
        backend.set_grad_enabled(previous);

        debug!("Gradient tracking restored to {}", previous);

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ───────────────────────────── container methods ─────────────────────────

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let pos: i64 = if index < 0 { index + len as i64 } else { index };

    (0..len as i64).contains(&pos).then_some(pos as usize)
}

/// Method `name` of a built-in container value, bound to that value.
pub fn value_method(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::List(items) => {
            let items = items.clone();

            match name {
                "append" => Some(Value::native("append", move |_, args, kwargs| {
                    no_kwargs("append", &kwargs)?;
                    exact_args("append", &args, 1)?;
                    items.borrow_mut().extend(args);

                    Ok(Value::None)
                })),
                "pop" => Some(Value::native("pop", move |_, args, kwargs| {
                    no_kwargs("pop", &kwargs)?;

                    let index: i64 = match args.as_slice() {
                        [] => -1,
                        [i] => integer("pop", i)?,
                        _ => return Err(format!("pop expected at most 1 argument, got {}", args.len())),
                    };

                    let mut items = items.borrow_mut();

                    if items.is_empty() {
                        return Err("pop from empty list".to_owned());
                    }

                    let pos: usize = normalize_index(index, items.len())
                        .ok_or_else(|| "pop index out of range".to_owned())?;

                    Ok(items.remove(pos))
                })),
                "insert" => Some(Value::native("insert", move |_, args, kwargs| {
                    no_kwargs("insert", &kwargs)?;
                    exact_args("insert", &args, 2)?;

                    let mut items = items.borrow_mut();
                    let len: i64 = items.len() as i64;
                    let index: i64 = integer("insert", &args[0])?;
                    let pos: i64 = if index < 0 { (index + len).max(0) } else { index.min(len) };

                    items.insert(pos as usize, args[1].clone());

                    Ok(Value::None)
                })),
                "extend" => Some(Value::native("extend", move |_, args, kwargs| {
                    no_kwargs("extend", &kwargs)?;
                    exact_args("extend", &args, 1)?;

                    let extra: Vec<Value> = collection_items("extend", &args[0])?;
                    items.borrow_mut().extend(extra);

                    Ok(Value::None)
                })),
                _ => None,
            }
        }

        Value::Dict(dict) => {
            let dict = dict.clone();

            match name {
                "keys" => Some(Value::native("keys", move |_, args, kwargs| {
                    no_kwargs("keys", &kwargs)?;
                    exact_args("keys", &args, 0)?;

                    Ok(Value::list(dict.borrow().iter().map(|(k, _)| k.to_value()).collect()))
                })),
                "values" => Some(Value::native("values", move |_, args, kwargs| {
                    no_kwargs("values", &kwargs)?;
                    exact_args("values", &args, 0)?;

                    Ok(Value::list(dict.borrow().iter().map(|(_, v)| v.clone()).collect()))
                })),
                "items" => Some(Value::native("items", move |_, args, kwargs| {
                    no_kwargs("items", &kwargs)?;
                    exact_args("items", &args, 0)?;

                    Ok(Value::list(
                        dict.borrow()
                            .iter()
                            .map(|(k, v)| Value::tuple(vec![k.to_value(), v.clone()]))
                            .collect(),
                    ))
                })),
                "get" => Some(Value::native("get", move |_, args, kwargs| {
                    let mut slots = bind_native("get", &["key", "default"], args, kwargs)?.into_iter();
                    let key: Value = required("get", "key", slots.next().flatten())?;
                    let default: Value = slots.next().flatten().unwrap_or(Value::None);

                    let key: DictKey = DictKey::from_value(&key)?;

                    Ok(dict.borrow().get(&key).cloned().unwrap_or(default))
                })),
                _ => None,
            }
        }

        Value::Str(s) => {
            let s = s.clone();

            match name {
                "upper" => Some(Value::native("upper", move |_, args, kwargs| {
                    no_kwargs("upper", &kwargs)?;
                    exact_args("upper", &args, 0)?;

                    Ok(Value::str(&s.to_uppercase()))
                })),
                "lower" => Some(Value::native("lower", move |_, args, kwargs| {
                    no_kwargs("lower", &kwargs)?;
                    exact_args("lower", &args, 0)?;

                    Ok(Value::str(&s.to_lowercase()))
                })),
                "strip" => Some(Value::native("strip", move |_, args, kwargs| {
                    no_kwargs("strip", &kwargs)?;
                    exact_args("strip", &args, 0)?;

                    Ok(Value::str(s.trim()))
                })),
                "split" => Some(Value::native("split", move |_, args, kwargs| {
                    no_kwargs("split", &kwargs)?;

                    let parts: Vec<Value> = match args.as_slice() {
                        [] => s.split_whitespace().map(Value::str).collect(),
                        [Value::Str(sep)] if !sep.is_empty() => {
                            s.split(&**sep).map(Value::str).collect()
                        }
                        [Value::Str(_)] => return Err("empty separator".to_owned()),
                        _ => return Err("split() expects an optional string separator".to_owned()),
                    };

                    Ok(Value::list(parts))
                })),
                _ => None,
            }
        }

        _ => None,
    }
}

/// Membership test backing `in` / `not in`.  `None` when the container type
/// does not support membership.
pub fn contains(container: &Value, item: &Value) -> Option<Result<bool, String>> {
    match container {
        Value::List(items) => Some(Ok(items.borrow().iter().any(|v| values_equal(v, item)))),
        Value::Tuple(items) => Some(Ok(items.iter().any(|v| values_equal(v, item)))),
        Value::Str(s) => Some(match item {
            Value::Str(needle) => Ok(s.contains(&**needle)),
            other => Err(format!(
                "'in <string>' requires string as left operand, not '{}'",
                other.type_name()
            )),
        }),
        Value::Dict(dict) => Some(DictKey::from_value(item).map(|key| dict.borrow().contains(&key))),
        Value::Range(range) => Some(Ok(range.iter().any(|n| values_equal(&Value::Int(n), item)))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StandardBackend;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
        let (_, func) = globals().into_iter().find(|(n, _)| *n == name).unwrap();
        let Value::Native(native) = func else { panic!("{} is not native", name) };

        native.call(&mut StandardBackend::new(), args, Vec::new())
    }

    #[test]
    fn range_accepts_one_to_three_arguments() {
        assert_eq!(call("range", vec![Value::Int(3)]).unwrap().to_string(), "range(0, 3)");
        assert!(call("range", vec![]).is_err());
        assert!(call("range", vec![Value::Int(0), Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn min_and_max_take_a_sequence_or_arguments() {
        let list = Value::list(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);

        assert_eq!(call("min", vec![list.clone()]), Ok(Value::Int(1)));
        assert_eq!(call("max", vec![Value::Int(4), Value::Float(4.5)]), Ok(Value::Float(4.5)));
        assert!(call("max", vec![Value::list(vec![])]).is_err());
    }

    #[test]
    fn sum_goes_through_backend_arithmetic() {
        let list = Value::list(vec![Value::Int(1), Value::Float(0.5)]);

        assert_eq!(call("sum", vec![list]), Ok(Value::Float(1.5)));
    }

    #[test]
    fn list_methods_mutate_the_shared_list() {
        let list = Value::list(vec![Value::Int(1)]);
        let Some(Value::Native(append)) = value_method(&list, "append") else {
            panic!("append missing")
        };

        append
            .call(&mut StandardBackend::new(), vec![Value::Int(2)], Vec::new())
            .unwrap();

        assert_eq!(list.to_string(), "[1, 2]");
    }

    #[test]
    fn membership_depends_on_container() {
        let s = Value::str("hello");

        assert_eq!(contains(&s, &Value::str("ell")), Some(Ok(true)));
        assert!(contains(&s, &Value::Int(1)).is_some_and(|r| r.is_err()));
        assert!(contains(&Value::Int(1), &Value::Int(1)).is_none());
    }

    #[test]
    fn no_grad_restores_previous_state() {
        let mut backend = StandardBackend::new();
        let guard = NoGrad::default();

        guard.enter(&mut backend).unwrap();
        assert!(!backend.grad_enabled());
        guard.exit(&mut backend).unwrap();
        assert!(backend.grad_enabled());
    }
}
