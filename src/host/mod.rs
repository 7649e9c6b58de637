//! Host-side collaborators: the tensor type, the neural-network library,
//! builtin functions and importable modules.
//!
//! Everything here is reached from scripts through [`Value::Native`] and
//! [`Value::Host`]; the interpreter itself knows nothing about tensors.

pub mod builtins;
pub mod modules;
pub mod nn;
pub mod tensor;

use crate::value::{Kwargs, Value};

/// Bind native call arguments to `params` by position, then by keyword.
/// Unbound slots are `None`.
pub(crate) fn bind_native(
    name: &str,
    params: &[&str],
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<Vec<Option<Value>>, String> {
    if args.len() > params.len() {
        return Err(format!(
            "{}() takes at most {} arguments ({} given)",
            name,
            params.len(),
            args.len()
        ));
    }

    let mut slots: Vec<Option<Value>> = vec![None; params.len()];

    for (slot, arg) in slots.iter_mut().zip(args) {
        *slot = Some(arg);
    }

    for (key, value) in kwargs {
        let Some(pos) = params.iter().position(|p| *p == key) else {
            return Err(format!(
                "{}() got an unexpected keyword argument '{}'",
                name, key
            ));
        };

        if slots[pos].is_some() {
            return Err(format!(
                "{}() got multiple values for argument '{}'",
                name, key
            ));
        }

        slots[pos] = Some(value);
    }

    Ok(slots)
}

pub(crate) fn no_kwargs(name: &str, kwargs: &Kwargs) -> Result<(), String> {
    match kwargs.first() {
        Some((key, _)) => Err(format!(
            "{}() got an unexpected keyword argument '{}'",
            name, key
        )),
        None => Ok(()),
    }
}

pub(crate) fn exact_args(name: &str, args: &[Value], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "{}() takes exactly {} argument{} ({} given)",
            name,
            count,
            if count == 1 { "" } else { "s" },
            args.len()
        ));
    }

    Ok(())
}

pub(crate) fn number(name: &str, value: &Value) -> Result<f64, String> {
    value.as_f64().ok_or_else(|| {
        format!(
            "{}() expected a number, got '{}'",
            name,
            value.type_name()
        )
    })
}

pub(crate) fn integer(name: &str, value: &Value) -> Result<i64, String> {
    match value {
        Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        other => other.as_int().ok_or_else(|| {
            format!(
                "{}() expected an integer, got '{}'",
                name,
                other.type_name()
            )
        }),
    }
}

pub(crate) fn required(name: &str, param: &str, slot: Option<Value>) -> Result<Value, String> {
    slot.ok_or_else(|| format!("{}() missing required argument: '{}'", name, param))
}
