//! Modules available to `import "name" as alias`.

use std::any::Any;
use std::collections::BTreeMap;

use log::info;

use crate::backend::Backend;
use crate::host::{exact_args, nn, no_kwargs, number};
use crate::value::{HostObject, Kwargs, Value};

/// Named bag of attributes.
#[derive(Debug)]
pub struct HostModule {
    name: String,
    members: BTreeMap<&'static str, Value>,
}

impl HostObject for HostModule {
    fn type_name(&self) -> &str {
        "module"
    }

    fn describe(&self) -> String {
        format!("<module '{}'>", self.name)
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        self.members.get(name).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Resolve a module by name.
pub fn import(name: &str) -> Result<Value, String> {
    let members: BTreeMap<&'static str, Value> = match name {
        "math" => math(),
        "nn" => neural(),
        _ => return Err(format!("No module named '{}'", name)),
    };

    info!("Imported host module '{}' ({} members)", name, members.len());

    Ok(Value::host(HostModule {
        name: name.to_owned(),
        members,
    }))
}

fn unary(
    name: &'static str,
    f: fn(f64) -> Result<Value, String>,
) -> impl Fn(&mut dyn Backend, Vec<Value>, Kwargs) -> Result<Value, String> {
    move |_, args, kwargs| {
        no_kwargs(name, &kwargs)?;
        exact_args(name, &args, 1)?;

        f(number(name, &args[0])?)
    }
}

fn math() -> BTreeMap<&'static str, Value> {
    let mut members: BTreeMap<&'static str, Value> = BTreeMap::new();

    members.insert("pi", Value::Float(std::f64::consts::PI));
    members.insert("e", Value::Float(std::f64::consts::E));
    members.insert(
        "sqrt",
        Value::native(
            "sqrt",
            unary("sqrt", |x| {
                if x < 0.0 {
                    Err("math domain error".to_owned())
                } else {
                    Ok(Value::Float(x.sqrt()))
                }
            }),
        ),
    );
    members.insert(
        "floor",
        Value::native("floor", unary("floor", |x| Ok(Value::Int(x.floor() as i64)))),
    );
    members.insert(
        "ceil",
        Value::native("ceil", unary("ceil", |x| Ok(Value::Int(x.ceil() as i64)))),
    );
    members.insert(
        "abs",
        Value::native("abs", |_, args, kwargs| {
            no_kwargs("abs", &kwargs)?;
            exact_args("abs", &args, 1)?;

            match &args[0] {
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| "integer overflow".to_owned()),
                other => Ok(Value::Float(number("abs", other)?.abs())),
            }
        }),
    );
    members.insert(
        "pow",
        Value::native("pow", |_, args, kwargs| {
            no_kwargs("pow", &kwargs)?;
            exact_args("pow", &args, 2)?;

            Ok(Value::Float(
                number("pow", &args[0])?.powf(number("pow", &args[1])?),
            ))
        }),
    );

    members
}

fn neural() -> BTreeMap<&'static str, Value> {
    let constructors: [(&'static str, fn(&mut dyn Backend, Vec<Value>, Kwargs) -> Result<Value, String>); 9] = [
        ("Dense", nn::dense),
        ("ReLU", nn::relu),
        ("Sigmoid", nn::sigmoid),
        ("Flatten", nn::flatten),
        ("Sequential", nn::sequential),
        ("MSELoss", nn::mse_loss),
        ("CrossEntropyLoss", nn::cross_entropy_loss),
        ("SGD", nn::sgd),
        ("Adam", nn::adam),
    ];

    constructors
        .into_iter()
        .map(|(name, ctor)| (name, Value::native(name, ctor)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_modules_are_reported_by_name() {
        assert_eq!(import("numpy").unwrap_err(), "No module named 'numpy'");
    }

    #[test]
    fn math_exposes_constants_and_functions() {
        let Value::Host(math) = import("math").unwrap() else {
            panic!("math is not a host object")
        };

        assert_eq!(math.get_attr("pi"), Some(Value::Float(std::f64::consts::PI)));
        assert!(matches!(math.get_attr("sqrt"), Some(Value::Native(_))));
        assert!(math.get_attr("tan").is_none());
        assert_eq!(math.describe(), "<module 'math'>");
    }

    #[test]
    fn nn_exposes_layer_constructors() {
        let Value::Host(nn) = import("nn").unwrap() else {
            panic!("nn is not a host object")
        };

        for name in ["Dense", "Sequential", "Adam", "MSELoss"] {
            assert!(nn.get_attr(name).is_some(), "missing {}", name);
        }
    }
}
