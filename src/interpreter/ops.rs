//! Operators, subscripting and item assignment.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, UnaryOp};
use crate::backend::ArithOp;
use crate::host::builtins;
use crate::interpreter::Interpreter;
use crate::value::{compare_values, values_equal, DictKey, SliceValue, Value};

impl Interpreter {
    pub(super) fn unary(&mut self, op: UnaryOp, value: &Value) -> Result<Value, String> {
        match (op, value) {
            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned()),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
            (UnaryOp::Neg, Value::Host(_)) => {
                self.backend.evaluate(ArithOp::Mul, &Value::Int(-1), value)
            }

            (UnaryOp::Pos, Value::Int(_) | Value::Float(_) | Value::Host(_)) => Ok(value.clone()),
            (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),

            (op, other) => Err(format!(
                "bad operand type for unary {}: '{}'",
                match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                },
                other.type_name()
            )),
        }
    }

    pub(super) fn binary(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, String> {
        match op {
            BinaryOp::Add => self.backend.evaluate(ArithOp::Add, left, right),
            BinaryOp::Sub => self.backend.evaluate(ArithOp::Sub, left, right),
            BinaryOp::Mul => self.backend.evaluate(ArithOp::Mul, left, right),
            BinaryOp::Div => self.backend.evaluate(ArithOp::Div, left, right),

            BinaryOp::Equal => Ok(Value::Bool(values_equal(left, right))),
            BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(left, right))),

            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                let Some(ordering) = compare_values(left, right) else {
                    return Err(format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op,
                        left.type_name(),
                        right.type_name()
                    ));
                };

                Ok(Value::Bool(match op {
                    BinaryOp::Less => ordering == Ordering::Less,
                    BinaryOp::LessEqual => ordering != Ordering::Greater,
                    BinaryOp::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }

            BinaryOp::In | BinaryOp::NotIn => match builtins::contains(right, left) {
                Some(found) => Ok(Value::Bool(found? == (op == BinaryOp::In))),
                None => Err(format!(
                    "argument of type '{}' is not iterable",
                    right.type_name()
                )),
            },
        }
    }
}

/// Resolve a possibly negative index against `len`.
fn position(kind: &str, index: i64, len: usize) -> Result<usize, String> {
    let resolved: i64 = if index < 0 { index + len as i64 } else { index };

    if resolved < 0 || resolved >= len as i64 {
        return Err(format!("{} index out of range", kind));
    }

    Ok(resolved as usize)
}

fn sequence_index(kind: &str, index: &Value) -> Result<i64, String> {
    match index {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!(
            "{} indices must be integers or slices, not '{}'",
            kind,
            other.type_name()
        )),
    }
}

/// `object[index]`.
pub(super) fn get_index(object: &Value, index: &Value) -> Result<Value, String> {
    match (object, index) {
        (Value::Host(host), _) => host.get_index(index),

        (Value::Dict(dict), key) => {
            let key: DictKey = DictKey::from_value(key)?;

            dict.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| format!("KeyError: {}", key.to_value().repr()))
        }

        (Value::List(items), Value::Slice(slice)) => {
            let items = items.borrow();

            Ok(Value::list(select(&items, slice)?))
        }
        (Value::List(items), index) => {
            let items = items.borrow();
            let at: usize = position("list", sequence_index("list", index)?, items.len())?;

            Ok(items[at].clone())
        }

        (Value::Tuple(items), Value::Slice(slice)) => Ok(Value::tuple(select(items, slice)?)),
        (Value::Tuple(items), index) => {
            let at: usize = position("tuple", sequence_index("tuple", index)?, items.len())?;

            Ok(items[at].clone())
        }

        (Value::Str(s), index) => {
            let chars: Vec<char> = s.chars().collect();

            match index {
                Value::Slice(slice) => {
                    let picked: String = slice
                        .indices(chars.len())?
                        .into_iter()
                        .map(|i: usize| chars[i])
                        .collect();

                    Ok(Value::str(&picked))
                }
                index => {
                    let at: usize = position("string", sequence_index("string", index)?, chars.len())?;

                    Ok(Value::str(chars[at].encode_utf8(&mut [0; 4])))
                }
            }
        }

        (Value::Range(range), Value::Slice(slice)) => Ok(Value::list(
            slice
                .indices(range.len())?
                .into_iter()
                .filter_map(|i: usize| range.get(i))
                .map(Value::Int)
                .collect(),
        )),
        (Value::Range(range), index) => {
            let at: usize = position("range object", sequence_index("range", index)?, range.len())?;

            range
                .get(at)
                .map(Value::Int)
                .ok_or_else(|| "range object index out of range".to_owned())
        }

        (other, _) => Err(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        )),
    }
}

fn select(items: &[Value], slice: &SliceValue) -> Result<Vec<Value>, String> {
    Ok(slice
        .indices(items.len())?
        .into_iter()
        .map(|i: usize| items[i].clone())
        .collect())
}

/// `object[index] = value`.
pub(super) fn set_index(object: &Value, index: &Value, value: Value) -> Result<(), String> {
    match object {
        Value::Host(host) => host.set_index(index, value),

        Value::Dict(dict) => {
            let key: DictKey = DictKey::from_value(index)?;
            dict.borrow_mut().insert(key, value);

            Ok(())
        }

        Value::List(items) => {
            if let Value::Slice(_) = index {
                return Err("slice assignment is not supported".to_owned());
            }

            let mut items = items.borrow_mut();
            let at: usize = position("list assignment", sequence_index("list", index)?, items.len())?;
            items[at] = value;

            Ok(())
        }

        other => Err(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().copied().map(Value::Int).collect())
    }

    fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Value {
        Value::Slice(SliceValue { start, stop, step })
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let list = ints(&[1, 2, 3]);

        assert_eq!(get_index(&list, &Value::Int(-1)), Ok(Value::Int(3)));
        assert_eq!(
            get_index(&list, &Value::Int(3)).unwrap_err(),
            "list index out of range"
        );
    }

    #[test]
    fn slices_follow_clamping_rules() {
        let list = ints(&[0, 1, 2, 3, 4]);

        assert_eq!(
            get_index(&list, &slice(Some(1), Some(100), Some(2))).unwrap(),
            ints(&[1, 3])
        );
        assert_eq!(
            get_index(&list, &slice(None, None, Some(-1))).unwrap(),
            ints(&[4, 3, 2, 1, 0])
        );
        assert_eq!(
            get_index(&Value::str("hello"), &slice(Some(1), Some(3), None)).unwrap(),
            Value::str("el")
        );
    }

    #[test]
    fn tuples_and_strings_are_immutable() {
        let tuple = Value::tuple(vec![Value::Int(1)]);

        assert_eq!(
            set_index(&tuple, &Value::Int(0), Value::Int(2)).unwrap_err(),
            "'tuple' object does not support item assignment"
        );
        assert!(set_index(&Value::str("ab"), &Value::Int(0), Value::str("z")).is_err());
    }

    #[test]
    fn missing_dict_keys_raise_key_error() {
        let dict = Value::dict(crate::value::Dict::new());

        set_index(&dict, &Value::str("a"), Value::Int(1)).unwrap();

        assert_eq!(get_index(&dict, &Value::str("a")), Ok(Value::Int(1)));
        assert_eq!(get_index(&dict, &Value::str("b")).unwrap_err(), "KeyError: 'b'");
    }
}
