//! Runtime values.
//!
//! Lists, dictionaries and instances are shared handles (`Rc` + `RefCell`):
//! assigning one to a second name aliases it, and mutations through either
//! name are visible through both.  Tuples and strings are immutable.

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDef;
use crate::backend::{ArithOp, Backend};
use crate::class::ClassId;

/// Keyword arguments in call order.
pub type Kwargs = Vec<(String, Value)>;

/// Signature shared by builtin functions and host methods.
pub type NativeFn = dyn Fn(&mut dyn Backend, Vec<Value>, Kwargs) -> Result<Value, String>;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<[Value]>),
    Dict(Rc<RefCell<Dict>>),
    Range(RangeValue),
    Slice(SliceValue),
    Function(Rc<FunctionDef>),
    Class(ClassRef),
    Instance(Rc<Instance>),
    BoundMethod(Rc<BoundMethod>),
    Super(Rc<SuperRef>),
    Native(Rc<NativeFunction>),
    Host(Rc<dyn HostObject>),
}

/// A class as seen from a value: its arena id plus its name for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRef {
    pub id: ClassId,
    pub name: Rc<str>,
}

#[derive(Debug)]
pub struct Instance {
    pub class: ClassRef,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_owned(), value);
    }
}

/// A method paired with its receiver and the class in the receiver's MRO on
/// which the method was found.
#[derive(Debug)]
pub struct BoundMethod {
    pub instance: Rc<Instance>,
    pub method: Rc<FunctionDef>,
    pub defining_class: ClassId,
}

/// Result of evaluating `super` inside a running method.  Attribute lookups
/// on it search the instance's MRO strictly after `defining_class`.
#[derive(Debug)]
pub struct SuperRef {
    pub instance: Rc<Instance>,
    pub defining_class: ClassId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let span: i128 = if self.step > 0 {
            self.stop as i128 - self.start as i128
        } else {
            self.start as i128 - self.stop as i128
        };

        if span <= 0 {
            return 0;
        }

        let step: i128 = (self.step as i128).abs();

        ((span + step - 1) / step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        (index < self.len()).then(|| self.nth(index))
    }

    pub fn iter(self) -> impl Iterator<Item = i64> {
        (0..self.len()).map(move |i: usize| self.nth(i))
    }

    /// Element `index`, which must be below `len()`.  Wrapping is exact there
    /// because the element itself lies between `start` and `stop`.
    fn nth(&self, index: usize) -> i64 {
        self.start
            .wrapping_add(self.step.wrapping_mul(index as i64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceValue {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl SliceValue {
    /// Resolve against a sequence of `len` elements using the usual clamping
    /// rules and return the selected positions in order.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>, String> {
        let step: i64 = self.step.unwrap_or(1);

        if step == 0 {
            return Err("slice step cannot be zero".to_owned());
        }

        let len: i64 = len as i64;

        let clamp = |bound: Option<i64>, default: i64, low: i64, high: i64| -> i64 {
            match bound {
                None => default,
                Some(b) if b < 0 => (b + len).max(low),
                Some(b) => b.min(high),
            }
        };

        let mut positions: Vec<usize> = Vec::new();

        if step > 0 {
            let start: i64 = clamp(self.start, 0, 0, len);
            let stop: i64 = clamp(self.stop, len, 0, len);
            let mut i: i64 = start;

            while i < stop {
                positions.push(i as usize);
                i = match i.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        } else {
            let start: i64 = clamp(self.start, len - 1, -1, len - 1);
            let stop: i64 = clamp(self.stop, -1, -1, len - 1);
            let mut i: i64 = start;

            while i > stop {
                positions.push(i as usize);
                i = match i.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        }

        Ok(positions)
    }
}

/// Builtin function or host method.
pub struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut dyn Backend, Vec<Value>, Kwargs) -> Result<Value, String> + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(
        &self,
        backend: &mut dyn Backend,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, String> {
        (self.func)(backend, args, kwargs)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// An opaque object owned by the host side: tensors, layers, optimizers,
/// imported modules.  Every hook has a failing default so implementors only
/// provide what they support.
pub trait HostObject: fmt::Debug {
    fn type_name(&self) -> &str;

    fn describe(&self) -> String {
        format!("<{} object>", self.type_name())
    }

    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_attr(&self, name: &str, _value: Value) -> Result<(), String> {
        Err(format!(
            "'{}' object attribute '{}' is read-only",
            self.type_name(),
            name
        ))
    }

    fn call(
        &self,
        _backend: &mut dyn Backend,
        _args: Vec<Value>,
        _kwargs: Kwargs,
    ) -> Result<Value, String> {
        Err(format!("'{}' object is not callable", self.type_name()))
    }

    fn get_index(&self, _index: &Value) -> Result<Value, String> {
        Err(format!("'{}' object is not subscriptable", self.type_name()))
    }

    fn set_index(&self, _index: &Value, _value: Value) -> Result<(), String> {
        Err(format!(
            "'{}' object does not support item assignment",
            self.type_name()
        ))
    }

    /// Arithmetic with this object on one side.  `reflected` is true when the
    /// object is the right operand.
    fn binary_op(&self, op: ArithOp, _other: &Value, _reflected: bool) -> Result<Value, String> {
        Err(format!(
            "unsupported operand type(s) for {}: '{}'",
            op,
            self.type_name()
        ))
    }

    fn is_context_manager(&self) -> bool {
        false
    }

    fn enter(&self, _backend: &mut dyn Backend) -> Result<(), String> {
        Err(format!(
            "'{}' object does not support the context manager protocol",
            self.type_name()
        ))
    }

    fn exit(&self, _backend: &mut dyn Backend) -> Result<(), String> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

// ───────────────────────────── dictionaries ─────────────────────────────

/// Hashable subset of [`Value`] usable as a dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<DictKey>),
}

impl DictKey {
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::None => Ok(DictKey::None),
            // Booleans key like 0 and 1.
            Value::Bool(b) => Ok(DictKey::Int(*b as i64)),
            Value::Int(n) => Ok(DictKey::Int(*n)),
            Value::Float(f) => {
                // 2.0 and 2 must address the same entry.
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Ok(DictKey::Int(*f as i64))
                } else {
                    Ok(DictKey::Float(f.to_bits()))
                }
            }
            Value::Str(s) => Ok(DictKey::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(DictKey::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(DictKey::Tuple),
            other => Err(format!("unhashable type: '{}'", other.type_name())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DictKey::None => Value::None,
            DictKey::Int(n) => Value::Int(*n),
            DictKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            DictKey::Str(s) => Value::Str(s.clone()),
            DictKey::Tuple(items) => Value::tuple(items.iter().map(DictKey::to_value).collect()),
        }
    }
}

/// Key/value mapping.  Entries stay in insertion order so printing is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(DictKey, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &DictKey) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &DictKey) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: DictKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DictKey, Value)> {
        self.entries.iter()
    }
}

// ───────────────────────────── constructors ─────────────────────────────

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }

    pub fn dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn native<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut dyn Backend, Vec<Value>, Kwargs) -> Result<Value, String> + 'static,
    {
        Value::Native(Rc::new(NativeFunction::new(name, func)))
    }

    pub fn host<H: HostObject + 'static>(object: H) -> Self {
        Value::Host(Rc::new(object))
    }

    /// Name of the value's type as shown in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_owned(),
            Value::Bool(_) => "bool".to_owned(),
            Value::Int(_) => "int".to_owned(),
            Value::Float(_) => "float".to_owned(),
            Value::Str(_) => "str".to_owned(),
            Value::List(_) => "list".to_owned(),
            Value::Tuple(_) => "tuple".to_owned(),
            Value::Dict(_) => "dict".to_owned(),
            Value::Range(_) => "range".to_owned(),
            Value::Slice(_) => "slice".to_owned(),
            Value::Function(_) => "function".to_owned(),
            Value::Class(_) => "class".to_owned(),
            Value::Instance(inst) => inst.class.name.to_string(),
            Value::BoundMethod(_) => "method".to_owned(),
            Value::Super(_) => "super".to_owned(),
            Value::Native(_) => "builtin_function".to_owned(),
            Value::Host(h) => h.type_name().to_owned(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Range(r) => !r.is_empty(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Representation used inside containers: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

// ───────────────────────────── equality & ordering ─────────────────────────

/// Structural equality for data, identity for objects.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            Rc::ptr_eq(a, b) || sequences_equal(&a.borrow(), &b.borrow())
        }
        (Value::Tuple(a), Value::Tuple(b)) => sequences_equal(a, b),
        (Value::Dict(a), Value::Dict(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }

            let (a, b) = (a.borrow(), b.borrow());

            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        (Value::Range(a), Value::Range(b)) => a == b,
        (Value::Slice(a), Value::Slice(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Class(a), Value::Class(b)) => a.id == b.id,
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (Value::BoundMethod(a), Value::BoundMethod(b)) => {
            Rc::ptr_eq(&a.instance, &b.instance) && Rc::ptr_eq(&a.method, &b.method)
        }
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::Host(a), Value::Host(b)) => {
            std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
        }
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
}

impl Value {
    /// Numeric view used by mixed comparisons.  Booleans count as 0 and 1,
    /// so `true == 1` holds.
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// Ordering for `< <= > >=`.  `None` means the operands are not comparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) => compare_sequences(&a.borrow(), &b.borrow()),
        (Value::Tuple(a), Value::Tuple(b)) => compare_sequences(a, b),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b) {
        if values_equal(x, y) {
            continue;
        }

        return compare_values(x, y);
    }

    Some(a.len().cmp(&b.len()))
}

// ───────────────────────────── display ─────────────────────────────

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_owned()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn join_repr<'v>(items: impl Iterator<Item = &'v Value>) -> String {
    items.map(Value::repr).collect::<Vec<_>>().join(", ")
}

thread_local! {
    /// Shared containers whose rendering is in progress, innermost last.
    static RENDERING: RefCell<Vec<*const ()>> = RefCell::new(Vec::new());
}

/// Render a shared container, or `cycle` when it is already being rendered
/// further out (a list that contains itself).
fn render_once(
    f: &mut fmt::Formatter<'_>,
    container: *const (),
    cycle: &str,
    render: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if RENDERING.with(|active| active.borrow().contains(&container)) {
        return f.write_str(cycle);
    }

    RENDERING.with(|active| active.borrow_mut().push(container));
    let result: fmt::Result = render(f);
    RENDERING.with(|active| {
        active.borrow_mut().pop();
    });

    result
}

fn fmt_bound(bound: Option<i64>) -> String {
    bound.map_or_else(|| "None".to_owned(), |b: i64| b.to_string())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => render_once(f, Rc::as_ptr(items) as *const (), "[...]", |f| {
                write!(f, "[{}]", join_repr(items.borrow().iter()))
            }),
            Value::Tuple(items) => {
                if items.len() == 1 {
                    write!(f, "({},)", items[0].repr())
                } else {
                    write!(f, "({})", join_repr(items.iter()))
                }
            }
            Value::Dict(d) => render_once(f, Rc::as_ptr(d) as *const (), "{...}", |f| {
                let body: Vec<String> = d
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_value().repr(), v.repr()))
                    .collect();

                write!(f, "{{{}}}", body.join(", "))
            }),
            Value::Range(r) => {
                if r.step == 1 {
                    write!(f, "range({}, {})", r.start, r.stop)
                } else {
                    write!(f, "range({}, {}, {})", r.start, r.stop, r.step)
                }
            }
            Value::Slice(s) => write!(
                f,
                "slice({}, {}, {})",
                fmt_bound(s.start),
                fmt_bound(s.stop),
                fmt_bound(s.step)
            ),
            Value::Function(def) => write!(f, "<function {}>", def.name),
            Value::Class(class) => write!(f, "<class '{}'>", class.name),
            Value::Instance(inst) => write!(f, "<{} instance>", inst.class.name),
            Value::BoundMethod(bm) => write!(
                f,
                "<bound method {}.{}>",
                bm.instance.class.name, bm.method.name
            ),
            Value::Super(s) => write!(f, "<super of {} instance>", s.instance.class.name),
            Value::Native(n) => write!(f, "<built-in function {}>", n.name()),
            Value::Host(h) => f.write_str(&h.describe()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_clamp_like_sequences_do() {
        let slice = |start, stop, step| SliceValue { start, stop, step };

        assert_eq!(slice(Some(1), None, None).indices(4), Ok(vec![1, 2, 3]));
        assert_eq!(slice(None, Some(-1), None).indices(4), Ok(vec![0, 1, 2]));
        assert_eq!(slice(None, None, Some(-1)).indices(3), Ok(vec![2, 1, 0]));
        assert_eq!(slice(Some(-10), Some(10), Some(2)).indices(5), Ok(vec![0, 2, 4]));
        assert!(slice(None, None, Some(0)).indices(3).is_err());
        assert_eq!(slice(Some(1), None, Some(i64::MAX)).indices(3), Ok(vec![1]));
        assert_eq!(slice(None, None, Some(i64::MIN)).indices(3), Ok(vec![2]));
    }

    #[test]
    fn integral_float_keys_alias_int_keys() {
        let mut dict = Dict::new();
        dict.insert(DictKey::from_value(&Value::Int(2)).unwrap(), Value::str("two"));

        let key = DictKey::from_value(&Value::Float(2.0)).unwrap();
        assert_eq!(dict.get(&key), Some(&Value::str("two")));
    }

    #[test]
    fn lists_are_not_hashable() {
        assert!(DictKey::from_value(&Value::list(vec![])).is_err());
    }

    #[test]
    fn display_follows_script_conventions() {
        let nested = Value::list(vec![Value::Int(1), Value::str("a"), Value::Float(2.0)]);

        assert_eq!(nested.to_string(), "[1, 'a', 2.0]");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
    }

    #[test]
    fn self_containing_containers_render_a_placeholder() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.to_string(), "[1, [...]]");

        let dict = Value::dict(Dict::new());
        if let Value::Dict(d) = &dict {
            d.borrow_mut().insert(DictKey::Str(Rc::from("me")), dict.clone());
        }
        assert_eq!(dict.to_string(), "{'me': {...}}");
    }

    #[test]
    fn ranges_count_in_both_directions() {
        let up = RangeValue { start: 0, stop: 5, step: 2 };
        let down = RangeValue { start: 5, stop: 0, step: -2 };

        assert_eq!(up.iter().collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(down.iter().collect::<Vec<_>>(), vec![5, 3, 1]);
        assert!(RangeValue { start: 3, stop: 3, step: 1 }.is_empty());
    }

    #[test]
    fn booleans_behave_as_zero_and_one() {
        assert!(values_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(values_equal(&Value::Bool(false), &Value::Float(0.0)));
        assert_eq!(
            DictKey::from_value(&Value::Bool(true)),
            DictKey::from_value(&Value::Int(1))
        );
        assert_eq!(
            compare_values(&Value::Bool(true), &Value::Int(2)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn mixed_numbers_compare_by_value() {
        assert!(values_equal(&Value::Int(3), &Value::Float(3.0)));
        assert_eq!(
            compare_values(&Value::Int(2), &Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::Int(2), &Value::str("a")), None);
    }
}
