//! Dense `f64` tensors of rank one or two.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::backend::{ArithOp, Backend};
use crate::host::{exact_args, no_kwargs};
use crate::value::{format_float, HostObject, Kwargs, Value};

struct TensorData {
    /// `[n]` or `[rows, cols]`.
    shape: Vec<usize>,
    data: RefCell<Vec<f64>>,
}

/// Shared handle to tensor storage.  Cloning aliases the same elements.
#[derive(Clone)]
pub struct Tensor {
    inner: Rc<TensorData>,
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, String> {
        if shape.is_empty() || shape.len() > 2 {
            return Err(format!("tensors must have rank 1 or 2, got rank {}", shape.len()));
        }

        let expected: usize = shape.iter().product();

        if expected != data.len() {
            return Err(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            ));
        }

        Ok(Self {
            inner: Rc::new(TensorData {
                shape,
                data: RefCell::new(data),
            }),
        })
    }

    pub fn vector(data: Vec<f64>) -> Self {
        let len: usize = data.len();

        Self {
            inner: Rc::new(TensorData {
                shape: vec![len],
                data: RefCell::new(data),
            }),
        }
    }

    pub fn matrix(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, String> {
        Self::new(vec![rows, cols], data)
    }

    /// Build from a (possibly nested) list or tuple of numbers.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        if let Some(t) = Tensor::from_host(value) {
            return Ok(t.deep_copy());
        }

        let rows: Vec<Value> = sequence(value)
            .ok_or_else(|| format!("cannot build a tensor from '{}'", value.type_name()))?;

        let nested: bool = rows.first().is_some_and(|r| sequence(r).is_some());

        if !nested {
            let data: Vec<f64> = rows
                .iter()
                .map(|v| {
                    v.as_f64()
                        .ok_or_else(|| format!("tensor elements must be numbers, got '{}'", v.type_name()))
                })
                .collect::<Result<_, _>>()?;

            return Ok(Tensor::vector(data));
        }

        let mut data: Vec<f64> = Vec::new();
        let mut cols: Option<usize> = None;

        for row in &rows {
            let items: Vec<Value> =
                sequence(row).ok_or_else(|| "tensor rows must all be lists".to_owned())?;

            match cols {
                Some(c) if c != items.len() => {
                    return Err(format!(
                        "tensor rows must have equal length, expected {} got {}",
                        c,
                        items.len()
                    ))
                }
                _ => cols = Some(items.len()),
            }

            for item in &items {
                data.push(item.as_f64().ok_or_else(|| {
                    format!("tensor elements must be numbers, got '{}'", item.type_name())
                })?);
            }
        }

        Tensor::matrix(rows.len(), cols.unwrap_or(0), data)
    }

    pub fn from_host(value: &Value) -> Option<Tensor> {
        match value {
            Value::Host(h) => h.as_any().downcast_ref::<Tensor>().cloned(),
            _ => None,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.inner.shape
    }

    pub fn rank(&self) -> usize {
        self.inner.shape.len()
    }

    /// `(rows, cols)` with a rank-1 tensor viewed as a single row.
    pub fn dims(&self) -> (usize, usize) {
        match self.inner.shape.as_slice() {
            [n] => (1, *n),
            [r, c] => (*r, *c),
            _ => (0, 0),
        }
    }

    /// Length of the first dimension.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.inner.shape[0]
    }

    pub fn data(&self) -> Vec<f64> {
        self.inner.data.borrow().clone()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (_, cols) = self.dims();

        self.inner.data.borrow()[row * cols + col]
    }

    pub fn deep_copy(&self) -> Tensor {
        Tensor {
            inner: Rc::new(TensorData {
                shape: self.inner.shape.clone(),
                data: RefCell::new(self.data()),
            }),
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        let data: Vec<f64> = self.inner.data.borrow().iter().map(|x| f(*x)).collect();

        Tensor {
            inner: Rc::new(TensorData {
                shape: self.inner.shape.clone(),
                data: RefCell::new(data),
            }),
        }
    }

    pub fn sum(&self) -> f64 {
        self.inner.data.borrow().iter().sum()
    }

    pub fn transpose(&self) -> Tensor {
        if self.rank() == 1 {
            return self.deep_copy();
        }

        let (rows, cols) = self.dims();
        let src = self.inner.data.borrow();
        let mut data: Vec<f64> = Vec::with_capacity(rows * cols);

        for c in 0..cols {
            for r in 0..rows {
                data.push(src[r * cols + c]);
            }
        }

        Tensor {
            inner: Rc::new(TensorData {
                shape: vec![cols, rows],
                data: RefCell::new(data),
            }),
        }
    }

    pub fn flatten(&self) -> Tensor {
        Tensor::vector(self.data())
    }

    /// Matrix product.  A rank-1 left operand is a row vector, a rank-1
    /// right operand a column vector; the result drops the dimension that
    /// came from a vector.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor, String> {
        let (r, k) = self.dims();
        let (k2, c) = match other.inner.shape.as_slice() {
            [n] => (*n, 1),
            [a, b] => (*a, *b),
            _ => (0, 0),
        };

        if k != k2 {
            return Err(format!(
                "matmul shape mismatch: {:?} and {:?}",
                self.shape(),
                other.shape()
            ));
        }

        let a = self.inner.data.borrow();
        let b = other.inner.data.borrow();
        let mut out: Vec<f64> = vec![0.0; r * c];

        for i in 0..r {
            for j in 0..c {
                out[i * c + j] = (0..k).map(|p| a[i * k + p] * b[p * c + j]).sum();
            }
        }

        if self.rank() == 1 || other.rank() == 1 {
            Ok(Tensor::vector(out))
        } else {
            Tensor::matrix(r, c, out)
        }
    }

    /// Elementwise `self op other` with row broadcasting: a tensor whose
    /// shape is `[cols]` or `[1, cols]` is repeated over every row.
    pub fn zip_with(&self, other: &Tensor, op: ArithOp) -> Result<Tensor, String> {
        let (lr, lc) = self.dims();
        let (rr, rc) = other.dims();

        if lc != rc || (lr != rr && lr != 1 && rr != 1) {
            return Err(format!(
                "cannot broadcast shapes {:?} and {:?}",
                self.shape(),
                other.shape()
            ));
        }

        let rows: usize = lr.max(rr);
        let a = self.inner.data.borrow();
        let b = other.inner.data.borrow();
        let mut out: Vec<f64> = Vec::with_capacity(rows * lc);

        for i in 0..rows {
            let ai: usize = if lr == 1 { 0 } else { i };
            let bi: usize = if rr == 1 { 0 } else { i };

            for j in 0..lc {
                out.push(op.apply_f64(a[ai * lc + j], b[bi * lc + j]));
            }
        }

        let shape: Vec<usize> = if self.rank() == 1 && other.rank() == 1 {
            vec![lc]
        } else {
            vec![rows, lc]
        };

        Tensor::new(shape, out)
    }

    fn scalar_op(&self, op: ArithOp, scalar: f64, reflected: bool) -> Tensor {
        if reflected {
            self.map(|x| op.apply_f64(scalar, x))
        } else {
            self.map(|x| op.apply_f64(x, scalar))
        }
    }

    pub fn to_value(&self) -> Value {
        Value::host(self.clone())
    }

    pub fn to_list(&self) -> Value {
        let data = self.inner.data.borrow();

        match self.inner.shape.as_slice() {
            [r, c] => Value::list(
                (0..*r)
                    .map(|i| {
                        Value::list(data[i * c..(i + 1) * c].iter().map(|x| Value::Float(*x)).collect())
                    })
                    .collect(),
            ),
            _ => Value::list(data.iter().map(|x| Value::Float(*x)).collect()),
        }
    }

    fn row(&self, row: usize) -> Tensor {
        let (_, cols) = self.dims();
        let data = self.inner.data.borrow();

        Tensor::vector(data[row * cols..(row + 1) * cols].to_vec())
    }

    fn offset(&self, index: &Value) -> Result<Offset, String> {
        match (self.inner.shape.as_slice(), index) {
            ([n], _) => Ok(Offset::Element(normalize(index, *n)?)),
            ([rows, _], Value::Int(_) | Value::Bool(_)) => Ok(Offset::Row(normalize(index, *rows)?)),
            ([rows, cols], Value::Tuple(parts)) if parts.len() == 2 => {
                let r: usize = normalize(&parts[0], *rows)?;
                let c: usize = normalize(&parts[1], *cols)?;

                Ok(Offset::Element(r * cols + c))
            }
            _ => Err(format!(
                "invalid tensor index {} for shape {:?}",
                index.repr(),
                self.shape()
            )),
        }
    }
}

enum Offset {
    Element(usize),
    Row(usize),
}

fn normalize(index: &Value, len: usize) -> Result<usize, String> {
    let i: i64 = index
        .as_int()
        .ok_or_else(|| format!("tensor indices must be integers, not '{}'", index.type_name()))?;
    let pos: i64 = if i < 0 { i + len as i64 } else { i };

    if pos < 0 || pos >= len as i64 {
        return Err(format!("tensor index {} out of range", i));
    }

    Ok(pos as usize)
}

fn sequence(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::List(items) => Some(items.borrow().clone()),
        Value::Tuple(items) => Some(items.to_vec()),
        _ => None,
    }
}

fn format_row(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|x| format_float(*x)).collect();

    format!("[{}]", parts.join(", "))
}

impl HostObject for Tensor {
    fn type_name(&self) -> &str {
        "Tensor"
    }

    fn describe(&self) -> String {
        let data = self.inner.data.borrow();

        match self.inner.shape.as_slice() {
            [r, c] => {
                let rows: Vec<String> = (0..*r)
                    .map(|i| format_row(&data[i * c..(i + 1) * c]))
                    .collect();

                format!("tensor([{}])", rows.join(", "))
            }
            _ => format!("tensor({})", format_row(&data)),
        }
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        let this: Tensor = self.clone();

        match name {
            "shape" => Some(Value::tuple(
                self.shape().iter().map(|d| Value::Int(*d as i64)).collect(),
            )),
            "T" => Some(self.transpose().to_value()),
            "transpose" => Some(Value::native("transpose", move |_, args, kwargs| {
                no_kwargs("transpose", &kwargs)?;
                exact_args("transpose", &args, 0)?;

                Ok(this.transpose().to_value())
            })),
            "sum" => Some(Value::native("sum", move |_, args, kwargs| {
                no_kwargs("sum", &kwargs)?;
                exact_args("sum", &args, 0)?;

                Ok(Value::Float(this.sum()))
            })),
            "tolist" => Some(Value::native("tolist", move |_, args, kwargs| {
                no_kwargs("tolist", &kwargs)?;
                exact_args("tolist", &args, 0)?;

                Ok(this.to_list())
            })),
            _ => None,
        }
    }

    fn get_index(&self, index: &Value) -> Result<Value, String> {
        match self.offset(index)? {
            Offset::Element(i) => Ok(Value::Float(self.inner.data.borrow()[i])),
            Offset::Row(r) => Ok(self.row(r).to_value()),
        }
    }

    fn set_index(&self, index: &Value, value: Value) -> Result<(), String> {
        match self.offset(index)? {
            Offset::Element(i) => {
                let x: f64 = value.as_f64().ok_or_else(|| {
                    format!("tensor elements must be numbers, got '{}'", value.type_name())
                })?;

                self.inner.data.borrow_mut()[i] = x;

                Ok(())
            }
            Offset::Row(r) => {
                let (_, cols) = self.dims();
                let source: Tensor = Tensor::from_value(&value)?;

                if source.shape() != [cols] {
                    return Err(format!(
                        "cannot assign shape {:?} to a tensor row of length {}",
                        source.shape(),
                        cols
                    ));
                }

                let row: Vec<f64> = source.data();
                self.inner.data.borrow_mut()[r * cols..(r + 1) * cols].copy_from_slice(&row);

                Ok(())
            }
        }
    }

    fn binary_op(&self, op: ArithOp, other: &Value, reflected: bool) -> Result<Value, String> {
        if let Some(rhs) = Tensor::from_host(other) {
            let result: Tensor = if reflected {
                rhs.zip_with(self, op)?
            } else {
                self.zip_with(&rhs, op)?
            };

            return Ok(result.to_value());
        }

        match other.as_f64() {
            Some(scalar) => Ok(self.scalar_op(op, scalar, reflected).to_value()),
            None => Err(format!(
                "unsupported operand type(s) for {}: 'Tensor' and '{}'",
                op,
                other.type_name()
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `tensor(data)` builtin.
pub fn construct(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    no_kwargs("tensor", &kwargs)?;
    exact_args("tensor", &args, 1)?;

    Ok(Tensor::from_value(&args[0])?.to_value())
}

/// `matmul(a, b)` builtin.
pub fn matmul(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    no_kwargs("matmul", &kwargs)?;
    exact_args("matmul", &args, 2)?;

    let a: Tensor = Tensor::from_value(&args[0])?;
    let b: Tensor = Tensor::from_value(&args[1])?;

    Ok(a.matmul(&b)?.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rows: &[&[f64]]) -> Tensor {
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();

        Tensor::matrix(rows.len(), rows[0].len(), data).unwrap()
    }

    #[test]
    fn matmul_multiplies_matrices() {
        let a = t(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = t(&[&[5.0], &[6.0]]);

        let c = a.matmul(&b).unwrap();

        assert_eq!(c.shape(), &[2, 1]);
        assert_eq!(c.data(), vec![17.0, 39.0]);
    }

    #[test]
    fn rows_broadcast_over_matrices() {
        let a = t(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let bias = Tensor::vector(vec![10.0, 20.0]);

        let sum = a.zip_with(&bias, ArithOp::Add).unwrap();

        assert_eq!(sum.data(), vec![11.0, 22.0, 13.0, 24.0]);
        assert!(a.zip_with(&Tensor::vector(vec![1.0]), ArithOp::Add).is_err());
    }

    #[test]
    fn reflected_scalar_ops_keep_operand_order() {
        let v = Tensor::vector(vec![1.0, 2.0]);

        let out = v.binary_op(ArithOp::Sub, &Value::Int(10), true).unwrap();

        assert_eq!(Tensor::from_host(&out).unwrap().data(), vec![9.0, 8.0]);
    }

    #[test]
    fn indexing_supports_rows_and_pairs() {
        let m = t(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let pair = Value::tuple(vec![Value::Int(1), Value::Int(-1)]);

        assert_eq!(m.get_index(&pair).unwrap(), Value::Float(4.0));
        m.set_index(&pair, Value::Int(9)).unwrap();
        assert_eq!(m.get(1, 1), 9.0);
        assert!(m.get_index(&Value::Int(2)).is_err());
    }

    #[test]
    fn describe_renders_nested_rows() {
        assert_eq!(t(&[&[1.0, 2.5]]).describe(), "tensor([[1.0, 2.5]])");
        assert_eq!(Tensor::vector(vec![3.0]).describe(), "tensor([3.0])");
    }
}
