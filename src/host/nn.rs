//! Layers, losses, optimizers and the bundled model produced by `network`
//! blocks.
//!
//! Every object is a cheap `Rc` handle so attribute lookups can hand out
//! native closures that capture their receiver.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::backend::{ArithOp, Backend};
use crate::host::tensor::Tensor;
use crate::host::{bind_native, exact_args, integer, no_kwargs, number, required};
use crate::value::{HostObject, Kwargs, Value};

// ───────────────────────────── layers ─────────────────────────────

enum LayerKind {
    Dense {
        weights: Tensor,
        bias: Tensor,
    },
    ReLU,
    Sigmoid,
    Flatten,
    Sequential(RefCell<Vec<Layer>>),
}

#[derive(Clone)]
pub struct Layer {
    kind: Rc<LayerKind>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Uniform values in `[-1/sqrt(inputs), 1/sqrt(inputs)]` from a xorshift
/// stream seeded by the layer shape, so runs are reproducible.
fn init_weights(inputs: usize, outputs: usize) -> Vec<f64> {
    let scale: f64 = 1.0 / (inputs.max(1) as f64).sqrt();
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15 ^ (((inputs as u64) << 32) | outputs as u64);

    if state == 0 {
        state = 1;
    }

    (0..inputs * outputs)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            let unit: f64 = (state >> 11) as f64 / (1u64 << 53) as f64;

            (unit * 2.0 - 1.0) * scale
        })
        .collect()
}

impl Layer {
    fn wrap(kind: LayerKind) -> Self {
        Self {
            kind: Rc::new(kind),
        }
    }

    pub fn dense(inputs: usize, outputs: usize) -> Result<Self, String> {
        debug!("Building Dense({}, {})", inputs, outputs);

        Ok(Self::wrap(LayerKind::Dense {
            weights: Tensor::matrix(inputs, outputs, init_weights(inputs, outputs))?,
            bias: Tensor::vector(vec![0.0; outputs]),
        }))
    }

    pub fn relu() -> Self {
        Self::wrap(LayerKind::ReLU)
    }

    pub fn sigmoid() -> Self {
        Self::wrap(LayerKind::Sigmoid)
    }

    pub fn flatten() -> Self {
        Self::wrap(LayerKind::Flatten)
    }

    pub fn sequential(layers: Vec<Layer>) -> Self {
        Self::wrap(LayerKind::Sequential(RefCell::new(layers)))
    }

    pub fn from_host(value: &Value) -> Option<Layer> {
        match value {
            Value::Host(h) => h.as_any().downcast_ref::<Layer>().cloned(),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::host(self.clone())
    }

    pub fn add_module(&self, layer: Layer) -> Result<(), String> {
        match &*self.kind {
            LayerKind::Sequential(layers) => {
                if Rc::ptr_eq(&self.kind, &layer.kind) {
                    return Err("cannot add a Sequential to itself".to_owned());
                }

                layers.borrow_mut().push(layer);

                Ok(())
            }
            _ => Err(format!("'{}' object has no attribute 'add_module'", self.type_name())),
        }
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor, String> {
        match &*self.kind {
            LayerKind::Dense { weights, bias } => {
                let (inputs, _) = weights.dims();
                let (_, features) = input.dims();

                if features != inputs {
                    return Err(format!(
                        "Dense expected {} input features, got {}",
                        inputs, features
                    ));
                }

                input
                    .matmul(weights)?
                    .zip_with(bias, ArithOp::Add)
            }
            LayerKind::ReLU => Ok(input.map(|x| x.max(0.0))),
            LayerKind::Sigmoid => Ok(input.map(|x| 1.0 / (1.0 + (-x).exp()))),
            LayerKind::Flatten => Ok(input.flatten()),
            LayerKind::Sequential(layers) => {
                let layers: Vec<Layer> = layers.borrow().clone();

                layers
                    .iter()
                    .try_fold(input.clone(), |current, layer| layer.forward(&current))
            }
        }
    }

    pub fn parameters(&self) -> Vec<Tensor> {
        match &*self.kind {
            LayerKind::Dense { weights, bias } => vec![weights.clone(), bias.clone()],
            LayerKind::Sequential(layers) => layers
                .borrow()
                .iter()
                .flat_map(|layer| layer.parameters())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn parameters_value(&self) -> Value {
        Value::list(self.parameters().iter().map(Tensor::to_value).collect())
    }
}

fn tensor_arg(name: &str, value: &Value) -> Result<Tensor, String> {
    Tensor::from_host(value)
        .map(Ok)
        .unwrap_or_else(|| Tensor::from_value(value))
        .map_err(|e| format!("{}(): {}", name, e))
}

impl HostObject for Layer {
    fn type_name(&self) -> &str {
        match &*self.kind {
            LayerKind::Dense { .. } => "Dense",
            LayerKind::ReLU => "ReLU",
            LayerKind::Sigmoid => "Sigmoid",
            LayerKind::Flatten => "Flatten",
            LayerKind::Sequential(_) => "Sequential",
        }
    }

    fn describe(&self) -> String {
        match &*self.kind {
            LayerKind::Dense { weights, .. } => {
                let (inputs, outputs) = weights.dims();

                format!("Dense(in_features={}, out_features={})", inputs, outputs)
            }
            LayerKind::Sequential(layers) => {
                let inner: Vec<String> = layers.borrow().iter().map(Layer::describe).collect();

                format!("Sequential({})", inner.join(", "))
            }
            _ => format!("{}()", self.type_name()),
        }
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        let this: Layer = self.clone();

        match (&*self.kind, name) {
            (_, "forward") => Some(Value::native("forward", move |_, args, kwargs| {
                no_kwargs("forward", &kwargs)?;
                exact_args("forward", &args, 1)?;

                Ok(this.forward(&tensor_arg("forward", &args[0])?)?.to_value())
            })),
            (_, "parameters") => Some(Value::native("parameters", move |_, args, kwargs| {
                no_kwargs("parameters", &kwargs)?;
                exact_args("parameters", &args, 0)?;

                Ok(this.parameters_value())
            })),
            (LayerKind::Dense { weights, .. }, "weights") => Some(weights.to_value()),
            (LayerKind::Dense { bias, .. }, "bias") => Some(bias.to_value()),
            (LayerKind::Dense { weights, .. }, "in_features") => {
                Some(Value::Int(weights.dims().0 as i64))
            }
            (LayerKind::Dense { weights, .. }, "out_features") => {
                Some(Value::Int(weights.dims().1 as i64))
            }
            (LayerKind::Sequential(layers), "layers") => Some(Value::list(
                layers.borrow().iter().map(Layer::to_value).collect(),
            )),
            (LayerKind::Sequential(_), "add_module") => {
                Some(Value::native("add_module", move |_, args, kwargs| {
                    no_kwargs("add_module", &kwargs)?;
                    exact_args("add_module", &args, 1)?;

                    let layer: Layer = Layer::from_host(&args[0]).ok_or_else(|| {
                        format!("add_module() expected a layer, got '{}'", args[0].type_name())
                    })?;

                    this.add_module(layer)?;

                    Ok(Value::None)
                }))
            }
            _ => None,
        }
    }

    fn call(&self, _: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
        no_kwargs(self.type_name(), &kwargs)?;
        exact_args(self.type_name(), &args, 1)?;

        Ok(self.forward(&tensor_arg(self.type_name(), &args[0])?)?.to_value())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ───────────────────────────── losses ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    MeanSquared,
    CrossEntropy,
}

#[derive(Debug, Clone)]
pub struct Loss {
    kind: LossKind,
}

impl Loss {
    pub fn new(kind: LossKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> LossKind {
        self.kind
    }

    pub fn compute(&self, predictions: &Tensor, targets: &Tensor) -> Result<f64, String> {
        match self.kind {
            LossKind::MeanSquared => {
                let diff: Tensor = predictions.zip_with(targets, ArithOp::Sub)?;
                let squared: Vec<f64> = diff.data().iter().map(|d| d * d).collect();

                Ok(squared.iter().sum::<f64>() / squared.len().max(1) as f64)
            }
            LossKind::CrossEntropy => {
                if predictions.dims() != targets.dims() {
                    return Err(format!(
                        "CrossEntropyLoss shape mismatch: {:?} and {:?}",
                        predictions.shape(),
                        targets.shape()
                    ));
                }

                let (rows, cols) = predictions.dims();
                let (p, t) = (predictions.data(), targets.data());
                let mut total: f64 = 0.0;

                for r in 0..rows {
                    let row: &[f64] = &p[r * cols..(r + 1) * cols];
                    let max: f64 = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let log_sum: f64 = row.iter().map(|x| (x - max).exp()).sum::<f64>().ln() + max;

                    for c in 0..cols {
                        total -= t[r * cols + c] * (row[c] - log_sum);
                    }
                }

                Ok(total)
            }
        }
    }
}

impl HostObject for Loss {
    fn type_name(&self) -> &str {
        match self.kind {
            LossKind::MeanSquared => "MSELoss",
            LossKind::CrossEntropy => "CrossEntropyLoss",
        }
    }

    fn describe(&self) -> String {
        format!("{}()", self.type_name())
    }

    fn call(&self, _: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
        let name: &str = self.type_name();
        no_kwargs(name, &kwargs)?;
        exact_args(name, &args, 2)?;

        let predictions: Tensor = tensor_arg(name, &args[0])?;
        let targets: Tensor = tensor_arg(name, &args[1])?;

        Ok(Value::Float(self.compute(&predictions, &targets)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ───────────────────────────── optimizers ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptimizerKind {
    Sgd,
    Adam { beta1: f64, beta2: f64 },
}

#[derive(Debug, Clone)]
pub struct Optimizer {
    kind: OptimizerKind,
    lr: f64,
    params: Vec<Tensor>,
}

impl Optimizer {
    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn params(&self) -> &[Tensor] {
        &self.params
    }
}

fn tensor_list(name: &str, value: &Value) -> Result<Vec<Tensor>, String> {
    let items: Vec<Value> = match value {
        Value::List(items) => items.borrow().clone(),
        Value::Tuple(items) => items.to_vec(),
        other => {
            if let Some(layer) = Layer::from_host(other) {
                return Ok(layer.parameters());
            }

            return Err(format!(
                "{}() expected a list of parameters, got '{}'",
                name,
                other.type_name()
            ));
        }
    };

    items
        .iter()
        .map(|item| {
            Tensor::from_host(item).ok_or_else(|| {
                format!("{}() parameters must be tensors, got '{}'", name, item.type_name())
            })
        })
        .collect()
}

impl HostObject for Optimizer {
    fn type_name(&self) -> &str {
        match self.kind {
            OptimizerKind::Sgd => "SGD",
            OptimizerKind::Adam { .. } => "Adam",
        }
    }

    fn describe(&self) -> String {
        match self.kind {
            OptimizerKind::Sgd => format!("SGD(lr={})", self.lr),
            OptimizerKind::Adam { beta1, beta2 } => {
                format!("Adam(lr={}, beta1={}, beta2={})", self.lr, beta1, beta2)
            }
        }
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        match (self.kind, name) {
            (_, "lr") => Some(Value::Float(self.lr)),
            (_, "params") => Some(Value::list(
                self.params.iter().map(Tensor::to_value).collect(),
            )),
            (OptimizerKind::Adam { beta1, .. }, "beta1") => Some(Value::Float(beta1)),
            (OptimizerKind::Adam { beta2, .. }, "beta2") => Some(Value::Float(beta2)),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ───────────────────────────── assembled model ─────────────────────────────

/// Architecture, optimizer and loss bundled by a `network` block.
#[derive(Debug, Clone)]
pub struct AssembledModel {
    inner: Rc<ModelParts>,
}

#[derive(Debug)]
struct ModelParts {
    architecture: Layer,
    optimizer: Value,
    loss: Value,
}

impl AssembledModel {
    pub fn new(architecture: Layer, optimizer: Value, loss: Value) -> Self {
        Self {
            inner: Rc::new(ModelParts {
                architecture,
                optimizer,
                loss,
            }),
        }
    }

    pub fn architecture(&self) -> &Layer {
        &self.inner.architecture
    }
}

impl HostObject for AssembledModel {
    fn type_name(&self) -> &str {
        "AssembledModel"
    }

    fn describe(&self) -> String {
        format!(
            "AssembledModel(architecture={}, optimizer={}, loss={})",
            self.inner.architecture.describe(),
            self.inner.optimizer,
            self.inner.loss
        )
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        let this: AssembledModel = self.clone();

        match name {
            "architecture" => Some(self.inner.architecture.to_value()),
            "optimizer" => Some(self.inner.optimizer.clone()),
            "loss" => Some(self.inner.loss.clone()),
            "predict" => Some(Value::native("predict", move |_, args, kwargs| {
                no_kwargs("predict", &kwargs)?;
                exact_args("predict", &args, 1)?;

                let input: Tensor = tensor_arg("predict", &args[0])?;

                Ok(this.architecture().forward(&input)?.to_value())
            })),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ───────────────────────────── constructors ─────────────────────────────

fn size(name: &str, value: &Value) -> Result<usize, String> {
    let n: i64 = integer(name, value)?;

    usize::try_from(n).map_err(|_| format!("{}() sizes must be non-negative, got {}", name, n))
}

pub fn dense(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    let mut slots = bind_native("Dense", &["in_features", "out_features"], args, kwargs)?.into_iter();
    let inputs: Value = required("Dense", "in_features", slots.next().flatten())?;
    let outputs: Value = required("Dense", "out_features", slots.next().flatten())?;

    Ok(Layer::dense(size("Dense", &inputs)?, size("Dense", &outputs)?)?.to_value())
}

fn nullary(name: &str, args: &[Value], kwargs: &Kwargs) -> Result<(), String> {
    no_kwargs(name, kwargs)?;
    exact_args(name, args, 0)
}

pub fn relu(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    nullary("ReLU", &args, &kwargs)?;

    Ok(Layer::relu().to_value())
}

pub fn sigmoid(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    nullary("Sigmoid", &args, &kwargs)?;

    Ok(Layer::sigmoid().to_value())
}

pub fn flatten(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    nullary("Flatten", &args, &kwargs)?;

    Ok(Layer::flatten().to_value())
}

pub fn sequential(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    let mut slots = bind_native("Sequential", &["layers"], args, kwargs)?.into_iter();

    let layers: Vec<Layer> = match slots.next().flatten() {
        None => Vec::new(),
        Some(Value::List(items)) => items
            .borrow()
            .iter()
            .map(|item| {
                Layer::from_host(item).ok_or_else(|| {
                    format!("Sequential() expected layers, got '{}'", item.type_name())
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(format!(
                "Sequential() expected a list of layers, got '{}'",
                other.type_name()
            ))
        }
    };

    Ok(Layer::sequential(layers).to_value())
}

pub fn mse_loss(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    nullary("MSELoss", &args, &kwargs)?;

    Ok(Value::host(Loss::new(LossKind::MeanSquared)))
}

pub fn cross_entropy_loss(
    _: &mut dyn Backend,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<Value, String> {
    nullary("CrossEntropyLoss", &args, &kwargs)?;

    Ok(Value::host(Loss::new(LossKind::CrossEntropy)))
}

fn rate(name: &str, param: &str, slot: Option<Value>, default: f64) -> Result<f64, String> {
    match slot {
        Some(value) => number(name, &value).map_err(|_| {
            format!("{}() argument '{}' must be a number, got '{}'", name, param, value.type_name())
        }),
        None => Ok(default),
    }
}

pub fn sgd(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    let mut slots = bind_native("SGD", &["params", "lr"], args, kwargs)?.into_iter();
    let params: Value = required("SGD", "params", slots.next().flatten())?;

    Ok(Value::host(Optimizer {
        kind: OptimizerKind::Sgd,
        params: tensor_list("SGD", &params)?,
        lr: rate("SGD", "lr", slots.next().flatten(), 0.01)?,
    }))
}

pub fn adam(_: &mut dyn Backend, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, String> {
    let mut slots =
        bind_native("Adam", &["params", "lr", "beta1", "beta2"], args, kwargs)?.into_iter();
    let params: Value = required("Adam", "params", slots.next().flatten())?;
    let lr: f64 = rate("Adam", "lr", slots.next().flatten(), 0.001)?;
    let beta1: f64 = rate("Adam", "beta1", slots.next().flatten(), 0.9)?;
    let beta2: f64 = rate("Adam", "beta2", slots.next().flatten(), 0.999)?;

    Ok(Value::host(Optimizer {
        kind: OptimizerKind::Adam { beta1, beta2 },
        params: tensor_list("Adam", &params)?,
        lr,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StandardBackend;

    #[test]
    fn dense_initialisation_is_reproducible() {
        let a = Layer::dense(3, 2).unwrap();
        let b = Layer::dense(3, 2).unwrap();

        assert_eq!(a.parameters()[0].data(), b.parameters()[0].data());
        assert!(a.parameters()[0].data().iter().all(|w| w.abs() <= 1.0 / 3f64.sqrt()));
    }

    #[test]
    fn sequential_chains_layers_and_collects_parameters() {
        let model = Layer::sequential(vec![
            Layer::dense(2, 3).unwrap(),
            Layer::relu(),
            Layer::dense(3, 1).unwrap(),
        ]);

        let out = model.forward(&Tensor::vector(vec![1.0, -1.0])).unwrap();

        assert_eq!(out.shape(), &[1]);
        assert_eq!(model.parameters().len(), 4);
    }

    #[test]
    fn dense_rejects_wrong_feature_count() {
        let layer = Layer::dense(2, 2).unwrap();

        let err = layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0])).unwrap_err();

        assert_eq!(err, "Dense expected 2 input features, got 3");
    }

    #[test]
    fn mse_is_the_mean_of_squared_errors() {
        let loss = Loss::new(LossKind::MeanSquared);
        let pred = Tensor::vector(vec![1.0, 2.0]);
        let target = Tensor::vector(vec![0.0, 4.0]);

        assert_eq!(loss.compute(&pred, &target), Ok(2.5));
    }

    #[test]
    fn optimizers_apply_defaults_and_keywords() {
        let mut backend = StandardBackend::new();
        let params = Value::list(vec![Tensor::vector(vec![0.0]).to_value()]);

        let sgd = sgd(&mut backend, vec![params.clone()], vec![]).unwrap();
        let adam = adam(
            &mut backend,
            vec![params],
            vec![("lr".to_owned(), Value::Float(0.5))],
        )
        .unwrap();

        let Value::Host(sgd) = sgd else { panic!("expected host object") };
        let Value::Host(adam) = adam else { panic!("expected host object") };

        assert_eq!(sgd.get_attr("lr"), Some(Value::Float(0.01)));
        assert_eq!(adam.get_attr("lr"), Some(Value::Float(0.5)));
        assert_eq!(adam.get_attr("beta2"), Some(Value::Float(0.999)));
    }
}
