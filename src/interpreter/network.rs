//! Evaluation of `network { ... }` blocks.
//!
//! The block only orchestrates host constructors: every layer, optimizer
//! and loss is built by calling whatever its callee resolves to, and the
//! result is bundled into an [`AssembledModel`].

use log::{debug, info};

use crate::ast::{Expr, NetworkDef};
use crate::error::MlError;
use crate::host::nn::{AssembledModel, Layer};
use crate::interpreter::{Flow, Interpreter};
use crate::value::{Kwargs, Value};

/// Borrowed view of a call expression.
struct CallParts<'a> {
    callee: &'a Expr,
    args: &'a [Expr],
    kwargs: &'a [(String, Expr)],
    line: usize,
}

fn as_call<'a>(expr: &'a Expr, what: &str) -> Result<CallParts<'a>, MlError> {
    match expr {
        Expr::Call {
            callee,
            args,
            kwargs,
            line,
        } => Ok(CallParts {
            callee: &**callee,
            args: args.as_slice(),
            kwargs: kwargs.as_slice(),
            line: *line,
        }),
        other => Err(MlError::runtime(other.line(), what)),
    }
}

fn is_dense(value: &Value) -> bool {
    matches!(value, Value::Native(native) if native.name() == "Dense")
}

impl Interpreter {
    pub(super) fn build_network(&mut self, def: &NetworkDef) -> Flow<Value> {
        info!("Building network defined on line {}", def.line);

        // A shape such as (28, 28, 64) feeds its last dimension forward.
        let mut current: Value = match self.evaluate(&def.input)? {
            Value::Tuple(dims) if !dims.is_empty() => dims[dims.len() - 1].clone(),
            Value::List(dims) if !dims.borrow().is_empty() => {
                let dims = dims.borrow();
                dims[dims.len() - 1].clone()
            }
            other => other,
        };

        let Expr::List { elements, .. } = &def.layers else {
            return Err(MlError::runtime(
                def.layers.line(),
                "The 'layers' attribute in a network block must be a list.",
            )
            .into());
        };

        let mut layers: Vec<Layer> = Vec::with_capacity(elements.len());

        for element in elements {
            let call: CallParts<'_> = as_call(
                element,
                "Elements in the 'layers' list must be layer calls, e.g., Dense(...)",
            )?;

            let constructor: Value = self.evaluate(call.callee)?;
            let mut args: Vec<Value> = self.evaluate_all(call.args)?;
            let kwargs: Kwargs = self.evaluate_kwargs(call.kwargs, call.line)?;

            if is_dense(&constructor) {
                if args.len() != 1 || !kwargs.is_empty() {
                    return Err(MlError::runtime(
                        call.line,
                        format!(
                            "Dense() in a network block expects 1 argument (output_features), got {}.",
                            args.len() + kwargs.len()
                        ),
                    )
                    .into());
                }

                let outputs: Value = args[0].clone();
                args.insert(0, std::mem::replace(&mut current, outputs));
            }

            let built: Value = self.call_value(&constructor, args, kwargs, call.line)?;

            let Some(layer) = Layer::from_host(&built) else {
                return Err(MlError::runtime(
                    call.line,
                    format!(
                        "Network layers must construct layer objects, got '{}'",
                        built.type_name()
                    ),
                )
                .into());
            };

            debug!("Added {} to network", built);

            layers.push(layer);
        }

        let architecture: Layer = Layer::sequential(layers);

        let call: CallParts<'_> = as_call(
            &def.optimizer,
            "The 'optimizer' attribute must be a function call, e.g., Adam(...)",
        )?;
        let constructor: Value = self.evaluate(call.callee)?;
        let mut args: Vec<Value> = self.evaluate_all(call.args)?;
        let kwargs: Kwargs = self.evaluate_kwargs(call.kwargs, call.line)?;

        let params: Value = Value::list(
            architecture
                .parameters()
                .iter()
                .map(|tensor| tensor.to_value())
                .collect(),
        );
        args.insert(0, params);

        let optimizer: Value = self.call_value(&constructor, args, kwargs, call.line)?;

        let call: CallParts<'_> = as_call(
            &def.loss,
            "The 'loss' attribute must be a function call, e.g., CrossEntropyLoss()",
        )?;
        let constructor: Value = self.evaluate(call.callee)?;
        let args: Vec<Value> = self.evaluate_all(call.args)?;
        let kwargs: Kwargs = self.evaluate_kwargs(call.kwargs, call.line)?;

        let loss: Value = self.call_value(&constructor, args, kwargs, call.line)?;

        info!("Network assembled with optimizer {} and loss {}", optimizer, loss);

        Ok(Value::host(AssembledModel::new(architecture, optimizer, loss)))
    }
}
