//! Tree-walking evaluator.
//!
//! One [`Interpreter`] owns every piece of session state: the scope stack,
//! the function table, the class arena, the method-context stack used by
//! `super`, the numeric backend and the output sink.  Non-local exits
//! (`return`, `break`, `continue`, `throw`) travel up the Rust call stack as
//! the `Err` side of [`Flow`], so every construct that owns a scope frame or a
//! `finally` block sees them pass and can clean up.

mod binding;
mod network;
mod ops;

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDef, Expr, FunctionDef, Literal, Stmt};
use crate::backend::{Backend, StandardBackend};
use crate::class::{ClassId, ClassTable};
use crate::environment::Environment;
use crate::error::{MlError, Result};
use crate::host::{builtins, modules};
use crate::parser::parse_source;
use crate::value::{
    BoundMethod, ClassRef, Dict, DictKey, Instance, Kwargs, SliceValue, SuperRef, Value,
};

/// Nesting limit for user-level calls.  Exceeding it is a runtime error,
/// provided the evaluating thread has [`STACK_SIZE`] bytes of stack.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Native stack the evaluating thread needs to reach [`MAX_CALL_DEPTH`].
pub const STACK_SIZE: usize = 512 * 1024 * 1024;

/// Why evaluation stopped before reaching the end of a statement list.
#[derive(Debug)]
pub(crate) enum Unwind {
    /// Returned value and the line of its `return`.
    Return(Value, usize),
    Break(usize),
    Continue(usize),
    /// Thrown value and the line of its `throw`.
    Throw(Value, usize),
    Error(MlError),
}

impl From<MlError> for Unwind {
    fn from(err: MlError) -> Self {
        Unwind::Error(err)
    }
}

pub(crate) type Flow<T> = std::result::Result<T, Unwind>;

fn fail<T>(line: usize, msg: impl Into<String>) -> Flow<T> {
    Err(Unwind::Error(MlError::runtime(line, msg)))
}

/// Receiver of a bound method call: the instance and the class on which the
/// method was found.
type Receiver = (Rc<Instance>, ClassId);

pub struct Interpreter {
    env: Environment,
    functions: HashMap<String, Rc<FunctionDef>>,
    classes: ClassTable,
    method_stack: Vec<Receiver>,
    backend: Box<dyn Backend>,
    out: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::with_backend(Box::new(StandardBackend::new()), out)
    }

    pub fn with_backend(backend: Box<dyn Backend>, out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let mut env: Environment = Environment::new();

        for (name, value) in builtins::globals() {
            debug!("Defining builtin '{}'", name);
            env.define(name, value);
        }

        Self {
            env,
            functions: HashMap::new(),
            classes: ClassTable::new(),
            method_stack: Vec::new(),
            backend,
            out,
            call_depth: 0,
        }
    }

    /// Lex, parse and execute `source`, returning the value of its last
    /// statement.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let statements: Vec<Stmt> = parse_source(source)?;

        self.interpret(&statements)
    }

    /// Execute a parsed program.  Expression statements produce their value;
    /// every other statement produces `None`.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Value> {
        debug!("Interpreting {} statements", statements.len());

        let depth: usize = self.env.depth();
        let mut last: Value = Value::None;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(value) => last = value,
                Err(unwind) => {
                    self.env.restore(depth);
                    self.method_stack.clear();
                    self.call_depth = 0;

                    return Err(self.escape(unwind));
                }
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");

        Ok(last)
    }

    /// Convert a signal that reached the top level into an error.
    fn escape(&mut self, unwind: Unwind) -> MlError {
        // Output printed before the failure must still reach the sink.
        let _ = self.out.flush();

        match unwind {
            Unwind::Error(err) => err,
            Unwind::Return(_, line) => MlError::runtime(line, "'return' outside function"),
            Unwind::Break(line) => MlError::runtime(line, "'break' outside loop"),
            Unwind::Continue(line) => MlError::runtime(line, "'continue' outside loop"),
            Unwind::Throw(value, line) => {
                info!("Uncaught throw on line {}: {}", line, value);

                MlError::Uncaught {
                    value: value.to_string(),
                    line,
                }
            }
        }
    }

    /// Current number of scope frames, the global frame included.
    pub fn scope_depth(&self) -> usize {
        self.env.depth()
    }

    /// Resolve `name` the way a variable reference in the global scope would.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.lookup(name)
    }

    pub fn backend(&self) -> &dyn Backend {
        &*self.backend
    }

    /// Scope stack, then backend-held variables, then the function table.
    fn lookup(&self, name: &str) -> Option<Value> {
        self.env
            .get(name)
            .or_else(|| self.backend.get(name))
            .or_else(|| self.functions.get(name).cloned().map(Value::Function))
    }

    fn push_scope(&mut self) {
        self.env.push();
        self.backend.enter_scope();
    }

    fn pop_scope(&mut self) {
        self.env.pop();
        self.backend.exit_scope();
    }

    // ───────────────────────────── statements ─────────────────────────────

    fn execute_block(&mut self, statements: &[Stmt]) -> Flow<Value> {
        for stmt in statements {
            self.execute(stmt)?;
        }

        Ok(Value::None)
    }

    fn execute(&mut self, stmt: &Stmt) -> Flow<Value> {
        match stmt {
            Stmt::Expression(expr) => self.evaluate(expr),

            Stmt::Print { values, .. } => {
                let mut parts: Vec<String> = Vec::with_capacity(values.len());

                for expr in values {
                    parts.push(self.evaluate(expr)?.to_string());
                }

                let line: String = parts.join(" ");
                writeln!(self.out, "{}", line).map_err(MlError::from)?;

                debug!("Printed: {}", line);

                Ok(Value::None)
            }

            Stmt::Assign { name, value, .. } => {
                let value: Value = self.evaluate(value)?;

                debug!("Assigning {} to '{}'", value.repr(), name);

                // Names only the backend holds are written back to it.
                if !self.env.contains(name) && self.backend.get(name).is_some() {
                    self.backend.set(name, value);
                } else {
                    self.env.assign(name, value);
                }

                Ok(Value::None)
            }

            Stmt::AttributeAssign {
                object,
                name,
                value,
                line,
            } => {
                let target: Value = self.evaluate(object)?;
                let value: Value = self.evaluate(value)?;

                match &target {
                    Value::Instance(instance) => instance.set_field(name, value),
                    Value::Host(host) => host
                        .set_attr(name, value)
                        .map_err(|msg| MlError::runtime(*line, msg))?,
                    other => {
                        return fail(
                            *line,
                            format!(
                                "Cannot assign attribute '{}' to non-instance object '{}'",
                                name, other
                            ),
                        )
                    }
                }

                Ok(Value::None)
            }

            Stmt::IndexAssign {
                object,
                indices,
                value,
                line,
            } => {
                let target: Value = self.evaluate(object)?;
                let index: Value = self.evaluate_indices(indices)?;
                let value: Value = self.evaluate(value)?;

                ops::set_index(&target, &index, value).map_err(|msg| MlError::runtime(*line, msg))?;

                Ok(Value::None)
            }

            Stmt::Block(statements) => self.execute_block(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(branch) = else_branch {
                    self.execute(branch)
                } else {
                    Ok(Value::None)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_block(body) {
                        Ok(_) | Err(Unwind::Continue(_)) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }

                Ok(Value::None)
            }

            Stmt::For {
                variable,
                iterable,
                body,
                line,
            } => self.execute_for(variable, iterable, body, *line),

            Stmt::Function(def) => {
                info!(
                    "Function '{}' defined with {} parameters",
                    def.name,
                    def.params.len()
                );

                self.functions.insert(def.name.clone(), def.clone());

                Ok(Value::None)
            }

            Stmt::Return { value, line } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };

                Err(Unwind::Return(value, *line))
            }

            Stmt::Break { line } => Err(Unwind::Break(*line)),

            Stmt::Continue { line } => Err(Unwind::Continue(*line)),

            Stmt::Class(def) => self.define_class(def),

            Stmt::Throw { value, line } => {
                let value: Value = self.evaluate(value)?;

                debug!("Throwing {} from line {}", value.repr(), line);

                Err(Unwind::Throw(value, *line))
            }

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                // Only thrown values are catchable; runtime errors pass through.
                let outcome: Flow<Value> = match (self.execute_block(body), catch) {
                    (Err(Unwind::Throw(value, _)), Some(clause)) => {
                        debug!("Caught {} as '{}'", value.repr(), clause.variable);

                        self.push_scope();
                        self.env.define(&clause.variable, value);
                        let handled: Flow<Value> = self.execute_block(&clause.body);
                        self.pop_scope();

                        handled
                    }
                    (outcome, _) => outcome,
                };

                if let Some(finally) = finally {
                    // A signal raised by `finally` replaces the pending one.
                    self.execute_block(finally)?;
                }

                outcome.map(|_| Value::None)
            }

            Stmt::With {
                context,
                body,
                line,
            } => self.execute_with(context, body, *line),

            Stmt::Import {
                module,
                alias,
                line,
            } => {
                let value: Value =
                    modules::import(module).map_err(|msg| MlError::runtime(*line, msg))?;

                info!("Imported '{}' as '{}'", module, alias);

                self.env.define(alias, value);

                Ok(Value::None)
            }
        }
    }

    /// One scope frame for the whole loop; the loop variable is rebound in it
    /// on every iteration.
    fn execute_for(
        &mut self,
        variable: &str,
        iterable: &Expr,
        body: &[Stmt],
        line: usize,
    ) -> Flow<Value> {
        let source: Value = self.evaluate(iterable)?;

        // Ranges are walked lazily; other iterables are snapshotted first.
        let items: Box<dyn Iterator<Item = Value>> = match &source {
            Value::Range(range) => Box::new(range.iter().map(Value::Int)),
            other => match builtins::iterable_items(other) {
                Some(items) => Box::new(items.into_iter()),
                None => {
                    return fail(
                        line,
                        format!(
                            "'for' loop can only iterate over a list, string, tuple or range, not '{}'",
                            other.type_name()
                        ),
                    )
                }
            },
        };

        debug!("Entering for loop over {} items", items.size_hint().0);

        self.push_scope();

        let mut outcome: Flow<Value> = Ok(Value::None);

        for item in items {
            self.env.define(variable, item);

            match self.execute_block(body) {
                Ok(_) | Err(Unwind::Continue(_)) => {}
                Err(Unwind::Break(_)) => break,
                Err(other) => {
                    outcome = Err(other);
                    break;
                }
            }
        }

        self.pop_scope();

        outcome
    }

    fn execute_with(&mut self, context: &Expr, body: &[Stmt], line: usize) -> Flow<Value> {
        let manager: Value = self.evaluate(context)?;

        match &manager {
            Value::Host(host) if host.is_context_manager() => {
                host.enter(&mut *self.backend)
                    .map_err(|msg| MlError::runtime(line, msg))?;

                let outcome: Flow<Value> = self.execute_block(body);

                host.exit(&mut *self.backend)
                    .map_err(|msg| MlError::runtime(line, msg))?;

                outcome.map(|_| Value::None)
            }

            Value::Instance(instance) => {
                let class: ClassId = instance.class.id;
                let enter = self.classes.find_method(class, "enter");
                let exit = self.classes.find_method(class, "exit");

                let (Some((enter, enter_at)), Some((exit, exit_at))) = (enter, exit) else {
                    return fail(
                        line,
                        format!(
                            "'{}' object does not support the context manager protocol",
                            instance.class.name
                        ),
                    );
                };

                let receiver: Rc<Instance> = instance.clone();

                self.call_function(&enter, Some((receiver.clone(), enter_at)), vec![], vec![], line)?;

                let outcome: Flow<Value> = self.execute_block(body);

                self.call_function(&exit, Some((receiver, exit_at)), vec![], vec![], line)?;

                outcome.map(|_| Value::None)
            }

            _ => fail(line, "'with' statement requires a context manager."),
        }
    }

    fn define_class(&mut self, def: &ClassDef) -> Flow<Value> {
        let mut parents: Vec<ClassId> = Vec::with_capacity(def.parents.len());

        for parent in &def.parents {
            match self.evaluate(parent)? {
                Value::Class(class) => parents.push(class.id),
                other => {
                    return fail(
                        parent.line(),
                        format!(
                            "'inherits' must be followed by a class name, got '{}'",
                            other.type_name()
                        ),
                    )
                }
            }
        }

        let methods: HashMap<String, Rc<FunctionDef>> = def
            .methods
            .iter()
            .map(|m: &Rc<FunctionDef>| (m.name.clone(), m.clone()))
            .collect();

        let id: ClassId = self
            .classes
            .define(&def.name, parents, methods)
            .map_err(|err| err.at_line(def.line))?;

        let class: Value = Value::Class(ClassRef {
            id,
            name: self.classes.name(id),
        });

        self.env.define(&def.name, class);

        Ok(Value::None)
    }

    // ───────────────────────────── expressions ─────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Flow<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Integer(n) => Value::Int(*n),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::str(s),
                Literal::Bool(b) => Value::Bool(*b),
            }),

            Expr::List { elements, .. } => Ok(Value::list(self.evaluate_all(elements)?)),

            Expr::Tuple { elements, .. } => Ok(Value::tuple(self.evaluate_all(elements)?)),

            Expr::Dict { pairs, line } => {
                let mut dict: Dict = Dict::new();

                for (key, value) in pairs {
                    let key: Value = self.evaluate(key)?;
                    let value: Value = self.evaluate(value)?;
                    let key: DictKey =
                        DictKey::from_value(&key).map_err(|msg| MlError::runtime(*line, msg))?;

                    dict.insert(key, value);
                }

                Ok(Value::dict(dict))
            }

            Expr::Variable { name, line } => match self.lookup(name) {
                Some(value) => Ok(value),
                None => fail(*line, format!("Undefined variable '{}'", name)),
            },

            Expr::Unary { op, operand, line } => {
                let value: Value = self.evaluate(operand)?;

                self.unary(*op, &value)
                    .map_err(|msg| MlError::runtime(*line, msg).into())
            }

            Expr::Binary {
                left,
                op,
                right,
                line,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                self.binary(*op, &left, &right)
                    .map_err(|msg| MlError::runtime(*line, msg).into())
            }

            Expr::Attribute { object, name, line } => {
                let object: Value = self.evaluate(object)?;

                self.get_attribute(&object, name, *line)
            }

            Expr::Index {
                object,
                indices,
                line,
            } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate_indices(indices)?;

                ops::get_index(&object, &index).map_err(|msg| MlError::runtime(*line, msg).into())
            }

            Expr::Slice {
                start,
                stop,
                step,
                line,
            } => {
                let start: Option<i64> = self.slice_bound(start.as_deref(), *line)?;
                let stop: Option<i64> = self.slice_bound(stop.as_deref(), *line)?;
                let step: Option<i64> = self.slice_bound(step.as_deref(), *line)?;

                Ok(Value::Slice(SliceValue { start, stop, step }))
            }

            Expr::Call {
                callee,
                args,
                kwargs,
                line,
            } => self.evaluate_call(callee, args, kwargs, *line),

            Expr::Super { line } => self.evaluate_super(*line),

            Expr::Network(def) => self.build_network(def),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Flow<Vec<Value>> {
        let mut values: Vec<Value> = Vec::with_capacity(exprs.len());

        for expr in exprs {
            values.push(self.evaluate(expr)?);
        }

        Ok(values)
    }

    /// Several index components are packed into a tuple.
    fn evaluate_indices(&mut self, indices: &[Expr]) -> Flow<Value> {
        match indices {
            [single] => self.evaluate(single),
            many => Ok(Value::tuple(self.evaluate_all(many)?)),
        }
    }

    fn slice_bound(&mut self, bound: Option<&Expr>, line: usize) -> Flow<Option<i64>> {
        let Some(expr) = bound else {
            return Ok(None);
        };

        match self.evaluate(expr)? {
            Value::None => Ok(None),
            Value::Int(n) => Ok(Some(n)),
            other => fail(
                line,
                format!(
                    "slice indices must be integers or None, not '{}'",
                    other.type_name()
                ),
            ),
        }
    }

    fn evaluate_kwargs(&mut self, kwargs: &[(String, Expr)], line: usize) -> Flow<Kwargs> {
        let mut values: Kwargs = Vec::with_capacity(kwargs.len());

        for (name, expr) in kwargs {
            if values.iter().any(|(seen, _)| seen == name) {
                return fail(
                    line,
                    format!("Function call got multiple values for argument '{}'", name),
                );
            }

            let value: Value = self.evaluate(expr)?;
            values.push((name.clone(), value));
        }

        Ok(values)
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        kwargs: &[(String, Expr)],
        line: usize,
    ) -> Flow<Value> {
        // A bare name in the function table is called directly.
        if let Expr::Variable { name, .. } = callee {
            if let Some(def) = self.functions.get(name).cloned() {
                let args: Vec<Value> = self.evaluate_all(args)?;
                let kwargs: Kwargs = self.evaluate_kwargs(kwargs, line)?;

                return self.call_function(&def, None, args, kwargs, line);
            }
        }

        let callee: Value = self.evaluate(callee)?;
        let args: Vec<Value> = self.evaluate_all(args)?;
        let kwargs: Kwargs = self.evaluate_kwargs(kwargs, line)?;

        self.call_value(&callee, args, kwargs, line)
    }

    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Kwargs,
        line: usize,
    ) -> Flow<Value> {
        match callee {
            Value::Function(def) => self.call_function(def, None, args, kwargs, line),

            Value::Class(class) => self.instantiate(class, args, kwargs, line),

            Value::BoundMethod(bound) => self.call_function(
                &bound.method,
                Some((bound.instance.clone(), bound.defining_class)),
                args,
                kwargs,
                line,
            ),

            Value::Native(native) => {
                debug!("Calling native function '{}'", native.name());

                native
                    .call(&mut *self.backend, args, kwargs)
                    .map_err(|msg| MlError::runtime(line, msg).into())
            }

            Value::Host(host) => host
                .call(&mut *self.backend, args, kwargs)
                .map_err(|msg| MlError::runtime(line, msg).into()),

            other => fail(
                line,
                format!("'{}' object is not callable", other.type_name()),
            ),
        }
    }

    /// Invoke a user-defined function or method.  The body runs in a fresh
    /// frame pushed on top of the caller's scope stack.
    fn call_function(
        &mut self,
        def: &Rc<FunctionDef>,
        receiver: Option<Receiver>,
        args: Vec<Value>,
        kwargs: Kwargs,
        line: usize,
    ) -> Flow<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return fail(line, "maximum recursion depth exceeded");
        }

        let receiver_value: Option<Value> =
            receiver.as_ref().map(|(instance, _)| Value::Instance(instance.clone()));

        let bound: HashMap<String, Value> =
            binding::bind_arguments(def, receiver_value, args, kwargs)
                .map_err(|msg| MlError::runtime(line, format!("Function '{}' {}", def.name, msg)))?;

        debug!("Calling '{}' with {} bound arguments", def.name, bound.len());

        let is_method: bool = receiver.is_some();

        if let Some(receiver) = receiver {
            self.method_stack.push(receiver);
        }

        self.push_scope();
        self.call_depth += 1;

        let outcome: Flow<Value> = self.run_body(def, bound, line);

        self.call_depth -= 1;
        self.pop_scope();

        if is_method {
            self.method_stack.pop();
        }

        match outcome {
            Ok(_) => Ok(Value::None),
            Err(Unwind::Return(value, _)) => {
                debug!("Function '{}' returned {}", def.name, value.repr());
                Ok(value)
            }
            Err(Unwind::Break(at)) => fail(at, "'break' outside loop"),
            Err(Unwind::Continue(at)) => fail(at, "'continue' outside loop"),
            Err(other) => Err(other),
        }
    }

    /// Bind parameters in the callee frame (defaults are evaluated there, in
    /// declaration order) and run the body.
    fn run_body(
        &mut self,
        def: &FunctionDef,
        mut bound: HashMap<String, Value>,
        line: usize,
    ) -> Flow<Value> {
        for param in &def.params {
            let value: Value = match (bound.remove(&param.name), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.evaluate(default)?,
                (None, None) => {
                    return fail(
                        line,
                        format!(
                            "Function '{}' missing required argument: '{}'",
                            def.name, param.name
                        ),
                    )
                }
            };

            self.env.define(&param.name, value);
        }

        self.execute_block(&def.body)
    }

    fn instantiate(
        &mut self,
        class: &ClassRef,
        args: Vec<Value>,
        kwargs: Kwargs,
        line: usize,
    ) -> Flow<Value> {
        let instance: Rc<Instance> = Rc::new(Instance::new(class.clone()));

        match self.classes.find_method(class.id, "init") {
            Some((init, defining_class)) => {
                self.call_function(&init, Some((instance.clone(), defining_class)), args, kwargs, line)?;
            }
            None if !args.is_empty() || !kwargs.is_empty() => {
                return fail(
                    line,
                    format!(
                        "'{}' constructor takes no arguments, but {} were given.",
                        class.name,
                        args.len() + kwargs.len()
                    ),
                )
            }
            None => {}
        }

        debug!("Instantiated '{}'", class.name);

        Ok(Value::Instance(instance))
    }

    fn evaluate_super(&mut self, line: usize) -> Flow<Value> {
        let Some((instance, defining_class)) = self.method_stack.last().cloned() else {
            return fail(line, "'super' can only be used inside a class method.");
        };

        let mro: &[ClassId] = self.classes.mro(instance.class.id);
        let has_successor: bool = mro
            .iter()
            .position(|c| *c == defining_class)
            .is_some_and(|pos| pos + 1 < mro.len());

        if !has_successor {
            return fail(
                line,
                format!(
                    "'super' could not find a valid superclass in the MRO for class '{}'.",
                    self.classes.name(defining_class)
                ),
            );
        }

        Ok(Value::Super(Rc::new(SuperRef {
            instance,
            defining_class,
        })))
    }

    fn get_attribute(&mut self, object: &Value, name: &str, line: usize) -> Flow<Value> {
        match object {
            Value::Super(sup) => {
                match self
                    .classes
                    .find_method_after(sup.instance.class.id, sup.defining_class, name)
                {
                    Some((method, defining_class)) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                        instance: sup.instance.clone(),
                        method,
                        defining_class,
                    }))),
                    None => fail(
                        line,
                        format!("No method '{}' found in superclass chain.", name),
                    ),
                }
            }

            Value::Instance(instance) => {
                if let Some(value) = instance.field(name) {
                    return Ok(value);
                }

                match self.classes.find_method(instance.class.id, name) {
                    Some((method, defining_class)) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                        instance: instance.clone(),
                        method,
                        defining_class,
                    }))),
                    None => fail(
                        line,
                        format!(
                            "Object of type '{}' has no attribute or method '{}'",
                            instance.class.name, name
                        ),
                    ),
                }
            }

            Value::Class(class) => match name {
                "name" => Ok(Value::Str(class.name.clone())),
                "mro" => Ok(Value::list(
                    self.classes
                        .mro(class.id)
                        .iter()
                        .map(|id| {
                            Value::Class(ClassRef {
                                id: *id,
                                name: self.classes.name(*id),
                            })
                        })
                        .collect(),
                )),
                _ => match self.classes.find_method(class.id, name) {
                    Some((method, _)) => Ok(Value::Function(method)),
                    None => fail(
                        line,
                        format!("type object '{}' has no attribute '{}'", class.name, name),
                    ),
                },
            },

            Value::Host(host) => match host.get_attr(name) {
                Some(value) => Ok(value),
                None => fail(
                    line,
                    format!("'{}' object has no attribute '{}'", host.type_name(), name),
                ),
            },

            other => match builtins::value_method(other, name) {
                Some(method) => Ok(method),
                None => fail(
                    line,
                    format!("'{}' object has no attribute '{}'", other.type_name(), name),
                ),
            },
        }
    }
}
