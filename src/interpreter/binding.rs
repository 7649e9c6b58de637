//! Call-site argument binding shared by functions and methods.

use std::collections::HashMap;

use log::debug;

use crate::ast::FunctionDef;
use crate::value::{Kwargs, Value};

/// Map supplied arguments onto `def`'s parameters.
///
/// The receiver (if any) takes the first parameter, positional arguments
/// fill the rest left to right, then keywords are applied by name.
/// Parameters still unbound afterwards are left out of the map; the caller
/// fills them from defaults inside the callee frame.
///
/// Error messages are suffixes meant to follow `Function 'name' `.
pub(crate) fn bind_arguments(
    def: &FunctionDef,
    receiver: Option<Value>,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<HashMap<String, Value>, String> {
    let mut bound: HashMap<String, Value> = HashMap::with_capacity(def.params.len());
    let mut params = def.params.iter();

    if let Some(receiver) = receiver {
        let Some(first) = params.next() else {
            return Err("has no 'self' parameter".to_owned());
        };

        bound.insert(first.name.clone(), receiver);
    }

    let mut args = args.into_iter();

    for (param, value) in params.by_ref().zip(args.by_ref()) {
        bound.insert(param.name.clone(), value);
    }

    if args.next().is_some() {
        return Err("received too many positional arguments".to_owned());
    }

    for (name, value) in kwargs {
        if !def.params.iter().any(|p| p.name == name) {
            return Err(format!("got an unexpected keyword argument '{}'", name));
        }

        if bound.contains_key(&name) {
            return Err(format!("got multiple values for argument '{}'", name));
        }

        bound.insert(name, value);
    }

    debug!(
        "Bound {} of {} parameters for '{}'",
        bound.len(),
        def.params.len(),
        def.name
    );

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::parser::parse_source;
    use std::rc::Rc;

    fn function(source: &str) -> Rc<FunctionDef> {
        match parse_source(source).unwrap().remove(0) {
            Stmt::Function(def) => def,
            other => panic!("expected a function definition, got {:?}", other),
        }
    }

    fn kw(name: &str, value: i64) -> (String, Value) {
        (name.to_owned(), Value::Int(value))
    }

    #[test]
    fn positional_arguments_fill_left_to_right() {
        let def = function("fun f(a, b=2) { return a + b }");
        let bound = bind_arguments(&def, None, vec![Value::Int(1)], vec![]).unwrap();

        assert_eq!(bound.get("a"), Some(&Value::Int(1)));
        assert!(!bound.contains_key("b"));
    }

    #[test]
    fn keywords_bind_in_any_order() {
        let def = function("fun f(a, b=2) { return a + b }");
        let bound = bind_arguments(&def, None, vec![], vec![kw("b", 9), kw("a", 1)]).unwrap();

        assert_eq!(bound.get("a"), Some(&Value::Int(1)));
        assert_eq!(bound.get("b"), Some(&Value::Int(9)));
    }

    #[test]
    fn excess_positionals_are_rejected() {
        let def = function("fun f(a, b=2) { return a + b }");
        let err = bind_arguments(
            &def,
            None,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            vec![],
        )
        .unwrap_err();

        assert!(err.contains("too many positional arguments"));
    }

    #[test]
    fn keyword_for_positionally_bound_parameter_conflicts() {
        let def = function("fun f(a, b=2) { return a + b }");
        let err = bind_arguments(&def, None, vec![Value::Int(1)], vec![kw("a", 2)]).unwrap_err();

        assert_eq!(err, "got multiple values for argument 'a'");
    }

    #[test]
    fn unknown_keywords_are_rejected() {
        let def = function("fun f(a) { return a }");
        let err = bind_arguments(&def, None, vec![], vec![kw("z", 1)]).unwrap_err();

        assert_eq!(err, "got an unexpected keyword argument 'z'");
    }

    #[test]
    fn receiver_takes_the_first_parameter() {
        let def = function("fun m(self, x) { return x }");
        let bound = bind_arguments(
            &def,
            Some(Value::str("me")),
            vec![Value::Int(5)],
            vec![],
        )
        .unwrap();

        assert_eq!(bound.get("self"), Some(&Value::str("me")));
        assert_eq!(bound.get("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn methods_without_parameters_cannot_take_a_receiver() {
        let def = function("fun m() { return 1 }");
        let err = bind_arguments(&def, Some(Value::Int(0)), vec![], vec![]).unwrap_err();

        assert_eq!(err, "has no 'self' parameter");
    }
}
