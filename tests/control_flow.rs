mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{error, output, SharedBuffer};
use mlscript::backend::{ArithOp, Backend, StandardBackend};
use mlscript::interpreter::Interpreter;
use mlscript::value::Value;

/// Backend that counts the scope operations the interpreter mirrors to it.
struct Recording {
    inner: StandardBackend,
    enters: Rc<Cell<usize>>,
    exits: Rc<Cell<usize>>,
}

impl Backend for Recording {
    fn enter_scope(&mut self) {
        self.enters.set(self.enters.get() + 1);
        self.inner.enter_scope();
    }

    fn exit_scope(&mut self) {
        self.exits.set(self.exits.get() + 1);
        self.inner.exit_scope();
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.inner.get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.inner.set(name, value)
    }

    fn evaluate(&mut self, op: ArithOp, left: &Value, right: &Value) -> Result<Value, String> {
        self.inner.evaluate(op, left, right)
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.inner.set_grad_enabled(enabled)
    }

    fn grad_enabled(&self) -> bool {
        self.inner.grad_enabled()
    }
}

/// Run `source` and return (scope enters, scope exits, printed output).
fn count_scopes(source: &str) -> (usize, usize, String) {
    let enters = Rc::new(Cell::new(0));
    let exits = Rc::new(Cell::new(0));
    let out = SharedBuffer::default();

    let backend = Recording {
        inner: StandardBackend::new(),
        enters: enters.clone(),
        exits: exits.clone(),
    };

    let mut interp = Interpreter::with_backend(Box::new(backend), Box::new(out.clone()));
    interp.run(source).unwrap();

    assert_eq!(interp.scope_depth(), 1);

    (enters.get(), exits.get(), out.contents())
}

#[test]
fn assignments_to_backend_variables_reach_the_backend() {
    let mut inner = StandardBackend::new();
    inner.set("epochs", Value::Int(3));

    let backend = Recording {
        inner,
        enters: Rc::default(),
        exits: Rc::default(),
    };
    let out = SharedBuffer::default();
    let mut interp = Interpreter::with_backend(Box::new(backend), Box::new(out.clone()));

    interp
        .run(
            "print(epochs)
             fun bump() { epochs = epochs + 1 }
             bump()
             epochs = epochs * 10
             print(epochs)
             fresh = 1",
        )
        .unwrap();

    assert_eq!(out.contents(), "3\n40\n");
    assert_eq!(interp.backend().get("epochs"), Some(Value::Int(40)));
    assert_eq!(interp.backend().get("fresh"), None);
    assert_eq!(interp.global("fresh"), Some(Value::Int(1)));
}

#[test]
fn breaking_out_of_a_huge_range_stops_early() {
    let printed = output(
        "for i in range(2000000000) {
           if (i == 2) { break }
           print(i)
         }",
    );

    assert_eq!(printed, "0\n1\n");
}

#[test]
fn for_loop_opens_exactly_one_frame() {
    assert_eq!(count_scopes("for x in [1, 2, 3] { }"), (1, 1, String::new()));
}

#[test]
fn for_loop_pops_its_frame_on_break() {
    let (enters, exits, printed) =
        count_scopes("for x in [1, 2, 3] {\n  if (x == 2) { break }\n  print(x)\n}");

    assert_eq!((enters, exits), (1, 1));
    assert_eq!(printed, "1\n");
}

#[test]
fn while_and_if_open_no_frames() {
    let (enters, exits, _) = count_scopes(
        "i = 0
         while (i < 3) {
           if (i == 1) { j = i } else { k = i }
           i = i + 1
         }",
    );

    assert_eq!((enters, exits), (0, 0));
}

#[test]
fn calls_and_catches_each_open_one_frame() {
    let (enters, exits, _) = count_scopes(
        "fun f() { return 1 }
         f()
         try { throw 1 } catch (e) { }",
    );

    assert_eq!((enters, exits), (2, 2));
}

#[test]
fn loop_frame_is_shared_between_iterations() {
    assert_eq!(
        output("for i in [1, 2] {\n  if (i == 2) { print(prev) }\n  prev = i\n}"),
        "1\n"
    );
}

#[test]
fn loop_locals_disappear_with_the_loop() {
    let err = error("for i in [1] { y = i }\nprint(y)");
    assert!(err.to_string().contains("Undefined variable 'y'"));

    // Names that already existed are written through.
    assert_eq!(output("y = 0\nfor i in [7] { y = i }\nprint(y)"), "7\n");
}

#[test]
fn for_iterates_strings_tuples_and_ranges() {
    let printed = output(
        "for c in \"ab\" { print(c) }
         for t in (1, 2) { print(t) }
         for n in range(3, 0, -1) { print(n) }",
    );

    assert_eq!(printed, "a\nb\n1\n2\n3\n2\n1\n");
}

#[test]
fn for_rejects_non_iterables() {
    let err = error("\nfor x in 5 { }");

    assert_eq!(
        err.to_string(),
        "Runtime Error on line 2: 'for' loop can only iterate over a list, string, tuple or range, not 'int'"
    );
}

#[test]
fn if_elif_else_picks_one_branch() {
    let program = |n: i64| {
        format!(
            "n = {}
             if (n < 0) {{ print(\"neg\") }} elif (n == 0) {{ print(\"zero\") }} else {{ print(\"pos\") }}",
            n
        )
    };

    assert_eq!(output(&program(-3)), "neg\n");
    assert_eq!(output(&program(0)), "zero\n");
    assert_eq!(output(&program(8)), "pos\n");
}

#[test]
fn continue_skips_to_the_next_iteration() {
    let printed = output(
        "i = 0
         while (i < 5) {
           i = i + 1
           if (i == 3) { continue }
           print(i)
         }",
    );

    assert_eq!(printed, "1\n2\n4\n5\n");
}

#[test]
fn break_leaves_only_the_innermost_loop() {
    let printed = output(
        "for i in [1, 2] {
           for j in [10, 20, 30] {
             if (j == 20) { break }
             print(i, j)
           }
         }",
    );

    assert_eq!(printed, "1 10\n2 10\n");
}

#[test]
fn try_catch_finally_runs_each_part_once() {
    assert_eq!(
        output("try { throw 5 } catch (e) { print(e) } finally { print(\"done\") }"),
        "5\ndone\n"
    );
}

#[test]
fn finally_runs_when_returning() {
    let printed = output(
        "fun f() {
           try { return 1 } finally { print(\"cleanup\") }
         }
         print(f())",
    );

    assert_eq!(printed, "cleanup\n1\n");
}

#[test]
fn finally_runs_when_breaking() {
    let printed = output(
        "for i in [1, 2, 3] {
           try {
             if (i == 2) { break }
             print(i)
           } finally {
             print(\"f\", i)
           }
         }",
    );

    assert_eq!(printed, "1\nf 1\nf 2\n");
}

#[test]
fn finally_signal_replaces_the_pending_one() {
    let printed = output(
        "fun g() {
           try { return 1 } finally { return 2 }
         }
         print(g())",
    );
    assert_eq!(printed, "2\n");

    let err = error("try { throw 1 } finally { throw 2 }");
    assert_eq!(err.to_string(), "Uncaught exception on line 1: 2");
}

#[test]
fn catch_can_rethrow_to_an_outer_handler() {
    let printed = output(
        "try {
           try { throw 1 } catch (e) { throw e + 1 }
         } catch (e) {
           print(e)
         }",
    );

    assert_eq!(printed, "2\n");
}

#[test]
fn thrown_values_cross_function_boundaries() {
    let printed = output(
        "fun risky(v) {
           if (v > 1) { throw [\"too big\", v] }
           return v
         }
         try { risky(3) } catch (e) { print(e[0], e[1]) }",
    );

    assert_eq!(printed, "too big 3\n");
}

#[test]
fn catch_variable_is_scoped_to_the_handler() {
    let err = error("try { throw 1 } catch (e) { }\nprint(e)");

    assert!(err.to_string().contains("Undefined variable 'e'"));
}

#[test]
fn runtime_errors_are_not_catchable() {
    let (result, printed) = common::run("try { x = 1 / 0 } catch (e) { print(\"caught\") }");

    assert_eq!(
        result.unwrap_err().to_string(),
        "Runtime Error on line 1: division by zero"
    );
    assert_eq!(printed, "");
}

#[test]
fn uncaught_throw_reports_its_line() {
    let err = error("x = 1\nthrow \"bad\"");

    assert_eq!(err.to_string(), "Uncaught exception on line 2: bad");
}

#[test]
fn loop_signals_outside_loops_are_errors() {
    assert_eq!(
        error("x = 1\nbreak").to_string(),
        "Runtime Error on line 2: 'break' outside loop"
    );
    assert_eq!(
        error("fun c() { continue }\nc()").to_string(),
        "Runtime Error on line 1: 'continue' outside loop"
    );
    assert_eq!(
        error("x = 1\nreturn 5").to_string(),
        "Runtime Error on line 2: 'return' outside function"
    );
}
