#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use mlscript::error::MlError;
use mlscript::interpreter::Interpreter;
use mlscript::value::Value;

/// In-memory sink the tests keep a handle to after handing a clone to the
/// interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is utf-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter() -> (Interpreter, SharedBuffer) {
    let out = SharedBuffer::default();

    (Interpreter::with_output(Box::new(out.clone())), out)
}

/// Run `source` in a fresh interpreter; returns the result and whatever was
/// printed before it finished.
pub fn run(source: &str) -> (Result<Value, MlError>, String) {
    let (mut interp, out) = interpreter();
    let result = interp.run(source);

    (result, out.contents())
}

/// Printed output of a program that must succeed.
pub fn output(source: &str) -> String {
    let (result, printed) = run(source);

    if let Err(e) = result {
        panic!("program failed: {}\noutput so far:\n{}", e, printed);
    }

    printed
}

/// Error of a program that must fail.
pub fn error(source: &str) -> MlError {
    match run(source).0 {
        Ok(value) => panic!("program succeeded with {:?} but was expected to fail", value),
        Err(e) => e,
    }
}

/// Value of the last statement of a program that must succeed.
pub fn eval(source: &str) -> Value {
    run(source)
        .0
        .unwrap_or_else(|e| panic!("program failed: {}", e))
}
