pub mod ast;
pub mod ast_printer;
pub mod backend;
pub mod class;
pub mod environment;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use error::{MlError, Result};
pub use interpreter::Interpreter;
pub use value::Value;
