//! Sheet expression language (spec.md §4.9): a small dynamically typed
//! language embedded in the editor, evaluated line by line against a
//! posting snapshot.

pub mod ast;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod validate;
pub mod value;

pub use env::Env;
pub use eval::{evaluate_line, evaluate_sheet, LineResult};
pub use validate::{validate, Diagnostic};
