pub mod ast;
pub mod atom;
pub mod builtins;
pub mod grouper;
pub mod interpreter;
pub mod lexer;
pub mod number;
pub mod parser;
