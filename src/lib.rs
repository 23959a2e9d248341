pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use log::info;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{Resolutions, Resolver};
use crate::stmt::Stmt;
use crate::token::Token;

/// Scan, parse, resolve and execute `source` against `interpreter`.
///
/// Globals defined by earlier calls stay visible, which is what the REPL relies on.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<()> {
    let tokens: Vec<Token<'_>> = scanner::scan(source)?;
    let statements: Vec<Stmt> = Parser::new(&tokens).parse()?;
    let resolutions: Resolutions =
        Resolver::new(interpreter.global_names()).resolve(&statements)?;

    info!(
        "Front end finished, handing {} statements to the interpreter",
        statements.len()
    );

    interpreter.resolve(resolutions);
    interpreter.interpret(&statements)
}
