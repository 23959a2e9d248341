#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::Result;
use rox::interpreter::Interpreter;

/// In‑memory sink shared between the interpreter and the test.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
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

/// A fresh interpreter writing into a buffer the caller can inspect.
pub fn interpreter() -> (Interpreter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(buffer.clone()));

    (interpreter, buffer)
}

/// Run `source` in a fresh interpreter; returns everything printed and the outcome.
pub fn run(source: &str) -> (String, Result<()>) {
    let (mut interpreter, buffer) = interpreter();
    let result = rox::run(source, &mut interpreter);

    (buffer.contents(), result)
}

/// Run `source`, which must succeed, and return its printed lines.
pub fn output(source: &str) -> Vec<String> {
    let (printed, result) = run(source);

    if let Err(e) = result {
        panic!("program failed: {}\n--- source ---\n{}", e, source);
    }

    printed.lines().map(str::to_string).collect()
}

/// Run `source`, which must fail, and return the rendered error.
pub fn error(source: &str) -> String {
    match run(source).1 {
        Ok(()) => panic!("program unexpectedly succeeded:\n{}", source),
        Err(e) => e.to_string(),
    }
}
