#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};
use wtf::runtime::interpreter::{InterpreterConfig, wtf_interpreter::WtfInterpreter};

/// A PRINT sink the test keeps a handle to after giving the interpreter its own copy.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
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

pub fn interpreter_with(config: InterpreterConfig) -> (WtfInterpreter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let interpreter = WtfInterpreter::with_output(config, Box::new(buffer.clone()));

    (interpreter, buffer)
}

pub fn interpreter() -> (WtfInterpreter, SharedBuffer) {
    interpreter_with(InterpreterConfig::default())
}

/// Compile and run a program that must compile cleanly, returning what it printed.
pub fn run(source: &str) -> String {
    let (mut interpreter, output) = interpreter();
    let report = interpreter.run_source("<test>", source).unwrap();

    assert!(report.is_clean(), "compile errors: {:?}", report.diagnostics);

    output.text()
}

/// Like `run` but the output is split into lines.
pub fn run_lines(source: &str) -> Vec<String> {
    run(source).lines().map(str::to_string).collect()
}
