/// The data the WTF runtime works with: cells, user stacks, the dictionary and the variable store.
pub mod data_structures;

/// Module for defining the built-in words of the language, both the compile time directives and
/// the operations of the virtual machine.
pub mod built_ins;

/// Module for defining the error reporting of the WTF compiler and virtual machine.
pub mod error;

/// Module for defining the core functionality of the WTF interpreter.  This includes the
/// dispatcher, the executor and tools for examining the interpreter's state.
pub mod interpreter;
