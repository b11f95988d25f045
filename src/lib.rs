/// Source handling, scanning and the compiler's data structures.
pub mod lang;

/// The data structures, built-in words and the interpreter that compiles and runs WTF programs.
#[macro_use]
pub mod runtime;
