/// The virtual machine's own operations: literals, variables, jumps, calls and returns.
pub mod machine_words;

/// Arithmetic, comparison and logic.
pub mod math_logic_words;

/// Words that work with user stacks.
pub mod stack_words;

/// Words that define variables, stacks, procedures, functions and commands.
pub mod definition_words;

/// The control structures.
pub mod control_words;

/// Grouping, strings, comments, new lines and INCLUDE.
pub mod syntax_words;

use crate::runtime::{
    built_ins::base_words::{
        control_words::register_control_words, definition_words::register_definition_words,
        machine_words::register_machine_words, math_logic_words::register_math_logic_words,
        stack_words::register_stack_words, syntax_words::register_syntax_words,
    },
    interpreter::Interpreter,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(interpreter: &mut dyn Interpreter) {
    register_machine_words(interpreter);
    register_math_logic_words(interpreter);
    register_stack_words(interpreter);
    register_definition_words(interpreter);
    register_control_words(interpreter);
    register_syntax_words(interpreter);
}
