use crate::{
    lang::{
        code::{CodeStream, Routine},
        compilation::{CodeConstructor, CompileReport},
        source_buffer::SourceLocation,
    },
    runtime::{
        built_ins::io_words::FileTable,
        data_structures::{
            cell::Cell, cell_stack::CellStackPtr, dictionary::Dictionary,
            variable_store::VariableStore,
        },
        error,
    },
};
use std::{
    fmt::{self, Display, Formatter},
    io::Write,
    rc::Rc,
};

pub mod wtf_interpreter;

/// A call stack item records a code stream being executed and the address within it that was
/// executing, or that made the call.  These items are read-only and the fields are accessed by
/// member functions.
#[derive(Clone)]
pub struct CallItem {
    word: String,
    address: usize,
    location: Option<SourceLocation>,
}

impl CallItem {
    /// Create a new call stack item.
    pub fn new(word: String, address: usize, location: Option<SourceLocation>) -> CallItem {
        CallItem {
            word,
            address,
            location,
        }
    }

    /// The name of the code stream.
    pub fn word(&self) -> &String {
        &self.word
    }

    /// The address of the instruction within the code stream.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Where in the source code the instruction came from, if known.
    pub fn location(&self) -> &Option<SourceLocation> {
        &self.location
    }
}

/// Make sure that this item can be nicely displayed to the user in event of an error.
impl Display for CallItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.word, self.address)?;

        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }

        Ok(())
    }
}

/// Type to represent a call stack.  Innermost call last.
pub type CallStack = Vec<CallItem>;

/// The data stack of cells managed by the interpreter.
pub type CellStackVec = Vec<Cell>;

/// A saved (code stream, instruction pointer) pair, pushed by CALL and popped by RET.
#[derive(Clone)]
pub struct ReturnFrame {
    pub code: CodeStream,
    pub ip: usize,
}

/// Configuration for a new interpreter.
#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Compilation gives up when this many compile errors have been reported.
    pub max_errors: usize,

    /// Seed of the generator behind `RAND`.  The same seed gives the same sequence.
    pub seed: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_errors: 100,
            seed: 0,
        }
    }
}

/// Trait for managing the interpreter's data stack.  Called by the operations while the virtual
/// machine runs.
pub trait InterpreterStack {
    /// Examine the full data stack.
    fn stack(&self) -> &CellStackVec;

    /// Push a cell onto the stack.  This is how operations hand back their results.
    fn push(&mut self, value: Cell);

    /// Pop a cell from the stack.  If the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Cell>;

    /// Pop the top cell as a number.  Fails if it isn't one, or if the stack is empty.
    fn pop_as_number(&mut self) -> error::Result<f64>;

    /// Pop the top cell as a truth value, zero being false.
    fn pop_as_bool(&mut self) -> error::Result<bool>;

    /// Pop the top cell as an integral number, possibly negative.
    fn pop_as_integer(&mut self) -> error::Result<i64>;

    /// Pop the top cell as a string.
    fn pop_as_text(&mut self) -> error::Result<Rc<str>>;

    /// Pop the top cell as a user stack.
    fn pop_as_stack(&mut self) -> error::Result<CellStackPtr>;

    /// Pop the top cell as a file handle.
    fn pop_as_file(&mut self) -> error::Result<usize>;
}

/// Trait for compiling source code.  Directives use it to read the words that follow them, and to
/// drive the pending and backpatch stacks.
pub trait CodeManagement {
    /// Access the compiler state.
    fn context(&self) -> &CodeConstructor;

    /// Access the compiler state as mutable.
    fn context_mut(&mut self) -> &mut CodeConstructor;

    /// The dispatcher.  Priority 0 runs the routine now, 255 emits it into the active code stream
    /// and anything in between goes through the pending stack.
    fn compile(&mut self, priority: u8, routine: Routine, value: Cell) -> error::Result<()>;

    /// Read the name a defining word is followed by.  `after` names the defining word for the
    /// error message when there's no name.
    fn next_name(&mut self, after: &str) -> error::Result<String> {
        let context = self.context_mut();

        match context.next_word() {
            Some(word) if !word.is_special() => Ok(word.text().to_string()),
            _ => context.compile_error(format!("Missing name after '{}'", after)),
        }
    }

    /// Read the next word and require it to be `=`.
    fn expect_equals(&mut self) -> error::Result<()> {
        let context = self.context_mut();

        match context.next_word() {
            Some(word) if word.text() == "=" => Ok(()),
            _ => context.compile_error_str("'=' expected"),
        }
    }

    /// Continue compiling from another file until it ends.  Relative paths are tried against the
    /// including file's directory first.
    fn include_file(&mut self, path: &str) -> error::Result<()>;

    /// Compile a WTF program from a source file into the top level code stream.
    fn process_source_file(&mut self, path: &str) -> error::Result<CompileReport>;

    /// Compile a WTF program from an in memory source string into the top level code stream.
    ///
    /// The path parameter is used to represent the source code in error reporting.  For example
    /// the tests use a path of "\<test\>".
    fn process_source(&mut self, path: &str, source: &str) -> error::Result<CompileReport>;

    /// The code stream top level code is compiled into.
    fn top_level(&self) -> &CodeStream;
}

/// Trait for managing the dictionary and the variables it refers to.
pub trait WordManagement {
    /// The current word dictionary of words known to the interpreter.
    fn dictionary(&self) -> &Dictionary;

    fn dictionary_mut(&mut self) -> &mut Dictionary;

    /// The slots of every variable declared so far.
    fn variables(&self) -> &VariableStore;

    fn variables_mut(&mut self) -> &mut VariableStore;

    /// Add a new word to the interpreter's dictionary.
    fn define_word(&mut self, name: String, priority: u8, routine: Routine, value: Cell) {
        let _ = self.dictionary_mut().define(name, priority, routine, value);
    }

    /// Find a word in the interpreter's dictionary by name.
    fn find_word(&self, name: &str) -> Option<(u8, Routine, Cell)> {
        self.dictionary()
            .lookup(name)
            .map(|entry| (entry.priority, entry.routine, entry.value.clone()))
    }
}

/// Trait for the threaded code executor.
pub trait CodeExecution {
    /// Run a code stream from its first instruction until it runs off its end.  The executor is
    /// idle afterwards, whether or not an error occurred.
    fn execute_code(&mut self, code: &CodeStream) -> error::Result<()>;

    /// Run a code stream to completion in the middle of something else, then pick up where that
    /// left off.  This is how commands run at compile time.
    fn execute_nested(&mut self, code: CodeStream) -> error::Result<()>;

    /// Run a routine with the given value right now.
    fn invoke(&mut self, routine: Routine, value: &Cell) -> error::Result<()>;

    /// Save the current code stream and position on the return stack and start running another
    /// code stream.
    fn call(&mut self, code: CodeStream);

    /// Resume the most recently saved code stream and position.
    fn ret(&mut self);

    /// Continue execution at another address of the running code stream.
    fn jump(&mut self, address: usize);

    /// Is the executor running code?
    fn is_executing(&self) -> bool;

    /// The depth of the return stack.
    fn return_depth(&self) -> usize;

    /// If set, the location in the source of the instruction executing, or of the word being
    /// compiled.
    fn current_location(&self) -> Option<SourceLocation>;

    /// The current execution call stack, innermost last.
    fn call_stack(&self) -> CallStack;
}

/// Trait for the resources the operations reach outside of the virtual machine.
pub trait Environment {
    /// Where PRINT writes to.
    fn output(&mut self) -> &mut dyn Write;

    /// Next number from the interpreter's random number generator, in `[0, 1)`.
    fn random(&mut self) -> f64;

    /// The files opened by FOPEN.
    fn files_mut(&mut self) -> &mut FileTable;
}

/// Definition of a routine handler function.  Handlers receive the value paired with the routine,
/// in the code stream or in the dictionary.
pub type RoutineHandler = fn(&mut dyn Interpreter, &Cell) -> error::Result<()>;

/// Simplify registering a built-in word with the interpreter.
///
/// Required parameters are the interpreter instance to register with, the name of the word, its
/// priority and its routine.  An optional last parameter gives the word's value, NIL otherwise.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $priority:expr ,
        $routine:expr
    ) => {{
        $crate::add_native_word!(
            $interpreter,
            $name,
            $priority,
            $routine,
            $crate::runtime::data_structures::cell::Cell::nil()
        )
    }};

    (
        $interpreter:expr ,
        $name:expr ,
        $priority:expr ,
        $routine:expr ,
        $value:expr
    ) => {{
        $interpreter.define_word(
            $name.to_string(),
            $priority,
            $crate::lang::code::Routine::from($routine),
            $value,
        );
    }};
}

/// Core interpreter trait.
///
/// This trait brings together the traits that define the core functionality of the WTF
/// interpreter: the data stack, the compiler, the dictionary, the executor and the outside world.
pub trait Interpreter:
    InterpreterStack + CodeManagement + WordManagement + CodeExecution + Environment
{
    /// Reset the interpreter to its freshly created state, keeping its output and configuration.
    fn reset(&mut self) -> error::Result<()>;
}
