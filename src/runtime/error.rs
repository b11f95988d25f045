
use std::{ error::Error,
           fmt::{ self, Debug, Display, Formatter } };
use crate::{ runtime::interpreter::CallStack,
             lang::source_buffer::SourceLocation };

use super::interpreter::Interpreter;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The broad category of an error.  The category decides what the compiler does with it: compile
/// errors are counted and skipped over, everything else stops the run.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ErrorKind
{
    /// Malformed raw text, such as a string literal that never ends.
    #[error("lexical error")]
    Lex,

    /// An unknown word, an unmatched control structure, a malformed declaration.
    #[error("compile error")]
    Compile,

    /// Anything that goes wrong while the virtual machine runs code.
    #[error("runtime error")]
    Runtime,

    /// Unrecoverable trouble outside of the program itself, including an exhausted error budget.
    #[error("fatal error")]
    Fatal
}



/// Any error that occurs while compiling or executing a WTF program.
#[derive(Clone)]
pub struct ScriptError
{
    /// What sort of error this is.
    kind: ErrorKind,

    /// The location in the source code the error occurred, if available.
    location: Option<SourceLocation>,

    /// The description of the error.
    error: String,

    /// The executor's call stack at the time of the error, if available.
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
}


/// Pretty print the ScriptError.  Errors are tagged with their location when one is known, and
/// runtime errors list the procedures that were active.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}: {}", location, self.kind, self.error)?,
            None => write!(f, "{}: {}", self.kind, self.error)?
        }

        if let Some(call_stack) = &self.call_stack
            && !call_stack.is_empty()
        {
            write!(f, "\n\nCall stack\n")?;

            for item in call_stack.iter().rev()
            {
                writeln!(f, "  {}", item)?;
            }
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError.
    pub fn new(kind: ErrorKind,
               location: Option<SourceLocation>,
               error: String,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                kind,
                location,
                error,
                call_stack
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(kind: ErrorKind,
                            location: Option<SourceLocation>,
                            error: String,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(kind, location, error, call_stack))
    }

    /// What sort of error this is.
    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// Compile errors are the only ones the compiler recovers from.
    pub fn is_recoverable(&self) -> bool
    {
        self.kind == ErrorKind::Compile
    }

    /// If available, the location in the source code the error occurred.
    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    /// The description of the error.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// If available, the executor's call stack at the time of the error.
    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }

    /// Attach a location to an error that was raised without one.
    pub fn with_location(mut self, location: Option<SourceLocation>) -> ScriptError
    {
        if self.location.is_none()
        {
            self.location = location;
        }

        self
    }
}


/// I/O failures only happen while the program runs, in the file words or in PRINT.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(ErrorKind::Runtime, None, format!("I/O error: {}", error), None)
    }
}



/// Create a compile error tagged with the position the compiler has reached.
pub fn compile_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T>
{
    let location = interpreter.current_location();

    ScriptError::new_as_result(ErrorKind::Compile, location, message, None)
}


pub fn compile_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T>
{
    compile_error(interpreter, message.to_string())
}


/// Create a runtime error tagged with the executing instruction's location and the current call
/// stack.
pub fn script_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T>
{
    let location = interpreter.current_location();
    let call_stack = interpreter.call_stack();

    ScriptError::new_as_result(ErrorKind::Runtime, location, message, Some(call_stack))
}


pub fn script_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T>
{
    script_error(interpreter, message.to_string())
}
