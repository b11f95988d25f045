use std::{ fmt::{ self,
                  Display,
                  Formatter },
           rc::Rc };
use crate::{ lang::code::CodeStream,
             runtime::{ data_structures::cell_stack::{ CellStack,
                                                       CellStackPtr },
                        error::{ self,
                                 script_error },
                        interpreter::Interpreter } };



/// The universal unit of data.  Cells live on the data stack, in variable slots and as the value
/// half of every compiled instruction.
///
/// There is no silent reinterpretation between the variants.  A number only becomes an index, or
/// a boolean, through one of the checked conversions below.
#[derive(Clone, Debug)]
pub enum Cell
{
    /// A floating point number.  Booleans are numbers too, zero being false.
    Number(f64),

    /// An unsigned index: a variable slot, a jump address or a word priority.
    Index(usize),

    /// A reference to something that isn't a number.
    Address(Address)
}


/// The things a cell can refer to.
#[derive(Clone)]
pub enum Address
{
    /// Refers to nothing.  Pushed by `NIL` and by a failed `FOPEN`.
    Nil,

    /// A string literal.
    Text(Rc<str>),

    /// A stack created by `STACK`.  Shared, so every copy of the cell sees the same items.
    Stack(CellStackPtr),

    /// A handle into the interpreter's table of open files.
    File(usize),

    /// The code stream of a procedure, function or command.
    Code(CodeStream)
}


impl fmt::Debug for Address
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl Address
{
    pub fn is_nil(&self) -> bool
    {
        matches!(self, Address::Nil)
    }
}


impl Display for Address
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Address::Nil          => write!(f, "NIL"),
            Address::Text(text)   => write!(f, "{}", text),
            Address::Stack(stack) => write!(f, "{}", stack.borrow()),
            Address::File(handle) => write!(f, "<file {}>", handle),
            Address::Code(code)   => write!(f, "<code {}>", code.borrow().name())
        }
    }
}


impl Default for Cell
{
    fn default() -> Cell
    {
        Cell::Number(0.0)
    }
}


/// Equality as the `=` and `<>` words see it.  Numbers compare numerically, texts by content, NIL
/// only equals NIL and everything else by identity.  Different variants are never equal.
impl PartialEq for Cell
{
    fn eq(&self, other: &Cell) -> bool
    {
        match (self, other)
        {
            (Cell::Number(a), Cell::Number(b)) => a == b,
            (Cell::Index(a), Cell::Index(b))   => a == b,

            (Cell::Address(a), Cell::Address(b)) =>
                match (a, b)
                {
                    (Address::Nil, Address::Nil)           => true,
                    (Address::Text(a), Address::Text(b))   => a == b,
                    (Address::Stack(a), Address::Stack(b)) => Rc::ptr_eq(a, b),
                    (Address::File(a), Address::File(b))   => a == b,
                    (Address::Code(a), Address::Code(b))   => Rc::ptr_eq(a, b),
                    _                                      => false
                },

            _ => false
        }
    }
}


/// How PRINT shows a cell.  Integral numbers print without a fractional part.
impl Display for Cell
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Cell::Number(value) =>
                match to_integer(*value)
                {
                    Some(integer) => write!(f, "{}", integer),
                    None          => write!(f, "{}", value)
                },

            Cell::Index(index)     => write!(f, "{}", index),
            Cell::Address(address) => write!(f, "{}", address)
        }
    }
}


impl From<f64> for Cell
{
    fn from(value: f64) -> Cell
    {
        Cell::Number(value)
    }
}


impl From<bool> for Cell
{
    fn from(value: bool) -> Cell
    {
        Cell::Number(if value { 1.0 } else { 0.0 })
    }
}


impl From<CellStackPtr> for Cell
{
    fn from(stack: CellStackPtr) -> Cell
    {
        Cell::Address(Address::Stack(stack))
    }
}


impl From<CodeStream> for Cell
{
    fn from(code: CodeStream) -> Cell
    {
        Cell::Address(Address::Code(code))
    }
}


/// Generate the checked conversions from a cell to the payload of one of its address variants.
macro_rules! address_conversion
{
    ($as_ident:ident , $variant:ident , $data_type:ty , $description:literal) =>
    {
        impl Cell
        {
            #[doc = concat!("Get the ", $description, " held by the cell, or fail with a runtime error.")]
            pub fn $as_ident(&self, interpreter: &dyn Interpreter) -> error::Result<$data_type>
            {
                match self
                {
                    Cell::Address(Address::$variant(value)) => Ok(value.clone()),
                    _ => script_error(interpreter,
                                      format!("Expected {}, found {}",
                                              $description,
                                              self.type_name()))
                }
            }
        }
    };
}


address_conversion!(as_text,  Text,  Rc<str>,      "a string");
address_conversion!(as_stack, Stack, CellStackPtr, "a stack");
address_conversion!(as_file,  File,  usize,        "a file");
address_conversion!(as_code,  Code,  CodeStream,   "a code block");


impl Cell
{
    pub fn nil() -> Cell
    {
        Cell::Address(Address::Nil)
    }

    pub fn text(text: &str) -> Cell
    {
        Cell::Address(Address::Text(Rc::from(text)))
    }

    /// A cell holding a fresh, empty stack.
    pub fn new_stack() -> Cell
    {
        Cell::from(CellStack::new_ptr())
    }

    pub fn is_nil(&self) -> bool
    {
        matches!(self, Cell::Address(Address::Nil))
    }

    /// A short description of the cell's variant for error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Cell::Number(_) => "a number",
            Cell::Index(_)  => "an index",

            Cell::Address(address) =>
                match address
                {
                    Address::Nil      => "NIL",
                    Address::Text(_)  => "a string",
                    Address::Stack(_) => "a stack",
                    Address::File(_)  => "a file",
                    Address::Code(_)  => "a code block"
                }
        }
    }

    /// The cell as a number.  Only the number variant qualifies.
    pub fn as_number(&self, interpreter: &dyn Interpreter) -> error::Result<f64>
    {
        match self
        {
            Cell::Number(value) => Ok(*value),
            _ => script_error(interpreter, format!("Expected a number, found {}", self.type_name()))
        }
    }

    /// The cell as a truth value, zero being false.
    pub fn as_bool(&self, interpreter: &dyn Interpreter) -> error::Result<bool>
    {
        Ok(self.as_number(interpreter)? != 0.0)
    }

    /// The cell as an unsigned index.  Index cells qualify as is, numbers only when they are
    /// integral and not negative.
    pub fn as_index(&self, interpreter: &dyn Interpreter) -> error::Result<usize>
    {
        match self
        {
            Cell::Index(index) => Ok(*index),

            Cell::Number(value) =>
                match to_integer(*value)
                {
                    Some(integer) if integer >= 0 => Ok(integer as usize),
                    _ => script_error(interpreter, format!("{} is not a valid index", value))
                },

            _ => script_error(interpreter, format!("Expected an index, found {}", self.type_name()))
        }
    }

    /// The cell as a signed integer, for stack positions that may count from the end.
    pub fn as_integer(&self, interpreter: &dyn Interpreter) -> error::Result<i64>
    {
        let value = self.as_number(interpreter)?;

        match to_integer(value)
        {
            Some(integer) => Ok(integer),
            None => script_error(interpreter, format!("{} is not an integer", value))
        }
    }

    /// How the cell appears in code and variable dumps.  Strings are quoted and escaped so that
    /// each entry stays on one line.
    pub fn to_literal(&self) -> String
    {
        match self
        {
            Cell::Address(Address::Text(text)) => stringify(text),
            _ => self.to_string()
        }
    }
}


/// Convert a number to an integer if it has no fractional part and fits.
pub fn to_integer(value: f64) -> Option<i64>
{
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15
    {
        Some(value as i64)
    }
    else
    {
        None
    }
}


/// Quote a string, escaping the characters that would break a one line listing.
pub fn stringify(text: &str) -> String
{
    let mut result = String::with_capacity(text.len() + 2);

    result.push('"');

    for character in text.chars()
    {
        match character
        {
            '"'  => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\\' => result.push_str("\\\\"),
            _    => result.push(character)
        }
    }

    result.push('"');

    result
}
