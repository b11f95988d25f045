use crate::{lang::source_buffer::SourceLocation, runtime::data_structures::cell::Cell};
use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// The operations the WTF virtual machine knows how to run.  Each one is paired with a value in the
/// code stream; most of them ignore it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Op {
    /// Push the instruction's value onto the data stack.
    Push,

    /// Push the contents of the variable slot given by the value.
    VPush,

    /// Pop the data stack into the variable slot given by the value.
    VStore,

    /// Add one to the number held in the variable slot given by the value.
    VIncr,

    /// Pop an index and a stack, push the stack's item at that index.
    Index,

    /// Pop an item and an index, store the item at that index of the stack held by the variable
    /// slot given by the value.
    IStore,

    /// Jump to the address given by the value.
    Jp,

    /// Pop the data stack and jump to the address given by the value if it was zero.
    Jpz,

    /// Call the code stream given by the value.
    Call,

    /// Return to the caller.
    Ret,

    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Neg,
    Abs,
    Round,
    Rand,

    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,

    And,
    Or,
    Not,

    Print,

    SPush,
    SPop,
    STos,
    SLen,

    FOpen,
    FClose,
    FGet,
    FPut,
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Op::Push => "PUSH",
            Op::VPush => "VPUSH",
            Op::VStore => "VSTORE",
            Op::VIncr => "VINCR",
            Op::Index => "INDEX",
            Op::IStore => "ISTORE",
            Op::Jp => "JP",
            Op::Jpz => "JPZ",
            Op::Call => "CALL",
            Op::Ret => "RET",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Pow => "POW",
            Op::Neg => "NEG",
            Op::Abs => "ABS",
            Op::Round => "ROUND",
            Op::Rand => "RAND",
            Op::Eq => "EQ",
            Op::Neq => "NEQ",
            Op::Lt => "LT",
            Op::Leq => "LEQ",
            Op::Gt => "GT",
            Op::Geq => "GEQ",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::Print => "PRINT",
            Op::SPush => "SPUSH",
            Op::SPop => "SPOP",
            Op::STos => "STOS",
            Op::SLen => "SLEN",
            Op::FOpen => "FOPEN",
            Op::FClose => "FCLOSE",
            Op::FGet => "FGET",
            Op::FPut => "FPUT",
        };

        write!(f, "{}", name)
    }
}

/// Actions the compiler performs the moment their word is read.  These never end up in a code
/// stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Directive {
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,

    /// A string literal, read raw up to the closing quote.
    String,

    /// A comment, skipped up to the end of the line.
    Comment,

    /// End of statement.
    Newline,

    Def,
    Let,
    Of,
    Stack,

    For,
    To,
    Next,

    If,
    Then,
    Elif,
    Else,
    Fi,

    While,
    Do,
    Od,

    /// Open a PROC, FUNC or CMD block.  The value holds the priority of the word being defined.
    Begin,
    End,

    Include,

    /// Run a command's code stream right away, in the middle of compilation.
    Run,
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Directive::OpenParen => "OPEN-PAREN",
            Directive::CloseParen => "CLOSE-PAREN",
            Directive::OpenBracket => "OPEN-BRACKET",
            Directive::CloseBracket => "CLOSE-BRACKET",
            Directive::String => "STRING",
            Directive::Comment => "COMMENT",
            Directive::Newline => "NEWLINE",
            Directive::Def => "DEF",
            Directive::Let => "LET",
            Directive::Of => "OF",
            Directive::Stack => "STACK",
            Directive::For => "FOR",
            Directive::To => "TO",
            Directive::Next => "NEXT",
            Directive::If => "IF",
            Directive::Then => "THEN",
            Directive::Elif => "ELIF",
            Directive::Else => "ELSE",
            Directive::Fi => "FI",
            Directive::While => "WHILE",
            Directive::Do => "DO",
            Directive::Od => "OD",
            Directive::Begin => "BEGIN",
            Directive::End => "END",
            Directive::Include => "INCLUDE",
            Directive::Run => "RUN",
        };

        write!(f, "{}", name)
    }
}

/// What a dictionary word does when the compiler dispatches it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Routine {
    /// A virtual machine operation.  Emitted into the code stream, or run on the spot when the
    /// word's priority is zero.
    Op(Op),

    /// A compile time action.
    Directive(Directive),
}

impl From<Op> for Routine {
    fn from(op: Op) -> Routine {
        Routine::Op(op)
    }
}

impl From<Directive> for Routine {
    fn from(directive: Directive) -> Routine {
        Routine::Directive(directive)
    }
}

impl Display for Routine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Routine::Op(op) => write!(f, "{}", op),
            Routine::Directive(directive) => write!(f, "{}", directive),
        }
    }
}

/// A single (routine, value) pair of a code stream.
#[derive(Clone)]
pub struct Instruction {
    /// Where in the source the word that produced this instruction was found.
    pub location: Option<SourceLocation>,

    pub op: Op,
    pub value: Cell,
}

impl Instruction {
    pub fn new(location: Option<SourceLocation>, op: Op, value: Cell) -> Instruction {
        Instruction {
            location,
            op,
            value,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.value {
            Cell::Address(address) if address.is_nil() => write!(f, "{}", self.op),
            value => write!(f, "{:8} {}", self.op.to_string(), value.to_literal()),
        }
    }
}

/// The instructions of one code stream.  Addresses are positions in this list.
pub type ByteCode = Vec<Instruction>;

/// A named, growable code stream.  The name shows up in dumps and in runtime call stacks.
pub struct CodeBlock {
    name: String,
    instructions: ByteCode,
}

/// Code streams are shared between the word that owns them and any executor frame running them.
pub type CodeStream = Rc<RefCell<CodeBlock>>;

impl CodeBlock {
    /// Create a new empty code stream.
    pub fn new_stream(name: &str) -> CodeStream {
        Rc::new(RefCell::new(CodeBlock {
            name: name.to_string(),
            instructions: ByteCode::new(),
        }))
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn instructions(&self) -> &ByteCode {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.instructions.get(address)
    }

    /// Append an instruction and return its address.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Write a jump target into an already compiled instruction.  Returns false if there is no
    /// instruction at that address.
    pub fn patch(&mut self, address: usize, target: usize) -> bool {
        match self.instructions.get_mut(address) {
            Some(instruction) => {
                instruction.value = Cell::Index(target);
                true
            }

            None => false,
        }
    }
}

/// Pretty print a code stream for the `--dump-obj` listing, one `address: ROUTINE value` line per
/// instruction.
pub fn pretty_print_code(code: &CodeBlock) -> String {
    let mut result = String::with_capacity(code.len() * 20);

    for (index, instruction) in code.instructions().iter().enumerate() {
        result.push_str(&format!("{:4}: {}\n", index, instruction));
    }

    result
}
