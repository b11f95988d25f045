/// The core words of the language.
pub mod base_words;

/// Words that perform I/O operations.
pub mod io_words;

use crate::{
    lang::code::{Directive, Op, Routine},
    runtime::{
        built_ins::{
            base_words::{
                control_words, definition_words, machine_words, math_logic_words, stack_words,
                syntax_words,
            },
            io_words::register_io_words,
        },
        interpreter::{Interpreter, RoutineHandler},
    },
};

/// Register every built-in word with the interpreter.
pub fn register_builtin_words(interpreter: &mut dyn Interpreter) {
    base_words::register_base_words(interpreter);
    register_io_words(interpreter);
}

/// Find the handler that implements a routine.
pub fn routine_handler(routine: Routine) -> RoutineHandler {
    match routine {
        Routine::Op(op) => op_handler(op),
        Routine::Directive(directive) => directive_handler(directive),
    }
}

pub fn op_handler(op: Op) -> RoutineHandler {
    match op {
        Op::Push => machine_words::word_push,
        Op::VPush => machine_words::word_vpush,
        Op::VStore => machine_words::word_vstore,
        Op::VIncr => machine_words::word_vincr,
        Op::Jp => machine_words::word_jp,
        Op::Jpz => machine_words::word_jpz,
        Op::Call => machine_words::word_call,
        Op::Ret => machine_words::word_ret,

        Op::Index => stack_words::word_index,
        Op::IStore => stack_words::word_istore,
        Op::SPush => stack_words::word_spush,
        Op::SPop => stack_words::word_spop,
        Op::STos => stack_words::word_stos,
        Op::SLen => stack_words::word_slen,

        Op::Add => math_logic_words::word_add,
        Op::Sub => math_logic_words::word_sub,
        Op::Mul => math_logic_words::word_mul,
        Op::Div => math_logic_words::word_div,
        Op::Pow => math_logic_words::word_pow,
        Op::Neg => math_logic_words::word_neg,
        Op::Abs => math_logic_words::word_abs,
        Op::Round => math_logic_words::word_round,
        Op::Rand => math_logic_words::word_rand,
        Op::Eq => math_logic_words::word_eq,
        Op::Neq => math_logic_words::word_neq,
        Op::Lt => math_logic_words::word_lt,
        Op::Leq => math_logic_words::word_leq,
        Op::Gt => math_logic_words::word_gt,
        Op::Geq => math_logic_words::word_geq,
        Op::And => math_logic_words::word_and,
        Op::Or => math_logic_words::word_or,
        Op::Not => math_logic_words::word_not,

        Op::Print => io_words::word_print,
        Op::FOpen => io_words::word_fopen,
        Op::FClose => io_words::word_fclose,
        Op::FGet => io_words::word_fget,
        Op::FPut => io_words::word_fput,
    }
}

pub fn directive_handler(directive: Directive) -> RoutineHandler {
    match directive {
        Directive::OpenParen => syntax_words::word_open_paren,
        Directive::CloseParen => syntax_words::word_close_paren,
        Directive::OpenBracket => syntax_words::word_open_bracket,
        Directive::CloseBracket => syntax_words::word_close_bracket,
        Directive::String => syntax_words::word_string,
        Directive::Comment => syntax_words::word_comment,
        Directive::Newline => syntax_words::word_newline,
        Directive::Include => syntax_words::word_include,

        Directive::Def => definition_words::word_def,
        Directive::Let => definition_words::word_let,
        Directive::Of => definition_words::word_of,
        Directive::Stack => definition_words::word_stack,
        Directive::Begin => definition_words::word_begin,
        Directive::End => definition_words::word_end,
        Directive::Run => definition_words::word_run,

        Directive::If => control_words::word_if,
        Directive::Then => control_words::word_then,
        Directive::Elif => control_words::word_elif,
        Directive::Else => control_words::word_else,
        Directive::Fi => control_words::word_fi,
        Directive::While => control_words::word_while,
        Directive::Do => control_words::word_do,
        Directive::Od => control_words::word_od,
        Directive::For => control_words::word_for,
        Directive::To => control_words::word_to,
        Directive::Next => control_words::word_next,
    }
}
