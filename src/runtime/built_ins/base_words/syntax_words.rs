use crate::{
    add_native_word,
    lang::{
        code::{Directive, Op},
        compilation::Group,
    },
    runtime::{
        data_structures::cell::Cell,
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};

pub fn word_open_paren(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().open_group(Group::Paren);
    Ok(())
}

pub fn word_close_paren(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().close_group(Group::Paren)
}

pub fn word_open_bracket(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().open_group(Group::Bracket);
    Ok(())
}

/// `s[i]` indexes the stack left by `s` with the value of the bracketed expression.
pub fn word_close_bracket(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    context.close_group(Group::Bracket)?;
    let _ = context.emit(Op::Index, Cell::nil());

    Ok(())
}

/// A string literal runs up to the next double quote, new lines included.
pub fn word_string(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();
    let mut text = String::new();

    loop {
        match context.next_char() {
            Some('"') => break,
            Some(next) => text.push(next),
            None => {
                return ScriptError::new_as_result(
                    ErrorKind::Lex,
                    context.location(),
                    "End of file inside string".to_string(),
                    None,
                );
            }
        }
    }

    let _ = context.emit(Op::Push, Cell::text(&text));

    Ok(())
}

/// The rest of the line is ignored, the new line still ends the statement.
pub fn word_comment(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().skip_line();
    Ok(())
}

/// End of statement: everything pending is emitted.
pub fn word_newline(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().flush(0)
}

pub fn word_include(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let path = interpreter.next_name("INCLUDE")?;

    interpreter.include_file(&path)
}

pub fn register_syntax_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "(", 0, Directive::OpenParen);
    add_native_word!(interpreter, ")", 0, Directive::CloseParen);
    add_native_word!(interpreter, "[", 0, Directive::OpenBracket);
    add_native_word!(interpreter, "]", 0, Directive::CloseBracket);
    add_native_word!(interpreter, "\"", 0, Directive::String);
    add_native_word!(interpreter, "\\", 0, Directive::Comment);
    add_native_word!(interpreter, "\n", 0, Directive::Newline);
    add_native_word!(interpreter, "INCLUDE", 0, Directive::Include);
}
