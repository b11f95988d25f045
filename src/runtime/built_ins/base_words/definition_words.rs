use crate::{
    add_native_word,
    lang::{
        code::{CodeBlock, Directive, Op, Routine},
        compilation::{BlockMarker, Marker},
    },
    runtime::{
        data_structures::cell::Cell,
        error::{self, compile_error},
        interpreter::Interpreter,
    },
};
use tracing::debug;

/// Declare a new variable: `name = expression`.  The store is queued at priority 50 so that it's
/// emitted after the expression, whatever the expression's operators.  Returns the new slot.
pub fn declare_variable(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<usize> {
    interpreter.context_mut().flush(1)?;

    let name = interpreter.next_name(word)?;
    let slot = interpreter.variables_mut().allocate(Cell::default());

    interpreter.define_word(name, 255, Op::VPush.into(), Cell::Index(slot));
    interpreter.expect_equals()?;
    interpreter
        .context_mut()
        .defer(50, Op::VStore, Cell::Index(slot))?;

    Ok(slot)
}

/// Shared by LET and OF: `name = ...` where the name must already be a variable, stored into
/// by `op`.
fn assign_variable(interpreter: &mut dyn Interpreter, word: &str, op: Op) -> error::Result<()> {
    interpreter.context_mut().flush(1)?;

    let name = interpreter.next_name(word)?;

    let slot = match interpreter.find_word(&name) {
        Some((_, Routine::Op(Op::VPush), Cell::Index(slot))) => slot,
        _ => return compile_error(interpreter, format!("Unknown variable {}", name)),
    };

    interpreter.expect_equals()?;
    interpreter.context_mut().defer(50, op, Cell::Index(slot))
}

pub fn word_def(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    declare_variable(interpreter, "DEF").map(|_| ())
}

pub fn word_let(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    assign_variable(interpreter, "LET", Op::VStore)
}

/// `OF s = i v`
pub fn word_of(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    assign_variable(interpreter, "OF", Op::IStore)
}

/// `STACK s` declares a variable holding a new empty stack.
pub fn word_stack(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    interpreter.context_mut().flush(1)?;

    let name = interpreter.next_name("STACK")?;
    let slot = interpreter.variables_mut().allocate(Cell::new_stack());

    interpreter.define_word(name, 255, Op::VPush.into(), Cell::Index(slot));

    Ok(())
}

fn block_opener(priority: u8) -> &'static str {
    match priority {
        0 => "CMD",
        10 => "PROC",
        250 => "FUNC",
        _ => "BEGIN",
    }
}

/// `PROC name`, `FUNC name` and `CMD name`.  The value holds the priority of the word to define.
///
/// The body is compiled into a code stream of its own which the new word refers to.  Commands run
/// it at once through a nested executor, the others compile a CALL to it.  The word is defined
/// before the body so the body can call itself, and the dictionary is marked after it so that the
/// word outlives its body's scope.
pub fn word_begin(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let priority = match value {
        Cell::Index(priority) if *priority <= u8::MAX as usize => *priority as u8,
        _ => return compile_error(interpreter, format!("Invalid block priority {}", value)),
    };
    let opener = block_opener(priority);

    interpreter.context_mut().flush(1)?;

    let name = interpreter.next_name(opener)?;
    let code = CodeBlock::new_stream(&name);
    let routine: Routine = if priority == 0 {
        Directive::Run.into()
    } else {
        Op::Call.into()
    };

    interpreter.define_word(name.clone(), priority, routine, Cell::from(code.clone()));

    let mark = interpreter.dictionary().mark();
    let context = interpreter.context_mut();
    let outer = context.switch_code(code);

    debug!(%name, opener, priority, "block opened");

    context.backpatch.push(Marker::Block(BlockMarker {
        outer,
        mark,
        opener,
        name,
    }));

    Ok(())
}

/// `END`: finish the body with a return, forget everything defined inside it and go back to
/// compiling the surrounding code.  An unmatched group in the last statement is reported after
/// the block is closed.
pub fn word_end(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();
    let flushed = context.flush(0);

    let Some(block) = context.backpatch.pop_with(|marker| match marker {
        Marker::Block(block) => Some(block.clone()),
        _ => None,
    }) else {
        return context.compile_error_str("'END' without 'PROC'/'FUNC'/'CMD'");
    };

    let _ = context.emit(Op::Ret, Cell::nil());
    let _ = context.switch_code(block.outer);

    let dictionary = interpreter.dictionary_mut();
    let forgotten = dictionary.len().saturating_sub(block.mark);

    dictionary.truncate(block.mark);

    debug!(name = %block.name, forgotten, "block closed");

    flushed
}

/// Run a command's body right away.
pub fn word_run(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let code = value.as_code(interpreter)?;

    interpreter.execute_nested(code)
}

pub fn register_definition_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "DEF", 0, Directive::Def);
    add_native_word!(interpreter, "LET", 0, Directive::Let);
    add_native_word!(interpreter, "OF", 0, Directive::Of);
    add_native_word!(interpreter, "STACK", 0, Directive::Stack);

    add_native_word!(interpreter, "PROC", 0, Directive::Begin, Cell::Index(10));
    add_native_word!(interpreter, "FUNC", 0, Directive::Begin, Cell::Index(250));
    add_native_word!(interpreter, "CMD", 0, Directive::Begin, Cell::Index(0));
    add_native_word!(interpreter, "END", 0, Directive::End);
}
