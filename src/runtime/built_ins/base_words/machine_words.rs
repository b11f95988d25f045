use crate::{
    add_native_word,
    lang::code::Op,
    runtime::{
        data_structures::cell::Cell,
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use tracing::trace;

/// Push the instruction's own value.
pub fn word_push(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    interpreter.push(value.clone());
    Ok(())
}

pub fn word_vpush(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let slot = value.as_index(interpreter)?;

    match interpreter.variables().get(slot).cloned() {
        Some(cell) => {
            interpreter.push(cell);
            Ok(())
        }

        None => script_error(interpreter, format!("Invalid variable slot {}", slot)),
    }
}

pub fn word_vstore(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let slot = value.as_index(interpreter)?;
    let cell = interpreter.pop()?;

    match interpreter.variables_mut().get_mut(slot) {
        Some(variable) => {
            *variable = cell;
            Ok(())
        }

        None => script_error(interpreter, format!("Invalid variable slot {}", slot)),
    }
}

/// Step a FOR loop's variable.
pub fn word_vincr(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let slot = value.as_index(interpreter)?;

    let current = match interpreter.variables().get(slot) {
        Some(Cell::Number(number)) => *number,
        Some(other) => {
            let message = format!("Expected a number in the loop variable, found {}", other.type_name());
            return script_error(interpreter, message);
        }
        None => return script_error(interpreter, format!("Invalid variable slot {}", slot)),
    };

    if let Some(variable) = interpreter.variables_mut().get_mut(slot) {
        *variable = Cell::Number(current + 1.0);
    }

    Ok(())
}

pub fn word_jp(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let address = jump_target(interpreter, value)?;

    interpreter.jump(address);
    Ok(())
}

pub fn word_jpz(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let address = jump_target(interpreter, value)?;

    if !interpreter.pop_as_bool()? {
        interpreter.jump(address);
    }

    Ok(())
}

pub fn word_call(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let code = value.as_code(interpreter)?;

    trace!(word = %code.borrow().name(), depth = interpreter.return_depth(), "call");
    interpreter.call(code);

    Ok(())
}

pub fn word_ret(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    trace!(depth = interpreter.return_depth(), "return");
    interpreter.ret();

    Ok(())
}

/// Jump targets are instruction addresses.  A jump still holding its placeholder was never
/// resolved, which only happens in code compiled with errors.
fn jump_target(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<usize> {
    match value {
        Cell::Index(address) => Ok(*address),
        _ => script_error(interpreter, "Jump to an unresolved address".to_string()),
    }
}

pub fn register_machine_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "NIL", 255, Op::Push);
}
