use crate::{
    add_native_word,
    lang::code::Op,
    runtime::{
        data_structures::cell::Cell,
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};

/// `s[i]`: pop the index and the stack, push the item.
pub fn word_index(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let index = interpreter.pop_as_integer()?;
    let stack = interpreter.pop_as_stack()?;

    let item = stack.borrow().get(index).cloned();

    match item {
        Some(item) => {
            interpreter.push(item);
            Ok(())
        }

        None => {
            let len = stack.borrow().len();
            script_error(interpreter, format!("Index {} out of range for a stack of {}", index, len))
        }
    }
}

/// `OF s = i v`: pop the item and the index, store into the stack held by the variable.
pub fn word_istore(interpreter: &mut dyn Interpreter, value: &Cell) -> error::Result<()> {
    let slot = value.as_index(interpreter)?;
    let item = interpreter.pop()?;
    let index = interpreter.pop_as_integer()?;

    let stack = match interpreter.variables().get(slot) {
        Some(cell) => cell.as_stack(interpreter)?,
        None => return script_error(interpreter, format!("Invalid variable slot {}", slot)),
    };

    if !stack.borrow_mut().set(index, item) {
        let len = stack.borrow().len();
        return script_error(interpreter, format!("Index {} out of range for a stack of {}", index, len));
    }

    Ok(())
}

/// `PUSH(s v)`
pub fn word_spush(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let item = interpreter.pop()?;
    let stack = interpreter.pop_as_stack()?;

    stack.borrow_mut().push(item);
    Ok(())
}

/// `POP(s)`
pub fn word_spop(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let stack = interpreter.pop_as_stack()?;
    let item = stack.borrow_mut().pop();

    match item {
        Some(item) => {
            interpreter.push(item);
            Ok(())
        }

        None => script_error_str(interpreter, "POP from an empty stack"),
    }
}

/// `TOS(s)`
pub fn word_stos(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let stack = interpreter.pop_as_stack()?;
    let item = stack.borrow().top().cloned();

    match item {
        Some(item) => {
            interpreter.push(item);
            Ok(())
        }

        None => script_error_str(interpreter, "TOS of an empty stack"),
    }
}

/// `LEN(s)`
pub fn word_slen(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let stack = interpreter.pop_as_stack()?;
    let len = stack.borrow().len();

    interpreter.push(Cell::Number(len as f64));
    Ok(())
}

pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "PUSH", 10, Op::SPush);
    add_native_word!(interpreter, "POP", 200, Op::SPop);
    add_native_word!(interpreter, "TOS", 200, Op::STos);
    add_native_word!(interpreter, "LEN", 200, Op::SLen);
}
