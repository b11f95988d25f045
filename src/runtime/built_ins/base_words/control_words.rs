use crate::{
    add_native_word,
    lang::{
        code::{Directive, Op},
        compilation::Marker,
    },
    runtime::{
        built_ins::base_words::definition_words::declare_variable,
        data_structures::cell::Cell,
        error,
        interpreter::Interpreter,
    },
};

// Jumps are compiled with a NIL placeholder and patched once their target is known.

/// `IF`: nothing pending may leak into the condition.
pub fn word_if(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    context.flush(1)?;
    context.backpatch.push(Marker::Conditional);
    context.backpatch.push(Marker::AwaitThen);

    Ok(())
}

/// `THEN`: compile the condition followed by the jump over the branch.
pub fn word_then(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    if context
        .backpatch
        .pop_with(|marker| matches!(marker, Marker::AwaitThen).then_some(()))
        .is_none()
    {
        return context.compile_error_str("'THEN' without 'IF'");
    }

    context.flush(1)?;

    let jpz = context.emit(Op::Jpz, Cell::nil());
    context.backpatch.push(Marker::Then(jpz));

    Ok(())
}

/// Shared by ELSE and ELIF: end the branch just compiled with a jump to the end of the construct
/// and point the branch's JPZ past that jump.
fn close_branch(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<()> {
    let context = interpreter.context_mut();

    let Some(jpz) = context.backpatch.pop_with(|marker| match marker {
        Marker::Then(address) => Some(*address),
        _ => None,
    }) else {
        return context.compile_error(format!("'{}' without 'THEN'", word));
    };

    context.flush(1)?;

    let jp = context.emit(Op::Jp, Cell::nil());
    let here = context.here();

    context.patch(jpz, here)?;
    context.backpatch.push(Marker::Exit(jp));

    Ok(())
}

pub fn word_elif(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    close_branch(interpreter, "ELIF")?;
    interpreter.context_mut().backpatch.push(Marker::AwaitThen);

    Ok(())
}

pub fn word_else(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    close_branch(interpreter, "ELSE")?;
    interpreter.context_mut().backpatch.push(Marker::ElseBranch);

    Ok(())
}

/// `FI`: every branch's exit jump, and the last JPZ when there's no ELSE, lands here.
pub fn word_fi(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    if !matches!(
        context.backpatch.top(),
        Some(Marker::Then(_)) | Some(Marker::ElseBranch)
    ) {
        return context.compile_error_str("'FI' without 'THEN'/'ELSE'");
    }

    context.flush(1)?;

    let here = context.here();

    while let Some(marker) = context.backpatch.pop() {
        match marker {
            Marker::Then(address) | Marker::Exit(address) => context.patch(address, here)?,
            Marker::ElseBranch => {}
            Marker::Conditional => return Ok(()),

            other => {
                context.backpatch.push(other);
                break;
            }
        }
    }

    context.compile_error_str("'FI' without 'IF'")
}

/// `WHILE`: the loop test starts here.
pub fn word_while(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    context.flush(1)?;

    let start = context.here();
    context.backpatch.push(Marker::LoopStart(start));

    Ok(())
}

/// `DO` closes the test of either kind of loop with the JPZ that leaves it.
pub fn word_do(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    let Some(marker) = context.backpatch.pop_with(|marker| match marker {
        Marker::LoopStart(_) | Marker::ForBound { .. } => Some(marker.clone()),
        _ => None,
    }) else {
        return context.compile_error_str("'DO' without 'WHILE' or 'FOR'");
    };

    context.flush(1)?;

    let exit = context.emit(Op::Jpz, Cell::nil());

    match marker {
        Marker::LoopStart(start) => context.backpatch.push(Marker::WhileBody { start, exit }),
        Marker::ForBound { slot, recheck } => context.backpatch.push(Marker::ForBody {
            slot,
            recheck,
            exit,
        }),
        _ => {}
    }

    Ok(())
}

pub fn word_od(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    let Some((start, exit)) = context.backpatch.pop_with(|marker| match marker {
        Marker::WhileBody { start, exit } => Some((*start, *exit)),
        _ => None,
    }) else {
        return context.compile_error_str("'OD' without 'WHILE' ... 'DO'");
    };

    context.flush(1)?;

    let _ = context.emit(Op::Jp, Cell::Index(start));
    let here = context.here();

    context.patch(exit, here)
}

/// `FOR w = e1`: the loop variable is declared like any other variable.
pub fn word_for(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let slot = declare_variable(interpreter, "FOR")?;

    interpreter
        .context_mut()
        .backpatch
        .push(Marker::ForVariable { slot });

    Ok(())
}

/// `TO e2`: the bound test is re-evaluated on every iteration.  The comparison is left pending so
/// that it is emitted after the bound expression.
pub fn word_to(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    let Some(slot) = context.backpatch.pop_with(|marker| match marker {
        Marker::ForVariable { slot } => Some(*slot),
        _ => None,
    }) else {
        return context.compile_error_str("'TO' without 'FOR'");
    };

    context.flush(1)?;

    let recheck = context.here();

    let _ = context.emit(Op::VPush, Cell::Index(slot));
    context.defer(50, Op::Lt, Cell::nil())?;
    context.backpatch.push(Marker::ForBound { slot, recheck });

    Ok(())
}

pub fn word_next(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let context = interpreter.context_mut();

    let Some((slot, recheck, exit)) = context.backpatch.pop_with(|marker| match marker {
        Marker::ForBody {
            slot,
            recheck,
            exit,
        } => Some((*slot, *recheck, *exit)),
        _ => None,
    }) else {
        return context.compile_error_str("'NEXT' without 'FOR' ... 'DO'");
    };

    context.flush(1)?;

    let _ = context.emit(Op::VIncr, Cell::Index(slot));
    let _ = context.emit(Op::Jp, Cell::Index(recheck));
    let here = context.here();

    context.patch(exit, here)
}

pub fn register_control_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "IF", 0, Directive::If);
    add_native_word!(interpreter, "THEN", 0, Directive::Then);
    add_native_word!(interpreter, "ELIF", 0, Directive::Elif);
    add_native_word!(interpreter, "ELSE", 0, Directive::Else);
    add_native_word!(interpreter, "FI", 0, Directive::Fi);

    add_native_word!(interpreter, "WHILE", 0, Directive::While);
    add_native_word!(interpreter, "DO", 0, Directive::Do);
    add_native_word!(interpreter, "OD", 0, Directive::Od);

    add_native_word!(interpreter, "FOR", 0, Directive::For);
    add_native_word!(interpreter, "TO", 0, Directive::To);
    add_native_word!(interpreter, "NEXT", 0, Directive::Next);
}
