use crate::{
    add_native_word,
    lang::code::Op,
    runtime::{
        data_structures::cell::Cell,
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};

/// Pop two numbers, push the result of combining them.  The second operand is on top.
fn number_op(
    interpreter: &mut dyn Interpreter,
    op: fn(f64, f64) -> f64,
) -> error::Result<()> {
    let b = interpreter.pop_as_number()?;
    let a = interpreter.pop_as_number()?;

    interpreter.push(Cell::Number(op(a, b)));
    Ok(())
}

/// Pop two numbers, push 1 if the comparison holds and 0 otherwise.
fn compare_op(
    interpreter: &mut dyn Interpreter,
    op: fn(&f64, &f64) -> bool,
) -> error::Result<()> {
    let b = interpreter.pop_as_number()?;
    let a = interpreter.pop_as_number()?;

    interpreter.push(Cell::from(op(&a, &b)));
    Ok(())
}

/// Pop one number, push the result of applying `op` to it.
fn unary_op(interpreter: &mut dyn Interpreter, op: fn(f64) -> f64) -> error::Result<()> {
    let a = interpreter.pop_as_number()?;

    interpreter.push(Cell::Number(op(a)));
    Ok(())
}

pub fn word_add(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    number_op(interpreter, |a, b| a + b)
}

pub fn word_sub(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    number_op(interpreter, |a, b| a - b)
}

pub fn word_mul(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    number_op(interpreter, |a, b| a * b)
}

pub fn word_div(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let b = interpreter.pop_as_number()?;
    let a = interpreter.pop_as_number()?;

    if b == 0.0 {
        return script_error_str(interpreter, "Division by zero");
    }

    interpreter.push(Cell::Number(a / b));
    Ok(())
}

/// Raise to a power.  A result that is not finite although both operands are, such as a negative
/// number to a fractional power or zero to a negative one, is a domain error.
pub fn word_pow(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let exponent = interpreter.pop_as_number()?;
    let base = interpreter.pop_as_number()?;
    let result = base.powf(exponent);

    if !result.is_finite() && base.is_finite() && exponent.is_finite() {
        return script_error_str(interpreter, "Domain error in '**'");
    }

    interpreter.push(Cell::Number(result));
    Ok(())
}

pub fn word_neg(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    unary_op(interpreter, |a| -a)
}

pub fn word_abs(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    unary_op(interpreter, f64::abs)
}

/// Round to the nearest integer, ties to the even one.
pub fn word_round(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    unary_op(interpreter, f64::round_ties_even)
}

pub fn word_rand(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let value = interpreter.random();

    interpreter.push(Cell::Number(value));
    Ok(())
}

/// Equality works on any two cells.
pub fn word_eq(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(Cell::from(a == b));
    Ok(())
}

pub fn word_neq(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(Cell::from(a != b));
    Ok(())
}

pub fn word_lt(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    compare_op(interpreter, |a, b| a < b)
}

pub fn word_leq(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    compare_op(interpreter, |a, b| a <= b)
}

pub fn word_gt(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    compare_op(interpreter, |a, b| a > b)
}

pub fn word_geq(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    compare_op(interpreter, |a, b| a >= b)
}

/// Both operands are always popped, there's no short circuit.
pub fn word_and(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let b = interpreter.pop_as_bool()?;
    let a = interpreter.pop_as_bool()?;

    interpreter.push(Cell::from(a && b));
    Ok(())
}

pub fn word_or(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let b = interpreter.pop_as_bool()?;
    let a = interpreter.pop_as_bool()?;

    interpreter.push(Cell::from(a || b));
    Ok(())
}

pub fn word_not(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let a = interpreter.pop_as_bool()?;

    interpreter.push(Cell::from(!a));
    Ok(())
}

pub fn register_math_logic_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "+", 100, Op::Add);
    add_native_word!(interpreter, "-", 100, Op::Sub);
    add_native_word!(interpreter, "*", 110, Op::Mul);
    add_native_word!(interpreter, "/", 110, Op::Div);
    add_native_word!(interpreter, "NEG", 120, Op::Neg);
    add_native_word!(interpreter, "**", 130, Op::Pow);
    add_native_word!(interpreter, "ABS", 200, Op::Abs);
    add_native_word!(interpreter, "ROUND", 200, Op::Round);
    add_native_word!(interpreter, "RAND", 255, Op::Rand);

    add_native_word!(interpreter, "=", 90, Op::Eq);
    add_native_word!(interpreter, "<>", 90, Op::Neq);
    add_native_word!(interpreter, "<", 90, Op::Lt);
    add_native_word!(interpreter, "<=", 90, Op::Leq);
    add_native_word!(interpreter, ">", 90, Op::Gt);
    add_native_word!(interpreter, ">=", 90, Op::Geq);

    add_native_word!(interpreter, "NOT", 80, Op::Not);
    add_native_word!(interpreter, "AND", 70, Op::And);
    add_native_word!(interpreter, "OR", 60, Op::Or);
}
