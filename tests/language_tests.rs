// Whole programs, compiled and run, checked through what they print.

mod common;

use common::{interpreter, run, run_lines};
use test_case::test_case;
use wtf::runtime::{error::ErrorKind, interpreter::InterpreterStack};

#[test_case("PRINT 1 + 2 * 3 - 4\n", "3\n"; "multiplication binds tighter")]
#[test_case("PRINT (1 + 2) * 3\n", "9\n"; "parentheses group")]
#[test_case("PRINT 10 - 4 - 3\n", "3\n"; "subtraction is left associative")]
#[test_case("PRINT 2 ** 10\n", "1024\n"; "power")]
#[test_case("PRINT 2 ** 3 ** 2\n", "64\n"; "power is left associative")]
#[test_case("PRINT NEG 3 + 5\n", "2\n"; "negation binds tighter than addition")]
#[test_case("PRINT ABS(NEG 4)\n", "4\n"; "absolute value")]
#[test_case("PRINT 7 / 2\n", "3.5\n"; "fractions print as decimals")]
#[test_case("PRINT ROUND(2.5)\n", "2\n"; "round half to even down")]
#[test_case("PRINT ROUND(3.5)\n", "4\n"; "round half to even up")]
#[test_case("PRINT 1 < 2 AND 2 < 3\n", "1\n"; "comparisons bind tighter than and")]
#[test_case("PRINT 1 > 2 OR 2 >= 2\n", "1\n"; "or")]
#[test_case("PRINT NOT 0\n", "1\n"; "not")]
#[test_case("PRINT 3 <> 3\n", "0\n"; "not equal")]
#[test_case("PRINT \"hello world\"\n", "hello world\n"; "string literal")]
#[test_case("PRINT \"a\" = \"a\"\n", "1\n"; "strings compare by content")]
#[test_case("PRINT NIL\n", "NIL\n"; "nil")]
#[test_case("PRINT 1 \\ a comment\nPRINT 2\n", "1\n2\n"; "comment ends at the new line")]
fn expressions(source: &str, expected: &str) {
    assert_eq!(run(source), expected);
}

#[test]
fn precedence_leaves_the_data_stack_empty() {
    let (mut interpreter, output) = interpreter();
    let report = interpreter
        .run_source("<test>", "PRINT 1 + 2 * 3 - 4\n")
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(output.lines(), vec!["3"]);
    assert!(interpreter.stack().is_empty());
}

#[test]
fn for_loop_bound_is_exclusive() {
    let (mut interpreter, output) = interpreter();
    let report = interpreter
        .run_source("<test>", "FOR i = 0 TO 3 DO PRINT i NEXT\n")
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(output.lines(), vec!["0", "1", "2"]);
    assert!(interpreter.stack().is_empty());
}

#[test]
fn for_loop_with_equal_bounds_never_runs() {
    assert_eq!(run_lines("FOR i = 3 TO 3 DO PRINT i NEXT\nPRINT 9\n"), vec!["9"]);
}

#[test]
fn nested_for_loops() {
    let source = "FOR i = 0 TO 2 DO FOR j = 0 TO 2 DO PRINT i * 10 + j NEXT NEXT\n";

    assert_eq!(run_lines(source), vec!["0", "1", "10", "11"]);
}

#[test]
fn while_loop() {
    let source = "DEF i = 0\n\
                  WHILE i < 3 DO\n\
                  PRINT i\n\
                  LET i = i + 1\n\
                  OD\n";

    assert_eq!(run_lines(source), vec!["0", "1", "2"]);
}

#[test_case(1, "1"; "first branch")]
#[test_case(2, "2"; "elif branch")]
#[test_case(3, "0"; "else branch")]
fn conditional_selects_one_branch(x: i32, expected: &str) {
    let source = format!(
        "DEF x = {}\nIF x = 1 THEN PRINT 1 ELIF x = 2 THEN PRINT 2 ELSE PRINT 0 FI\n",
        x
    );

    assert_eq!(run_lines(&source), vec![expected]);
}

#[test]
fn conditional_without_else_can_skip_everything() {
    assert_eq!(run_lines("IF 0 THEN PRINT 1 FI\nPRINT 2\n"), vec!["2"]);
}

#[test]
fn let_assigns_an_existing_variable() {
    assert_eq!(run_lines("DEF x = 1\nLET x = x * 10\nPRINT x\n"), vec!["10"]);
}

#[test]
fn stacks_push_pop_and_index() {
    let source = "STACK s\n\
                  PUSH(s 10)\n\
                  PUSH(s 20)\n\
                  PRINT LEN(s)\n\
                  PRINT s[0]\n\
                  PRINT s[-1]\n\
                  OF s = 0 5\n\
                  PRINT s[0]\n\
                  PRINT POP(s)\n\
                  PRINT TOS(s)\n\
                  PRINT s\n";

    assert_eq!(run_lines(source), vec!["2", "10", "20", "5", "20", "5", "[5]"]);
}

#[test]
fn stack_holding_itself_prints_without_looping() {
    let source = "STACK s\nPUSH(s s)\nPRINT LEN(s)\nPRINT s\n";

    assert_eq!(run_lines(source), vec!["1", "[[...]]"]);
}

#[test]
fn procedures_take_arguments_from_the_stack() {
    let source = "PROC show\n\
                  DEF v =\n\
                  PRINT v * 2\n\
                  END\n\
                  show(21)\n\
                  show(1)\n";

    assert_eq!(run_lines(source), vec!["42", "2"]);
}

#[test]
fn functions_leave_their_result() {
    let source = "FUNC square\n\
                  DEF v =\n\
                  v * v\n\
                  END\n\
                  PRINT square(3) + square(4)\n";

    assert_eq!(run_lines(source), vec!["25"]);
}

#[test]
fn tail_recursion_is_correct() {
    let source = "FUNC fact\n\
                  DEF n =\n\
                  IF n <= 1 THEN 1 ELSE n * fact(n - 1) FI\n\
                  END\n\
                  FOR k = 1 TO 7 DO PRINT fact(k) NEXT\n";

    assert_eq!(run_lines(source), vec!["1", "2", "6", "24", "120", "720"]);
}

// Locals have a single slot, so reading `n` after the recursive call sees the innermost value.
#[test]
fn non_tail_recursion_shares_the_local_slot() {
    let source = "FUNC fact\n\
                  DEF n =\n\
                  IF n <= 1 THEN 1 ELSE fact(n - 1) * n FI\n\
                  END\n\
                  PRINT fact(5)\n";

    assert_eq!(run_lines(source), vec!["1"]);
}

#[test]
fn commands_run_while_compiling() {
    let source = "CMD greet\n\
                  PRINT \"compiling\"\n\
                  END\n\
                  PRINT \"running\"\n\
                  greet\n";

    assert_eq!(run_lines(source), vec!["compiling", "running"]);
}

#[test]
fn procedures_can_call_procedures() {
    let source = "PROC inner\n\
                  PRINT \"inner\"\n\
                  END\n\
                  PROC outer\n\
                  inner\n\
                  PRINT \"outer\"\n\
                  END\n\
                  outer\n";

    assert_eq!(run_lines(source), vec!["inner", "outer"]);
}

#[test]
fn rand_is_repeatable_for_a_seed() {
    let first = run("PRINT RAND\nPRINT RAND\n");
    let second = run("PRINT RAND\nPRINT RAND\n");

    assert_eq!(first, second);

    for line in first.lines() {
        let value: f64 = line.parse().unwrap();
        assert!((0.0..1.0).contains(&value));
    }
}

#[test_case("PRINT 1 / 0\n", "Division by zero"; "division by zero")]
#[test_case("PRINT +\n", "Missing value (stack underflow)"; "stack underflow")]
#[test_case("PRINT (NEG 8) ** 0.5\n", "Domain error in '**'"; "power domain")]
#[test_case("STACK s\nPRINT POP(s)\n", "POP from an empty stack"; "pop empty stack")]
#[test_case("STACK s\nPRINT s[2]\n", "Index 2 out of range for a stack of 0"; "index out of range")]
#[test_case("PRINT 1 + \"a\"\n", "Expected a number, found a string"; "type mismatch")]
fn runtime_errors_stop_the_run(source: &str, message: &str) {
    let (mut interpreter, _) = interpreter();
    let error = interpreter.run_source("<test>", source).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Runtime);
    assert_eq!(error.error(), message);
    assert!(error.location().is_some());
}

#[test]
fn runtime_errors_halt_immediately() {
    let (mut interpreter, output) = interpreter();
    let result = interpreter.run_source("<test>", "PRINT 1\nPRINT 1 / 0\nPRINT 2\n");

    assert!(result.is_err());
    assert_eq!(output.lines(), vec!["1"]);
}

#[test]
fn runtime_errors_carry_the_call_stack() {
    let source = "PROC broken\n\
                  PRINT 1 / 0\n\
                  END\n\
                  broken\n";

    let (mut interpreter, _) = interpreter();
    let error = interpreter.run_source("<test>", source).unwrap_err();
    let call_stack = error.call_stack().clone().unwrap();

    assert_eq!(call_stack.len(), 2);
    assert_eq!(call_stack[0].word(), "<top>");
    assert_eq!(call_stack[1].word(), "broken");
}
