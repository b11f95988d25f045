// Properties of the compiler: the pending and backpatch stacks, scopes, error reporting and
// INCLUDE.

mod common;

use common::{interpreter, interpreter_with};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{fs, path::PathBuf};
use test_case::test_case;
use wtf::{
    lang::{
        code::{Op, Routine, pretty_print_code},
        compilation::Group,
    },
    runtime::{
        data_structures::cell::Cell,
        error::ErrorKind,
        interpreter::{CodeManagement, InterpreterConfig, InterpreterStack, WordManagement},
    },
};

const OPERATORS: [Op; 6] = [Op::Add, Op::Mul, Op::Lt, Op::And, Op::Print, Op::Neg];

#[test]
fn pending_priorities_always_increase() {
    let (mut interpreter, _) = interpreter();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..2000 {
        let priority = rng.gen_range(1..=255);
        let op = OPERATORS[rng.gen_range(0..OPERATORS.len())];

        interpreter
            .compile(priority, op.into(), Cell::nil())
            .unwrap();

        let priorities: Vec<u8> = interpreter
            .context()
            .pending
            .priorities()
            .into_iter()
            .flatten()
            .collect();

        assert!(priorities.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", priorities);
    }
}

#[test]
fn groups_start_a_new_run_of_priorities() {
    let (mut interpreter, _) = interpreter();
    let context = interpreter.context_mut();

    context.defer(100, Op::Add, Cell::nil()).unwrap();
    context.open_group(Group::Paren);
    context.defer(60, Op::Or, Cell::nil()).unwrap();
    context.defer(110, Op::Mul, Cell::nil()).unwrap();

    assert_eq!(
        context.pending.priorities(),
        vec![Some(100), None, Some(60), Some(110)]
    );
    assert!(context.pending.is_monotonic());

    context.close_group(Group::Paren).unwrap();

    assert_eq!(context.pending.priorities(), vec![Some(100)]);

    let ops: Vec<Op> = context
        .code()
        .borrow()
        .instructions()
        .iter()
        .map(|instruction| instruction.op)
        .collect();

    assert_eq!(ops, vec![Op::Mul, Op::Or]);
}

#[test]
fn well_formed_programs_leave_no_markers() {
    let source = "DEF n = 3\n\
                  PROC count\n\
                  FOR i = 0 TO n DO\n\
                  IF i = 1 THEN PRINT \"one\" ELSE PRINT i FI\n\
                  NEXT\n\
                  END\n\
                  WHILE n > 0 DO LET n = n - 1 OD\n\
                  count\n";

    let (mut interpreter, _) = interpreter();
    let report = interpreter.compile_source("<test>", source).unwrap();

    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert!(interpreter.context().backpatch.is_empty());
    assert!(interpreter.context().pending.is_empty());
}

#[test_case("IF 1 THEN PRINT 1\n", "'IF' without 'FI'"; "if")]
#[test_case("WHILE 1 DO PRINT 1\n", "'WHILE' without 'OD'"; "while")]
#[test_case("FOR i = 0 TO 3 DO PRINT i\n", "'FOR' without 'NEXT'"; "for")]
#[test_case("PROC p\nPRINT 1\n", "'PROC p' without 'END'"; "proc")]
#[test_case("FUNC f\n1\n", "'FUNC f' without 'END'"; "func")]
#[test_case("OD\n", "'OD' without 'WHILE' ... 'DO'"; "od without while")]
#[test_case("NEXT\n", "'NEXT' without 'FOR' ... 'DO'"; "next without for")]
#[test_case("THEN\n", "'THEN' without 'IF'"; "then without if")]
#[test_case("FI\n", "'FI' without 'THEN'/'ELSE'"; "fi without if")]
#[test_case("END\n", "'END' without 'PROC'/'FUNC'/'CMD'"; "end without block")]
#[test_case("WHILE 1 DO PRINT 1 NEXT\nOD\n", "'NEXT' without 'FOR' ... 'DO'"; "crossed loop closers")]
#[test_case("PRINT (1 + 2\n", "Unmatched '('"; "open paren")]
#[test_case("PRINT 1 + 2)\n", "Unmatched ')'"; "close paren")]
#[test_case("DEF x 1\n", "'=' expected"; "missing equals")]
#[test_case("LET y = 1\n", "Unknown variable y"; "let of undeclared")]
#[test_case("DEF\n", "Missing name after 'DEF'"; "missing name")]
fn malformed_programs_report_one_error(source: &str, message: &str) {
    let (mut interpreter, _) = interpreter();
    let report = interpreter.compile_source("<test>", source).unwrap();

    assert_eq!(report.errors, 1, "{:?}", report.diagnostics);
    assert_eq!(report.diagnostics[0].kind(), ErrorKind::Compile);
    assert_eq!(report.diagnostics[0].error(), message);
    assert!(interpreter.context().backpatch.is_empty());
}

#[test]
fn unclosed_blocks_give_the_top_level_back() {
    let (mut interpreter, output) = interpreter();
    let before = interpreter.dictionary().len();

    let report = interpreter
        .compile_source("<test>", "PROC p\nDEF x = 1\n")
        .unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(interpreter.dictionary().len(), before + 1);
    assert!(interpreter.find_word("x").is_none());

    let report = interpreter.run_source("<test>", "PRINT 5\n").unwrap();

    assert!(report.is_clean());
    assert_eq!(output.lines(), vec!["5"]);
}

#[test]
fn end_forgets_the_block_locals() {
    let (mut interpreter, _) = interpreter();
    let before = interpreter.dictionary().len();

    let report = interpreter
        .compile_source("<test>", "PROC p\nDEF x = 1\nSTACK s\nEND\n")
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(interpreter.dictionary().len(), before + 1);
    assert!(interpreter.find_word("x").is_none());
    assert!(interpreter.find_word("s").is_none());

    let (priority, routine, _) = interpreter.find_word("p").unwrap();

    assert_eq!(priority, 10);
    assert_eq!(routine, Routine::Op(Op::Call));
}

#[test]
fn locals_shadow_and_then_uncover_outer_words() {
    let source = "DEF x = 1\n\
                  PROC p\n\
                  DEF x = 2\n\
                  PRINT x\n\
                  END\n\
                  p\n\
                  PRINT x\n";

    let (mut interpreter, output) = interpreter();
    let report = interpreter.run_source("<test>", source).unwrap();

    assert!(report.is_clean());
    assert_eq!(output.lines(), vec!["2", "1"]);
}

#[test]
fn unknown_words_are_counted_and_compilation_goes_on() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter
        .compile_source("<test>", "foo\nPRINT 1\nbar baz\n")
        .unwrap();

    assert_eq!(report.errors, 3);

    let messages: Vec<&String> = report.diagnostics.iter().map(|error| error.error()).collect();

    assert_eq!(messages, vec!["Unknown word foo", "Unknown word bar", "Unknown word baz"]);

    let location = report.diagnostics[1].location().clone().unwrap();

    assert_eq!((location.line(), location.column()), (3, 1));
}

#[test]
fn programs_with_errors_do_not_run() {
    let (mut interpreter, output) = interpreter();
    let report = interpreter
        .run_source("<test>", "PRINT 1\nnope\n")
        .unwrap();

    assert_eq!(report.errors, 1);
    assert!(output.text().is_empty());
}

#[test]
fn variables_can_be_listed_after_a_failed_compilation() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter
        .compile_source("<test>", "DEF x = 1\nSTACK s\nnope\n")
        .unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(interpreter.variables().to_string(), "0: NIL\n1: []\n");
}

#[test]
fn too_many_errors_is_fatal() {
    let (mut interpreter, _) = interpreter();
    let source = "oops ".repeat(150);
    let error = interpreter.compile_source("<test>", &source).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Fatal);
    assert_eq!(error.error(), "That makes 100 errors: I give up");
}

#[test]
fn error_budget_is_configurable() {
    let config = InterpreterConfig {
        max_errors: 3,
        ..InterpreterConfig::default()
    };
    let (mut interpreter, output) = interpreter_with(config);

    let error = interpreter.compile_source("<test>", "a b c d\n").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Fatal);
    assert_eq!(error.error(), "That makes 3 errors: I give up");

    // A fatal error leaves the compiler ready for the next source.
    let report = interpreter.compile_source("<test>", "PRINT 1\n").unwrap();

    assert!(report.is_clean());
    assert!(interpreter.context().pending.is_empty());
    assert!(output.text().is_empty());
}

#[test]
fn unterminated_string_is_a_lexical_error() {
    let (mut interpreter, _) = interpreter();
    let error = interpreter
        .compile_source("<test>", "PRINT \"never closed\n")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Lex);
    assert_eq!(error.error(), "End of file inside string");
}

#[test]
fn numbers_that_look_like_words_are_unknown() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter.compile_source("<test>", "PRINT inf\n").unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(report.diagnostics[0].error(), "Unknown word inf");
}

#[test]
fn jumps_are_resolved_to_instruction_addresses() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter
        .compile_source("<test>", "WHILE 0 DO PRINT 1 OD\n")
        .unwrap();

    assert!(report.is_clean());

    let code = interpreter.top_level().borrow();
    let ops: Vec<Op> = code.instructions().iter().map(|instruction| instruction.op).collect();

    assert_eq!(ops, vec![Op::Push, Op::Jpz, Op::Push, Op::Print, Op::Jp]);
    assert_eq!(code.get(1).unwrap().value, Cell::Index(5));
    assert_eq!(code.get(4).unwrap().value, Cell::Index(0));

    let listing = pretty_print_code(&code);

    assert_eq!(listing.lines().count(), 5);
    assert!(listing.lines().nth(3).unwrap().ends_with("PRINT"));
}

#[test]
fn dictionary_listing_starts_with_the_newest_word() {
    let (mut interpreter, _) = interpreter();

    interpreter.compile_source("<test>", "DEF answer = 42\n").unwrap();

    let listing = interpreter.dictionary().to_string();
    let mut lines = listing.lines();

    assert!(lines.next().unwrap().ends_with("words defined."));
    assert!(lines.next().unwrap().starts_with("answer"));
}

#[test]
fn commands_can_leave_values_for_the_compiler() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter
        .compile_source("<test>", "CMD seven\n7\nEND\nseven\n")
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(interpreter.stack().len(), 1);
    assert_eq!(interpreter.stack()[0], Cell::Number(7.0));
}

fn scratch_directory(name: &str) -> PathBuf {
    let directory = std::env::temp_dir().join(format!("wtf-{}-{}", name, std::process::id()));

    fs::create_dir_all(&directory).unwrap();
    directory
}

#[test]
fn include_compiles_a_file_in_place() {
    let directory = scratch_directory("include");
    let library = directory.join("twice.wtf");
    let main = directory.join("main.wtf");

    fs::write(&library, "PROC twice\nDEF v =\nPRINT v * 2\nEND\n").unwrap();
    fs::write(&main, "INCLUDE twice.wtf\ntwice(4)\ntwice(5)\n").unwrap();

    let (mut interpreter, output) = interpreter();
    let report = interpreter.compile_file(main.to_str().unwrap()).unwrap();

    assert!(report.is_clean(), "{:?}", report.diagnostics);

    interpreter.execute().unwrap();

    assert_eq!(output.lines(), vec!["8", "10"]);

    fs::remove_dir_all(&directory).unwrap();
}

#[test]
fn include_of_a_missing_file_is_a_compile_error() {
    let (mut interpreter, _) = interpreter();
    let report = interpreter
        .compile_source("<test>", "INCLUDE no-such-file.wtf\nPRINT 1\n")
        .unwrap();

    assert_eq!(report.errors, 1);
    assert!(report.diagnostics[0].error().starts_with("Cannot include no-such-file.wtf"));
}

#[test]
fn files_are_written_and_read_back() {
    let directory = scratch_directory("files");
    let path = directory.join("bytes.txt");
    let path = path.to_str().unwrap();

    let source = format!(
        "DEF f = FOPEN(\"{path}\" \"w\")\n\
         FPUT(f 65)\n\
         FPUT(f 66)\n\
         FCLOSE(f)\n\
         LET f = FOPEN(\"{path}\" \"r\")\n\
         PRINT FGET(f)\n\
         PRINT FGET(f)\n\
         PRINT FGET(f)\n\
         FCLOSE(f)\n"
    );

    let (mut interpreter, output) = interpreter();
    let report = interpreter.run_source("<test>", &source).unwrap();

    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert_eq!(output.lines(), vec!["65", "66", "-1"]);
    assert_eq!(fs::read_to_string(path).unwrap(), "AB");

    fs::remove_dir_all(&directory).unwrap();
}

#[test]
fn opening_a_missing_file_gives_nil() {
    let (mut interpreter, output) = interpreter();
    let report = interpreter
        .run_source("<test>", "PRINT FOPEN(\"/no/such/dir/file\" \"r\") = NIL\n")
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(output.lines(), vec!["1"]);
}

#[test]
fn invalid_file_mode_is_a_runtime_error() {
    let (mut interpreter, _) = interpreter();
    let error = interpreter
        .run_source("<test>", "DEF f = FOPEN(\"x\" \"rw\")\n")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Runtime);
    assert_eq!(error.error(), "Invalid file mode \"rw\"");
}
