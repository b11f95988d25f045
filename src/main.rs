use clap::Parser;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use wtf::{
    lang::code::pretty_print_code,
    runtime::{
        error::ScriptError,
        interpreter::{
            CodeManagement, InterpreterConfig, InterpreterStack, WordManagement,
            wtf_interpreter::WtfInterpreter,
        },
    },
};

/// Compile a WTF source file and, when it compiles cleanly, run it.
#[derive(Parser, Debug)]
#[command(name = "wtf", version, about)]
struct Args {
    /// The source file to run.
    source: String,

    /// Print the compiled top level code.
    #[arg(long = "dump-obj")]
    dump_obj: bool,

    /// Print the dictionary, newest words first.
    #[arg(long = "dump-dict")]
    dump_dict: bool,

    /// Print the variables and their values after compilation.
    #[arg(long = "dump-vars")]
    dump_vars: bool,

    /// Seed for RAND.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Give up compiling after this many errors.
    #[arg(long = "max-errors", default_value_t = 100)]
    max_errors: usize,
}

/// Logging goes to stderr so that it never mixes with what the program prints.  `RUST_LOG`
/// overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<bool, ScriptError> {
    let config = InterpreterConfig {
        max_errors: args.max_errors,
        seed: args.seed,
    };
    let mut interpreter = WtfInterpreter::with_config(config);

    let report = interpreter.compile_file(&args.source)?;

    for diagnostic in &report.diagnostics {
        eprintln!("{}", diagnostic);
    }

    if args.dump_obj {
        println!("{}", pretty_print_code(&interpreter.top_level().borrow()));
    }

    if args.dump_dict {
        println!("{}", interpreter.dictionary());
    }

    if args.dump_vars {
        println!("{}", interpreter.variables());
    }

    if !interpreter.stack().is_empty() {
        warn!(depth = interpreter.stack().len(), "values left on the stack by compilation");
    }

    if !report.is_clean() {
        eprintln!("{} errors: not running {}", report.errors, args.source);
        return Ok(false);
    }

    interpreter.execute()?;

    Ok(true)
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(script_error) => {
            eprintln!("{}", script_error);
            ExitCode::FAILURE
        }
    }
}
