use std::{ io::{ self,
                 Write },
           path::Path,
           rc::Rc };
use rand::{ rngs::StdRng,
            Rng,
            SeedableRng };
use tracing::{ debug,
               trace,
               warn };
use crate::{ lang::{ code::{ CodeStream,
                             Op,
                             Routine },
                     compilation::{ new_top_level,
                                    CodeConstructor,
                                    CompileReport },
                     source_buffer::SourceLocation,
                     tokenizing::{ to_numeric,
                                   Scanner,
                                   Word } },
             runtime::{ built_ins::{ io_words::FileTable,
                                     register_builtin_words,
                                     routine_handler },
                        data_structures::{ cell::Cell,
                                           cell_stack::CellStackPtr,
                                           dictionary::Dictionary,
                                           variable_store::VariableStore },
                        error::{ self,
                                 script_error_str,
                                 ErrorKind,
                                 ScriptError },
                        interpreter::{ CallItem,
                                       CallStack,
                                       CellStackVec,
                                       CodeExecution,
                                       CodeManagement,
                                       Environment,
                                       Interpreter,
                                       InterpreterConfig,
                                       InterpreterStack,
                                       ReturnFrame,
                                       WordManagement } } };



/// The WTF interpreter: a dictionary, a compiler driven by it and the threaded code virtual
/// machine that runs what was compiled.
pub struct WtfInterpreter
{
    config: InterpreterConfig,

    /// The data stack shared by every operation.
    stack: CellStackVec,

    /// The dictionary of words known by the interpreter.
    dictionary: Dictionary,

    /// Every variable declared so far.
    variables: VariableStore,


    /// Top level code accumulates here, across compilations.
    top_level: CodeStream,

    /// The compiler's state.
    constructor: CodeConstructor,


    /// The code stream being executed.
    code: CodeStream,

    /// Address of the next instruction to execute, None while the executor is idle.
    ip: Option<usize>,

    /// Saved callers, innermost last.
    return_stack: Vec<ReturnFrame>,

    /// Return stack depth the current run started at.  Running off the end of a code stream, or
    /// returning, at this depth ends the run.
    base_depth: usize,


    /// Where PRINT writes.
    output: Box<dyn Write>,

    /// Generator behind RAND.
    rng: StdRng,

    /// Files opened by FOPEN.
    files: FileTable
}


impl Interpreter for WtfInterpreter
{
    fn reset(&mut self) -> error::Result<()>
    {
        self.files.close_all()?;

        let output = std::mem::replace(&mut self.output, Box::new(io::sink()));
        *self = WtfInterpreter::with_output(self.config.clone(), output);

        Ok(())
    }
}


impl InterpreterStack for WtfInterpreter
{
    fn stack(&self) -> &CellStackVec
    {
        &self.stack
    }

    fn push(&mut self, value: Cell)
    {
        self.stack.push(value);
    }

    fn pop(&mut self) -> error::Result<Cell>
    {
        match self.stack.pop()
        {
            Some(value) => Ok(value),
            None => script_error_str(self, "Missing value (stack underflow)")
        }
    }

    fn pop_as_number(&mut self) -> error::Result<f64>
    {
        let value = self.pop()?;
        value.as_number(self)
    }

    fn pop_as_bool(&mut self) -> error::Result<bool>
    {
        let value = self.pop()?;
        value.as_bool(self)
    }

    fn pop_as_integer(&mut self) -> error::Result<i64>
    {
        let value = self.pop()?;
        value.as_integer(self)
    }

    fn pop_as_text(&mut self) -> error::Result<Rc<str>>
    {
        let value = self.pop()?;
        value.as_text(self)
    }

    fn pop_as_stack(&mut self) -> error::Result<CellStackPtr>
    {
        let value = self.pop()?;
        value.as_stack(self)
    }

    fn pop_as_file(&mut self) -> error::Result<usize>
    {
        let value = self.pop()?;
        value.as_file(self)
    }
}


impl CodeManagement for WtfInterpreter
{
    fn context(&self) -> &CodeConstructor
    {
        &self.constructor
    }

    fn context_mut(&mut self) -> &mut CodeConstructor
    {
        &mut self.constructor
    }

    fn compile(&mut self, priority: u8, routine: Routine, value: Cell) -> error::Result<()>
    {
        match ( priority, routine )
        {
            ( 0, routine ) => self.invoke(routine, &value),

            ( 255, Routine::Op(op) ) =>
                {
                    let _ = self.constructor.emit(op, value);
                    Ok(())
                },

            ( _, Routine::Op(op) ) => self.constructor.defer(priority, op, value),

            ( _, Routine::Directive(directive) ) =>
                self.constructor.compile_error(format!("{} can only run while compiling",
                                                       directive))
        }
    }

    fn include_file(&mut self, path: &str) -> error::Result<()>
    {
        let relative = self.constructor
                           .source_path()
                           .and_then(|including| Path::new(including).parent())
                           .map(|directory| directory.join(path))
                           .filter(|candidate| candidate.exists());

        let full_path = match relative
            {
                Some(candidate) => candidate.to_string_lossy().to_string(),
                None => path.to_string()
            };

        match Scanner::from_file(&full_path)
        {
            Ok(scanner) =>
                {
                    debug!(path = %full_path, depth = self.constructor.scanner_depth(), "including");
                    self.constructor.push_scanner(scanner);
                    Ok(())
                },

            Err(error) => self.constructor.compile_error(format!("Cannot include {}: {}",
                                                                 path,
                                                                 error.error()))
        }
    }

    fn process_source_file(&mut self, path: &str) -> error::Result<CompileReport>
    {
        let scanner = Scanner::from_file(path)?;
        self.compile_from(scanner)
    }

    fn process_source(&mut self, path: &str, source: &str) -> error::Result<CompileReport>
    {
        self.compile_from(Scanner::from_source(path, source))
    }

    fn top_level(&self) -> &CodeStream
    {
        &self.top_level
    }
}


impl WordManagement for WtfInterpreter
{
    fn dictionary(&self) -> &Dictionary
    {
        &self.dictionary
    }

    fn dictionary_mut(&mut self) -> &mut Dictionary
    {
        &mut self.dictionary
    }

    fn variables(&self) -> &VariableStore
    {
        &self.variables
    }

    fn variables_mut(&mut self) -> &mut VariableStore
    {
        &mut self.variables
    }
}


impl CodeExecution for WtfInterpreter
{
    fn execute_code(&mut self, code: &CodeStream) -> error::Result<()>
    {
        debug!(code = %code.borrow().name(), length = code.borrow().len(), "executing");

        self.code = code.clone();
        self.ip = Some(0);
        self.return_stack.clear();
        self.base_depth = 0;

        let result = self.run();

        self.ip = None;
        self.return_stack.clear();

        debug!(ok = result.is_ok(), stack_depth = self.stack.len(), "execution finished");

        result
    }

    fn execute_nested(&mut self, code: CodeStream) -> error::Result<()>
    {
        trace!(code = %code.borrow().name(), "running command");

        let saved_code = std::mem::replace(&mut self.code, code);
        let saved_ip = self.ip.replace(0);
        let saved_base = self.base_depth;

        self.base_depth = self.return_stack.len();

        let result = self.run();

        self.return_stack.truncate(self.base_depth);
        self.base_depth = saved_base;
        self.code = saved_code;
        self.ip = saved_ip;

        result
    }

    fn invoke(&mut self, routine: Routine, value: &Cell) -> error::Result<()>
    {
        let handler = routine_handler(routine);
        handler(self, value)
    }

    fn call(&mut self, code: CodeStream)
    {
        let caller = std::mem::replace(&mut self.code, code);

        self.return_stack.push(ReturnFrame { code: caller, ip: self.ip.unwrap_or_default() });
        self.ip = Some(0);
    }

    fn ret(&mut self)
    {
        let frame = if self.return_stack.len() > self.base_depth
            {
                self.return_stack.pop()
            }
            else
            {
                None
            };

        match frame
        {
            Some(frame) =>
                {
                    self.code = frame.code;
                    self.ip = Some(frame.ip);
                },

            None => self.ip = None
        }
    }

    fn jump(&mut self, address: usize)
    {
        self.ip = Some(address);
    }

    fn is_executing(&self) -> bool
    {
        self.ip.is_some()
    }

    fn return_depth(&self) -> usize
    {
        self.return_stack.len()
    }

    fn current_location(&self) -> Option<SourceLocation>
    {
        match self.ip
        {
            Some(ip) if ip > 0 => self.code
                                      .borrow()
                                      .get(ip - 1)
                                      .and_then(|instruction| instruction.location.clone()),
            Some(_) => None,
            None => self.constructor.location()
        }
    }

    fn call_stack(&self) -> CallStack
    {
        let mut call_stack: CallStack = self.return_stack
                                            .iter()
                                            .map(|frame| call_item(&frame.code, frame.ip))
                                            .collect();

        if let Some(ip) = self.ip
        {
            call_stack.push(call_item(&self.code, ip));
        }

        call_stack
    }
}


/// Describe the instruction just before `ip`: the call for a saved frame, or the instruction
/// executing for the active one.
fn call_item(code: &CodeStream, ip: usize) -> CallItem
{
    let code = code.borrow();
    let address = ip.saturating_sub(1);
    let location = code.get(address).and_then(|instruction| instruction.location.clone());

    CallItem::new(code.name().clone(), address, location)
}


impl Environment for WtfInterpreter
{
    fn output(&mut self) -> &mut dyn Write
    {
        self.output.as_mut()
    }

    fn random(&mut self) -> f64
    {
        self.rng.r#gen::<f64>()
    }

    fn files_mut(&mut self) -> &mut FileTable
    {
        &mut self.files
    }
}


impl WtfInterpreter
{
    /// Create an interpreter with the default configuration, printing to stdout.
    pub fn new() -> WtfInterpreter
    {
        WtfInterpreter::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> WtfInterpreter
    {
        WtfInterpreter::with_output(config, Box::new(io::stdout()))
    }

    /// Create an interpreter that prints to the given writer.  All built-in words are registered.
    pub fn with_output(config: InterpreterConfig, output: Box<dyn Write>) -> WtfInterpreter
    {
        let top_level = new_top_level();
        let rng = StdRng::seed_from_u64(config.seed);

        let mut interpreter = WtfInterpreter
            {
                config,

                stack: Vec::with_capacity(20),

                dictionary: Dictionary::new(),
                variables: VariableStore::new(),

                top_level: top_level.clone(),
                constructor: CodeConstructor::new(top_level.clone()),

                code: top_level,
                ip: None,
                return_stack: Vec::with_capacity(40),
                base_depth: 0,

                output,
                rng,
                files: FileTable::new()
            };

        register_builtin_words(&mut interpreter);

        interpreter
    }

    pub fn config(&self) -> &InterpreterConfig
    {
        &self.config
    }

    /// Compile source code into the top level code stream.  Compile errors are gathered in the
    /// report, anything else is returned as the error.
    pub fn compile_source(&mut self, path: &str, source: &str) -> error::Result<CompileReport>
    {
        self.process_source(path, source)
    }

    pub fn compile_file(&mut self, path: &str) -> error::Result<CompileReport>
    {
        self.process_source_file(path)
    }

    /// Run the top level code from its start.
    pub fn execute(&mut self) -> error::Result<()>
    {
        let top_level = self.top_level.clone();
        let result = self.execute_code(&top_level);

        self.output.flush()?;

        result
    }

    /// Compile, then run only if compilation reported no errors.
    pub fn run_source(&mut self, path: &str, source: &str) -> error::Result<CompileReport>
    {
        let report = self.compile_source(path, source)?;

        if report.is_clean()
        {
            self.execute()?;
        }

        Ok(report)
    }

    /// Run the executor until it goes idle.  Running past the end of a code stream returns to the
    /// caller, or ends the run at the base depth.
    fn run(&mut self) -> error::Result<()>
    {
        while let Some(ip) = self.ip
        {
            let instruction = self.code.borrow().get(ip).cloned();

            match instruction
            {
                Some(instruction) =>
                    {
                        self.ip = Some(ip + 1);

                        let handler = routine_handler(Routine::Op(instruction.op));

                        handler(self, &instruction.value)
                            .map_err(|error| error.with_location(instruction.location.clone()))?;
                    },

                None => self.ret()
            }
        }

        Ok(())
    }

    fn compile_from(&mut self, scanner: Scanner) -> error::Result<CompileReport>
    {
        debug!(path = %scanner.path(), "compiling");

        self.constructor.begin(scanner, self.top_level.clone());

        match self.compile_words()
        {
            Ok(scanned) =>
                {
                    let report = self.constructor.take_report();

                    debug!(words = scanned,
                           code_length = self.top_level.borrow().len(),
                           errors = report.errors,
                           "compilation finished");

                    Ok(report)
                },

            Err(error) =>
                {
                    let top_level = self.top_level.clone();
                    self.constructor.reset(top_level);

                    Err(error)
                }
        }
    }

    /// The resolution loop: every word is looked up and dispatched, words the dictionary doesn't
    /// know must be numbers.  Returns how many words were compiled.
    fn compile_words(&mut self) -> error::Result<usize>
    {
        let mut scanned = 0;

        loop
        {
            let Some(word) = self.constructor.next_word()
            else
            {
                if self.constructor.scanner_depth() > 1
                {
                    let _ = self.constructor.pop_scanner();
                    self.constructor.set_location(None);

                    let result = self.constructor.flush(0);
                    self.recover(result)?;

                    continue;
                }

                break;
            };

            scanned += 1;
            self.constructor.set_location(Some(word.location().clone()));

            let result = self.compile_word(&word);
            self.recover(result)?;
        }

        self.constructor.set_location(None);

        let result = self.constructor.flush(0);
        self.recover(result)?;

        let ( messages, block ) = self.constructor.unwind_backpatch();

        if let Some(block) = block
        {
            let _ = self.constructor.switch_code(block.outer);
            self.dictionary.truncate(block.mark);
        }

        for message in messages
        {
            let result = self.constructor.compile_error(message);
            self.recover(result)?;
        }

        let _ = self.constructor.pop_scanner();

        Ok(scanned)
    }

    fn compile_word(&mut self, word: &Word) -> error::Result<()>
    {
        trace!(word = %word, "compiling word");

        match self.find_word(word.text())
        {
            Some(( priority, routine, value )) => self.compile(priority, routine, value),

            None =>
                match to_numeric(word.text())
                {
                    Some(number) => self.compile(255, Op::Push.into(), Cell::Number(number)),
                    None => self.constructor.compile_error(format!("Unknown word {}", word))
                }
        }
    }

    /// Compile errors are counted and compilation goes on, until the error budget runs out.  Any
    /// other error stops compilation.
    fn recover(&mut self, result: error::Result<()>) -> error::Result<()>
    {
        match result
        {
            Err(error) if error.is_recoverable() =>
                {
                    warn!("{}", error);

                    self.constructor.errors += 1;
                    self.constructor.diagnostics.push(error);

                    if self.constructor.errors >= self.config.max_errors
                    {
                        return ScriptError::new_as_result(ErrorKind::Fatal,
                                                          self.constructor.location(),
                                                          format!("That makes {} errors: I give up",
                                                                  self.constructor.errors),
                                                          None);
                    }

                    Ok(())
                },

            other => other
        }
    }
}


impl Default for WtfInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}

