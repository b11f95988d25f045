use crate::{
    add_native_word,
    lang::code::Op,
    runtime::{
        data_structures::cell::{Address, Cell, to_integer},
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use std::{
    fs::{File, OpenOptions},
    io::{self, BufReader, BufWriter, Read, Write},
};
use tracing::debug;

/// A file opened by FOPEN, for reading or for writing.
pub enum OpenFile {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// The files opened by the program.  A handle is a position in the table and is never reused, so
/// a stale handle can't reach a file opened later.
#[derive(Default)]
pub struct FileTable {
    files: Vec<Option<OpenFile>>,
}

impl FileTable {
    pub fn new() -> FileTable {
        FileTable { files: Vec::new() }
    }

    /// Open a file in mode `r`, `w` (create or truncate) or `a` (create or append).
    pub fn open(&mut self, path: &str, mode: &str) -> io::Result<usize> {
        let file = match mode_to_options(mode) {
            Some(options) => options.open(path)?,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid file mode {:?}", mode),
                ));
            }
        };

        let file = if mode == "r" {
            OpenFile::Reader(BufReader::new(file))
        } else {
            OpenFile::Writer(BufWriter::new(file))
        };

        self.files.push(Some(file));

        Ok(self.files.len() - 1)
    }

    pub fn get_mut(&mut self, handle: usize) -> Option<&mut OpenFile> {
        self.files.get_mut(handle).and_then(|file| file.as_mut())
    }

    /// Close a file, flushing whatever was written to it.  None if the handle isn't open.
    pub fn close(&mut self, handle: usize) -> Option<io::Result<()>> {
        let file = self.files.get_mut(handle)?.take()?;

        Some(match file {
            OpenFile::Reader(_) => Ok(()),
            OpenFile::Writer(mut writer) => writer.flush(),
        })
    }

    /// Flush and close everything still open.
    pub fn close_all(&mut self) -> io::Result<()> {
        for handle in 0..self.files.len() {
            if let Some(result) = self.close(handle) {
                result?;
            }
        }

        Ok(())
    }
}

fn mode_to_options(mode: &str) -> Option<OpenOptions> {
    let mut options = OpenOptions::new();

    match mode {
        "r" => options.read(true),
        "w" => options.write(true).create(true).truncate(true),
        "a" => options.append(true).create(true),
        _ => return None,
    };

    Some(options)
}

/// Write the top of the stack followed by a new line.
pub fn word_print(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let value = interpreter.pop()?;

    writeln!(interpreter.output(), "{}", value)?;

    Ok(())
}

/// `FOPEN(name mode)` pushes a handle, or NIL when the file can't be opened.
pub fn word_fopen(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let mode = interpreter.pop_as_text()?;
    let path = interpreter.pop_as_text()?;

    if mode_to_options(&mode).is_none() {
        return script_error(interpreter, format!("Invalid file mode \"{}\"", mode));
    }

    match interpreter.files_mut().open(&path, &mode) {
        Ok(handle) => {
            debug!(%path, %mode, handle, "file opened");
            interpreter.push(Cell::Address(Address::File(handle)));
        }

        Err(error) => {
            debug!(%path, %mode, %error, "file not opened");
            interpreter.push(Cell::nil());
        }
    }

    Ok(())
}

/// `FCLOSE(f)`
pub fn word_fclose(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let handle = interpreter.pop_as_file()?;

    match interpreter.files_mut().close(handle) {
        Some(Ok(())) => Ok(()),
        Some(Err(error)) => script_error(interpreter, format!("I/O error closing a file: {}", error)),
        None => script_error(interpreter, format!("File {} is not open", handle)),
    }
}

enum Transfer {
    Done(Option<u8>),
    NotOpen,
    WrongMode,
    Failed(io::Error),
}

/// `FGET(f)` pushes the next byte's code, or -1 at the end of the file.
pub fn word_fget(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let handle = interpreter.pop_as_file()?;

    let transfer = match interpreter.files_mut().get_mut(handle) {
        Some(OpenFile::Reader(reader)) => {
            let mut buffer = [0; 1];

            match reader.read(&mut buffer) {
                Ok(0) => Transfer::Done(None),
                Ok(_) => Transfer::Done(Some(buffer[0])),
                Err(error) => Transfer::Failed(error),
            }
        }

        Some(OpenFile::Writer(_)) => Transfer::WrongMode,
        None => Transfer::NotOpen,
    };

    match transfer {
        Transfer::Done(Some(byte)) => interpreter.push(Cell::Number(byte as f64)),
        Transfer::Done(None) => interpreter.push(Cell::Number(-1.0)),
        other => return transfer_error(interpreter, handle, other, "reading"),
    }

    Ok(())
}

/// `FPUT(f c)` writes the byte with code `c`.
pub fn word_fput(interpreter: &mut dyn Interpreter, _: &Cell) -> error::Result<()> {
    let code = interpreter.pop_as_number()?;
    let handle = interpreter.pop_as_file()?;

    let byte = match to_integer(code) {
        Some(code) if (0..=255).contains(&code) => code as u8,
        _ => return script_error(interpreter, format!("{} is not a byte", code)),
    };

    let transfer = match interpreter.files_mut().get_mut(handle) {
        Some(OpenFile::Writer(writer)) => match writer.write_all(&[byte]) {
            Ok(()) => Transfer::Done(Some(byte)),
            Err(error) => Transfer::Failed(error),
        },

        Some(OpenFile::Reader(_)) => Transfer::WrongMode,
        None => Transfer::NotOpen,
    };

    match transfer {
        Transfer::Done(_) => Ok(()),
        other => transfer_error(interpreter, handle, other, "writing"),
    }
}

fn transfer_error(
    interpreter: &mut dyn Interpreter,
    handle: usize,
    transfer: Transfer,
    action: &str,
) -> error::Result<()> {
    let message = match transfer {
        Transfer::NotOpen => format!("File {} is not open", handle),
        Transfer::WrongMode => format!("File {} is not open for {}", handle, action),
        Transfer::Failed(error) => format!("I/O error {} a file: {}", action, error),
        Transfer::Done(_) => return Ok(()),
    };

    script_error(interpreter, message)
}

pub fn register_io_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "PRINT", 10, Op::Print);

    add_native_word!(interpreter, "FOPEN", 200, Op::FOpen);
    add_native_word!(interpreter, "FCLOSE", 10, Op::FClose);
    add_native_word!(interpreter, "FGET", 200, Op::FGet);
    add_native_word!(interpreter, "FPUT", 10, Op::FPut);
}
