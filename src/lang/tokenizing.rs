use crate::{
    lang::source_buffer::{SourceBuffer, SourceLocation},
    runtime::error::{self, ErrorKind, ScriptError},
};
use lazy_static::lazy_static;
use std::{
    fmt::{self, Debug, Display, Formatter},
    fs::read_to_string,
};

/// How the scanner treats a given character.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CharClass {
    /// Separates words and is otherwise ignored.
    Blank,

    /// Part of a word.  Words are maximal runs of constituent characters.
    Constituent,

    /// A word all by itself, it never joins its neighbours.
    Special,
}

lazy_static! {
    /// Class of every character in the 8-bit range.  Codes 0 through 32 are blanks, except for the
    /// new line which ends statements and so must reach the compiler as a word of its own.
    static ref CHAR_CLASSES: [CharClass; 256] = {
        let mut classes = [CharClass::Constituent; 256];

        for class in classes.iter_mut().take(33) {
            *class = CharClass::Blank;
        }

        for special in ['\n', '"', '(', ')', '\\', '[', ']'] {
            classes[special as usize] = CharClass::Special;
        }

        classes
    };
}

/// Classify a character.  Anything outside of the 8-bit range is part of a word.
pub fn char_class(next: char) -> CharClass {
    let code = next as u32;

    if code < 256 {
        CHAR_CLASSES[code as usize]
    } else {
        CharClass::Constituent
    }
}

/// A word found in the source code along with where it was found.
#[derive(Clone, PartialEq, Eq)]
pub struct Word {
    location: SourceLocation,
    text: String,
}

impl Word {
    pub fn new(location: SourceLocation, text: String) -> Word {
        Word { location, text }
    }

    /// Where in the source the word starts.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The word's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Is this one of the self-delimiting single character words?
    pub fn is_special(&self) -> bool {
        let mut chars = self.text.chars();

        match (chars.next(), chars.next()) {
            (Some(only), None) => char_class(only) == CharClass::Special,
            _ => false,
        }
    }
}

/// Words print as their text, new lines are escaped so diagnostics stay on one line.
impl Display for Word {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.text.as_str() {
            "\n" => write!(f, "\\n"),
            text => write!(f, "{}", text),
        }
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self)
    }
}

/// Splits a source buffer into words.  The compiler pulls words one at a time and, for the words
/// that consume raw text such as string literals and comments, individual characters.
pub struct Scanner {
    buffer: SourceBuffer,
}

impl Scanner {
    /// Create a scanner over in memory source code.  The path is only used for locations.
    pub fn from_source(path: &str, source: &str) -> Scanner {
        Scanner {
            buffer: SourceBuffer::new(path, source),
        }
    }

    /// Load the code from a file and scan it.
    pub fn from_file(path: &str) -> error::Result<Scanner> {
        match read_to_string(path) {
            Ok(source) => Ok(Scanner::from_source(path, &source)),
            Err(error) => ScriptError::new_as_result(
                ErrorKind::Fatal,
                None,
                format!("Could not read file {}: {}", path, error),
                None,
            ),
        }
    }

    /// The path or tag of the source being scanned.
    pub fn path(&self) -> &String {
        self.buffer.location().path()
    }

    /// Where the scanner's cursor currently is.
    pub fn location(&self) -> &SourceLocation {
        self.buffer.location()
    }

    /// Get the next word, or None at the end of the source.  Blanks are skipped, a special
    /// character is returned on its own and anything else is collected until the first character
    /// that isn't a constituent.  That character is left in the buffer for the next call.
    pub fn next_word(&mut self) -> Option<Word> {
        while let Some(next) = self.buffer.peek_next() {
            match char_class(next) {
                CharClass::Blank => {
                    let _ = self.buffer.next_char();
                }

                CharClass::Special => {
                    let location = self.buffer.location().clone();
                    let _ = self.buffer.next_char();

                    return Some(Word::new(location, next.to_string()));
                }

                CharClass::Constituent => {
                    let location = self.buffer.location().clone();
                    let mut text = String::new();

                    while let Some(next) = self.buffer.peek_next()
                        && char_class(next) == CharClass::Constituent
                    {
                        text.push(next);
                        let _ = self.buffer.next_char();
                    }

                    return Some(Word::new(location, text));
                }
            }
        }

        None
    }

    /// Consume and return the next raw character.
    pub fn next_char(&mut self) -> Option<char> {
        self.buffer.next_char()
    }

    /// Skip the rest of the current line.  The new line itself is left in place so that it still
    /// ends the statement.
    pub fn skip_line(&mut self) {
        while let Some(next) = self.buffer.peek_next()
            && next != '\n'
        {
            let _ = self.buffer.next_char();
        }
    }

    /// Has the whole source been scanned?
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_exhausted()
    }
}

/// Attempt to read a word as a numeric literal: `3`, `-2.5`, `.5` and `1e3` all work.  Words such
/// as `inf` or `NaN` are left for the dictionary.
pub fn to_numeric(text: &str) -> Option<f64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);

    match digits.chars().next() {
        Some(first) if first.is_ascii_digit() || first == '.' => text.parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<String> {
        let mut scanner = Scanner::from_source("<test>", source);
        let mut found = Vec::new();

        while let Some(word) = scanner.next_word() {
            found.push(word.text().to_string());
        }

        found
    }

    #[test]
    fn special_characters_are_words_of_their_own() {
        assert_eq!(
            words("PRINT fact(n-1)\n"),
            vec!["PRINT", "fact", "(", "n-1", ")", "\n"]
        );
    }

    #[test]
    fn blanks_separate_words() {
        assert_eq!(words("  DEF\tx =  1  "), vec!["DEF", "x", "=", "1"]);
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let mut scanner = Scanner::from_source("<test>", "A\n  B");

        let a = scanner.next_word().unwrap();
        let newline = scanner.next_word().unwrap();
        let b = scanner.next_word().unwrap();

        assert_eq!((a.location().line(), a.location().column()), (1, 1));
        assert!(newline.is_special());
        assert_eq!((b.location().line(), b.location().column()), (2, 3));
    }

    #[test]
    fn skip_line_keeps_the_new_line() {
        let mut scanner = Scanner::from_source("<test>", "\\ a comment\nX");

        assert_eq!(scanner.next_word().unwrap().text(), "\\");
        scanner.skip_line();
        assert_eq!(scanner.next_word().unwrap().text(), "\n");
        assert_eq!(scanner.next_word().unwrap().text(), "X");
        assert!(scanner.next_word().is_none());
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(to_numeric("42"), Some(42.0));
        assert_eq!(to_numeric("-2.5"), Some(-2.5));
        assert_eq!(to_numeric("1e3"), Some(1000.0));
        assert_eq!(to_numeric("x1"), None);
        assert_eq!(to_numeric("inf"), None);
        assert_eq!(to_numeric("-NaN"), None);
        assert_eq!(to_numeric("-"), None);
    }
}
