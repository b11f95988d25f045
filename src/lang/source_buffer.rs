use std::{ fmt::{ self,
                  Display,
                  Formatter },
           hash::{ Hash,
                   Hasher } };



/// The location in the source code where a word was found.  This structure is used all over the
/// compiler to keep track where important things are found in the source code.  It is used
/// extensively in the error reporting, and compiled instructions carry one so that runtime errors
/// can point back at the word that produced them.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, PartialEq, PartialOrd, Eq, Debug)]
pub struct SourceLocation
{
    /// Either the path to the file or a description of the source code.  For example code compiled
    /// from memory by the tests will have a tag of "\<test\>".
    path: String,

    /// The 1 based line number in the source code where the word was found.
    line: usize,

    /// The 1 based column number in the source code where the word was found.
    column: usize
}


impl Hash for SourceLocation
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.path.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}


/// Used for error reporting to show where in the source code an error originated.  The format is
/// the classic `path:line:column` one so editors can jump to it.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{}:{}:{}", self.path, self.line, self.column)
    }
}


impl Default for SourceLocation
{
    fn default() -> Self
    {
        Self::new()
    }
}


impl SourceLocation
{
    /// Crate a new SourceLocation with default values.
    pub fn new() -> SourceLocation
    {
        SourceLocation { path: "unspecified".to_string(), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with the path to the source code.
    pub fn new_from_path(path: &str) -> Self
    {
        SourceLocation { path: path.to_owned(), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with all of the needed information.
    pub fn new_from_info(path: &str, line: usize, column: usize) -> Self
    {
        SourceLocation { path: path.to_owned(), line, column }
    }

    /// The path to the source code or a meaningful description of the source code.
    pub fn path(&self) -> &String
    {
        &self.path
    }

    /// The 1 based line number in the source code.
    pub fn line(&self) -> usize
    {
        self.line
    }

    /// The 1 based column number in the source code.
    pub fn column(&self) -> usize
    {
        self.column
    }
}



/// A buffer for processing source code.  This is used by the scanner to extract words from the
/// source code.  The buffer acts as a forward only iterator over the code with a single character
/// of push back.  As characters are consumed the location of the cursor in that source is
/// maintained.
///
/// Unlike a borrowed character iterator the buffer owns its text.  Included files are scanned by a
/// stack of buffers that outlive the call that opened them.
pub struct SourceBuffer
{
    /// The source code being processed.
    chars: Vec<char>,

    /// Index of the next character to hand out.
    position: usize,

    /// The logical location of the cursor in the source code.
    location: SourceLocation
}


impl SourceBuffer
{
    /// Create a new SourceBuffer with the path to, or meaningful tag for the source code and the
    /// source code itself.
    pub fn new(path: &str, source: &str) -> Self
    {
        SourceBuffer
            {
                chars: source.chars().collect(),
                position: 0,
                location: SourceLocation::new_from_path(path)
            }
    }

    /// The location the cursor is at in the source code being processed.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    /// Take a peek at the next character in the source code without consuming it.
    pub fn peek_next(&self) -> Option<char>
    {
        self.chars.get(self.position).copied()
    }

    /// Get and consume the next character in the source code.
    pub fn next_char(&mut self) -> Option<char>
    {
        let next = self.peek_next();

        if let Some(next_char) = next
        {
            self.position += 1;
            self.increment_location(next_char);
        }

        next
    }

    /// Have all the characters been consumed?
    pub fn is_exhausted(&self) -> bool
    {
        self.position >= self.chars.len()
    }

    /// Increment the location based on the next character.  Advance one column for regular
    /// characters.  Reset the colum to 1 and increment the line for new line characters.
    fn increment_location(&mut self, next: char)
    {
        if next == '\n'
        {
            self.location.line += 1;
            self.location.column = 1;
        }
        else
        {
            self.location.column += 1;
        }
    }
}
