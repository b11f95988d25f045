use crate::{
    lang::{
        code::{CodeBlock, CodeStream, Instruction, Op},
        source_buffer::SourceLocation,
        tokenizing::{Scanner, Word},
    },
    runtime::{
        data_structures::cell::Cell,
        error::{self, ErrorKind, ScriptError},
    },
};
use std::fmt::{self, Display, Formatter};

/// The two kinds of bracket that group words on the pending stack.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Group {
    Paren,
    Bracket,
}

impl Group {
    pub fn opener(&self) -> char {
        match self {
            Group::Paren => '(',
            Group::Bracket => '[',
        }
    }

    pub fn closer(&self) -> char {
        match self {
            Group::Paren => ')',
            Group::Bracket => ']',
        }
    }
}

/// A word waiting on the pending stack to be emitted.
#[derive(Clone)]
pub struct PendingWord {
    pub priority: u8,
    pub op: Op,
    pub value: Cell,
    pub location: Option<SourceLocation>,
}

#[derive(Clone)]
pub enum Pending {
    Word(PendingWord),

    /// An open bracket.  Flushes stop at it until it's closed.
    Group(Group),
}

/// The operator reordering stack.  Between any two group markers the priorities strictly increase
/// from bottom to top, the dispatcher's flush rule guarantees it.
#[derive(Default)]
pub struct PendingStack {
    entries: Vec<Pending>,
}

impl PendingStack {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&Pending> {
        self.entries.last()
    }

    pub fn push(&mut self, entry: Pending) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<Pending> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The priorities from bottom to top, `None` standing for a group marker.
    pub fn priorities(&self) -> Vec<Option<u8>> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Pending::Word(word) => Some(word.priority),
                Pending::Group(_) => None,
            })
            .collect()
    }

    /// Check that priorities strictly increase between group markers.
    pub fn is_monotonic(&self) -> bool {
        let mut previous: Option<u8> = None;

        for priority in self.priorities() {
            match priority {
                Some(priority) => {
                    if let Some(previous) = previous
                        && previous >= priority
                    {
                        return false;
                    }

                    previous = Some(priority);
                }

                None => previous = None,
            }
        }

        true
    }
}

/// The markers control structures leave on the backpatch stack between their opening and closing
/// words.  Addresses are instruction positions in the active code stream.
#[derive(Clone)]
pub enum Marker {
    /// Bottom of an IF construct, FI unwinds to it.
    Conditional,

    /// IF or ELIF is waiting for its THEN.
    AwaitThen,

    /// THEN compiled the JPZ at this address.
    Then(usize),

    /// ELSE or ELIF compiled a JP to the end of the construct at this address.
    Exit(usize),

    /// Inside an ELSE branch, only FI may follow.
    ElseBranch,

    /// WHILE recorded the address the loop test starts at.
    LoopStart(usize),

    /// DO compiled the loop exit JPZ at `exit`.
    WhileBody { start: usize, exit: usize },

    /// FOR declared the loop variable, TO must follow.
    ForVariable { slot: usize },

    /// TO compiled the bound test starting at `recheck`, DO must follow.
    ForBound { slot: usize, recheck: usize },

    /// DO compiled the loop exit JPZ at `exit`.
    ForBody {
        slot: usize,
        recheck: usize,
        exit: usize,
    },

    /// A PROC, FUNC or CMD block under construction.
    Block(BlockMarker),
}

/// What END needs to close a block.
#[derive(Clone)]
pub struct BlockMarker {
    /// The code stream to return to.
    pub outer: CodeStream,

    /// Dictionary length to truncate back to.
    pub mark: usize,

    /// The keyword that opened the block and the name of the word it defines.
    pub opener: &'static str,
    pub name: String,
}

impl Marker {
    /// The complaint for a construct that was never closed, or None for the markers that are only
    /// bookkeeping inside a construct.
    pub fn unclosed_message(&self) -> Option<String> {
        match self {
            Marker::Conditional => Some("'IF' without 'FI'".to_string()),

            Marker::LoopStart(_) | Marker::WhileBody { .. } => {
                Some("'WHILE' without 'OD'".to_string())
            }

            Marker::ForVariable { .. } | Marker::ForBound { .. } | Marker::ForBody { .. } => {
                Some("'FOR' without 'NEXT'".to_string())
            }

            Marker::Block(block) => Some(format!(
                "'{} {}' without 'END'",
                block.opener, block.name
            )),

            Marker::AwaitThen | Marker::Then(_) | Marker::Exit(_) | Marker::ElseBranch => None,
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Marker::Conditional => write!(f, "IF"),
            Marker::AwaitThen => write!(f, "THEN?"),
            Marker::Then(address) => write!(f, "THEN @{}", address),
            Marker::Exit(address) => write!(f, "EXIT @{}", address),
            Marker::ElseBranch => write!(f, "ELSE"),
            Marker::LoopStart(start) => write!(f, "WHILE @{}", start),
            Marker::WhileBody { start, exit } => write!(f, "DO @{} exit @{}", start, exit),
            Marker::ForVariable { slot } => write!(f, "FOR ${}", slot),
            Marker::ForBound { slot, recheck } => write!(f, "TO ${} @{}", slot, recheck),
            Marker::ForBody {
                slot,
                recheck,
                exit,
            } => write!(f, "DO ${} @{} exit @{}", slot, recheck, exit),
            Marker::Block(block) => write!(f, "{} {}", block.opener, block.name),
        }
    }
}

/// The stack matching control structure words pair up through.
#[derive(Default)]
pub struct BackpatchStack {
    markers: Vec<Marker>,
}

impl BackpatchStack {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn top(&self) -> Option<&Marker> {
        self.markers.last()
    }

    pub fn push(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn pop(&mut self) -> Option<Marker> {
        self.markers.pop()
    }

    /// Pop the top marker only if `extract` accepts it.  A rejected marker stays where it is.
    pub fn pop_with<T>(&mut self, extract: impl FnOnce(&Marker) -> Option<T>) -> Option<T> {
        let extracted = self.markers.last().and_then(extract);

        if extracted.is_some() {
            let _ = self.markers.pop();
        }

        extracted
    }
}

/// Outcome of a compilation that didn't hit a fatal error.
#[derive(Clone, Debug, Default)]
pub struct CompileReport {
    /// How many compile errors were reported.
    pub errors: usize,

    /// The reported errors, in order.
    pub diagnostics: Vec<ScriptError>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// All of the compiler's state: where words come from, where code goes, and the two stacks the
/// dispatcher and the control structures work with.
pub struct CodeConstructor {
    /// Word sources, the innermost INCLUDE on top.
    scanners: Vec<Scanner>,

    /// The code stream instructions are emitted into.
    code: CodeStream,

    pub pending: PendingStack,
    pub backpatch: BackpatchStack,

    /// Location of the word being compiled.
    location: Option<SourceLocation>,

    /// Compile errors reported so far.
    pub errors: usize,
    pub diagnostics: Vec<ScriptError>,
}

impl CodeConstructor {
    pub fn new(code: CodeStream) -> CodeConstructor {
        CodeConstructor {
            scanners: Vec::new(),
            code,
            pending: PendingStack::default(),
            backpatch: BackpatchStack::default(),
            location: None,
            errors: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Start compiling a new source into the given code stream.
    pub fn begin(&mut self, scanner: Scanner, code: CodeStream) {
        self.reset(code);
        self.scanners.push(scanner);
    }

    /// Drop all compilation state and go back to emitting into the given code stream.
    pub fn reset(&mut self, code: CodeStream) {
        self.scanners.clear();
        self.code = code;
        self.pending.clear();
        self.backpatch = BackpatchStack::default();
        self.location = None;
        self.errors = 0;
        self.diagnostics.clear();
    }

    /// Hand back the errors gathered so far.
    pub fn take_report(&mut self) -> CompileReport {
        CompileReport {
            errors: std::mem::take(&mut self.errors),
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    /// The location of the word being compiled, or where the scanner is when there's no word yet.
    pub fn location(&self) -> Option<SourceLocation> {
        match &self.location {
            Some(location) => Some(location.clone()),
            None => self.scanners.last().map(|scanner| scanner.location().clone()),
        }
    }

    pub fn set_location(&mut self, location: Option<SourceLocation>) {
        self.location = location;
    }

    /// Build a compile error at the current location.
    pub fn compile_error<T>(&self, message: String) -> error::Result<T> {
        ScriptError::new_as_result(ErrorKind::Compile, self.location(), message, None)
    }

    pub fn compile_error_str<T>(&self, message: &str) -> error::Result<T> {
        self.compile_error(message.to_string())
    }

    pub fn is_compiling(&self) -> bool {
        !self.scanners.is_empty()
    }

    pub fn scanner_depth(&self) -> usize {
        self.scanners.len()
    }

    /// Path of the source the innermost scanner reads.
    pub fn source_path(&self) -> Option<&String> {
        self.scanners.last().map(|scanner| scanner.path())
    }

    pub fn push_scanner(&mut self, scanner: Scanner) {
        self.scanners.push(scanner);
    }

    pub fn pop_scanner(&mut self) -> Option<Scanner> {
        self.scanners.pop()
    }

    /// Next word from the innermost source, None when that source is used up.
    pub fn next_word(&mut self) -> Option<Word> {
        self.scanners.last_mut().and_then(|scanner| scanner.next_word())
    }

    pub fn next_char(&mut self) -> Option<char> {
        self.scanners.last_mut().and_then(|scanner| scanner.next_char())
    }

    pub fn skip_line(&mut self) {
        if let Some(scanner) = self.scanners.last_mut() {
            scanner.skip_line();
        }
    }

    /// The code stream being compiled into.
    pub fn code(&self) -> &CodeStream {
        &self.code
    }

    /// Compile into another code stream from now on, returning the previous one.
    pub fn switch_code(&mut self, code: CodeStream) -> CodeStream {
        std::mem::replace(&mut self.code, code)
    }

    /// Length of the active code stream, the address the next instruction will get.
    pub fn here(&self) -> usize {
        self.code.borrow().len()
    }

    /// Append an instruction to the active code stream, tagged with the current word's location.
    pub fn emit(&mut self, op: Op, value: Cell) -> usize {
        let location = self.location();
        self.emit_at(location, op, value)
    }

    fn emit_at(&mut self, location: Option<SourceLocation>, op: Op, value: Cell) -> usize {
        self.code
            .borrow_mut()
            .push(Instruction::new(location, op, value))
    }

    /// Resolve a placeholder jump.
    pub fn patch(&mut self, address: usize, target: usize) -> error::Result<()> {
        if self.code.borrow_mut().patch(address, target) {
            Ok(())
        } else {
            self.compile_error(format!("No instruction at address {} to resolve", address))
        }
    }

    /// Queue a word on the pending stack after flushing everything of equal or higher priority.
    pub fn defer(&mut self, priority: u8, op: Op, value: Cell) -> error::Result<()> {
        self.flush(priority)?;

        let location = self.location();

        self.pending.push(Pending::Word(PendingWord {
            priority,
            op,
            value,
            location,
        }));

        Ok(())
    }

    /// Emit pending words while their priority is at least `priority`.  Groups stop the flush,
    /// except when flushing everything, where an open group is reported and discarded.
    pub fn flush(&mut self, priority: u8) -> error::Result<()> {
        let mut unmatched = None;

        loop {
            match self.pending.top() {
                Some(Pending::Word(word)) if word.priority >= priority => {
                    if let Some(Pending::Word(word)) = self.pending.pop() {
                        let _ = self.emit_at(word.location, word.op, word.value);
                    }
                }

                Some(Pending::Group(group)) if priority == 0 => {
                    let _ = unmatched.get_or_insert(*group);
                    let _ = self.pending.pop();
                }

                _ => break,
            }
        }

        match unmatched {
            Some(group) => self.compile_error(format!("Unmatched '{}'", group.opener())),
            None => Ok(()),
        }
    }

    /// Open a group on the pending stack.
    pub fn open_group(&mut self, group: Group) {
        self.pending.push(Pending::Group(group));
    }

    /// Emit everything back to the matching open group and remove it.  A closer without its
    /// opener is reported and the pending stack is left as it was found after the flush.
    pub fn close_group(&mut self, group: Group) -> error::Result<()> {
        self.flush(1)?;

        match self.pending.top() {
            Some(Pending::Group(open)) if *open == group => {
                let _ = self.pending.pop();
                Ok(())
            }

            _ => self.compile_error(format!("Unmatched '{}'", group.closer())),
        }
    }

    /// Report every construct left open and empty the backpatch stack.  Open blocks give back
    /// their outer code stream and their dictionary mark, outermost last, so the caller can
    /// restore both.
    pub fn unwind_backpatch(&mut self) -> (Vec<String>, Option<BlockMarker>) {
        let mut messages = Vec::new();
        let mut outermost = None;

        while let Some(marker) = self.backpatch.pop() {
            if let Some(message) = marker.unclosed_message() {
                messages.push(message);
            }

            if let Marker::Block(block) = marker {
                outermost = Some(block);
            }
        }

        messages.reverse();

        (messages, outermost)
    }
}

/// A fresh code stream for top level code.
pub fn new_top_level() -> CodeStream {
    CodeBlock::new_stream("<top>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constructor() -> CodeConstructor {
        CodeConstructor::new(new_top_level())
    }

    fn emitted(constructor: &CodeConstructor) -> Vec<Op> {
        constructor
            .code()
            .borrow()
            .instructions()
            .iter()
            .map(|instruction| instruction.op)
            .collect()
    }

    #[test]
    fn lower_priority_flushes_higher() {
        let mut constructor = constructor();

        constructor.defer(100, Op::Add, Cell::nil()).unwrap();
        constructor.defer(110, Op::Mul, Cell::nil()).unwrap();
        constructor.defer(100, Op::Sub, Cell::nil()).unwrap();

        assert_eq!(emitted(&constructor), vec![Op::Mul, Op::Add]);
        assert_eq!(constructor.pending.priorities(), vec![Some(100)]);
    }

    #[test]
    fn groups_stop_partial_flushes() {
        let mut constructor = constructor();

        constructor.defer(110, Op::Mul, Cell::nil()).unwrap();
        constructor.open_group(Group::Paren);
        constructor.defer(100, Op::Add, Cell::nil()).unwrap();
        constructor.close_group(Group::Paren).unwrap();

        assert_eq!(emitted(&constructor), vec![Op::Add]);
        assert_eq!(constructor.pending.priorities(), vec![Some(110)]);
    }

    #[test]
    fn flushing_everything_reports_open_groups() {
        let mut constructor = constructor();

        constructor.open_group(Group::Bracket);
        constructor.defer(100, Op::Add, Cell::nil()).unwrap();

        let error = constructor.flush(0).unwrap_err();

        assert_eq!(error.error(), "Unmatched '['");
        assert!(constructor.pending.is_empty());
        assert_eq!(emitted(&constructor), vec![Op::Add]);
    }

    #[test]
    fn mismatched_closer_is_reported() {
        let mut constructor = constructor();

        constructor.open_group(Group::Bracket);
        let error = constructor.close_group(Group::Paren).unwrap_err();

        assert_eq!(error.error(), "Unmatched ')'");
        assert_eq!(constructor.pending.priorities(), vec![None]);
    }

    #[test]
    fn pop_with_leaves_rejected_markers() {
        let mut stack = BackpatchStack::default();

        stack.push(Marker::LoopStart(3));

        assert!(
            stack
                .pop_with(|marker| match marker {
                    Marker::Then(address) => Some(*address),
                    _ => None,
                })
                .is_none()
        );
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack.pop_with(|marker| match marker {
                Marker::LoopStart(start) => Some(*start),
                _ => None,
            }),
            Some(3)
        );
        assert!(stack.is_empty());
    }
}
