use crate::{ lang::code::Routine,
             runtime::data_structures::cell::Cell };
use std::fmt::{ self,
                Display,
                Formatter };



/// One word of the dictionary.  The priority alone decides what the compiler does with the word:
/// 0 runs the routine at once, 255 emits it, anything in between is reordered through the pending
/// stack.
#[derive(Clone, Debug)]
pub struct WordEntry
{
    pub name: String,
    pub priority: u8,
    pub routine: Routine,
    pub value: Cell
}


impl WordEntry
{
    pub fn new(name: String, priority: u8, routine: Routine, value: Cell) -> WordEntry
    {
        WordEntry { name, priority, routine, value }
    }
}


impl Display for WordEntry
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        let name = match self.name.as_str()
            {
                "\n" => "\\n",
                name => name
            };

        write!(f, "{:12} {:3}  {:14}", name, self.priority, self.routine.to_string())?;

        if !self.value.is_nil()
        {
            write!(f, " {}", self.value.to_literal())?;
        }

        Ok(())
    }
}



/// The WTF dictionary.  Words are kept in definition order, lookups scan from the newest word back
/// so a later definition shadows an earlier one of the same name.
///
/// Scopes are implemented by taking a mark when a block opens and truncating back to it when the
/// block ends.  Every word defined inside the block vanishes, and whatever it shadowed becomes
/// visible again.
#[derive(Default)]
pub struct Dictionary
{
    words: Vec<WordEntry>
}


/// Newest word first, which is also the order lookups see them in.
impl Display for Dictionary
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        writeln!(f, "{} words defined.", self.words.len())?;

        for entry in self.words.iter().rev()
        {
            writeln!(f, "{}", entry)?;
        }

        Ok(())
    }
}


impl Dictionary
{
    pub fn new() -> Dictionary
    {
        Dictionary { words: Vec::new() }
    }

    /// Append a word and return its position.
    pub fn define(&mut self, name: String, priority: u8, routine: Routine, value: Cell) -> usize
    {
        self.words.push(WordEntry::new(name, priority, routine, value));
        self.words.len() - 1
    }

    /// Find the most recent definition of a word.
    pub fn lookup(&self, name: &str) -> Option<&WordEntry>
    {
        self.words.iter().rev().find(|entry| entry.name == name)
    }

    /// The current length, to later truncate back to.
    pub fn mark(&self) -> usize
    {
        self.words.len()
    }

    /// Forget every word defined after the mark was taken.
    pub fn truncate(&mut self, mark: usize)
    {
        self.words.truncate(mark);
    }

    pub fn len(&self) -> usize
    {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.words.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordEntry>
    {
        self.words.iter()
    }
}



#[cfg(test)]
mod tests
{
    use super::*;
    use crate::lang::code::Op;

    #[test]
    fn newest_definition_wins()
    {
        let mut dictionary = Dictionary::new();

        dictionary.define("x".to_string(), 255, Op::VPush.into(), Cell::Index(0));
        dictionary.define("x".to_string(), 255, Op::VPush.into(), Cell::Index(1));

        assert_eq!(dictionary.lookup("x").map(|entry| entry.value.clone()), Some(Cell::Index(1)));
        assert!(dictionary.lookup("y").is_none());
    }

    #[test]
    fn truncation_restores_shadowed_words()
    {
        let mut dictionary = Dictionary::new();

        dictionary.define("x".to_string(), 255, Op::VPush.into(), Cell::Index(0));
        let mark = dictionary.mark();

        dictionary.define("x".to_string(), 255, Op::VPush.into(), Cell::Index(1));
        dictionary.define("y".to_string(), 255, Op::VPush.into(), Cell::Index(2));
        dictionary.truncate(mark);

        assert_eq!(dictionary.len(), mark);
        assert_eq!(dictionary.lookup("x").map(|entry| entry.value.clone()), Some(Cell::Index(0)));
        assert!(dictionary.lookup("y").is_none());
    }
}
