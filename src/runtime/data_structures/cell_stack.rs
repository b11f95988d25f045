use crate::runtime::data_structures::cell::{Address, Cell};
use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// A user level stack of cells, as created by `STACK`.  Besides push and pop it can be read and
/// written at any position, where negative positions count back from the top.
#[derive(Clone, Default)]
pub struct CellStack {
    items: Vec<Cell>,
}

/// Stacks are handled by reference, copying the cell shares the stack.
pub type CellStackPtr = Rc<RefCell<CellStack>>;

/// Pretty print the stack bottom to top, as `[a, b, c]`.  A stack found inside itself prints as
/// `[...]`.
impl Display for CellStack {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.write_items(f, &mut Vec::new())
    }
}

impl CellStack {
    /// Create a new reference to an empty stack.
    pub fn new_ptr() -> CellStackPtr {
        Rc::new(RefCell::new(CellStack::default()))
    }

    /// Create a new reference to a stack holding the given items, bottom first.
    pub fn from_vec(items: Vec<Cell>) -> CellStackPtr {
        Rc::new(RefCell::new(CellStack { items }))
    }

    fn write_items(&self, f: &mut Formatter, open: &mut Vec<*const CellStack>) -> fmt::Result {
        open.push(self as *const CellStack);
        write!(f, "[")?;

        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            match item {
                Cell::Address(Address::Stack(nested)) => {
                    let nested = nested.borrow();

                    if open.contains(&(&*nested as *const CellStack)) {
                        write!(f, "[...]")?;
                    } else {
                        nested.write_items(f, open)?;
                    }
                }

                _ => write!(f, "{}", item.to_literal())?,
            }
        }

        open.pop();
        write!(f, "]")
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.items.iter()
    }

    pub fn push(&mut self, item: Cell) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<Cell> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<&Cell> {
        self.items.last()
    }

    /// Map a possibly negative position to a real index: `-1` is the top, `-len` the bottom.
    /// Anything outside of `-len..len` is out of range.
    pub fn normalize(&self, index: i64) -> Option<usize> {
        let len = self.items.len() as i64;
        let index = if index < 0 { len + index } else { index };

        if (0..len).contains(&index) {
            Some(index as usize)
        } else {
            None
        }
    }

    pub fn get(&self, index: i64) -> Option<&Cell> {
        self.normalize(index).map(|index| &self.items[index])
    }

    /// Overwrite the item at a position.  Returns false if the position is out of range.
    pub fn set(&mut self, index: i64, item: Cell) -> bool {
        match self.normalize(index) {
            Some(index) => {
                self.items[index] = item;
                true
            }

            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> CellStackPtr {
        CellStack::from_vec(values.iter().map(|value| Cell::Number(*value)).collect())
    }

    #[test]
    fn negative_indexes_count_from_the_top() {
        let stack = numbers(&[10.0, 20.0, 30.0]);
        let stack = stack.borrow();

        assert_eq!(stack.get(-1), Some(&Cell::Number(30.0)));
        assert_eq!(stack.get(-3), Some(&Cell::Number(10.0)));
        assert_eq!(stack.get(0), Some(&Cell::Number(10.0)));
        assert!(stack.get(3).is_none());
        assert!(stack.get(-4).is_none());
    }

    #[test]
    fn set_rejects_out_of_range() {
        let stack = numbers(&[1.0]);

        assert!(stack.borrow_mut().set(-1, Cell::Number(5.0)));
        assert!(!stack.borrow_mut().set(1, Cell::Number(5.0)));
        assert_eq!(stack.borrow().top(), Some(&Cell::Number(5.0)));
    }

    #[test]
    fn display_lists_bottom_to_top() {
        let stack = numbers(&[1.0, 2.5]);
        stack.borrow_mut().push(Cell::text("a"));

        assert_eq!(stack.borrow().to_string(), "[1, 2.5, \"a\"]");
    }

    #[test]
    fn display_cuts_cycles() {
        let outer = numbers(&[1.0]);
        let inner = numbers(&[2.0]);

        inner.borrow_mut().push(Cell::from(outer.clone()));
        outer.borrow_mut().push(Cell::from(inner.clone()));
        outer.borrow_mut().push(Cell::from(inner));

        assert_eq!(outer.borrow().to_string(), "[1, [2, [...]], [2, [...]]]");
    }
}
