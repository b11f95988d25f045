use crate::runtime::data_structures::cell::Cell;
use std::fmt::{self, Display, Formatter};

/// Storage for every variable the program declares.  A slot is handed out at compile time, when
/// the declaration is compiled, and is never given back.  All invocations of a procedure therefore
/// share the slots of its locals.
#[derive(Default)]
pub struct VariableStore {
    slots: Vec<Cell>,
}

/// One `slot: value` line per variable.
impl Display for VariableStore {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (slot, value) in self.slots.iter().enumerate() {
            writeln!(f, "{}: {}", slot, value.to_literal())?;
        }

        Ok(())
    }
}

impl VariableStore {
    pub fn new() -> VariableStore {
        VariableStore { slots: Vec::new() }
    }

    /// Allocate a new slot holding the initial value and return its index.
    pub fn allocate(&mut self, initial: Cell) -> usize {
        self.slots.push(initial);
        self.slots.len() - 1
    }

    pub fn get(&self, slot: usize) -> Option<&Cell> {
        self.slots.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Cell> {
        self.slots.get_mut(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
