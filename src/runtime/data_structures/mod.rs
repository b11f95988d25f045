pub mod cell;
pub mod cell_stack;
pub mod dictionary;
pub mod variable_store;
