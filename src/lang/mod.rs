/// Module for managing the original source code.
pub mod source_buffer;

/// Module for splitting source code into the words the compiler consumes.
pub mod tokenizing;

/// Module for defining the routines of the WTF language and the code streams they are compiled
/// into.
pub mod code;

/// Module for the compiler's state: the pending stack words are reordered on, the backpatch stack
/// control structures pair up through, and the active code stream.  Some words run while others
/// are still being compiled, so the state is driven by an active interpreter.
pub mod compilation;
