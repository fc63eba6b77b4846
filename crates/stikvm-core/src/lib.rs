//! Core types shared by the loader, the dispatch core, and the CLI: instruction
//! encoding, the tagged-union value model, callable records, and the panic taxonomy.

pub mod func;
pub mod instruction;
pub mod panic;
pub mod value;

pub use func::{BytecodeFunc, Func, NativeFn, NativeFunc, RawCallable};
pub use instruction::{Instruction, Opcode};
pub use panic::Panic;
pub use value::{Tag, Value};

/// Magic bytes at the start of every container file.
pub const MAGIC: [u8; 4] = *b"STIK";

/// Highest container version this runtime understands. A file is loadable if
/// `file_version <= VERSION`.
pub const VERSION: u16 = 1;

/// Registers given to the entry frame before the dispatch loop starts.
pub const BASE_REGISTERS: u16 = 16;

/// Hard cap on the size of the register file.
pub const MAX_REGISTERS: usize = 65536;

/// Hard cap on the depth of the frame stack.
pub const MAX_FRAMES: usize = 256;

/// Size in bytes of one packed instruction word.
pub const INSTRUCTION_SIZE: usize = 4;

/// Size in bytes of one canonical `Value` slot on disk (tag byte + 8-byte payload).
pub const VALUE_SIZE: usize = 9;

/// Size in bytes of the file header.
pub const HEADER_SIZE: usize = 20;
