//! The panic taxonomy: a single enumerated error type shared by the loader and the
//! dispatch core. Numeric discriminants are a wire contract with emitters and
//! diagnostics tooling — do not renumber or reorder existing variants.

use thiserror::Error;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Panic {
    #[error("file I/O error")]
    FileIo = 1,
    #[error("index out of bounds")]
    OutOfBounds = 2,
    #[error("program ran off the end without reaching HALT")]
    NoHalt = 3,
    #[error("bad magic number")]
    BadMagic = 4,
    #[error("unsupported bytecode version")]
    UnsupportedVersion = 5,
    #[error("empty program")]
    EmptyProgram = 6,
    #[error("program too big")]
    ProgramTooBig = 7,
    #[error("out of memory")]
    Oom = 8,
    #[error("truncated instruction stream")]
    TruncatedCode = 9,
    #[error("failed to read constant pool")]
    ConstRead = 10,
    #[error("failed to read globals section")]
    GlobalRead = 11,
    #[error("register limit exceeded")]
    RegLimit = 12,
    #[error("frame stack overflow")]
    StackOverflow = 13,
    #[error("frame stack underflow")]
    StackUnderflow = 14,
    #[error("invalid callable")]
    InvalidCallable = 15,
    #[error("call failed")]
    CallFailed = 16,
    #[error("type mismatch")]
    TypeMismatch = 17,
    #[error("invalid opcode")]
    InvalidOpcode = 18,
    /// Extension beyond the canonical 0-18 codes: division or modulo by a zero divisor.
    #[error("division or modulo by zero")]
    DivisionByZero = 19,
}

impl Panic {
    /// `NO_ERROR` is represented as the absence of a `Panic`, not as a variant, so the
    /// VM's panic-code slot can be an `Option<Panic>` and `0` reads naturally as clean.
    pub const NO_ERROR: u32 = 0;

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// SCREAMING_SNAKE_CASE name matching the wire taxonomy, for diagnostics that
    /// want the symbolic name rather than (or alongside) the human message.
    pub const fn name(self) -> &'static str {
        match self {
            Panic::FileIo => "FILE_IO",
            Panic::OutOfBounds => "OUT_OF_BOUNDS",
            Panic::NoHalt => "NO_HALT",
            Panic::BadMagic => "BAD_MAGIC",
            Panic::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Panic::EmptyProgram => "EMPTY_PROGRAM",
            Panic::ProgramTooBig => "PROGRAM_TOO_BIG",
            Panic::Oom => "OUT_OF_MEMORY",
            Panic::TruncatedCode => "TRUNCATED_CODE",
            Panic::ConstRead => "CONST_READ_FAILED",
            Panic::GlobalRead => "GLOBAL_READ_FAILED",
            Panic::RegLimit => "REGISTER_LIMIT",
            Panic::StackOverflow => "STACK_OVERFLOW",
            Panic::StackUnderflow => "STACK_UNDERFLOW",
            Panic::InvalidCallable => "INVALID_CALLABLE",
            Panic::CallFailed => "CALL_FAILED",
            Panic::TypeMismatch => "TYPE_MISMATCH",
            Panic::InvalidOpcode => "INVALID_OPCODE",
            Panic::DivisionByZero => "DIVISION_BY_ZERO",
        }
    }

    /// Recovers the `Panic` variant from a numeric exit code, for callers (the CLI)
    /// that only have the `u32` `Vm::run` returns. Codes outside the known taxonomy
    /// (an emitter-chosen `PANIC` opcode argument, for instance) have no variant.
    pub const fn from_code(code: u32) -> Option<Panic> {
        match code {
            1 => Some(Panic::FileIo),
            2 => Some(Panic::OutOfBounds),
            3 => Some(Panic::NoHalt),
            4 => Some(Panic::BadMagic),
            5 => Some(Panic::UnsupportedVersion),
            6 => Some(Panic::EmptyProgram),
            7 => Some(Panic::ProgramTooBig),
            8 => Some(Panic::Oom),
            9 => Some(Panic::TruncatedCode),
            10 => Some(Panic::ConstRead),
            11 => Some(Panic::GlobalRead),
            12 => Some(Panic::RegLimit),
            13 => Some(Panic::StackOverflow),
            14 => Some(Panic::StackUnderflow),
            15 => Some(Panic::InvalidCallable),
            16 => Some(Panic::CallFailed),
            17 => Some(Panic::TypeMismatch),
            18 => Some(Panic::InvalidOpcode),
            19 => Some(Panic::DivisionByZero),
            _ => None,
        }
    }
}
