//! The register-based dispatch core: register file, frame stack, and the
//! fetch-decode-execute loop that drives a loaded program to completion.

pub(crate) mod exec;
pub(crate) mod frame;
pub(crate) mod registers;

use stikvm_core::{Func, Instruction, Panic, Value, BASE_REGISTERS};

use frame::{Frame, FrameStack};
use registers::RegisterFile;

/// An initialized, loaded, running (or finished) VM instance. A `Vm` is not
/// reusable: once `run` returns, loading a second program into the same instance
/// is unsupported, matching the single-use lifecycle of the host's `init -> load
/// -> run -> free` protocol. In Rust, `free` is simply letting the `Vm` drop.
pub struct Vm {
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) consts: Vec<Value>,
    pub(crate) globals: Vec<Value>,
    /// Heap-allocated callables kept alive for the VM's lifetime; CALLABLE
    /// register/constant payloads hold raw pointers into this table.
    pub(crate) funcs: Vec<Box<Func>>,
    pub(crate) registers: RegisterFile,
    pub(crate) frames: FrameStack,
    pub(crate) ip: usize,
    panic_code: u32,
}

impl Vm {
    /// Takes ownership of a loader's output and prepares a fresh, unstarted VM.
    pub fn load(program: stikvm_loader::LoadedProgram) -> Self {
        Self {
            instructions: program.instructions,
            consts: program.consts,
            globals: program.globals,
            funcs: program.funcs,
            registers: RegisterFile::new(),
            frames: FrameStack::new(),
            ip: 0,
            panic_code: Panic::NO_ERROR,
        }
    }

    /// Loads a container file from disk and prepares a fresh, unstarted VM.
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self, u32> {
        stikvm_loader::load_file(path)
            .map(Self::load)
            .map_err(|panic| panic.code())
    }

    /// Runs the fetch-decode-execute loop to completion. Returns `Ok(())` on a
    /// clean `HALT` or a `RET` that pops the entry frame; `Err(code)` otherwise,
    /// where `code` is the same value exposed by [`Vm::panic_code`].
    pub fn run(&mut self) -> Result<(), u32> {
        if let Err(panic) = self.push_entry_frame() {
            self.panic_code = panic.code();
            return Err(self.panic_code);
        }

        loop {
            if self.ip >= self.instructions.len() {
                #[cfg(feature = "trace")]
                tracing::warn!(ip = self.ip, "program ran off the end without HALT");
                self.panic_code = Panic::NoHalt.code();
                return Err(self.panic_code);
            }

            let ins = self.instructions[self.ip];
            self.ip += 1;

            match exec::dispatch(self, ins) {
                Ok(exec::Flow::Continue) => continue,
                Ok(exec::Flow::Halt) => {
                    self.panic_code = Panic::NO_ERROR;
                    return Ok(());
                }
                Ok(exec::Flow::ExplicitPanic(code)) => {
                    #[cfg(feature = "trace")]
                    tracing::debug!(code, "bytecode PANIC opcode fired");
                    self.panic_code = code;
                    return Err(code);
                }
                Err(panic) => {
                    #[cfg(feature = "trace")]
                    tracing::debug!(?panic, ip = self.ip - 1, "instruction panicked");
                    self.panic_code = panic.code();
                    return Err(self.panic_code);
                }
            }
        }
    }

    /// The panic code left behind by the most recent `run`: `0` if the program
    /// has not yet panicked (or has not yet run).
    pub fn panic_code(&self) -> u32 {
        self.panic_code
    }

    /// Reads an absolute register, bypassing frame-local translation. Exposed for
    /// hosts and tests that need to inspect the entry frame's registers after
    /// `run` returns.
    pub fn register_raw(&self, idx: usize) -> Result<Value, u32> {
        self.registers.get(idx).map_err(|p| p.code())
    }

    fn push_entry_frame(&mut self) -> Result<(), Panic> {
        self.registers.ensure_capacity(BASE_REGISTERS as usize)?;
        self.frames
            .push(Frame::entry(self.instructions.len() as u32, BASE_REGISTERS))
    }

    pub(crate) fn read_local(&self, local: u8) -> Result<Value, Panic> {
        let base = self.frames.current()?.base as usize;
        self.registers.get(base + local as usize)
    }

    pub(crate) fn write_local(&mut self, local: u8, value: Value) -> Result<(), Panic> {
        let base = self.frames.current()?.base as usize;
        self.registers.set(base + local as usize, value)
    }

    pub(crate) fn clear_local(&mut self, local: u8) -> Result<(), Panic> {
        let base = self.frames.current()?.base as usize;
        self.registers.clear(base + local as usize)
    }

    pub(crate) fn jump_relative(&mut self, delta: i32) -> Result<(), Panic> {
        let target = self.ip as i64 + delta as i64;
        if target < 0 || target as usize >= self.instructions.len() {
            return Err(Panic::OutOfBounds);
        }
        self.ip = target as usize;
        Ok(())
    }

    /// Builds a bare VM with a single entry frame already pushed, for exercising
    /// individual opcodes without going through a loaded container.
    #[cfg(test)]
    pub(crate) fn new_for_tests(consts: Vec<Value>) -> Self {
        let mut vm = Self {
            instructions: Vec::new(),
            consts,
            globals: Vec::new(),
            funcs: Vec::new(),
            registers: RegisterFile::new(),
            frames: FrameStack::new(),
            ip: 0,
            panic_code: Panic::NO_ERROR,
        };
        vm.frames.push(Frame::entry(0, BASE_REGISTERS)).unwrap();
        vm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stikvm_core::{Opcode, Tag};

    fn encode(ins: &[(Opcode, u8, u8, u8)]) -> Vec<Instruction> {
        ins.iter()
            .map(|&(op, a, b, c)| Instruction::new(op, a, b, c))
            .collect()
    }

    fn vm_from(instructions: Vec<Instruction>, consts: Vec<Value>) -> Vm {
        Vm::load(stikvm_loader::LoadedProgram {
            instructions,
            consts,
            globals: Vec::new(),
            funcs: Vec::new(),
        })
    }

    #[test]
    fn minimal_halt_succeeds() {
        let mut vm = vm_from(encode(&[(Opcode::Halt, 0, 0, 0)]), vec![]);
        assert_eq!(vm.run(), Ok(()));
        assert_eq!(vm.panic_code(), 0);
    }

    #[test]
    fn explicit_panic_propagates_its_code() {
        let mut vm = vm_from(encode(&[(Opcode::Panic, 42, 0, 0)]), vec![]);
        assert_eq!(vm.run(), Err(42));
        assert_eq!(vm.panic_code(), 42);
    }

    #[test]
    fn load_immediate_then_return_leaves_entry_register_set() {
        // LOADI r0, +7 ; RET 0
        let mut load_i = Instruction::new(Opcode::LoadI, 0, 0, 0);
        load_i.b = 7;
        let mut vm = vm_from(vec![load_i, Instruction::new(Opcode::Ret, 0, 0, 0)], vec![]);
        assert_eq!(vm.run(), Ok(()));
        let reg0 = vm.register_raw(0).unwrap();
        assert_eq!(reg0.tag, Tag::I64);
        assert_eq!(reg0.as_i64(), Some(7));
    }

    #[test]
    fn signed_add_over_constants() {
        // LOADC r0, 0 ; LOADC r1, 1 ; ADD r2, r0, r1 ; HALT
        let instructions = encode(&[
            (Opcode::LoadC, 0, 0, 0),
            (Opcode::LoadC, 1, 1, 0),
            (Opcode::Add, 2, 0, 1),
            (Opcode::Halt, 0, 0, 0),
        ]);
        let consts = vec![Value::i64(5), Value::i64(-2)];
        let mut vm = vm_from(instructions, consts);
        assert_eq!(vm.run(), Ok(()));
        assert_eq!(vm.register_raw(2).unwrap().as_i64(), Some(3));
    }

    #[test]
    fn out_of_range_jump_panics_out_of_bounds() {
        // simm24 = +1_000_000, packed little-endian across a:b:c.
        let raw = 1_000_000i32 as u32;
        let jmp = Instruction {
            op: Opcode::Jmp as u8,
            a: (raw & 0xFF) as u8,
            b: ((raw >> 8) & 0xFF) as u8,
            c: ((raw >> 16) & 0xFF) as u8,
        };
        let instructions = vec![
            jmp,
            Instruction::new(Opcode::Halt, 0, 0, 0),
            Instruction::new(Opcode::Halt, 0, 0, 0),
        ];
        let mut vm = vm_from(instructions, vec![]);
        assert_eq!(vm.run(), Err(Panic::OutOfBounds.code()));
    }

    #[test]
    fn running_off_the_end_without_halt_panics() {
        let mut vm = vm_from(encode(&[(Opcode::Copy, 0, 0, 0)]), vec![]);
        assert_eq!(vm.run(), Err(Panic::NoHalt.code()));
    }
}
