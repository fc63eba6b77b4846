//! Parses a `.stk` container into VM-owned storage: header validation, section
//! reads, and constant-pool callable patching.
//!
//! Loading is transactional: on any failure every partial allocation made so far
//! is dropped before the error is returned, so the only observable effect of a
//! failed load is the `Panic` code itself.

use std::path::Path;

use stikvm_core::{
    BytecodeFunc, Func, Instruction, Panic, RawCallable, Tag, Value, HEADER_SIZE, MAGIC,
    VALUE_SIZE, VERSION,
};

/// Everything a freshly loaded program hands off to the VM: ownership of the
/// instruction stream, the constant pool (with CALLABLE slots already patched to
/// point at heap-allocated `Func` records), the globals array, and the function
/// table that owns those `Func` records.
pub struct LoadedProgram {
    pub instructions: Vec<Instruction>,
    pub consts: Vec<Value>,
    pub globals: Vec<Value>,
    /// Heap-allocated callables, one per CALLABLE constant, indexed in the order
    /// they were patched. Kept alive here so the VM can free them on teardown even
    /// if the constant pool is later trimmed.
    pub funcs: Vec<Box<Func>>,
}

/// Read and validate a container file from disk.
pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedProgram, Panic> {
    #[cfg(feature = "trace")]
    let _span = tracing::debug_span!("load_file", path = %path.as_ref().display()).entered();

    let bytes = std::fs::read(path).map_err(|err| {
        #[cfg(feature = "trace")]
        tracing::warn!(%err, "failed to read container file");
        #[cfg(not(feature = "trace"))]
        let _ = err;
        Panic::FileIo
    })?;

    load_bytes(&bytes)
}

/// Parse an in-memory container image. `load_file` is a thin wrapper around this
/// that adds file-I/O error handling.
pub fn load_bytes(bytes: &[u8]) -> Result<LoadedProgram, Panic> {
    let header = parse_header(bytes)?;

    #[cfg(feature = "trace")]
    tracing::debug!(
        icount = header.icount,
        ccount = header.ccount,
        gcount = header.gcount,
        "header parsed"
    );

    if header.icount == 0 {
        return Err(Panic::EmptyProgram);
    }

    let icount = header.icount as usize;
    if icount > (u32::MAX as usize) / stikvm_core::INSTRUCTION_SIZE {
        return Err(Panic::ProgramTooBig);
    }

    let mut offset = HEADER_SIZE;

    let instructions = read_instructions(bytes, &mut offset, icount)?;
    let mut consts = read_values(bytes, &mut offset, header.ccount as usize, Panic::ConstRead)?;
    let globals = read_values(bytes, &mut offset, header.gcount as usize, Panic::GlobalRead)?;

    let funcs = patch_callables(&mut consts);

    Ok(LoadedProgram {
        instructions,
        consts,
        globals,
        funcs,
    })
}

struct Header {
    icount: u32,
    ccount: u32,
    gcount: u32,
}

fn parse_header(bytes: &[u8]) -> Result<Header, Panic> {
    // A short read of the header is indistinguishable from a malformed one at this
    // layer, so both collapse to `BadMagic` per the loader's validation contract.
    if bytes.len() < HEADER_SIZE {
        return Err(Panic::BadMagic);
    }

    if bytes[0..4] != MAGIC {
        return Err(Panic::BadMagic);
    }

    let version = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
    let _flags = u16::from_le_bytes(bytes[6..8].try_into().unwrap());
    let icount = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let ccount = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
    let gcount = u32::from_le_bytes(bytes[16..20].try_into().unwrap());

    if version > VERSION {
        return Err(Panic::UnsupportedVersion);
    }

    Ok(Header {
        icount,
        ccount,
        gcount,
    })
}

fn read_instructions(
    bytes: &[u8],
    offset: &mut usize,
    icount: usize,
) -> Result<Vec<Instruction>, Panic> {
    let needed = icount * stikvm_core::INSTRUCTION_SIZE;
    let end = offset.checked_add(needed).ok_or(Panic::ProgramTooBig)?;
    let chunk = bytes.get(*offset..end).ok_or(Panic::TruncatedCode)?;

    let mut instructions = Vec::with_capacity(icount);
    for word in chunk.chunks_exact(stikvm_core::INSTRUCTION_SIZE) {
        let raw = u32::from_le_bytes(word.try_into().unwrap());
        instructions.push(Instruction::from_u32(raw));
    }

    *offset = end;
    Ok(instructions)
}

fn read_values(
    bytes: &[u8],
    offset: &mut usize,
    count: usize,
    on_short_read: Panic,
) -> Result<Vec<Value>, Panic> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let needed = count * VALUE_SIZE;
    let end = offset.checked_add(needed).ok_or(on_short_read)?;
    let chunk = bytes.get(*offset..end).ok_or(on_short_read)?;

    let mut values = Vec::with_capacity(count);
    for slot in chunk.chunks_exact(VALUE_SIZE) {
        let tag = Tag::try_from(slot[0]).map_err(|_| on_short_read)?;
        let mut payload = [0u8; 8];
        payload.copy_from_slice(&slot[1..9]);
        values.push(Value { tag, payload });
    }

    *offset = end;
    Ok(values)
}

/// Walk the constant pool, allocate a heap `Func` for every CALLABLE slot, and
/// overwrite its payload with the pointer to that `Func`. Returns the function
/// table that now owns those allocations.
fn patch_callables(consts: &mut [Value]) -> Vec<Box<Func>> {
    let mut funcs = Vec::new();

    for value in consts.iter_mut() {
        if value.tag != Tag::Callable {
            continue;
        }

        let raw = RawCallable::from_payload(value.payload);
        let func = Box::new(Func::Bytecode(BytecodeFunc {
            entry_ip: raw.entry_ip,
            argc: raw.argc,
            regc: raw.regc,
        }));

        let ptr = Box::into_raw(func);
        // SAFETY: `ptr` was just produced by `Box::into_raw` above and ownership is
        // handed straight into `funcs`, which keeps it alive for the VM's lifetime.
        let owned = unsafe { Box::from_raw(ptr) };
        value.payload = (ptr as u64).to_le_bytes();
        funcs.push(owned);
    }

    funcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use stikvm_core::Opcode;

    fn header(icount: u32, ccount: u32, gcount: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&icount.to_le_bytes());
        out.extend_from_slice(&ccount.to_le_bytes());
        out.extend_from_slice(&gcount.to_le_bytes());
        out
    }

    #[test]
    fn minimal_halt_program_loads() {
        let mut bytes = header(1, 0, 0);
        bytes.extend_from_slice(&Instruction::new(Opcode::Halt, 0, 0, 0).to_u32().to_le_bytes());

        let program = load_bytes(&bytes).expect("should load");
        assert_eq!(program.instructions.len(), 1);
        assert_eq!(program.instructions[0].opcode(), Some(Opcode::Halt));
    }

    #[test]
    fn truncated_header_is_bad_magic() {
        let bytes = vec![0u8; 4];
        assert_eq!(load_bytes(&bytes).unwrap_err(), Panic::BadMagic);
    }

    #[test]
    fn wrong_magic_is_bad_magic() {
        let mut bytes = header(1, 0, 0);
        bytes[0] = b'X';
        assert_eq!(load_bytes(&bytes).unwrap_err(), Panic::BadMagic);
    }

    #[test]
    fn future_version_is_unsupported() {
        let mut bytes = header(1, 0, 0);
        bytes[4..6].copy_from_slice(&(VERSION + 1).to_le_bytes());
        assert_eq!(load_bytes(&bytes).unwrap_err(), Panic::UnsupportedVersion);
    }

    #[test]
    fn zero_instructions_is_empty_program() {
        let bytes = header(0, 0, 0);
        assert_eq!(load_bytes(&bytes).unwrap_err(), Panic::EmptyProgram);
    }

    #[test]
    fn declared_instructions_exceeding_payload_is_truncated_code() {
        let mut bytes = header(10, 0, 0);
        for _ in 0..4 {
            bytes.extend_from_slice(&Instruction::new(Opcode::Halt, 0, 0, 0).to_u32().to_le_bytes());
        }
        assert_eq!(load_bytes(&bytes).unwrap_err(), Panic::TruncatedCode);
    }

    #[test]
    fn callable_constant_is_patched_to_a_heap_pointer() {
        let mut bytes = header(1, 1, 0);
        bytes.extend_from_slice(&Instruction::new(Opcode::Halt, 0, 0, 0).to_u32().to_le_bytes());

        let mut payload = [0u8; 8];
        payload[0..4].copy_from_slice(&5u32.to_le_bytes());
        payload[4..6].copy_from_slice(&1u16.to_le_bytes());
        payload[6..8].copy_from_slice(&2u16.to_le_bytes());
        bytes.push(Tag::Callable as u8);
        bytes.extend_from_slice(&payload);

        let program = load_bytes(&bytes).expect("should load");
        assert_eq!(program.funcs.len(), 1);
        assert_eq!(program.consts[0].tag, Tag::Callable);

        let ptr = program.consts[0].as_callable().unwrap();
        assert_eq!(ptr, Box::as_ref(&program.funcs[0]) as *const Func as *mut Func);
        match program.funcs[0].as_ref() {
            Func::Bytecode(f) => {
                assert_eq!(f.entry_ip, 5);
                assert_eq!(f.argc, 1);
                assert_eq!(f.regc, 2);
            }
            Func::Native(_) => panic!("expected bytecode func"),
        }
    }
}
