//! The flat register file shared by every frame. Two parallel arrays instead of an
//! array of structs: this keeps the payload slots naturally 8-byte aligned and
//! avoids per-slot padding from the tag byte.

use stikvm_core::{Panic, Tag, Value, MAX_REGISTERS};

pub struct RegisterFile {
    tags: Vec<Tag>,
    payloads: Vec<[u8; 8]>,
}

impl RegisterFile {
    /// The register file is a single allocation sized to `MAX_REGISTERS` up front;
    /// `ensure_capacity` below is a bounds check, not a grow-on-demand call.
    pub fn new() -> Self {
        Self {
            tags: vec![Tag::Nul; MAX_REGISTERS],
            payloads: vec![[0u8; 8]; MAX_REGISTERS],
        }
    }

    /// Confirms a register window of size `need` fits within the pre-sized file.
    pub fn ensure_capacity(&self, need: usize) -> Result<(), Panic> {
        if need > MAX_REGISTERS {
            Err(Panic::RegLimit)
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Result<Value, Panic> {
        let tag = *self.tags.get(idx).ok_or(Panic::RegLimit)?;
        Ok(Value {
            tag,
            payload: self.payloads[idx],
        })
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: Value) -> Result<(), Panic> {
        if idx >= MAX_REGISTERS {
            return Err(Panic::RegLimit);
        }
        self.tags[idx] = value.tag;
        self.payloads[idx] = value.payload;
        Ok(())
    }

    #[inline]
    pub fn clear(&mut self, idx: usize) -> Result<(), Panic> {
        self.set(idx, Value::NUL)
    }

    /// Fails with `PANIC_TYPE_MISMATCH` if the tag at `idx` does not match `expected`.
    #[inline]
    pub fn require_type(&self, idx: usize, expected: Tag) -> Result<(), Panic> {
        let tag = *self.tags.get(idx).ok_or(Panic::RegLimit)?;
        if tag == expected {
            Ok(())
        } else {
            Err(Panic::TypeMismatch)
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let mut regs = RegisterFile::new();
        regs.set(3, Value::i64(42)).unwrap();
        assert_eq!(regs.get(3).unwrap().as_i64(), Some(42));
    }

    #[test]
    fn require_type_rejects_mismatch() {
        let mut regs = RegisterFile::new();
        regs.set(0, Value::i64(1)).unwrap();
        assert!(regs.require_type(0, Tag::I64).is_ok());
        assert_eq!(
            regs.require_type(0, Tag::U64).unwrap_err(),
            Panic::TypeMismatch
        );
    }

    #[test]
    fn ensure_capacity_rejects_over_limit() {
        let regs = RegisterFile::new();
        assert!(regs.ensure_capacity(MAX_REGISTERS).is_ok());
        assert_eq!(
            regs.ensure_capacity(MAX_REGISTERS + 1).unwrap_err(),
            Panic::RegLimit
        );
    }
}
