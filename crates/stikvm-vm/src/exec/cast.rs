//! Numeric conversions between the four primitive domains. Source register is
//! `b`, destination is `a`; float-to-int conversions truncate, int-to-int
//! conversions reinterpret bits (two's complement) rather than saturate.

use stikvm_core::{Instruction, Opcode, Panic, Value};

use super::Flow;
use crate::Vm;

pub(crate) fn execute(vm: &mut Vm, opcode: Opcode, ins: Instruction) -> Result<Flow, Panic> {
    let src = vm.read_local(ins.op_b())?;

    let result = match opcode {
        Opcode::I2D => Value::double(src.as_i64().ok_or(Panic::TypeMismatch)? as f64),
        Opcode::I2F => Value::float(src.as_i64().ok_or(Panic::TypeMismatch)? as f32),
        Opcode::D2I => Value::i64(src.as_double().ok_or(Panic::TypeMismatch)? as i64),
        Opcode::F2I => Value::i64(src.as_float().ok_or(Panic::TypeMismatch)? as i64),
        Opcode::I2U => Value::u64(src.as_i64().ok_or(Panic::TypeMismatch)? as u64),
        Opcode::U2I => Value::i64(src.as_u64().ok_or(Panic::TypeMismatch)? as i64),
        Opcode::U2D => Value::double(src.as_u64().ok_or(Panic::TypeMismatch)? as f64),
        Opcode::U2F => Value::float(src.as_u64().ok_or(Panic::TypeMismatch)? as f32),
        Opcode::D2U => Value::u64(src.as_double().ok_or(Panic::TypeMismatch)? as u64),
        Opcode::F2U => Value::u64(src.as_float().ok_or(Panic::TypeMismatch)? as u64),
        _ => unreachable!("cast::execute called with a non-cast opcode"),
    };

    vm.write_local(ins.op_a(), result)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_to_double_widens() {
        let mut vm = Vm::new_for_tests(vec![]);
        vm.write_local(1, Value::i64(-7)).unwrap();
        let ins = Instruction::new(Opcode::I2D, 0, 1, 0);
        execute(&mut vm, Opcode::I2D, ins).unwrap();
        assert_eq!(vm.read_local(0).unwrap().as_double(), Some(-7.0));
    }

    #[test]
    fn double_to_signed_truncates() {
        let mut vm = Vm::new_for_tests(vec![]);
        vm.write_local(1, Value::double(3.9)).unwrap();
        let ins = Instruction::new(Opcode::D2I, 0, 1, 0);
        execute(&mut vm, Opcode::D2I, ins).unwrap();
        assert_eq!(vm.read_local(0).unwrap().as_i64(), Some(3));
    }

    #[test]
    fn signed_to_unsigned_reinterprets_bits() {
        let mut vm = Vm::new_for_tests(vec![]);
        vm.write_local(1, Value::i64(-1)).unwrap();
        let ins = Instruction::new(Opcode::I2U, 0, 1, 0);
        execute(&mut vm, Opcode::I2U, ins).unwrap();
        assert_eq!(vm.read_local(0).unwrap().as_u64(), Some(u64::MAX));
    }
}
