//! The typed operation matrix: arithmetic, bitwise, and comparison across the four
//! primitive domains {I64, U64, FLOAT, DOUBLE}, plus the unary LNOT.
//!
//! Overflow wraps uniformly across the integer domains (ADD/SUB/MUL/NEG on both
//! I64 and U64), matching native twos-complement overflow rather than panicking
//! on I64 alone — `TYPE_MISMATCH` is reserved for an operand tag that doesn't
//! match the op's domain, not for arithmetic overflow on correctly-typed operands.
//!
//! Division and modulo panic on a zero divisor with `Panic::DivisionByZero` — an
//! extension beyond the canonical 0-18 codes, adopted because silently falling
//! through to a platform trap or a poisoned NaN would leave the VM's behavior
//! dependent on the host architecture.

use stikvm_core::{Instruction, Opcode, Panic, Value};

use super::Flow;
use crate::Vm;

pub(crate) fn execute(vm: &mut Vm, opcode: Opcode, ins: Instruction) -> Result<Flow, Panic> {
    use Opcode::*;
    match opcode {
        Add => arith_i64(vm, ins, |b, c| Ok(b.wrapping_add(c))),
        Sub => arith_i64(vm, ins, |b, c| Ok(b.wrapping_sub(c))),
        Mul => arith_i64(vm, ins, |b, c| Ok(b.wrapping_mul(c))),
        Div => arith_i64(vm, ins, |b, c| checked_div_i64(b, c)),
        Mod => arith_i64(vm, ins, |b, c| checked_rem_i64(b, c)),
        Neg => unary_i64(vm, ins, |b| b.wrapping_neg()),

        AddU => arith_u64(vm, ins, |b, c| Ok(b.wrapping_add(c))),
        SubU => arith_u64(vm, ins, |b, c| Ok(b.wrapping_sub(c))),
        MulU => arith_u64(vm, ins, |b, c| Ok(b.wrapping_mul(c))),
        DivU => arith_u64(vm, ins, |b, c| checked_div_u64(b, c)),
        ModU => arith_u64(vm, ins, |b, c| checked_rem_u64(b, c)),
        NegU => unary_u64(vm, ins, |b| b.wrapping_neg()),

        AddF => arith_f32(vm, ins, |b, c| b + c),
        SubF => arith_f32(vm, ins, |b, c| b - c),
        MulF => arith_f32(vm, ins, |b, c| b * c),
        DivF => arith_f32(vm, ins, |b, c| b / c),
        NegF => unary_f32(vm, ins, |b| -b),

        AddD => arith_f64(vm, ins, |b, c| b + c),
        SubD => arith_f64(vm, ins, |b, c| b - c),
        MulD => arith_f64(vm, ins, |b, c| b * c),
        DivD => arith_f64(vm, ins, |b, c| b / c),
        NegD => unary_f64(vm, ins, |b| -b),

        And => arith_i64(vm, ins, |b, c| Ok(b & c)),
        Or => arith_i64(vm, ins, |b, c| Ok(b | c)),
        Xor => arith_i64(vm, ins, |b, c| Ok(b ^ c)),
        BNot => unary_i64(vm, ins, |b| !b),
        Shl => arith_i64(vm, ins, |b, c| Ok(b.wrapping_shl(c as u32))),
        Shr => arith_i64(vm, ins, |b, c| Ok(b.wrapping_shr(c as u32))),

        AndU => arith_u64(vm, ins, |b, c| Ok(b & c)),
        OrU => arith_u64(vm, ins, |b, c| Ok(b | c)),
        XorU => arith_u64(vm, ins, |b, c| Ok(b ^ c)),
        BNotU => unary_u64(vm, ins, |b| !b),
        ShlU => arith_u64(vm, ins, |b, c| Ok(b.wrapping_shl(c as u32))),
        ShrU => arith_u64(vm, ins, |b, c| Ok(b.wrapping_shr(c as u32))),

        Eq => cmp_i64(vm, ins, |b, c| b == c),
        Neq => cmp_i64(vm, ins, |b, c| b != c),
        Gt => cmp_i64(vm, ins, |b, c| b > c),
        Ge => cmp_i64(vm, ins, |b, c| b >= c),
        Lt => cmp_i64(vm, ins, |b, c| b < c),
        Le => cmp_i64(vm, ins, |b, c| b <= c),

        EqU => cmp_u64(vm, ins, |b, c| b == c),
        NeqU => cmp_u64(vm, ins, |b, c| b != c),
        GtU => cmp_u64(vm, ins, |b, c| b > c),
        GeU => cmp_u64(vm, ins, |b, c| b >= c),
        LtU => cmp_u64(vm, ins, |b, c| b < c),
        LeU => cmp_u64(vm, ins, |b, c| b <= c),

        EqF => cmp_f32(vm, ins, |b, c| b == c),
        NeqF => cmp_f32(vm, ins, |b, c| b != c),
        GtF => cmp_f32(vm, ins, |b, c| b > c),
        GeF => cmp_f32(vm, ins, |b, c| b >= c),
        LtF => cmp_f32(vm, ins, |b, c| b < c),
        LeF => cmp_f32(vm, ins, |b, c| b <= c),

        EqD => cmp_f64(vm, ins, |b, c| b == c),
        NeqD => cmp_f64(vm, ins, |b, c| b != c),
        GtD => cmp_f64(vm, ins, |b, c| b > c),
        GeD => cmp_f64(vm, ins, |b, c| b >= c),
        LtD => cmp_f64(vm, ins, |b, c| b < c),
        LeD => cmp_f64(vm, ins, |b, c| b <= c),

        LNot => lnot(vm, ins),

        _ => unreachable!("arith::execute called with an opcode outside the typed matrix"),
    }
}

fn checked_div_i64(b: i64, c: i64) -> Result<i64, Panic> {
    if c == 0 {
        Err(Panic::DivisionByZero)
    } else {
        b.checked_div(c).ok_or(Panic::TypeMismatch)
    }
}

fn checked_rem_i64(b: i64, c: i64) -> Result<i64, Panic> {
    if c == 0 {
        Err(Panic::DivisionByZero)
    } else {
        b.checked_rem(c).ok_or(Panic::TypeMismatch)
    }
}

fn checked_div_u64(b: u64, c: u64) -> Result<u64, Panic> {
    if c == 0 {
        Err(Panic::DivisionByZero)
    } else {
        Ok(b / c)
    }
}

fn checked_rem_u64(b: u64, c: u64) -> Result<u64, Panic> {
    if c == 0 {
        Err(Panic::DivisionByZero)
    } else {
        Ok(b % c)
    }
}

fn arith_i64(
    vm: &mut Vm,
    ins: Instruction,
    f: impl FnOnce(i64, i64) -> Result<i64, Panic>,
) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_i64().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_i64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::i64(f(b, c)?))?;
    Ok(Flow::Continue)
}

fn unary_i64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(i64) -> i64) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_i64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::i64(f(b)))?;
    Ok(Flow::Continue)
}

fn arith_u64(
    vm: &mut Vm,
    ins: Instruction,
    f: impl FnOnce(u64, u64) -> Result<u64, Panic>,
) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_u64().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_u64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::u64(f(b, c)?))?;
    Ok(Flow::Continue)
}

fn unary_u64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(u64) -> u64) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_u64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::u64(f(b)))?;
    Ok(Flow::Continue)
}

fn arith_f32(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f32, f32) -> f32) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_float().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_float().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::float(f(b, c)))?;
    Ok(Flow::Continue)
}

fn unary_f32(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f32) -> f32) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_float().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::float(f(b)))?;
    Ok(Flow::Continue)
}

fn arith_f64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f64, f64) -> f64) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_double().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_double().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::double(f(b, c)))?;
    Ok(Flow::Continue)
}

fn unary_f64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f64) -> f64) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_double().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::double(f(b)))?;
    Ok(Flow::Continue)
}

fn cmp_i64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(i64, i64) -> bool) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_i64().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_i64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::bool(f(b, c)))?;
    Ok(Flow::Continue)
}

fn cmp_u64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(u64, u64) -> bool) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_u64().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_u64().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::bool(f(b, c)))?;
    Ok(Flow::Continue)
}

fn cmp_f32(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f32, f32) -> bool) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_float().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_float().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::bool(f(b, c)))?;
    Ok(Flow::Continue)
}

fn cmp_f64(vm: &mut Vm, ins: Instruction, f: impl FnOnce(f64, f64) -> bool) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_b())?.as_double().ok_or(Panic::TypeMismatch)?;
    let c = vm.read_local(ins.op_c())?.as_double().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::bool(f(b, c)))?;
    Ok(Flow::Continue)
}

fn lnot(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let b = vm.read_local(ins.op_a())?.as_bool().ok_or(Panic::TypeMismatch)?;
    vm.write_local(ins.op_a(), Value::bool(!b))?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stikvm_core::Opcode;

    fn vm_with(consts: Vec<Value>) -> Vm {
        crate::Vm::new_for_tests(consts)
    }

    #[test]
    fn add_requires_matching_domain() {
        let mut vm = vm_with(vec![]);
        vm.write_local(0, Value::i64(2)).unwrap();
        vm.write_local(1, Value::u64(3)).unwrap();
        let ins = Instruction::new(Opcode::Add, 2, 0, 1);
        assert_eq!(execute(&mut vm, Opcode::Add, ins).unwrap_err(), Panic::TypeMismatch);
    }

    #[test]
    fn signed_add_writes_i64_result() {
        let mut vm = vm_with(vec![]);
        vm.write_local(0, Value::i64(5)).unwrap();
        vm.write_local(1, Value::i64(-2)).unwrap();
        let ins = Instruction::new(Opcode::Add, 2, 0, 1);
        execute(&mut vm, Opcode::Add, ins).unwrap();
        assert_eq!(vm.read_local(2).unwrap().as_i64(), Some(3));
    }

    #[test]
    fn division_by_zero_panics() {
        let mut vm = vm_with(vec![]);
        vm.write_local(0, Value::i64(5)).unwrap();
        vm.write_local(1, Value::i64(0)).unwrap();
        let ins = Instruction::new(Opcode::Div, 2, 0, 1);
        assert_eq!(
            execute(&mut vm, Opcode::Div, ins).unwrap_err(),
            Panic::DivisionByZero
        );
    }

    #[test]
    fn unsigned_division_by_zero_panics() {
        let mut vm = vm_with(vec![]);
        vm.write_local(0, Value::u64(5)).unwrap();
        vm.write_local(1, Value::u64(0)).unwrap();
        let ins = Instruction::new(Opcode::DivU, 2, 0, 1);
        assert_eq!(
            execute(&mut vm, Opcode::DivU, ins).unwrap_err(),
            Panic::DivisionByZero
        );
    }

    #[test]
    fn lnot_flips_bool() {
        let mut vm = vm_with(vec![]);
        vm.write_local(0, Value::bool(true)).unwrap();
        let ins = Instruction::new(Opcode::LNot, 0, 0, 0);
        execute(&mut vm, Opcode::LNot, ins).unwrap();
        assert_eq!(vm.read_local(0).unwrap().as_bool(), Some(false));
    }
}
