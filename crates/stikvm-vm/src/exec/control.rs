//! HALT, PANIC, and the jump family.

use stikvm_core::{Instruction, Panic};

use super::Flow;
use crate::Vm;

pub(crate) fn halt() -> Result<Flow, Panic> {
    Ok(Flow::Halt)
}

pub(crate) fn panic_op(ins: Instruction) -> Result<Flow, Panic> {
    Ok(Flow::ExplicitPanic(ins.op_a() as u32))
}

pub(crate) fn jmp(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    vm.jump_relative(ins.simm24())?;
    Ok(Flow::Continue)
}

pub(crate) fn jmp_if(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let cond = vm.read_local(ins.op_a())?;
    if !cond.is_falsy() {
        vm.jump_relative(ins.simm16())?;
    }
    Ok(Flow::Continue)
}

pub(crate) fn jmp_if_z(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let cond = vm.read_local(ins.op_a())?;
    if cond.is_falsy() {
        vm.jump_relative(ins.simm16())?;
    }
    Ok(Flow::Continue)
}
