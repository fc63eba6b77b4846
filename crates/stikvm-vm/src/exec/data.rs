//! Register/constant/global data movement: COPY, MOVE, LOADI, LOADC, LOADG, STOREG.

use stikvm_core::{Instruction, Panic, Value};

use super::Flow;
use crate::Vm;

pub(crate) fn copy(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = vm.read_local(ins.op_b())?;
    vm.write_local(ins.op_a(), value)?;
    Ok(Flow::Continue)
}

pub(crate) fn move_(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = vm.read_local(ins.op_b())?;
    vm.write_local(ins.op_a(), value)?;
    vm.clear_local(ins.op_b())?;
    Ok(Flow::Continue)
}

pub(crate) fn load_i(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    vm.write_local(ins.op_a(), Value::i64(ins.simm16() as i64))?;
    Ok(Flow::Continue)
}

pub(crate) fn load_c(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = *vm
        .consts
        .get(ins.op_b() as usize)
        .ok_or(Panic::OutOfBounds)?;
    vm.write_local(ins.op_a(), value)?;
    Ok(Flow::Continue)
}

pub(crate) fn load_g(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = *vm
        .globals
        .get(ins.op_b() as usize)
        .ok_or(Panic::OutOfBounds)?;
    vm.write_local(ins.op_a(), value)?;
    Ok(Flow::Continue)
}

pub(crate) fn store_g(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = vm.read_local(ins.op_a())?;
    let slot = vm
        .globals
        .get_mut(ins.op_b() as usize)
        .ok_or(Panic::OutOfBounds)?;
    *slot = value;
    Ok(Flow::Continue)
}
