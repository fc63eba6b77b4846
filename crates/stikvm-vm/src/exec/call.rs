//! The call/return protocol: invoking bytecode and native callables, and
//! unwinding a frame back to its caller on return.

use stikvm_core::{Func, Instruction, Panic, MAX_REGISTERS};

use super::Flow;
use crate::Vm;

pub(crate) fn call(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let callee_value = vm.read_local(ins.op_a())?;
    let func_ptr = callee_value.as_callable().ok_or(Panic::InvalidCallable)?;
    if func_ptr.is_null() {
        return Err(Panic::InvalidCallable);
    }

    // SAFETY: every CALLABLE payload reaching this point was either patched by the
    // loader from the constant pool or written by a native callable, both of which
    // only ever store pointers into `vm.funcs`, which lives as long as `vm` does.
    let func = unsafe { &*func_ptr };

    let argc = ins.op_b() as u16;
    let dest_local = ins.op_c();

    match func {
        Func::Native(native) => {
            if argc != native.argc {
                return Err(Panic::CallFailed);
            }
            let current = *vm.frames.current()?;
            let args_base = current.base as u32 + ins.op_a() as u32 + 1;
            let dest = current.base as u32 + dest_local as u32;
            let vm_ptr = vm as *mut Vm as *mut core::ffi::c_void;
            // SAFETY: the native function is trusted to honor the `(base, argc, dest)`
            // contract and to write its result into the destination register before
            // returning.
            unsafe {
                (native.func)(vm_ptr, args_base, argc, dest);
            }
            Ok(Flow::Continue)
        }
        Func::Bytecode(bc) => {
            if argc != bc.argc {
                return Err(Panic::CallFailed);
            }
            let current = *vm.frames.current()?;
            let new_base = current.base as u32 + current.regc as u32;
            if new_base as usize + bc.regc as usize > MAX_REGISTERS {
                return Err(Panic::RegLimit);
            }

            vm.frames.push(crate::frame::Frame {
                jump: vm.ip as u32,
                base: new_base as u16,
                regc: bc.regc,
                reg: dest_local as u16,
                callee: func_ptr as *const Func,
            })?;
            vm.ip = bc.entry_ip as usize;
            Ok(Flow::Continue)
        }
    }
}

pub(crate) fn ret(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let value = vm.read_local(ins.op_a())?;
    let popped = vm.frames.pop()?;

    if vm.frames.is_empty() {
        return Ok(Flow::Halt);
    }

    vm.ip = popped.jump as usize;
    let restored = *vm.frames.current()?;
    let dest = restored.base as usize + popped.reg as usize;
    vm.registers.set(dest, value)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stikvm_core::{BytecodeFunc, Opcode, Value};

    #[test]
    fn ret_off_entry_frame_halts() {
        let mut vm = Vm::new_for_tests(vec![]);
        vm.write_local(0, Value::i64(7)).unwrap();
        let ins = Instruction::new(Opcode::Ret, 0, 0, 0);
        match ret(&mut vm, ins).unwrap() {
            Flow::Halt => {}
            _ => panic!("expected Halt"),
        }
    }

    #[test]
    fn call_to_null_callable_is_invalid() {
        let mut vm = Vm::new_for_tests(vec![]);
        vm.write_local(0, Value::callable(core::ptr::null_mut())).unwrap();
        let ins = Instruction::new(Opcode::Call, 0, 0, 1);
        assert_eq!(call(&mut vm, ins).unwrap_err(), Panic::InvalidCallable);
    }

    #[test]
    fn call_with_wrong_argc_fails() {
        let mut vm = Vm::new_for_tests(vec![]);
        let mut func = Box::new(Func::Bytecode(BytecodeFunc {
            entry_ip: 3,
            argc: 2,
            regc: 4,
        }));
        let ptr: *mut Func = &mut *func;
        vm.write_local(0, Value::callable(ptr)).unwrap();
        vm.funcs.push(func);

        let ins = Instruction::new(Opcode::Call, 0, 1, 1);
        assert_eq!(call(&mut vm, ins).unwrap_err(), Panic::CallFailed);
    }
}
