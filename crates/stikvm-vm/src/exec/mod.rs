//! Fetch-decode-execute dispatch, split by concern: control flow, data movement,
//! the typed arithmetic/compare/bitwise matrix, numeric casts, and the call
//! protocol each get their own module.

pub(crate) mod arith;
pub(crate) mod call;
pub(crate) mod cast;
pub(crate) mod control;
pub(crate) mod data;

use stikvm_core::{Instruction, Opcode, Panic};

use crate::Vm;

/// What the dispatch loop should do after one instruction executes.
pub(crate) enum Flow {
    Continue,
    Halt,
    /// The bytecode's own `PANIC` opcode fired with an explicit, emitter-chosen code.
    /// This is not one of the interpreter's own `Panic` variants, so it travels as a
    /// success value rather than an `Err`.
    ExplicitPanic(u32),
}

pub(crate) fn dispatch(vm: &mut Vm, ins: Instruction) -> Result<Flow, Panic> {
    let opcode = ins.opcode().ok_or(Panic::InvalidOpcode)?;

    use Opcode::*;
    match opcode {
        Halt => control::halt(),
        Panic => control::panic_op(ins),
        Jmp => control::jmp(vm, ins),
        JmpIf => control::jmp_if(vm, ins),
        JmpIfZ => control::jmp_if_z(vm, ins),

        Call => call::call(vm, ins),
        Ret => call::ret(vm, ins),

        Copy => data::copy(vm, ins),
        Move => data::move_(vm, ins),
        LoadI => data::load_i(vm, ins),
        LoadC => data::load_c(vm, ins),
        LoadG => data::load_g(vm, ins),
        StoreG => data::store_g(vm, ins),

        Add | Sub | Mul | Div | Mod | Neg | AddU | SubU | MulU | DivU | ModU | NegU | AddF
        | SubF | MulF | DivF | NegF | AddD | SubD | MulD | DivD | NegD | And | Or | Xor | BNot
        | Shl | Shr | AndU | OrU | XorU | BNotU | ShlU | ShrU | Eq | Neq | Gt | Ge | Lt | Le
        | EqU | NeqU | GtU | GeU | LtU | LeU | EqF | NeqF | GtF | GeF | LtF | LeF | EqD | NeqD
        | GtD | GeD | LtD | LeD | LNot => arith::execute(vm, opcode, ins),

        I2D | I2F | D2I | F2I | I2U | U2I | U2D | U2F | D2U | F2U => {
            cast::execute(vm, opcode, ins)
        }
    }
}
