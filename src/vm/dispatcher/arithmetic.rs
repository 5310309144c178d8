//! Arithmetic and bitwise instruction handlers.
//!
//! Every binary handler here pops its right operand before its left one,
//! since the compiler always emits the left operand's code before the
//! right's (`compiler/expr.rs::compile_binary`), leaving the right operand
//! on top of the operand stack when the instruction executes.

use crate::error::{VmError, VmErrorKind};

use super::{number_to_u64, pop_number, Value};
use crate::vm::StackVm;

fn binary_number(
    vm: &mut StackVm,
    f: impl FnOnce(f64, f64) -> f64,
) -> Result<(), VmError> {
    let rhs = pop_number(vm)?;
    let lhs = pop_number(vm)?;
    vm.operand_stack.push(Value::Number(f(lhs, rhs)));
    Ok(())
}

pub(super) fn exec_add(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a + b)
}

pub(super) fn exec_sub(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a - b)
}

pub(super) fn exec_mul(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a * b)
}

pub(super) fn exec_div(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a / b)
}

/// Integer semantics via floor to unsigned 64-bit: both operands are
/// floored and cast to `u64` before the modulo, not Lua's usual
/// floating-point floor-mod.
pub(super) fn exec_mod(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_number(vm)?;
    let lhs = pop_number(vm)?;
    let b = number_to_u64(vm, rhs.floor())?;
    let a = number_to_u64(vm, lhs.floor())?;
    if b == 0 {
        return Err(vm.fault(VmErrorKind::TypeMismatch, "modulo by zero"));
    }
    vm.operand_stack.push(Value::Number((a % b) as f64));
    Ok(())
}

pub(super) fn exec_fpow(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a.powf(b))
}

pub(super) fn exec_ipow(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| a.powi(b as i32))
}

/// Lowers the `//` floor-division operator (`compiler/expr.rs`'s
/// `BinOp::FloorDiv`). `FloorReal` sits alongside the unary `Negate`/
/// `TruncateReal` opcodes, but a floor *division* inherently needs two
/// operands, so this handler treats it as binary.
pub(super) fn exec_floor_real(vm: &mut StackVm) -> Result<(), VmError> {
    binary_number(vm, |a, b| (a / b).floor())
}

pub(super) fn exec_negate(vm: &mut StackVm) -> Result<(), VmError> {
    let n = pop_number(vm)?;
    vm.operand_stack.push(Value::Number(-n));
    Ok(())
}

pub(super) fn exec_truncate_real(vm: &mut StackVm) -> Result<(), VmError> {
    let n = pop_number(vm)?;
    vm.operand_stack.push(Value::Number(n.trunc()));
    Ok(())
}

fn binary_bitwise(vm: &mut StackVm, f: impl FnOnce(u64, u64) -> u64) -> Result<(), VmError> {
    let rhs = pop_number(vm)?;
    let lhs = pop_number(vm)?;
    let b = number_to_u64(vm, rhs)?;
    let a = number_to_u64(vm, lhs)?;
    vm.operand_stack.push(Value::Number(f(a, b) as f64));
    Ok(())
}

pub(super) fn exec_bitwise_and(vm: &mut StackVm) -> Result<(), VmError> {
    binary_bitwise(vm, |a, b| a & b)
}

pub(super) fn exec_bitwise_or(vm: &mut StackVm) -> Result<(), VmError> {
    binary_bitwise(vm, |a, b| a | b)
}

pub(super) fn exec_bitwise_xor(vm: &mut StackVm) -> Result<(), VmError> {
    binary_bitwise(vm, |a, b| a ^ b)
}

pub(super) fn exec_bitwise_not(vm: &mut StackVm) -> Result<(), VmError> {
    let n = pop_number(vm)?;
    let a = number_to_u64(vm, n)?;
    vm.operand_stack.push(Value::Number(!a as f64));
    Ok(())
}

/// The shift amount is the right-hand operand (`a << amount`), consumed
/// first since it was pushed last; must land in `[1,64]`.
pub(super) fn exec_shift_left(vm: &mut StackVm) -> Result<(), VmError> {
    let amount = pop_number(vm)?;
    let value = pop_number(vm)?;
    let shift = shift_amount(vm, amount)?;
    let a = number_to_u64(vm, value)?;
    let result = if shift >= 64 { 0 } else { a << shift };
    vm.operand_stack.push(Value::Number(result as f64));
    Ok(())
}

pub(super) fn exec_shift_right(vm: &mut StackVm) -> Result<(), VmError> {
    let amount = pop_number(vm)?;
    let value = pop_number(vm)?;
    let shift = shift_amount(vm, amount)?;
    let a = number_to_u64(vm, value)?;
    let result = if shift >= 64 { 0 } else { a >> shift };
    vm.operand_stack.push(Value::Number(result as f64));
    Ok(())
}

fn shift_amount(vm: &StackVm, n: f64) -> Result<u32, VmError> {
    let i = n as i64;
    if !(1..=64).contains(&i) {
        return Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("shift amount {i} out of range [1,64]"),
        ));
    }
    Ok(i as u32)
}
