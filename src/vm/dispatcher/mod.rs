//! The fetch-decode-execute loop's per-instruction handlers, grouped by
//! semantics across `arithmetic.rs`, `tables.rs`, `memory.rs`, `closures.rs`,
//! and `control.rs`.
//!
//! Each handler pops its operands off the VM's operand stack, does its
//! work, and pushes its result back (or nothing, for a pure store). None
//! of them touch the code cursor directly except the control-flow and
//! call/return handlers in `closures.rs`/`control.rs`.

mod arithmetic;
mod closures;
mod control;
mod memory;
mod tables;

use crate::error::{VmError, VmErrorKind};

use super::code::Instruction;
use super::value::{Address, Value};
use super::StackVm;

pub(super) fn dispatch(vm: &mut StackVm, instr: Instruction) -> Result<(), VmError> {
    use Instruction::*;
    match instr {
        Add => arithmetic::exec_add(vm),
        Sub => arithmetic::exec_sub(vm),
        Mul => arithmetic::exec_mul(vm),
        Div => arithmetic::exec_div(vm),
        Mod => arithmetic::exec_mod(vm),
        FPow => arithmetic::exec_fpow(vm),
        IPow => arithmetic::exec_ipow(vm),
        Negate => arithmetic::exec_negate(vm),
        TruncateReal => arithmetic::exec_truncate_real(vm),
        FloorReal => arithmetic::exec_floor_real(vm),

        BitwiseAnd => arithmetic::exec_bitwise_and(vm),
        BitwiseOr => arithmetic::exec_bitwise_or(vm),
        BitwiseXor => arithmetic::exec_bitwise_xor(vm),
        BitwiseNot => arithmetic::exec_bitwise_not(vm),
        BitwiseShiftLeft => arithmetic::exec_shift_left(vm),
        BitwiseShiftRight => arithmetic::exec_shift_right(vm),

        Conjunction => control::exec_conjunction(vm),
        Disjunction => control::exec_disjunction(vm),
        Not => control::exec_not(vm),
        ConcatString => control::exec_concat_string(vm),

        Eq => control::exec_eq(vm),
        Ne => control::exec_ne(vm),
        Lt => control::exec_lt(vm),
        Le => control::exec_le(vm),
        Gt => control::exec_gt(vm),
        Ge => control::exec_ge(vm),

        Pop => memory::exec_pop(vm),
        LoadLocal => memory::exec_load_local(vm),
        StoreLocal => memory::exec_store_local(vm),
        LoadGlobal => memory::exec_load_global(vm),
        StoreGlobal => memory::exec_store_global(vm),
        LoadGlobalPointer => memory::exec_load_global_pointer(vm),
        LoadConstantAtCallTOS => memory::exec_load_constant(vm),
        StoreConstantAtCallTOS => memory::exec_store_constant(vm),
        LoadNthArgument => memory::exec_load_nth_argument(vm),
        LoadFromCodeTOS => memory::exec_load_from_code_tos(vm),
        LoadFromCodeAtOffset => memory::exec_load_from_code_at_offset(vm),

        NewTable => tables::exec_new_table(vm),
        InsertIntoTable => tables::exec_insert_into_table(vm),
        SetInTable => tables::exec_set_in_table(vm),
        GetFromTable => tables::exec_get_from_table(vm),
        CheckIfTableHas => tables::exec_check_if_table_has(vm),
        TableLength => tables::exec_table_length(vm),

        MakeClosure => closures::exec_make_closure(vm),
        CallClosure => closures::exec_call_closure(vm),
        ReturnFromClosure => closures::exec_return_from_closure(vm),
        LoadUpvalue => closures::exec_load_upvalue(vm),
        StoreUpvalue => closures::exec_store_upvalue(vm),
        CallConcurrently => Err(vm.raise(
            VmErrorKind::MalformedCode,
            "CallConcurrently has no implementation: concurrent closure execution is an explicit non-goal",
        )),

        Branch => control::exec_branch(vm),
        BranchIfTrue => control::exec_branch_if_true(vm),
        BranchIfFalse => control::exec_branch_if_false(vm),
    }
}

/// Pops the operand stack, turning an empty stack into a `VmError` that
/// carries a proper fault snapshot (unlike `OperandStack::pop`'s own
/// default-trace error, which the dispatcher never calls directly).
pub(super) fn pop_operand(vm: &mut StackVm) -> Result<Value, VmError> {
    if vm.operand_stack.top() == 0 {
        return Err(vm.fault(VmErrorKind::StackFlow, "operand stack underflow on pop"));
    }
    Ok(vm.operand_stack.pop().expect("checked non-empty above"))
}

pub(super) fn pop_number(vm: &mut StackVm) -> Result<f64, VmError> {
    let v = pop_operand(vm)?;
    match v {
        Value::Number(n) => Ok(n),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected a number operand, found {}", other.type_name()),
        )),
    }
}

pub(super) fn pop_boolean(vm: &mut StackVm) -> Result<bool, VmError> {
    let v = pop_operand(vm)?;
    match v {
        Value::Boolean(b) => Ok(b),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected a boolean operand, found {}", other.type_name()),
        )),
    }
}

pub(super) fn pop_index(vm: &mut StackVm) -> Result<u64, VmError> {
    let v = pop_operand(vm)?;
    match v {
        Value::Index(i) => Ok(i),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected an index operand, found {}", other.type_name()),
        )),
    }
}

pub(super) fn pop_address(vm: &mut StackVm) -> Result<Address, VmError> {
    let v = pop_operand(vm)?;
    match v {
        Value::Address(a) => Ok(a),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected an address operand, found {}", other.type_name()),
        )),
    }
}

/// Every bitwise instruction's operands must be non-negative; cast through
/// `u64` so the bitwise handlers operate on plain unsigned integers.
pub(super) fn number_to_u64(vm: &StackVm, n: f64) -> Result<u64, VmError> {
    if n.is_nan() || n < 0.0 {
        return Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected a non-negative number for a bitwise operand, found {n}"),
        ));
    }
    Ok(n as u64)
}
