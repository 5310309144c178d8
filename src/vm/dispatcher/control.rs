//! Logical, comparison, string-concat, and control-flow instruction
//! handlers.
//!
//! `Conjunction`/`Disjunction`/`Not` apply Lua truthiness rather than
//! requiring strict `Boolean` operands, since the compiler's eager
//! (non-short-circuiting) lowering of `and`/`or`/`not` (`compiler/expr.rs`)
//! feeds them arbitrary values — `local x = 0 or "y"` must still work.

use crate::error::{VmError, VmErrorKind};

use super::{pop_address, pop_boolean, pop_number, pop_operand, Value};
use crate::vm::StackVm;

pub(super) fn exec_conjunction(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_operand(vm)?;
    let lhs = pop_operand(vm)?;
    vm.operand_stack
        .push(if lhs.is_truthy() { rhs } else { lhs });
    Ok(())
}

pub(super) fn exec_disjunction(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_operand(vm)?;
    let lhs = pop_operand(vm)?;
    vm.operand_stack
        .push(if lhs.is_truthy() { lhs } else { rhs });
    Ok(())
}

pub(super) fn exec_not(vm: &mut StackVm) -> Result<(), VmError> {
    let v = pop_operand(vm)?;
    vm.operand_stack.push(Value::Boolean(!v.is_truthy()));
    Ok(())
}

/// Concatenates `Number`/`String` operands via `Value`'s own `Display`, so
/// `1 .. "x"` renders its number operand the same way returning it would.
pub(super) fn exec_concat_string(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_operand(vm)?;
    let lhs = pop_operand(vm)?;
    let lhs_str = concat_operand(vm, &lhs)?;
    let rhs_str = concat_operand(vm, &rhs)?;
    vm.operand_stack
        .push(Value::string(format!("{lhs_str}{rhs_str}")));
    Ok(())
}

fn concat_operand(vm: &StackVm, v: &Value) -> Result<String, VmError> {
    match v {
        Value::String(_) | Value::Number(_) => Ok(v.to_string()),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("cannot concatenate a {}", other.type_name()),
        )),
    }
}

pub(super) fn exec_eq(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_operand(vm)?;
    let lhs = pop_operand(vm)?;
    vm.operand_stack.push(Value::Boolean(lhs == rhs));
    Ok(())
}

pub(super) fn exec_ne(vm: &mut StackVm) -> Result<(), VmError> {
    let rhs = pop_operand(vm)?;
    let lhs = pop_operand(vm)?;
    vm.operand_stack.push(Value::Boolean(lhs != rhs));
    Ok(())
}

fn compare(vm: &mut StackVm, f: impl FnOnce(f64, f64) -> bool) -> Result<(), VmError> {
    let rhs = pop_number(vm)?;
    let lhs = pop_number(vm)?;
    vm.operand_stack.push(Value::Boolean(f(lhs, rhs)));
    Ok(())
}

pub(super) fn exec_lt(vm: &mut StackVm) -> Result<(), VmError> {
    compare(vm, |a, b| a < b)
}

pub(super) fn exec_le(vm: &mut StackVm) -> Result<(), VmError> {
    compare(vm, |a, b| a <= b)
}

pub(super) fn exec_gt(vm: &mut StackVm) -> Result<(), VmError> {
    compare(vm, |a, b| a > b)
}

pub(super) fn exec_ge(vm: &mut StackVm) -> Result<(), VmError> {
    compare(vm, |a, b| a >= b)
}

/// Shared by all three branch instructions: validates the target stays
/// within the currently-executing closure's `[entry_pc, end_pc)` range,
/// then moves the code cursor. The synthetic root frame (`closure: None`)
/// has no such range to check against, so any in-bounds code address is
/// accepted there.
fn branch_to(vm: &mut StackVm, addr: super::Address) -> Result<(), VmError> {
    if let Ok(frame) = vm.call_stack.current() {
        if let Some(closure) = &frame.closure {
            if !closure.contains_pc(addr) {
                return Err(vm.fault(
                    VmErrorKind::MalformedCode,
                    format!(
                        "branch target {addr} outside the current closure's code range [{}, {})",
                        closure.entry_pc, closure.end_pc
                    ),
                ));
            }
        }
    }
    vm.code.set_pc(addr)
}

pub(super) fn exec_branch(vm: &mut StackVm) -> Result<(), VmError> {
    let addr = pop_address(vm)?;
    branch_to(vm, addr)
}

pub(super) fn exec_branch_if_true(vm: &mut StackVm) -> Result<(), VmError> {
    let addr = pop_address(vm)?;
    let cond = pop_boolean(vm)?;
    if cond {
        branch_to(vm, addr)?;
    }
    Ok(())
}

pub(super) fn exec_branch_if_false(vm: &mut StackVm) -> Result<(), VmError> {
    let addr = pop_address(vm)?;
    let cond = pop_boolean(vm)?;
    if !cond {
        branch_to(vm, addr)?;
    }
    Ok(())
}
