//! Memory instruction handlers: locals, globals, the frame constant pool,
//! arguments, and inline code-stream values.
//!
//! Every one of these (except `LoadFromCodeTOS`/`LoadFromCodeAtOffset`)
//! takes its index from the operand-stack top — the compiler always emits
//! the index constant immediately before the instruction, and for stores,
//! the value being stored immediately before that
//! (`compiler/expr.rs::emit_load_local`/`emit_store_local`).

use crate::error::{VmError, VmErrorKind};
use crate::vm::call_frame::MAX_CONST;

use super::{pop_address, pop_index, pop_operand};
use crate::vm::StackVm;

pub(super) fn exec_pop(vm: &mut StackVm) -> Result<(), VmError> {
    pop_operand(vm)?;
    Ok(())
}

pub(super) fn exec_load_local(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let slot = vm.current_frame()?.local_index(idx);
    let value = vm
        .operand_stack
        .try_get(slot)
        .map_err(|_| vm.fault(VmErrorKind::StackFlow, format!("local slot {idx} out of range")))?
        .clone();
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_store_local(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let value = pop_operand(vm)?;
    let slot = vm.current_frame()?.local_index(idx);
    vm.operand_stack
        .try_set(slot, value)
        .map_err(|_| vm.fault(VmErrorKind::StackFlow, format!("local slot {idx} out of range")))
}

pub(super) fn exec_load_nth_argument(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let slot = vm.current_frame()?.argument_index(idx);
    let value = vm
        .operand_stack
        .try_get(slot)
        .map_err(|_| {
            vm.fault(
                VmErrorKind::StackFlow,
                format!("argument slot {idx} out of range"),
            )
        })?
        .clone();
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_load_global(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let cell = vm.global(idx as usize)?.clone();
    vm.operand_stack.push(cell.get(&vm.operand_stack));
    Ok(())
}

pub(super) fn exec_store_global(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let value = pop_operand(vm)?;
    let cell = vm.global(idx as usize)?.clone();
    cell.set(&mut vm.operand_stack, value);
    Ok(())
}

pub(super) fn exec_load_global_pointer(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)?;
    let cell = vm.global(idx as usize)?.clone();
    vm.operand_stack.push(super::Value::ValuePointer(cell));
    Ok(())
}

pub(super) fn exec_load_constant(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)? as usize;
    if idx >= MAX_CONST {
        return Err(vm.fault(
            VmErrorKind::BadConstantIndex,
            format!("constant index {idx} out of range [0, {MAX_CONST})"),
        ));
    }
    let value = vm
        .current_frame()?
        .get_constant(idx)
        .cloned()
        .unwrap_or(super::Value::Nil);
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_store_constant(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)? as usize;
    let value = pop_operand(vm)?;
    if idx >= MAX_CONST {
        return Err(vm.fault(
            VmErrorKind::BadConstantIndex,
            format!("constant index {idx} out of range [0, {MAX_CONST})"),
        ));
    }
    vm.call_stack.current_mut()?.set_constant(idx, value);
    Ok(())
}

pub(super) fn exec_load_from_code_tos(vm: &mut StackVm) -> Result<(), VmError> {
    let value = vm.code.fetch_val()?;
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_load_from_code_at_offset(vm: &mut StackVm) -> Result<(), VmError> {
    let offset = pop_address(vm)?;
    let value = vm.code.peek_val_at(offset)?;
    vm.operand_stack.push(value);
    Ok(())
}
