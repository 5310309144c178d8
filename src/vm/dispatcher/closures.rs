//! Closure creation, calling, returning, and upvalue access.
//!
//! `MakeClosure`'s operand layout (bottom to top): `entry_pc`, `end_pc`,
//! `num_params`, `num_locals`, `is_varargs`, then one `(is_local, idx)` pair
//! per upvalue in ascending order, then the upvalue count on top
//! (`compiler/mod.rs::emit_make_closure`) — the count is pushed last, after
//! its descriptors, so this handler always finds it without first needing
//! to know how many descriptor pairs precede it.

use std::rc::Rc;

use crate::error::{VmError, VmErrorKind};

use super::{pop_address, pop_boolean, pop_index, pop_operand};
use crate::vm::call_frame::CallFrame;
use crate::vm::cell::Cell;
use crate::vm::closure::Closure;
use crate::vm::value::Value;
use crate::vm::StackVm;

fn resolve_upvalue_cell(vm: &StackVm, idx: usize) -> Result<Rc<Cell>, VmError> {
    let frame = vm.current_frame()?;
    let closure = frame.closure.as_ref().ok_or_else(|| {
        vm.fault(
            VmErrorKind::MalformedCode,
            "upvalue access outside any closure",
        )
    })?;
    closure
        .upvalues
        .get(idx)
        .cloned()
        .ok_or_else(|| vm.fault(VmErrorKind::BadConstantIndex, format!("upvalue index {idx} out of range")))
}

pub(super) fn exec_make_closure(vm: &mut StackVm) -> Result<(), VmError> {
    let upvalue_count = pop_index(vm)?;
    let mut descriptors = Vec::with_capacity(upvalue_count as usize);
    for _ in 0..upvalue_count {
        let idx = pop_index(vm)?;
        let is_local = pop_boolean(vm)?;
        descriptors.push((is_local, idx));
    }
    descriptors.reverse();

    let is_varargs = pop_boolean(vm)?;
    let num_locals = pop_index(vm)?;
    let num_params = pop_index(vm)?;
    let end_pc = pop_address(vm)?;
    let entry_pc = pop_address(vm)?;

    let mut closure = Closure::new(num_params, num_locals, is_varargs, entry_pc, end_pc);
    for (is_local, idx) in descriptors {
        let cell = if is_local {
            let stack_index = vm.current_frame()?.local_index(idx);
            vm.open_upvalues.find_or_create(stack_index)
        } else {
            resolve_upvalue_cell(vm, idx as usize)?
        };
        closure.upvalues.push(cell);
    }
    vm.operand_stack.push(Value::closure(closure));
    Ok(())
}

/// Pops the callee closure, then its explicit argument count, then that many
/// argument values (`compiler/expr.rs::compile_call`'s calling convention).
/// Arguments are reconciled against `closure.num_params`: short on args pads
/// with `nil`, long drops the trailing extras (already evaluated for any
/// side effects, simply not kept).
pub(super) fn exec_call_closure(vm: &mut StackVm) -> Result<(), VmError> {
    let callee = pop_operand(vm)?;
    let closure = match callee {
        Value::Closure(c) => c,
        other => {
            return Err(vm.fault(
                VmErrorKind::TypeMismatch,
                format!("attempt to call a {} value", other.type_name()),
            ))
        }
    };
    let num_args = pop_index(vm)?;
    let mut args = Vec::with_capacity(num_args as usize);
    for _ in 0..num_args {
        args.push(pop_operand(vm)?);
    }
    args.reverse();
    args.resize(closure.num_params as usize, Value::Nil);

    let caller_base = vm.current_frame()?.frame_base();
    let dynamic_link = vm.code.pc();

    let static_link = vm.operand_stack.top();
    for arg in args {
        vm.operand_stack.push(arg);
    }
    let extra_locals = closure.num_locals.saturating_sub(closure.num_params);
    vm.operand_stack.push_nils(extra_locals);

    let entry_pc = closure.entry_pc;
    let frame = CallFrame::new(
        closure.num_params,
        closure.num_locals,
        static_link,
        caller_base,
        dynamic_link,
        Some(closure),
    );
    vm.call_stack.push(frame);
    vm.code.set_pc(entry_pc)
}

/// Mirrors `StackVm::exec_top_level_return` but also resumes the caller:
/// restores its PC from `dynamic_link` and leaves the result on top of the
/// now-truncated operand stack.
pub(super) fn exec_return_from_closure(vm: &mut StackVm) -> Result<(), VmError> {
    let result = pop_operand(vm)?;
    let frame = vm.call_stack.pop()?;
    vm.open_upvalues
        .close_from(frame.frame_base(), &vm.operand_stack);
    vm.operand_stack.truncate_to(frame.static_link)?;
    vm.operand_stack.push(result);
    vm.code.set_pc(frame.dynamic_link)
}

pub(super) fn exec_load_upvalue(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)? as usize;
    let cell = resolve_upvalue_cell(vm, idx)?;
    let value = cell.get(&vm.operand_stack);
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_store_upvalue(vm: &mut StackVm) -> Result<(), VmError> {
    let idx = pop_index(vm)? as usize;
    let value = pop_operand(vm)?;
    let cell = resolve_upvalue_cell(vm, idx)?;
    cell.set(&mut vm.operand_stack, value);
    Ok(())
}
