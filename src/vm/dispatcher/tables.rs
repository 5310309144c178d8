//! Table instruction handlers: `NewTable`/`InsertIntoTable`/`GetFromTable`/
//! `SetInTable`/`CheckIfTableHas`/`TableLength`, the full set of operations
//! `Table` exposes to compiled code. `compiler/expr.rs`'s table-constructor
//! codegen is the other half, emitting `NewTable`/`InsertIntoTable` pairs.

use crate::error::{VmError, VmErrorKind};

use super::pop_operand;
use crate::vm::table::Table;
use crate::vm::value::Value;
use crate::vm::StackVm;

fn pop_table(vm: &mut StackVm) -> Result<std::rc::Rc<std::cell::RefCell<Table>>, VmError> {
    let v = pop_operand(vm)?;
    match v {
        Value::Table(t) => Ok(t),
        other => Err(vm.fault(
            VmErrorKind::TypeMismatch,
            format!("expected a table operand, found {}", other.type_name()),
        )),
    }
}

pub(super) fn exec_new_table(vm: &mut StackVm) -> Result<(), VmError> {
    vm.operand_stack.push(Value::table(Table::new()));
    Ok(())
}

/// Pops value, key, table; inserts and pushes the table back.
/// Append-without-dedup, so a repeated key grows a second entry.
pub(super) fn exec_insert_into_table(vm: &mut StackVm) -> Result<(), VmError> {
    let value = pop_operand(vm)?;
    let key = pop_operand(vm)?;
    let table = pop_table(vm)?;
    table.borrow_mut().insert(key, value);
    vm.operand_stack.push(Value::Table(table));
    Ok(())
}

/// A pure store: pops value, key, table and overwrites the existing entry
/// (or inserts if absent), leaving nothing on the operand stack — this is
/// what `a.b = v`/`a[k] = v` assignment codegen needs (statement context,
/// no result to reuse).
pub(super) fn exec_set_in_table(vm: &mut StackVm) -> Result<(), VmError> {
    let value = pop_operand(vm)?;
    let key = pop_operand(vm)?;
    let table = pop_table(vm)?;
    table.borrow_mut().set(key, value);
    Ok(())
}

/// Fails with a VM error if the key is absent.
pub(super) fn exec_get_from_table(vm: &mut StackVm) -> Result<(), VmError> {
    let key = pop_operand(vm)?;
    let table = pop_table(vm)?;
    let value = table
        .borrow()
        .get(&key)
        .cloned()
        .ok_or_else(|| vm.fault(VmErrorKind::MissingTableEntry, format!("no entry for key {key}")))?;
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn exec_check_if_table_has(vm: &mut StackVm) -> Result<(), VmError> {
    let key = pop_operand(vm)?;
    let table = pop_table(vm)?;
    let has = table.borrow().has(&key);
    vm.operand_stack.push(Value::Boolean(has));
    Ok(())
}

pub(super) fn exec_table_length(vm: &mut StackVm) -> Result<(), VmError> {
    let table = pop_table(vm)?;
    let len = table.borrow().border_length();
    vm.operand_stack.push(Value::Number(len as f64));
    Ok(())
}
