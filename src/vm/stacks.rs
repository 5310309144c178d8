//! The four cooperating stacks: operand, call, code, and the open-upvalue
//! list that functions as the upvalue stack. Each growable stack is a flat
//! `Vec` with push/pop and half-open-slice-checked indexing; indexing past
//! the logical top is a `VmError::StackFlow`.

use std::rc::Rc;

use crate::error::{VmError, VmErrorKind, VmTrace};

use super::call_frame::CallFrame;
use super::cell::Cell;
use super::code::Code;
use super::value::{Address, Value};

fn flow_error(message: impl Into<String>) -> VmError {
    VmError::new(VmErrorKind::StackFlow, message, VmTrace::default())
}

pub struct OperandStack {
    slots: Vec<Value>,
}

impl OperandStack {
    pub fn new() -> Self {
        OperandStack { slots: Vec::new() }
    }

    pub fn top(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.slots
            .pop()
            .ok_or_else(|| flow_error("operand stack underflow on pop"))
    }

    pub fn get(&self, index: usize) -> &Value {
        &self.slots[index]
    }

    pub fn try_get(&self, index: usize) -> Result<&Value, VmError> {
        self.slots
            .get(index)
            .ok_or_else(|| flow_error(format!("operand stack index {index} out of range")))
    }

    pub fn set(&mut self, index: usize, value: Value) {
        self.slots[index] = value;
    }

    pub fn try_set(&mut self, index: usize, value: Value) -> Result<(), VmError> {
        if index >= self.slots.len() {
            return Err(flow_error(format!(
                "operand stack index {index} out of range"
            )));
        }
        self.slots[index] = value;
        Ok(())
    }

    /// Pushes `count` nils — used to materialize uninitialized locals.
    pub fn push_nils(&mut self, count: u64) {
        for _ in 0..count {
            self.slots.push(Value::Nil);
        }
    }

    /// Truncates the stack back to `top`, a half-open bound: slots
    /// `[top, len)` are dropped. `top > len` is an overflow.
    pub fn truncate_to(&mut self, top: usize) -> Result<(), VmError> {
        if top > self.slots.len() {
            return Err(flow_error(format!(
                "cannot truncate to {top}, only {} slots present",
                self.slots.len()
            )));
        }
        self.slots.truncate(top);
        Ok(())
    }
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Result<CallFrame, VmError> {
        self.frames
            .pop()
            .ok_or_else(|| flow_error("call stack underflow on return"))
    }

    pub fn current(&self) -> Result<&CallFrame, VmError> {
        self.frames
            .last()
            .ok_or_else(|| flow_error("no active call frame"))
    }

    pub fn current_mut(&mut self) -> Result<&mut CallFrame, VmError> {
        self.frames
            .last_mut()
            .ok_or_else(|| flow_error("no active call frame"))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared code stream plus a PC cursor. `fetch` advances the cursor
/// (the dispatcher's `pop_code()`); `Branch*` instructions instead assign
/// `pc` directly.
pub struct CodeCursor {
    code: Rc<Vec<Code>>,
    pc: usize,
}

impl CodeCursor {
    pub fn new(code: Rc<Vec<Code>>, pc: usize) -> Self {
        CodeCursor { code, pc }
    }

    pub fn pc(&self) -> Address {
        self.pc as Address
    }

    pub fn set_pc(&mut self, pc: Address) -> Result<(), VmError> {
        if pc < 0 || pc as usize > self.code.len() {
            return Err(flow_error(format!("branch to out-of-range address {pc}")));
        }
        self.pc = pc as usize;
        Ok(())
    }

    /// Fetches the unit at the current PC and advances.
    pub fn fetch(&mut self) -> Result<&Code, VmError> {
        let unit = self
            .code
            .get(self.pc)
            .ok_or_else(|| flow_error(format!("PC {} past end of code", self.pc)))?;
        self.pc += 1;
        Ok(unit)
    }

    /// Fetches the unit at the current PC, advances, and requires it to be
    /// an inline `Value` — backs `LoadFromCodeTOS`, which reads its operand
    /// straight out of the code stream rather than the operand stack.
    pub fn fetch_val(&mut self) -> Result<Value, VmError> {
        match self.fetch()?.as_value() {
            Some(v) => Ok(v.clone()),
            None => Err(flow_error("expected an inline value in the code stream")),
        }
    }

    /// Reads the `Value` at an absolute address without moving the cursor —
    /// backs `LoadFromCodeAtOffset`'s addressed (non-sequential) access.
    pub fn peek_val_at(&self, addr: Address) -> Result<Value, VmError> {
        if addr < 0 {
            return Err(flow_error(format!("negative code address {addr}")));
        }
        match self.code.get(addr as usize).and_then(Code::as_value) {
            Some(v) => Ok(v.clone()),
            None => Err(flow_error(format!(
                "no inline value at code address {addr}"
            ))),
        }
    }

    pub fn code(&self) -> &Rc<Vec<Code>> {
        &self.code
    }
}

/// Open upvalues created while executing the current program, in creation
/// order. Closing scans from the end (most-recently-opened first) and stops
/// once it reaches a cell below the closing frame's base.
#[derive(Default)]
pub struct OpenUpvalues {
    cells: Vec<Rc<Cell>>,
}

impl OpenUpvalues {
    pub fn new() -> Self {
        OpenUpvalues::default()
    }

    pub fn track(&mut self, cell: Rc<Cell>) {
        self.cells.push(cell);
    }

    /// Returns the open cell already tracking `stack_index`, if any, so two
    /// closures capturing the same local slot share one cell rather than
    /// each observing the other's writes through a separate copy. Creates
    /// and tracks a fresh open cell otherwise.
    pub fn find_or_create(&mut self, stack_index: usize) -> Rc<Cell> {
        if let Some(existing) = self
            .cells
            .iter()
            .find(|cell| cell.is_open_at(stack_index))
        {
            return Rc::clone(existing);
        }
        let cell = Cell::new_open(stack_index);
        self.cells.push(Rc::clone(&cell));
        cell
    }

    /// Closes every open cell referencing a stack slot at or above
    /// `frame_base`, then drops them from the tracking list — closing is
    /// idempotent and the cells themselves may still be held by surviving
    /// closures.
    pub fn close_from(&mut self, frame_base: usize, stack: &OperandStack) {
        self.cells.retain(|cell| {
            if cell.is_open_at_or_above(frame_base) {
                cell.close(stack);
                false
            } else {
                true
            }
        });
    }
}
