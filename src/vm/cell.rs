//! `Cell`: the single indirection primitive behind both upvalues and
//! globals. Open cells reference a live operand-stack slot; closed cells
//! own their value outright. A cell closes when its owning frame returns,
//! copying the slot's current value out so captured closures keep seeing
//! it after the stack slot itself is gone — this indirection is what lets
//! a stack index stand in safely for what would otherwise be a raw pointer
//! into the stack.

use std::cell::RefCell;
use std::rc::Rc;

use super::stacks::OperandStack;
use super::value::Value;

enum CellState {
    /// References `operand_stack[index]` in the owning (still-live) frame.
    Open(usize),
    /// Owns its value outright; reached once the owning frame has returned,
    /// or always, for a global.
    Closed(Value),
}

pub struct Cell(RefCell<CellState>);

impl Cell {
    pub fn new_open(stack_index: usize) -> Rc<Cell> {
        Rc::new(Cell(RefCell::new(CellState::Open(stack_index))))
    }

    pub fn new_closed(value: Value) -> Rc<Cell> {
        Rc::new(Cell(RefCell::new(CellState::Closed(value))))
    }

    pub fn get(&self, stack: &OperandStack) -> Value {
        match &*self.0.borrow() {
            CellState::Open(index) => stack.get(*index).clone(),
            CellState::Closed(value) => value.clone(),
        }
    }

    pub fn set(&self, stack: &mut OperandStack, value: Value) {
        let index = match &*self.0.borrow() {
            CellState::Open(index) => Some(*index),
            CellState::Closed(_) => None,
        };
        match index {
            Some(index) => stack.set(index, value),
            None => *self.0.borrow_mut() = CellState::Closed(value),
        }
    }

    pub fn is_open_at_or_above(&self, stack_index: usize) -> bool {
        matches!(&*self.0.borrow(), CellState::Open(index) if *index >= stack_index)
    }

    pub fn is_open_at(&self, stack_index: usize) -> bool {
        matches!(&*self.0.borrow(), CellState::Open(index) if *index == stack_index)
    }

    /// Copies the referenced stack value into an owned cell. Idempotent:
    /// closing an already-closed cell is a no-op.
    pub fn close(&self, stack: &OperandStack) {
        let mut state = self.0.borrow_mut();
        if let CellState::Open(index) = &*state {
            let value = stack.get(*index).clone();
            *state = CellState::Closed(value);
        }
    }
}
