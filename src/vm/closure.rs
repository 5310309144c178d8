//! `Closure`: a callable value pairing a code entry address with its
//! captured upvalues.

use std::rc::Rc;

use super::cell::Cell;
use super::value::Address;

pub struct Closure {
    pub num_params: u64,
    /// Total contiguous parameter-plus-local slot count this closure's frame
    /// needs, i.e. `FuncState::max_slot` at the time its body compiled.
    pub num_locals: u64,
    pub is_varargs: bool,
    pub entry_pc: Address,
    /// One past the closure body's `EndClosureMarker`; used to bound branch
    /// targets so a `Branch` can never jump outside its own closure body.
    pub end_pc: Address,
    pub upvalues: Vec<Rc<Cell>>,
}

impl Closure {
    pub fn new(
        num_params: u64,
        num_locals: u64,
        is_varargs: bool,
        entry_pc: Address,
        end_pc: Address,
    ) -> Self {
        Closure {
            num_params,
            num_locals,
            is_varargs,
            entry_pc,
            end_pc,
            upvalues: Vec::new(),
        }
    }

    pub fn contains_pc(&self, pc: Address) -> bool {
        pc >= self.entry_pc && pc < self.end_pc
    }
}
