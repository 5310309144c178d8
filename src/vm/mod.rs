//! The stack virtual machine: four cooperating stacks, globals, and the
//! fetch-decode-execute loop (`dispatcher/mod.rs`'s `dispatch_instruction`).

pub mod call_frame;
pub mod cell;
pub mod closure;
pub mod code;
pub mod dispatcher;
pub mod stacks;
pub mod table;
pub mod value;

use std::rc::Rc;

use crate::error::{VmError, VmErrorKind, VmTrace};

use call_frame::CallFrame;
use cell::Cell;
use code::Code;
use stacks::{CallStack, CodeCursor, OpenUpvalues, OperandStack};
use value::Value;

pub struct StackVm {
    operand_stack: OperandStack,
    call_stack: CallStack,
    code: CodeCursor,
    open_upvalues: OpenUpvalues,
    globals: Vec<Rc<Cell>>,
}

impl StackVm {
    pub fn new(code: Vec<Code>, num_globals: usize) -> Self {
        let globals = (0..num_globals)
            .map(|_| Cell::new_closed(Value::Nil))
            .collect();
        StackVm {
            operand_stack: OperandStack::new(),
            call_stack: CallStack::new(),
            code: CodeCursor::new(Rc::new(code), 0),
            open_upvalues: OpenUpvalues::new(),
            globals,
        }
    }

    pub fn global_cell(&self, index: usize) -> Option<&Rc<Cell>> {
        self.globals.get(index)
    }

    /// Runs the program from `entry_pc` as a top-level chunk: a synthetic
    /// root frame with `num_locals` pre-reserved slots, no arguments, no
    /// upvalues, and a `dynamic_link` that is never actually returned to
    /// (`ReturnFromClosure` at depth 1 halts the loop instead). Returns the
    /// chunk's single result value.
    pub fn run(&mut self, entry_pc: value::Address, num_locals: u64) -> Result<Value, VmError> {
        self.code.set_pc(entry_pc)?;
        let base = self.operand_stack.top();
        self.operand_stack.push_nils(num_locals);
        self.call_stack
            .push(CallFrame::new(0, num_locals, base, base, -1, None));

        loop {
            let depth_before = self.call_stack.depth();
            let unit = self.code.fetch()?.clone();
            let instr = match unit {
                Code::Op(i) => i,
                Code::Val(_) => {
                    return Err(self.fault(
                        VmErrorKind::MalformedCode,
                        "fetched a value where an instruction was expected",
                    ))
                }
                Code::EndClosureMarker => continue,
            };

            if matches!(instr, code::Instruction::ReturnFromClosure) && depth_before == 1 {
                return self.exec_top_level_return();
            }

            dispatcher::dispatch(self, instr)?;
        }
    }

    fn exec_top_level_return(&mut self) -> Result<Value, VmError> {
        let result = self.operand_stack.pop()?;
        let frame = self.call_stack.pop()?;
        self.open_upvalues
            .close_from(frame.frame_base(), &self.operand_stack);
        self.operand_stack.truncate_to(frame.static_link)?;
        Ok(result)
    }

    fn fault(&self, kind: VmErrorKind, message: impl Into<String>) -> VmError {
        let frame_base = self
            .call_stack
            .current()
            .map(|f| f.frame_base())
            .unwrap_or(0);
        VmError::new(
            kind,
            message,
            VmTrace {
                pc: self.code.pc() as usize,
                operand_top: self.operand_stack.top(),
                call_top: self.call_stack.depth(),
                code_top: self.code.code().len(),
                frame_base,
            },
        )
    }

    pub(crate) fn current_frame(&self) -> Result<&CallFrame, VmError> {
        match self.call_stack.current() {
            Ok(frame) => Ok(frame),
            Err(_) => Err(self.fault(VmErrorKind::StackFlow, "no active call frame")),
        }
    }

    pub(crate) fn global(&self, index: usize) -> Result<&Rc<Cell>, VmError> {
        self.globals
            .get(index)
            .ok_or_else(|| self.fault(VmErrorKind::BadConstantIndex, "global index out of range"))
    }

    pub(crate) fn raise(&self, kind: VmErrorKind, message: impl Into<String>) -> VmError {
        self.fault(kind, message)
    }
}
