//! `CallFrame`: the bookkeeping record pushed each time a closure is
//! entered, addressing this implementation's resolution of the frame-layout
//! contradiction the source material carries (see `DESIGN.md`, "Frame
//! addressing").
//!
//! Convention used here: a caller pushes its argument values, an explicit
//! argument count, then the `Closure` value itself, then executes
//! `CallClosure`. That instruction pops the closure and the count,
//! reconciles the pushed arguments against the closure's declared
//! `num_params` (padding with `Nil` or dropping extras), and the result
//! becomes the frame's `static_link`. The compiler allocates parameter slots
//! and body-local slots from one contiguous counter (`FuncState::next_slot`),
//! so this implementation does not give arguments a separate addressed
//! region from locals the way the source material's `load_nth_argument`
//! implies — `local_index(i)` simply indexes `static_link + i` and covers
//! both (see `DESIGN.md`, "Frame addressing").

use std::rc::Rc;

use super::closure::Closure;
use super::value::Address;

/// The fixed upper bound on a frame's constant pool.
pub const MAX_CONST: usize = 256;

pub struct CallFrame {
    pub num_args: u64,
    pub num_locals: u64,
    /// Operand-stack index of this frame's first argument. Doubles as the
    /// truncation point on return: popping this frame resets the operand
    /// stack to `static_link`, discarding both locals and arguments.
    pub static_link: usize,
    /// The calling frame's own `static_link`, i.e. its base — lets the VM
    /// restore "the current frame" bookkeeping when this frame is popped.
    pub frame_link: usize,
    /// The code address to resume at in the caller, i.e. the PC
    /// immediately following the `CallClosure` that created this frame.
    pub dynamic_link: Address,
    /// Local constant pool for this invocation, written by
    /// `StoreConstantAtCallTOS` and read by `LoadConstantAtCallTOS`.
    pub constants: Vec<super::value::Value>,
    /// The closure this frame is executing, so `MakeClosure` can resolve a
    /// `FromParentUpvalue` capture against its own upvalue list. `None` for
    /// the synthetic root frame the top-level chunk runs in, which has no
    /// closure and therefore no upvalues of its own.
    pub closure: Option<Rc<Closure>>,
}

impl CallFrame {
    pub fn new(
        num_args: u64,
        num_locals: u64,
        static_link: usize,
        frame_link: usize,
        dynamic_link: Address,
        closure: Option<Rc<Closure>>,
    ) -> Self {
        CallFrame {
            num_args,
            num_locals,
            static_link,
            frame_link,
            dynamic_link,
            constants: Vec::new(),
            closure,
        }
    }

    pub fn frame_base(&self) -> usize {
        self.static_link
    }

    /// Operand-stack index of argument `i` (0-based). Identical to
    /// `local_index` here — see the module doc.
    pub fn argument_index(&self, i: u64) -> usize {
        self.static_link + i as usize
    }

    /// Operand-stack index of local `i` (0-based), counting from the
    /// frame's first parameter slot.
    pub fn local_index(&self, i: u64) -> usize {
        self.static_link + i as usize
    }

    pub fn get_constant(&self, index: usize) -> Option<&super::value::Value> {
        self.constants.get(index)
    }

    /// Stores at `index`, growing the pool with nils if needed — mirrors the
    /// operand stack's own "extend on demand" discipline for a frame-local
    /// pool that has no separate allocation instruction.
    pub fn set_constant(&mut self, index: usize, value: super::value::Value) {
        if index >= self.constants.len() {
            self.constants
                .resize(index + 1, super::value::Value::Nil);
        }
        self.constants[index] = value;
    }
}
