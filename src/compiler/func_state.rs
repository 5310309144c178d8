//! Per-function compile-time bookkeeping: local-slot allocation, upvalue
//! capture descriptors, and goto/label resolution. One `FuncState` exists
//! per nested function body being compiled, held on `Compiler::funcs` so
//! upvalue resolution can walk outward by index instead of needing a parent
//! pointer.

use ahash::AHashMap;

use crate::scanner::Position;

/// How a function captures a name from its immediately enclosing function.
#[derive(Debug, Clone, Copy)]
pub(super) enum UpvalueDesc {
    /// Captures operand-stack slot `slot` of the parent's own frame.
    FromParentLocal(usize),
    /// Shares the parent's own upvalue cell at this index — used when the
    /// name is free in the parent too (a grandparent's local).
    FromParentUpvalue(usize),
}

pub(super) struct PendingGoto {
    /// Index into `Compiler::code` of the `Value::Address` operand that
    /// precedes the goto's `Branch`.
    pub patch_index: usize,
    pub label: String,
    pub position: Position,
}

#[derive(Default)]
pub(super) struct FuncState {
    /// Visible locals in declaration order; later entries shadow earlier
    /// ones with the same name. Never reclaimed on scope exit — slots are
    /// plentiful and reuse would complicate upvalue capture bookkeeping.
    pub locals: Vec<(String, usize)>,
    scope_starts: Vec<usize>,
    next_slot: usize,
    pub max_slot: usize,

    pub upvalues: Vec<UpvalueDesc>,
    pub upvalue_names: Vec<String>,

    pub labels: AHashMap<String, usize>,
    pub pending_gotos: Vec<PendingGoto>,

    /// One entry per enclosing loop; each holds the patch sites of `break`
    /// statements targeting that loop, resolved once the loop's exit
    /// address is known.
    break_patches: Vec<Vec<usize>>,
}

impl FuncState {
    pub fn new() -> Self {
        FuncState::default()
    }

    pub fn declare_local(&mut self, name: &str) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.max_slot = self.max_slot.max(self.next_slot);
        self.locals.push((name.to_string(), slot));
        slot
    }

    pub fn enter_scope(&mut self) {
        self.scope_starts.push(self.locals.len());
    }

    pub fn exit_scope(&mut self) {
        let start = self
            .scope_starts
            .pop()
            .expect("exit_scope without matching enter_scope");
        self.locals.truncate(start);
    }

    pub fn find_local(&self, name: &str) -> Option<usize> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|&(_, slot)| slot)
    }

    pub fn enter_loop(&mut self) {
        self.break_patches.push(Vec::new());
    }

    pub fn record_break(&mut self, patch_index: usize) -> Result<(), ()> {
        match self.break_patches.last_mut() {
            Some(sites) => {
                sites.push(patch_index);
                Ok(())
            }
            None => Err(()),
        }
    }

    pub fn exit_loop(&mut self) -> Vec<usize> {
        self.break_patches.pop().unwrap_or_default()
    }
}
