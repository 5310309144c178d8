//! Lowers a parsed `Block` into the linear `Code` stream the stack VM
//! executes. One `FuncState` per function body tracks local slots and
//! upvalues while emitting directly into a flat instruction buffer; see
//! `call_frame.rs` and `func_state.rs` for the operand-stack addressing
//! this targets.

mod expr;
mod func_state;
mod stmt;

use crate::ast::Block;
use crate::error::CompileError;
use crate::scanner::Position;
use crate::vm::code::{Code, Instruction};
use crate::vm::value::{Address, Value};

use ahash::AHashMap;
use func_state::{FuncState, PendingGoto, UpvalueDesc};

pub struct CompiledProgram {
    pub code: Vec<Code>,
    pub entry_pc: Address,
    pub num_locals: u64,
    pub num_globals: usize,
}

pub fn compile(block: &Block) -> Result<CompiledProgram, CompileError> {
    let mut compiler = Compiler::new();
    compiler.funcs.push(FuncState::new());
    compiler.compile_block(block)?;
    // An implicit `return nil` so falling off the end of the chunk behaves
    // like any other function body that never reaches a `Return` statement —
    // `ReturnFromClosure` always expects exactly one value to pop.
    compiler.emit_const(Value::Nil);
    compiler.emit(Instruction::ReturnFromClosure);
    compiler.resolve_gotos()?;
    let top = compiler.funcs.pop().expect("pushed above");

    Ok(CompiledProgram {
        code: compiler.code,
        entry_pc: 0,
        num_locals: top.max_slot as u64,
        num_globals: compiler.globals.len(),
    })
}

enum NameRef {
    Local(usize),
    Upvalue(usize),
    Global(usize),
}

pub(crate) struct Compiler {
    code: Vec<Code>,
    funcs: Vec<FuncState>,
    globals: AHashMap<String, usize>,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            code: Vec::new(),
            funcs: Vec::new(),
            globals: AHashMap::default(),
        }
    }

    fn current_addr(&self) -> usize {
        self.code.len()
    }

    fn emit(&mut self, unit: impl Into<Code>) -> usize {
        let idx = self.code.len();
        self.code.push(unit.into());
        idx
    }

    /// Emits `LoadFromCodeTOS; <value>` — the only way a constant may enter
    /// the code stream (the main dispatch loop faults if it ever fetches a
    /// bare `Code::Val` itself). Returns the index of the `Value` unit, so
    /// branch-target patch sites still point at the slot `patch_address`
    /// overwrites.
    fn emit_const(&mut self, value: impl Into<Value>) -> usize {
        self.emit(Instruction::LoadFromCodeTOS);
        self.emit(value.into())
    }

    fn patch_address(&mut self, index: usize, addr: Address) {
        self.code[index] = Code::Val(Value::Address(addr));
    }

    /// Emits `LoadFromCodeTOS; <placeholder address>; <instruction>` and
    /// returns the index of the placeholder so the caller can patch it once
    /// the real target address is known.
    fn emit_branch_placeholder(&mut self, instruction: Instruction) -> usize {
        let idx = self.emit_const(Value::Address(-1));
        self.emit(instruction);
        idx
    }

    fn func(&mut self) -> &mut FuncState {
        self.funcs.last_mut().expect("no active function")
    }

    fn enter_scope(&mut self) {
        self.func().enter_scope();
    }

    fn exit_scope(&mut self) {
        self.func().exit_scope();
    }

    fn resolve_name(&mut self, name: &str) -> NameRef {
        let cur = self.funcs.len() - 1;
        if let Some(slot) = self.funcs[cur].find_local(name) {
            return NameRef::Local(slot);
        }
        if let Some(idx) = self.resolve_upvalue(cur, name) {
            return NameRef::Upvalue(idx);
        }
        let next = self.globals.len();
        let slot = *self.globals.entry(name.to_string()).or_insert(next);
        NameRef::Global(slot)
    }

    /// Walks outward from `func_index` looking for `name` as a local or
    /// upvalue of an enclosing function, threading a capture descriptor
    /// through every intermediate function so each one only ever reaches
    /// one level out. Returns `None` once it runs off the top of the
    /// function stack, meaning the caller should treat `name` as global.
    fn resolve_upvalue(&mut self, func_index: usize, name: &str) -> Option<usize> {
        if func_index == 0 {
            return None;
        }
        if let Some(i) = self.funcs[func_index]
            .upvalue_names
            .iter()
            .position(|n| n == name)
        {
            return Some(i);
        }
        let parent_index = func_index - 1;
        if let Some(slot) = self.funcs[parent_index].find_local(name) {
            self.funcs[func_index]
                .upvalues
                .push(UpvalueDesc::FromParentLocal(slot));
            self.funcs[func_index].upvalue_names.push(name.to_string());
            return Some(self.funcs[func_index].upvalues.len() - 1);
        }
        if let Some(parent_up) = self.resolve_upvalue(parent_index, name) {
            self.funcs[func_index]
                .upvalues
                .push(UpvalueDesc::FromParentUpvalue(parent_up));
            self.funcs[func_index].upvalue_names.push(name.to_string());
            return Some(self.funcs[func_index].upvalues.len() - 1);
        }
        None
    }

    fn record_goto(&mut self, label: String, position: Position) {
        let idx = self.emit_const(Value::Address(-1));
        self.emit(Instruction::Branch);
        self.func().pending_gotos.push(PendingGoto {
            patch_index: idx,
            label,
            position,
        });
    }

    fn record_label(&mut self, name: String) {
        let addr = self.current_addr();
        self.func().labels.insert(name, addr);
    }

    fn resolve_gotos(&mut self) -> Result<(), CompileError> {
        let pending: Vec<PendingGoto> = self.func().pending_gotos.drain(..).collect();
        let labels = self.func().labels.clone();
        for pg in pending {
            match labels.get(&pg.label) {
                Some(&addr) => self.patch_address(pg.patch_index, addr as Address),
                None => {
                    return Err(CompileError {
                        message: format!("no visible label '{}' for goto", pg.label),
                        position: pg.position,
                    })
                }
            }
        }
        Ok(())
    }

    /// Compiles a nested function body inline in the code stream, skipped
    /// over at runtime by a leading unconditional branch, and returns the
    /// `(entry_pc, end_pc)` pair `MakeClosure`'s constant operands need.
    /// `end_pc` is one past the body's `EndClosureMarker`, matching
    /// `Closure::contains_pc`'s half-open range.
    fn compile_function_body(
        &mut self,
        params: &[String],
        is_varargs: bool,
        body: &Block,
    ) -> Result<(Address, Address, u64, Vec<UpvalueDesc>), CompileError> {
        let skip_patch = self.emit_branch_placeholder(Instruction::Branch);
        let entry_pc = self.current_addr() as Address;

        self.funcs.push(FuncState::new());
        for p in params {
            self.func().declare_local(p);
        }
        self.compile_block(body)?;
        self.emit_const(Value::Nil);
        self.emit(Instruction::ReturnFromClosure);
        self.resolve_gotos()?;
        let fs = self.funcs.pop().expect("pushed above");

        self.emit(Code::EndClosureMarker);
        let end_pc = self.current_addr() as Address;
        self.patch_address(skip_patch, end_pc);

        let _ = is_varargs;
        Ok((entry_pc, end_pc, fs.max_slot as u64, fs.upvalues))
    }

    /// Emits the operand push sequence and `MakeClosure` instruction that
    /// turns a compiled function body into a runtime `Value::Closure`. The
    /// upvalue count is pushed last, after its descriptor pairs rather than
    /// before them, so `MakeClosure` always finds it on top of the stack —
    /// the VM has no way to know how many `(is_local, idx)` pairs to pop
    /// before it reads that count.
    fn emit_make_closure(
        &mut self,
        num_params: u64,
        num_locals: u64,
        is_varargs: bool,
        entry_pc: Address,
        end_pc: Address,
        upvalues: &[UpvalueDesc],
    ) {
        self.emit_const(Value::Address(entry_pc));
        self.emit_const(Value::Address(end_pc));
        self.emit_const(Value::Index(num_params));
        self.emit_const(Value::Index(num_locals));
        self.emit_const(Value::Boolean(is_varargs));
        for up in upvalues {
            match *up {
                UpvalueDesc::FromParentLocal(slot) => {
                    self.emit_const(Value::Boolean(true));
                    self.emit_const(Value::Index(slot as u64));
                }
                UpvalueDesc::FromParentUpvalue(idx) => {
                    self.emit_const(Value::Boolean(false));
                    self.emit_const(Value::Index(idx as u64));
                }
            }
        }
        self.emit_const(Value::Index(upvalues.len() as u64));
        self.emit(Instruction::MakeClosure);
    }
}

/// Parses a numeric literal lexeme (decimal, hex `0x`/`0X`, octal `0o`/`0O`,
/// or binary `0b`/`0B`, with an optional fractional part and exponent on hex
/// and decimal) into its `f64` value. Always returns a float rather than
/// distinguishing an integer subtype — `Value::Number` has no separate
/// integer representation.
pub fn parse_lua_number(lexeme: &str) -> Option<f64> {
    let lexeme = lexeme.trim();
    if lexeme.is_empty() {
        return None;
    }
    if let Some(hex) = lexeme
        .strip_prefix("0x")
        .or_else(|| lexeme.strip_prefix("0X"))
    {
        return parse_hex_number(hex);
    }
    if let Some(oct) = lexeme
        .strip_prefix("0o")
        .or_else(|| lexeme.strip_prefix("0O"))
    {
        return parse_radix_int(oct, 8);
    }
    if let Some(bin) = lexeme
        .strip_prefix("0b")
        .or_else(|| lexeme.strip_prefix("0B"))
    {
        return parse_radix_int(bin, 2);
    }
    lexeme.parse::<f64>().ok()
}

fn parse_radix_int(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        value = value * radix as f64 + c.to_digit(radix)? as f64;
    }
    Some(value)
}

fn parse_hex_number(hex: &str) -> Option<f64> {
    if hex.is_empty() {
        return None;
    }
    let (mantissa, exponent) = match hex.find(['p', 'P']) {
        Some(idx) => (&hex[..idx], hex[idx + 1..].parse::<i32>().ok()?),
        None => (hex, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += c.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exponent))
}

