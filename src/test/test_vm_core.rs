//! Low-level VM properties exercised directly against hand-assembled
//! `Code`, the way a subsystem test would probe instructions the compiler
//! itself never happens to emit (`LoadConstantAtCallTOS`/
//! `StoreConstantAtCallTOS`, an out-of-range `Branch`).

use crate::compiler::compile;
use crate::error::VmErrorKind;
use crate::parser::parse;
use crate::scanner::scan;
use crate::vm::call_frame::CallFrame;
use crate::vm::code::{Code, Instruction};
use crate::vm::value::{Address, Value};
use crate::vm::StackVm;

fn run_source(source: &str) -> Value {
    let block = parse(scan(source).unwrap()).unwrap();
    let program = compile(&block).unwrap();
    let mut vm = StackVm::new(program.code, program.num_globals);
    vm.run(program.entry_pc, program.num_locals).unwrap()
}

/// *Stack balance law*: repeated calls into a function whose body never
/// reaches an explicit `Return` (only the compiler's implicit `return nil`)
/// must leave the operand stack exactly where it started, or the unrelated
/// top-level `return 0` that follows would read a corrupted local slot.
#[test]
fn stack_balance_after_calls_with_implicit_return() {
    let result = run_source(
        r#"
        local function f()
            local x = 1
            local y = x + 1
        end
        f()
        f()
        f()
        return 0
        "#,
    );
    assert_eq!(result, Value::Number(0.0));
}

/// *Constant pool isolation*, at the `CallFrame` level: two frames' pools
/// are independent `Vec`s, so writing index 0 in one never touches index 0
/// in the other.
#[test]
fn constant_pool_isolation_between_frames() {
    let mut frame_a = CallFrame::new(0, 0, 0, 0, -1, None);
    let mut frame_b = CallFrame::new(0, 0, 0, 0, -1, None);
    frame_a.set_constant(0, Value::Number(42.0));
    frame_b.set_constant(0, Value::Number(99.0));
    assert_eq!(frame_a.get_constant(0), Some(&Value::Number(42.0)));
    assert_eq!(frame_b.get_constant(0), Some(&Value::Number(99.0)));
}

/// The same property exercised through the VM's own instructions: a value
/// stored into a frame's constant pool at index 0 round-trips through
/// `LoadConstantAtCallTOS`/`StoreConstantAtCallTOS` unchanged.
#[test]
fn constant_pool_round_trips_through_dispatcher() {
    let mut code = Vec::new();
    let mut load_const = |code: &mut Vec<Code>, v: Value| {
        code.push(Code::Op(Instruction::LoadFromCodeTOS));
        code.push(Code::Val(v));
    };
    load_const(&mut code, Value::Number(42.0));
    load_const(&mut code, Value::Index(0));
    code.push(Code::Op(Instruction::StoreConstantAtCallTOS));
    load_const(&mut code, Value::Index(0));
    code.push(Code::Op(Instruction::LoadConstantAtCallTOS));
    code.push(Code::Op(Instruction::ReturnFromClosure));

    let mut vm = StackVm::new(code, 0);
    let result = vm.run(0, 0).unwrap();
    assert_eq!(result, Value::Number(42.0));
}

struct Asm {
    code: Vec<Code>,
}

impl Asm {
    fn new() -> Self {
        Asm { code: Vec::new() }
    }

    fn addr(&self) -> Address {
        self.code.len() as Address
    }

    fn op(&mut self, i: Instruction) {
        self.code.push(Code::Op(i));
    }

    fn val(&mut self, v: Value) -> usize {
        self.code.push(Code::Val(v));
        self.code.len() - 1
    }

    fn load_const(&mut self, v: Value) {
        self.op(Instruction::LoadFromCodeTOS);
        self.val(v);
    }

    fn end_marker(&mut self) {
        self.code.push(Code::EndClosureMarker);
    }

    fn patch(&mut self, index: usize, addr: Address) {
        self.code[index] = Code::Val(Value::Address(addr));
    }
}

/// *Branch target safety*: a `Branch` whose address falls outside the
/// executing closure's `[entry_pc, end_pc)` range raises a `VmError`
/// instead of moving the code cursor there.
#[test]
fn branch_outside_closure_range_faults() {
    let mut asm = Asm::new();

    asm.op(Instruction::LoadFromCodeTOS);
    let skip_patch = asm.val(Value::Address(-1));
    asm.op(Instruction::Branch);
    let entry_pc = asm.addr();

    // body: an immediate out-of-range branch.
    asm.load_const(Value::Address(9999));
    asm.op(Instruction::Branch);
    asm.load_const(Value::Nil);
    asm.op(Instruction::ReturnFromClosure);

    asm.end_marker();
    let end_pc = asm.addr();
    asm.patch(skip_patch, end_pc);

    asm.load_const(Value::Address(entry_pc));
    asm.load_const(Value::Address(end_pc));
    asm.load_const(Value::Index(0)); // num_params
    asm.load_const(Value::Index(0)); // num_locals
    asm.load_const(Value::Boolean(false)); // is_varargs
    asm.load_const(Value::Index(0)); // upvalue count
    asm.op(Instruction::MakeClosure);

    asm.load_const(Value::Index(0));
    asm.op(Instruction::StoreLocal);

    asm.load_const(Value::Index(0)); // num_args
    asm.load_const(Value::Index(0));
    asm.op(Instruction::LoadLocal);
    asm.op(Instruction::CallClosure);

    asm.load_const(Value::Nil);
    asm.op(Instruction::ReturnFromClosure);

    let mut vm = StackVm::new(asm.code, 0);
    let err = vm.run(0, 1).unwrap_err();
    assert_eq!(err.kind, VmErrorKind::MalformedCode);
}
