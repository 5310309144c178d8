//! The six end-to-end scenarios a complete chunk must get right, straight
//! from source text through to the returned `Value`.

use crate::compiler::compile;
use crate::parser::parse;
use crate::scanner::scan;
use crate::vm::value::Value;
use crate::vm::StackVm;

fn run_source(source: &str) -> Value {
    let block = parse(scan(source).unwrap()).unwrap();
    let program = compile(&block).unwrap();
    let mut vm = StackVm::new(program.code, program.num_globals);
    vm.run(program.entry_pc, program.num_locals).unwrap()
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(run_source("return 1 + 2 * 3"), Value::Number(7.0));
}

#[test]
fn string_concatenation() {
    assert_eq!(
        run_source(r#"local s = "a" .. "b"; return s"#),
        Value::string("ab")
    );
}

#[test]
fn table_literal_length() {
    assert_eq!(
        run_source("local t = {1, 2, 3}; return #t"),
        Value::Number(3.0)
    );
}

#[test]
fn numeric_for_accumulation() {
    assert_eq!(
        run_source("local n = 0; for i = 1, 5 do n = n + i end; return n"),
        Value::Number(15.0)
    );
}

#[test]
fn closure_capture_scenario() {
    let result = run_source(
        r#"
        local function make()
            local x = 10
            return function()
                return x
            end
        end
        local f = make()
        return f()
        "#,
    );
    assert_eq!(result, Value::Number(10.0));
}

/// The untaken branch of an `if` must never execute. Each branch mutates a
/// distinct key of a shared probe table instead of just returning a
/// literal, so a compiler bug that ran both branches (or the wrong one)
/// would be visible in the probe even if the final return value happened
/// to still look right.
#[test]
fn untaken_if_branch_does_not_execute() {
    let result = run_source(
        r#"
        local probe = {}
        if false then
            probe.ran_true = true
            return 1
        else
            probe.ran_false = true
        end
        return probe
        "#,
    );
    let table = result.as_table().expect("expected a table result");
    let table = table.borrow();
    assert!(!table.has(&Value::string("ran_true")));
    assert!(table.has(&Value::string("ran_false")));

    assert_eq!(
        run_source("if false then return 1 else return 2 end"),
        Value::Number(2.0)
    );
}
