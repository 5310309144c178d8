//! if/else, the three loop forms, `break`, and `goto`/labels.

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
fn if_elseif_else_picks_matching_branch() {
    assert_eq!(
        run_source("if false then return 1 elseif true then return 2 else return 3 end"),
        Value::Number(2.0)
    );
    assert_eq!(
        run_source("if false then return 1 elseif false then return 2 else return 3 end"),
        Value::Number(3.0)
    );
}

#[test]
fn while_loop_accumulates() {
    let result = run_source(
        r#"
        local n = 0
        local i = 1
        while i <= 5 do
            n = n + i
            i = i + 1
        end
        return n
        "#,
    );
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn repeat_until_runs_body_at_least_once() {
    let result = run_source(
        r#"
        local n = 0
        repeat
            n = n + 1
        until n >= 1
        return n
        "#,
    );
    assert_eq!(result, Value::Number(1.0));
}

#[test]
fn repeat_until_accumulates_like_while() {
    let result = run_source(
        r#"
        local n = 0
        local i = 1
        repeat
            n = n + i
            i = i + 1
        until i > 5
        return n
        "#,
    );
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn numeric_for_with_default_step() {
    let result = run_source(
        r#"
        local n = 0
        for i = 1, 5 do
            n = n + i
        end
        return n
        "#,
    );
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn numeric_for_with_negative_step() {
    let result = run_source(
        r#"
        local n = 0
        for i = 5, 1, -1 do
            n = n + i
        end
        return n
        "#,
    );
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn generic_for_walks_table_positional_keys() {
    let result = run_source(
        r#"
        local sum = 0
        for k, v in {10, 20, 30} do
            sum = sum + v
        end
        return sum
        "#,
    );
    assert_eq!(result, Value::Number(60.0));
}

#[test]
fn break_exits_loop_early() {
    let result = run_source(
        r#"
        local n = 0
        for i = 1, 100 do
            if i > 3 then
                break
            end
            n = n + i
        end
        return n
        "#,
    );
    assert_eq!(result, Value::Number(6.0));
}

#[test]
fn goto_skips_forward_past_a_statement() {
    let result = run_source(
        r#"
        local n = 1
        goto skip
        n = 99
        ::skip::
        n = n + 1
        return n
        "#,
    );
    assert_eq!(result, Value::Number(2.0));
}

#[test]
fn goto_loops_backward_to_a_label() {
    let result = run_source(
        r#"
        local n = 0
        ::top::
        n = n + 1
        if n < 5 then
            goto top
        end
        return n
        "#,
    );
    assert_eq!(result, Value::Number(5.0));
}
