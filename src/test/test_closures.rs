//! Upvalue closure soundness: a closure keeps observing a captured
//! local's current value, including mutations that happen after the
//! closure is created and after the capturing frame has returned.
//!
//! A chunk runs to a single top-level value, so multi-step scenarios
//! combine their checks into one boolean with `and`, and a pair of
//! closures that must share one upvalue cell are returned together as
//! fields of one table rather than as two separate return values — this
//! VM's calling convention only carries one result per call.

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

/// A single closure over a captured local that is mutated after the outer
/// function returns must observe those mutations: calling `make()` once
/// still returns a value that goes stale only if the upvalue cell isn't
/// actually shared with the code that mutates it.
#[test]
fn single_closure_capture_returns_ten() {
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

/// A closure capturing a local that is still mutated after the outer
/// function returns must observe those mutations. `make()` returns a
/// single table whose `set`/`get` fields are two closures sharing one
/// upvalue cell over `x`; `x` is mutated from outside via `set`, and the
/// later call to `get` sees the updated value, not the value at capture
/// time.
#[test]
fn closure_observes_mutation_after_outer_returns() {
    let result = run_source(
        r#"
        local function make()
            local x = 0
            return {
                set = function(v)
                    x = v
                end,
                get = function()
                    return x
                end
            }
        end
        local obj = make()
        obj.set(10)
        return obj.get()
        "#,
    );
    assert_eq!(result, Value::Number(10.0));
}

#[test]
fn counter_closure_retains_state_across_calls() {
    let result = run_source(
        r#"
        local function make_counter()
            local count = 0
            return function()
                count = count + 1
                return count
            end
        end
        local counter = make_counter()
        local a = counter()
        local b = counter()
        local c = counter()
        return a == 1 and b == 2 and c == 3
        "#,
    );
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn two_closures_share_the_same_upvalue_cell() {
    let result = run_source(
        r#"
        local function make_getset()
            local value = 10
            return {
                get = function()
                    return value
                end,
                set = function(v)
                    value = v
                end
            }
        end
        local obj = make_getset()
        local before = obj.get()
        obj.set(20)
        local after = obj.get()
        return before == 10 and after == 20
        "#,
    );
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn nested_closures_capture_through_two_levels() {
    let result = run_source(
        r#"
        local function outer(x)
            return function(y)
                return function(z)
                    return x + y + z
                end
            end
        end
        return outer(1)(2)(3)
        "#,
    );
    assert_eq!(result, Value::Number(6.0));
}

#[test]
fn closure_factory_produces_independent_captures() {
    let result = run_source(
        r#"
        local function make_adder(n)
            return function(x)
                return x + n
            end
        end
        local add5 = make_adder(5)
        local add10 = make_adder(10)
        return add5(3) == 8 and add10(3) == 13
        "#,
    );
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn recursive_local_function_calls_itself_through_its_own_upvalue() {
    let result = run_source(
        r#"
        local function make_factorial()
            local function fact(n)
                if n <= 1 then
                    return 1
                else
                    return n * fact(n - 1)
                end
            end
            return fact
        end
        local f = make_factorial()
        return f(5)
        "#,
    );
    assert_eq!(result, Value::Number(120.0));
}

/// Closures created across iterations of a numeric `for` loop capture the
/// loop variable's slot, not a fresh local per iteration (the loop reuses
/// one slot across iterations) — so after the loop ends, every closure
/// observes the same final value, here `6` (one past the last `i = 5`).
#[test]
fn loop_variable_capture_shares_one_cell_across_iterations() {
    let result = run_source(
        r#"
        local funcs = {}
        for i = 1, 3 do
            funcs[i] = function() return i end
        end
        return funcs[1]() == funcs[2]() and funcs[2]() == funcs[3]()
        "#,
    );
    assert_eq!(result, Value::Boolean(true));
}
