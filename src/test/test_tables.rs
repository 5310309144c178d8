//! Table identity and general table operations, through both `Table`'s own
//! methods and compiled source.

use crate::compiler::compile;
use crate::parser::parse;
use crate::scanner::scan;
use crate::vm::table::Table;
use crate::vm::value::Value;
use crate::vm::StackVm;

fn run_source(source: &str) -> Value {
    let block = parse(scan(source).unwrap()).unwrap();
    let program = compile(&block).unwrap();
    let mut vm = StackVm::new(program.code, program.num_globals);
    vm.run(program.entry_pc, program.num_locals).unwrap()
}

/// *Table identity*: inserting `(k, v1)` then `(k, v2)` via `Insert`
/// produces two entries, but `Get` still returns the most recent value.
/// `Set` instead overwrites, leaving exactly one entry.
#[test]
fn insert_appends_but_set_overwrites() {
    let mut t = Table::new();
    t.insert(Value::string("k"), Value::Number(1.0));
    t.insert(Value::string("k"), Value::Number(2.0));
    assert_eq!(t.len(), 2);
    assert_eq!(t.get(&Value::string("k")), Some(&Value::Number(2.0)));

    let mut t2 = Table::new();
    t2.set(Value::string("k"), Value::Number(1.0));
    t2.set(Value::string("k"), Value::Number(2.0));
    assert_eq!(t2.len(), 1);
    assert_eq!(t2.get(&Value::string("k")), Some(&Value::Number(2.0)));
}

#[test]
fn has_reflects_presence_not_truthiness() {
    let mut t = Table::new();
    t.insert(Value::string("k"), Value::Nil);
    assert!(t.has(&Value::string("k")));
    assert!(!t.has(&Value::string("missing")));
}

#[test]
fn border_length_counts_contiguous_integer_run() {
    let mut t = Table::new();
    t.insert(Value::Number(1.0), Value::Number(10.0));
    t.insert(Value::Number(2.0), Value::Number(20.0));
    t.insert(Value::Number(3.0), Value::Number(30.0));
    assert_eq!(t.border_length(), 3);

    t.insert(Value::Number(5.0), Value::Number(50.0));
    assert_eq!(t.border_length(), 3);
}

#[test]
fn table_constructor_and_length_through_compiled_source() {
    let result = run_source("local t = {1, 2, 3}; return #t");
    assert_eq!(result, Value::Number(3.0));
}

#[test]
fn field_assignment_overwrites_in_place() {
    let result = run_source(
        r#"
        local t = {}
        t.x = 1
        t.x = 2
        return t.x
        "#,
    );
    assert_eq!(result, Value::Number(2.0));
}

#[test]
fn index_assignment_and_lookup_round_trip() {
    let result = run_source(
        r#"
        local t = {}
        t[1] = "a"
        t[2] = "b"
        return t[1] .. t[2]
        "#,
    );
    assert_eq!(result, Value::string("ab"));
}
