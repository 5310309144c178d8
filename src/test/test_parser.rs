use crate::ast::{BinOp, Expr, Factor, PrefixExpr, Stat};
use crate::parser::parse;
use crate::scanner::scan;

fn parse_src(source: &str) -> crate::ast::Block {
    parse(scan(source).unwrap()).unwrap()
}

#[test]
fn pow_is_right_associative() {
    let block = parse_src("return a ^ b ^ c");
    let Stat::Return { values, .. } = block.laststat.as_deref().unwrap() else {
        panic!("expected return");
    };
    let Expr::Binary { op, lhs, rhs, .. } = &values[0] else {
        panic!("expected binary expr");
    };
    assert_eq!(*op, BinOp::Pow);
    assert!(matches!(&**lhs, Expr::Factor(Factor::Prefix(p)) if matches!(**p, PrefixExpr::Name(ref n, _) if n == "a")));
    // the right-hand side must itself be `b ^ c`, not `(a ^ b) ^ c`.
    assert!(matches!(&**rhs, Expr::Binary { op: BinOp::Pow, .. }));
}

#[test]
fn chained_calls_nest_left_to_right() {
    let block = parse_src("return f(1)(2)");
    let Stat::Return { values, .. } = block.laststat.as_deref().unwrap() else {
        panic!("expected return");
    };
    let Expr::Factor(Factor::Prefix(p)) = &values[0] else {
        panic!("expected a prefix expr");
    };
    let PrefixExpr::FunctionCallExpr { callee, args, .. } = &**p else {
        panic!("expected outer call");
    };
    assert_eq!(args.len(), 1);
    assert!(matches!(
        &**callee,
        PrefixExpr::FunctionCallExpr { .. }
    ));
}

#[test]
fn if_else_produces_cond_blocks_and_else() {
    let block = parse_src("if x then return 1 elseif y then return 2 else return 3 end");
    let stat = &block.statements[0];
    let Stat::If {
        cond_blocks,
        else_block,
        ..
    } = stat
    else {
        panic!("expected if statement");
    };
    assert_eq!(cond_blocks.len(), 2);
    assert!(else_block.is_some());
}

#[test]
fn assign_separates_targets_from_values() {
    let block = parse_src("a, b = 1, 2");
    let Stat::Assign { targets, values, .. } = &block.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(targets.len(), 2);
    assert_eq!(values.len(), 2);
}

#[test]
fn positions_are_non_decreasing_in_document_order() {
    let block = parse_src("local a = 1\nlocal b = 2\n");
    let mut positions = Vec::new();
    for stat in &block.statements {
        positions.push(stat.position());
    }
    for pair in positions.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn rejects_malformed_statement() {
    let err = parse(scan("local = 1").unwrap()).unwrap_err();
    assert!(!err.message.is_empty());
}
