//! Control-flow graph lowering.

use phpz_ast::{Catch, Expr, Stmt};
use phpz_checker::{ControlFlowGraph, Terminator};
use phpz_common::span::Span;

fn sp() -> Span {
    Span::ZERO
}

fn expr_stmt(e: Expr) -> Stmt {
    Stmt::expr(e)
}

#[test]
fn straight_line_code_is_one_block_into_exit() {
    let cfg = ControlFlowGraph::build(vec![
        expr_stmt(Expr::var("a", sp())),
        expr_stmt(Expr::var("b", sp())),
    ]);
    let start = cfg.start();
    assert_eq!(cfg.block(start).stmts.len(), 2);
    assert_eq!(cfg.successors(start).as_slice(), &[cfg.exit()]);
    assert!(matches!(cfg.block(cfg.exit()).terminator, Terminator::End));
}

#[test]
fn if_else_forks_and_joins() {
    let cfg = ControlFlowGraph::build(vec![Stmt::If {
        cond: Expr::var("c", sp()),
        then: vec![expr_stmt(Expr::long(1, sp()))],
        otherwise: vec![expr_stmt(Expr::long(2, sp()))],
        span: sp(),
    }]);
    let start_succ = cfg.successors(cfg.start());
    assert_eq!(start_succ.len(), 2);
    let (then_b, else_b) = (start_succ[0], start_succ[1]);
    assert_ne!(then_b, else_b);
    // Both arms fall into the same join block.
    assert_eq!(cfg.successors(then_b), cfg.successors(else_b));
}

#[test]
fn while_loop_has_a_back_edge() {
    let cfg = ControlFlowGraph::build(vec![Stmt::While {
        cond: Expr::var("c", sp()),
        body: vec![expr_stmt(Expr::long(1, sp()))],
        span: sp(),
    }]);
    // start -> head -(cond)-> {body, after}; body -> head.
    let head = cfg.successors(cfg.start())[0];
    let head_succ = cfg.successors(head);
    assert_eq!(head_succ.len(), 2);
    let body = head_succ[0];
    assert_eq!(cfg.successors(body).as_slice(), &[head]);
}

#[test]
fn return_jumps_to_exit_and_starts_unreachable_block() {
    let cfg = ControlFlowGraph::build(vec![
        Stmt::Return {
            value: Some(Expr::long(1, sp())),
            span: sp(),
        },
        expr_stmt(Expr::var("dead", sp())),
    ]);
    assert_eq!(cfg.successors(cfg.start()).as_slice(), &[cfg.exit()]);
    // The dead statement landed in a separate block, not the start block.
    assert_eq!(cfg.block(cfg.start()).stmts.len(), 1);
}

#[test]
fn try_catch_records_exceptional_edges_and_catch_variable() {
    let cfg = ControlFlowGraph::build(vec![Stmt::TryCatch {
        body: vec![expr_stmt(Expr::var("risky", sp()))],
        catches: vec![Catch {
            class_name: "Exception".to_string(),
            variable: "e".to_string(),
            body: vec![expr_stmt(Expr::long(1, sp()))],
            span: sp(),
        }],
        finally: vec![],
        span: sp(),
    }]);
    let body_b = cfg.successors(cfg.start())[0];
    let exceptional = &cfg.block(body_b).exceptional;
    assert_eq!(exceptional.len(), 1);
    let catch_b = exceptional[0];
    assert_eq!(
        cfg.block(catch_b).catch,
        Some(("Exception".to_string(), "e".to_string()))
    );
}

#[test]
fn for_loop_appends_init_and_step_as_statements() {
    // for ($i = 0; $i < 3; $i++) {}
    let init = Expr::Assign {
        target: Box::new(Expr::var("i", sp())),
        value: Box::new(Expr::long(0, sp())),
        span: sp(),
    };
    let cond = Expr::Binary {
        op: phpz_ast::BinaryOp::Lt,
        left: Box::new(Expr::var("i", sp())),
        right: Box::new(Expr::long(3, sp())),
        span: sp(),
    };
    let step = Expr::Unary {
        op: phpz_ast::UnaryOp::PostInc,
        operand: Box::new(Expr::var("i", sp())),
        span: sp(),
    };
    let cfg = ControlFlowGraph::build(vec![Stmt::For {
        init: vec![init],
        cond: Some(cond),
        step: vec![step],
        body: vec![],
        span: sp(),
    }]);
    // Init becomes a statement of the entry block.
    assert_eq!(cfg.block(cfg.start()).stmts.len(), 1);
    let head = cfg.successors(cfg.start())[0];
    assert!(matches!(
        cfg.block(head).terminator,
        Terminator::Branch { .. }
    ));
    let body = cfg.successors(head)[0];
    // The step landed at the end of the body block, before the back edge.
    assert_eq!(cfg.block(body).stmts.len(), 1);
    assert_eq!(cfg.successors(body).as_slice(), &[head]);
}
