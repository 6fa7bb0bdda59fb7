//! Trees nested far deeper than the host stack allows.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use rill_eval::{Context, ContextState, Node, NodeTag, ProgramBuilder, SharedProgram, Signature};
use rill_fusion::{fuse_program, FusionCatalog, FusionStats};
use rill_ir::{Register, ScalarType, UnaryOp};

const DEPTH: usize = 100_000;

/// `-(-(...-(1)...))`, `DEPTH` negations deep.
fn negations() -> Node {
    let mut tree = Node::constant(Register::from_i32(1));
    for _ in 0..DEPTH {
        tree = Node::op1(UnaryOp::Neg, ScalarType::Int32, tree);
    }
    tree
}

#[test]
fn test_deep_tree_fuses_evaluates_and_drops() {
    let mut builder = ProgramBuilder::new();
    builder
        .function(Signature::new("f").returns(ScalarType::Int32), negations())
        .unwrap();
    let mut program = builder.build().unwrap();

    let stats = fuse_program(&mut program, &FusionCatalog::builtin());
    assert_eq!(
        stats,
        FusionStats {
            visited: DEPTH + 1,
            candidates: DEPTH,
            fused: 1,
        }
    );
    assert_eq!(program.functions()[0].body.tag(), NodeTag::Op1);

    let program = SharedProgram::new(program);
    let function = program.find_function("f").unwrap();
    let mut ctx = Context::new(program.clone());
    let value = ctx.eval_function(function, &[]);
    assert_eq!(ctx.state(), ContextState::Completed);
    assert_eq!(value.as_i32(), 1);

    drop(ctx);
    drop(program);
}

#[test]
fn test_deep_tree_count() {
    let tree = negations();
    assert_eq!(tree.count(), DEPTH + 1);
}
