//! Fused trees evaluate exactly like the trees they came from.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rill_eval::ops::{supports_binary, supports_unary};
use rill_eval::{
    Context, ContextState, Fault, Node, NodeKind, NodeTag, Program, ProgramBuilder, SharedProgram,
    Signature,
};
use rill_fusion::{fuse_program, run_fusion_pass, FusionCatalog, FusionStats};
use rill_ir::{BinaryOp, Register, ScalarType, Span, UnaryOp};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Operand {
    Const,
    Local,
    Argument,
    Subtree,
}

impl Operand {
    fn is_leaf(self) -> bool {
        self != Operand::Subtree
    }
}

fn operand_strategy() -> impl Strategy<Value = Operand> {
    prop_oneof![
        Just(Operand::Const),
        Just(Operand::Local),
        Just(Operand::Argument),
        Just(Operand::Subtree),
    ]
}

/// Operand `index` (0 or 1) holding `value` in the given shape.
///
/// Every shape yields the same value: locals and arguments are filled with
/// it before the operator runs.
fn operand(shape: Operand, index: u32, ty: ScalarType, value: Register) -> Node {
    let span = Span::new(100 + index * 10, 105 + index * 10);
    match shape {
        Operand::Const => Node::constant(value).with_span(span),
        Operand::Local => Node::local(index * 16, ty).with_span(span),
        Operand::Argument => Node::argument(index).with_span(span),
        Operand::Subtree => Node::new(NodeKind::Block(vec![Node::constant(value)]), span),
    }
}

/// `f(a, b) { local0 = a; local16 = b; <expr> }`
fn program(ty: ScalarType, values: [Register; 2], expr: Node) -> Program {
    let setup = values.iter().zip([0u32, 16]).map(|(&value, offset)| {
        Node::synthetic(NodeKind::SetLocal {
            offset,
            ty,
            value: Box::new(Node::constant(value)),
        })
    });
    let body = Node::synthetic(NodeKind::Block(setup.chain([expr]).collect()));
    let mut builder = ProgramBuilder::new();
    builder
        .function(Signature::new("f").args([ty, ty]).frame_size(32), body)
        .unwrap();
    builder.build().unwrap()
}

fn run(program: Program, values: [Register; 2]) -> (Register, Option<Fault>) {
    let program = SharedProgram::new(program);
    let function = program.find_function("f").unwrap();
    let mut ctx = Context::new(program);
    let value = ctx.eval_function(function, &values);
    (value, ctx.exception().cloned())
}

fn fused(mut program: Program) -> (Program, FusionStats) {
    let stats = fuse_program(&mut program, &FusionCatalog::builtin());
    (program, stats)
}

#[test]
fn test_add_constant_to_local() {
    let expr = Node::op2(
        BinaryOp::Add,
        ScalarType::Int32,
        Node::constant(Register::from_i32(3)),
        Node::local(0, ScalarType::Int32),
    );
    let values = [Register::from_i32(5), Register::ZERO];
    let build = || program(ScalarType::Int32, values, expr.clone());

    let (plain, plain_fault) = run(build(), values);
    let (program, stats) = fused(build());
    let fused_tag = program.functions()[0].body.children()[2].tag();
    assert_eq!(fused_tag, NodeTag::Op2Fusion);
    assert_eq!(stats.fused, 1);

    let (fused, fused_fault) = run(program, values);
    assert_eq!(plain.as_i32(), 8);
    assert_eq!(fused, plain);
    assert_eq!(fused_fault, None);
    assert_eq!(plain_fault, None);
}

#[test]
fn test_fused_fault_matches_unfused() {
    let op_span = Span::new(40, 48);
    let expr = Node::op2(
        BinaryOp::Div,
        ScalarType::Int32,
        Node::argument(0),
        Node::local(16, ScalarType::Int32),
    )
    .with_span(op_span);
    let values = [Register::from_i32(9), Register::ZERO];
    let build = || program(ScalarType::Int32, values, expr.clone());

    let plain = run(build(), values);
    let fused = run(fused(build()).0, values);
    assert_eq!(fused, plain);
    let fault = plain.1.unwrap();
    assert_eq!(fault.span, Some(op_span));
}

#[test]
fn test_fusing_twice_is_a_no_op() {
    let catalog = FusionCatalog::builtin();
    let mut tree = Node::op2(
        BinaryOp::Mul,
        ScalarType::Float,
        Node::op1(UnaryOp::Neg, ScalarType::Float, Node::argument(0)),
        Node::constant(Register::from_f32(2.5)),
    );
    run_fusion_pass(&mut tree, &catalog);
    let once = tree.clone();
    let stats = run_fusion_pass(&mut tree, &catalog);
    assert_eq!(stats.fused, 0);
    assert_eq!(tree, once);
}

#[test]
fn test_fused_program_reuses_context() {
    let expr = Node::op2(
        BinaryOp::Sub,
        ScalarType::Int64,
        Node::local(0, ScalarType::Int64),
        Node::synthetic(NodeKind::Block(vec![Node::argument(1)])),
    );
    let values = [Register::from_i64(i64::MIN), Register::from_i64(1)];
    let program = SharedProgram::new(fused(program(ScalarType::Int64, values, expr)).0);
    let function = program.find_function("f").unwrap();
    let mut ctx = Context::new(program);

    let first = ctx.eval_function(function, &values);
    ctx.restart();
    let second = ctx.eval_function(function, &values);
    assert_eq!(first, second);
    assert_eq!(first.as_i64(), i64::MAX);
    assert_eq!(ctx.state(), ContextState::Completed);
}

fn register_strategy() -> impl Strategy<Value = Register> {
    prop_oneof![
        any::<u128>().prop_map(Register::from_bits),
        (-3i64..3).prop_map(Register::from_i64),
        Just(Register::ZERO),
    ]
}

proptest! {
    #[test]
    fn binary_fusion_is_equivalent(
        op in proptest::sample::select(BinaryOp::ALL.to_vec()),
        ty in proptest::sample::select(ScalarType::ALL.to_vec()),
        left in operand_strategy(),
        right in operand_strategy(),
        a in register_strategy(),
        b in register_strategy(),
    ) {
        let values = [a, b];
        let expr = || {
            Node::op2(op, ty, operand(left, 0, ty, a), operand(right, 1, ty, b))
                .with_span(Span::new(1, 20))
        };
        let plain = run(program(ty, values, expr()), values);
        let (fused_program, stats) = fused(program(ty, values, expr()));
        let fusable = supports_binary(op, ty) && (left.is_leaf() || right.is_leaf());
        prop_assert_eq!(stats.fused, usize::from(fusable));
        prop_assert_eq!(run(fused_program, values), plain);
    }

    #[test]
    fn unary_fusion_is_equivalent(
        op in proptest::sample::select(UnaryOp::ALL.to_vec()),
        ty in proptest::sample::select(ScalarType::ALL.to_vec()),
        x in operand_strategy(),
        a in register_strategy(),
    ) {
        let values = [a, Register::ZERO];
        let expr = || Node::op1(op, ty, operand(x, 0, ty, a)).with_span(Span::new(1, 20));
        let plain = run(program(ty, values, expr()), values);
        let (fused_program, stats) = fused(program(ty, values, expr()));
        prop_assert_eq!(stats.fused, usize::from(supports_unary(op, ty) && x.is_leaf()));
        prop_assert_eq!(run(fused_program, values), plain);
    }
}
