use pretty_assertions::assert_eq;
use rill_ir::{BinaryOp, Span};

use super::*;
use crate::{NodeKind, ProgramBuilder, Signature};

fn int(value: i32) -> Node {
    Node::constant(Register::from_i32(value))
}

fn add(left: Node, right: Node) -> Node {
    Node::op2(BinaryOp::Add, ScalarType::Int32, left, right)
}

fn block(nodes: Vec<Node>) -> Node {
    Node::synthetic(NodeKind::Block(nodes))
}

fn set_local(offset: u32, value: Node) -> Node {
    Node::synthetic(NodeKind::SetLocal {
        offset,
        ty: ScalarType::Int32,
        value: Box::new(value),
    })
}

fn call(function: FunctionId, args: Vec<Node>) -> Node {
    Node::synthetic(NodeKind::Call { function, args })
}

fn throw(message: &str) -> Node {
    Node::synthetic(NodeKind::Throw {
        message: message.to_string(),
    })
}

fn try_catch(body: Node, handler: Option<Node>) -> Node {
    Node::synthetic(NodeKind::Try {
        body: Box::new(body),
        handler: handler.map(Box::new),
    })
}

fn empty_program() -> SharedProgram {
    SharedProgram::new(ProgramBuilder::new().build().unwrap())
}

#[test]
fn test_fresh_context() {
    let ctx = Context::new(empty_program());
    assert_eq!(ctx.state(), ContextState::Fresh);
    assert!(ctx.exception().is_none());
    assert!(ctx.catch_boundaries().is_empty());
}

#[test]
fn test_eval_completes() {
    let mut ctx = Context::new(empty_program());
    let result = ctx.eval(&add(int(2), int(3)));
    assert_eq!(result.as_i32(), 5);
    assert_eq!(ctx.state(), ContextState::Completed);
    assert!(ctx.exception().is_none());
}

#[test]
fn test_uncaught_fault() {
    let mut ctx = Context::new(empty_program());
    let span = Span::new(10, 15);
    let div = Node::op2(BinaryOp::Div, ScalarType::Int32, int(1), int(0)).with_span(span);
    let result = ctx.eval(&div);
    assert_eq!(result, Register::ZERO);
    assert_eq!(ctx.state(), ContextState::Faulted);
    let fault = ctx.exception().unwrap();
    assert_eq!(fault.kind, FaultKind::DivisionByZero);
    assert_eq!(fault.span, Some(span));
}

#[test]
fn test_try_catches_and_keeps_fault() {
    let mut ctx = Context::new(empty_program());
    let tree = try_catch(throw("boom"), Some(int(7)));
    assert_eq!(ctx.eval(&tree).as_i32(), 7);
    assert_eq!(ctx.state(), ContextState::UnwoundToCatch);
    assert_eq!(
        ctx.exception().map(|fault| &fault.kind),
        Some(&FaultKind::Thrown {
            message: "boom".to_string()
        })
    );
    assert!(ctx.catch_boundaries().is_empty());
}

#[test]
fn test_try_without_fault_completes() {
    let mut ctx = Context::new(empty_program());
    let tree = try_catch(int(3), Some(int(7)));
    assert_eq!(ctx.eval(&tree).as_i32(), 3);
    assert_eq!(ctx.state(), ContextState::Completed);
}

#[test]
fn test_fault_in_handler_is_uncaught() {
    let mut ctx = Context::new(empty_program());
    let tree = try_catch(throw("first"), Some(throw("second")));
    ctx.eval(&tree);
    assert_eq!(ctx.state(), ContextState::Faulted);
    assert_eq!(
        ctx.exception().map(ToString::to_string),
        Some("second at 0..0".to_string())
    );
}

#[test]
fn test_eval_with_catch_never_faults() {
    let mut ctx = Context::new(empty_program());
    let result = ctx.eval_with_catch(&throw("boom"));
    assert_eq!(result, Register::ZERO);
    assert_eq!(ctx.state(), ContextState::UnwoundToCatch);
    assert!(ctx.exception().is_some());

    let result = ctx.eval_with_catch(&int(4));
    assert_eq!(result.as_i32(), 4);
    assert_eq!(ctx.state(), ContextState::Completed);
    assert!(ctx.exception().is_none());
}

#[test]
fn test_restart_after_fault() {
    let mut ctx = Context::new(empty_program());
    ctx.eval(&throw("boom"));
    ctx.restart();
    assert_eq!(ctx.state(), ContextState::Fresh);
    assert!(ctx.exception().is_none());
    assert_eq!(ctx.eval(&int(1)).as_i32(), 1);
    assert_eq!(ctx.state(), ContextState::Completed);
}

#[test]
fn test_restart_zeroes_root_frame() {
    let mut builder = ProgramBuilder::new();
    builder.root_frame_size(8);
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    let bump = block(vec![
        set_local(0, add(Node::local(0, ScalarType::Int32), int(1))),
        Node::local(0, ScalarType::Int32),
    ]);

    assert_eq!(ctx.eval(&bump).as_i32(), 1);
    assert_eq!(ctx.eval(&bump).as_i32(), 2);
    ctx.restart();
    assert_eq!(ctx.eval(&bump).as_i32(), 1);
}

#[test]
fn test_restart_keeps_stack_allocation() {
    let mut builder = ProgramBuilder::new();
    builder.root_frame_size(64);
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    let before = ctx.stack_size();
    ctx.eval(&int(0));
    ctx.restart();
    assert_eq!(ctx.stack_size(), before);
}

#[test]
fn test_stack_grows_on_demand() {
    let mut builder = ProgramBuilder::new();
    let big = builder
        .function(Signature::new("big").frame_size(1024), int(9))
        .unwrap();
    builder.max_stack_depth(16);
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    assert_eq!(ctx.stack_size(), 16);

    assert_eq!(ctx.eval_function(big, &[]).as_i32(), 9);
    assert_eq!(ctx.state(), ContextState::Completed);
    assert!(ctx.stack_size() >= 1024);
}

#[test]
fn test_stack_overflow_past_limit() {
    let mut builder = ProgramBuilder::new();
    let big = builder
        .function(Signature::new("big").frame_size(1024), int(9))
        .unwrap();
    let program = SharedProgram::new(builder.build().unwrap());
    let mut ctx = Context::builder(program).stack_limit(512).build();

    ctx.eval_function(big, &[]);
    assert_eq!(ctx.state(), ContextState::Faulted);
    assert_eq!(
        ctx.exception().map(|fault| &fault.kind),
        Some(&FaultKind::StackOverflow)
    );
}

#[test]
fn test_call_depth_limited() {
    let mut builder = ProgramBuilder::new();
    let forever = builder.declare(Signature::new("forever")).unwrap();
    builder.define(forever, call(forever, Vec::new())).unwrap();
    let program = SharedProgram::new(builder.build().unwrap());
    let mut ctx = Context::builder(program).max_call_depth(64).build();

    ctx.eval_function(forever, &[]);
    assert_eq!(ctx.state(), ContextState::Faulted);
    assert_eq!(
        ctx.exception().map(|fault| &fault.kind),
        Some(&FaultKind::StackOverflow)
    );
}

#[test]
fn test_callee_frame_starts_zeroed() {
    let mut builder = ProgramBuilder::new();
    let scribble = builder
        .function(
            Signature::new("scribble").frame_size(4),
            set_local(0, int(99)),
        )
        .unwrap();
    let fresh = builder
        .function(
            Signature::new("fresh").frame_size(4),
            Node::local(0, ScalarType::Int32),
        )
        .unwrap();
    let main = builder
        .function(
            Signature::new("main"),
            block(vec![call(scribble, Vec::new()), call(fresh, Vec::new())]),
        )
        .unwrap();
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    assert_eq!(ctx.eval_function(main, &[]).as_i32(), 0);
}

#[test]
fn test_arguments() {
    let mut builder = ProgramBuilder::new();
    let sum = builder
        .function(
            Signature::new("sum").args([ScalarType::Int32, ScalarType::Int32]),
            add(Node::argument(0), Node::argument(1)),
        )
        .unwrap();
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    let result = ctx.eval_function(sum, &[Register::from_i32(40), Register::from_i32(2)]);
    assert_eq!(result.as_i32(), 42);
}

#[test]
fn test_argument_out_of_range() {
    let mut builder = ProgramBuilder::new();
    let span = Span::new(2, 4);
    let first = builder
        .function(Signature::new("first"), Node::argument(0).with_span(span))
        .unwrap();
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));

    ctx.eval_function(first, &[]);
    let fault = ctx.exception().unwrap();
    assert_eq!(fault.kind, FaultKind::ArgumentOutOfRange { index: 0, count: 0 });
    assert_eq!(fault.span, Some(span));
}

#[test]
fn test_unknown_function_faults() {
    let mut ctx = Context::new(empty_program());
    ctx.eval_function(FunctionId::new(5), &[]);
    assert_eq!(
        ctx.exception().map(|fault| &fault.kind),
        Some(&FaultKind::UnknownFunction(FunctionId::new(5)))
    );
}

#[test]
fn test_catch_restores_caller_frame() {
    let mut builder = ProgramBuilder::new();
    let fails = builder
        .function(
            Signature::new("fails").frame_size(4),
            block(vec![set_local(0, int(-1)), throw("inner")]),
        )
        .unwrap();
    let main = builder
        .function(
            Signature::new("main").frame_size(4),
            block(vec![
                set_local(0, int(5)),
                try_catch(call(fails, vec![int(1)]), None),
                Node::local(0, ScalarType::Int32),
            ]),
        )
        .unwrap();
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));

    assert_eq!(ctx.eval_function(main, &[]).as_i32(), 5);
    assert_eq!(ctx.state(), ContextState::UnwoundToCatch);
}

#[test]
fn test_verify_call() {
    let mut builder = ProgramBuilder::new();
    let f = builder
        .function(
            Signature::new("f")
                .args([ScalarType::Int32, ScalarType::Float])
                .returns(ScalarType::Bool),
            Node::constant(Register::from_bool(true)),
        )
        .unwrap();
    let ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    let args = [ScalarType::Int32, ScalarType::Float];

    assert_eq!(ctx.find_function("f"), Some(f));
    assert_eq!(ctx.verify_call(f, &args, Some(ScalarType::Bool)), Ok(()));
    assert!(matches!(
        ctx.verify_call(f, &args[..1], Some(ScalarType::Bool)),
        Err(CallError::ArityMismatch {
            expected: 2,
            got: 1,
            ..
        })
    ));
    assert!(matches!(
        ctx.verify_call(f, &[ScalarType::Int32, ScalarType::Int32], Some(ScalarType::Bool)),
        Err(CallError::ArgumentType { index: 1, .. })
    ));
    assert_eq!(
        ctx.verify_call(f, &args, None).map_err(|err| err.to_string()),
        Err("`f` returns bool, not nothing".to_string())
    );
    assert_eq!(
        ctx.verify_call(FunctionId::new(7), &args, None),
        Err(CallError::UnknownFunction(FunctionId::new(7)))
    );
}

#[test]
fn test_init_script_writes_globals() {
    let mut builder = ProgramBuilder::new();
    builder.globals_size(4).init(Node::synthetic(NodeKind::SetGlobal {
        offset: 0,
        ty: ScalarType::Int32,
        value: Box::new(int(42)),
    }));
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));

    assert!(ctx.run_init_script());
    let read = Node::synthetic(NodeKind::GetGlobalR2V {
        offset: 0,
        ty: ScalarType::Int32,
    });
    assert_eq!(ctx.eval(&read).as_i32(), 42);
}

#[test]
fn test_failing_init_script() {
    let mut builder = ProgramBuilder::new();
    builder.init(throw("init failed"));
    let mut ctx = Context::new(SharedProgram::new(builder.build().unwrap()));
    assert!(!ctx.run_init_script());
    assert_eq!(ctx.state(), ContextState::Faulted);
}

#[test]
fn test_no_init_script() {
    let mut ctx = Context::new(empty_program());
    assert!(ctx.run_init_script());
}

#[test]
fn test_shared_globals_between_contexts() {
    let mut builder = ProgramBuilder::new();
    builder.globals_size(8);
    let program = SharedProgram::new(builder.build().unwrap());
    let globals = SharedGlobals::new(program.globals_size());
    let mut writer = Context::builder(program.clone())
        .globals(globals.clone())
        .build();
    let mut reader = Context::builder(program).globals(globals).build();

    writer.eval(&Node::synthetic(NodeKind::SetGlobal {
        offset: 4,
        ty: ScalarType::Int32,
        value: Box::new(int(11)),
    }));
    let read = Node::synthetic(NodeKind::GetGlobalR2V {
        offset: 4,
        ty: ScalarType::Int32,
    });
    assert_eq!(reader.eval(&read).as_i32(), 11);
    assert!(writer.globals().same(reader.globals()));
}

#[test]
fn test_memory_read_rejects_null() {
    let ctx = Context::new(empty_program());
    assert!(!ctx.visit_bytes(Address::NULL, 0, &mut |_| {}));
    assert_eq!(ctx.read_register(Address::NULL, 0), None);
}

#[test]
fn test_store_to_data_region_faults() {
    let mut ctx = Context::new(empty_program());
    assert_eq!(
        ctx.store(Address::data(0), ScalarType::Int32, Register::from_i32(1)),
        Err(FaultKind::InvalidAddress)
    );
}
