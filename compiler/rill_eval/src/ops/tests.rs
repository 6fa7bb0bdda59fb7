use super::*;

fn binary(op: BinaryOp, ty: ScalarType, a: Register, b: Register) -> Register {
    match eval_binary(op, ty, a, b) {
        Ok(value) => value,
        Err(kind) => panic!("{op:?} on {ty} faulted: {kind}"),
    }
}

#[test]
fn test_support_table_matches_kernels() {
    let ones = Register::from_u32_lanes([1, 1, 1, 1]);
    for ty in ScalarType::ALL {
        for op in BinaryOp::ALL {
            let unsupported = matches!(
                eval_binary(op, ty, ones, ones),
                Err(FaultKind::UnsupportedOperator { .. })
            );
            assert_eq!(supports_binary(op, ty), !unsupported, "{op:?} on {ty}");
        }
        for op in UnaryOp::ALL {
            let unsupported = matches!(
                eval_unary(op, ty, ones),
                Err(FaultKind::UnsupportedOperator { .. })
            );
            assert_eq!(supports_unary(op, ty), !unsupported, "{op:?} on {ty}");
        }
    }
}

#[test]
fn test_int_add() {
    let r = binary(BinaryOp::Add, ScalarType::Int32, Register::from_i32(3), Register::from_i32(5));
    assert_eq!(r, Register::from_i32(8));
}

#[test]
fn test_int_wraps() {
    let r = binary(
        BinaryOp::Add,
        ScalarType::Int32,
        Register::from_i32(i32::MAX),
        Register::from_i32(1),
    );
    assert_eq!(r.as_i32(), i32::MIN);
    let r = binary(
        BinaryOp::Div,
        ScalarType::Int64,
        Register::from_i64(i64::MIN),
        Register::from_i64(-1),
    );
    assert_eq!(r.as_i64(), i64::MIN);
    let r = binary(BinaryOp::Sub, ScalarType::UInt8, Register::from_u8(0), Register::from_u8(1));
    assert_eq!(r, Register::from_u8(255));
}

#[test]
fn test_narrow_results_zero_high_bits() {
    let r = binary(BinaryOp::Add, ScalarType::Int8, Register::from_i8(-1), Register::from_i8(-1));
    assert_eq!(r.bits(), 0xFE);
}

#[test]
fn test_shift_amount_masked() {
    let r = binary(BinaryOp::Shl, ScalarType::UInt32, Register::from_u32(1), Register::from_u32(33));
    assert_eq!(r.as_u32(), 2);
    let r = binary(BinaryOp::Shr, ScalarType::Int32, Register::from_i32(-8), Register::from_i32(1));
    assert_eq!(r.as_i32(), -4);
}

#[test]
fn test_integer_division_by_zero() {
    assert_eq!(
        eval_binary(BinaryOp::Div, ScalarType::Int32, Register::from_i32(1), Register::ZERO),
        Err(FaultKind::DivisionByZero)
    );
    assert_eq!(
        eval_binary(BinaryOp::Mod, ScalarType::UInt64, Register::from_u64(1), Register::ZERO),
        Err(FaultKind::ModuloByZero)
    );
}

#[test]
fn test_float_division_by_zero_is_ieee() {
    let r = binary(BinaryOp::Div, ScalarType::Float, Register::from_f32(1.0), Register::from_f32(0.0));
    assert!(r.as_f32().is_infinite());
    let r = binary(BinaryOp::Mod, ScalarType::Double, Register::from_f64(7.5), Register::from_f64(2.0));
    assert_eq!(r.as_f64(), 1.5);
}

#[test]
fn test_float_nan_comparison() {
    let nan = Register::from_f64(f64::NAN);
    assert!(!binary(BinaryOp::Eq, ScalarType::Double, nan, nan).as_bool());
    assert!(binary(BinaryOp::NotEq, ScalarType::Double, nan, nan).as_bool());
}

#[test]
fn test_comparisons_yield_bool() {
    let r = binary(BinaryOp::Lt, ScalarType::Int16, Register::from_i16(-2), Register::from_i16(1));
    assert_eq!(r, Register::from_bool(true));
    let r = binary(BinaryOp::GtEq, ScalarType::UInt16, Register::from_u16(1), Register::from_u16(2));
    assert_eq!(r, Register::from_bool(false));
}

#[test]
fn test_signedness_of_comparison() {
    // 0xFFFF_FFFF is -1 signed, u32::MAX unsigned.
    let all_ones = Register::from_u32(u32::MAX);
    let one = Register::from_u32(1);
    assert!(binary(BinaryOp::Lt, ScalarType::Int32, all_ones, one).as_bool());
    assert!(!binary(BinaryOp::Lt, ScalarType::UInt32, all_ones, one).as_bool());
}

#[test]
fn test_bool_ops() {
    let t = Register::from_bool(true);
    let f = Register::from_bool(false);
    assert_eq!(binary(BinaryOp::BitXor, ScalarType::Bool, t, t), f);
    assert_eq!(binary(BinaryOp::BitOr, ScalarType::Bool, t, f), t);
    assert_eq!(eval_unary(UnaryOp::Not, ScalarType::Bool, f), Ok(t));
    assert!(matches!(
        eval_binary(BinaryOp::Add, ScalarType::Bool, t, t),
        Err(FaultKind::UnsupportedOperator { op: "+", ty: "bool" })
    ));
}

#[test]
fn test_vector_lanewise() {
    let a = Register::from_i32_lanes([1, 2, 3]);
    let b = Register::from_i32_lanes([10, 20, 30]);
    let r = binary(BinaryOp::Add, ScalarType::Int3, a, b);
    assert_eq!(r, Register::from_i32_lanes([11, 22, 33]));
    assert_eq!(r.lane(3), 0);

    let f = binary(
        BinaryOp::Mul,
        ScalarType::Float2,
        Register::from_f32_lanes([1.5, -2.0]),
        Register::from_f32_lanes([2.0, 4.0]),
    );
    assert_eq!(f.as_f32_lanes::<2>(), [3.0, -8.0]);
}

#[test]
fn test_vector_zero_lane_faults() {
    let a = Register::from_u32_lanes([4, 4, 4, 4]);
    let b = Register::from_u32_lanes([2, 2, 0, 2]);
    assert_eq!(
        eval_binary(BinaryOp::Div, ScalarType::UInt4, a, b),
        Err(FaultKind::DivisionByZero)
    );
    // A zero in an unused lane does not count.
    let b = Register::from_u32_lanes([2, 2, 2]);
    let r = binary(BinaryOp::Div, ScalarType::UInt3, a, b);
    assert_eq!(r.as_u32_lanes::<3>(), [2, 2, 2]);
}

#[test]
fn test_vector_equality() {
    let a = Register::from_f32_lanes([1.0, 2.0]);
    let b = Register::from_f32_lanes([1.0, 3.0]);
    assert!(!binary(BinaryOp::Eq, ScalarType::Float2, a, b).as_bool());
    assert!(binary(BinaryOp::Eq, ScalarType::Float2, a, a).as_bool());
    assert!(!supports_binary(BinaryOp::Lt, ScalarType::Float2));
}

#[test]
fn test_pointer_equality_only() {
    let p = Register::from_ptr(0x2_0000_0010);
    assert!(binary(BinaryOp::Eq, ScalarType::Ptr, p, p).as_bool());
    assert!(!supports_binary(BinaryOp::Add, ScalarType::Ptr));
    assert!(!supports_unary(UnaryOp::Neg, ScalarType::String));
}

#[test]
fn test_unary() {
    assert_eq!(
        eval_unary(UnaryOp::Neg, ScalarType::Int32, Register::from_i32(5)),
        Ok(Register::from_i32(-5))
    );
    assert_eq!(
        eval_unary(UnaryOp::BitNot, ScalarType::UInt8, Register::from_u8(0x0F)),
        Ok(Register::from_u8(0xF0))
    );
    assert_eq!(
        eval_unary(UnaryOp::Neg, ScalarType::Int32, Register::from_i32(i32::MIN)),
        Ok(Register::from_i32(i32::MIN))
    );
    assert_eq!(
        eval_unary(UnaryOp::Neg, ScalarType::Float2, Register::from_f32_lanes([1.0, -2.0])),
        Ok(Register::from_f32_lanes([-1.0, 2.0]))
    );
}
