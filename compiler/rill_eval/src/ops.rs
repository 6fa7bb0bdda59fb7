//! Operator kernels.
//!
//! The single definition of what every unary and binary operator does on
//! every register type. Plain operator nodes and their fused forms both
//! call these functions, so a fused node cannot disagree with the subtree
//! it replaced.
//!
//! # Semantics
//!
//! - Integers wrap (two's complement); `MIN / -1` wraps to `MIN`.
//! - Shift amounts are masked to the lane width.
//! - Integer `/` and `%` by zero fault, including any zero lane of a vector.
//! - Floats follow IEEE 754; `%` is the remainder of truncating division.
//! - Comparisons yield `bool`. Vectors compare all lanes for `==`/`!=` and
//!   have no ordering.
//! - Pointers, strings and ranges support `==`/`!=` on their bits only.

#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    reason = "kernels reinterpret lane bits and compare floats per IEEE"
)]

use rill_ir::{BinaryOp, Register, ScalarType, UnaryOp};

use crate::FaultKind;

/// Operator family of a register type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Class {
    Bool,
    Int,
    Float,
    IntVector,
    FloatVector,
    /// Compared by bits only.
    Opaque,
}

fn class(ty: ScalarType) -> Class {
    match ty {
        ScalarType::Bool => Class::Bool,
        ScalarType::Float | ScalarType::Double => Class::Float,
        ScalarType::Float2 | ScalarType::Float3 | ScalarType::Float4 => Class::FloatVector,
        ScalarType::Int2
        | ScalarType::Int3
        | ScalarType::Int4
        | ScalarType::UInt2
        | ScalarType::UInt3
        | ScalarType::UInt4 => Class::IntVector,
        ScalarType::Ptr | ScalarType::String | ScalarType::Range | ScalarType::URange => {
            Class::Opaque
        }
        ScalarType::Int8
        | ScalarType::UInt8
        | ScalarType::Int16
        | ScalarType::UInt16
        | ScalarType::Int32
        | ScalarType::UInt32
        | ScalarType::Int64
        | ScalarType::UInt64 => Class::Int,
    }
}

const fn is_arithmetic(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
    )
}

const fn is_equality(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Eq | BinaryOp::NotEq)
}

const fn is_logical(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
}

/// Whether `op` is defined on `ty`.
pub fn supports_unary(op: UnaryOp, ty: ScalarType) -> bool {
    match class(ty) {
        Class::Bool => op == UnaryOp::Not,
        Class::Int | Class::IntVector => matches!(op, UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot),
        Class::Float | Class::FloatVector => matches!(op, UnaryOp::Neg | UnaryOp::Plus),
        Class::Opaque => false,
    }
}

/// Whether `op` is defined on operands of type `ty`.
pub fn supports_binary(op: BinaryOp, ty: ScalarType) -> bool {
    match class(ty) {
        Class::Int => true,
        Class::Float => is_arithmetic(op) || op.is_comparison(),
        Class::Bool => is_equality(op) || is_logical(op),
        Class::IntVector => !op.is_comparison() || is_equality(op),
        Class::FloatVector => is_arithmetic(op) || is_equality(op),
        Class::Opaque => is_equality(op),
    }
}

fn unsupported_unary(op: UnaryOp, ty: ScalarType) -> FaultKind {
    FaultKind::UnsupportedOperator {
        op: op.as_symbol(),
        ty: ty.name(),
    }
}

fn unsupported_binary(op: BinaryOp, ty: ScalarType) -> FaultKind {
    FaultKind::UnsupportedOperator {
        op: op.as_symbol(),
        ty: ty.name(),
    }
}

// Unary

macro_rules! int_unary {
    ($op:expr, $ty:expr, $x:expr, $wrap:path) => {{
        let x = $x;
        match $op {
            UnaryOp::Neg => Ok($wrap(x.wrapping_neg())),
            UnaryOp::Plus => Ok($wrap(x)),
            UnaryOp::BitNot => Ok($wrap(!x)),
            UnaryOp::Not => Err(unsupported_unary($op, $ty)),
        }
    }};
}

macro_rules! float_unary {
    ($op:expr, $ty:expr, $x:expr, $wrap:path) => {{
        let x = $x;
        match $op {
            UnaryOp::Neg => Ok($wrap(-x)),
            UnaryOp::Plus => Ok($wrap(x)),
            UnaryOp::Not | UnaryOp::BitNot => Err(unsupported_unary($op, $ty)),
        }
    }};
}

/// Apply a unary operator to `x` interpreted as `ty`.
pub fn eval_unary(op: UnaryOp, ty: ScalarType, x: Register) -> Result<Register, FaultKind> {
    match ty {
        ScalarType::Bool => match op {
            UnaryOp::Not => Ok(Register::from_bool(!x.as_bool())),
            _ => Err(unsupported_unary(op, ty)),
        },
        ScalarType::Int8 => int_unary!(op, ty, x.as_i8(), Register::from_i8),
        ScalarType::UInt8 => int_unary!(op, ty, x.as_u8(), Register::from_u8),
        ScalarType::Int16 => int_unary!(op, ty, x.as_i16(), Register::from_i16),
        ScalarType::UInt16 => int_unary!(op, ty, x.as_u16(), Register::from_u16),
        ScalarType::Int32 => int_unary!(op, ty, x.as_i32(), Register::from_i32),
        ScalarType::UInt32 => int_unary!(op, ty, x.as_u32(), Register::from_u32),
        ScalarType::Int64 => int_unary!(op, ty, x.as_i64(), Register::from_i64),
        ScalarType::UInt64 => int_unary!(op, ty, x.as_u64(), Register::from_u64),
        ScalarType::Float => float_unary!(op, ty, x.as_f32(), Register::from_f32),
        ScalarType::Double => float_unary!(op, ty, x.as_f64(), Register::from_f64),
        ScalarType::Float2 => float_lanes_unary::<2>(op, ty, x),
        ScalarType::Float3 => float_lanes_unary::<3>(op, ty, x),
        ScalarType::Float4 => float_lanes_unary::<4>(op, ty, x),
        ScalarType::Int2 | ScalarType::UInt2 => int_lanes_unary::<2>(op, ty, x),
        ScalarType::Int3 | ScalarType::UInt3 => int_lanes_unary::<3>(op, ty, x),
        ScalarType::Int4 | ScalarType::UInt4 => int_lanes_unary::<4>(op, ty, x),
        ScalarType::Ptr | ScalarType::String | ScalarType::Range | ScalarType::URange => {
            Err(unsupported_unary(op, ty))
        }
    }
}

/// Negation and complement are sign-agnostic on 32-bit lanes.
fn int_lanes_unary<const N: usize>(
    op: UnaryOp,
    ty: ScalarType,
    x: Register,
) -> Result<Register, FaultKind> {
    let lanes = x.as_u32_lanes::<N>();
    let result = match op {
        UnaryOp::Neg => lanes.map(u32::wrapping_neg),
        UnaryOp::Plus => lanes,
        UnaryOp::BitNot => lanes.map(|lane| !lane),
        UnaryOp::Not => return Err(unsupported_unary(op, ty)),
    };
    Ok(Register::from_u32_lanes(result))
}

fn float_lanes_unary<const N: usize>(
    op: UnaryOp,
    ty: ScalarType,
    x: Register,
) -> Result<Register, FaultKind> {
    let lanes = x.as_f32_lanes::<N>();
    let result = match op {
        UnaryOp::Neg => lanes.map(|lane| -lane),
        UnaryOp::Plus => lanes,
        UnaryOp::Not | UnaryOp::BitNot => return Err(unsupported_unary(op, ty)),
    };
    Ok(Register::from_f32_lanes(result))
}

// Binary

macro_rules! int_binary {
    ($op:expr, $a:expr, $b:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Ok($wrap(a.wrapping_add(b))),
            BinaryOp::Sub => Ok($wrap(a.wrapping_sub(b))),
            BinaryOp::Mul => Ok($wrap(a.wrapping_mul(b))),
            BinaryOp::Div => {
                if b == 0 {
                    Err(FaultKind::DivisionByZero)
                } else {
                    Ok($wrap(a.wrapping_div(b)))
                }
            }
            BinaryOp::Mod => {
                if b == 0 {
                    Err(FaultKind::ModuloByZero)
                } else {
                    Ok($wrap(a.wrapping_rem(b)))
                }
            }
            BinaryOp::BitAnd => Ok($wrap(a & b)),
            BinaryOp::BitOr => Ok($wrap(a | b)),
            BinaryOp::BitXor => Ok($wrap(a ^ b)),
            BinaryOp::Shl => Ok($wrap(a.wrapping_shl(b as u32))),
            BinaryOp::Shr => Ok($wrap(a.wrapping_shr(b as u32))),
            BinaryOp::Eq => Ok(Register::from_bool(a == b)),
            BinaryOp::NotEq => Ok(Register::from_bool(a != b)),
            BinaryOp::Lt => Ok(Register::from_bool(a < b)),
            BinaryOp::LtEq => Ok(Register::from_bool(a <= b)),
            BinaryOp::Gt => Ok(Register::from_bool(a > b)),
            BinaryOp::GtEq => Ok(Register::from_bool(a >= b)),
        }
    }};
}

macro_rules! float_binary {
    ($op:expr, $ty:expr, $a:expr, $b:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Ok($wrap(a + b)),
            BinaryOp::Sub => Ok($wrap(a - b)),
            BinaryOp::Mul => Ok($wrap(a * b)),
            BinaryOp::Div => Ok($wrap(a / b)),
            BinaryOp::Mod => Ok($wrap(a % b)),
            BinaryOp::Eq => Ok(Register::from_bool(a == b)),
            BinaryOp::NotEq => Ok(Register::from_bool(a != b)),
            BinaryOp::Lt => Ok(Register::from_bool(a < b)),
            BinaryOp::LtEq => Ok(Register::from_bool(a <= b)),
            BinaryOp::Gt => Ok(Register::from_bool(a > b)),
            BinaryOp::GtEq => Ok(Register::from_bool(a >= b)),
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr => Err(unsupported_binary($op, $ty)),
        }
    }};
}

/// Apply a binary operator to `a` and `b` interpreted as `ty`.
pub fn eval_binary(
    op: BinaryOp,
    ty: ScalarType,
    a: Register,
    b: Register,
) -> Result<Register, FaultKind> {
    match ty {
        ScalarType::Bool => bool_binary(op, ty, a.as_bool(), b.as_bool()),
        ScalarType::Int8 => int_binary!(op, a.as_i8(), b.as_i8(), Register::from_i8),
        ScalarType::UInt8 => int_binary!(op, a.as_u8(), b.as_u8(), Register::from_u8),
        ScalarType::Int16 => int_binary!(op, a.as_i16(), b.as_i16(), Register::from_i16),
        ScalarType::UInt16 => int_binary!(op, a.as_u16(), b.as_u16(), Register::from_u16),
        ScalarType::Int32 => int_binary!(op, a.as_i32(), b.as_i32(), Register::from_i32),
        ScalarType::UInt32 => int_binary!(op, a.as_u32(), b.as_u32(), Register::from_u32),
        ScalarType::Int64 => int_binary!(op, a.as_i64(), b.as_i64(), Register::from_i64),
        ScalarType::UInt64 => int_binary!(op, a.as_u64(), b.as_u64(), Register::from_u64),
        ScalarType::Float => float_binary!(op, ty, a.as_f32(), b.as_f32(), Register::from_f32),
        ScalarType::Double => float_binary!(op, ty, a.as_f64(), b.as_f64(), Register::from_f64),
        ScalarType::Float2 => float_lanes_binary::<2>(op, ty, a, b),
        ScalarType::Float3 => float_lanes_binary::<3>(op, ty, a, b),
        ScalarType::Float4 => float_lanes_binary::<4>(op, ty, a, b),
        ScalarType::Int2 => i32_lanes_binary::<2>(op, ty, a, b),
        ScalarType::Int3 => i32_lanes_binary::<3>(op, ty, a, b),
        ScalarType::Int4 => i32_lanes_binary::<4>(op, ty, a, b),
        ScalarType::UInt2 => u32_lanes_binary::<2>(op, ty, a, b),
        ScalarType::UInt3 => u32_lanes_binary::<3>(op, ty, a, b),
        ScalarType::UInt4 => u32_lanes_binary::<4>(op, ty, a, b),
        ScalarType::Ptr | ScalarType::String | ScalarType::Range | ScalarType::URange => {
            match op {
                BinaryOp::Eq => Ok(Register::from_bool(a.as_u64() == b.as_u64())),
                BinaryOp::NotEq => Ok(Register::from_bool(a.as_u64() != b.as_u64())),
                _ => Err(unsupported_binary(op, ty)),
            }
        }
    }
}

fn bool_binary(op: BinaryOp, ty: ScalarType, a: bool, b: bool) -> Result<Register, FaultKind> {
    let result = match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ => return Err(unsupported_binary(op, ty)),
    };
    Ok(Register::from_bool(result))
}

macro_rules! int_lanes_binary {
    ($name:ident, $lane:ty, $as_lanes:ident, $from_lanes:path) => {
        fn $name<const N: usize>(
            op: BinaryOp,
            ty: ScalarType,
            a: Register,
            b: Register,
        ) -> Result<Register, FaultKind> {
            let a = a.$as_lanes::<N>();
            let b = b.$as_lanes::<N>();
            let lanes: [$lane; N] = match op {
                BinaryOp::Add => std::array::from_fn(|i| a[i].wrapping_add(b[i])),
                BinaryOp::Sub => std::array::from_fn(|i| a[i].wrapping_sub(b[i])),
                BinaryOp::Mul => std::array::from_fn(|i| a[i].wrapping_mul(b[i])),
                BinaryOp::Div => {
                    if b.contains(&0) {
                        return Err(FaultKind::DivisionByZero);
                    }
                    std::array::from_fn(|i| a[i].wrapping_div(b[i]))
                }
                BinaryOp::Mod => {
                    if b.contains(&0) {
                        return Err(FaultKind::ModuloByZero);
                    }
                    std::array::from_fn(|i| a[i].wrapping_rem(b[i]))
                }
                BinaryOp::BitAnd => std::array::from_fn(|i| a[i] & b[i]),
                BinaryOp::BitOr => std::array::from_fn(|i| a[i] | b[i]),
                BinaryOp::BitXor => std::array::from_fn(|i| a[i] ^ b[i]),
                BinaryOp::Shl => std::array::from_fn(|i| a[i].wrapping_shl(b[i] as u32)),
                BinaryOp::Shr => std::array::from_fn(|i| a[i].wrapping_shr(b[i] as u32)),
                BinaryOp::Eq => return Ok(Register::from_bool(a == b)),
                BinaryOp::NotEq => return Ok(Register::from_bool(a != b)),
                BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                    return Err(unsupported_binary(op, ty));
                }
            };
            Ok($from_lanes(lanes))
        }
    };
}

int_lanes_binary!(i32_lanes_binary, i32, as_i32_lanes, Register::from_i32_lanes);
int_lanes_binary!(u32_lanes_binary, u32, as_u32_lanes, Register::from_u32_lanes);

fn float_lanes_binary<const N: usize>(
    op: BinaryOp,
    ty: ScalarType,
    a: Register,
    b: Register,
) -> Result<Register, FaultKind> {
    let a = a.as_f32_lanes::<N>();
    let b = b.as_f32_lanes::<N>();
    let lanes: [f32; N] = match op {
        BinaryOp::Add => std::array::from_fn(|i| a[i] + b[i]),
        BinaryOp::Sub => std::array::from_fn(|i| a[i] - b[i]),
        BinaryOp::Mul => std::array::from_fn(|i| a[i] * b[i]),
        BinaryOp::Div => std::array::from_fn(|i| a[i] / b[i]),
        BinaryOp::Mod => std::array::from_fn(|i| a[i] % b[i]),
        BinaryOp::Eq => return Ok(Register::from_bool(a == b)),
        BinaryOp::NotEq => return Ok(Register::from_bool(a != b)),
        _ => return Err(unsupported_binary(op, ty)),
    };
    Ok(Register::from_f32_lanes(lanes))
}

#[cfg(test)]
mod tests;
