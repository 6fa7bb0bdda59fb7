//! Register-held value types.
//!
//! `ScalarType` names every type a single `Register` can carry. Operator
//! nodes, typed loads/stores and the fusion catalog are all keyed by it.

use std::fmt;

/// Element kind of a 32-bit-lane vector.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneKind {
    F32,
    I32,
    U32,
}

/// Concrete value type of a register.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarType {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    /// Raw encoded `Address`.
    Ptr,
    /// Address of a NUL-terminated byte string; null is the empty string.
    String,
    Float2,
    Float3,
    Float4,
    Int2,
    Int3,
    Int4,
    UInt2,
    UInt3,
    UInt4,
    /// Signed `from..to` pair.
    Range,
    /// Unsigned `from..to` pair.
    URange,
}

impl ScalarType {
    /// Every scalar type, in declaration order.
    pub const ALL: [ScalarType; 24] = [
        ScalarType::Bool,
        ScalarType::Int8,
        ScalarType::UInt8,
        ScalarType::Int16,
        ScalarType::UInt16,
        ScalarType::Int32,
        ScalarType::UInt32,
        ScalarType::Int64,
        ScalarType::UInt64,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::Ptr,
        ScalarType::String,
        ScalarType::Float2,
        ScalarType::Float3,
        ScalarType::Float4,
        ScalarType::Int2,
        ScalarType::Int3,
        ScalarType::Int4,
        ScalarType::UInt2,
        ScalarType::UInt3,
        ScalarType::UInt4,
        ScalarType::Range,
        ScalarType::URange,
    ];

    /// Size in bytes of the value's memory image.
    pub const fn size(self) -> u32 {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float => 4,
            Self::Int64
            | Self::UInt64
            | Self::Double
            | Self::Ptr
            | Self::String
            | Self::Float2
            | Self::Int2
            | Self::UInt2
            | Self::Range
            | Self::URange => 8,
            Self::Float3 | Self::Int3 | Self::UInt3 => 12,
            Self::Float4 | Self::Int4 | Self::UInt4 => 16,
        }
    }

    /// Number of 32-bit lanes for vectors and ranges, 1 otherwise.
    pub const fn lanes(self) -> usize {
        match self {
            Self::Float2 | Self::Int2 | Self::UInt2 | Self::Range | Self::URange => 2,
            Self::Float3 | Self::Int3 | Self::UInt3 => 3,
            Self::Float4 | Self::Int4 | Self::UInt4 => 4,
            _ => 1,
        }
    }

    /// Lane element kind for vectors and ranges.
    pub const fn lane_kind(self) -> Option<LaneKind> {
        match self {
            Self::Float2 | Self::Float3 | Self::Float4 => Some(LaneKind::F32),
            Self::Int2 | Self::Int3 | Self::Int4 | Self::Range => Some(LaneKind::I32),
            Self::UInt2 | Self::UInt3 | Self::UInt4 | Self::URange => Some(LaneKind::U32),
            _ => None,
        }
    }

    /// Source-level name, used in diagnostics and fusion traces.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int",
            Self::UInt32 => "uint",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Ptr => "pointer",
            Self::String => "string",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Int2 => "int2",
            Self::Int3 => "int3",
            Self::Int4 => "int4",
            Self::UInt2 => "uint2",
            Self::UInt3 => "uint3",
            Self::UInt4 => "uint4",
            Self::Range => "range",
            Self::URange => "urange",
        }
    }

    /// Scalar integers of 8 to 64 bits.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Float | Self::Double
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// 2/3/4-lane vectors (ranges are not vectors).
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            Self::Float2
                | Self::Float3
                | Self::Float4
                | Self::Int2
                | Self::Int3
                | Self::Int4
                | Self::UInt2
                | Self::UInt3
                | Self::UInt4
        )
    }

    pub const fn is_range(self) -> bool {
        matches!(self, Self::Range | Self::URange)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
