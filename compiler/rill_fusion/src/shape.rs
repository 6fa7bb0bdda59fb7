//! Leaf shapes: the operand forms a fused node can evaluate inline.

use rill_eval::{FusedOperand, Node, NodeKind, NodeTag};
use rill_ir::ScalarType;
use rustc_hash::FxHashMap;

use crate::FusionError;

/// An operand form a fused node can reproduce without a child node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeafShape {
    /// A literal register.
    Const,
    /// A typed load from a frame-local slot.
    Local,
    /// A call argument.
    Argument,
}

impl LeafShape {
    pub const fn name(self) -> &'static str {
        match self {
            LeafShape::Const => "ConstValue",
            LeafShape::Local => "GetLocalR2V",
            LeafShape::Argument => "GetArgument",
        }
    }
}

/// Maps node kinds to the leaf shape they present as.
///
/// Fused node kinds can never be registered, which is what keeps the pass
/// from fusing its own output.
#[derive(Clone, Debug)]
pub struct ShapeLookup {
    shapes: FxHashMap<NodeTag, LeafShape>,
}

impl ShapeLookup {
    /// A lookup with no shapes; nothing will fuse.
    pub fn empty() -> Self {
        ShapeLookup {
            shapes: FxHashMap::default(),
        }
    }

    /// Classify nodes of `tag` as `shape`.
    pub fn with_shape(mut self, tag: NodeTag, shape: LeafShape) -> Result<Self, FusionError> {
        if matches!(tag, NodeTag::Op1Fusion | NodeTag::Op2Fusion) {
            return Err(FusionError::FusedLeafShape(tag));
        }
        self.shapes.insert(tag, shape);
        Ok(self)
    }

    #[must_use]
    pub fn without_shape(mut self, tag: NodeTag) -> Self {
        self.shapes.remove(&tag);
        self
    }

    pub fn shape(&self, tag: NodeTag) -> Option<LeafShape> {
        self.shapes.get(&tag).copied()
    }

    pub fn shape_of(&self, node: &Node) -> Option<LeafShape> {
        self.shape(node.tag())
    }

    /// Inline operand for `node` under an operator on `ty`.
    ///
    /// `None` when the node is not a leaf shape or its shape cannot be
    /// reproduced exactly: a local loaded as a different type than the
    /// operator's, or a tag registered under a shape whose payload it does
    /// not carry.
    pub(crate) fn leaf_operand(&self, node: &Node, ty: ScalarType) -> Option<FusedOperand> {
        match (self.shape_of(node)?, &node.kind) {
            (LeafShape::Const, NodeKind::Const(value)) => Some(FusedOperand::Const(*value)),
            (LeafShape::Local, NodeKind::GetLocalR2V { offset, ty: load }) if *load == ty => {
                Some(FusedOperand::Local {
                    offset: *offset,
                    ty,
                    span: node.span,
                })
            }
            (LeafShape::Argument, NodeKind::GetArgument { index }) => Some(FusedOperand::Argument {
                index: *index,
                span: node.span,
            }),
            _ => None,
        }
    }
}

impl Default for ShapeLookup {
    fn default() -> Self {
        let shapes = [
            (NodeTag::Const, LeafShape::Const),
            (NodeTag::GetLocalR2V, LeafShape::Local),
            (NodeTag::GetArgument, LeafShape::Argument),
        ];
        ShapeLookup {
            shapes: shapes.into_iter().collect(),
        }
    }
}
