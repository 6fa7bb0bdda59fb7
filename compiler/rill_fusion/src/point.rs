//! Fusion points: one rewrite rule per `(operator, type)` pair.

use rill_eval::{FusedOp1, FusedOp2, FusedOperand, FusionHeader, Node, NodeKind};
use rill_ir::{BinaryOp, ScalarType, UnaryOp};

use crate::{LeafShape, ShapeLookup};

/// Operand shapes a point agreed to fuse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FusionMatch {
    Unary { x: LeafShape },
    /// At least one side is a leaf; `None` is a subtree kept as a child.
    Binary {
        left: Option<LeafShape>,
        right: Option<LeafShape>,
    },
}

/// A stateless rewrite rule, registered once in the catalog.
pub trait FusionPoint: Send + Sync {
    /// Catalog key: the operator's name.
    fn op_name(&self) -> &'static str;

    /// Catalog key: the operand type.
    fn value_type(&self) -> ScalarType;

    /// Whether `node` is this point's operator with fusable operands.
    fn match_node(&self, lookup: &ShapeLookup, node: &Node) -> Option<FusionMatch>;

    /// Header for the fused replacement of `node`.
    fn set(&self, node: &Node) -> FusionHeader {
        FusionHeader {
            op_name: self.op_name(),
            ty: self.value_type(),
            span: node.span,
        }
    }

    /// Consume `node` and return its fused replacement, or `node` itself
    /// when it does not match.
    fn fuse(&self, lookup: &ShapeLookup, node: Node) -> Node;
}

/// Fuses `Op1 { op, ty }` over a leaf operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Op1FusionPoint {
    pub op: UnaryOp,
    pub ty: ScalarType,
}

impl FusionPoint for Op1FusionPoint {
    fn op_name(&self) -> &'static str {
        self.op.name()
    }

    fn value_type(&self) -> ScalarType {
        self.ty
    }

    fn match_node(&self, lookup: &ShapeLookup, node: &Node) -> Option<FusionMatch> {
        let NodeKind::Op1 { op, ty, x } = &node.kind else {
            return None;
        };
        if (*op, *ty) != (self.op, self.ty) {
            return None;
        }
        lookup.leaf_operand(x, self.ty)?;
        lookup.shape_of(x).map(|x| FusionMatch::Unary { x })
    }

    fn fuse(&self, lookup: &ShapeLookup, node: Node) -> Node {
        if self.match_node(lookup, &node).is_none() {
            return node;
        }
        let header = self.set(&node);
        let span = node.span;
        match node.into_kind() {
            NodeKind::Op1 { op, x, .. } => {
                let x = operand(lookup, *x, self.ty);
                Node::new(NodeKind::Op1Fusion(FusedOp1 { header, op, x }), span)
            }
            kind => Node::new(kind, span),
        }
    }
}

/// Fuses `Op2 { op, ty }` when at least one operand is a leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Op2FusionPoint {
    pub op: BinaryOp,
    pub ty: ScalarType,
}

impl FusionPoint for Op2FusionPoint {
    fn op_name(&self) -> &'static str {
        self.op.name()
    }

    fn value_type(&self) -> ScalarType {
        self.ty
    }

    fn match_node(&self, lookup: &ShapeLookup, node: &Node) -> Option<FusionMatch> {
        let NodeKind::Op2 {
            op,
            ty,
            left,
            right,
        } = &node.kind
        else {
            return None;
        };
        if (*op, *ty) != (self.op, self.ty) {
            return None;
        }
        let classify = |side: &Node| {
            lookup
                .leaf_operand(side, self.ty)
                .and_then(|_| lookup.shape_of(side))
        };
        match (classify(&**left), classify(&**right)) {
            (None, None) => None,
            (left, right) => Some(FusionMatch::Binary { left, right }),
        }
    }

    fn fuse(&self, lookup: &ShapeLookup, node: Node) -> Node {
        if self.match_node(lookup, &node).is_none() {
            return node;
        }
        let header = self.set(&node);
        let span = node.span;
        match node.into_kind() {
            NodeKind::Op2 {
                op, left, right, ..
            } => {
                let left = operand(lookup, *left, self.ty);
                let right = operand(lookup, *right, self.ty);
                let fused = FusedOp2 {
                    header,
                    op,
                    left,
                    right,
                };
                Node::new(NodeKind::Op2Fusion(fused), span)
            }
            kind => Node::new(kind, span),
        }
    }
}

/// Inline `node` if it is a leaf, otherwise keep it as a child.
fn operand(lookup: &ShapeLookup, node: Node, ty: ScalarType) -> FusedOperand {
    lookup
        .leaf_operand(&node, ty)
        .unwrap_or_else(|| FusedOperand::Node(Box::new(node)))
}
