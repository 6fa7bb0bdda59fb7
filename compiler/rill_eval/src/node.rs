//! Evaluation node tree.
//!
//! A lowered, type-checked program is a tree of [`Node`]s. Every node owns
//! its children exclusively; there are no back references, so the fusion
//! pass can replace a subtree in its parent's slot. After that pass the
//! tree is immutable and may be evaluated by many contexts at once.
//!
//! Evaluation itself lives in `exec`.

use std::mem;

use rill_ir::{BinaryOp, Register, ScalarType, SharedType, Span, UnaryOp};

use crate::FunctionId;

/// One evaluation node: what it does and where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// The closed set of node kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal.
    Const(Register),

    // Storage
    /// Address of the frame-local slot at `offset`.
    GetLocal { offset: u32 },
    /// Typed load from the frame-local slot at `offset`.
    GetLocalR2V { offset: u32, ty: ScalarType },
    /// Call argument `index` of the current frame.
    GetArgument { index: u32 },
    /// Address of the global slot at `offset`.
    GetGlobal { offset: u32 },
    /// Typed load from global storage.
    GetGlobalR2V { offset: u32, ty: ScalarType },
    /// Typed load through the address `subexpr` evaluates to.
    Ref2Value { ty: ScalarType, subexpr: Box<Node> },
    /// Typed store to a frame-local slot; yields the stored value.
    SetLocal {
        offset: u32,
        ty: ScalarType,
        value: Box<Node>,
    },
    /// Typed store to global storage; yields the stored value.
    SetGlobal {
        offset: u32,
        ty: ScalarType,
        value: Box<Node>,
    },
    /// Typed store through a reference node; yields the stored value.
    Assign {
        ty: ScalarType,
        target: Box<Node>,
        value: Box<Node>,
    },

    // Operators
    Op1 {
        op: UnaryOp,
        ty: ScalarType,
        x: Box<Node>,
    },
    Op2 {
        op: BinaryOp,
        ty: ScalarType,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Produced only by the fusion pass.
    Op1Fusion(FusedOp1),
    /// Produced only by the fusion pass.
    Op2Fusion(FusedOp2),

    // Control flow
    /// Evaluate in order, yield the last value (zero if empty).
    Block(Vec<Node>),
    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    Call {
        function: FunctionId,
        args: Vec<Node>,
    },
    /// Catch boundary: `handler` runs when `body` faults.
    Try {
        body: Box<Node>,
        handler: Option<Box<Node>>,
    },
    Throw { message: String },

    // Hashing
    /// Hash of `subexpr`'s register read as `ty`.
    HashOfValue { ty: ScalarType, subexpr: Box<Node> },
    /// Hash of `size` bytes at the address `subexpr` evaluates to.
    HashOfRef { size: u32, subexpr: Box<Node> },
    /// Hash of the value at `subexpr`, laid out as `type_info`.
    HashOfMixedType {
        type_info: SharedType,
        subexpr: Box<Node>,
    },
}

/// Payload-free discriminant of [`NodeKind`], used to key leaf shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Const,
    GetLocal,
    GetLocalR2V,
    GetArgument,
    GetGlobal,
    GetGlobalR2V,
    Ref2Value,
    SetLocal,
    SetGlobal,
    Assign,
    Op1,
    Op2,
    Op1Fusion,
    Op2Fusion,
    Block,
    If,
    While,
    Call,
    Try,
    Throw,
    HashOfValue,
    HashOfRef,
    HashOfMixedType,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { span, kind }
    }

    /// Node without source location.
    pub fn synthetic(kind: NodeKind) -> Self {
        Node::new(kind, Span::DUMMY)
    }

    /// Take the kind out of the node, leaving an empty block behind.
    pub fn into_kind(mut self) -> NodeKind {
        mem::replace(&mut self.kind, NodeKind::Block(Vec::new()))
    }

    pub fn tag(&self) -> NodeTag {
        match &self.kind {
            NodeKind::Const(_) => NodeTag::Const,
            NodeKind::GetLocal { .. } => NodeTag::GetLocal,
            NodeKind::GetLocalR2V { .. } => NodeTag::GetLocalR2V,
            NodeKind::GetArgument { .. } => NodeTag::GetArgument,
            NodeKind::GetGlobal { .. } => NodeTag::GetGlobal,
            NodeKind::GetGlobalR2V { .. } => NodeTag::GetGlobalR2V,
            NodeKind::Ref2Value { .. } => NodeTag::Ref2Value,
            NodeKind::SetLocal { .. } => NodeTag::SetLocal,
            NodeKind::SetGlobal { .. } => NodeTag::SetGlobal,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::Op1 { .. } => NodeTag::Op1,
            NodeKind::Op2 { .. } => NodeTag::Op2,
            NodeKind::Op1Fusion(_) => NodeTag::Op1Fusion,
            NodeKind::Op2Fusion(_) => NodeTag::Op2Fusion,
            NodeKind::Block(_) => NodeTag::Block,
            NodeKind::If { .. } => NodeTag::If,
            NodeKind::While { .. } => NodeTag::While,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::Try { .. } => NodeTag::Try,
            NodeKind::Throw { .. } => NodeTag::Throw,
            NodeKind::HashOfValue { .. } => NodeTag::HashOfValue,
            NodeKind::HashOfRef { .. } => NodeTag::HashOfRef,
            NodeKind::HashOfMixedType { .. } => NodeTag::HashOfMixedType,
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Const(_)
            | NodeKind::GetLocal { .. }
            | NodeKind::GetLocalR2V { .. }
            | NodeKind::GetArgument { .. }
            | NodeKind::GetGlobal { .. }
            | NodeKind::GetGlobalR2V { .. }
            | NodeKind::Throw { .. } => Vec::new(),
            NodeKind::Ref2Value { subexpr, .. }
            | NodeKind::HashOfValue { subexpr, .. }
            | NodeKind::HashOfRef { subexpr, .. }
            | NodeKind::HashOfMixedType { subexpr, .. } => vec![&**subexpr],
            NodeKind::SetLocal { value, .. } | NodeKind::SetGlobal { value, .. } => vec![&**value],
            NodeKind::Assign { target, value, .. } => vec![&**target, &**value],
            NodeKind::Op1 { x, .. } => vec![&**x],
            NodeKind::Op2 { left, right, .. } => vec![&**left, &**right],
            NodeKind::Op1Fusion(fused) => fused.x.node().into_iter().collect(),
            NodeKind::Op2Fusion(fused) => fused
                .left
                .node()
                .into_iter()
                .chain(fused.right.node())
                .collect(),
            NodeKind::Block(nodes) | NodeKind::Call { args: nodes, .. } => nodes.iter().collect(),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![&**cond, &**then_branch];
                children.extend(else_branch.as_deref());
                children
            }
            NodeKind::While { cond, body } => vec![&**cond, &**body],
            NodeKind::Try { body, handler } => {
                let mut children = vec![&**body];
                children.extend(handler.as_deref());
                children
            }
        }
    }

    /// Mutable direct children, for in-place rewriting passes.
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.kind {
            NodeKind::Const(_)
            | NodeKind::GetLocal { .. }
            | NodeKind::GetLocalR2V { .. }
            | NodeKind::GetArgument { .. }
            | NodeKind::GetGlobal { .. }
            | NodeKind::GetGlobalR2V { .. }
            | NodeKind::Throw { .. } => Vec::new(),
            NodeKind::Ref2Value { subexpr, .. }
            | NodeKind::HashOfValue { subexpr, .. }
            | NodeKind::HashOfRef { subexpr, .. }
            | NodeKind::HashOfMixedType { subexpr, .. } => vec![&mut **subexpr],
            NodeKind::SetLocal { value, .. } | NodeKind::SetGlobal { value, .. } => {
                vec![&mut **value]
            }
            NodeKind::Assign { target, value, .. } => vec![&mut **target, &mut **value],
            NodeKind::Op1 { x, .. } => vec![&mut **x],
            NodeKind::Op2 { left, right, .. } => vec![&mut **left, &mut **right],
            NodeKind::Op1Fusion(fused) => fused.x.node_mut().into_iter().collect(),
            NodeKind::Op2Fusion(fused) => fused
                .left
                .node_mut()
                .into_iter()
                .chain(fused.right.node_mut())
                .collect(),
            NodeKind::Block(nodes) | NodeKind::Call { args: nodes, .. } => {
                nodes.iter_mut().collect()
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![&mut **cond, &mut **then_branch];
                children.extend(else_branch.as_deref_mut());
                children
            }
            NodeKind::While { cond, body } => vec![&mut **cond, &mut **body],
            NodeKind::Try { body, handler } => {
                let mut children = vec![&mut **body];
                children.extend(handler.as_deref_mut());
                children
            }
        }
    }

    /// Total number of nodes in this subtree.
    pub fn count(&self) -> usize {
        rill_stack::ensure_sufficient_stack(|| {
            1 + self.children().into_iter().map(Node::count).sum::<usize>()
        })
    }

    // Constructors for the common shapes.

    pub fn constant(value: Register) -> Self {
        Node::synthetic(NodeKind::Const(value))
    }

    pub fn local(offset: u32, ty: ScalarType) -> Self {
        Node::synthetic(NodeKind::GetLocalR2V { offset, ty })
    }

    pub fn argument(index: u32) -> Self {
        Node::synthetic(NodeKind::GetArgument { index })
    }

    pub fn op1(op: UnaryOp, ty: ScalarType, x: Node) -> Self {
        Node::synthetic(NodeKind::Op1 {
            op,
            ty,
            x: Box::new(x),
        })
    }

    pub fn op2(op: BinaryOp, ty: ScalarType, left: Node, right: Node) -> Self {
        Node::synthetic(NodeKind::Op2 {
            op,
            ty,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// Teardown is iterative: children are detached onto a worklist so a deep
// tree never recurses on the host stack while dropping.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Node> = self.children_mut().into_iter().map(detach).collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.children_mut().into_iter().map(detach));
        }
    }
}

/// Move `slot` out, leaving a childless placeholder.
fn detach(slot: &mut Node) -> Node {
    mem::replace(slot, Node::constant(Register::ZERO))
}

/// Operator identity and location copied into a fused node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FusionHeader {
    pub op_name: &'static str,
    pub ty: ScalarType,
    pub span: Span,
}

/// Operand of a fused node. Leaves are evaluated inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FusedOperand {
    Const(Register),
    /// Typed frame-local load; `span` is the replaced leaf's span.
    Local {
        offset: u32,
        ty: ScalarType,
        span: Span,
    },
    Argument { index: u32, span: Span },
    /// A subtree that was not a leaf shape.
    Node(Box<Node>),
}

impl FusedOperand {
    pub fn node(&self) -> Option<&Node> {
        match self {
            FusedOperand::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn node_mut(&mut self) -> Option<&mut Node> {
        match self {
            FusedOperand::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, FusedOperand::Node(_))
    }
}

/// Unary operator over an inline operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusedOp1 {
    pub header: FusionHeader,
    pub op: UnaryOp,
    pub x: FusedOperand,
}

/// Binary operator with at least one inline leaf operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusedOp2 {
    pub header: FusionHeader,
    pub op: BinaryOp,
    pub left: FusedOperand,
    pub right: FusedOperand,
}
