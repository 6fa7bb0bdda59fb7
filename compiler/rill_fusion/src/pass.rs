//! The fusion pass.
//!
//! Bottom-up and single-pass: children are rewritten before their parent,
//! so a parent sees its operands in their final form. A node that matches
//! is replaced in its parent's slot; one that does not is left as is.

use std::mem;

use rill_eval::{Node, NodeKind, NodeTag, Program};
use rill_stack::ensure_sufficient_stack;

use crate::{FusionCatalog, ShapeLookup};

/// What a pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// Nodes walked.
    pub visited: usize,
    /// Operator nodes with a registered point.
    pub candidates: usize,
    /// Nodes replaced by a fused node.
    pub fused: usize,
}

impl std::ops::AddAssign for FusionStats {
    fn add_assign(&mut self, other: Self) {
        self.visited += other.visited;
        self.candidates += other.candidates;
        self.fused += other.fused;
    }
}

/// Fuse `root` in place with the default leaf shapes.
pub fn run_fusion_pass(root: &mut Node, catalog: &FusionCatalog) -> FusionStats {
    run_fusion_pass_with(root, catalog, &ShapeLookup::default())
}

/// Fuse `root` in place, classifying leaves with `lookup`.
pub fn run_fusion_pass_with(
    root: &mut Node,
    catalog: &FusionCatalog,
    lookup: &ShapeLookup,
) -> FusionStats {
    let mut pass = Pass {
        catalog,
        lookup,
        stats: FusionStats::default(),
    };
    pass.visit(root);
    tracing::debug!(
        visited = pass.stats.visited,
        fused = pass.stats.fused,
        "fusion pass"
    );
    pass.stats
}

/// Fuse every function body and the initializer of `program`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn fuse_program(program: &mut Program, catalog: &FusionCatalog) -> FusionStats {
    let lookup = ShapeLookup::default();
    let mut stats = FusionStats::default();
    for node in program.nodes_mut() {
        stats += run_fusion_pass_with(node, catalog, &lookup);
    }
    stats
}

struct Pass<'a> {
    catalog: &'a FusionCatalog,
    lookup: &'a ShapeLookup,
    stats: FusionStats,
}

impl Pass<'_> {
    fn visit(&mut self, node: &mut Node) {
        ensure_sufficient_stack(|| {
            for child in node.children_mut() {
                self.visit(child);
            }
            self.stats.visited += 1;

            let Some(point) = self.catalog.point_for(node) else {
                return;
            };
            self.stats.candidates += 1;
            if point.match_node(self.lookup, node).is_none() {
                return;
            }
            let original = mem::replace(node, Node::synthetic(NodeKind::Block(Vec::new())));
            *node = point.fuse(self.lookup, original);
            // A point may still refuse and hand the operator back.
            if !matches!(node.tag(), NodeTag::Op1Fusion | NodeTag::Op2Fusion) {
                return;
            }
            self.stats.fused += 1;
            tracing::trace!(
                op = point.op_name(),
                ty = %point.value_type(),
                span = %node.span,
                "fused operator"
            );
        });
    }
}
