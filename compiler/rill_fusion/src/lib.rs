//! Operator fusion for the Rill execution core.
//!
//! Most operator nodes take a constant, a local slot or a call argument as
//! an operand. Fusion folds such a leaf into its operator so evaluating
//! `a + 3` is one node visit instead of three.
//!
//! # Pieces
//!
//! - [`ShapeLookup`]: which node kinds count as leaf shapes
//! - [`FusionPoint`]: one stateless rule per `(operator, type)` pair
//! - [`FusionCatalog`]: the two-level rule table, installed once per process
//! - [`run_fusion_pass`]: the bottom-up rewrite, run once before execution
//!
//! A fused node evaluates through the same operator kernel as the subtree
//! it replaced, so results and faults (including their spans) are
//! identical. The pass is idempotent: fused kinds are never leaf shapes and
//! never matched again.

mod catalog;
mod error;
mod pass;
mod point;
mod shape;

pub use catalog::{catalog, install_catalog, FusionCatalog};
pub use error::FusionError;
pub use pass::{fuse_program, run_fusion_pass, run_fusion_pass_with, FusionStats};
pub use point::{FusionMatch, FusionPoint, Op1FusionPoint, Op2FusionPoint};
pub use shape::{LeafShape, ShapeLookup};
