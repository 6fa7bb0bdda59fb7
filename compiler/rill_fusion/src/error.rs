//! Errors from building or installing a fusion catalog.
//!
//! Refusing a match is not an error; these only report misconfiguration.

use rill_eval::NodeTag;
use rill_ir::ScalarType;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FusionError {
    #[error("a fusion point for `{op}` on `{ty}` is already registered")]
    DuplicatePoint { op: &'static str, ty: ScalarType },
    #[error("the process-wide fusion catalog is already installed")]
    CatalogInstalled,
    #[error("fused node kind {0:?} cannot be a leaf shape")]
    FusedLeafShape(NodeTag),
}
