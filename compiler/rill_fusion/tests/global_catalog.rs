//! The process-wide catalog can be installed exactly once.
//!
//! Kept in its own test binary so no other test touches the global.

use rill_fusion::{catalog, install_catalog, FusionCatalog, FusionError, Op2FusionPoint};
use rill_ir::{BinaryOp, ScalarType};

#[test]
fn test_install_once() {
    let mut custom = FusionCatalog::new();
    let point = Op2FusionPoint {
        op: BinaryOp::Add,
        ty: ScalarType::Int32,
    };
    assert_eq!(custom.register(Box::new(point)), Ok(()));

    let installed = install_catalog(custom).map(FusionCatalog::len);
    assert_eq!(installed, Ok(1));
    assert_eq!(
        install_catalog(FusionCatalog::builtin()).map(FusionCatalog::len),
        Err(FusionError::CatalogInstalled)
    );
    assert_eq!(catalog().len(), 1);
    assert!(catalog().get("Add", ScalarType::Int32).is_some());
}
